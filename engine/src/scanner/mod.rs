pub mod market_scanner;
pub mod scheduler;
pub mod universe;

pub use market_scanner::{rank, MarketScanner};
pub use scheduler::ScanScheduler;
pub use universe::SymbolUniverseSelector;
