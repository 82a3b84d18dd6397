pub mod settings;

pub use settings::{EngineSettings, ProviderSettings, ScannerSettings, UniverseSettings};
