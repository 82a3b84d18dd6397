// Signal engine library root

pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod scanner;
pub mod services;
pub mod strategy;

pub use error::EngineError;
