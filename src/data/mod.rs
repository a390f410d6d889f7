//! Data module - CSV loading and conversion to the typed strategy log

mod loader;
mod processor;

pub use loader::DataLoader;
pub use processor::{DataProcessor, Execution, StrategyLog};

#[cfg(test)]
pub use processor::TradeSide;
