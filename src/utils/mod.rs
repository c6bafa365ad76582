//! Utility modules

pub mod logging;
pub mod memory_source;
pub mod validation;

pub use logging::*;
pub use memory_source::*;
pub use validation::*;
