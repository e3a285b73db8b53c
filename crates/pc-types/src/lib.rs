pub mod configuration;
pub mod errors;
pub mod steps;

pub use configuration::*;
pub use errors::*;
pub use steps::*;
