pub mod rate;
pub mod prediction;

pub use rate::*;
pub use prediction::*;
