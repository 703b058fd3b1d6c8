pub mod artifact;
pub mod heuristics;

pub use artifact::*;
pub use heuristics::*;
