pub mod problem;
pub use problem::*;
pub mod solution;
pub use solution::*;
