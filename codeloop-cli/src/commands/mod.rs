//! CLI command implementations

pub mod check;
pub mod solve;

pub use check::CheckArgs;
pub use solve::SolveArgs;
