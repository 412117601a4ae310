//! Text utilities applied to generated code
//!
//! - [`clean_code`] turns a model reply into plain source
//! - [`has_function`] validates that the source defines the target function

mod clean;
mod inspect;
mod strict;

pub use clean::clean_code;
pub use inspect::{function_names, has_function};
