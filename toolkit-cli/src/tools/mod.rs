//! Commands bundled with the toolkit binary.

pub mod example;
pub mod summarize;

use crate::cli::CommandSpec;

/// Every bundled command, in help-listing order.
#[must_use]
pub fn builtin_commands() -> Vec<CommandSpec> {
    vec![example::command(), summarize::command()]
}
