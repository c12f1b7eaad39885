//! Command-line dispatch for the toolkit.
//!
//! A single binary hosts several pipeline helper commands. Global options
//! (logging and overwrite behaviour) come before the command name; everything
//! after it belongs to the command. Short options are declared per command
//! and merged into one table so a parameter shared by several commands keeps
//! the same flag everywhere.

mod dispatch;
mod global;
mod options;
mod registry;

pub use dispatch::{ArgvSplit, DispatchError, DispatchOutcome, Dispatcher, split_argv};
pub use global::GlobalArgs;
pub use options::{GlobalOptionTable, OptionConflict, merge_short_options};
pub use registry::{
    ArgsBuilder, CommandError, CommandHandler, CommandRegistry, CommandSpec, CommonOptions,
    RegistryError,
};

#[cfg(test)]
mod test_helpers;
#[cfg(test)]
mod tests;
