//! Merges per-command short options into one conflict-free table.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::instrument;

use super::registry::CommandSpec;

/// Conflicts detected while merging short options across commands.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OptionConflict {
    /// One parameter asked for two different flags.
    #[error("Parameter '{param}' defined with different short options: '{first}' and '{second}'")]
    ParameterShortOptions {
        /// Long name of the parameter.
        param: String,
        /// Flag registered first.
        first: char,
        /// Flag that disagreed with it.
        second: char,
    },
    /// One flag was claimed by two different parameters.
    #[error("Short option '{flag}' used for multiple parameters: '{first}' and '{second}'")]
    ShortOptionParameters {
        /// The contested flag.
        flag: char,
        /// Parameter that claimed it first.
        first: String,
        /// Parameter that claimed it second.
        second: String,
    },
}

/// Parameter name to single-character flag, shared by every command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalOptionTable {
    flags: BTreeMap<String, char>,
}

impl GlobalOptionTable {
    /// Flag assigned to `param`, if any.
    #[must_use]
    pub fn flag_for(&self, param: &str) -> Option<char> {
        self.flags.get(param).copied()
    }

    /// Number of parameters with a flag.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether no parameter has a flag.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// `(parameter, flag)` pairs sorted by parameter.
    pub fn iter(&self) -> impl Iterator<Item = (&str, char)> {
        self.flags.iter().map(|(param, flag)| (param.as_str(), *flag))
    }
}

/// Combines the short options requested by every command.
///
/// A parameter requested identically by several commands is accepted once.
///
/// # Errors
/// Returns [`OptionConflict`] if a parameter maps to two flags or a flag maps
/// to two parameters.
#[instrument(name = "toolkit.options", err, skip_all, fields(commands = specs.len()))]
pub fn merge_short_options(specs: &[CommandSpec]) -> Result<GlobalOptionTable, OptionConflict> {
    let mut flags: BTreeMap<String, char> = BTreeMap::new();
    let mut owners: BTreeMap<char, String> = BTreeMap::new();

    for (param, flag) in specs.iter().flat_map(|spec| spec.short_options()) {
        if let Some(existing) = flags.get(*param) {
            if existing != flag {
                return Err(OptionConflict::ParameterShortOptions {
                    param: (*param).to_owned(),
                    first: *existing,
                    second: *flag,
                });
            }
            continue;
        }
        if let Some(owner) = owners.get(flag) {
            return Err(OptionConflict::ShortOptionParameters {
                flag: *flag,
                first: owner.clone(),
                second: (*param).to_owned(),
            });
        }
        flags.insert((*param).to_owned(), *flag);
        owners.insert(*flag, (*param).to_owned());
    }

    Ok(GlobalOptionTable { flags })
}
