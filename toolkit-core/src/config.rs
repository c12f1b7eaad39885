//! Flattening of pipeline configuration values into `key = value` lines.

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    hash::BuildHasher,
};

use serde_json::Value;

/// A configuration value that can describe itself for an error report.
///
/// Description falls back through three tiers: [`fields`](Self::fields) for
/// structured configuration types, then [`entries`](Self::entries) for
/// mapping-like values, then [`raw`](Self::raw) as a single rendering.
/// Enum-valued fields should report their value rather than their type name.
///
/// # Examples
/// ```
/// use toolkit_core::{DescribeConfig, describe_config};
///
/// struct RunConfig {
///     sample: String,
///     threads: usize,
/// }
///
/// impl DescribeConfig for RunConfig {
///     fn fields(&self) -> Option<Vec<(String, String)>> {
///         Some(vec![
///             ("sample".to_owned(), self.sample.clone()),
///             ("threads".to_owned(), self.threads.to_string()),
///         ])
///     }
///
///     fn raw(&self) -> String {
///         format!("RunConfig({}, {})", self.sample, self.threads)
///     }
/// }
///
/// let config = RunConfig { sample: "S1".into(), threads: 4 };
/// assert_eq!(describe_config(&config), vec!["sample = S1", "threads = 4"]);
/// ```
pub trait DescribeConfig {
    /// Structured fields in declaration order, if the type has any.
    fn fields(&self) -> Option<Vec<(String, String)>> {
        None
    }

    /// Mapping-style entries, if the value behaves like a map.
    fn entries(&self) -> Option<Vec<(String, String)>> {
        None
    }

    /// Raw rendering used when neither fields nor entries are available.
    fn raw(&self) -> String;
}

/// Describes `config` as report lines using the three-tier fallback.
#[must_use]
pub fn describe_config(config: &dyn DescribeConfig) -> Vec<String> {
    match config.fields().or_else(|| config.entries()) {
        Some(pairs) => pairs
            .into_iter()
            .map(|(key, value)| format!("{key} = {value}"))
            .collect(),
        None => vec![format!("config = {}", config.raw())],
    }
}

fn render_pairs(pairs: &[(String, String)]) -> String {
    let body = pairs
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{body}}}")
}

impl<K: Display, V: Display> DescribeConfig for BTreeMap<K, V> {
    fn entries(&self) -> Option<Vec<(String, String)>> {
        Some(
            self.iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }

    fn raw(&self) -> String {
        render_pairs(&self.entries().unwrap_or_default())
    }
}

/// Entries are sorted by key so reports are stable across runs.
impl<K: Display, V: Display, S: BuildHasher> DescribeConfig for HashMap<K, V, S> {
    fn entries(&self) -> Option<Vec<(String, String)>> {
        let mut pairs: Vec<_> = self
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        pairs.sort();
        Some(pairs)
    }

    fn raw(&self) -> String {
        render_pairs(&self.entries().unwrap_or_default())
    }
}

/// JSON objects describe themselves as entries; string values are rendered
/// without quotes. Any other JSON value falls back to its raw rendering.
impl DescribeConfig for Value {
    fn entries(&self) -> Option<Vec<(String, String)>> {
        let object = self.as_object()?;
        Some(
            object
                .iter()
                .map(|(key, value)| {
                    let rendered = match value {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    };
                    (key.clone(), rendered)
                })
                .collect(),
        )
    }

    fn raw(&self) -> String {
        self.to_string()
    }
}

impl DescribeConfig for String {
    fn raw(&self) -> String {
        self.clone()
    }
}
