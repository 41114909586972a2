//! The behavior contract and its per-invocation configuration.
//!
//! A behavior is one unit of per-connection logic: given a connected stream
//! and an options map, misbehave in some specific way. Behaviors are invoked
//! once per accepted connection, each on its own task, and may block for
//! arbitrary durations. A failing connection is isolated by the caller; the
//! behavior just returns the error.

use crate::stream::Connection;
use std::collections::BTreeMap;
use std::time::Duration;

/// A pluggable per-connection handling strategy.
#[async_trait::async_trait]
pub trait Behavior: Send + Sync {
    /// Registry identity, also used in logs.
    fn name(&self) -> &str;

    /// Handle one accepted connection.
    async fn handle(&self, conn: &mut Connection, options: &Options) -> std::io::Result<()>;
}

/// Immutable key-value configuration passed to a behavior invocation.
///
/// Each behavior defines its own recognized keys and defaults; absent or
/// wrong-typed keys fall back to the default. Unknown keys are ignored, and
/// no schema validation is performed.
#[derive(Debug, Clone, Default)]
pub struct Options(BTreeMap<String, toml::Value>);

impl Options {
    /// An empty options map (every behavior sees its defaults).
    pub fn new() -> Self {
        Options(BTreeMap::new())
    }

    /// Build from a parsed TOML table, e.g. a `[options.<Name>]` section.
    pub fn from_table(table: toml::value::Table) -> Self {
        Options(table.into_iter().collect())
    }

    /// Set a key, builder-style.
    pub fn set(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// String value for `key`, or `default` if absent or not a string.
    pub fn str_or(&self, key: &str, default: &str) -> String {
        match self.0.get(key).and_then(|v| v.as_str()) {
            Some(s) => s.to_string(),
            None => default.to_string(),
        }
    }

    /// Integer value for `key`, or `default` if absent or not an integer.
    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        self.0.get(key).and_then(|v| v.as_integer()).unwrap_or(default)
    }

    /// Duration in seconds for `key`, accepting integer or float values.
    pub fn secs_or(&self, key: &str, default: f64) -> Duration {
        let secs = match self.0.get(key) {
            Some(toml::Value::Integer(n)) => *n as f64,
            Some(toml::Value::Float(f)) => *f,
            _ => default,
        };
        Duration::from_secs_f64(secs.max(0.0))
    }
}
