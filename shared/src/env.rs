//! Worker environment state.
//!
//! An edge host hands its worker a fresh set of variables with every request.
//! [`EnvStore`] is the store those sets are folded into; [`Env`] is the
//! immutable snapshot a single request works from. Configuration is threaded
//! through the call chain as an explicit value, not read from a global.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared variable store, merged into on every inbound request.
///
/// A merge overwrites key-by-key and never removes what is already present,
/// so one running instance can serve requests carrying different variable
/// sets. Concurrent merges of different sets interleave per key; each
/// request reads from a coherent [`Env`] snapshot taken after its own merge.
#[derive(Clone, Default)]
pub struct EnvStore {
    vars: Arc<RwLock<HashMap<String, String>>>,
}

impl EnvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from the process environment.
    pub fn from_process_env() -> Self {
        let store = Self::new();
        store.merge(std::env::vars());
        store
    }

    /// Overwrite the stored value for every key in `vars`.
    pub fn merge<I, K, V>(&self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut stored = self.vars.write().expect("env store poisoned");
        for (key, value) in vars {
            stored.insert(key.into(), value.into());
        }
    }

    /// A coherent copy of the current state.
    pub fn snapshot(&self) -> Env {
        let vars = self.vars.read().expect("env store poisoned");
        Env { vars: vars.clone() }
    }
}

/// Immutable view of the environment for one request.
#[derive(Clone, Debug, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Usernames allowed to request cards, or `None` when the instance is
    /// open. An unset or empty `WHITELIST` means open.
    pub fn whitelist(&self) -> Option<Vec<String>> {
        self.comma_list("WHITELIST")
    }

    /// Gist owners allowed on the gist route, or `None` when open.
    pub fn gist_whitelist(&self) -> Option<Vec<String>> {
        self.comma_list("GIST_WHITELIST")
    }

    /// Repositories excluded from aggregation. Empty when unset.
    pub fn exclude_repositories(&self) -> Vec<String> {
        self.comma_list("EXCLUDE_REPO").unwrap_or_default()
    }

    /// Whether the deterministic test retry budget is in effect.
    pub fn is_test_mode(&self) -> bool {
        self.get("NODE_ENV") == Some("test")
    }

    fn comma_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key)
            .filter(|value| !value.is_empty())
            .map(|value| value.split(',').map(str::to_string).collect())
    }
}

impl<K, V> FromIterator<(K, V)> for Env
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Env {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
