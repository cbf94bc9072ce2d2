use log::trace;
use std::collections::HashSet;

use crate::constants::{ELECTRON_BUILTINS, NODE_BUILTINS, NODE_SCHEME};

/// Names of modules provided by the host runtime rather than by files on disk.
///
/// The set is fixed once constructed. [`BuiltinSet::default`] combines the
/// Node.js core modules with the Electron builtins; tests and embedders can
/// build their own with [`BuiltinSet::new`].
#[derive(Debug, Clone)]
pub struct BuiltinSet {
    names: HashSet<String>,
    node_scheme: bool,
}

impl BuiltinSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { names: names.into_iter().map(Into::into).collect(), node_scheme: false }
    }

    /// A set with no builtins at all; every specifier is kept.
    pub fn empty() -> Self {
        Self::new(Vec::<String>::new())
    }

    /// Also treat every `node:`-prefixed request as a builtin.
    pub fn with_node_scheme(mut self) -> Self {
        self.node_scheme = true;
        self
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether `request` names a builtin.
    ///
    /// `fs/promises` is matched through its first segment. Scoped packages
    /// (`@scope/name`) are compared as a whole.
    pub fn contains(&self, request: &str) -> bool {
        if self.node_scheme && request.starts_with(NODE_SCHEME) {
            return true;
        }
        if self.names.contains(request) {
            return true;
        }
        if request.starts_with('@') {
            return false;
        }
        match request.split_once('/') {
            Some((head, _)) => self.names.contains(head),
            None => false,
        }
    }

    /// Returns the specifiers that are not builtins, keeping order and duplicates.
    pub fn remove_builtins<S>(&self, specs: &[S]) -> Vec<S>
    where
        S: AsRef<str> + Clone,
    {
        specs
            .iter()
            .filter(|s| {
                let builtin = self.contains(s.as_ref());
                if builtin {
                    trace!("Dropping builtin specifier '{}'", s.as_ref());
                }
                !builtin
            })
            .cloned()
            .collect()
    }
}

impl Default for BuiltinSet {
    fn default() -> Self {
        Self::new(NODE_BUILTINS.iter().chain(ELECTRON_BUILTINS).copied()).with_node_scheme()
    }
}

/// [`BuiltinSet::remove_builtins`] against the default Node.js + Electron set.
pub fn remove_builtins<S>(specs: &[S]) -> Vec<S>
where
    S: AsRef<str> + Clone,
{
    BuiltinSet::default().remove_builtins(specs)
}
