//! Alias registry: human-readable names for document digests.
//!
//! The registry is a plain value with no global state; callers that share it
//! across threads wrap it in a `Mutex`. Registration is idempotent for the
//! same digest and an error for a conflicting one.

use std::collections::HashMap;

use cesr_kernel_core::Said;

use crate::error::{KernelError, Result};

/// Maps aliases to document digests.
#[derive(Debug, Clone, Default)]
pub struct AliasRegistry {
    entries: HashMap<String, Said>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an alias.
    ///
    /// Re-registering the same digest under the same alias is a no-op;
    /// registering a different digest under a taken alias is an error.
    pub fn register(&mut self, alias: &str, said: Said) -> Result<()> {
        match self.entries.get(alias) {
            Some(existing) if *existing == said => Ok(()),
            Some(_) => Err(KernelError::DuplicateAlias(alias.to_string())),
            None => {
                tracing::debug!(alias, said = %said, "registered alias");
                self.entries.insert(alias.to_string(), said);
                Ok(())
            }
        }
    }

    /// Resolve an alias to its digest.
    pub fn resolve(&self, alias: &str) -> Result<Said> {
        self.entries
            .get(alias)
            .copied()
            .ok_or_else(|| KernelError::UnknownAlias(alias.to_string()))
    }

    /// Reverse lookup: some alias registered for a digest, if any. When
    /// several aliases share a digest the choice is arbitrary.
    pub fn alias_of(&self, said: &Said) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, s)| *s == said)
            .map(|(alias, _)| alias.as_str())
    }

    /// Remove an alias, returning its digest if it was registered.
    pub fn remove(&mut self, alias: &str) -> Option<Said> {
        self.entries.remove(alias)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
