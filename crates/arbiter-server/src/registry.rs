//! Connection registry: the multiset of currently connected tokens.
//!
//! Tokens are caller-supplied and not authenticated, so duplicates are
//! accepted rather than rejected; `unregister` removes one occurrence.

/// Opaque caller-supplied identity, scoped to one connection.
pub type Token = String;

/// The set of live tokens.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    tokens: Vec<Token>,
}

impl ConnectionRegistry {
    /// Add a token. Duplicates are accepted.
    pub fn register(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Remove the first matching token. No-op when absent.
    pub fn unregister(&mut self, token: &str) {
        if let Some(pos) = self.tokens.iter().position(|t| t == token) {
            let _ = self.tokens.remove(pos);
        }
    }

    /// Total connected (duplicates counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no connection is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether at least one connection uses this token.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_unregister() {
        let mut reg = ConnectionRegistry::default();
        reg.register("alice".into());
        reg.register("bob".into());
        assert_eq!(reg.len(), 2);
        assert!(reg.contains("alice"));

        reg.unregister("alice");
        assert_eq!(reg.len(), 1);
        assert!(!reg.contains("alice"));
    }

    #[test]
    fn duplicates_are_kept_and_removed_one_at_a_time() {
        let mut reg = ConnectionRegistry::default();
        reg.register("alice".into());
        reg.register("alice".into());
        assert_eq!(reg.len(), 2);

        reg.unregister("alice");
        assert_eq!(reg.len(), 1);
        assert!(reg.contains("alice"));

        reg.unregister("alice");
        assert!(reg.is_empty());
    }

    #[test]
    fn unregister_absent_is_a_noop() {
        let mut reg = ConnectionRegistry::default();
        reg.register("alice".into());
        reg.unregister("mallory");
        assert_eq!(reg.len(), 1);
    }
}
