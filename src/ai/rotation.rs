//! Credential/model failover rotation.
//!
//! One (credential, model) pair is active at a time for the whole process.
//! Advancing moves to the next model; after the last model it moves to the
//! next credential and starts again from the first model, wrapping around.

use parking_lot::Mutex;

/// The pair currently used for AI calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverPair {
    /// Position of the credential in the configured list.
    pub key_index: usize,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    key: usize,
    model: usize,
}

#[derive(Debug)]
pub struct ModelRotation {
    keys: Vec<String>,
    models: Vec<String>,
    cursor: Mutex<Cursor>,
}

impl ModelRotation {
    pub fn new(keys: Vec<String>, models: Vec<String>) -> Self {
        Self {
            keys,
            models,
            cursor: Mutex::new(Cursor::default()),
        }
    }

    /// `false` when there is no credential or no model to use.
    pub fn is_configured(&self) -> bool {
        !self.keys.is_empty() && !self.models.is_empty()
    }

    /// Number of distinct pairs in the rotation.
    pub fn len(&self) -> usize {
        self.keys.len() * self.models.len()
    }

    pub fn current(&self) -> Option<FailoverPair> {
        if !self.is_configured() {
            return None;
        }
        let cursor = *self.cursor.lock();
        Some(FailoverPair {
            key_index: cursor.key,
            api_key: self.keys[cursor.key].clone(),
            model: self.models[cursor.model].clone(),
        })
    }

    /// Move to the next pair and return it.
    pub fn advance(&self) -> Option<FailoverPair> {
        if !self.is_configured() {
            return None;
        }
        {
            let mut cursor = self.cursor.lock();
            cursor.model += 1;
            if cursor.model >= self.models.len() {
                cursor.model = 0;
                cursor.key = (cursor.key + 1) % self.keys.len();
            }
        }
        self.current()
    }

    /// Advance only if `failed` is still the active pair.
    ///
    /// Concurrent failures on the same pair then move the rotation once.
    pub fn advance_from(&self, failed: &FailoverPair) -> Option<FailoverPair> {
        if self.current().as_ref() == Some(failed) {
            self.advance()
        } else {
            self.current()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotation(keys: &[&str], models: &[&str]) -> ModelRotation {
        ModelRotation::new(
            keys.iter().map(|s| s.to_string()).collect(),
            models.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn pair_of(r: &ModelRotation) -> (String, String) {
        let p = r.current().unwrap();
        (p.api_key, p.model)
    }

    #[test]
    fn test_models_first_then_next_credential() {
        let r = rotation(&["k1", "k2"], &["m1", "m2"]);

        assert_eq!(pair_of(&r), ("k1".into(), "m1".into()));
        r.advance();
        assert_eq!(pair_of(&r), ("k1".into(), "m2".into()));
        r.advance();
        assert_eq!(pair_of(&r), ("k2".into(), "m1".into()));
        r.advance();
        assert_eq!(pair_of(&r), ("k2".into(), "m2".into()));
    }

    #[test]
    fn test_rotation_wraps_circularly() {
        let r = rotation(&["k1", "k2", "k3"], &["m1", "m2"]);
        let start = r.current();

        for _ in 0..r.len() {
            r.advance();
        }
        assert_eq!(r.current(), start);
    }

    #[test]
    fn test_stale_failure_does_not_double_advance() {
        let r = rotation(&["k1"], &["m1", "m2", "m3"]);
        let failed = r.current().unwrap();

        r.advance_from(&failed);
        r.advance_from(&failed);
        assert_eq!(r.current().unwrap().model, "m2");
    }

    #[test]
    fn test_empty_rotation() {
        let r = rotation(&[], &["m1"]);
        assert!(!r.is_configured());
        assert!(r.current().is_none());
        assert!(r.advance().is_none());
    }
}
