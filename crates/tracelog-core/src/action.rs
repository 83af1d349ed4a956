//! The action whitelist.

use tracelog_types::{TracingError, DEFAULT_ACTIONS};

/// Errors raised while building a whitelist from configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WhitelistError {
    /// No actions were configured.
    #[error("action whitelist cannot be empty")]
    Empty,
    /// An entry was empty or whitespace only.
    #[error("action whitelist contains a blank entry")]
    BlankEntry,
}

/// The fixed set of permitted actions, stored lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionWhitelist {
    actions: Vec<String>,
}

impl ActionWhitelist {
    /// Builds a whitelist, lower-casing and de-duplicating entries while
    /// keeping their first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`WhitelistError`] for an empty list or a blank entry.
    pub fn new<I, S>(actions: I) -> Result<Self, WhitelistError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for action in actions {
            let action = action.as_ref().trim().to_lowercase();
            if action.is_empty() {
                return Err(WhitelistError::BlankEntry);
            }
            if !normalized.contains(&action) {
                normalized.push(action);
            }
        }

        if normalized.is_empty() {
            return Err(WhitelistError::Empty);
        }

        Ok(Self {
            actions: normalized,
        })
    }

    /// Returns `true` if `action` is permitted, ignoring case.
    pub fn contains(&self, action: &str) -> bool {
        let action = action.to_lowercase();
        self.actions.iter().any(|a| *a == action)
    }

    /// The permitted actions, lower-case, in configuration order.
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Checks `action` against the whitelist and returns its lower-cased form.
    ///
    /// # Errors
    ///
    /// Returns [`TracingError::InvalidPayload`] if `action` is empty or not
    /// permitted. The message lists the permitted actions.
    pub fn validate(&self, action: &str) -> Result<String, TracingError> {
        if action.is_empty() {
            return Err(TracingError::InvalidPayload(format!(
                "Action type could not be empty. Use one of: {}",
                self.actions.join(", ")
            )));
        }

        if !self.contains(action) {
            return Err(TracingError::InvalidPayload(format!(
                "'{}' is not supported. Use one of: {}",
                action,
                self.actions.join(", ")
            )));
        }

        Ok(action.to_lowercase())
    }
}

impl Default for ActionWhitelist {
    fn default() -> Self {
        Self {
            actions: DEFAULT_ACTIONS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_lower_cases_known_actions() {
        let whitelist = ActionWhitelist::default();
        assert_eq!(whitelist.validate("READ").unwrap(), "read");
        assert_eq!(whitelist.validate("Write").unwrap(), "write");
    }

    #[test]
    fn validate_rejects_unknown_action_and_lists_options() {
        let whitelist = ActionWhitelist::new(["read", "write"]).unwrap();
        let err = whitelist.validate("fly").unwrap_err();
        assert_eq!(
            err,
            TracingError::InvalidPayload("'fly' is not supported. Use one of: read, write".into())
        );
    }

    #[test]
    fn validate_rejects_empty_action() {
        let whitelist = ActionWhitelist::new(["read"]).unwrap();
        let err = whitelist.validate("").unwrap_err();
        assert_eq!(err.kind(), "InvalidPayload");
        assert!(err.message().starts_with("Action type could not be empty"));
    }

    #[test]
    fn new_normalizes_and_dedupes() {
        let whitelist = ActionWhitelist::new([" Read", "READ", "write "]).unwrap();
        assert_eq!(whitelist.actions(), ["read", "write"]);
        assert!(whitelist.contains("WRITE"));
    }

    #[test]
    fn new_rejects_empty_and_blank() {
        assert_eq!(
            ActionWhitelist::new(Vec::<String>::new()),
            Err(WhitelistError::Empty)
        );
        assert_eq!(
            ActionWhitelist::new(["read", "  "]),
            Err(WhitelistError::BlankEntry)
        );
    }
}
