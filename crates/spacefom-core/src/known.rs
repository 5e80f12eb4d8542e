//! Known federate list.
//!
//! The runtime uses the required entries to gate start-of-simulation: the
//! federation time loop does not start until each of them has joined.

use crate::error::ConfigError;

/// A federation participant this federate expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownFederate {
    /// Federate name as it joins the federation.
    pub name: String,
    /// Whether start-up waits for this federate.
    pub required: bool,
}

/// Ordered, name-unique list of known federates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownFederateSet {
    entries: Vec<KnownFederate>,
}

impl KnownFederateSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a known federate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DuplicateKnownFederate` if the name is already
    /// listed and `ConfigError::EmptyName` for an empty name.
    pub fn add_known_federate(
        &mut self,
        required: bool,
        name: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyName { what: "known federate" });
        }
        if self.contains(&name) {
            return Err(ConfigError::DuplicateKnownFederate { name });
        }

        self.entries.push(KnownFederate { name, required });
        Ok(())
    }

    /// Whether a federate with this name is listed.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&KnownFederate> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Names of all required federates, in insertion order.
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter(|entry| entry.required).map(|entry| entry.name.as_str())
    }

    /// All entries, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &KnownFederate> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that `federate` lists itself.
    ///
    /// An empty set means this federate waits for nobody and is accepted.
    pub fn check_self_registered(&self, federate: &str) -> Result<(), ConfigError> {
        if self.is_empty() || self.contains(federate) {
            return Ok(());
        }
        Err(ConfigError::SelfNotKnown { federate: federate.to_string() })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_name_is_rejected() {
        let mut known = KnownFederateSet::new();
        known.add_known_federate(true, "Master").unwrap();

        let err = known.add_known_federate(false, "Master").unwrap_err();
        assert_eq!(err, ConfigError::DuplicateKnownFederate { name: "Master".to_string() });
        assert_eq!(known.len(), 1);
        assert!(known.get("Master").is_some_and(|entry| entry.required));
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut known = KnownFederateSet::new();
        known.add_known_federate(true, "RRFP").unwrap();
        known.add_known_federate(true, "rrfp").unwrap();
        assert_eq!(known.len(), 2);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut known = KnownFederateSet::new();
        assert!(matches!(known.add_known_federate(true, ""), Err(ConfigError::EmptyName { .. })));
    }

    #[test]
    fn required_names_keep_insertion_order() {
        let mut known = KnownFederateSet::new();
        known.add_known_federate(true, "Other").unwrap();
        known.add_known_federate(false, "Observer").unwrap();
        known.add_known_federate(true, "Master").unwrap();

        let required: Vec<_> = known.required_names().collect();
        assert_eq!(required, vec!["Other", "Master"]);
    }

    #[test]
    fn self_registration() {
        let mut known = KnownFederateSet::new();
        assert!(known.check_self_registered("RRFP").is_ok());

        known.add_known_federate(true, "Master").unwrap();
        assert!(matches!(
            known.check_self_registered("RRFP"),
            Err(ConfigError::SelfNotKnown { .. })
        ));

        known.add_known_federate(true, "RRFP").unwrap();
        assert!(known.check_self_registered("RRFP").is_ok());
    }
}
