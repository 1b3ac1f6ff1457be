//! Permission maps for pages, subpages, and sections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use staffgate_core::{AppError, AppResult};

/// View/edit toggle pair for one named surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToggle {
    /// Whether the surface may be viewed.
    #[serde(default)]
    pub can_view: bool,
    /// Whether the surface may be edited.
    #[serde(default)]
    pub can_edit: bool,
}

/// Mapping of surface name to its view/edit toggles.
///
/// Keys are unique and carry no ordering significance; a sorted map keeps
/// serialized output deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMap(BTreeMap<String, AccessToggle>);

impl PermissionMap {
    /// Creates an empty permission map.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builds a validated map from name/toggle pairs, rejecting blank names.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, AccessToggle)>,
    ) -> AppResult<Self> {
        let mut map = BTreeMap::new();
        for (name, toggle) in entries {
            if name.trim().is_empty() {
                return Err(AppError::Validation(
                    "permission map keys must not be empty".to_owned(),
                ));
            }
            map.insert(name, toggle);
        }

        Ok(Self(map))
    }

    /// Validates key shape on a map deserialized from an API payload.
    pub fn validate(&self) -> AppResult<()> {
        if self.0.keys().any(|name| name.trim().is_empty()) {
            return Err(AppError::Validation(
                "permission map keys must not be empty".to_owned(),
            ));
        }

        Ok(())
    }

    /// Number of named surfaces in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over name/toggle pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AccessToggle)> {
        self.0.iter()
    }

    /// Returns the toggle for a named surface, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AccessToggle> {
        self.0.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessToggle, PermissionMap};

    #[test]
    fn blank_keys_are_rejected() {
        let result = PermissionMap::from_entries([(
            "  ".to_owned(),
            AccessToggle {
                can_view: true,
                can_edit: false,
            },
        )]);
        assert!(result.is_err());
    }

    #[test]
    fn entries_are_retrievable_by_name() {
        let map = PermissionMap::from_entries([(
            "jobs".to_owned(),
            AccessToggle {
                can_view: true,
                can_edit: true,
            },
        )]);
        let map = match map {
            Ok(map) => map,
            Err(error) => panic!("valid map rejected: {error}"),
        };
        assert_eq!(map.len(), 1);
        assert!(map.get("jobs").is_some_and(|toggle| toggle.can_edit));
    }

    #[test]
    fn missing_toggle_fields_default_to_false() {
        let parsed: Result<PermissionMap, _> =
            serde_json::from_str(r#"{"candidates": {"can_view": true}}"#);
        let map = match parsed {
            Ok(map) => map,
            Err(error) => panic!("failed to parse map: {error}"),
        };
        assert!(map.get("candidates").is_some_and(|toggle| !toggle.can_edit));
    }
}
