//! Permission pairs and effective permission sets

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::util::fold_name;

/// A (screen, action) tuple, e.g. `("Patients", "View")`.
///
/// Equality and hashing ignore letter case, so `("patients", "view")` and
/// `("Patients", "VIEW")` are the same pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PermissionPair {
    pub screen: String,
    pub action: String,
}

impl PermissionPair {
    pub fn new(screen: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            screen: screen.into(),
            action: action.into(),
        }
    }

    /// Case-insensitive match against a screen/action name
    pub fn matches(&self, screen: &str, action: &str) -> bool {
        fold_name(&self.screen) == fold_name(screen) && fold_name(&self.action) == fold_name(action)
    }
}

impl PartialEq for PermissionPair {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.screen, &other.action)
    }
}

impl Eq for PermissionPair {}

impl Hash for PermissionPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        fold_name(&self.screen).hash(state);
        fold_name(&self.action).hash(state);
    }
}

impl fmt::Display for PermissionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.screen, self.action)
    }
}

/// The resolved permission set of one user at check time.
///
/// Built fresh on every authorization check and never cached.
#[derive(Debug, Clone, Default)]
pub struct EffectivePermissions {
    pairs: HashSet<PermissionPair>,
}

impl EffectivePermissions {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the set grants `action` on `screen` (case-insensitive)
    pub fn allows(&self, screen: &str, action: &str) -> bool {
        self.pairs.contains(&PermissionPair::new(screen, action))
    }

    pub fn contains(&self, pair: &PermissionPair) -> bool {
        self.pairs.contains(pair)
    }

    /// First pair of `required` this set does not grant
    pub fn first_missing<'a, I>(&self, required: I) -> Option<&'a PermissionPair>
    where
        I: IntoIterator<Item = &'a PermissionPair>,
    {
        required.into_iter().find(|pair| !self.pairs.contains(*pair))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionPair> {
        self.pairs.iter()
    }

    /// Pairs ordered by screen then action, for stable API output
    pub fn to_sorted_vec(&self) -> Vec<PermissionPair> {
        let mut pairs: Vec<PermissionPair> = self.pairs.iter().cloned().collect();
        pairs.sort_by_key(|p| (fold_name(&p.screen), fold_name(&p.action)));
        pairs
    }
}

impl FromIterator<PermissionPair> for EffectivePermissions {
    fn from_iter<I: IntoIterator<Item = PermissionPair>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_equality_ignores_case() {
        assert_eq!(
            PermissionPair::new("patients", "view"),
            PermissionPair::new("Patients", "VIEW")
        );
        assert_ne!(
            PermissionPair::new("patients", "view"),
            PermissionPair::new("patients", "edit")
        );
    }

    #[test]
    fn test_effective_permissions_allows() {
        let perms: EffectivePermissions = [PermissionPair::new("patients", "view")]
            .into_iter()
            .collect();

        assert!(perms.allows("Patients", "View"));
        assert!(perms.allows("PATIENTS", "view"));
        assert!(!perms.allows("patients", "edit"));
        assert!(!perms.allows("Encounters", "View"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let perms: EffectivePermissions = [
            PermissionPair::new("Patients", "View"),
            PermissionPair::new("patients", "view"),
            PermissionPair::new("Roles", "Edit"),
        ]
        .into_iter()
        .collect();

        assert_eq!(perms.len(), 2);
    }

    #[test]
    fn test_sorted_output() {
        let perms: EffectivePermissions = [
            PermissionPair::new("Users", "View"),
            PermissionPair::new("Patients", "View"),
            PermissionPair::new("Patients", "Add"),
        ]
        .into_iter()
        .collect();

        let sorted: Vec<String> = perms.to_sorted_vec().iter().map(|p| p.to_string()).collect();
        assert_eq!(
            sorted,
            vec!["Patients - Add", "Patients - View", "Users - View"]
        );
    }

    #[test]
    fn test_first_missing() {
        let perms: EffectivePermissions = [
            PermissionPair::new("Users", "View"),
            PermissionPair::new("Users", "Edit"),
        ]
        .into_iter()
        .collect();

        let admin_set = [
            PermissionPair::new("users", "view"),
            PermissionPair::new("Users", "Delete"),
            PermissionPair::new("Roles", "Edit"),
        ];
        assert_eq!(
            perms.first_missing(&admin_set),
            Some(&PermissionPair::new("Users", "Delete"))
        );
        assert_eq!(perms.first_missing(&admin_set[..1]), None);
        assert_eq!(perms.first_missing(std::iter::empty()), None);
    }

    #[test]
    fn test_surrounding_whitespace_is_part_of_the_name() {
        assert_ne!(
            PermissionPair::new("Patients ", "View"),
            PermissionPair::new("Patients", "View")
        );
    }

    #[test]
    fn test_empty_allows_nothing() {
        let perms = EffectivePermissions::empty();
        assert!(perms.is_empty());
        assert!(!perms.allows("Patients", "View"));
    }
}
