use super::Profile;
use crate::error::Error;
use crate::inventory::Facts;
use std::path::Path;

/// How strictly a profile has to agree with the inventory to be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Only a profile declaring exactly the detected facts is selectable.
    Exact,
    /// The highest scoring profile wins, even with partial or no overlap.
    BestEffort,
}

impl MatchPolicy {
    pub fn from_exact(exact: bool) -> Self {
        if exact {
            MatchPolicy::Exact
        } else {
            MatchPolicy::BestEffort
        }
    }
}

impl std::fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchPolicy::Exact => write!(f, "exact"),
            MatchPolicy::BestEffort => write!(f, "best-effort"),
        }
    }
}

/// Scores profile declarations against an inventory.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    policy: MatchPolicy,
}

impl Matcher {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Score the declaration at `path`. Unreadable or malformed profiles
    /// are reported and score 0 so the rest of the scan can go on.
    pub fn score(&self, path: &Path, inventory: &Facts) -> usize {
        if !path.is_file() || inventory.is_empty() {
            return 0;
        }

        match Profile::load(path) {
            Ok(profile) => self.score_facts(&profile.facts, inventory),
            Err(e @ Error::ProfilePermission { .. }) => {
                tracing::warn!("{}", e);
                0
            }
            Err(e) => {
                tracing::warn!("skipping profile: {}", e);
                0
            }
        }
    }

    /// Number of declared facts the inventory agrees with.
    ///
    /// Facts the profile leaves out cost nothing. In exact mode a profile
    /// equal to the inventory short-circuits to the inventory size.
    pub fn score_facts(&self, profile: &Facts, inventory: &Facts) -> usize {
        if self.policy == MatchPolicy::Exact && profile == inventory {
            return inventory.len();
        }

        profile
            .iter()
            .filter(|(key, value)| {
                inventory
                    .get(*key)
                    .is_some_and(|detected| detected.to_lowercase() == value.to_lowercase())
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn facts(pairs: &[(&str, &str)]) -> Facts {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_containment_scoring_is_asymmetric() {
        let matcher = Matcher::new(MatchPolicy::BestEffort);
        let profile = facts(&[("cpu", "X")]);
        let inventory = facts(&[("cpu", "X"), ("memory", "Y")]);
        assert_eq!(matcher.score_facts(&profile, &inventory), 1);
    }

    #[test]
    fn test_values_compare_case_insensitively() {
        let matcher = Matcher::new(MatchPolicy::BestEffort);
        let profile = facts(&[("gpu", "AMD RADEON 780M")]);
        let inventory = facts(&[("gpu", "AMD Radeon 780M")]);
        assert_eq!(matcher.score_facts(&profile, &inventory), 1);
    }

    #[test]
    fn test_mismatches_and_unknown_keys_score_nothing() {
        let matcher = Matcher::new(MatchPolicy::BestEffort);
        let profile = facts(&[("cpu", "X"), ("board", "B"), ("dock", "yes")]);
        let inventory = facts(&[("cpu", "Z"), ("board", "B")]);
        assert_eq!(matcher.score_facts(&profile, &inventory), 1);
    }

    #[test]
    fn test_exact_match_scores_full_inventory() {
        let matcher = Matcher::new(MatchPolicy::Exact);
        let inventory = facts(&[("cpu", "X"), ("memory", "Y"), ("monitors", "2")]);

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("components.yml");
        // declared in a different order than the inventory iterates
        fs::write(&path, "monitors: 2\nMemory: Y\ncpu: X\n").unwrap();

        assert_eq!(matcher.score(&path, &inventory), inventory.len());
    }

    #[test]
    fn test_missing_file_scores_zero() {
        let matcher = Matcher::new(MatchPolicy::BestEffort);
        let inventory = facts(&[("cpu", "X")]);
        assert_eq!(matcher.score(Path::new("/nonexistent/components.yml"), &inventory), 0);
    }

    #[test]
    fn test_empty_inventory_scores_zero() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("components.yml");
        fs::write(&path, "cpu: X\n").unwrap();

        let matcher = Matcher::new(MatchPolicy::BestEffort);
        assert_eq!(matcher.score(&path, &Facts::new()), 0);
    }

    #[test]
    fn test_malformed_profile_scores_zero() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("components.yml");
        fs::write(&path, "cpu: [unterminated\n").unwrap();

        let matcher = Matcher::new(MatchPolicy::BestEffort);
        assert_eq!(matcher.score(&path, &facts(&[("cpu", "X")])), 0);
    }

    #[test]
    fn test_policy_from_config_flag() {
        assert_eq!(MatchPolicy::from_exact(true), MatchPolicy::Exact);
        assert_eq!(MatchPolicy::from_exact(false), MatchPolicy::BestEffort);
        assert_eq!(MatchPolicy::BestEffort.to_string(), "best-effort");
    }
}
