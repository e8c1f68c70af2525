use crate::domain::profile::AllocationProfileName;
use crate::domain::recommendation::AllocationProfile;
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

/// The embedded allocation asset. Edit the JSON, bump its version; the table
/// itself is never hand-built in code.
const DEFAULT_TABLE_JSON: &str = include_str!("../../assets/allocations.json");

/// Versioned per-profile allocation data, loaded once at startup and shared
/// read-only across callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationTable {
    pub version: u32,
    pub profiles: Vec<AllocationProfile>,
}

impl AllocationTable {
    pub fn load_default() -> anyhow::Result<Self> {
        Self::from_json(DEFAULT_TABLE_JSON).context("embedded allocation table is invalid")
    }

    /// Parse and validate a table. A profile may be absent (the engine fails
    /// closed to its default for it), but present entries must be sane.
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let table: AllocationTable =
            serde_json::from_str(raw).context("allocation table is not valid JSON")?;

        for profile in &table.profiles {
            let dupes = table
                .profiles
                .iter()
                .filter(|p| p.profile == profile.profile)
                .count();
            ensure!(
                dupes == 1,
                "duplicate allocation entry for profile {}",
                profile.profile
            );
            validate_weights(
                profile.profile,
                "asset class",
                profile.asset_classes.iter().map(|c| c.weight_percent),
            )?;
            ensure!(
                !profile.instruments.is_empty(),
                "profile {} has no instruments",
                profile.profile
            );
            validate_weights(
                profile.profile,
                "instrument",
                profile.instruments.iter().map(|i| i.weight_percent),
            )?;
        }

        Ok(table)
    }

    pub fn weights_for(&self, profile: AllocationProfileName) -> Option<&AllocationProfile> {
        self.profiles.iter().find(|p| p.profile == profile)
    }
}

fn validate_weights(
    profile: AllocationProfileName,
    kind: &str,
    weights: impl Iterator<Item = f64>,
) -> anyhow::Result<()> {
    let mut sum = 0.0;
    for w in weights {
        ensure!(
            w.is_finite() && w >= 0.0,
            "profile {profile} has a negative or non-finite {kind} weight"
        );
        sum += w;
    }
    ensure!(
        sum > 0.0,
        "profile {profile} {kind} weights must sum to a positive value"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_table_loads_with_all_profiles() {
        let table = AllocationTable::load_default().unwrap();
        assert_eq!(table.version, 1);
        for profile in AllocationProfileName::ALL {
            let entry = table.weights_for(profile).unwrap();
            assert!(!entry.asset_classes.is_empty());
            assert!(!entry.instruments.is_empty());
        }
    }

    #[test]
    fn sparse_table_is_accepted() {
        let raw = json!({
            "version": 7,
            "profiles": [
                {
                    "profile": "moderate",
                    "asset_classes": [
                        {"asset_class": "bonds", "weight_percent": 60.0},
                        {"asset_class": "cash", "weight_percent": 40.0}
                    ],
                    "instruments": [
                        {"ticker": "AGG", "name": "Agg Bond", "weight_percent": 100.0, "rationale": "bonds"}
                    ]
                }
            ]
        })
        .to_string();

        let table = AllocationTable::from_json(&raw).unwrap();
        assert!(table.weights_for(AllocationProfileName::Moderate).is_some());
        assert!(table
            .weights_for(AllocationProfileName::Aggressive)
            .is_none());
    }

    #[test]
    fn rejects_negative_weights() {
        let raw = json!({
            "version": 1,
            "profiles": [
                {
                    "profile": "moderate",
                    "asset_classes": [
                        {"asset_class": "bonds", "weight_percent": -5.0}
                    ],
                    "instruments": [
                        {"ticker": "AGG", "name": "Agg Bond", "weight_percent": 100.0, "rationale": "bonds"}
                    ]
                }
            ]
        })
        .to_string();
        assert!(AllocationTable::from_json(&raw).is_err());
    }

    #[test]
    fn rejects_duplicate_profiles() {
        let entry = json!({
            "profile": "aggressive",
            "asset_classes": [{"asset_class": "equity", "weight_percent": 100.0}],
            "instruments": [{"ticker": "QQQ", "name": "Nasdaq 100", "weight_percent": 100.0, "rationale": "growth"}]
        });
        let raw = json!({"version": 1, "profiles": [entry, entry]}).to_string();
        assert!(AllocationTable::from_json(&raw).is_err());
    }
}
