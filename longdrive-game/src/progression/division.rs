use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::CatalogError;

const DEFAULT_DIVISION_DATA: &str = include_str!("../../assets/data/divisions.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    pub id: String,
    pub name: String,
    pub min_xp: u64,
}

/// Division ladder ordered by ascending `min_xp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionTable {
    pub divisions: Vec<Division>,
}

impl DivisionTable {
    /// Load the ladder from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or if validation fails.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let table: Self = serde_json::from_str(json).map_err(|source| CatalogError::Parse {
            table: "divisions",
            source,
        })?;
        table.validate()?;
        Ok(table)
    }

    /// Embedded default ladder.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset is malformed.
    pub fn default_config() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_DIVISION_DATA)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let Some(first) = self.divisions.first() else {
            return Err(CatalogError::Empty("divisions"));
        };
        if first.min_xp != 0 {
            return Err(CatalogError::malformed(
                "divisions",
                &first.id,
                "the first division must start at 0 xp",
            ));
        }
        let mut seen = HashSet::new();
        for division in &self.divisions {
            if !seen.insert(division.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    table: "divisions",
                    id: division.id.clone(),
                });
            }
        }
        if let Some(pair) = self
            .divisions
            .windows(2)
            .find(|pair| pair[1].min_xp <= pair[0].min_xp)
        {
            return Err(CatalogError::malformed(
                "divisions",
                &pair[1].id,
                "thresholds must be strictly increasing",
            ));
        }
        Ok(())
    }

    /// Highest division whose threshold is at or below `xp`.
    #[must_use]
    pub fn division_from_xp(&self, xp: u64) -> Option<&Division> {
        self.divisions.iter().rev().find(|d| d.min_xp <= xp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_highest_reached_threshold() {
        let table = DivisionTable::default_config().unwrap();
        assert_eq!(table.division_from_xp(0).unwrap().id, "bronze");
        assert_eq!(table.division_from_xp(499).unwrap().id, "bronze");
        assert_eq!(table.division_from_xp(500).unwrap().id, "silver");
        assert_eq!(table.division_from_xp(u64::MAX).unwrap().id, "legend");
    }

    #[test]
    fn unordered_ladder_is_rejected() {
        let json = r#"{"divisions":[
            {"id":"a","name":"A","min_xp":0},
            {"id":"b","name":"B","min_xp":100},
            {"id":"c","name":"C","min_xp":100}
        ]}"#;
        assert!(matches!(
            DivisionTable::from_json(json),
            Err(CatalogError::Malformed { .. })
        ));
    }
}
