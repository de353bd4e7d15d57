//! Competition registry
//!
//! Maps a competition id to its date, tier and display name. Every result
//! row is resolved against the registry at load time, so nothing downstream
//! ever consults a global table.

use crate::error::{RatingError, Result};
use crate::types::{CompetitionId, CompetitionMeta};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize, Serialize)]
struct RegistryFile {
    #[serde(default)]
    competition: Vec<CompetitionMeta>,
}

/// Known competitions keyed by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompetitionRegistry {
    competitions: BTreeMap<CompetitionId, CompetitionMeta>,
}

impl CompetitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a registry from TOML `[[competition]]` entries
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RegistryFile =
            toml::from_str(content).map_err(|e| RatingError::RegistryError {
                message: format!("Invalid registry: {}", e),
            })?;

        let mut registry = Self::new();
        for meta in file.competition {
            registry.insert(meta)?;
        }
        Ok(registry)
    }

    /// Load a registry file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RatingError::RegistryError {
            message: format!("Failed to read registry {}: {}", path.display(), e),
        })?;
        let registry = Self::from_toml_str(&content)?;
        info!(
            "Loaded {} competitions from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Add a competition. Ids must be unique and tiers start at 1.
    pub fn insert(&mut self, meta: CompetitionMeta) -> Result<()> {
        if meta.id.trim().is_empty() {
            return Err(RatingError::RegistryError {
                message: "Competition id cannot be empty".to_string(),
            }
            .into());
        }
        if meta.tier == 0 {
            return Err(RatingError::RegistryError {
                message: format!("Competition {} has tier 0; tiers start at 1", meta.id),
            }
            .into());
        }
        if self.competitions.contains_key(&meta.id) {
            return Err(RatingError::RegistryError {
                message: format!("Duplicate competition id: {}", meta.id),
            }
            .into());
        }
        self.competitions.insert(meta.id.clone(), meta);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&CompetitionMeta> {
        self.competitions.get(id)
    }

    /// Look up a competition, failing for unknown ids
    pub fn require(&self, id: &str) -> Result<&CompetitionMeta> {
        self.get(id).ok_or_else(|| {
            RatingError::UnknownCompetition {
                competition_id: id.to_string(),
            }
            .into()
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.competitions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.competitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.competitions.is_empty()
    }

    /// Competitions in id order
    pub fn iter(&self) -> impl Iterator<Item = &CompetitionMeta> {
        self.competitions.values()
    }

    /// Date of the most recent competition
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.competitions.values().map(|c| c.date).max()
    }
}
