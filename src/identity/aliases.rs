//! Alias tables for handler and animal names
//!
//! All keys and values are in normalized form (diacritics stripped,
//! lowercased, whitespace collapsed). The built-in tables cover known
//! spelling variants in the results archive; a TOML file can extend or
//! override any entry.

use crate::error::{RatingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Deterministic lookup tables consulted during normalization and display
///
/// Sections missing from a parsed file are empty; the built-in entries come
/// from `Default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasTables {
    /// Normalized handler key -> canonical handler key
    #[serde(default)]
    pub handler_aliases: BTreeMap<String, String>,
    /// Canonical handler key -> preferred display name
    #[serde(default)]
    pub handler_display_overrides: BTreeMap<String, String>,
    /// Normalized call name -> canonical call name
    #[serde(default)]
    pub call_name_aliases: BTreeMap<String, String>,
    /// Parenthesized or quoted suffixes that are not call names
    #[serde(default)]
    pub non_call_suffixes: BTreeSet<String>,
    /// Registered name spelling variants -> canonical registered name
    #[serde(default)]
    pub registered_name_aliases: BTreeMap<String, String>,
    /// Registered name -> call name, for entries without a marker
    #[serde(default)]
    pub registered_to_call: BTreeMap<String, String>,
    /// Call name -> preferred display form
    #[serde(default)]
    pub call_name_display: BTreeMap<String, String>,
}

fn table(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for AliasTables {
    fn default() -> Self {
        Self {
            handler_aliases: table(&[("katka tercova", "katerina tercova")]),
            handler_display_overrides: table(&[
                ("katerina tercova", "Kateřina Terčová"),
                ("golab iwona", "Iwona Gołąb"),
                ("petra vyplelova", "Petra Vyplelová"),
            ]),
            call_name_aliases: table(&[
                ("sayonara", "seeya"),
                ("sayonara seeya", "seeya"),
                ("black swan", "chilli"),
                ("finrod frances", "cis"),
                ("pszenik", "psenik"),
            ]),
            non_call_suffixes: ["cp"].iter().map(|s| s.to_string()).collect(),
            registered_name_aliases: table(&[
                ("clever and fastvof youwentis", "clever and fast of youwentis"),
                ("nnl sayonara", "never never land sayonara"),
                ("never never land s'sayonara", "never never land sayonara"),
            ]),
            registered_to_call: table(&[
                ("night magic alfa fortuna", "beat"),
                ("olympia misty highland", "olinka"),
                ("frisky fantine z certovy kazatelny", "fanta"),
                ("shepworld i want it all", "katniss"),
                ("shepworld i'm on fire", "brant"),
                ("finrod frances wonderfull dream", "cis"),
                ("a3ch finrod frances wonderfull dream", "cis"),
                ("finrod frances wonderfull dream cis", "cis"),
                ("a3ch libby granting pleasure", "psenik"),
                ("libby granting pleasure", "psenik"),
                ("clever and fast of youwentis", "carrie"),
                ("never never land sayonara", "seeya"),
                ("black swan gates of heaven", "chilli"),
                ("galactic breez almondjoy", "twist"),
                ("a3ch flank \"ray\" ballarat", "ray"),
                ("a3ch farid fort fox", "shani"),
            ]),
            call_name_display: table(&[
                ("chilli", "Chilli"),
                ("cis", "Cis"),
                ("psenik", "Pšeník"),
                ("ray", "Ray"),
            ]),
        }
    }
}

impl AliasTables {
    /// Tables with no entries at all
    pub fn empty() -> Self {
        Self {
            handler_aliases: BTreeMap::new(),
            handler_display_overrides: BTreeMap::new(),
            call_name_aliases: BTreeMap::new(),
            non_call_suffixes: BTreeSet::new(),
            registered_name_aliases: BTreeMap::new(),
            registered_to_call: BTreeMap::new(),
            call_name_display: BTreeMap::new(),
        }
    }

    /// Parse tables from TOML. Missing sections are empty.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let tables = toml::from_str(content).map_err(|e| RatingError::ConfigurationError {
            message: format!("Invalid alias tables: {}", e),
        })?;
        Ok(tables)
    }

    /// Built-in tables extended by the entries of a TOML file
    pub fn load_with_overrides(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RatingError::ConfigurationError {
            message: format!("Failed to read alias file {}: {}", path.display(), e),
        })?;
        let mut tables = Self::default();
        tables.extend(Self::from_toml_str(&content)?);
        Ok(tables)
    }

    /// Add every entry of `other`, replacing existing keys
    pub fn extend(&mut self, other: AliasTables) {
        self.handler_aliases.extend(other.handler_aliases);
        self.handler_display_overrides
            .extend(other.handler_display_overrides);
        self.call_name_aliases.extend(other.call_name_aliases);
        self.non_call_suffixes.extend(other.non_call_suffixes);
        self.registered_name_aliases
            .extend(other.registered_name_aliases);
        self.registered_to_call.extend(other.registered_to_call);
        self.call_name_display.extend(other.call_name_display);
    }

    /// Total number of entries across all tables
    pub fn len(&self) -> usize {
        self.handler_aliases.len()
            + self.handler_display_overrides.len()
            + self.call_name_aliases.len()
            + self.non_call_suffixes.len()
            + self.registered_name_aliases.len()
            + self.registered_to_call.len()
            + self.call_name_display.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
