//! Canonical handler and animal name keys
//!
//! Free-text names from the results archive arrive with inconsistent
//! diacritics, casing, word order ("Last, First" vs "First Last") and
//! animal naming conventions ("Registered Name (Call)", `"Call"` in quotes,
//! a bare call name or a bare registered name). `NameNormalizer` reduces them
//! to stable keys and builds the team identity from those keys.

use crate::error::{RatingError, Result};
use crate::identity::aliases::AliasTables;
use crate::types::TeamId;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Call name and registered name extracted from a raw animal string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DogName {
    pub call_name: String,
    pub registered_name: String,
}

impl DogName {
    /// Preferred identity token: the call name, else the registered name
    pub fn key(&self) -> &str {
        if self.call_name.is_empty() {
            &self.registered_name
        } else {
            &self.call_name
        }
    }

    pub fn is_empty(&self) -> bool {
        self.call_name.is_empty() && self.registered_name.is_empty()
    }
}

/// Remove diacritics: compatibility decomposition, drop combining marks,
/// then transliterate letters that do not decompose.
pub fn strip_diacritics(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.nfkd().filter(|c| !is_combining_mark(*c)) {
        match ch {
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            'đ' => out.push('d'),
            'Đ' => out.push('D'),
            'ø' => out.push('o'),
            'Ø' => out.push('O'),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            'ß' => out.push_str("ss"),
            _ => out.push(ch),
        }
    }
    out
}

fn normalize_quotes(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
            _ => c,
        })
        .collect()
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sort_words(value: &str) -> String {
    let mut words: Vec<&str> = value.split_whitespace().collect();
    words.sort_unstable();
    words.join(" ")
}

/// Number of whitespace-separated words
pub fn word_count(value: &str) -> usize {
    value.split_whitespace().count()
}

/// Lowercase ASCII-folded text with the team-key separator character removed
fn fold(value: &str) -> String {
    normalize_quotes(&strip_diacritics(value))
        .replace('|', " ")
        .to_lowercase()
}

/// Comparison form of a display string: folded with whitespace collapsed
pub fn fold_key(value: &str) -> String {
    collapse_whitespace(&fold(value))
}

/// Handler key before aliasing: folded, "Last, First" swapped, words sorted
fn handler_base_key(raw: &str) -> String {
    let folded = fold(raw);
    let reordered = match folded.split_once(',') {
        Some((last, first)) => format!("{} {}", first, last),
        None => folded,
    };
    sort_words(&reordered.replace(',', " "))
}

fn rekey(
    table: BTreeMap<String, String>,
    key: fn(&str) -> String,
    value: fn(&str) -> String,
) -> BTreeMap<String, String> {
    table
        .into_iter()
        .map(|(k, v)| (key(&k), value(&v)))
        .collect()
}

fn verbatim(value: &str) -> String {
    value.to_string()
}

/// Bring hand-written table entries into the form lookups compare against
fn canonical_tables(mut aliases: AliasTables) -> AliasTables {
    aliases.handler_aliases = rekey(aliases.handler_aliases, handler_base_key, handler_base_key);
    aliases.handler_display_overrides =
        rekey(aliases.handler_display_overrides, handler_base_key, verbatim);
    aliases.call_name_aliases = rekey(aliases.call_name_aliases, fold_key, fold_key);
    aliases.registered_name_aliases = rekey(aliases.registered_name_aliases, fold_key, fold_key);
    aliases.registered_to_call = rekey(aliases.registered_to_call, fold_key, fold_key);
    aliases.call_name_display = rekey(aliases.call_name_display, fold_key, verbatim);
    aliases.non_call_suffixes = aliases
        .non_call_suffixes
        .iter()
        .map(|s| fold_key(s))
        .collect();
    aliases
}

/// Name normalizer backed by a set of alias tables
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    aliases: AliasTables,
    trailing_parens: Regex,
    trailing_quotes: Regex,
}

impl NameNormalizer {
    pub fn new(aliases: AliasTables) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| RatingError::ConfigurationError {
                message: format!("Invalid name pattern {}: {}", pattern, e),
            })
        };

        Ok(Self {
            aliases: canonical_tables(aliases),
            trailing_parens: compile(r"\(([^)]+)\)\s*$")?,
            trailing_quotes: compile(r#""([^"]+)"\s*$"#)?,
        })
    }

    pub fn aliases(&self) -> &AliasTables {
        &self.aliases
    }

    /// Canonical handler key.
    ///
    /// "Svobodová, Jana", "Jana Svobodova" and "SVOBODOVA  Jana" all map to
    /// "jana svobodova". Words are sorted so the key does not depend on name
    /// order, then the handler alias table is applied.
    pub fn normalize_handler(&self, raw: &str) -> String {
        let mut key = handler_base_key(raw);

        // Follow alias chains; the bound stops cycles in user tables
        for _ in 0..=self.aliases.handler_aliases.len() {
            match self.aliases.handler_aliases.get(&key) {
                Some(target) if *target != key => key = target.clone(),
                _ => break,
            }
        }
        key
    }

    /// Canonical registered name: folded, whitespace collapsed, aliased
    pub fn normalize_registered_name(&self, raw: &str) -> String {
        let name = collapse_whitespace(&fold(raw));
        match self.aliases.registered_name_aliases.get(&name) {
            Some(canonical) => canonical.clone(),
            None => name,
        }
    }

    fn canonical_call_name(&self, name: String) -> String {
        match self.aliases.call_name_aliases.get(&name) {
            Some(canonical) => canonical.clone(),
            None => name,
        }
    }

    /// Split a trailing `(marker)` or `"marker"` off `text`.
    ///
    /// Returns the text before the marker and the marker contents, both
    /// trimmed, in their original spelling.
    pub fn split_trailing_marker<'t>(&self, text: &'t str) -> Option<(&'t str, &'t str)> {
        for pattern in [&self.trailing_parens, &self.trailing_quotes] {
            if let Some(caps) = pattern.captures(text) {
                if let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) {
                    let marker = inner.as_str().trim();
                    if !marker.is_empty() {
                        return Some((text[..whole.start()].trim(), marker));
                    }
                }
            }
        }
        None
    }

    fn is_non_call_suffix(&self, marker: &str) -> bool {
        self.aliases
            .non_call_suffixes
            .contains(&collapse_whitespace(&fold(marker)))
    }

    /// Extract call name and registered name from a raw animal string.
    ///
    /// * `Daylight Neverending Force (Day)` -> call "day", registered
    ///   "daylight neverending force"
    /// * `Finrod Frances "Cis"` -> call "cis", registered "finrod frances"
    /// * a bare name of one or two words is taken as the call name
    /// * a longer bare name is a registered name, resolved to a call name
    ///   through the registered-to-call table when known
    pub fn parse_dog_name(&self, raw: &str) -> DogName {
        let text = normalize_quotes(raw);
        self.parse_text(text.trim())
    }

    fn parse_text(&self, text: &str) -> DogName {
        if text.is_empty() {
            return DogName::default();
        }

        if let Some((head, marker)) = self.split_trailing_marker(text) {
            if self.is_non_call_suffix(marker) {
                return self.parse_text(head);
            }

            let call_name = self.canonical_call_name(collapse_whitespace(&fold(marker)));
            let mut registered_name = self.normalize_registered_name(head);
            // A registered part no longer than the call name is just noise
            if word_count(&registered_name) <= word_count(&call_name) {
                registered_name.clear();
            }
            return DogName {
                call_name,
                registered_name,
            };
        }

        let name = self.canonical_call_name(self.normalize_registered_name(text));
        if word_count(&name) <= 2 {
            return DogName {
                call_name: name,
                registered_name: String::new(),
            };
        }

        match self.aliases.registered_to_call.get(&name) {
            Some(call_name) => DogName {
                call_name: call_name.clone(),
                registered_name: name,
            },
            None => DogName {
                call_name: String::new(),
                registered_name: name,
            },
        }
    }

    /// Team identity of a raw handler + animal pair. Either part may come
    /// back empty when nothing usable is left after normalization.
    pub fn make_team_id(&self, raw_handler: &str, raw_animal: &str) -> TeamId {
        let handler = self.normalize_handler(raw_handler);
        let parsed = self.parse_dog_name(raw_animal);
        TeamId::new(handler, parsed.key())
    }

    /// Call name as written in the source, for display
    pub fn raw_call_name(&self, raw: &str) -> Option<String> {
        let text = normalize_quotes(raw);
        let mut rest = text.trim();
        while let Some((head, marker)) = self.split_trailing_marker(rest) {
            if !self.is_non_call_suffix(marker) {
                return Some(collapse_whitespace(marker));
            }
            rest = head;
        }
        // Without a marker a short name is itself the call name
        if (1..=2).contains(&word_count(rest)) {
            return Some(collapse_whitespace(rest));
        }
        None
    }

    /// Registered name as written in the source, for display
    pub fn raw_registered_name(&self, raw: &str) -> Option<String> {
        let text = normalize_quotes(raw);
        let mut rest = text.trim();
        while let Some((head, _)) = self.split_trailing_marker(rest) {
            rest = head;
        }
        let name = collapse_whitespace(rest);
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}
