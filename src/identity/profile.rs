//! Display metadata for resolved teams
//!
//! A team is seen under many raw spellings. The profile builder votes over
//! all of them to pick the strings shown in leaderboards, preferring the
//! spelling with the most non-ASCII characters when several are equally
//! common, since that one is usually the authentic form.

use crate::identity::normalizer::{fold_key, NameNormalizer};
use crate::types::{RunResult, TeamId};
use crate::utils::non_ascii_count;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Best-known display strings for one team
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamProfile {
    pub team_id: TeamId,
    pub handler_display: String,
    pub call_name: String,
    pub registered_name: String,
    /// "Registered (Call)", or whichever of the two is known
    pub dog_display: String,
    pub country: String,
}

/// Occurrence counts that remember first-seen order
#[derive(Debug, Default)]
struct Tally {
    entries: Vec<(String, usize)>,
}

impl Tally {
    fn add(&mut self, value: &str) {
        self.add_many(value, 1);
    }

    fn add_many(&mut self, value: &str, times: usize) {
        if value.is_empty() || times == 0 {
            return;
        }
        match self.entries.iter_mut().find(|(v, _)| v == value) {
            Some((_, count)) => *count += times,
            None => self.entries.push((value.to_string(), times)),
        }
    }

    fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(v, _)| v.as_str())
    }

    /// Entry with the highest `(count, score)`; the first seen wins ties
    fn best_by<K: Ord>(&self, score: impl Fn(&str) -> K) -> Option<&str> {
        let mut best: Option<(&str, (usize, K))> = None;
        for (value, count) in &self.entries {
            let key = (*count, score(value));
            if best.as_ref().map_or(true, |(_, b)| key > *b) {
                best = Some((value.as_str(), key));
            }
        }
        best.map(|(value, _)| value)
    }
}

/// Spelling with the most non-ASCII characters; first seen wins ties
fn most_authentic<'v>(values: impl Iterator<Item = &'v str>) -> Option<&'v str> {
    let mut best: Option<&str> = None;
    for value in values {
        if best.map_or(true, |b| non_ascii_count(value) > non_ascii_count(b)) {
            best = Some(value);
        }
    }
    best
}

/// "Last, First" -> "First Last"
fn first_last(value: &str) -> String {
    let reordered = match value.split_once(',') {
        Some((last, first)) => format!("{} {}", first.trim(), last.trim()),
        None => value.to_string(),
    };
    reordered.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Default)]
struct Observations {
    handlers: Tally,
    animals: Tally,
    countries: Tally,
}

/// Builds `TeamProfile`s from the runs of resolved teams
pub struct ProfileBuilder<'a> {
    normalizer: &'a NameNormalizer,
}

impl<'a> ProfileBuilder<'a> {
    pub fn new(normalizer: &'a NameNormalizer) -> Self {
        Self { normalizer }
    }

    /// One profile per distinct team id in `runs`
    pub fn build(&self, runs: &[RunResult]) -> BTreeMap<TeamId, TeamProfile> {
        let mut observed: BTreeMap<&TeamId, Observations> = BTreeMap::new();
        for run in runs {
            let obs = observed.entry(&run.team_id).or_default();
            obs.handlers.add(run.handler.trim());
            obs.animals.add(run.animal.trim());
            obs.countries.add(run.country.trim());
        }

        let mut profiles: BTreeMap<TeamId, TeamProfile> = observed
            .into_iter()
            .map(|(id, obs)| (id.clone(), self.profile(id, &obs)))
            .collect();

        self.backfill_countries(&mut profiles);
        profiles
    }

    fn profile(&self, id: &TeamId, obs: &Observations) -> TeamProfile {
        let handler_display = self.handler_display(id, &obs.handlers);
        let (call_name, registered_name) = self.dog_names(&obs.animals);

        let dog_display = match (registered_name.is_empty(), call_name.is_empty()) {
            (false, false) => format!("{} ({})", registered_name, call_name),
            (false, true) => registered_name.clone(),
            (true, false) => call_name.clone(),
            (true, true) => String::new(),
        };

        TeamProfile {
            team_id: id.clone(),
            handler_display,
            call_name,
            registered_name,
            dog_display,
            country: obs
                .countries
                .best_by(|_| ())
                .unwrap_or_default()
                .to_string(),
        }
    }

    fn handler_display(&self, id: &TeamId, handlers: &Tally) -> String {
        if let Some(display) = self.normalizer.aliases().handler_display_overrides.get(&id.handler) {
            return display.clone();
        }

        // A "Last, First" spelling is the most reliable about word order
        if let Some(comma) = most_authentic(handlers.values().filter(|h| h.contains(','))) {
            return first_last(comma);
        }

        handlers
            .best_by(non_ascii_count)
            .map(first_last)
            .unwrap_or_default()
    }

    fn dog_names(&self, animals: &Tally) -> (String, String) {
        let mut calls = Tally::default();
        let mut registered = Tally::default();
        for (raw, count) in &animals.entries {
            let parsed = self.normalizer.parse_dog_name(raw);
            calls.add_many(&parsed.call_name, *count);
            registered.add_many(&parsed.registered_name, *count);
        }

        let call_name = calls
            .best_by(|_| ())
            .map(|call| self.call_display(call, animals))
            .unwrap_or_default();
        let registered_name = registered
            .best_by(|name| name.split_whitespace().count())
            .map(|name| self.registered_display(name, animals))
            .unwrap_or_default();

        (call_name, registered_name)
    }

    fn call_display(&self, call: &str, animals: &Tally) -> String {
        if let Some(display) = self.normalizer.aliases().call_name_display.get(call) {
            return display.clone();
        }
        let spellings: Vec<String> = animals
            .values()
            .filter_map(|raw| self.normalizer.raw_call_name(raw))
            .filter(|spelling| fold_key(spelling) == call)
            .collect();
        most_authentic(spellings.iter().map(String::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| title_case(call))
    }

    fn registered_display(&self, name: &str, animals: &Tally) -> String {
        let spellings: Vec<String> = animals
            .values()
            .filter_map(|raw| self.normalizer.raw_registered_name(raw))
            .filter(|spelling| self.normalizer.normalize_registered_name(spelling) == name)
            .collect();
        most_authentic(spellings.iter().map(String::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| title_case(name))
    }

    /// Fill empty countries from another team of the same handler
    fn backfill_countries(&self, profiles: &mut BTreeMap<TeamId, TeamProfile>) {
        let mut by_handler: BTreeMap<String, String> = BTreeMap::new();
        for profile in profiles.values() {
            if !profile.country.is_empty() {
                by_handler
                    .entry(profile.team_id.handler.clone())
                    .or_insert_with(|| profile.country.clone());
            }
        }

        for profile in profiles.values_mut() {
            if profile.country.is_empty() {
                if let Some(country) = by_handler.get(&profile.team_id.handler) {
                    debug!("Backfilled country {} for {}", country, profile.team_id);
                    profile.country = country.clone();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::aliases::AliasTables;
    use crate::types::{Placement, SizeCategory};
    use chrono::NaiveDate;

    fn run(n: &NameNormalizer, handler: &str, animal: &str, country: &str) -> RunResult {
        RunResult {
            competition_id: "open".to_string(),
            competition_name: "Open".to_string(),
            competition_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            competition_tier: 2,
            round_key: "agility_1".to_string(),
            size: SizeCategory::Large,
            team_id: n.make_team_id(handler, animal),
            handler: handler.to_string(),
            animal: animal.to_string(),
            country: country.to_string(),
            placement: Placement::Ranked(1),
        }
    }

    #[test]
    fn test_prefers_comma_variant_with_diacritics() {
        let n = NameNormalizer::new(AliasTables::empty()).unwrap();
        let runs = vec![
            run(&n, "Jana Svobodova", "Day", "CZE"),
            run(&n, "Jana Svobodova", "Day", "CZE"),
            run(&n, "Svobodova, Jana", "Day", ""),
            run(&n, "Svobodová, Jana", "Daylight Neverending Force (Day)", ""),
        ];

        let profiles = ProfileBuilder::new(&n).build(&runs);
        assert_eq!(profiles.len(), 1);

        let profile = profiles.values().next().unwrap();
        assert_eq!(profile.handler_display, "Jana Svobodová");
        assert_eq!(profile.call_name, "Day");
        assert_eq!(profile.registered_name, "Daylight Neverending Force");
        assert_eq!(profile.dog_display, "Daylight Neverending Force (Day)");
        assert_eq!(profile.country, "CZE");
    }

    #[test]
    fn test_most_frequent_handler_without_comma() {
        let n = NameNormalizer::new(AliasTables::empty()).unwrap();
        let runs = vec![
            run(&n, "Petr NOVAK", "Rex", ""),
            run(&n, "Petr Novak", "Rex", ""),
            run(&n, "Petr Novak", "Rex", ""),
        ];

        let profiles = ProfileBuilder::new(&n).build(&runs);
        assert_eq!(profiles.values().next().unwrap().handler_display, "Petr Novak");
    }

    #[test]
    fn test_display_overrides() {
        let n = NameNormalizer::new(AliasTables::default()).unwrap();
        let runs = vec![
            run(&n, "Katka Tercova", "Pszenik", "CZE"),
            run(&n, "Tercova Katerina", "Psenik", "CZE"),
        ];

        let profiles = ProfileBuilder::new(&n).build(&runs);
        assert_eq!(profiles.len(), 1);
        let profile = profiles.values().next().unwrap();
        assert_eq!(profile.handler_display, "Kateřina Terčová");
        assert_eq!(profile.call_name, "Pšeník");
        assert!(profile.registered_name.is_empty());
        assert_eq!(profile.dog_display, "Pšeník");
    }

    #[test]
    fn test_country_backfill_by_handler() {
        let n = NameNormalizer::new(AliasTables::empty()).unwrap();
        let runs = vec![
            run(&n, "Anna Kowalska", "Fox", "POL"),
            run(&n, "Anna Kowalska", "Nitro", ""),
        ];

        let profiles = ProfileBuilder::new(&n).build(&runs);
        assert!(profiles.values().all(|p| p.country == "POL"));
    }

    #[test]
    fn test_title_case_fallback() {
        assert_eq!(title_case("never never land"), "Never Never Land");
        assert_eq!(first_last("Svobodová,  Jana"), "Jana Svobodová");
    }
}
