//! Identity resolution across team id variants
//!
//! The same team can show up under several animal tokens when sources
//! disagree on how to write the dog's name: a bare call name in one file, a
//! full registered name in another, a kennel prefix in a third. The resolver
//! finds such variants per handler and collapses them with a disjoint-set,
//! so the final mapping is transitive and independent of the order in which
//! merges were discovered.

use crate::identity::normalizer::{word_count, NameNormalizer};
use crate::types::{RunResult, TeamId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Heuristic that justified a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeRule {
    /// A short id is a prefix of the first word of a longer id
    CallNamePrefix,
    /// Registered names share three consecutive words
    RegisteredNameOverlap,
    /// A one-word id appears as a word of another id's registered name
    CallNameAsWord,
}

impl MergeRule {
    pub fn label(&self) -> &'static str {
        match self {
            MergeRule::CallNamePrefix => "call_name_prefix",
            MergeRule::RegisteredNameOverlap => "registered_name_overlap",
            MergeRule::CallNameAsWord => "call_name_as_word",
        }
    }
}

/// One directed merge: `from` is repointed to `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRecord {
    pub from: TeamId,
    pub to: TeamId,
    pub rule: MergeRule,
}

/// Result of applying identity resolution to a set of runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Merges in discovery order
    pub merges: Vec<MergeRecord>,
    /// Every merged id and the id it finally resolves to
    pub mapping: BTreeMap<TeamId, TeamId>,
    pub runs_repointed: usize,
}

/// Disjoint-set over team ids with path compression
#[derive(Debug, Default)]
pub struct TeamIdSets {
    index: BTreeMap<TeamId, usize>,
    ids: Vec<TeamId>,
    parent: Vec<usize>,
}

impl TeamIdSets {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, id: &TeamId) -> usize {
        if let Some(&i) = self.index.get(id) {
            return i;
        }
        let i = self.ids.len();
        self.index.insert(id.clone(), i);
        self.ids.push(id.clone());
        self.parent.push(i);
        i
    }

    fn root(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = i;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Representative of the set containing `id`
    pub fn find(&mut self, id: &TeamId) -> TeamId {
        match self.index.get(id) {
            Some(&i) => {
                let root = self.root(i);
                self.ids[root].clone()
            }
            None => id.clone(),
        }
    }

    /// Point the set of `from` at the set of `to`. Returns false when both
    /// are already in the same set.
    pub fn redirect(&mut self, from: &TeamId, to: &TeamId) -> bool {
        let from = self.insert(from);
        let to = self.insert(to);
        let (from_root, to_root) = (self.root(from), self.root(to));
        if from_root == to_root {
            return false;
        }
        self.parent[from_root] = to_root;
        true
    }

    /// Every id whose representative differs from itself
    pub fn mapping(&mut self) -> BTreeMap<TeamId, TeamId> {
        let mut mapping = BTreeMap::new();
        for i in 0..self.ids.len() {
            let root = self.root(i);
            if root != i {
                mapping.insert(self.ids[i].clone(), self.ids[root].clone());
            }
        }
        mapping
    }
}

/// Whether two registered names share three consecutive words, aligned at
/// the start of both or with one shifted by a one- or two-word prefix
pub fn registered_names_match(a: &str, b: &str) -> bool {
    const SPAN: usize = 3;
    let a: Vec<&str> = a.split_whitespace().collect();
    let b: Vec<&str> = b.split_whitespace().collect();

    let aligned = |x: &[&str], y: &[&str], offset: usize| {
        x.len() >= offset + SPAN && y.len() >= SPAN && x[offset..offset + SPAN] == y[..SPAN]
    };

    aligned(&a, &b, 0) || (1..=2).any(|offset| aligned(&a, &b, offset) || aligned(&b, &a, offset))
}

static NO_NAMES: BTreeSet<String> = BTreeSet::new();

fn names_of<'r>(
    registered: &'r BTreeMap<TeamId, BTreeSet<String>>,
    id: &TeamId,
) -> &'r BTreeSet<String> {
    registered.get(id).unwrap_or(&NO_NAMES)
}

/// Ordering used to pick the surviving id of a merge: fewer words, then
/// shorter, then lexicographic
fn animal_order(a: &str, b: &str) -> Ordering {
    word_count(a)
        .cmp(&word_count(b))
        .then_with(|| a.len().cmp(&b.len()))
        .then_with(|| a.cmp(b))
}

/// Collapses team id variants of the same handler
pub struct IdentityResolver<'a> {
    normalizer: &'a NameNormalizer,
}

struct HandlerMerges<'s> {
    sets: &'s mut TeamIdSets,
    redirected: BTreeSet<TeamId>,
    merges: Vec<MergeRecord>,
}

impl HandlerMerges<'_> {
    fn merge(&mut self, from: TeamId, to: TeamId, rule: MergeRule) {
        if self.sets.redirect(&from, &to) {
            debug!("Merging team {} into {} ({:?})", from, to, rule);
            self.redirected.insert(from.clone());
            self.merges.push(MergeRecord { from, to, rule });
        }
    }
}

impl<'a> IdentityResolver<'a> {
    pub fn new(normalizer: &'a NameNormalizer) -> Self {
        Self { normalizer }
    }

    /// Registered names seen per team id, from the raw animal strings
    fn registered_names(&self, runs: &[RunResult]) -> BTreeMap<TeamId, BTreeSet<String>> {
        let mut names: BTreeMap<TeamId, BTreeSet<String>> = BTreeMap::new();
        for run in runs {
            let entry = names.entry(run.team_id.clone()).or_default();
            let parsed = self.normalizer.parse_dog_name(&run.animal);
            if !parsed.registered_name.is_empty() {
                entry.insert(parsed.registered_name);
            }
        }
        names
    }

    /// Find merges over all runs without modifying them
    pub fn plan(&self, runs: &[RunResult]) -> MergeReport {
        let registered = self.registered_names(runs);

        let mut animals_by_handler: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for id in registered.keys() {
            animals_by_handler
                .entry(id.handler.as_str())
                .or_default()
                .push(id.animal.as_str());
        }

        let mut sets = TeamIdSets::new();
        let mut state = HandlerMerges {
            sets: &mut sets,
            redirected: BTreeSet::new(),
            merges: Vec::new(),
        };

        for (handler, mut animals) in animals_by_handler {
            if animals.len() < 2 {
                continue;
            }
            animals.sort_by(|a, b| word_count(a).cmp(&word_count(b)).then_with(|| a.cmp(b)));
            let team = |animal: &str| TeamId::new(handler, animal);

            // Short call name vs a longer id starting with it
            for (i, &short) in animals.iter().enumerate() {
                let short_words = word_count(short);
                if short_words == 0 || short_words > 2 {
                    continue;
                }
                let Some(short_first) = short.split_whitespace().next() else {
                    continue;
                };
                for &long in &animals[i + 1..] {
                    if word_count(long) <= short_words || state.redirected.contains(&team(long)) {
                        continue;
                    }
                    let prefixed = long
                        .split_whitespace()
                        .next()
                        .is_some_and(|first| first.starts_with(short_first));
                    if prefixed {
                        state.merge(team(long), team(short), MergeRule::CallNamePrefix);
                    }
                }
            }

            // Overlapping registered names
            for (i, &a) in animals.iter().enumerate() {
                for &b in &animals[i + 1..] {
                    if state.redirected.contains(&team(a)) || state.redirected.contains(&team(b)) {
                        continue;
                    }
                    let names_a = names_of(&registered, &team(a));
                    let names_b = names_of(&registered, &team(b));
                    let overlap = names_a
                        .iter()
                        .any(|x| names_b.iter().any(|y| registered_names_match(x, y)));
                    if overlap {
                        let (keep, drop) = if animal_order(a, b) == Ordering::Greater {
                            (b, a)
                        } else {
                            (a, b)
                        };
                        state.merge(team(drop), team(keep), MergeRule::RegisteredNameOverlap);
                    }
                }
            }

            // One-word id named inside another id's registered name
            for &word in animals.iter().filter(|a| word_count(a) == 1) {
                for &other in &animals {
                    if other == word
                        || state.redirected.contains(&team(word))
                        || state.redirected.contains(&team(other))
                    {
                        continue;
                    }
                    let named = names_of(&registered, &team(other))
                        .iter()
                        .any(|name| name.split_whitespace().any(|w| w == word));
                    if named {
                        state.merge(team(other), team(word), MergeRule::CallNameAsWord);
                    }
                }
            }
        }

        let merges = state.merges;
        MergeReport {
            merges,
            mapping: sets.mapping(),
            runs_repointed: 0,
        }
    }

    /// Find merges and repoint every affected run to its resolved team id
    pub fn resolve(&self, runs: &mut [RunResult]) -> MergeReport {
        let mut report = self.plan(runs);

        for run in runs.iter_mut() {
            if let Some(target) = report.mapping.get(&run.team_id) {
                run.team_id = target.clone();
                report.runs_repointed += 1;
            }
        }

        info!(
            "Identity resolution merged {} team id variants, repointed {} runs",
            report.mapping.len(),
            report.runs_repointed
        );
        report
    }
}
