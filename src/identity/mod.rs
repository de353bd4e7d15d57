//! Team identity: name normalization, variant merging and display profiles

pub mod aliases;
pub mod normalizer;
pub mod profile;
pub mod resolver;

pub use aliases::AliasTables;
pub use normalizer::{fold_key, strip_diacritics, DogName, NameNormalizer};
pub use profile::{ProfileBuilder, TeamProfile};
pub use resolver::{
    registered_names_match, IdentityResolver, MergeRecord, MergeReport, MergeRule, TeamIdSets,
};
