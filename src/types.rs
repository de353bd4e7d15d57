//! Common types used throughout the rating engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use skillratings::weng_lin::WengLinRating;
use std::fmt;

/// Identifier of a competition as used by the registry and data directories
pub type CompetitionId = String;

/// Separator between the handler and animal parts of a team key.
/// Normalized name parts never contain `|`.
pub const TEAM_ID_SEPARATOR: &str = "|||";

/// Competitor size category. Each category is rated independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizeCategory {
    Small,
    Medium,
    Intermediate,
    Large,
}

impl SizeCategory {
    /// Preferred presentation order for leaderboards
    pub const DISPLAY_ORDER: [SizeCategory; 4] = [
        SizeCategory::Large,
        SizeCategory::Intermediate,
        SizeCategory::Medium,
        SizeCategory::Small,
    ];

    /// Map a source size label onto a category. Returns `None` for labels
    /// that do not correspond to any category.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        match label.to_ascii_lowercase().as_str() {
            "s" | "small" | "xs" | "xs & s" | "xs+s" => Some(SizeCategory::Small),
            "m" | "medium" => Some(SizeCategory::Medium),
            "i" | "in" | "inter" | "intermediate" => Some(SizeCategory::Intermediate),
            "l" | "large" => Some(SizeCategory::Large),
            _ => None,
        }
    }

    /// Position in `DISPLAY_ORDER`
    pub fn display_rank(self) -> usize {
        Self::DISPLAY_ORDER
            .iter()
            .position(|size| *size == self)
            .unwrap_or(Self::DISPLAY_ORDER.len())
    }
}

impl fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeCategory::Small => write!(f, "Small"),
            SizeCategory::Medium => write!(f, "Medium"),
            SizeCategory::Intermediate => write!(f, "Intermediate"),
            SizeCategory::Large => write!(f, "Large"),
        }
    }
}

/// How a team finished a round, normalized at the ingestion boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// Clean finish at the given 1-based position
    Ranked(u32),
    /// Disqualified, retired or otherwise eliminated
    Eliminated,
    /// No usable rank and no elimination marker
    Unknown,
}

impl Placement {
    /// Rank of a clean finish, `None` otherwise
    pub fn rank(&self) -> Option<u32> {
        match self {
            Placement::Ranked(rank) => Some(*rank),
            Placement::Eliminated | Placement::Unknown => None,
        }
    }

    /// Whether the entry takes part in ranked placement
    pub fn is_clean(&self) -> bool {
        matches!(self, Placement::Ranked(_))
    }
}

/// Stable identity of a handler + animal pair
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId {
    /// Normalized handler key
    pub handler: String,
    /// Preferred animal token (call name, else registered name)
    pub animal: String,
}

impl TeamId {
    pub fn new(handler: impl Into<String>, animal: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            animal: animal.into(),
        }
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.handler, TEAM_ID_SEPARATOR, self.animal)
    }
}

/// Registry metadata for one competition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionMeta {
    pub id: CompetitionId,
    pub date: NaiveDate,
    /// Importance class; 1 = major championship
    pub tier: u8,
    pub name: String,
}

/// One team's outcome in one scored round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub competition_id: CompetitionId,
    pub competition_name: String,
    pub competition_date: NaiveDate,
    pub competition_tier: u8,
    pub round_key: String,
    pub size: SizeCategory,
    pub team_id: TeamId,
    pub handler: String,
    pub animal: String,
    pub country: String,
    pub placement: Placement,
}

/// Skill distribution of a team: mean and uncertainty
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillRating {
    pub mu: f64,
    pub sigma: f64,
}

impl Default for SkillRating {
    fn default() -> Self {
        Self {
            mu: 25.0,
            sigma: 25.0 / 3.0,
        }
    }
}

impl From<WengLinRating> for SkillRating {
    fn from(rating: WengLinRating) -> Self {
        Self {
            mu: rating.rating,
            sigma: rating.uncertainty,
        }
    }
}

impl From<SkillRating> for WengLinRating {
    fn from(rating: SkillRating) -> Self {
        Self {
            rating: rating.mu,
            uncertainty: rating.sigma,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_labels() {
        assert_eq!(SizeCategory::from_label("XS"), Some(SizeCategory::Small));
        assert_eq!(SizeCategory::from_label("Xs+S"), Some(SizeCategory::Small));
        assert_eq!(SizeCategory::from_label(" Inter "), Some(SizeCategory::Intermediate));
        assert_eq!(SizeCategory::from_label("large"), Some(SizeCategory::Large));
        assert_eq!(SizeCategory::from_label("600"), None);
    }

    #[test]
    fn test_display_order() {
        assert_eq!(SizeCategory::Large.display_rank(), 0);
        assert_eq!(SizeCategory::Small.display_rank(), 3);
    }

    #[test]
    fn test_team_id_display() {
        let id = TeamId::new("jana svobodova", "day");
        assert_eq!(id.to_string(), "jana svobodova|||day");
    }

    #[test]
    fn test_placement() {
        assert_eq!(Placement::Ranked(3).rank(), Some(3));
        assert!(Placement::Ranked(1).is_clean());
        assert!(!Placement::Eliminated.is_clean());
        assert_eq!(Placement::Unknown.rank(), None);
    }

    #[test]
    fn test_weng_lin_conversion() {
        let rating = SkillRating { mu: 30.0, sigma: 5.0 };
        let converted: WengLinRating = rating.into();
        assert_eq!(converted.rating, 30.0);
        let back: SkillRating = converted.into();
        assert_eq!(back, rating);
    }
}
