use std::fmt;
use std::str::FromStr;

use crate::config::DEFAULT_FLOOR_HEIGHT;
use super::facade::{LayoutStrategy, SovietBlock, Veranda};
use super::planner::PlanError;

/// Architectural styles the generator knows how to lay out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Style {
    Khrushchev,
    Brezhnev,
    Japanese,
    Stalinist,
    #[default]
    Test,
}

impl Style {
    pub const ALL: [Style; 5] = [
        Style::Khrushchev,
        Style::Brezhnev,
        Style::Japanese,
        Style::Stalinist,
        Style::Test,
    ];

    /// Lowercase name used inside asset names, e.g. `wall12_japanese`.
    pub fn keyword(self) -> &'static str {
        match self {
            Style::Khrushchev => "khrushchev",
            Style::Brezhnev => "brezhnev",
            Style::Japanese => "japanese",
            Style::Stalinist => "stalinist",
            Style::Test => "test",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Style::Khrushchev => "Khrushchev",
            Style::Brezhnev => "Brezhnev",
            Style::Japanese => "Japanese",
            Style::Stalinist => "Stalinist",
            Style::Test => "Test",
        }
    }

    /// Roofs of the panel-block styles are shared per family and named by the
    /// three-letter prefix (`roof_khr_low_2`).
    pub fn roof_prefix(self) -> &'static str {
        match self {
            Style::Khrushchev => "khr",
            Style::Brezhnev => "bre",
            Style::Stalinist => "sta",
            Style::Japanese | Style::Test => self.keyword(),
        }
    }

    pub fn max_floors(self) -> usize {
        match self {
            Style::Khrushchev => 9,
            Style::Brezhnev => 15,
            Style::Japanese => 5,
            Style::Stalinist => 12,
            Style::Test => 5,
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Style {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "khrushchev" | "khr" => Ok(Style::Khrushchev),
            "brezhnev" | "bre" => Ok(Style::Brezhnev),
            "japanese" | "jp" => Ok(Style::Japanese),
            "stalinist" | "stal" => Ok(Style::Stalinist),
            "test" => Ok(Style::Test),
            _ => Err(PlanError::UnsupportedStyle(s.to_string())),
        }
    }
}

/// Coarse ornamentation level, selects which asset set is used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DetailTier {
    #[default]
    Low,
    Medium,
    High,
}

impl DetailTier {
    pub const ALL: [DetailTier; 3] = [DetailTier::Low, DetailTier::Medium, DetailTier::High];

    pub fn keyword(self) -> &'static str {
        match self {
            DetailTier::Low => "low",
            DetailTier::Medium => "medium",
            DetailTier::High => "high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DetailTier::Low => "Low",
            DetailTier::Medium => "Medium",
            DetailTier::High => "High",
        }
    }
}

impl fmt::Display for DetailTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DetailTier {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(DetailTier::Low),
            "medium" => Ok(DetailTier::Medium),
            "high" => Ok(DetailTier::High),
            _ => Err(PlanError::UnsupportedDetails(s.to_string())),
        }
    }
}

static SOVIET_BLOCK: SovietBlock = SovietBlock;
static VERANDA: Veranda = Veranda;

/// Maps a style to the layout strategy that owns its floor and role rules.
pub fn dispatch(style: Style) -> &'static dyn LayoutStrategy {
    match style {
        Style::Khrushchev | Style::Brezhnev | Style::Stalinist => &SOVIET_BLOCK,
        Style::Japanese | Style::Test => &VERANDA,
    }
}

/// Storey height for a style at a detail tier.
pub fn floor_height(style: Style, details: DetailTier) -> f32 {
    // every tier currently shares the style height
    let height = match (style, details) {
        (Style::Japanese | Style::Test, _) => Some(2.7),
        (Style::Stalinist, _) => Some(3.2),
        (Style::Khrushchev, _) => Some(3.0),
        (Style::Brezhnev, _) => None,
    };
    height.unwrap_or(DEFAULT_FLOOR_HEIGHT)
}
