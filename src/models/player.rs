//! Player statistics records and team categories.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Team-category selector for filtering the player pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TeamCategory {
    #[default]
    All,
    Professional,
    SemiPro,
    GameChangers,
    /// Pass-through categories used for custom queries.
    MixedGender,
    CrossRegional,
    RisingStar,
}

impl TeamCategory {
    /// The three categories offered in the UI.
    pub const SELECTABLE: [TeamCategory; 3] = [
        TeamCategory::Professional,
        TeamCategory::SemiPro,
        TeamCategory::GameChangers,
    ];

    /// The `team.category` value a player must carry, if constrained.
    pub fn team_category(&self) -> Option<&'static str> {
        match self {
            TeamCategory::Professional => Some("international"),
            TeamCategory::SemiPro => Some("challengers"),
            TeamCategory::GameChangers => Some("game-changers"),
            _ => None,
        }
    }

    /// Whether a player with the given team category belongs to this selection.
    pub fn includes(&self, category: &str) -> bool {
        match self.team_category() {
            Some(expected) => expected == category,
            None => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TeamCategory::All => "all",
            TeamCategory::Professional => "professional",
            TeamCategory::SemiPro => "semi_pro",
            TeamCategory::GameChangers => "game_changers",
            TeamCategory::MixedGender => "mixed_gender",
            TeamCategory::CrossRegional => "cross_regional",
            TeamCategory::RisingStar => "rising_star",
        }
    }

    /// Human-readable label for the selector.
    pub fn label(&self) -> &'static str {
        match self {
            TeamCategory::All => "All Players",
            TeamCategory::Professional => "Professional (VCT International)",
            TeamCategory::SemiPro => "Semi-Professional (VCT Challengers)",
            TeamCategory::GameChangers => "Game Changers (VCT Game Changers)",
            TeamCategory::MixedGender => "Mixed Gender",
            TeamCategory::CrossRegional => "Cross Regional",
            TeamCategory::RisingStar => "Rising Star",
        }
    }

    /// One-sentence framing placed at the top of the prompt.
    pub fn brief(&self) -> Option<&'static str> {
        match self {
            TeamCategory::Professional => {
                Some("Build a team using only players from VCT International.")
            }
            TeamCategory::SemiPro => Some("Build a team using only players from VCT Challengers."),
            TeamCategory::GameChangers => {
                Some("Build a team using only players from VCT Game Changers.")
            }
            _ => None,
        }
    }
}

impl fmt::Display for TeamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TeamCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "all" => Ok(TeamCategory::All),
            "professional" => Ok(TeamCategory::Professional),
            "semi_pro" => Ok(TeamCategory::SemiPro),
            "game_changers" => Ok(TeamCategory::GameChangers),
            "mixed_gender" => Ok(TeamCategory::MixedGender),
            "cross_regional" => Ok(TeamCategory::CrossRegional),
            "rising_star" => Ok(TeamCategory::RisingStar),
            other => Err(format!("unknown team category: {}", other)),
        }
    }
}

/// Normalized player record built from the statistics document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub handle: String,
    pub team: String,
    pub team_category: String,
    pub region: String,
    pub primary_role: String,
    /// Most played first.
    pub agents: Vec<String>,
    pub kda: f64,
    pub overall_winrate: f64,
    pub total_matches: u32,
    /// Keyed by lowercase map name, without the `_winrate` suffix.
    pub map_winrates: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct RawPlayer {
    handle: String,
    team: RawTeam,
    statistics: RawStatistics,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    name: String,
    category: String,
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStatistics {
    primary_role: String,
    most_played_agents: Vec<String>,
    overall_kda: f64,
    overall_winrate: f64,
    /// Some exports write counts as floats (`40.0`).
    total_matches: f64,
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

impl PlayerRecord {
    /// Build a record from one entry of the statistics document.
    ///
    /// Fails when any expected field is missing or has the wrong type.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let raw = RawPlayer::deserialize(value)?;

        let map_winrates = raw
            .statistics
            .extra
            .iter()
            .filter_map(|(key, v)| {
                let map = key.strip_suffix("_winrate")?;
                Some((map.to_lowercase(), v.as_f64()?))
            })
            .collect();

        Ok(Self {
            handle: raw.handle,
            team: raw.team.name,
            team_category: raw.team.category,
            region: raw.team.region.unwrap_or_default(),
            primary_role: raw.statistics.primary_role,
            agents: raw.statistics.most_played_agents,
            kda: raw.statistics.overall_kda,
            overall_winrate: raw.statistics.overall_winrate,
            total_matches: raw.statistics.total_matches.max(0.0).round() as u32,
            map_winrates,
        })
    }
}
