//! Team composition records decoded from model output.

use serde::{Deserialize, Serialize};

/// A player block decoded from the model's reply. Fields missing from the
/// text keep their empty/zero defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedPlayer {
    pub name: String,
    pub team: String,
    pub role: String,
    pub primary_agents: Vec<String>,
    pub backup_agents: Vec<String>,
    pub kda: f64,
    pub winrate: f64,
    pub best_maps: Vec<String>,
    pub igl: bool,
    pub reasoning: String,
}

impl ParsedPlayer {
    /// Primary then backup agents.
    pub fn all_agents(&self) -> impl Iterator<Item = &String> {
        self.primary_agents.iter().chain(self.backup_agents.iter())
    }
}

/// Share of the roster that lists a map among its best maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPreference {
    /// Lowercase map name.
    pub map: String,
    /// Percentage of the roster, 0.0 to 100.0.
    pub percentage: f64,
}

/// Free-text team summary plus the derived map distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamAnalysis {
    pub summary: String,
    /// Every mentioned map, highest share first.
    pub map_distribution: Vec<MapPreference>,
    /// The top three entries of `map_distribution`.
    pub top_maps: Vec<MapPreference>,
}

/// Everything decoded from one completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedTeam {
    pub players: Vec<ParsedPlayer>,
    pub analysis: Option<TeamAnalysis>,
    /// The completion text exactly as received.
    pub raw_response: String,
}

impl ParsedTeam {
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn igl_count(&self) -> usize {
        self.players.iter().filter(|p| p.igl).count()
    }
}
