//! Team-building prompt construction.
//!
//! The reply format dictated here is the contract `crate::parse` decodes.
//! Change the labels in both places together.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::context::sort_by_kda;
use crate::models::{PlayerRecord, Role, TeamCategory};

/// Maps offered to the model as per-map win-rates.
pub const PROMPT_MAPS: [&str; 10] = [
    "bind", "split", "haven", "ascent", "icebox", "pearl", "fracture", "sunset", "lotus", "breeze",
];

/// How many best maps each summary carries.
const BEST_MAP_COUNT: usize = 3;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub category: TeamCategory,
    pub player_limit: usize,
    /// Free-text requirements; `Some` switches to the custom-query prompt.
    pub custom_query: Option<String>,
}

impl PromptRequest {
    pub fn preset(category: TeamCategory, player_limit: usize) -> Self {
        Self {
            category,
            player_limit,
            custom_query: None,
        }
    }

    /// Custom queries draw from the whole player pool.
    pub fn custom(query: impl Into<String>, player_limit: usize) -> Self {
        Self {
            category: TeamCategory::All,
            player_limit,
            custom_query: Some(query.into()),
        }
    }

    pub fn is_custom(&self) -> bool {
        self.custom_query.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryStatistics {
    pub overall_winrate: f64,
    pub total_matches: u32,
    /// `"<map> (<rate>%)"`, best first.
    pub best_maps: Vec<String>,
    pub map_winrates: BTreeMap<String, f64>,
}

/// Prompt-facing reduction of a player record.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSummary {
    pub name: String,
    pub team: String,
    pub role: String,
    pub primary_agent: String,
    pub backup_agents: Vec<String>,
    pub kda: f64,
    pub region: String,
    pub statistics: SummaryStatistics,
}

impl From<&PlayerRecord> for PlayerSummary {
    fn from(player: &PlayerRecord) -> Self {
        let mut ranked: Vec<(&str, f64)> = PROMPT_MAPS
            .iter()
            .filter_map(|map| {
                player
                    .map_winrates
                    .get(*map)
                    .copied()
                    .filter(|rate| *rate != 0.0)
                    .map(|rate| (*map, rate))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let best_maps = ranked
            .iter()
            .take(BEST_MAP_COUNT)
            .map(|(map, rate)| format!("{} ({:.2}%)", map, rate))
            .collect();

        let map_winrates = ranked
            .iter()
            .map(|(map, rate)| (map.to_string(), *rate))
            .collect();

        Self {
            name: player.handle.clone(),
            team: player.team.clone(),
            role: player.primary_role.clone(),
            primary_agent: player.agents.first().cloned().unwrap_or_default(),
            backup_agents: player.agents.iter().skip(1).cloned().collect(),
            kda: player.kda,
            region: player.region.clone(),
            statistics: SummaryStatistics {
                overall_winrate: player.overall_winrate,
                total_matches: player.total_matches,
                best_maps,
                map_winrates,
            },
        }
    }
}

/// Summaries for the top `limit` players by KDA.
pub fn summarize_players(players: &[PlayerRecord], limit: usize) -> Vec<PlayerSummary> {
    let mut ranked = players.to_vec();
    sort_by_kda(&mut ranked);
    ranked.iter().take(limit).map(PlayerSummary::from).collect()
}

fn role_requirements() -> String {
    let mut lines: Vec<String> = Role::FIXED
        .iter()
        .map(|role| {
            format!(
                "   - 1 {} (Primary agents: {})",
                role,
                role.roster().join(", ")
            )
        })
        .collect();
    lines.push(
        "   - 1 Flex (Can be either a Duelist, Sentinel, Initiator, or Controller)".to_string(),
    );
    lines.join("\n")
}

/// Build the full instruction text for one request.
pub fn build_prompt(players: &[PlayerRecord], request: &PromptRequest) -> String {
    let summaries = summarize_players(players, request.player_limit);
    let players_json =
        serde_json::to_string_pretty(&summaries).unwrap_or_else(|_| "[]".to_string());

    let mut prompt = String::from(
        "You are a VCT expert analyst. Create a competitive 5-player team composition using ONLY players from the provided list.\n\
         You MUST follow the exact format and spacing specified below.\n",
    );

    if !request.is_custom() {
        if let Some(brief) = request.category.brief() {
            prompt.push_str(brief);
            prompt.push('\n');
        }
    }

    prompt.push_str(&format!(
        "\nAvailable players (Top {} performers):\n{}\n\n",
        request.player_limit, players_json
    ));

    prompt.push_str(&format!(
        "STRICT REQUIREMENTS:\n\
         1. MUST include EXACTLY:\n\
         {}\n\
         2. Each player must be unique, the same player cannot be chosen twice\n\
         3. Only ONE player should be marked as IGL. This should be one of the controller players.\n\
         4. NEVER CHOOSE MORE THAN TWO (2) PLAYERS FROM THE SAME TEAM (e.g., no more than two FNATIC players per team).\n\n",
        role_requirements()
    ));

    if let Some(query) = &request.custom_query {
        prompt.push_str(&format!(
            "CUSTOM QUERY REQUIREMENTS:\n{}\n\n",
            query.trim()
        ));
    }

    let (best_maps_hint, maps_sentence) = if request.is_custom() {
        (
            "[Top 2-3 maps with highest winrates]",
            "[1 sentence about strongest maps]",
        )
    } else {
        (
            "[List exactly 3 best maps with winrates in parentheses]",
            "[1 sentence about strongest maps based on the overlap in players' best performing maps]",
        )
    };

    prompt.push_str(&format!(
        "FORMAT REQUIREMENTS (FOLLOW EXACTLY):\n\n\
         **PLAYER: [NAME]**\n\
         Current Team: [Team]\n\
         Role: [Role]\n\
         Primary Agents: [Agents list]\n\
         Backup Agents: [Agents list or None]\n\
         KDA: [KDA Ratio]\n\
         Winrate: [Overall winrate]%\n\
         Best Maps: {}\n\
         Reasoning: [2 sentences including performance and map-specific strengths. If IGL, mention it here; do not mention the acronym \"IGL\" in the reasoning for any non-IGL player. All players MUST be referred to by either their handle or gender neutral terms (they/them/theirs).]\n\n\
         [Leave exactly one blank line between players]\n\n\
         **PLAYER: [NEXT NAME]**\n\
         [Continue exact same format for each player]\n\n\
         Team Analysis:\n\
         [1 sentence about team composition and synergy]\n\
         {}\n\
         [1 sentence about potential weaknesses]",
        best_maps_hint, maps_sentence
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(handle: &str, kda: f64, maps: &[(&str, f64)]) -> PlayerRecord {
        PlayerRecord {
            handle: handle.to_string(),
            team: "FNATIC".to_string(),
            team_category: "international".to_string(),
            region: "EMEA".to_string(),
            primary_role: "Controller".to_string(),
            agents: vec!["Astra".to_string(), "Omen".to_string(), "Viper".to_string()],
            kda,
            overall_winrate: 61.0,
            total_matches: 80,
            map_winrates: maps.iter().map(|(m, r)| (m.to_string(), *r)).collect(),
        }
    }

    #[test]
    fn test_summary_best_maps() {
        let player = record(
            "Boaster",
            1.1,
            &[
                ("ascent", 72.1),
                ("bind", 68.0),
                ("lotus", 70.5),
                ("split", 40.0),
                ("abyss", 99.0),
                ("haven", 0.0),
            ],
        );

        let summary = PlayerSummary::from(&player);
        assert_eq!(
            summary.statistics.best_maps,
            vec!["ascent (72.10%)", "lotus (70.50%)", "bind (68.00%)"]
        );
        // Maps outside the prompt set and zero rates are left out.
        assert!(!summary.statistics.map_winrates.contains_key("abyss"));
        assert!(!summary.statistics.map_winrates.contains_key("haven"));
        assert_eq!(summary.primary_agent, "Astra");
        assert_eq!(summary.backup_agents, vec!["Omen", "Viper"]);
    }

    #[test]
    fn test_summary_without_agents() {
        let mut player = record("nobody", 1.0, &[]);
        player.agents.clear();

        let summary = PlayerSummary::from(&player);
        assert!(summary.primary_agent.is_empty());
        assert!(summary.backup_agents.is_empty());
        assert!(summary.statistics.best_maps.is_empty());
    }

    #[test]
    fn test_summarize_limits_and_sorts() {
        let players = vec![
            record("low", 0.9, &[]),
            record("high", 1.5, &[]),
            record("mid", 1.2, &[]),
        ];

        let summaries = summarize_players(&players, 2);
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["high", "mid"]);
    }

    #[test]
    fn test_preset_prompt() {
        let players = vec![record("Boaster", 1.1, &[("ascent", 72.1)])];
        let request = PromptRequest::preset(TeamCategory::Professional, 200);
        let prompt = build_prompt(&players, &request);

        assert!(prompt.contains("Build a team using only players from VCT International."));
        assert!(prompt.contains("Available players (Top 200 performers):"));
        assert!(prompt.contains("\"name\": \"Boaster\""));
        assert!(prompt.contains("1 Controller (Primary agents: Brimstone, Viper, Omen, Astra, Harbor, Clove)"));
        assert!(prompt.contains("1 Flex"));
        assert!(prompt.contains("NEVER CHOOSE MORE THAN TWO (2) PLAYERS FROM THE SAME TEAM"));
        assert!(prompt.contains("**PLAYER: [NAME]**"));
        assert!(prompt.contains("Best Maps: [List exactly 3 best maps"));
        assert!(prompt.trim_end().ends_with("[1 sentence about potential weaknesses]"));
        assert!(!prompt.contains("CUSTOM QUERY REQUIREMENTS"));
    }

    #[test]
    fn test_custom_prompt() {
        let players = vec![record("Boaster", 1.1, &[])];
        let request = PromptRequest::custom("  Only EMEA players with Astra experience ", 300);
        let prompt = build_prompt(&players, &request);

        assert_eq!(request.category, TeamCategory::All);
        assert!(prompt.contains(
            "CUSTOM QUERY REQUIREMENTS:\nOnly EMEA players with Astra experience\n"
        ));
        assert!(prompt.contains("Best Maps: [Top 2-3 maps with highest winrates]"));
        assert!(!prompt.contains("Build a team using only players from"));
    }

    #[test]
    fn test_prompt_labels_match_decoder() {
        let prompt = build_prompt(&[], &PromptRequest::preset(TeamCategory::SemiPro, 10));
        for label in [
            "Current Team:",
            "Role:",
            "Primary Agents:",
            "Backup Agents:",
            "KDA:",
            "Winrate:",
            "Best Maps:",
            "Reasoning:",
            "Team Analysis:",
        ] {
            assert!(prompt.contains(label), "missing {}", label);
        }
        assert!(prompt.contains("Available players (Top 10 performers):\n[]"));
    }
}
