//! Decoder for the model's team-composition reply.
//!
//! The reply is free text following the template in `agents::prompt`:
//! `**PLAYER: <name>**` blocks with labelled lines, then a `Team Analysis:`
//! section. Decoding is permissive: unknown lines are ignored and fields that
//! fail to parse keep their defaults.

use tracing::debug;

use crate::calculate;
use crate::models::{ParsedPlayer, ParsedTeam, TeamAnalysis};

pub const PLAYER_MARKER: &str = "**PLAYER:";
pub const ANALYSIS_MARKER: &str = "Team Analysis:";

/// Number of maps highlighted for the whole team.
pub const TOP_MAP_COUNT: usize = 3;

/// Decode a full completion.
pub fn parse_team_response(response: &str) -> ParsedTeam {
    let mut sections = response.split(ANALYSIS_MARKER);
    let player_section = sections.next().unwrap_or_default();
    let summary = sections.last().map(str::trim).unwrap_or_default();

    let players = parse_players(player_section);

    let analysis = if summary.is_empty() {
        None
    } else {
        let map_distribution = calculate::map_distribution(&players);
        let top_maps = calculate::top_maps(&map_distribution, TOP_MAP_COUNT);
        Some(TeamAnalysis {
            summary: summary.to_string(),
            map_distribution,
            top_maps,
        })
    };

    debug!(
        "Decoded {} players (analysis: {})",
        players.len(),
        analysis.is_some()
    );

    ParsedTeam {
        players,
        analysis,
        raw_response: response.to_string(),
    }
}

/// Decode every player block in the section before `Team Analysis:`.
///
/// Segments without a `Role:` line (preamble, stray fragments) are dropped.
pub fn parse_players(section: &str) -> Vec<ParsedPlayer> {
    section
        .split(PLAYER_MARKER)
        .filter(|block| block.contains("Role:"))
        .filter_map(parse_player_block)
        .collect()
}

/// Decode one player block. Returns `None` when no name can be read.
pub fn parse_player_block(block: &str) -> Option<ParsedPlayer> {
    let lines: Vec<&str> = block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut player = ParsedPlayer {
        name: lines
            .first()
            .map(|line| line.replace("**", "").trim().to_string())
            .unwrap_or_default(),
        ..Default::default()
    };

    for line in &lines {
        if let Some(value) = line.strip_prefix("Current Team:") {
            player.team = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("Role:") {
            player.role = value.trim().to_string();
        } else if let Some(value) = strip_either(line, "Primary Agents:", "Primary Agent:") {
            player.primary_agents = split_agent_list(value);
        } else if let Some(value) = strip_either(line, "Backup Agents:", "Backup Agent:") {
            player.backup_agents = split_agent_list(value);
        } else if let Some(value) = line.strip_prefix("KDA:") {
            if let Some(kda) = parse_number(value) {
                player.kda = kda;
            }
        } else if let Some(value) = line.strip_prefix("Winrate:") {
            if let Some(winrate) = parse_number(&value.replace('%', "")) {
                player.winrate = winrate;
            }
        } else if let Some(value) = line.strip_prefix("Best Maps:") {
            player.best_maps = split_best_maps(value);
        } else if let Some(value) = line.strip_prefix("Reasoning:") {
            player.reasoning = value.trim().to_string();
            // Substring match: a non-IGL player whose reasoning mentions
            // the acronym is flagged as well.
            if line.to_uppercase().contains("IGL") {
                player.igl = true;
            }
        }
    }

    if player.name.is_empty() {
        None
    } else {
        Some(player)
    }
}

fn strip_either<'a>(line: &'a str, plural: &str, singular: &str) -> Option<&'a str> {
    line.strip_prefix(plural)
        .or_else(|| line.strip_prefix(singular))
}

fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Split `"Jett, Raze and Neon"` style lists. `None` entries are dropped.
pub fn split_agent_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .flat_map(|part| part.split(" and "))
        .map(|agent| {
            let agent = agent.trim();
            agent.strip_prefix("and ").unwrap_or(agent).trim()
        })
        .filter(|agent| !agent.is_empty() && !agent.eq_ignore_ascii_case("none"))
        .map(String::from)
        .collect()
}

/// `"Ascent (72.10%), Bind (68.00%)"` -> `["Ascent", "Bind"]`.
pub fn split_best_maps(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(|entry| {
            let name = entry.split('(').next().unwrap_or_default().trim();
            if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            }
        })
        .collect()
}
