//! Post-hoc checks on a decoded team.
//!
//! Neither check runs on the default generation path; they are applied only
//! when strict validation is switched on.

use thiserror::Error;

use crate::models::{all_agents, normalize_agent_name, ParsedPlayer, Role};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid agents {agents:?} for role {role} for player {player}")]
    AgentRoleMismatch {
        player: String,
        role: String,
        agents: Vec<String>,
    },

    #[error("Team must have exactly one IGL (currently has {0})")]
    IglCount(usize),
}

fn in_roster<'a>(agent: &str, roster: impl IntoIterator<Item = &'a str>) -> bool {
    let wanted = normalize_agent_name(agent).to_lowercase();
    roster
        .into_iter()
        .any(|candidate| candidate.to_lowercase() == wanted)
}

/// Whether `agent` belongs to the roster of the role named `role`.
///
/// Flex accepts any rostered agent; an unknown role accepts none.
pub fn agent_matches_role(agent: &str, role: &str) -> bool {
    match role.parse::<Role>() {
        Ok(Role::Flex) => in_roster(agent, all_agents()),
        Ok(role) => in_roster(agent, role.roster().iter().copied()),
        Err(_) => false,
    }
}

/// Every listed agent of every player must fit that player's role.
pub fn validate_agent_roles(players: &[ParsedPlayer]) -> Result<(), ValidationError> {
    for player in players {
        let invalid: Vec<String> = player
            .all_agents()
            .filter(|agent| !agent_matches_role(agent, &player.role))
            .cloned()
            .collect();

        if !invalid.is_empty() {
            return Err(ValidationError::AgentRoleMismatch {
                player: player.name.clone(),
                role: player.role.clone(),
                agents: invalid,
            });
        }
    }
    Ok(())
}

/// Exactly one player must carry the IGL flag.
pub fn validate_igl_count(players: &[ParsedPlayer]) -> Result<(), ValidationError> {
    let count = players.iter().filter(|p| p.igl).count();
    if count == 1 {
        Ok(())
    } else {
        Err(ValidationError::IglCount(count))
    }
}

/// Both checks, agent roles first.
pub fn validate_team_composition(players: &[ParsedPlayer]) -> Result<(), ValidationError> {
    validate_agent_roles(players)?;
    validate_igl_count(players)
}
