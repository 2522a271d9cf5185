//! Player roles and the agent roster behind each one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role slot in a five-player composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Controller,
    Duelist,
    Sentinel,
    Initiator,
    Flex,
}

const CONTROLLERS: &[&str] = &["Brimstone", "Viper", "Omen", "Astra", "Harbor", "Clove"];
const DUELISTS: &[&str] = &["Phoenix", "Jett", "Raze", "Reyna", "Yoru", "Neon", "Iso"];
const SENTINELS: &[&str] = &["Killjoy", "Cypher", "Sage", "Chamber", "Deadlock", "Vyse"];
const INITIATORS: &[&str] = &["Sova", "Breach", "Skye", "KAYO", "Fade", "Gekko"];

impl Role {
    /// The four fixed roles, in the order the rubric lists them.
    pub const FIXED: [Role; 4] = [
        Role::Controller,
        Role::Duelist,
        Role::Sentinel,
        Role::Initiator,
    ];

    /// Agents expected for this role. Flex has no roster of its own.
    pub fn roster(&self) -> &'static [&'static str] {
        match self {
            Role::Controller => CONTROLLERS,
            Role::Duelist => DUELISTS,
            Role::Sentinel => SENTINELS,
            Role::Initiator => INITIATORS,
            Role::Flex => &[],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Controller => "Controller",
            Role::Duelist => "Duelist",
            Role::Sentinel => "Sentinel",
            Role::Initiator => "Initiator",
            Role::Flex => "Flex",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "controller" => Ok(Role::Controller),
            "duelist" => Ok(Role::Duelist),
            "sentinel" => Ok(Role::Sentinel),
            "initiator" => Ok(Role::Initiator),
            "flex" => Ok(Role::Flex),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Normalize an agent name to its canonical asset spelling.
///
/// `KAY/O` and `kayo` both become `KAYO`; slashes and spaces are removed
/// from every other name.
pub fn normalize_agent_name(agent: &str) -> String {
    let trimmed = agent.trim();
    let upper = trimmed.to_uppercase();
    if upper == "KAYO" || upper == "KAY/O" {
        return "KAYO".to_string();
    }
    trimmed.replace(['/', ' '], "")
}

/// Every rostered agent, across all fixed roles.
pub fn all_agents() -> impl Iterator<Item = &'static str> {
    Role::FIXED.iter().flat_map(|r| r.roster().iter().copied())
}
