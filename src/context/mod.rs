//! Player context filtering.
//!
//! Selects the player pool handed to the prompt builder: category filter,
//! KDA ranking, truncation to the requested limit.

use serde::Serialize;
use tracing::{info, warn};

use crate::models::{PlayerRecord, TeamCategory};
use crate::storage::PlayerDocument;

/// Players selected for one request, best KDA first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilteredContext {
    pub players: Vec<PlayerRecord>,
    /// Players in the source document.
    pub input_count: usize,
    /// Eligible players before truncation.
    pub eligible_count: usize,
    /// Eligible entries dropped for missing or mistyped fields.
    pub skipped_count: usize,
}

impl FilteredContext {
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Order by KDA descending, then handle ascending.
pub fn sort_by_kda(players: &mut [PlayerRecord]) {
    players.sort_by(|a, b| b.kda.total_cmp(&a.kda).then_with(|| a.handle.cmp(&b.handle)));
}

/// Filter the document down to at most `limit` players of `category`.
pub fn filter_context(
    document: &PlayerDocument,
    category: TeamCategory,
    limit: usize,
) -> FilteredContext {
    info!("Input context player count: {}", document.len());

    let mut players = Vec::new();
    let mut skipped_count = 0;

    for (player_id, value) in &document.players {
        let team_category = value
            .get("team")
            .and_then(|t| t.get("category"))
            .and_then(|c| c.as_str())
            .unwrap_or_default();
        if !category.includes(team_category) {
            continue;
        }

        match PlayerRecord::from_value(value) {
            Ok(record) => players.push(record),
            Err(e) => {
                warn!("Error processing player {}: {}", player_id, e);
                skipped_count += 1;
            }
        }
    }

    let eligible_count = players.len();
    sort_by_kda(&mut players);
    players.truncate(limit);

    info!(
        "Filtered to top {} players ({} category, {} eligible)",
        players.len(),
        category,
        eligible_count
    );

    FilteredContext {
        players,
        input_count: document.len(),
        eligible_count,
        skipped_count,
    }
}
