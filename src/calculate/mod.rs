//! Team-level statistics derived from a decoded composition.
//!
//! - Map preference distribution across the roster's best maps
//! - Actual average per-map win-rates from the statistics document

use std::collections::{BTreeMap, HashMap};

use crate::models::{MapPreference, ParsedPlayer};
use crate::storage::PlayerDocument;

/// Maps tracked in the statistics document.
pub const VALID_MAPS: [&str; 11] = [
    "bind", "split", "haven", "ascent", "icebox", "pearl", "fracture", "sunset", "lotus", "abyss",
    "breeze",
];

/// Share of the roster naming each map among its best maps, highest first.
///
/// Each mention counts once; the count is expressed as a percentage of the
/// roster size. Ties are ordered by map name.
pub fn map_distribution(players: &[ParsedPlayer]) -> Vec<MapPreference> {
    if players.is_empty() {
        return Vec::new();
    }

    let mut counts: HashMap<String, u32> = HashMap::new();
    for map in players.iter().flat_map(|p| p.best_maps.iter()) {
        let key = map.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        *counts.entry(key).or_insert(0) += 1;
    }

    let team_size = players.len() as f64;
    let mut distribution: Vec<MapPreference> = counts
        .into_iter()
        .map(|(map, count)| MapPreference {
            map,
            percentage: count as f64 * 100.0 / team_size,
        })
        .collect();

    distribution.sort_by(|a, b| {
        b.percentage
            .total_cmp(&a.percentage)
            .then_with(|| a.map.cmp(&b.map))
    });
    distribution
}

/// The first `n` entries of a sorted distribution.
pub fn top_maps(distribution: &[MapPreference], n: usize) -> Vec<MapPreference> {
    distribution.iter().take(n).cloned().collect()
}

/// Average win-rate per map over the roster members found in the document.
///
/// Players missing from the document, or without data for a map, do not
/// count towards that map's average.
pub fn team_map_averages(
    document: &PlayerDocument,
    players: &[ParsedPlayer],
) -> BTreeMap<String, f64> {
    let records: Vec<_> = players
        .iter()
        .filter_map(|p| document.find_by_handle(&p.name))
        .collect();

    VALID_MAPS
        .iter()
        .filter_map(|map| {
            let rates: Vec<f64> = records
                .iter()
                .filter_map(|r| r.map_winrates.get(*map).copied())
                .collect();
            if rates.is_empty() {
                None
            } else {
                Some((map.to_string(), rates.iter().sum::<f64>() / rates.len() as f64))
            }
        })
        .collect()
}

/// Title-case a lowercase map name for display.
pub fn display_map_name(map: &str) -> String {
    let mut chars = map.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}
