//! HTML rendering of the team builder page.
//!
//! View models are built here from decoded teams and handed to the Askama
//! templates under `templates/`. Numbers are formatted before they reach the
//! template.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use askama::Template;
use tracing::warn;

use crate::calculate::display_map_name;
use crate::config::PlayerLimitConfig;
use crate::models::{normalize_agent_name, ParsedPlayer, ParsedTeam, TeamCategory};

pub const PAGE_TITLE: &str = "VCT Team Builder Digital Assistant";
pub const BUSY_NOTICE: &str = "Analyzing players and building team...";

/// Subdirectory of the assets directory served under `/images`.
pub const IMAGES_DIR: &str = "images";

const PRIMARY_WIDTH_SINGLE_ROW: u32 = 80;
const PRIMARY_WIDTH_GRID: u32 = 60;
const BACKUP_WIDTH: u32 = 40;
const BACKUP_COLUMNS: usize = 3;

/// Looks up agent and map images on disk.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    assets_dir: PathBuf,
}

impl AssetResolver {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.assets_dir.join(IMAGES_DIR)
    }

    /// URL of `images/<agent>_icon.webp`, if the file exists.
    pub fn agent_icon(&self, agent: &str) -> Option<String> {
        self.resolve(format!("{}_icon.webp", normalize_agent_name(agent)))
    }

    /// URL of `images/Loading_Screen_<Map>.webp`, if the file exists.
    pub fn map_image(&self, map: &str) -> Option<String> {
        self.resolve(format!("Loading_Screen_{}.webp", display_map_name(map)))
    }

    fn resolve(&self, file_name: String) -> Option<String> {
        let path = self.images_dir().join(&file_name);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Some(format!("/{}/{}", IMAGES_DIR, file_name)),
            Ok(_) => None,
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Could not inspect image {:?}: {}", path, e);
                None
            }
        }
    }
}

/// One agent icon, or its name when no image is available.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentTile {
    pub name: String,
    pub has_image: bool,
    pub src: String,
    pub width: u32,
}

impl AgentTile {
    fn new(agent: &str, width: u32, assets: &AssetResolver) -> Self {
        let src = assets.agent_icon(agent);
        Self {
            name: agent.to_string(),
            has_image: src.is_some(),
            src: src.unwrap_or_default(),
            width,
        }
    }
}

/// Primary agents: a single row for up to two agents, otherwise a two-column
/// grid with smaller icons.
fn primary_rows(agents: &[String], assets: &AssetResolver) -> Vec<Vec<AgentTile>> {
    if agents.is_empty() {
        return Vec::new();
    }
    let (columns, width) = if agents.len() > 2 {
        (2, PRIMARY_WIDTH_GRID)
    } else {
        (agents.len(), PRIMARY_WIDTH_SINGLE_ROW)
    };
    agents
        .chunks(columns)
        .map(|row| row.iter().map(|a| AgentTile::new(a, width, assets)).collect())
        .collect()
}

fn backup_rows(agents: &[String], assets: &AssetResolver) -> Vec<Vec<AgentTile>> {
    agents
        .chunks(BACKUP_COLUMNS)
        .map(|row| {
            row.iter()
                .map(|a| AgentTile::new(a, BACKUP_WIDTH, assets))
                .collect()
        })
        .collect()
}

/// One column of the team view.
#[derive(Debug, Clone)]
pub struct PlayerCard {
    pub name: String,
    pub role: String,
    pub team: String,
    pub igl: bool,
    pub primary_rows: Vec<Vec<AgentTile>>,
    pub backup_rows: Vec<Vec<AgentTile>>,
    pub kda: String,
    pub winrate: String,
    pub reasoning: String,
}

impl PlayerCard {
    pub fn new(player: &ParsedPlayer, assets: &AssetResolver) -> Self {
        Self {
            name: player.name.clone(),
            role: player.role.clone(),
            team: player.team.clone(),
            igl: player.igl,
            primary_rows: primary_rows(&player.primary_agents, assets),
            backup_rows: backup_rows(&player.backup_agents, assets),
            kda: format!("{:.2}", player.kda),
            winrate: format!("{:.1}%", player.winrate),
            reasoning: player.reasoning.clone(),
        }
    }
}

/// A highlighted map.
#[derive(Debug, Clone)]
pub struct MapCard {
    pub name: String,
    pub has_image: bool,
    pub src: String,
    /// Share of the roster naming this map.
    pub share: String,
    /// Roster's recorded average win-rate on the map; empty when unknown.
    pub team_average: String,
}

/// Everything shown below the form once a team is available.
#[derive(Debug, Clone)]
pub struct TeamView {
    pub players: Vec<PlayerCard>,
    pub has_analysis: bool,
    pub summary: String,
    pub maps: Vec<MapCard>,
    pub raw_response: String,
}

impl TeamView {
    pub fn new(
        team: &ParsedTeam,
        map_averages: &BTreeMap<String, f64>,
        assets: &AssetResolver,
    ) -> Self {
        let players = team
            .players
            .iter()
            .map(|p| PlayerCard::new(p, assets))
            .collect();

        let (summary, maps) = match &team.analysis {
            Some(analysis) => {
                let maps = analysis
                    .top_maps
                    .iter()
                    .map(|pref| {
                        let src = assets.map_image(&pref.map);
                        MapCard {
                            name: display_map_name(&pref.map),
                            has_image: src.is_some(),
                            src: src.unwrap_or_default(),
                            share: format!("{:.1}%", pref.percentage),
                            team_average: map_averages
                                .get(&pref.map)
                                .map(|avg| format!("{:.1}%", avg))
                                .unwrap_or_default(),
                        }
                    })
                    .collect();
                (analysis.summary.clone(), maps)
            }
            None => (String::new(), Vec::new()),
        };

        Self {
            players,
            has_analysis: team.analysis.is_some(),
            summary,
            maps,
            raw_response: team.raw_response.clone(),
        }
    }
}

/// An entry of the team-type select.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub title: &'static str,
    pub busy_notice: &'static str,
    pub limit_min: usize,
    pub limit_max: usize,
    pub limit_step: usize,
    pub limit_value: usize,
    pub categories: Vec<CategoryOption>,
    pub custom_query: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Player-pool sizes for the last generation, empty until one runs.
    pub context_note: String,
    pub team: Option<TeamView>,
}

impl IndexPage {
    pub fn new(limits: &PlayerLimitConfig) -> Self {
        Self {
            title: PAGE_TITLE,
            busy_notice: BUSY_NOTICE,
            limit_min: limits.min,
            limit_max: limits.max,
            limit_step: limits.step,
            limit_value: limits.default,
            categories: category_options(TeamCategory::Professional),
            custom_query: String::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            context_note: String::new(),
            team: None,
        }
    }

    pub fn with_selection(mut self, category: TeamCategory, player_limit: usize) -> Self {
        if category != TeamCategory::All {
            self.categories = category_options(category);
        }
        self.limit_value = player_limit;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.custom_query = query.into();
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }

    pub fn with_warning(mut self, message: impl Into<String>) -> Self {
        self.warnings.push(message.into());
        self
    }

    pub fn with_context_counts(mut self, input_count: usize, filtered_count: usize) -> Self {
        self.context_note = format!(
            "Input context player count: {}. Filtered to top {} players.",
            input_count, filtered_count
        );
        self
    }

    pub fn with_team(mut self, team: TeamView) -> Self {
        self.team = Some(team);
        self
    }
}

fn category_options(selected: TeamCategory) -> Vec<CategoryOption> {
    TeamCategory::SELECTABLE
        .iter()
        .map(|c| CategoryOption {
            value: c.as_str(),
            label: c.label(),
            selected: *c == selected,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_team_response;

    fn player(primary: &[&str], backup: &[&str]) -> ParsedPlayer {
        ParsedPlayer {
            name: "Boaster".to_string(),
            team: "FNATIC".to_string(),
            role: "Controller".to_string(),
            primary_agents: primary.iter().map(|a| a.to_string()).collect(),
            backup_agents: backup.iter().map(|a| a.to_string()).collect(),
            kda: 1.0234,
            winrate: 61.24,
            igl: true,
            reasoning: "Calls the mid-round.".to_string(),
            ..Default::default()
        }
    }

    fn assets_with(files: &[&str]) -> (tempfile::TempDir, AssetResolver) {
        let tmp = tempfile::tempdir().unwrap();
        let images = tmp.path().join(IMAGES_DIR);
        std::fs::create_dir_all(&images).unwrap();
        for file in files {
            std::fs::write(images.join(file), b"webp").unwrap();
        }
        let resolver = AssetResolver::new(tmp.path());
        (tmp, resolver)
    }

    #[test]
    fn test_agent_icon_lookup() {
        let (_tmp, assets) = assets_with(&["Astra_icon.webp", "KAYO_icon.webp"]);

        assert_eq!(
            assets.agent_icon("Astra"),
            Some("/images/Astra_icon.webp".to_string())
        );
        assert_eq!(
            assets.agent_icon("KAY/O"),
            Some("/images/KAYO_icon.webp".to_string())
        );
        assert_eq!(assets.agent_icon("Omen"), None);
    }

    #[test]
    fn test_map_image_lookup() {
        let (_tmp, assets) = assets_with(&["Loading_Screen_Ascent.webp"]);
        assert_eq!(
            assets.map_image("ascent"),
            Some("/images/Loading_Screen_Ascent.webp".to_string())
        );
        assert_eq!(assets.map_image("bind"), None);
    }

    #[test]
    fn test_primary_agent_layout() {
        let (_tmp, assets) = assets_with(&[]);

        let two = PlayerCard::new(&player(&["Astra", "Omen"], &[]), &assets);
        assert_eq!(two.primary_rows.len(), 1);
        assert_eq!(two.primary_rows[0].len(), 2);
        assert_eq!(two.primary_rows[0][0].width, 80);

        let three = PlayerCard::new(&player(&["Astra", "Omen", "Viper"], &[]), &assets);
        assert_eq!(three.primary_rows.len(), 2);
        assert_eq!(three.primary_rows[0].len(), 2);
        assert_eq!(three.primary_rows[1].len(), 1);
        assert_eq!(three.primary_rows[1][0].width, 60);
    }

    #[test]
    fn test_backup_agent_layout() {
        let (_tmp, assets) = assets_with(&[]);
        let card = PlayerCard::new(
            &player(&["Astra"], &["Omen", "Viper", "Harbor", "Clove"]),
            &assets,
        );
        assert_eq!(card.backup_rows.len(), 2);
        assert_eq!(card.backup_rows[0].len(), 3);
        assert!(card.backup_rows.iter().flatten().all(|t| t.width == 40));
        assert!(card.backup_rows.iter().flatten().all(|t| !t.has_image));
    }

    #[test]
    fn test_card_number_formatting() {
        let (_tmp, assets) = assets_with(&[]);
        let card = PlayerCard::new(&player(&["Astra"], &[]), &assets);
        assert_eq!(card.kda, "1.02");
        assert_eq!(card.winrate, "61.2%");
    }

    #[test]
    fn test_render_index_without_team() {
        let html = IndexPage::new(&PlayerLimitConfig::default()).render().unwrap();

        assert!(html.contains(PAGE_TITLE));
        assert!(html.contains("Generate Team (Custom Query)"));
        assert!(html.contains("Professional (VCT International)"));
        assert!(html.contains("Semi-Professional (VCT Challengers)"));
        assert!(html.contains("Game Changers (VCT Game Changers)"));
        assert!(html.contains("min=\"200\""));
        assert!(html.contains("max=\"1700\""));
        assert!(!html.contains("Team Analysis"));
        assert!(!html.contains("Input context player count"));
    }

    #[test]
    fn test_render_context_counts() {
        let html = IndexPage::new(&PlayerLimitConfig::default())
            .with_context_counts(1240, 200)
            .render()
            .unwrap();

        assert!(html.contains(
            "<p class=\"context-note\">Input context player count: 1240. Filtered to top 200 players.</p>"
        ));
    }

    #[test]
    fn test_render_team_view() {
        let (_tmp, assets) = assets_with(&["Astra_icon.webp", "Loading_Screen_Ascent.webp"]);
        let raw = "**PLAYER: Boaster**\n\
                   Current Team: FNATIC\n\
                   Role: Controller\n\
                   Primary Agents: Astra, Omen\n\
                   KDA: 1.02\n\
                   Winrate: 58.0%\n\
                   Best Maps: Ascent (70.00%)\n\
                   Reasoning: The IGL of the side.\n\
                   Team Analysis:\n\
                   Strong utility core.";
        let team = parse_team_response(raw);
        let mut averages = BTreeMap::new();
        averages.insert("ascent".to_string(), 65.0);

        let view = TeamView::new(&team, &averages, &assets);
        assert_eq!(view.maps.len(), 1);
        assert_eq!(view.maps[0].name, "Ascent");
        assert_eq!(view.maps[0].share, "100.0%");
        assert_eq!(view.maps[0].team_average, "65.0%");

        let html = IndexPage::new(&PlayerLimitConfig::default())
            .with_team(view)
            .render()
            .unwrap();

        assert!(html.contains("Boaster"));
        assert!(html.contains("FNATIC"));
        assert!(html.contains("IGL"));
        assert!(html.contains("Astra_icon.webp"));
        assert!(html.contains("Loading_Screen_Ascent.webp"));
        // No icon on disk, so the name is printed instead.
        assert!(html.contains("<p class=\"agent-name\">Omen</p>"));
        assert!(html.contains("1.02"));
        assert!(html.contains("58.0%"));
        assert!(html.contains("Team Analysis"));
        assert!(html.contains("Strong utility core."));
        assert!(html.contains("Winrate of Top 3 Team Maps"));
        assert!(html.contains("Raw Response"));
    }

    #[test]
    fn test_render_banners_escape_text() {
        let html = IndexPage::new(&PlayerLimitConfig::default())
            .with_error("Player data file not found <missing>")
            .with_warning("Please enter a query before analyzing.")
            .render()
            .unwrap();

        assert!(html.contains("Player data file not found"));
        assert!(!html.contains("<missing>"));
        assert!(html.contains("Please enter a query before analyzing."));
    }

    #[test]
    fn test_selection_marks_category() {
        let page = IndexPage::new(&PlayerLimitConfig::default())
            .with_selection(TeamCategory::GameChangers, 450);
        assert_eq!(page.limit_value, 450);
        let selected: Vec<_> = page.categories.iter().filter(|c| c.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value, TeamCategory::GameChangers.as_str());
    }
}
