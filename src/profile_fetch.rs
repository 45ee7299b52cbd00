use std::collections::HashSet;

use anyhow::{Context, Result};
use scraper::{Html, Selector};

use crate::page_source::PageSource;
use crate::parse::{FieldMap, Fields, child_text, selector};
use crate::player::{ProfileStats, SeasonAverage, TOTAL_TEAM_CODE};

const HEADING: &str = "h1";
const STATS_TABLE: &str = "table#per_game";
const STATS_ROWS: &str = "tbody > tr";

const SEASON_FIELDS: &[(&str, &str)] = &[
    ("season", "th[data-stat='season']"),
    ("age", "td[data-stat='age']"),
    ("team", "td[data-stat='team_id']"),
    ("games", "td[data-stat='g']"),
    ("pts", "td[data-stat='pts_per_g']"),
    ("reb", "td[data-stat='trb_per_g']"),
    ("ast", "td[data-stat='ast_per_g']"),
    ("stl", "td[data-stat='stl_per_g']"),
    ("blk", "td[data-stat='blk_per_g']"),
    ("tov", "td[data-stat='tov_per_g']"),
    ("fg_pct", "td[data-stat='fg_pct']"),
    ("fg3_pct", "td[data-stat='fg3_pct']"),
    ("ft", "td[data-stat='ft_per_g']"),
    ("mp", "td[data-stat='mp_per_g']"),
    ("ft_pct", "td[data-stat='ft_pct']"),
];

#[derive(Debug)]
pub struct ProfileParser {
    heading: Selector,
    table: Selector,
    rows: Selector,
    fields: FieldMap,
}

impl ProfileParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            heading: selector(HEADING)?,
            table: selector(STATS_TABLE)?,
            rows: selector(STATS_ROWS)?,
            fields: FieldMap::compile(SEASON_FIELDS)?,
        })
    }

    /// Heading name plus one season per row of the first per-game table.
    /// A page without that table yields empty lists.
    pub fn parse(&self, html: &str) -> ProfileStats {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let name = child_text(root, &self.heading);

        let season_averages: Vec<SeasonAverage> = root
            .select(&self.table)
            .next()
            .map(|table| {
                table
                    .select(&self.rows)
                    .map(|row| season_from_fields(&self.fields.extract(row)))
                    .collect()
            })
            .unwrap_or_default();

        let teams = distinct_teams(season_averages.iter().map(|s| s.team.as_str()));

        ProfileStats {
            name,
            teams,
            season_averages,
        }
    }

    pub fn fetch(&self, source: &dyn PageSource, url: &str) -> Result<ProfileStats> {
        let body = source
            .fetch(url)
            .with_context(|| format!("profile fetch failed: {url}"))?;
        Ok(self.parse(&body))
    }
}

fn season_from_fields(fields: &Fields) -> SeasonAverage {
    SeasonAverage {
        season: fields.text("season").to_string(),
        age: fields.int("age"),
        team: fields.text("team").to_string(),
        games_played: fields.int("games"),
        pts_per_game: fields.float("pts"),
        reb_per_game: fields.float("reb"),
        ast_per_game: fields.float("ast"),
        stl_per_game: fields.float("stl"),
        blk_per_game: fields.float("blk"),
        tov_per_game: fields.float("tov"),
        field_goal_pct: fields.float("fg_pct"),
        three_point_pct: fields.float("fg3_pct"),
        ft_per_game: fields.float("ft"),
        minutes_per_game: fields.float("mp"),
        free_throw_pct: fields.float("ft_pct"),
    }
}

/// First-seen order, no duplicates, never the multi-team total code or a blank cell.
pub fn distinct_teams<'a>(codes: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut teams = Vec::new();
    for code in codes {
        if code.is_empty() || code == TOTAL_TEAM_CODE || !seen.insert(code) {
            continue;
        }
        teams.push(code.to_string());
    }
    teams
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_teams_skips_total_and_repeats() {
        assert_eq!(distinct_teams(["LAL", "LAL", "TOT", "BOS"]), vec!["LAL", "BOS"]);
        assert_eq!(distinct_teams(["TOT"]), Vec::<String>::new());
        assert_eq!(distinct_teams(["MIL", "", "LAL", "MIL"]), vec!["MIL", "LAL"]);
    }

    #[test]
    fn page_without_stats_table_has_empty_lists() {
        let parser = ProfileParser::new().unwrap();
        let stats = parser.parse("<html><body><h1> Jane Doe </h1><p>no stats</p></body></html>");
        assert_eq!(stats.name, "Jane Doe");
        assert!(stats.teams.is_empty());
        assert!(stats.season_averages.is_empty());
    }
}
