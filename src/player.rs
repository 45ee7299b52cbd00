use serde::{Deserialize, Serialize, Serializer};

/// Team code used for a season split across several teams.
pub const TOTAL_TEAM_CODE: &str = "TOT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "IsActive")]
    pub is_active: bool,
    // Kept in memory only; the exported snapshot never carries it.
    #[serde(skip)]
    pub is_hall_of_fame: bool,
    #[serde(rename = "Position")]
    pub position: String,
    #[serde(rename = "Height")]
    pub height: String,
    #[serde(rename = "Teams")]
    pub teams: Vec<String>,
    #[serde(rename = "SeasonAverages")]
    pub season_averages: Vec<SeasonAverage>,
    #[serde(skip)]
    pub profile_link: String,
}

impl PlayerRecord {
    pub fn stub(
        name: impl Into<String>,
        is_active: bool,
        is_hall_of_fame: bool,
        position: impl Into<String>,
        height: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            is_active,
            is_hall_of_fame,
            position: position.into(),
            height: height.into(),
            teams: Vec::new(),
            season_averages: Vec::new(),
            profile_link: String::new(),
        }
    }

    pub fn with_profile_link(mut self, link: impl Into<String>) -> Self {
        self.profile_link = link.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonAverage {
    #[serde(rename = "Season")]
    pub season: String,
    #[serde(rename = "Age")]
    pub age: i32,
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "GamesPlayed")]
    pub games_played: i32,
    #[serde(rename = "PtsPerGame", serialize_with = "serialize_stat")]
    pub pts_per_game: f64,
    #[serde(rename = "RebPerGame", serialize_with = "serialize_stat")]
    pub reb_per_game: f64,
    #[serde(rename = "AstPerGame", serialize_with = "serialize_stat")]
    pub ast_per_game: f64,
    #[serde(rename = "StlPerGame", serialize_with = "serialize_stat")]
    pub stl_per_game: f64,
    #[serde(rename = "BlkPerGame", serialize_with = "serialize_stat")]
    pub blk_per_game: f64,
    #[serde(rename = "TOVPerGame", serialize_with = "serialize_stat")]
    pub tov_per_game: f64,
    #[serde(rename = "FGP", serialize_with = "serialize_stat")]
    pub field_goal_pct: f64,
    #[serde(rename = "ThreePP", serialize_with = "serialize_stat")]
    pub three_point_pct: f64,
    #[serde(rename = "FTPerGame", serialize_with = "serialize_stat")]
    pub ft_per_game: f64,
    #[serde(rename = "MPG", serialize_with = "serialize_stat")]
    pub minutes_per_game: f64,
    #[serde(rename = "FTP", serialize_with = "serialize_stat")]
    pub free_throw_pct: f64,
}

/// Whole numbers are written without a fractional part (`0`, `28`), the
/// rest in shortest round-trip form.
fn serialize_stat<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Result of one profile page: the heading name used to resolve the stub,
/// plus the statistics that replace the stub's empty lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileStats {
    pub name: String,
    pub teams: Vec<String>,
    pub season_averages: Vec<SeasonAverage>,
}
