use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// One movie card. Fields the dashboard does not interpret (release date,
/// overview, genre ids, ...) ride along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: i64,
    #[serde(default, deserialize_with = "or_default")]
    pub title: String,
    #[serde(default, deserialize_with = "or_default")]
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub vote_average: f64,
    /// Always serialized, `null` when the detail lookup produced nothing.
    #[serde(default, deserialize_with = "or_default")]
    pub runtime: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PagedResult {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default, deserialize_with = "skip_undecodable")]
    pub results: Vec<MovieSummary>,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default = "first_page")]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

/// A field of the wrong type decodes as its default.
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_default())
}

/// Items that cannot be read as a movie (no numeric id) are dropped from the
/// list rather than failing the whole page.
fn skip_undecodable<'de, D>(deserializer: D) -> Result<Vec<MovieSummary>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<MovieSummary>(item) {
            Ok(movie) => Some(movie),
            Err(e) => {
                warn!("Skipping unreadable movie entry: {}", e);
                None
            }
        })
        .collect())
}

impl PagedResult {
    /// Shape returned when a cast search matches nobody.
    pub fn empty() -> Self {
        Self {
            page: 1,
            results: Vec::new(),
            total_results: 0,
            total_pages: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonMatch {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PersonSearch {
    #[serde(default)]
    pub results: Vec<PersonMatch>,
}

#[derive(Debug, Deserialize)]
pub struct PersonCredits {
    #[serde(default, deserialize_with = "skip_undecodable")]
    pub cast: Vec<MovieSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreList {
    #[serde(default)]
    pub genres: Vec<Genre>,
}
