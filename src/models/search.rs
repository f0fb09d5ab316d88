//! Paging and search result models

use serde::{Deserialize, Serialize};

use super::{Album, ArtistDetails, Track};

/// One page of a paginated collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> Paging<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// Resource types accepted by the search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Album,
    Artist,
    Track,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Album => "album",
            SearchType::Artist => "artist",
            SearchType::Track => "track",
        }
    }
}

impl std::fmt::Display for SearchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "album" => Ok(SearchType::Album),
            "artist" => Ok(SearchType::Artist),
            "track" => Ok(SearchType::Track),
            other => Err(format!("unknown search type: {}", other)),
        }
    }
}

/// Search results, one page per requested type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub albums: Option<Paging<Album>>,
    #[serde(default)]
    pub artists: Option<Paging<ArtistDetails>>,
    #[serde(default)]
    pub tracks: Option<Paging<Track>>,
}
