//! Catalog album model

use serde::{Deserialize, Serialize};

use super::{Artist, Image};

/// An album from the catalog service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub images: Vec<Image>,
    /// Release date as reported by the service (year, year-month or full date)
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub total_tracks: Option<u32>,
}

impl Album {
    /// First artist name, "Unknown" when the album has none
    pub fn primary_artist(&self) -> &str {
        self.artists
            .first()
            .map(|a| a.name.as_str())
            .unwrap_or("Unknown")
    }

    pub fn image_url(&self) -> Option<&str> {
        self.images.first().map(|img| img.url.as_str())
    }
}

/// Entry of the user's saved-album library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAlbum {
    #[serde(default)]
    pub added_at: String,
    pub album: Album,
}
