//! Artist model

use serde::{Deserialize, Serialize};

use super::Image;

/// Artist reference as it appears on tracks and albums
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

impl Artist {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Full artist resource from `/artists/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistDetails {
    pub id: String,
    pub name: String,
    /// Images, widest first
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: Option<u32>,
}

impl ArtistDetails {
    /// URL of the first (largest) image, if any
    pub fn image_url(&self) -> Option<&str> {
        self.images
            .first()
            .map(|img| img.url.as_str())
            .filter(|url| !url.is_empty())
    }
}
