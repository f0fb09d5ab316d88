//! Data models for spoty
//!
//! Catalog resources mirror the service's JSON payloads; custom albums are the
//! locally persisted library format.

mod album;
mod artist;
mod custom_album;
mod search;
mod track;

pub use album::{Album, SavedAlbum};
pub use artist::{Artist, ArtistDetails};
pub use custom_album::{AlbumUpdate, CustomAlbum, CustomTrack};
pub use search::{Paging, SearchResponse, SearchType};
pub use track::{ExternalUrls, Track, TrackAlbum};

/// Image reference (album art, artist photos)
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}
