//! Custom album model
//!
//! Custom albums are defined and stored locally; the catalog service never
//! sees them. The serialized form (camelCase, RFC 3339 timestamps) is what
//! lives under the `customAlbums` storage key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Track;

/// A track placed into a custom album
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTrack {
    #[serde(flatten)]
    pub track: Track,
    /// When the track was added to the album
    #[serde(rename = "addedAt", default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl CustomTrack {
    pub fn new(track: Track, added_at: DateTime<Utc>) -> Self {
        Self {
            track,
            added_at: Some(added_at),
        }
    }

    pub fn id(&self) -> &str {
        &self.track.id
    }
}

/// A locally defined album
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAlbum {
    /// Assigned once at creation
    pub id: String,
    pub name: String,
    /// Insertion order; track numbers are not renumbered on removal
    #[serde(default)]
    pub tracks: Vec<CustomTrack>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CustomAlbum {
    pub fn track_ids(&self) -> Vec<&str> {
        self.tracks.iter().map(|t| t.id()).collect()
    }

    /// Sum of track durations in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.tracks.iter().map(|t| t.track.duration_ms).sum()
    }

    /// Apply a partial update. `id` and `created_at` are not updatable.
    pub fn apply(&mut self, update: AlbumUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(cover_url) = update.cover_url {
            self.cover_url = Some(cover_url);
        }
        if let Some(tracks) = update.tracks {
            self.tracks = tracks;
        }
    }
}

/// Partial set of album fields to merge into an existing album
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<CustomTrack>>,
}

impl AlbumUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn cover_url(url: impl Into<String>) -> Self {
        Self {
            cover_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.cover_url.is_none()
            && self.tracks.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_browser_format() {
        // timestamp ids and sparse tracks as written by the web client
        let json = r#"[{
            "id": "1714060800000",
            "name": "Road Trip",
            "tracks": [{
                "id": "t1",
                "name": "Song",
                "artists": [{"id": "a1", "name": "A"}],
                "duration_ms": 200000,
                "track_number": 1,
                "addedAt": "2024-04-25T16:00:00.000Z"
            }],
            "createdAt": "2024-04-25T15:59:00.000Z"
        }]"#;

        let albums: Vec<CustomAlbum> = serde_json::from_str(json).unwrap();
        assert_eq!(albums.len(), 1);
        let album = &albums[0];
        assert_eq!(album.name, "Road Trip");
        assert_eq!(album.track_ids(), vec!["t1"]);
        assert!(album.tracks[0].added_at.is_some());
        assert!(album.cover_url.is_none());
    }

    #[test]
    fn test_serializes_camel_case() {
        let album = CustomAlbum {
            id: "x".to_string(),
            name: "X".to_string(),
            tracks: vec![CustomTrack::new(Track::new("t1", "One"), Utc::now())],
            created_at: Utc::now(),
            cover_url: Some("http://img".to_string()),
            description: None,
        };

        let value = serde_json::to_value(&album).unwrap();
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["coverUrl"], "http://img");
        assert!(value.get("description").is_none());
        assert!(value["tracks"][0].get("addedAt").is_some());
        assert_eq!(value["tracks"][0]["id"], "t1");
    }

    #[test]
    fn test_apply_keeps_identity() {
        let created = Utc::now();
        let mut album = CustomAlbum {
            id: "keep".to_string(),
            name: "Old".to_string(),
            tracks: Vec::new(),
            created_at: created,
            cover_url: None,
            description: None,
        };

        album.apply(AlbumUpdate {
            name: Some("New".to_string()),
            description: Some("desc".to_string()),
            ..Default::default()
        });

        assert_eq!(album.id, "keep");
        assert_eq!(album.created_at, created);
        assert_eq!(album.name, "New");
        assert_eq!(album.description.as_deref(), Some("desc"));
        assert!(album.cover_url.is_none());
    }

    #[test]
    fn test_duration_and_empty_update() {
        let mut first = Track::new("t1", "One");
        first.duration_ms = 61_000;
        let mut second = Track::new("t2", "Two");
        second.duration_ms = 59_500;

        let album = CustomAlbum {
            id: "1".to_string(),
            name: "Mix".to_string(),
            tracks: vec![
                CustomTrack::new(first, Utc::now()),
                CustomTrack::new(second, Utc::now()),
            ],
            created_at: Utc::now(),
            cover_url: None,
            description: None,
        };
        assert_eq!(album.duration_ms(), 120_500);

        assert!(AlbumUpdate::default().is_empty());
        assert!(!AlbumUpdate::cover_url("https://img").is_empty());
    }
}
