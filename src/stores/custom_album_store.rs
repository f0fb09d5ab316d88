//! Custom album store - locally defined albums persisted under `customAlbums`

use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::ApiClient;
use crate::models::{AlbumUpdate, CustomAlbum, CustomTrack, Track};
use crate::storage::{KeyValueStore, StorageError, CUSTOM_ALBUMS_BACKUP_KEY, CUSTOM_ALBUMS_KEY};

/// In-memory view of the custom album library, written through to storage
pub struct CustomAlbumStore {
    storage: Arc<dyn KeyValueStore>,
    api: ApiClient,
    /// Creation order
    albums: RwLock<Vec<CustomAlbum>>,
}

impl CustomAlbumStore {
    /// Load the library from storage.
    ///
    /// Albums that fail to parse are skipped; the raw value is first copied to
    /// `customAlbums.bak` so the next write cannot lose them.
    pub fn open(storage: Arc<dyn KeyValueStore>, api: ApiClient) -> Self {
        let albums = match storage.get(CUSTOM_ALBUMS_KEY) {
            Some(raw) => {
                let (albums, skipped) = parse_albums(&raw);
                if skipped > 0 {
                    warn!(
                        "Skipped {} unreadable custom album entries, original kept under {}",
                        skipped, CUSTOM_ALBUMS_BACKUP_KEY
                    );
                    if let Err(e) = storage.set(CUSTOM_ALBUMS_BACKUP_KEY, &raw) {
                        warn!("Failed to back up custom albums: {}", e);
                    }
                }
                albums
            }
            None => Vec::new(),
        };

        debug!("Loaded {} custom albums", albums.len());

        Self {
            storage,
            api,
            albums: RwLock::new(albums),
        }
    }

    /// Get all albums
    pub fn get_albums(&self) -> Vec<CustomAlbum> {
        self.albums.read().clone()
    }

    pub fn get_album_by_id(&self, id: &str) -> Option<CustomAlbum> {
        self.albums.read().iter().find(|a| a.id == id).cloned()
    }

    /// Get total album count
    pub fn count(&self) -> usize {
        self.albums.read().len()
    }

    /// Create an empty album and persist it
    pub fn create_album(
        &self,
        name: &str,
        description: Option<String>,
        cover_url: Option<String>,
    ) -> Result<CustomAlbum, StorageError> {
        let album = CustomAlbum {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            tracks: Vec::new(),
            created_at: Utc::now(),
            cover_url,
            description,
        };

        let mut albums = self.albums.write();
        let mut next = albums.clone();
        next.push(album.clone());
        self.persist(&next)?;
        *albums = next;

        info!("Created custom album {} ({})", album.name, album.id);
        Ok(album)
    }

    /// Merge `update` into the album
    pub fn update_album(&self, id: &str, update: AlbumUpdate) -> Result<bool, StorageError> {
        if update.is_empty() {
            return Ok(self.get_album_by_id(id).is_some());
        }
        self.mutate(id, |album| album.apply(update))
    }

    pub fn delete_album(&self, id: &str) -> Result<bool, StorageError> {
        let mut albums = self.albums.write();
        let Some(index) = albums.iter().position(|a| a.id == id) else {
            debug!("delete: no custom album {}", id);
            return Ok(false);
        };

        let mut next = albums.clone();
        let removed = next.remove(index);
        self.persist(&next)?;
        *albums = next;

        info!("Deleted custom album {} ({})", removed.name, removed.id);
        Ok(true)
    }

    /// Append a track, stamped with the current time. Duplicates are kept.
    pub fn add_track_to_album(&self, album_id: &str, track: Track) -> Result<bool, StorageError> {
        let entry = CustomTrack::new(track, Utc::now());
        self.mutate(album_id, move |album| album.tracks.push(entry))
    }

    /// Drop every occurrence of `track_id`
    pub fn remove_track_from_album(
        &self,
        album_id: &str,
        track_id: &str,
    ) -> Result<bool, StorageError> {
        self.mutate(album_id, |album| album.tracks.retain(|t| t.id() != track_id))
    }

    /// Set the cover to the image of the artist appearing on the most tracks.
    ///
    /// Returns the new cover URL, or `None` when nothing was applied.
    pub async fn update_album_cover_from_most_frequent_artist(
        &self,
        album_id: &str,
        token: &str,
    ) -> Option<String> {
        self.update_album_cover_from_most_frequent_artist_cancellable(
            album_id,
            token,
            &CancellationToken::new(),
        )
        .await
    }

    pub async fn update_album_cover_from_most_frequent_artist_cancellable(
        &self,
        album_id: &str,
        token: &str,
        cancel: &CancellationToken,
    ) -> Option<String> {
        // Snapshot; the lock must not be held across the fetch
        let Some(album) = self.get_album_by_id(album_id) else {
            warn!("Cover update: no custom album {}", album_id);
            return None;
        };

        let Some(artist_id) = most_frequent_artist(&album) else {
            warn!("Cover update: album {} has no artists to pick from", album_id);
            return None;
        };

        let artist = match self
            .api
            .catalog(token)
            .get_artist_cancellable(&artist_id, cancel)
            .await
        {
            Ok(artist) => artist,
            Err(e) => {
                warn!("Cover update: failed to fetch artist {}: {}", artist_id, e);
                return None;
            }
        };

        let Some(cover) = artist.image_url().map(str::to_string) else {
            warn!("Cover update: artist {} has no image", artist_id);
            return None;
        };

        if cancel.is_cancelled() {
            debug!("Cover update for {} cancelled", album_id);
            return None;
        }

        let update = AlbumUpdate::cover_url(cover.clone());
        match self.mutate(album_id, move |album| album.apply(update)) {
            Ok(true) => {
                info!("Set cover of {} from artist {}", album_id, artist.name);
                Some(cover)
            }
            Ok(false) => {
                debug!("Cover update: album {} was deleted meanwhile", album_id);
                None
            }
            Err(e) => {
                warn!("Cover update: failed to persist album {}: {}", album_id, e);
                None
            }
        }
    }

    /// Clone, modify, persist, then commit. Memory is untouched if the write fails.
    fn mutate<F>(&self, id: &str, change: F) -> Result<bool, StorageError>
    where
        F: FnOnce(&mut CustomAlbum),
    {
        let mut albums = self.albums.write();
        let Some(index) = albums.iter().position(|a| a.id == id) else {
            debug!("No custom album {}", id);
            return Ok(false);
        };

        let mut next = albums.clone();
        change(&mut next[index]);
        self.persist(&next)?;
        *albums = next;
        Ok(true)
    }

    fn persist(&self, albums: &[CustomAlbum]) -> Result<(), StorageError> {
        let json = serde_json::to_string(albums)?;
        self.storage.set(CUSTOM_ALBUMS_KEY, &json)
    }
}

/// Readable albums of a persisted value, plus how many entries were dropped.
/// A value that is not a JSON array counts as one dropped entry.
fn parse_albums(raw: &str) -> (Vec<CustomAlbum>, usize) {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Custom albums are not a JSON array: {}", e);
            return (Vec::new(), 1);
        }
    };

    let mut albums = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for entry in entries {
        match serde_json::from_value::<CustomAlbum>(entry) {
            Ok(album) => albums.push(album),
            Err(e) => {
                debug!("Unreadable custom album: {}", e);
                skipped += 1;
            }
        }
    }

    (albums, skipped)
}

/// Artist id credited on the most tracks; ties go to the one seen first
fn most_frequent_artist(album: &CustomAlbum) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for artist in album.tracks.iter().flat_map(|t| t.track.artists.iter()) {
        if artist.id.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(id, _)| *id == artist.id) {
            Some((_, count)) => *count += 1,
            None => counts.push((artist.id.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (id, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((id, count));
        }
    }

    best.map(|(id, _)| id.to_string())
}
