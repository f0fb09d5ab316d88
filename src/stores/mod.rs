//! In-memory stores backed by device-local storage

mod custom_album_store;

pub use custom_album_store::CustomAlbumStore;
