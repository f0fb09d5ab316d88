//! Subcommands and their handlers

use anyhow::{anyhow, bail, Context, Result};
use clap::Subcommand;
use std::sync::Arc;
use tracing::{info, warn};

use spoty::auth::{callback, AuthSession, AuthorizationFlow};
use spoty::client::{ApiClient, ApiError, Catalog, ForbiddenHook, MAX_PAGE_SIZE};
use spoty::config::{Paths, UserConfig};
use spoty::models::{AlbumUpdate, CustomAlbum, SearchType};
use spoty::storage::{JsonFileStore, KeyValueStore};
use spoty::stores::CustomAlbumStore;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Authorize spoty in the browser
    Login,
    /// Forget the stored access token
    Logout,
    /// Show login state and local library size
    Status,
    /// Search the catalog
    Search {
        query: String,
        /// Comma separated: album, artist, track
        #[arg(long = "type", value_delimiter = ',', default_value = "album")]
        types: Vec<SearchType>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show an album and its tracks
    Album { id: String },
    /// Saved albums in your catalog library
    #[command(subcommand)]
    Saved(SavedCommand),
    /// Custom albums kept on this device
    #[command(subcommand)]
    Custom(CustomCommand),
    /// Settings file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum SavedCommand {
    List {
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    Add {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Contains {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CustomCommand {
    List,
    Show {
        id: String,
    },
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Cover image URL
        #[arg(long)]
        cover: Option<String>,
    },
    Rename {
        id: String,
        name: String,
    },
    Delete {
        id: String,
    },
    /// Fetch a catalog track and append it
    AddTrack {
        album: String,
        track_id: String,
    },
    RemoveTrack {
        album: String,
        track_id: String,
    },
    /// Use the image of the most frequent artist as cover
    Cover {
        album: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a settings.json with defaults
    Init,
    /// Print the effective settings
    Show,
}

/// Everything a command needs, wired once at startup
pub struct App {
    paths: Paths,
    config: UserConfig,
    storage: Arc<dyn KeyValueStore>,
    session: AuthSession,
    api: ApiClient,
    albums: CustomAlbumStore,
}

impl App {
    pub fn init(paths: Paths) -> Result<Self> {
        let config = UserConfig::load(&paths)?;

        let storage: Arc<dyn KeyValueStore> = Arc::new(
            JsonFileStore::open(paths.storage_path()).context("Failed to open storage")?,
        );
        let session = AuthSession::new(storage.clone());
        let api = ApiClient::new(config.api_base_url.clone());
        let albums = CustomAlbumStore::open(storage.clone(), api.clone());

        Ok(Self {
            paths,
            config,
            storage,
            session,
            api,
            albums,
        })
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Login => self.login().await,
            Command::Logout => {
                self.session.logout();
                println!("Logged out.");
                Ok(())
            }
            Command::Status => self.status(),
            Command::Search {
                query,
                types,
                limit,
                offset,
            } => self.search(&query, &types, limit, offset).await,
            Command::Album { id } => self.album(&id).await,
            Command::Saved(cmd) => self.saved(cmd).await,
            Command::Custom(cmd) => self.custom(cmd).await,
            Command::Config(cmd) => self.config_command(cmd),
        }
    }

    async fn login(&self) -> Result<()> {
        let flow = AuthorizationFlow::new(self.config.oauth_settings(), self.storage.clone());
        let url = flow.begin()?;

        println!("Opening your browser to authorize spoty.");
        println!("If nothing happens, visit:\n\n  {}\n", url);
        if let Err(e) = open::that(&url) {
            warn!("Could not open a browser: {}", e);
        }

        let code = callback::wait_for_code(&self.config.redirect_uri, self.config.callback_timeout())
            .await
            .context("Did not receive an authorization code")?;

        let token = flow
            .exchange_code(&code)
            .await
            .context("Could not obtain an access token, try `spoty login` again")?;
        self.session.login(&token);

        println!("Logged in.");
        Ok(())
    }

    fn status(&self) -> Result<()> {
        if self.session.is_authenticated() {
            println!("Logged in");
        } else {
            println!("Not logged in");
        }
        println!("Config directory: {}", self.paths.config_dir().display());
        println!("Custom albums: {}", self.albums.count());
        Ok(())
    }

    async fn search(&self, query: &str, types: &[SearchType], limit: u32, offset: u32) -> Result<()> {
        let catalog = self.catalog()?;
        let results = self.check(catalog.search(query, types, limit, offset).await)?;

        if let Some(albums) = results.albums {
            println!("Albums ({} total)", albums.total);
            for album in albums.items {
                println!(
                    "  {}  {} - {} ({})",
                    album.id,
                    album.name,
                    album.primary_artist(),
                    album.release_date
                );
            }
        }
        if let Some(artists) = results.artists {
            println!("Artists ({} total)", artists.total);
            for artist in artists.items {
                println!("  {}  {}", artist.id, artist.name);
            }
        }
        if let Some(tracks) = results.tracks {
            println!("Tracks ({} total)", tracks.total);
            for track in tracks.items {
                println!(
                    "  {}  {} - {} [{}]",
                    track.id,
                    track.name,
                    track.artist_names(),
                    track.duration_display()
                );
            }
        }
        Ok(())
    }

    async fn album(&self, id: &str) -> Result<()> {
        let catalog = self.catalog()?;
        let album = self.check(catalog.get_album(id).await)?;

        println!("{} - {}", album.name, album.primary_artist());
        if !album.release_date.is_empty() {
            println!("Released {}", album.release_date);
        }
        if let Some(url) = album.image_url() {
            println!("Cover {}", url);
        }

        let mut offset = 0;
        loop {
            let page = self.check(catalog.get_album_tracks(id, MAX_PAGE_SIZE, offset).await)?;
            for track in &page.items {
                println!(
                    "  {:>2}. {} - {} [{}]",
                    track.track_number,
                    track.name,
                    track.artist_names(),
                    track.duration_display()
                );
            }
            if !page.has_next() || page.items.is_empty() {
                break;
            }
            offset += page.items.len() as u32;
        }
        Ok(())
    }

    async fn saved(&self, cmd: SavedCommand) -> Result<()> {
        let catalog = self.catalog()?;

        match cmd {
            SavedCommand::List { limit, offset } => {
                let page = self.check(catalog.saved_albums(limit, offset).await)?;
                println!("Saved albums ({} total)", page.total);
                for saved in page.items {
                    println!(
                        "  {}  {} - {}",
                        saved.album.id,
                        saved.album.name,
                        saved.album.primary_artist()
                    );
                }
            }
            SavedCommand::Add { ids } => {
                self.check(catalog.save_albums(&as_strs(&ids)).await)?;
                println!("Saved {} album(s).", ids.len());
            }
            SavedCommand::Remove { ids } => {
                self.check(catalog.remove_saved_albums(&as_strs(&ids)).await)?;
                println!("Removed {} album(s).", ids.len());
            }
            SavedCommand::Contains { ids } => {
                let flags = self.check(catalog.check_saved_albums(&as_strs(&ids)).await)?;
                for (id, saved) in ids.iter().zip(flags) {
                    println!("  {}  {}", id, if saved { "saved" } else { "not saved" });
                }
            }
        }
        Ok(())
    }

    async fn custom(&self, cmd: CustomCommand) -> Result<()> {
        match cmd {
            CustomCommand::List => {
                let albums = self.albums.get_albums();
                if albums.is_empty() {
                    println!("No custom albums yet.");
                }
                for album in albums {
                    println!("  {}  {} ({} tracks)", album.id, album.name, album.tracks.len());
                }
            }
            CustomCommand::Show { id } => {
                let album = self.custom_album(&id)?;
                print_custom_album(&album);
            }
            CustomCommand::Create {
                name,
                description,
                cover,
            } => {
                let album = self.albums.create_album(&name, description, cover)?;
                println!("Created {} ({})", album.name, album.id);
            }
            CustomCommand::Rename { id, name } => {
                if !self.albums.update_album(&id, AlbumUpdate::name(name))? {
                    bail!("No custom album {}", id);
                }
                println!("Renamed.");
            }
            CustomCommand::Delete { id } => {
                if !self.albums.delete_album(&id)? {
                    bail!("No custom album {}", id);
                }
                println!("Deleted.");
            }
            CustomCommand::AddTrack { album, track_id } => {
                self.custom_album(&album)?;
                let catalog = self.catalog()?;
                let track = self.check(catalog.get_track(&track_id).await)?;
                let name = track.name.clone();

                if !self.albums.add_track_to_album(&album, track)? {
                    bail!("No custom album {}", album);
                }
                println!("Added {}.", name);
            }
            CustomCommand::RemoveTrack { album, track_id } => {
                if !self.albums.remove_track_from_album(&album, &track_id)? {
                    bail!("No custom album {}", album);
                }
                println!("Removed {}.", track_id);
            }
            CustomCommand::Cover { album } => {
                self.custom_album(&album)?;
                let token = self
                    .session
                    .token()
                    .context("Not logged in, run `spoty login` first")?;

                match self
                    .albums
                    .update_album_cover_from_most_frequent_artist(&album, &token)
                    .await
                {
                    Some(url) => println!("Cover set to {}", url),
                    None => println!("Cover left unchanged, see the log for details."),
                }
            }
        }
        Ok(())
    }

    fn config_command(&self, cmd: ConfigCommand) -> Result<()> {
        match cmd {
            ConfigCommand::Init => {
                let path = self.paths.settings_path();
                if path.exists() {
                    println!("{} already exists.", path.display());
                    return Ok(());
                }
                UserConfig::default().save(&self.paths)?;
                info!("Wrote {}", path.display());
                println!("Wrote {}. Set client_id before logging in.", path.display());
            }
            ConfigCommand::Show => {
                let json = serde_json::to_string_pretty(&self.config)?;
                println!("{}", json);
            }
        }
        Ok(())
    }

    /// Catalog bound to the current token
    fn catalog(&self) -> Result<Catalog> {
        let token = self
            .session
            .token()
            .context("Not logged in, run `spoty login` first")?;

        let hook: Arc<ForbiddenHook> = Arc::new(|| {
            eprintln!("The catalog service refused this request for your account.");
        });
        Ok(self.api.catalog(token).on_forbidden(hook))
    }

    /// Turn an API error into a command error, logging out on an expired token
    fn check<T>(&self, result: Result<T, ApiError>) -> Result<T> {
        result.map_err(|e| {
            if self.session.handle_api_error(&e) {
                anyhow!("Your session has expired, run `spoty login` again")
            } else {
                anyhow::Error::new(e)
            }
        })
    }

    fn custom_album(&self, id: &str) -> Result<CustomAlbum> {
        self.albums
            .get_album_by_id(id)
            .ok_or_else(|| anyhow!("No custom album {}", id))
    }
}

fn as_strs(ids: &[String]) -> Vec<&str> {
    ids.iter().map(String::as_str).collect()
}

fn print_custom_album(album: &CustomAlbum) {
    println!("{} ({})", album.name, album.id);
    if let Some(description) = &album.description {
        println!("{}", description);
    }
    if let Some(cover) = &album.cover_url {
        println!("Cover {}", cover);
    }
    let total_secs = album.duration_ms() / 1000;
    println!(
        "Created {}, {} tracks, {}:{:02}",
        album.created_at.format("%Y-%m-%d %H:%M"),
        album.tracks.len(),
        total_secs / 60,
        total_secs % 60
    );

    for (i, entry) in album.tracks.iter().enumerate() {
        println!(
            "  {:>2}. {}  {} - {} [{}]",
            i + 1,
            entry.id(),
            entry.track.name,
            entry.track.artist_names(),
            entry.track.duration_display()
        );
    }
}
