//! Local playlist persistence
//!
//! Layout under the data folder:
//! - `playlist.json`: the manifest (ordered clips + hotspots)
//! - `clips/step_<index>_<unix_millis>.<ext>`: imported clip files

use crate::playlist::{Clip, Playlist, Region};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MANIFEST_FILE: &str = "playlist.json";
const CLIPS_DIR: &str = "clips";
const DEFAULT_CLIP_EXTENSION: &str = "mov";

/// Playlist manifest and clip files rooted at one data folder
#[derive(Debug, Clone)]
pub struct PlaylistStore {
    root: PathBuf,
}

impl PlaylistStore {
    /// Open (and create if needed) a store rooted at `root`
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(CLIPS_DIR)).await?;
        debug!("Playlist store opened at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    fn clips_dir(&self) -> PathBuf {
        self.root.join(CLIPS_DIR)
    }

    /// Load the saved playlist; an absent manifest is an empty playlist
    pub async fn load(&self) -> Result<Playlist> {
        match Playlist::load_json(&self.manifest_path()).await {
            Ok(playlist) => {
                debug!("Loaded {} clips from store", playlist.len());
                Ok(playlist)
            }
            Err(Error::NotFound(_)) => Ok(Playlist::default()),
            Err(e) => Err(e),
        }
    }

    /// Persist the playlist manifest
    ///
    /// Written to a temporary file first and renamed over the manifest.
    pub async fn save(&self, playlist: &Playlist) -> Result<()> {
        let json = serde_json::to_string_pretty(playlist)?;
        let tmp = self.root.join(format!("{}.tmp", MANIFEST_FILE));
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, self.manifest_path()).await?;
        info!("Saved playlist with {} clips", playlist.len());
        Ok(())
    }

    /// Copy a clip into the store and return its stored path
    pub async fn import_clip(&self, source: &Path, step_index: usize) -> Result<PathBuf> {
        let metadata = tokio::fs::metadata(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("clip {}", source.display()))
            } else {
                Error::Io(e)
            }
        })?;
        if !metadata.is_file() {
            return Err(Error::InvalidInput(format!(
                "{} is not a file",
                source.display()
            )));
        }

        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(DEFAULT_CLIP_EXTENSION);
        let file_name = format!(
            "step_{}_{}.{}",
            step_index,
            chrono::Utc::now().timestamp_millis(),
            extension
        );
        let destination = self.clips_dir().join(file_name);

        tokio::fs::copy(source, &destination).await?;
        info!(
            "Imported clip {} as step {} -> {}",
            source.display(),
            step_index,
            destination.display()
        );
        Ok(destination)
    }

    /// Import `sources` as new steps after the saved ones, in order, and save
    pub async fn append_clips(&self, sources: &[PathBuf]) -> Result<Playlist> {
        let mut playlist = self.load().await?;
        for source in sources {
            let stored = self.import_clip(source, playlist.len()).await?;
            playlist.push(Clip::new(stored.to_string_lossy().into_owned()));
        }
        self.save(&playlist).await?;
        Ok(playlist)
    }

    /// Center a `size` x `size` hotspot on a tap at (`x`, `y`) percent for
    /// step `step`, and save
    pub async fn place_hotspot(&self, step: usize, x: f64, y: f64, size: f64) -> Result<Region> {
        let mut playlist = self.load().await?;
        let region = Region::centered_at(x, y, size, size)?;
        playlist.set_hotspot(step, Some(region))?;
        self.save(&playlist).await?;
        debug!(
            "Step {} hotspot at ({}, {}) {}x{}",
            step,
            region.x(),
            region.y(),
            region.width(),
            region.height()
        );
        Ok(region)
    }

    /// Remove the manifest and every stored clip file
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(self.manifest_path()).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut entries = tokio::fs::read_dir(self.clips_dir()).await?;
        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            if let Err(e) = tokio::fs::remove_file(entry.path()).await {
                warn!("Failed to remove {}: {}", entry.path().display(), e);
            } else {
                removed += 1;
            }
        }
        info!("Cleared playlist store ({} clip files removed)", removed);
        Ok(())
    }
}
