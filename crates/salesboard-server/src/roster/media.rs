use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::error::RosterError;
use crate::config::MediaConfig;
use crate::utils::normalize_file_id;

/// Extensions swept when a person's media is removed.
pub const PURGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".webp", ".mp4"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Icon,
    Video,
}

impl MediaKind {
    pub const ALL: [MediaKind; 3] = [MediaKind::Photo, MediaKind::Icon, MediaKind::Video];

    pub fn suffix(&self) -> &'static str {
        match self {
            MediaKind::Icon => "-icon",
            MediaKind::Photo | MediaKind::Video => "",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Photo | MediaKind::Icon => ".png",
            MediaKind::Video => ".mp4",
        }
    }

    /// Stored filename for a file id, e.g. `jane-icon.png`.
    pub fn file_name(&self, file_id: &str) -> String {
        format!("{}{}{}", file_id, self.suffix(), self.extension())
    }
}

/// Photo, icon and video directories under the static root.
#[derive(Debug, Clone)]
pub struct MediaStore {
    photos_dir: PathBuf,
    icons_dir: PathBuf,
    videos_dir: PathBuf,
}

impl MediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            photos_dir: config.photos_dir.clone(),
            icons_dir: config.icons_dir.clone(),
            videos_dir: config.videos_dir.clone(),
        }
    }

    pub async fn ensure_dirs(&self) -> Result<(), RosterError> {
        for kind in MediaKind::ALL {
            let dir = self.dir(kind);
            fs::create_dir_all(dir)
                .await
                .map_err(|e| RosterError::io(dir, e))?;
        }
        Ok(())
    }

    pub fn dir(&self, kind: MediaKind) -> &Path {
        match kind {
            MediaKind::Photo => &self.photos_dir,
            MediaKind::Icon => &self.icons_dir,
            MediaKind::Video => &self.videos_dir,
        }
    }

    pub fn path_for(&self, kind: MediaKind, file_id: &str) -> PathBuf {
        self.dir(kind).join(kind.file_name(file_id))
    }

    /// Write an upload under its canonical name and return that name.
    pub async fn save(
        &self,
        kind: MediaKind,
        file_id: &str,
        bytes: &[u8],
    ) -> Result<String, RosterError> {
        ensure_safe_id(file_id)?;
        let path = self.path_for(kind, file_id);
        fs::write(&path, bytes)
            .await
            .map_err(|e| RosterError::io(&path, e))?;

        debug!("Saved {:?} ({} bytes) to {}", kind, bytes.len(), path.display());
        Ok(kind.file_name(file_id))
    }

    /// Remove the canonical file of one kind; a missing file is fine.
    pub async fn remove(&self, kind: MediaKind, file_id: &str) {
        if ensure_safe_id(file_id).is_err() {
            return;
        }
        let path = self.path_for(kind, file_id);
        match fs::remove_file(&path).await {
            Ok(()) => debug!("Removed {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {}", path.display(), e),
        }
    }

    /// Remove every variant of a file id's media; returns how many files went.
    ///
    /// Missing files are fine and other failures are only logged.
    pub async fn purge(&self, file_id: &str) -> usize {
        if file_id.is_empty() {
            return 0;
        }
        if ensure_safe_id(file_id).is_err() {
            warn!("Refusing to purge media for unsafe file id {:?}", file_id);
            return 0;
        }

        let mut removed = 0;
        for kind in MediaKind::ALL {
            for ext in PURGE_EXTENSIONS {
                let path = self
                    .dir(kind)
                    .join(format!("{}{}{}", file_id, kind.suffix(), ext));
                match fs::remove_file(&path).await {
                    Ok(()) => {
                        removed += 1;
                        debug!("Removed {}", path.display());
                    }
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => warn!("Could not remove {}: {}", path.display(), e),
                }
            }
        }
        removed
    }
}

fn ensure_safe_id(file_id: &str) -> Result<(), RosterError> {
    if file_id.is_empty() || normalize_file_id(file_id) != file_id {
        return Err(RosterError::Validation(format!(
            "Invalid file id: {:?}",
            file_id
        )));
    }
    Ok(())
}
