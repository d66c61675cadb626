use std::sync::Arc;
use tracing::{debug, info};

use crate::roster::{MediaKind, MediaStore, Roster, RosterEntry, RosterError, RosterStore};
use crate::utils::normalize_file_id;

/// An uploaded media file; only parts with a filename count as uploads.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct MediaUploads {
    pub photo: Option<Upload>,
    pub icon: Option<Upload>,
    pub video: Option<Upload>,
}

impl MediaUploads {
    pub fn get(&self, kind: MediaKind) -> Option<&Upload> {
        match kind {
            MediaKind::Photo => self.photo.as_ref(),
            MediaKind::Icon => self.icon.as_ref(),
            MediaKind::Video => self.video.as_ref(),
        }
    }

    pub fn set(&mut self, kind: MediaKind, upload: Upload) {
        match kind {
            MediaKind::Photo => self.photo = Some(upload),
            MediaKind::Icon => self.icon = Some(upload),
            MediaKind::Video => self.video = Some(upload),
        }
    }

    fn is_complete(&self) -> bool {
        MediaKind::ALL.iter().all(|kind| self.get(*kind).is_some())
    }
}

/// Admin form values, already trimmed.
#[derive(Debug, Clone, Default)]
pub struct PersonForm {
    pub short_name: String,
    /// Raw file id as typed; normalized before use.
    pub file_id: String,
    pub goal_name: String,
    pub owner_id: Option<String>,
}

impl PersonForm {
    fn normalized_file_id(&self) -> Result<String, RosterError> {
        let file_id = normalize_file_id(&self.file_id);
        if file_id.is_empty() {
            return Err(RosterError::Validation(format!(
                "File id {:?} has no usable characters",
                self.file_id
            )));
        }
        Ok(file_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    Updated,
}

/// Create, edit and delete roster entries together with their media.
pub struct RosterService {
    store: Arc<RosterStore>,
    media: Arc<MediaStore>,
}

impl RosterService {
    pub fn new(store: Arc<RosterStore>, media: Arc<MediaStore>) -> Self {
        Self { store, media }
    }

    pub async fn people(&self) -> Result<Roster, RosterError> {
        self.store.load().await
    }

    /// Admin form submission: edits a known person when `is_update` is set,
    /// otherwise (or for an unknown name) creates one.
    pub async fn submit(
        &self,
        full_name: &str,
        form: PersonForm,
        uploads: MediaUploads,
        is_update: bool,
    ) -> Result<SubmitOutcome, RosterError> {
        if is_update && self.store.load().await?.contains_key(full_name) {
            self.update(full_name, form, uploads).await?;
            return Ok(SubmitOutcome::Updated);
        }
        self.create(full_name, form, uploads).await?;
        Ok(SubmitOutcome::Created)
    }

    /// New person: all three media files are required.
    pub async fn create(
        &self,
        full_name: &str,
        form: PersonForm,
        uploads: MediaUploads,
    ) -> Result<RosterEntry, RosterError> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(RosterError::Validation("Full name is required".to_string()));
        }
        if !uploads.is_complete() {
            return Err(RosterError::Validation(
                "Missing file uploads for new person".to_string(),
            ));
        }
        let file_id = form.normalized_file_id()?;

        let mut txn = self.store.begin().await?;

        let mut entry = RosterEntry {
            short: form.short_name,
            file_id: file_id.clone(),
            goal_name: form.goal_name,
            owner_id: form.owner_id,
            ..Default::default()
        };
        for kind in MediaKind::ALL {
            if let Some(upload) = uploads.get(kind) {
                let stored = self.media.save(kind, &file_id, &upload.bytes).await?;
                debug!("Stored {} as {}", upload.file_name, stored);
                set_media_name(&mut entry, kind, stored);
            }
        }

        txn.roster_mut().insert(full_name.to_string(), entry.clone());
        txn.commit().await?;

        info!("Added {} to the roster (file id {})", full_name, file_id);
        Ok(entry)
    }

    /// Edit an existing person.
    ///
    /// A changed file id purges the old id's media and points the entry at
    /// the new id's filenames. With the same id, stored filenames stay unless
    /// a new file is uploaded.
    pub async fn update(
        &self,
        full_name: &str,
        form: PersonForm,
        uploads: MediaUploads,
    ) -> Result<RosterEntry, RosterError> {
        let file_id = form.normalized_file_id()?;

        let mut txn = self.store.begin().await?;
        let existing = txn
            .roster()
            .get(full_name)
            .cloned()
            .ok_or_else(|| RosterError::NotFound(full_name.to_string()))?;

        let mut entry = RosterEntry {
            short: form.short_name,
            file_id: file_id.clone(),
            goal_name: form.goal_name,
            photo: existing.photo.clone(),
            icon: existing.icon.clone(),
            video: existing.video.clone(),
            owner_id: form.owner_id,
        };

        let id_changed = !existing.file_id.is_empty() && existing.file_id != file_id;

        let mut saved = Vec::new();
        for kind in MediaKind::ALL {
            if let Some(upload) = uploads.get(kind) {
                let stored = match self.media.save(kind, &file_id, &upload.bytes).await {
                    Ok(stored) => stored,
                    Err(e) => {
                        self.discard_saved(&saved, &file_id, id_changed).await;
                        return Err(e);
                    }
                };
                debug!("Stored {} as {}", upload.file_name, stored);
                saved.push(kind);
                set_media_name(&mut entry, kind, stored);
            } else if id_changed || media_name(&entry, kind).is_empty() {
                set_media_name(&mut entry, kind, kind.file_name(&file_id));
            }
        }

        txn.roster_mut().insert(full_name.to_string(), entry.clone());
        if let Err(e) = txn.commit().await {
            self.discard_saved(&saved, &file_id, id_changed).await;
            return Err(e);
        }

        // old media go only once the entry no longer points at them
        if id_changed {
            let removed = self.media.purge(&existing.file_id).await;
            info!(
                "File id of {} changed {} -> {}, removed {} old media file(s)",
                full_name, existing.file_id, file_id, removed
            );
        }

        info!("Updated roster entry {}", full_name);
        Ok(entry)
    }

    /// Undo uploads written under a new file id for an update that failed.
    /// Files overwritten under an unchanged id cannot be restored.
    async fn discard_saved(&self, saved: &[MediaKind], file_id: &str, id_changed: bool) {
        if !id_changed {
            return;
        }
        for kind in saved {
            self.media.remove(*kind, file_id).await;
        }
    }

    /// Remove a person and their media; unknown names are ignored.
    pub async fn delete(&self, full_name: &str) -> Result<bool, RosterError> {
        let mut txn = self.store.begin().await?;
        let Some(entry) = txn.roster_mut().shift_remove(full_name) else {
            return Ok(false);
        };

        txn.commit().await?;
        let removed = self.media.purge(&entry.file_id).await;

        info!("Removed {} from the roster ({} media files)", full_name, removed);
        Ok(true)
    }
}

fn media_name(entry: &RosterEntry, kind: MediaKind) -> &str {
    match kind {
        MediaKind::Photo => &entry.photo,
        MediaKind::Icon => &entry.icon,
        MediaKind::Video => &entry.video,
    }
}

fn set_media_name(entry: &mut RosterEntry, kind: MediaKind, name: String) {
    match kind {
        MediaKind::Photo => entry.photo = name,
        MediaKind::Icon => entry.icon = name,
        MediaKind::Video => entry.video = name,
    }
}
