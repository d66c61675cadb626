use axum::{
    extract::{Multipart, Path, State},
    response::Redirect,
    Json,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::crm::OwnerSummary;
use crate::roster::{MediaKind, Roster};
use crate::services::{MediaUploads, PersonForm, RosterService, SubmitOutcome, Upload};
use crate::state::AppState;
use crate::utils::error::ApiError;

const MANAGE_PATH: &str = "/manage";

#[derive(Debug, Serialize)]
pub struct ManageView {
    pub people: Roster,
    pub crm_owners: Vec<OwnerSummary>,
    pub goal_names: Vec<String>,
}

/// Text fields and file parts of an admin form post.
#[derive(Debug, Default)]
struct AdminForm {
    fields: HashMap<String, String>,
    uploads: MediaUploads,
}

impl AdminForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = AdminForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))?
        {
            let field_name = field.name().unwrap_or("").to_string();

            match media_kind(&field_name) {
                Some(kind) => {
                    let file_name = field.file_name().unwrap_or("").to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                    // browsers send an empty part when no file was picked
                    if !file_name.is_empty() {
                        form.uploads.set(
                            kind,
                            Upload {
                                file_name,
                                bytes: bytes.to_vec(),
                            },
                        );
                    }
                }
                None => {
                    let text = field.text().await.map_err(|e| {
                        ApiError::BadRequest(format!("Invalid {}: {}", field_name, e))
                    })?;
                    form.fields.insert(field_name, text);
                }
            }
        }

        Ok(form)
    }

    fn required(&self, key: &str) -> Result<String, ApiError> {
        self.fields
            .get(key)
            .map(|value| value.trim().to_string())
            .ok_or_else(|| ApiError::BadRequest(format!("{} required", key)))
    }

    fn optional(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn person(&self) -> Result<PersonForm, ApiError> {
        Ok(PersonForm {
            short_name: self.required("short_name")?,
            file_id: self.required("file_id")?,
            goal_name: self.required("goal_name")?,
            owner_id: self.optional("owner_id"),
        })
    }
}

fn media_kind(field_name: &str) -> Option<MediaKind> {
    match field_name {
        "photo" => Some(MediaKind::Photo),
        "icon" => Some(MediaKind::Icon),
        "video" => Some(MediaKind::Video),
        _ => None,
    }
}

/// GET /manage - roster plus the CRM owners and goal names to pick from.
pub async fn manage_view_handler(State(state): State<AppState>) -> Result<Json<ManageView>, ApiError> {
    let people = state.roster_service.people().await?;
    let goal_names = state.goal_service.goal_names().await;
    let crm_owners = state.owners.owners().await;

    Ok(Json(ManageView {
        people,
        crm_owners,
        goal_names,
    }))
}

/// POST /manage - add a person, or edit one when `is_update` is set.
pub async fn manage_submit_handler(
    State(roster_service): State<Arc<RosterService>>,
    multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let form = AdminForm::read(multipart).await?;
    let full_name = form.required("full_name")?;
    let person = form.person()?;
    let is_update = form.optional("is_update").is_some();

    let outcome = roster_service
        .submit(&full_name, person, form.uploads, is_update)
        .await?;
    match outcome {
        SubmitOutcome::Created => info!("Roster entry created: {}", full_name),
        SubmitOutcome::Updated => info!("Roster entry updated: {}", full_name),
    }

    Ok(Redirect::to(MANAGE_PATH))
}

/// POST /update/{name}
pub async fn update_person_handler(
    State(roster_service): State<Arc<RosterService>>,
    Path(name): Path<String>,
    multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let form = AdminForm::read(multipart).await?;
    let person = form.person()?;

    roster_service.update(&name, person, form.uploads).await?;
    Ok(Redirect::to(MANAGE_PATH))
}

/// GET /delete/{name}
pub async fn delete_person_handler(
    State(roster_service): State<Arc<RosterService>>,
    Path(name): Path<String>,
) -> Result<Redirect, ApiError> {
    if !roster_service.delete(&name).await? {
        info!("Delete requested for unknown person {}", name);
    }
    Ok(Redirect::to(MANAGE_PATH))
}

/// GET /people - the raw roster document.
pub async fn people_handler(
    State(roster_service): State<Arc<RosterService>>,
) -> Result<Json<Roster>, ApiError> {
    Ok(Json(roster_service.people().await?))
}
