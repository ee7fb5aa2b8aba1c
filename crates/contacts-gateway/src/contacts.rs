use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use contacts_common::{Contact, ContactChanges, NewContact};
use tracing::info;

use crate::error::ApiError;
use crate::state::SharedState;

pub async fn create_contact(
    State(state): State<SharedState>,
    payload: Result<Json<NewContact>, JsonRejection>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    let Json(new) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    new.validate()?;

    let contact = state.contacts.create(new)?;
    info!("contact created: id={}", contact.id);
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn list_contacts(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    Ok(Json(state.contacts.list()?))
}

pub async fn get_contact(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Contact>, ApiError> {
    Ok(Json(state.contacts.get(&id)?))
}

pub async fn update_contact(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<ContactChanges>, JsonRejection>,
) -> Result<Json<Contact>, ApiError> {
    let Json(changes) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    changes.validate()?;

    let contact = state.contacts.update(&id, changes)?;
    info!("contact updated: id={}", contact.id);
    Ok(Json(contact))
}

pub async fn delete_contact(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.contacts.delete(&id)?;
    info!("contact deleted: id={}", id);
    Ok(StatusCode::NO_CONTENT)
}
