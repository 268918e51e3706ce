//! Note handlers

use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use note_core::{CreateNoteRequest, Note};
use tracing::{debug, info, info_span};

pub async fn redirect_to_notes() -> Redirect {
    let span = info_span!("redirect_to_notes", redirect = "redirect_to_notes called");
    span.in_scope(|| {
        info!("Redirecting to /notes");
        let response = Redirect::temporary("/notes");
        debug!("Redirect response prepared");
        response
    })
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state.note_service.list_notes().await?;
    Ok(Json(notes))
}

pub async fn get(
    State(state): State<AppState>,
    Path(note_id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    let note = state.note_service.get_note(&note_id).await?;
    Ok(Json(note))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<String, ApiError> {
    let Json(request) = payload?;
    let id = state.note_service.create_note(&request).await?;
    Ok(id)
}

pub async fn update(
    State(state): State<AppState>,
    Path(note_id): Path<String>,
    payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = payload?;
    state.note_service.update_note(&note_id, &request).await?;
    Ok(StatusCode::NO_CONTENT)
}
