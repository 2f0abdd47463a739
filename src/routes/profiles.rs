use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    middleware::subscription::ActiveSubscription,
    services::{profiles::ProfileService, summary},
    AppState,
};

/// GET /profiles — every child profile of the caller's family.
pub async fn list_profiles(
    State(state): State<AppState>,
    subscription: ActiveSubscription,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    ProfileService::list_for_family(&state.db, subscription.family_id)
        .await
        .map(|records| Json(serde_json::to_value(records).unwrap()))
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })
}

/// GET /profiles/{id}
pub async fn get_profile(
    State(state): State<AppState>,
    subscription: ActiveSubscription,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let record = ProfileService::get(&state.db, id, subscription.family_id)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })?;

    match record {
        Some(record) => Ok(Json(serde_json::to_value(record).unwrap())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Profil introuvable" })),
        )),
    }
}

/// GET /profiles/{id}/summary — read-only projection of the stored profile.
/// A malformed sub-record degrades its own section, never the response.
pub async fn get_profile_summary(
    State(state): State<AppState>,
    subscription: ActiveSubscription,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let record = ProfileService::get(&state.db, id, subscription.family_id)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })?;

    match record {
        Some(record) => {
            let summary = summary::assemble_document(&record.profile);
            Ok(Json(serde_json::to_value(summary).unwrap()))
        }
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Profil introuvable" })),
        )),
    }
}

/// DELETE /profiles/{id}
pub async fn delete_profile(
    State(state): State<AppState>,
    subscription: ActiveSubscription,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let deleted = ProfileService::delete(&state.db, id, subscription.family_id)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })?;

    if deleted {
        Ok(Json(json!({ "message": "Profil supprimé" })))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Profil introuvable" })),
        ))
    }
}
