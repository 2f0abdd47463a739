use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    middleware::subscription::ActiveSubscription,
    models::{
        auth::AuthenticatedUser,
        family::{InviteRelativeRequest, JoinFamilyRequest},
    },
    services::{families::FamilyService, metrics},
    AppState,
};

fn internal_error(e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}

/// GET /family — the shared dashboard: family, members and child profiles.
pub async fn get_dashboard(
    State(state): State<AppState>,
    subscription: ActiveSubscription,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let family = FamilyService::get(&state.db, subscription.family_id)
        .await
        .map_err(internal_error)?
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Famille introuvable" })),
        ))?;

    let members = FamilyService::list_members(&state.db, subscription.family_id)
        .await
        .map_err(internal_error)?;

    let children = FamilyService::list_children(&state.db, subscription.family_id)
        .await
        .map_err(internal_error)?;

    Ok(Json(json!({
        "family": family,
        "members": members,
        "children": children,
        "subscription_status": subscription.status,
    })))
}

/// POST /family/invite — invite a relative to the shared dashboard.
pub async fn invite_relative(
    State(state): State<AppState>,
    subscription: ActiveSubscription,
    user: AuthenticatedUser,
    Json(body): Json<InviteRelativeRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Adresse email invalide" })),
        ));
    }

    FamilyService::create_invitation(
        &state.db,
        state.email.as_deref(),
        subscription.family_id,
        user.user_id,
        &email,
        body.relationship.as_deref().unwrap_or("parent"),
        &state.config.app_base_url,
    )
    .await
    .map_err(internal_error)?;

    metrics::INVITATIONS_COUNTER.inc();

    Ok(Json(json!({ "message": "Invitation envoyée" })))
}

/// GET /family/invitations — pending invitations.
pub async fn list_invitations(
    State(state): State<AppState>,
    subscription: ActiveSubscription,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    FamilyService::list_pending_invitations(&state.db, subscription.family_id)
        .await
        .map(|invitations| Json(serde_json::to_value(invitations).unwrap()))
        .map_err(internal_error)
}

/// DELETE /family/invitations/{id}
pub async fn delete_invitation(
    State(state): State<AppState>,
    subscription: ActiveSubscription,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let deleted = FamilyService::delete_invitation(&state.db, subscription.family_id, id)
        .await
        .map_err(internal_error)?;

    if deleted {
        Ok(Json(json!({ "message": "Invitation annulée" })))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Invitation introuvable" })),
        ))
    }
}

/// POST /family/join — accept an invitation token. Only authentication is
/// required: the subscription that admits the new member is the family's.
pub async fn join_family(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<JoinFamilyRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    FamilyService::accept_invitation(&state.db, user.user_id, &body.token)
        .await
        .map(|family| Json(json!({ "message": "Bienvenue dans la famille", "family": family })))
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))))
}
