use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{
    models::{auth::AuthenticatedUser, family::Subscription},
    services::families::FamilyService,
    AppState,
};

/// GET /subscription — current status. Auth only: a lapsed subscriber must
/// still be able to see why they are locked out.
pub async fn get_subscription(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let family_id =
        FamilyService::resolve_family_id(&state.db, user.user_id, state.config.trial_days)
            .await
            .map_err(|e| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": e.to_string() })),
                )
            })?;

    let subscription: Option<Subscription> =
        sqlx::query_as("SELECT * FROM subscriptions WHERE family_id = $1")
            .bind(family_id)
            .fetch_optional(&state.db)
            .await
            .map_err(|e| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": e.to_string() })),
                )
            })?;

    match subscription {
        Some(subscription) => Ok(Json(serde_json::to_value(subscription).unwrap())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Aucun abonnement trouvé" })),
        )),
    }
}

/// POST /subscription/portal — hand back the external billing portal URL.
/// Payment handling is entirely the portal's concern. Auth only: a canceled
/// subscriber uses this very route to reactivate.
pub async fn portal_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let family_id =
        FamilyService::resolve_family_id(&state.db, user.user_id, state.config.trial_days)
            .await
            .map_err(|e| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": e.to_string() })),
                )
            })?;

    let url = format!(
        "{}/session?family={}",
        state.config.billing_portal_url, family_id
    );
    Ok(Json(json!({ "url": url })))
}
