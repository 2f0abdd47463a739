use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::auth::AuthenticatedUser;
use crate::services::families::FamilyService;
use crate::AppState;

/// Admits the request only when the user's family holds a live subscription
/// (trialing or active, within its period). The family id is resolved — and
/// backfilled if missing — on the way.
#[derive(Debug, Clone)]
pub struct ActiveSubscription {
    pub family_id: Uuid,
    pub status: String,
}

impl FromRequestParts<AppState> for ActiveSubscription {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state)
            .await
            .map_err(|(status, msg)| (status, Json(json!({ "error": msg }))))?;

        let family_id =
            FamilyService::resolve_family_id(&state.db, user.user_id, state.config.trial_days)
                .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Database error" })),
                )
            })?;

        let row: Option<(String, Option<chrono::DateTime<Utc>>)> = sqlx::query_as(
            "SELECT status, current_period_end FROM subscriptions WHERE family_id = $1",
        )
        .bind(family_id)
        .fetch_optional(&state.db)
        .await
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Database error" })),
            )
        })?;

        match row {
            Some((status, period_end))
                if matches!(status.as_str(), "trialing" | "active")
                    && period_end.map(|end| end > Utc::now()).unwrap_or(true) =>
            {
                Ok(ActiveSubscription { family_id, status })
            }
            _ => Err((
                StatusCode::PAYMENT_REQUIRED,
                Json(json!({
                    "error": "Votre abonnement n'est plus actif. Rendez-vous dans votre espace abonnement.",
                    "code": "subscription_required"
                })),
            )),
        }
    }
}
