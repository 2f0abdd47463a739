use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::{models::auth::AuthenticatedUser, AppState};

/// GET /settings — the caller's durable UI preferences as a key/value map.
pub async fn get_settings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let rows: Vec<(String, Value)> =
        sqlx::query_as("SELECT key, value FROM user_settings WHERE user_id = $1")
            .bind(user.user_id)
            .fetch_all(&state.db)
            .await
            .map_err(|e| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": e.to_string() })),
                )
            })?;

    let mut settings = Map::new();
    for (key, value) in rows {
        settings.insert(key, value);
    }
    Ok(Json(Value::Object(settings)))
}

#[derive(Deserialize)]
pub struct UpdateSettingRequest {
    pub key: String,
    pub value: Value,
}

fn is_valid_setting_key(s: &str) -> bool {
    let len = s.len();
    len >= 1
        && len <= 64
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// PUT /settings — upsert one preference.
pub async fn update_setting(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdateSettingRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if !is_valid_setting_key(&body.key) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Clé invalide — minuscules, chiffres, '-' et '_' uniquement" })),
        ));
    }

    sqlx::query(
        "INSERT INTO user_settings (user_id, key, value)
         VALUES ($1, $2, $3)
         ON CONFLICT (user_id, key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
    )
    .bind(user.user_id)
    .bind(&body.key)
    .bind(&body.value)
    .execute(&state.db)
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    let mut updated = Map::new();
    updated.insert(body.key, body.value);
    Ok(Json(Value::Object(updated)))
}
