use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};

use crate::{
    middleware::rate_limit::check_rate_limit,
    models::{
        auth::AuthenticatedUser,
        user::{
            ForgotPasswordRequest, LoginRequest, RefreshTokenRequest, RegisterRequest,
            ResetPasswordRequest, User, UserProfile,
        },
    },
    services::{auth::AuthService, families::FamilyService, metrics},
    AppState,
};

/// Extracts the real client IP from proxy-forwarded headers.
/// Priority: X-Real-IP → first X-Forwarded-For.
fn real_ip(headers: &HeaderMap) -> String {
    if let Some(ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        return ip.to_string();
    }
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = xff.split(',').next() {
            return first.trim().to_string();
        }
    }
    "unknown".to_string()
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    // Rate limit: 5 registrations per hour per IP
    {
        let ip = real_ip(&headers);
        let key = format!("rate:register:ip:{ip}");
        let mut redis = state.redis.clone();
        check_rate_limit(&mut redis, &key, 5, 3600).await?;
    }

    let user = AuthService::register(&state.db, &body)
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))))?;

    // Opens the family and its trial subscription.
    FamilyService::resolve_family_id(&state.db, user.id, state.config.trial_days)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })?;

    if let Some(email_svc) = &state.email {
        // Ignore send errors — graceful degradation
        let _ = email_svc.send_welcome(&user.email, &user.first_name).await;
    }

    // Re-read so the response carries the backfilled family_id.
    let user: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_one(&state.db)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })?;

    let response = AuthService::issue_pair(
        &state.db,
        user,
        &state.config.jwt_secret,
        &state.config.jwt_refresh_secret,
        state.config.jwt_expiry_seconds,
        state.config.jwt_refresh_expiry_days,
    )
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    metrics::SIGNUPS_COUNTER.inc();

    Ok((
        StatusCode::CREATED,
        Json(serde_json::to_value(response).unwrap()),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    // Rate limit: 10 attempts per 15 minutes per email+IP
    {
        let ip = real_ip(&headers);
        let email = body.email.trim().to_lowercase();
        let key = format!("rate:login:{email}:{ip}");
        let mut redis = state.redis.clone();
        check_rate_limit(&mut redis, &key, 10, 900).await?;
    }

    match AuthService::login(
        &state.db,
        &body.email,
        &body.password,
        &state.config.jwt_secret,
        &state.config.jwt_refresh_secret,
        state.config.jwt_expiry_seconds,
        state.config.jwt_refresh_expiry_days,
    )
    .await
    {
        Ok(response) => {
            metrics::LOGINS_COUNTER.with_label_values(&["success"]).inc();
            Ok(Json(serde_json::to_value(response).unwrap()))
        }
        Err(e) => {
            metrics::LOGINS_COUNTER.with_label_values(&["failure"]).inc();
            Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

/// POST /auth/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    AuthService::refresh(
        &state.db,
        &body.refresh_token,
        &state.config.jwt_secret,
        &state.config.jwt_refresh_secret,
        state.config.jwt_expiry_seconds,
        state.config.jwt_refresh_expiry_days,
    )
    .await
    .map(|response| Json(serde_json::to_value(response).unwrap()))
    .map_err(|e| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": e.to_string() })),
        )
    })
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    AuthService::logout(&state.db, &body.refresh_token, &state.config.jwt_refresh_secret)
        .await
        .map(|_| Json(json!({ "message": "Déconnexion réussie" })))
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let record: Option<User> =
        sqlx::query_as("SELECT * FROM users WHERE id = $1 AND is_active = TRUE")
            .bind(user.user_id)
            .fetch_optional(&state.db)
            .await
            .map_err(|e| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": e.to_string() })),
                )
            })?;

    match record {
        Some(u) => Ok(Json(
            serde_json::to_value(UserProfile::from(u)).unwrap(),
        )),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Utilisateur non trouvé" })),
        )),
    }
}

/// POST /auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    // Rate limit: 5 per hour per email
    {
        let email = body.email.trim().to_lowercase();
        let key = format!("rate:forgot-password:{email}");
        let mut redis = state.redis.clone();
        check_rate_limit(&mut redis, &key, 5, 3600).await?;
    }

    AuthService::request_password_reset(
        &state.db,
        state.email.as_deref(),
        &body.email,
        &state.config.app_base_url,
    )
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    metrics::PASSWORD_RESETS_COUNTER.inc();

    // Same response whether or not the account exists.
    Ok(Json(json!({
        "message": "Si un compte existe avec cet email, un lien de réinitialisation a été envoyé."
    })))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    AuthService::reset_password(&state.db, &body.token, &body.new_password)
        .await
        .map(|_| Json(json!({ "message": "Mot de passe réinitialisé" })))
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))))
}
