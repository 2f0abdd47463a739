use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::{
    catalogs::step_props,
    middleware::subscription::ActiveSubscription,
    models::{
        auth::AuthenticatedUser,
        profile::ChildProfile,
        wizard::{
            visible_index, visible_step_count, FieldUpdate, WizardError, WizardMode, WizardState,
        },
    },
    services::{drafts::DraftStore, metrics, profiles::ProfileService, summary},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct StartWizardRequest {
    pub mode: WizardMode,
    /// Required in edit mode: the persisted profile to pre-populate from.
    pub child_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct GoToStepRequest {
    pub step: usize,
}

/// The payload every wizard endpoint answers with: raw and visible indices,
/// the step to render (or nothing, never an error, for an index the mode
/// disables) and that step's catalog props.
fn state_payload(draft_id: Uuid, state: &WizardState) -> Value {
    let step = state.current_step();
    json!({
        "draft_id": draft_id,
        "mode": state.mode,
        "step_index": state.step,
        "visible_index": visible_index(state.step, state.mode),
        "visible_step_count": visible_step_count(state.mode),
        "step": step,
        "step_title": step.map(|s| s.title()),
        "props": step.map(step_props),
        "profile": state.profile,
    })
}

fn internal_error(e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}

fn draft_not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Brouillon introuvable ou expiré" })),
    )
}

async fn load_draft(
    state: &AppState,
    user_id: Uuid,
    draft_id: Uuid,
) -> Result<WizardState, (StatusCode, Json<Value>)> {
    let mut redis = state.redis.clone();
    DraftStore::get(&mut redis, user_id, draft_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(draft_not_found)
}

async fn save_draft(
    state: &AppState,
    user_id: Uuid,
    draft_id: Uuid,
    wizard: &WizardState,
) -> Result<(), (StatusCode, Json<Value>)> {
    let mut redis = state.redis.clone();
    DraftStore::put(
        &mut redis,
        user_id,
        draft_id,
        wizard,
        state.config.draft_ttl_seconds,
    )
    .await
    .map_err(internal_error)
}

/// POST /wizard — start a flow. Full mode starts empty; edit mode loads the
/// persisted record and skips the family/pets steps.
pub async fn start_wizard(
    State(state): State<AppState>,
    subscription: ActiveSubscription,
    user: AuthenticatedUser,
    Json(body): Json<StartWizardRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let wizard = match body.mode {
        WizardMode::Full => WizardState::new(WizardMode::Full),
        WizardMode::Edit => {
            let child_id = body.child_id.ok_or((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "child_id est requis en mode édition" })),
            ))?;
            let record = ProfileService::get(&state.db, child_id, subscription.family_id)
                .await
                .map_err(internal_error)?
                .ok_or((
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Profil introuvable" })),
                ))?;
            let profile: ChildProfile = serde_json::from_value(record.profile.clone())
                .unwrap_or_else(|error| {
                    warn!(child_id = %child_id, %error, "profil stocké illisible, édition depuis un profil vide");
                    ChildProfile::default()
                });
            WizardState::for_edit(child_id, profile)
        }
    };

    let draft_id = Uuid::new_v4();
    save_draft(&state, user.user_id, draft_id, &wizard).await?;

    Ok((
        StatusCode::CREATED,
        Json(state_payload(draft_id, &wizard)),
    ))
}

/// GET /wizard/{draft_id}
pub async fn get_wizard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(draft_id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let wizard = load_draft(&state, user.user_id, draft_id).await?;
    Ok(Json(state_payload(draft_id, &wizard)))
}

/// POST /wizard/{draft_id}/next
pub async fn next_step(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(draft_id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut wizard = load_draft(&state, user.user_id, draft_id).await?;
    wizard.go_next();
    save_draft(&state, user.user_id, draft_id, &wizard).await?;
    Ok(Json(state_payload(draft_id, &wizard)))
}

/// POST /wizard/{draft_id}/previous
pub async fn previous_step(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(draft_id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut wizard = load_draft(&state, user.user_id, draft_id).await?;
    wizard.go_previous();
    save_draft(&state, user.user_id, draft_id, &wizard).await?;
    Ok(Json(state_payload(draft_id, &wizard)))
}

/// POST /wizard/{draft_id}/goto — clamped; a step the mode disables is a
/// no-op and the unchanged state is returned.
pub async fn go_to_step(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(draft_id): Path<Uuid>,
    Json(body): Json<GoToStepRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut wizard = load_draft(&state, user.user_id, draft_id).await?;
    wizard.go_to_step(body.step);
    save_draft(&state, user.user_id, draft_id, &wizard).await?;
    Ok(Json(state_payload(draft_id, &wizard)))
}

/// PUT /wizard/{draft_id}/fields — apply one field setter.
pub async fn update_field(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(draft_id): Path<Uuid>,
    Json(update): Json<FieldUpdate>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut wizard = load_draft(&state, user.user_id, draft_id).await?;

    if let Err(e) = wizard.apply(update) {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": e.to_string() })),
        ));
    }

    save_draft(&state, user.user_id, draft_id, &wizard).await?;
    Ok(Json(state_payload(draft_id, &wizard)))
}

/// GET /wizard/{draft_id}/summary — the read-only projection of the draft.
pub async fn wizard_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(draft_id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let wizard = load_draft(&state, user.user_id, draft_id).await?;
    let summary = summary::assemble(&wizard.profile);
    Ok(Json(serde_json::to_value(summary).unwrap()))
}

/// POST /wizard/{draft_id}/submit — validate, persist, delete the draft.
/// On persistence failure the draft is preserved unchanged for retry.
pub async fn submit_wizard(
    State(state): State<AppState>,
    subscription: ActiveSubscription,
    user: AuthenticatedUser,
    Path(draft_id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let wizard = load_draft(&state, user.user_id, draft_id).await?;

    if let Err(error) = wizard.validate_for_submit() {
        let gaps = match &error {
            WizardError::Incomplete { gaps } => gaps.clone(),
            _ => Vec::new(),
        };
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": error.to_string(),
                "gaps": gaps.iter().map(|g| json!({
                    "gap": g,
                    "message": g.to_string(),
                })).collect::<Vec<_>>(),
            })),
        ));
    }

    let mode_label = match wizard.mode {
        WizardMode::Full => "full",
        WizardMode::Edit => "edit",
    };

    let persisted = match wizard.child_id {
        Some(child_id) => {
            ProfileService::update(&state.db, child_id, subscription.family_id, &wizard.profile)
                .await
        }
        None => {
            ProfileService::create(
                &state.db,
                subscription.family_id,
                user.user_id,
                &wizard.profile,
            )
            .await
        }
    };

    let record = match persisted {
        Ok(record) => record,
        Err(e) => {
            metrics::PROFILE_SUBMISSIONS_COUNTER
                .with_label_values(&[mode_label, "failure"])
                .inc();
            // Le brouillon est conservé : l'utilisateur peut réessayer.
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "L'enregistrement a échoué. Vos réponses sont conservées, veuillez réessayer.",
                    "detail": e.to_string(),
                })),
            ));
        }
    };

    let mut redis = state.redis.clone();
    if let Err(error) = DraftStore::delete(&mut redis, user.user_id, draft_id).await {
        warn!(%draft_id, %error, "suppression du brouillon impossible après soumission");
    }

    metrics::PROFILE_SUBMISSIONS_COUNTER
        .with_label_values(&[mode_label, "success"])
        .inc();

    Ok(Json(serde_json::to_value(record).unwrap()))
}
