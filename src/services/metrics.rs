use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_gauge_vec, Counter,
    CounterVec, Gauge, GaugeVec,
};
use sqlx::PgPool;
use tracing::warn;

lazy_static! {
    // ── Event counters (increment on each event) ────────────────────────────
    pub static ref SIGNUPS_COUNTER: Counter = register_counter!(
        "api_signups_total",
        "Comptes créés"
    ).unwrap();

    pub static ref LOGINS_COUNTER: CounterVec = register_counter_vec!(
        "api_logins_total",
        "Tentatives de login par statut",
        &["status"]
    ).unwrap();

    pub static ref PROFILE_SUBMISSIONS_COUNTER: CounterVec = register_counter_vec!(
        "api_profile_submissions_total",
        "Profils enfant soumis par mode et statut",
        &["mode", "status"]
    ).unwrap();

    pub static ref INVITATIONS_COUNTER: Counter = register_counter!(
        "api_family_invitations_total",
        "Invitations famille envoyées"
    ).unwrap();

    pub static ref PASSWORD_RESETS_COUNTER: Counter = register_counter!(
        "api_password_resets_total",
        "Demandes de réinitialisation de mot de passe"
    ).unwrap();

    // ── Business metrics ────────────────────────────────────────────────────
    pub static ref USERS_GAUGE: Gauge = register_gauge!(
        "fabulette_users_active_total",
        "Utilisateurs actifs"
    ).unwrap();

    pub static ref FAMILIES_GAUGE: Gauge = register_gauge!(
        "fabulette_families_total",
        "Familles"
    ).unwrap();

    pub static ref PROFILES_GAUGE: Gauge = register_gauge!(
        "fabulette_child_profiles_total",
        "Profils enfant enregistrés"
    ).unwrap();

    pub static ref SUBSCRIPTIONS_GAUGE: GaugeVec = register_gauge_vec!(
        "fabulette_subscriptions_total",
        "Abonnements par statut",
        &["status"]
    ).unwrap();
}

/// Spawn the background metrics collector (refreshes every 5 minutes).
pub fn start(pool: PgPool) {
    tokio::spawn(async move {
        // Initial collection on startup
        if let Err(e) = collect(&pool).await {
            warn!("Metrics: initial collection failed: {}", e);
        }
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
            if let Err(e) = collect(&pool).await {
                warn!("Metrics: collection failed: {}", e);
            }
        }
    });
}

async fn collect(pool: &PgPool) -> anyhow::Result<()> {
    let users: i64 =
        sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM users WHERE is_active = TRUE")
            .fetch_one(pool)
            .await
            .unwrap_or(0);
    USERS_GAUGE.set(users as f64);

    let families: i64 = sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM families")
        .fetch_one(pool)
        .await
        .unwrap_or(0);
    FAMILIES_GAUGE.set(families as f64);

    let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM children")
        .fetch_one(pool)
        .await
        .unwrap_or(0);
    PROFILES_GAUGE.set(profiles as f64);

    let subscription_counts: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*)::BIGINT FROM subscriptions GROUP BY status",
    )
    .fetch_all(pool)
    .await
    .unwrap_or_default();

    for (status, count) in subscription_counts {
        SUBSCRIPTIONS_GAUGE
            .with_label_values(&[&status])
            .set(count as f64);
    }

    Ok(())
}
