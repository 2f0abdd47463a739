use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use redis::Client as RedisClient;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fabulette_api::config::Config;
use fabulette_api::middleware::auth::JwtSecret;
use fabulette_api::services::email::EmailService;
use fabulette_api::services::metrics;
use fabulette_api::{db, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let config = Arc::new(config);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let redis_client = RedisClient::open(config.redis_url.as_str())?;
    let redis_conn = redis_client.get_multiplexed_async_connection().await?;
    info!("Redis connected");

    let email = EmailService::new(&config).map(Arc::new);
    if email.is_some() {
        info!("SMTP email service configured");
    } else {
        info!("SMTP not configured — email features disabled");
    }

    metrics::start(pool.clone());

    let state = AppState {
        db: pool,
        redis: redis_conn,
        config: config.clone(),
        email,
    };

    // Build CORS: allow the app base URL exactly; localhost is always allowed
    // for local development.
    let base_url = config.app_base_url.clone();
    let cors_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let o = match origin.to_str() {
            Ok(s) => s,
            Err(_) => return false,
        };
        if o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") {
            return true;
        }
        o == base_url
    });

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(cors_origin);

    let jwt_secret = JwtSecret(config.jwt_secret.clone());

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        .route("/catalogs", get(routes::catalogs::get_catalogs))
        // Auth
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh_token))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/me", get(routes::auth::me))
        .route("/auth/forgot-password", post(routes::auth::forgot_password))
        .route("/auth/reset-password", post(routes::auth::reset_password))
        // Child profiles
        .route("/profiles", get(routes::profiles::list_profiles))
        .route("/profiles/{id}", get(routes::profiles::get_profile).delete(routes::profiles::delete_profile))
        .route("/profiles/{id}/summary", get(routes::profiles::get_profile_summary))
        // Profile wizard
        .route("/wizard", post(routes::wizard::start_wizard))
        .route("/wizard/{draft_id}", get(routes::wizard::get_wizard))
        .route("/wizard/{draft_id}/next", post(routes::wizard::next_step))
        .route("/wizard/{draft_id}/previous", post(routes::wizard::previous_step))
        .route("/wizard/{draft_id}/goto", post(routes::wizard::go_to_step))
        .route("/wizard/{draft_id}/fields", put(routes::wizard::update_field))
        .route("/wizard/{draft_id}/summary", get(routes::wizard::wizard_summary))
        .route("/wizard/{draft_id}/submit", post(routes::wizard::submit_wizard))
        // Family dashboard
        .route("/family", get(routes::family::get_dashboard))
        .route("/family/invite", post(routes::family::invite_relative))
        .route("/family/invitations", get(routes::family::list_invitations))
        .route("/family/invitations/{id}", delete(routes::family::delete_invitation))
        .route("/family/join", post(routes::family::join_family))
        // User settings
        .route("/settings", get(routes::settings::get_settings).put(routes::settings::update_setting))
        // Subscription
        .route("/subscription", get(routes::subscription::get_subscription))
        .route("/subscription/portal", post(routes::subscription::portal_session))
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("fabulette API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
