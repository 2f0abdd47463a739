use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    pub jwt_expiry_seconds: u64,
    pub jwt_refresh_expiry_days: u64,
    pub host: String,
    pub port: u16,
    pub app_base_url: String,
    /// TTL of an in-progress wizard draft in Redis. Abandoned flows simply expire.
    pub draft_ttl_seconds: u64,
    /// External billing portal base URL — payment handling lives there, not here.
    pub billing_portal_url: String,
    pub trial_days: u64,
    // SMTP (optional)
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            jwt_secret: required("JWT_SECRET")?,
            jwt_refresh_secret: required("JWT_REFRESH_SECRET")?,
            jwt_expiry_seconds: env::var("JWT_EXPIRY_SECONDS")
                .unwrap_or_else(|_| "900".into())
                .parse()?,
            jwt_refresh_expiry_days: env::var("JWT_REFRESH_EXPIRY_DAYS")
                .unwrap_or_else(|_| "30".into())
                .parse()?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost".into()),
            draft_ttl_seconds: env::var("DRAFT_TTL_SECONDS")
                .unwrap_or_else(|_| "86400".into())
                .parse()?,
            billing_portal_url: env::var("BILLING_PORTAL_URL")
                .unwrap_or_else(|_| "https://billing.fabulette.app".into()),
            trial_days: env::var("TRIAL_DAYS")
                .unwrap_or_else(|_| "14".into())
                .parse()?,
            smtp_host: env::var("SMTP_HOST").ok().filter(|s| !s.is_empty()),
            smtp_port: env::var("SMTP_PORT").ok().and_then(|v| v.parse().ok()),
            smtp_username: env::var("SMTP_USERNAME").ok().filter(|s| !s.is_empty()),
            smtp_password: env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty()),
            smtp_from: env::var("SMTP_FROM").ok().filter(|s| !s.is_empty()),
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
