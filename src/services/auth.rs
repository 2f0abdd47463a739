use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::{
        auth::{Claims, RefreshClaims},
        user::{LoginResponse, RefreshToken, RegisterRequest, User},
    },
    services::email::EmailService,
};

fn build_reset_url(base_url: &str, token: &str) -> String {
    format!("{base_url}/fr/reinitialiser?token={token}")
}

pub struct AuthService;

impl AuthService {
    /// Create an account. The caller resolves the family afterwards (which
    /// opens the trial subscription) and issues the first token pair.
    pub async fn register(pool: &PgPool, req: &RegisterRequest) -> anyhow::Result<User> {
        let email = req.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            anyhow::bail!("Adresse email invalide");
        }
        if req.password.len() < 8 {
            anyhow::bail!("Le mot de passe doit contenir au moins 8 caractères");
        }
        if req.first_name.trim().is_empty() {
            anyhow::bail!("Le prénom est requis");
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&email)
                .fetch_one(pool)
                .await?;
        if exists {
            anyhow::bail!("Un compte existe déjà avec cet email");
        }

        let password_hash = bcrypt::hash(&req.password, 12)?;

        let user: User = sqlx::query_as(
            "INSERT INTO users (email, password_hash, first_name, last_name, preferred_locale)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(&email)
        .bind(password_hash)
        .bind(req.first_name.trim())
        .bind(req.last_name.as_deref().unwrap_or("").trim())
        .bind(req.preferred_locale.as_deref().unwrap_or("fr"))
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Validate credentials and issue a JWT pair.
    pub async fn login(
        pool: &PgPool,
        email: &str,
        password: &str,
        jwt_secret: &str,
        refresh_secret: &str,
        access_ttl: u64,
        refresh_ttl_days: u64,
    ) -> anyhow::Result<LoginResponse> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE email = $1 AND is_active = TRUE",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Identifiants invalides"))?;

        let valid = bcrypt::verify(password, &user.password_hash)
            .map_err(|_| anyhow::anyhow!("Identifiants invalides"))?;
        if !valid {
            anyhow::bail!("Identifiants invalides");
        }

        Self::issue_pair(pool, user, jwt_secret, refresh_secret, access_ttl, refresh_ttl_days)
            .await
    }

    /// Issue an access/refresh pair for an already-authenticated user.
    pub async fn issue_pair(
        pool: &PgPool,
        user: User,
        jwt_secret: &str,
        refresh_secret: &str,
        access_ttl: u64,
        refresh_ttl_days: u64,
    ) -> anyhow::Result<LoginResponse> {
        let access_token = Self::generate_access_token(user.id, jwt_secret, access_ttl)?;
        let (refresh_token_str, refresh_id) =
            Self::generate_refresh_token(&user.id, refresh_secret, refresh_ttl_days)?;

        let hash = bcrypt::hash(&refresh_token_str, 8)?;
        let expires_at = Utc::now() + chrono::Duration::days(refresh_ttl_days as i64);
        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(refresh_id)
        .bind(user.id)
        .bind(hash)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(LoginResponse {
            access_token,
            refresh_token: refresh_token_str,
            user: user.into(),
        })
    }

    pub fn generate_access_token(
        user_id: Uuid,
        secret: &str,
        ttl_seconds: u64,
    ) -> anyhow::Result<String> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + ttl_seconds as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok(token)
    }

    fn generate_refresh_token(
        user_id: &Uuid,
        secret: &str,
        ttl_days: u64,
    ) -> anyhow::Result<(String, Uuid)> {
        let now = Utc::now().timestamp() as usize;
        let jti = Uuid::new_v4();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            jti: jti.to_string(),
            iat: now,
            exp: now + (ttl_days * 86400) as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok((token, jti))
    }

    /// Rotate refresh token: revoke old, issue new pair.
    pub async fn refresh(
        pool: &PgPool,
        refresh_token_str: &str,
        jwt_secret: &str,
        refresh_secret: &str,
        access_ttl: u64,
        refresh_ttl_days: u64,
    ) -> anyhow::Result<LoginResponse> {
        use jsonwebtoken::{decode, DecodingKey, Validation};

        let key = DecodingKey::from_secret(refresh_secret.as_bytes());
        let data = decode::<RefreshClaims>(
            refresh_token_str,
            &key,
            &Validation::new(Algorithm::HS256),
        )?;
        let rc = data.claims;
        let jti: Uuid = rc.jti.parse()?;
        let user_id: Uuid = rc.sub.parse()?;

        let stored: RefreshToken = sqlx::query_as(
            "SELECT * FROM refresh_tokens WHERE id = $1 AND revoked = FALSE",
        )
        .bind(jti)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Refresh token not found or revoked"))?;

        if stored.expires_at < Utc::now() {
            anyhow::bail!("Refresh token expired");
        }
        if !bcrypt::verify(refresh_token_str, &stored.token_hash)? {
            anyhow::bail!("Refresh token invalid");
        }

        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1")
            .bind(jti)
            .execute(pool)
            .await?;

        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND is_active = TRUE",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Self::issue_pair(pool, user, jwt_secret, refresh_secret, access_ttl, refresh_ttl_days)
            .await
    }

    /// Revoke a refresh token (logout).
    pub async fn logout(
        pool: &PgPool,
        refresh_token_str: &str,
        refresh_secret: &str,
    ) -> anyhow::Result<()> {
        use jsonwebtoken::{decode, DecodingKey, Validation};

        let key = DecodingKey::from_secret(refresh_secret.as_bytes());
        let data =
            decode::<RefreshClaims>(refresh_token_str, &key, &Validation::new(Algorithm::HS256));

        if let Ok(data) = data {
            let jti: Uuid = data.claims.jti.parse()?;
            sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1")
                .bind(jti)
                .execute(pool)
                .await?;
        }

        Ok(())
    }

    /// Send a password reset email. Always returns Ok to avoid leaking account existence.
    pub async fn request_password_reset(
        pool: &PgPool,
        email_svc: Option<&EmailService>,
        email: &str,
        base_url: &str,
    ) -> anyhow::Result<()> {
        let user_opt: Option<(Uuid, String, String)> = sqlx::query_as(
            "SELECT id, first_name, last_name FROM users
             WHERE email = $1 AND is_active = TRUE",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;

        if let Some((user_id, first_name, last_name)) = user_opt {
            use rand::Rng;
            let token: String = rand::thread_rng()
                .sample_iter(&rand::distributions::Alphanumeric)
                .take(48)
                .map(char::from)
                .collect();

            let expires_at = Utc::now() + chrono::Duration::hours(1);

            sqlx::query(
                "INSERT INTO password_reset_tokens (user_id, token, expires_at)
                 VALUES ($1, $2, $3)",
            )
            .bind(user_id)
            .bind(&token)
            .bind(expires_at)
            .execute(pool)
            .await?;

            if let Some(svc) = email_svc {
                let reset_url = build_reset_url(base_url, &token);
                let display_name = format!("{first_name} {last_name}");
                // Ignore send errors — graceful degradation
                let _ = svc
                    .send_password_reset(email, display_name.trim(), &reset_url)
                    .await;
            }
        }

        Ok(())
    }

    /// Verify token, hash new password, revoke all refresh tokens, mark token used.
    pub async fn reset_password(
        pool: &PgPool,
        token_str: &str,
        new_password: &str,
    ) -> anyhow::Result<()> {
        if new_password.len() < 8 {
            anyhow::bail!("Le mot de passe doit contenir au moins 8 caractères");
        }

        let row: Option<(Uuid, Uuid)> = sqlx::query_as(
            "SELECT id, user_id FROM password_reset_tokens
             WHERE token = $1 AND used = FALSE AND expires_at > NOW()",
        )
        .bind(token_str)
        .fetch_optional(pool)
        .await?;

        let (token_id, user_id) = row.ok_or_else(|| anyhow::anyhow!("Token invalide ou expiré"))?;

        let password_hash = bcrypt::hash(new_password, 12)?;

        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(&password_hash)
            .bind(user_id)
            .execute(pool)
            .await?;

        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        sqlx::query("UPDATE password_reset_tokens SET used = TRUE WHERE id = $1")
            .bind(token_id)
            .execute(pool)
            .await?;

        Ok(())
    }
}
