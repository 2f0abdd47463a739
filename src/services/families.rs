use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    models::family::{Family, FamilyInvitation, FamilyMemberView},
    models::profile::ChildRecord,
    services::email::EmailService,
};

fn build_invite_url(base_url: &str, token: &str) -> String {
    format!("{base_url}/fr/rejoindre?token={token}")
}

pub struct FamilyService;

impl FamilyService {
    /// Resolve the family a user belongs to, backfilling `users.family_id`
    /// when it is missing. Fallback order: the user row itself, then a
    /// membership row, then a family the user owns; as a last resort a
    /// personal family is created with a trial subscription.
    pub async fn resolve_family_id(
        pool: &PgPool,
        user_id: Uuid,
        trial_days: u64,
    ) -> anyhow::Result<Uuid> {
        let direct: Option<Option<Uuid>> =
            sqlx::query_scalar("SELECT family_id FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;

        let direct = direct.ok_or_else(|| anyhow::anyhow!("Utilisateur non trouvé"))?;
        if let Some(family_id) = direct {
            return Ok(family_id);
        }

        let via_membership: Option<Uuid> = sqlx::query_scalar(
            "SELECT family_id FROM family_members WHERE user_id = $1 ORDER BY created_at LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        if let Some(family_id) = via_membership {
            warn!(%user_id, %family_id, "family_id absent du compte, récupéré via family_members");
            Self::backfill_family_id(pool, user_id, family_id).await?;
            return Ok(family_id);
        }

        let owned: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM families WHERE owner_id = $1 LIMIT 1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;

        if let Some(family_id) = owned {
            warn!(%user_id, %family_id, "family_id absent du compte, récupéré via families.owner_id");
            sqlx::query(
                "INSERT INTO family_members (family_id, user_id, relationship)
                 VALUES ($1, $2, 'parent')
                 ON CONFLICT (family_id, user_id) DO NOTHING",
            )
            .bind(family_id)
            .bind(user_id)
            .execute(pool)
            .await?;
            Self::backfill_family_id(pool, user_id, family_id).await?;
            return Ok(family_id);
        }

        info!(%user_id, "aucune famille trouvée, création d'une famille personnelle");
        let family = Self::create_family(pool, user_id, "Ma famille", trial_days).await?;
        Ok(family.id)
    }

    async fn backfill_family_id(
        pool: &PgPool,
        user_id: Uuid,
        family_id: Uuid,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET family_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(family_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Create a family owned by `owner_id`, attach the owner as a member and
    /// open a trial subscription.
    pub async fn create_family(
        pool: &PgPool,
        owner_id: Uuid,
        name: &str,
        trial_days: u64,
    ) -> anyhow::Result<Family> {
        let family: Family = sqlx::query_as(
            "INSERT INTO families (name, owner_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

        sqlx::query(
            "INSERT INTO family_members (family_id, user_id, relationship) VALUES ($1, $2, 'parent')",
        )
        .bind(family.id)
        .bind(owner_id)
        .execute(pool)
        .await?;

        Self::backfill_family_id(pool, owner_id, family.id).await?;

        let trial_end = Utc::now() + chrono::Duration::days(trial_days as i64);
        sqlx::query(
            "INSERT INTO subscriptions (family_id, status, current_period_end)
             VALUES ($1, 'trialing', $2)
             ON CONFLICT (family_id) DO NOTHING",
        )
        .bind(family.id)
        .bind(trial_end)
        .execute(pool)
        .await?;

        Ok(family)
    }

    pub async fn get(pool: &PgPool, family_id: Uuid) -> anyhow::Result<Option<Family>> {
        let family = sqlx::query_as("SELECT * FROM families WHERE id = $1")
            .bind(family_id)
            .fetch_optional(pool)
            .await?;
        Ok(family)
    }

    pub async fn list_members(
        pool: &PgPool,
        family_id: Uuid,
    ) -> anyhow::Result<Vec<FamilyMemberView>> {
        let members = sqlx::query_as::<_, FamilyMemberView>(
            "SELECT u.id as user_id, u.first_name, u.last_name, u.email, fm.relationship
             FROM family_members fm
             JOIN users u ON u.id = fm.user_id
             WHERE fm.family_id = $1 AND u.is_active = TRUE
             ORDER BY u.last_name, u.first_name",
        )
        .bind(family_id)
        .fetch_all(pool)
        .await?;
        Ok(members)
    }

    pub async fn list_children(
        pool: &PgPool,
        family_id: Uuid,
    ) -> anyhow::Result<Vec<ChildRecord>> {
        let children = sqlx::query_as::<_, ChildRecord>(
            "SELECT * FROM children WHERE family_id = $1 ORDER BY created_at",
        )
        .bind(family_id)
        .fetch_all(pool)
        .await?;
        Ok(children)
    }

    /// Create an invitation token and send the invitation email.
    pub async fn create_invitation(
        pool: &PgPool,
        email_svc: Option<&EmailService>,
        family_id: Uuid,
        invited_by: Uuid,
        email: &str,
        relationship: &str,
        base_url: &str,
    ) -> anyhow::Result<()> {
        let email_svc = email_svc.ok_or_else(|| {
            anyhow::anyhow!("Service email non configuré (SMTP requis pour les invitations)")
        })?;

        use rand::Rng;
        let token: String = rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();

        let expires_at = Utc::now() + chrono::Duration::days(7);

        sqlx::query(
            "INSERT INTO family_invitations (family_id, email, token, relationship, invited_by, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(family_id)
        .bind(email)
        .bind(&token)
        .bind(relationship)
        .bind(invited_by)
        .bind(expires_at)
        .execute(pool)
        .await?;

        let inviter_name: String = sqlx::query_scalar(
            "SELECT first_name || ' ' || last_name FROM users WHERE id = $1",
        )
        .bind(invited_by)
        .fetch_optional(pool)
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| "Un membre de votre famille".to_string());

        let invite_url = build_invite_url(base_url, &token);

        email_svc
            .send_family_invitation(email, &inviter_name, &invite_url)
            .await
            .map_err(|e| anyhow::anyhow!("Impossible d'envoyer l'invitation : {e}"))?;

        Ok(())
    }

    /// List pending (unused, unexpired) invitations for a family.
    pub async fn list_pending_invitations(
        pool: &PgPool,
        family_id: Uuid,
    ) -> anyhow::Result<Vec<FamilyInvitation>> {
        let invitations = sqlx::query_as::<_, FamilyInvitation>(
            "SELECT * FROM family_invitations
             WHERE family_id = $1 AND used = FALSE AND expires_at > NOW()
             ORDER BY created_at DESC",
        )
        .bind(family_id)
        .fetch_all(pool)
        .await?;
        Ok(invitations)
    }

    /// Delete a pending invitation by ID (only if not yet used).
    pub async fn delete_invitation(
        pool: &PgPool,
        family_id: Uuid,
        invitation_id: Uuid,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "DELETE FROM family_invitations WHERE id = $1 AND family_id = $2 AND used = FALSE",
        )
        .bind(invitation_id)
        .bind(family_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Attach a user to the inviting family from a valid invitation token.
    pub async fn accept_invitation(
        pool: &PgPool,
        user_id: Uuid,
        token: &str,
    ) -> anyhow::Result<Family> {
        let invitation: FamilyInvitation = sqlx::query_as(
            "SELECT * FROM family_invitations WHERE token = $1 AND used = FALSE",
        )
        .bind(token)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Invitation invalide ou déjà utilisée"))?;

        if invitation.expires_at < Utc::now() {
            anyhow::bail!("Invitation expirée");
        }

        sqlx::query(
            "INSERT INTO family_members (family_id, user_id, relationship)
             VALUES ($1, $2, $3)
             ON CONFLICT (family_id, user_id) DO UPDATE SET relationship = EXCLUDED.relationship",
        )
        .bind(invitation.family_id)
        .bind(user_id)
        .bind(&invitation.relationship)
        .execute(pool)
        .await?;

        Self::backfill_family_id(pool, user_id, invitation.family_id).await?;

        sqlx::query("UPDATE family_invitations SET used = TRUE WHERE id = $1")
            .bind(invitation.id)
            .execute(pool)
            .await?;

        let family = Self::get(pool, invitation.family_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Famille introuvable"))?;
        Ok(family)
    }
}
