use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Family {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Member row joined with the user it points to, for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FamilyMemberView {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub relationship: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FamilyInvitation {
    pub id: Uuid,
    pub family_id: Uuid,
    pub email: String,
    pub token: String,
    pub relationship: String,
    pub invited_by: Option<Uuid>,
    pub used: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Subscription status: "trialing", "active" or "canceled".
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub family_id: Uuid,
    pub status: String,
    pub current_period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct InviteRelativeRequest {
    pub email: String,
    pub relationship: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinFamilyRequest {
    pub token: String,
}
