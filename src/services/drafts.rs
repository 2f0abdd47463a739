use redis::aio::MultiplexedConnection;
use uuid::Uuid;

use crate::models::wizard::WizardState;

/// Redis-backed store for in-progress wizard sessions.
///
/// Drafts are ephemeral by design: each write refreshes the TTL and an
/// abandoned flow simply expires. Keys are scoped by user so a draft can
/// never be read through another account.
pub struct DraftStore;

impl DraftStore {
    fn key(user_id: Uuid, draft_id: Uuid) -> String {
        format!("wizard:draft:{user_id}:{draft_id}")
    }

    pub async fn put(
        redis: &mut MultiplexedConnection,
        user_id: Uuid,
        draft_id: Uuid,
        state: &WizardState,
        ttl_secs: u64,
    ) -> anyhow::Result<()> {
        let payload = serde_json::to_string(state)?;
        let _: () = redis::cmd("SETEX")
            .arg(Self::key(user_id, draft_id))
            .arg(ttl_secs)
            .arg(payload)
            .query_async(redis)
            .await?;
        Ok(())
    }

    pub async fn get(
        redis: &mut MultiplexedConnection,
        user_id: Uuid,
        draft_id: Uuid,
    ) -> anyhow::Result<Option<WizardState>> {
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::key(user_id, draft_id))
            .query_async(redis)
            .await?;
        match raw {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    pub async fn delete(
        redis: &mut MultiplexedConnection,
        user_id: Uuid,
        draft_id: Uuid,
    ) -> anyhow::Result<()> {
        let _: () = redis::cmd("DEL")
            .arg(Self::key(user_id, draft_id))
            .query_async(redis)
            .await?;
        Ok(())
    }
}
