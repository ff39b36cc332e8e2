use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::warn;

use super::models::{FreezeKind, FreezeMarker, FreezeStatus};

/// key: billing-freeze-store -> restriction marker source of truth
///
/// Markers are created and removed by collaborators outside this slice;
/// the reconciler only reads them and requests the two billing lifts.
#[async_trait]
pub trait FreezeStore: Send + Sync {
    async fn get_all(&self, account_id: i32) -> anyhow::Result<FreezeStatus>;
    async fn clear_billing_freeze(&self, account_id: i32) -> anyhow::Result<()>;
    async fn clear_billing_warning(&self, account_id: i32) -> anyhow::Result<()>;
}

/// key: billing-freeze-store-pg -> sqlx implementation
#[derive(Clone)]
pub struct PgFreezeStore {
    pool: PgPool,
}

impl PgFreezeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn release(&self, account_id: i32, kind: FreezeKind) -> anyhow::Result<()> {
        // Releasing an already-released marker is a no-op, so a concurrent
        // duplicate request cannot fail here.
        sqlx::query(
            "UPDATE account_freezes SET released_at = NOW() \
             WHERE account_id = $1 AND kind = $2 AND released_at IS NULL",
        )
        .bind(account_id)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl FreezeStore for PgFreezeStore {
    async fn get_all(&self, account_id: i32) -> anyhow::Result<FreezeStatus> {
        let rows = sqlx::query(
            "SELECT id, account_id, kind, created_at FROM account_freezes \
             WHERE account_id = $1 AND released_at IS NULL",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        let mut status = FreezeStatus::default();
        for row in rows {
            let raw_kind: String = row.get("kind");
            let Some(kind) = FreezeKind::parse(&raw_kind) else {
                warn!(account_id, kind = %raw_kind, "unknown freeze marker kind in store");
                continue;
            };
            status.set(FreezeMarker {
                id: row.get("id"),
                account_id: row.get("account_id"),
                kind,
                created_at: row.get("created_at"),
            });
        }
        Ok(status)
    }

    async fn clear_billing_freeze(&self, account_id: i32) -> anyhow::Result<()> {
        self.release(account_id, FreezeKind::BillingFreeze).await
    }

    async fn clear_billing_warning(&self, account_id: i32) -> anyhow::Result<()> {
        self.release(account_id, FreezeKind::BillingWarning).await
    }
}
