//! Per-job Redis lock serialising bias audits.
//!
//! `SET key token NX PX ttl` acquires; a compare-and-delete script releases,
//! so a holder whose lock already expired cannot free someone else's.

use std::time::Duration;

use redis::Client as RedisClient;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;

const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

#[derive(Clone)]
pub struct AuditLock {
    client: RedisClient,
    ttl: Duration,
}

/// Held audit lock. Call `release` when the audit finishes; the TTL frees
/// it otherwise.
pub struct AuditLockGuard {
    client: RedisClient,
    key: String,
    token: String,
}

pub fn lock_key(job_id: Uuid) -> String {
    format!("ranking:bias-audit:{job_id}")
}

impl AuditLock {
    pub fn new(client: RedisClient, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    /// `None` when another audit holds the lock for this job.
    pub async fn acquire(&self, job_id: Uuid) -> Result<Option<AuditLockGuard>, AppError> {
        let key = lock_key(job_id);
        let token = Uuid::new_v4().to_string();
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let acquired: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(&token)
            .arg("NX")
            .arg("PX")
            .arg(self.ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await?;

        if acquired.is_none() {
            debug!(%job_id, "bias audit lock is held elsewhere");
            return Ok(None);
        }

        Ok(Some(AuditLockGuard {
            client: self.client.clone(),
            key,
            token,
        }))
    }
}

impl AuditLockGuard {
    pub async fn release(self) -> Result<(), AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let deleted: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(&self.key)
            .arg(&self.token)
            .invoke_async(&mut conn)
            .await?;

        if deleted == 0 {
            warn!(key = %self.key, "audit lock expired before release");
        }
        Ok(())
    }
}
