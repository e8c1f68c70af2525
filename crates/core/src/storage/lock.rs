use anyhow::Context;
use uuid::Uuid;

// Advisory locks serialize concurrent assessment writes for one user.
// Transaction-scoped, so they release on commit or rollback.
const LOCK_NAMESPACE: i64 = 0x4144_5649_534F; // "ADVISO" as hex-ish namespace.

pub fn lock_key_for_user(user_id: Uuid) -> i64 {
    let bytes = user_id.as_bytes();
    let mut hi = [0u8; 8];
    let mut lo = [0u8; 8];
    hi.copy_from_slice(&bytes[..8]);
    lo.copy_from_slice(&bytes[8..]);
    LOCK_NAMESPACE ^ i64::from_be_bytes(hi) ^ i64::from_be_bytes(lo)
}

pub async fn acquire_user_xact_lock(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
) -> anyhow::Result<()> {
    let key = lock_key_for_user(user_id);
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .persistent(false)
        .bind(key)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("failed to acquire user advisory lock (key={key})"))?;
    Ok(())
}
