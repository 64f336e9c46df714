//! Invite queue operations.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::InviteRecord;

/// Record a generated system invite with `pending` status.
pub async fn enqueue_invite(pool: &SqlitePool, invite: &InviteRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO invite_queue (id, email, full_name, role, organization_id,
                                  invite_link, status)
        VALUES (?, ?, ?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(&invite.id)
    .bind(&invite.email)
    .bind(&invite.full_name)
    .bind(&invite.role)
    .bind(&invite.organization_id)
    .bind(&invite.invite_link)
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark an email's pending invites as sent. Returns how many rows changed.
pub async fn mark_sent(pool: &SqlitePool, email: &str) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE invite_queue
        SET status = 'sent'
        WHERE email = ? AND status = 'pending'
        "#,
    )
    .bind(email)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// List invites for an email, newest first.
pub async fn list_invites_for_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Vec<InviteRecord>> {
    let invites = sqlx::query_as::<_, InviteRecord>(
        r#"
        SELECT id, email, full_name, role, organization_id, invite_link,
               status, created_at
        FROM invite_queue
        WHERE email = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(email)
    .fetch_all(pool)
    .await?;

    Ok(invites)
}
