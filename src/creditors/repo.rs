use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Creditor, CreditorFields, CreditorWithCount};

/// All of a user's creditors ordered by name, each with its bill count.
pub async fn list_with_bill_counts(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<CreditorWithCount>> {
    let rows = sqlx::query_as::<_, CreditorWithCount>(
        r#"
        SELECT c.id, c.user_id, c.name, c.website, c.phone, c.account_number, c.notes,
               c.created_at, c.updated_at,
               COUNT(b.id) AS bill_count
          FROM creditors c
          LEFT JOIN bills b ON b.creditor_id = c.id
         WHERE c.user_id = $1
         GROUP BY c.id
         ORDER BY c.name ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list creditors")?;
    Ok(rows)
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Creditor>> {
    let rows = sqlx::query_as::<_, Creditor>(
        r#"
        SELECT id, user_id, name, website, phone, account_number, notes, created_at, updated_at
          FROM creditors
         WHERE user_id = $1
         ORDER BY name ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list creditors by user")?;
    Ok(rows)
}

pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Creditor>> {
    let row = sqlx::query_as::<_, Creditor>(
        r#"
        SELECT id, user_id, name, website, phone, account_number, notes, created_at, updated_at
          FROM creditors
         WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("find creditor")?;
    Ok(row)
}

pub async fn create(db: &PgPool, user_id: Uuid, fields: &CreditorFields) -> anyhow::Result<Creditor> {
    let row = sqlx::query_as::<_, Creditor>(
        r#"
        INSERT INTO creditors (user_id, name, website, phone, account_number, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, name, website, phone, account_number, notes, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(&fields.name)
    .bind(&fields.website)
    .bind(&fields.phone)
    .bind(&fields.account_number)
    .bind(&fields.notes)
    .fetch_one(db)
    .await
    .context("insert creditor")?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    fields: &CreditorFields,
) -> anyhow::Result<Option<Creditor>> {
    let row = sqlx::query_as::<_, Creditor>(
        r#"
        UPDATE creditors
           SET name = $3, website = $4, phone = $5, account_number = $6, notes = $7,
               updated_at = now()
         WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, name, website, phone, account_number, notes, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&fields.name)
    .bind(&fields.website)
    .bind(&fields.phone)
    .bind(&fields.account_number)
    .bind(&fields.notes)
    .fetch_optional(db)
    .await
    .context("update creditor")?;
    Ok(row)
}

/// Deletes the creditor; its bills go with it through the foreign key.
pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM creditors WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete creditor")?;
    Ok(res.rows_affected() > 0)
}
