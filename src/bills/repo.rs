use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use time::Date;
use uuid::Uuid;

use super::repo_types::{Bill, NewBill};

const BILL_COLUMNS: &str = "id, user_id, creditor_id, template_id, is_generated, name, amount, due_date, \
     is_paid, paid_date, login_username, login_password, notes, \
     is_recurring, recurrence_frequency, recurrence_day, created_at, updated_at";

/// All of a user's bills, earliest due first.
pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Bill>> {
    let sql = format!(
        "SELECT {BILL_COLUMNS} FROM bills WHERE user_id = $1 ORDER BY due_date ASC, created_at ASC"
    );
    let rows = sqlx::query_as::<_, Bill>(&sql)
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list bills")?;
    Ok(rows)
}

/// Bills due within `[from, to]`, earliest due first.
pub async fn list_due_between(
    db: &PgPool,
    user_id: Uuid,
    from: Date,
    to: Date,
) -> anyhow::Result<Vec<Bill>> {
    let sql = format!(
        "SELECT {BILL_COLUMNS} FROM bills \
          WHERE user_id = $1 AND due_date BETWEEN $2 AND $3 \
          ORDER BY due_date ASC, created_at ASC"
    );
    let rows = sqlx::query_as::<_, Bill>(&sql)
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(db)
        .await
        .context("list bills by due date")?;
    Ok(rows)
}

pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Bill>> {
    let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = $1 AND user_id = $2");
    let row = sqlx::query_as::<_, Bill>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("find bill")?;
    Ok(row)
}

pub async fn create(db: &PgPool, bill: &NewBill) -> anyhow::Result<Bill> {
    let sql = format!(
        "INSERT INTO bills (user_id, creditor_id, template_id, is_generated, name, amount, \
                            due_date, is_paid, paid_date, login_username, login_password, \
                            notes, is_recurring, recurrence_frequency, recurrence_day) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
         RETURNING {BILL_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Bill>(&sql)
        .bind(bill.user_id)
        .bind(bill.creditor_id)
        .bind(bill.template_id)
        .bind(bill.is_generated)
        .bind(&bill.name)
        .bind(bill.amount)
        .bind(bill.due_date)
        .bind(bill.is_paid)
        .bind(bill.paid_date)
        .bind(&bill.login_username)
        .bind(&bill.login_password)
        .bind(&bill.notes)
        .bind(bill.is_recurring)
        .bind(bill.recurrence_frequency)
        .bind(bill.recurrence_day)
        .fetch_one(db)
        .await
        .context("insert bill")?;
    Ok(row)
}

/// Inserts one row inside `tx`; an existing (template, due date) pair is left alone.
pub async fn insert_tx(tx: &mut Transaction<'_, Postgres>, bill: &NewBill) -> anyhow::Result<u64> {
    let res = sqlx::query(
        r#"
        INSERT INTO bills (user_id, creditor_id, template_id, is_generated, name, amount,
                           due_date, is_paid, paid_date, login_username, login_password,
                           notes, is_recurring, recurrence_frequency, recurrence_day)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ON CONFLICT (template_id, due_date) WHERE template_id IS NOT NULL DO NOTHING
        "#,
    )
    .bind(bill.user_id)
    .bind(bill.creditor_id)
    .bind(bill.template_id)
    .bind(bill.is_generated)
    .bind(&bill.name)
    .bind(bill.amount)
    .bind(bill.due_date)
    .bind(bill.is_paid)
    .bind(bill.paid_date)
    .bind(&bill.login_username)
    .bind(&bill.login_password)
    .bind(&bill.notes)
    .bind(bill.is_recurring)
    .bind(bill.recurrence_frequency)
    .bind(bill.recurrence_day)
    .execute(&mut **tx)
    .await
    .with_context(|| format!("insert bill due {}", bill.due_date))?;
    Ok(res.rows_affected())
}

/// Overwrites the editable columns of a bill owned by `bill.user_id`.
pub async fn update(db: &PgPool, id: Uuid, bill: &NewBill) -> anyhow::Result<Option<Bill>> {
    let sql = format!(
        "UPDATE bills \
            SET creditor_id = $3, name = $4, amount = $5, due_date = $6, \
                is_paid = $7, paid_date = $8, login_username = $9, login_password = $10, \
                notes = $11, is_recurring = $12, recurrence_frequency = $13, \
                recurrence_day = $14, updated_at = now() \
          WHERE id = $1 AND user_id = $2 \
         RETURNING {BILL_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Bill>(&sql)
        .bind(id)
        .bind(bill.user_id)
        .bind(bill.creditor_id)
        .bind(&bill.name)
        .bind(bill.amount)
        .bind(bill.due_date)
        .bind(bill.is_paid)
        .bind(bill.paid_date)
        .bind(&bill.login_username)
        .bind(&bill.login_password)
        .bind(&bill.notes)
        .bind(bill.is_recurring)
        .bind(bill.recurrence_frequency)
        .bind(bill.recurrence_day)
        .fetch_optional(db)
        .await
        .context("update bill")?;
    Ok(row)
}

/// Flips the paid flag. Becoming paid stamps `paid_on`; becoming unpaid clears it.
pub async fn toggle_paid(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    paid_on: Date,
) -> anyhow::Result<Option<Bill>> {
    let sql = format!(
        "UPDATE bills \
            SET is_paid = NOT is_paid, \
                paid_date = CASE WHEN is_paid THEN NULL ELSE $3 END, \
                updated_at = now() \
          WHERE id = $1 AND user_id = $2 \
         RETURNING {BILL_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Bill>(&sql)
        .bind(id)
        .bind(user_id)
        .bind(paid_on)
        .fetch_optional(db)
        .await
        .context("toggle bill paid")?;
    Ok(row)
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM bills WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete bill")?;
    Ok(res.rows_affected() > 0)
}
