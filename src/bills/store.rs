use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use super::{
    repo,
    repo_types::{Bill, NewBill},
};
use crate::recurrence::{BillStore, Series, SeriesMatch};

/// Postgres-backed [`BillStore`].
#[derive(Clone)]
pub struct PgBillStore {
    db: PgPool,
}

impl PgBillStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BillStore for PgBillStore {
    async fn recurring_templates(&self, user_id: Uuid) -> anyhow::Result<Vec<Bill>> {
        let rows = sqlx::query_as::<_, Bill>(
            r#"
            SELECT id, user_id, creditor_id, template_id, is_generated, name, amount, due_date,
                   is_paid, paid_date, login_username, login_password, notes,
                   is_recurring, recurrence_frequency, recurrence_day, created_at, updated_at
              FROM bills
             WHERE user_id = $1 AND is_recurring AND NOT is_generated
             ORDER BY due_date ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list recurring templates")?;
        Ok(rows)
    }

    async fn latest_due_date(&self, series: &Series<'_>) -> anyhow::Result<Option<Date>> {
        let latest = match series.matching {
            SeriesMatch::Template => {
                sqlx::query_scalar::<_, Date>(
                    r#"
                    SELECT due_date
                      FROM bills
                     WHERE user_id = $1 AND (id = $2 OR template_id = $2)
                     ORDER BY due_date DESC
                     LIMIT 1
                    "#,
                )
                .bind(series.user_id)
                .bind(series.template_id)
                .fetch_optional(&self.db)
                .await
            }
            SeriesMatch::Fields => {
                sqlx::query_scalar::<_, Date>(
                    r#"
                    SELECT due_date
                      FROM bills
                     WHERE user_id = $1 AND creditor_id = $2 AND name = $3 AND amount = $4
                     ORDER BY due_date DESC
                     LIMIT 1
                    "#,
                )
                .bind(series.user_id)
                .bind(series.creditor_id)
                .bind(series.name)
                .bind(series.amount)
                .fetch_optional(&self.db)
                .await
            }
        };
        latest.with_context(|| format!("latest occurrence of template {}", series.template_id))
    }

    async fn occurrence_exists(&self, series: &Series<'_>, due_date: Date) -> anyhow::Result<bool> {
        let exists = match series.matching {
            SeriesMatch::Template => {
                sqlx::query_scalar::<_, bool>(
                    r#"
                    SELECT EXISTS (
                        SELECT 1 FROM bills
                         WHERE user_id = $1 AND (id = $2 OR template_id = $2) AND due_date = $3
                    )
                    "#,
                )
                .bind(series.user_id)
                .bind(series.template_id)
                .bind(due_date)
                .fetch_one(&self.db)
                .await
            }
            SeriesMatch::Fields => {
                sqlx::query_scalar::<_, bool>(
                    r#"
                    SELECT EXISTS (
                        SELECT 1 FROM bills
                         WHERE user_id = $1 AND creditor_id = $2 AND name = $3 AND amount = $4
                           AND due_date = $5
                    )
                    "#,
                )
                .bind(series.user_id)
                .bind(series.creditor_id)
                .bind(series.name)
                .bind(series.amount)
                .bind(due_date)
                .fetch_one(&self.db)
                .await
            }
        };
        exists.with_context(|| format!("occurrence check for {}", due_date))
    }

    async fn insert_bills(&self, bills: &[NewBill]) -> anyhow::Result<u64> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let mut inserted = 0;
        for bill in bills {
            inserted += repo::insert_tx(&mut tx, bill).await?;
        }
        tx.commit().await.context("commit tx")?;
        Ok(inserted)
    }
}
