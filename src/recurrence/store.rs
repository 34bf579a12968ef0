use async_trait::async_trait;
use rust_decimal::Decimal;
use time::Date;
use uuid::Uuid;

use super::SeriesMatch;
use crate::bills::repo_types::{Bill, NewBill};

/// Identifies the rows that belong to one recurring template.
#[derive(Debug, Clone, Copy)]
pub struct Series<'a> {
    pub user_id: Uuid,
    pub template_id: Uuid,
    pub creditor_id: Uuid,
    pub name: &'a str,
    pub amount: Decimal,
    pub matching: SeriesMatch,
}

impl<'a> Series<'a> {
    pub fn of(template: &'a Bill, matching: SeriesMatch) -> Self {
        Self {
            user_id: template.user_id,
            template_id: template.id,
            creditor_id: template.creditor_id,
            name: &template.name,
            amount: template.amount,
            matching,
        }
    }
}

/// Bill persistence as seen by the recurring generator.
#[async_trait]
pub trait BillStore: Send + Sync {
    /// Recurring templates owned by `user_id`.
    async fn recurring_templates(&self, user_id: Uuid) -> anyhow::Result<Vec<Bill>>;

    /// Due date of the newest row in the series, if any.
    async fn latest_due_date(&self, series: &Series<'_>) -> anyhow::Result<Option<Date>>;

    async fn occurrence_exists(&self, series: &Series<'_>, due_date: Date) -> anyhow::Result<bool>;

    /// Inserts all rows or none; returns how many rows were written.
    async fn insert_bills(&self, bills: &[NewBill]) -> anyhow::Result<u64>;
}
