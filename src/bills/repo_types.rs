use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::recurrence::Frequency;

/// Bill record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub creditor_id: Uuid,
    pub template_id: Option<Uuid>, // cleared when the template is deleted
    pub is_generated: bool,
    pub name: String,
    pub amount: Decimal,
    pub due_date: Date,
    pub is_paid: bool,
    pub paid_date: Option<Date>,
    pub login_username: Option<String>,
    pub login_password: Option<String>, // stored as entered
    pub notes: Option<String>,
    pub is_recurring: bool,
    pub recurrence_frequency: Option<Frequency>,
    pub recurrence_day: Option<i16>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Bill {
    /// A template is a recurring row that was not itself generated.
    /// Occurrences orphaned by a template delete stay plain history.
    pub fn is_template(&self) -> bool {
        self.is_recurring && !self.is_generated
    }
}

/// Column values for a bill that is about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBill {
    pub user_id: Uuid,
    pub creditor_id: Uuid,
    pub template_id: Option<Uuid>,
    pub is_generated: bool,
    pub name: String,
    pub amount: Decimal,
    pub due_date: Date,
    pub is_paid: bool,
    pub paid_date: Option<Date>,
    pub login_username: Option<String>,
    pub login_password: Option<String>,
    pub notes: Option<String>,
    pub is_recurring: bool,
    pub recurrence_frequency: Option<Frequency>,
    pub recurrence_day: Option<i16>,
}

impl NewBill {
    /// Re-saving a bill that is already paid keeps its original paid date;
    /// newly paid and unpaid bills keep what the request produced.
    pub fn keep_paid_date(mut self, existing: &Bill) -> Self {
        if self.is_paid && existing.is_paid && existing.paid_date.is_some() {
            self.paid_date = existing.paid_date;
        }
        self
    }

    #[cfg(test)]
    pub(crate) fn into_bill(self) -> Bill {
        let now = OffsetDateTime::now_utc();
        Bill {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            creditor_id: self.creditor_id,
            template_id: self.template_id,
            is_generated: self.is_generated,
            name: self.name,
            amount: self.amount,
            due_date: self.due_date,
            is_paid: self.is_paid,
            paid_date: self.paid_date,
            login_username: self.login_username,
            login_password: self.login_password,
            notes: self.notes,
            is_recurring: self.is_recurring,
            recurrence_frequency: self.recurrence_frequency,
            recurrence_day: self.recurrence_day,
            created_at: now,
            updated_at: now,
        }
    }

    /// Unpaid occurrence of `template` on `due_date`.
    pub fn occurrence_of(template: &Bill, due_date: Date) -> Self {
        Self {
            user_id: template.user_id,
            creditor_id: template.creditor_id,
            template_id: Some(template.id),
            is_generated: true,
            name: template.name.clone(),
            amount: template.amount,
            due_date,
            is_paid: false,
            paid_date: None,
            login_username: template.login_username.clone(),
            login_password: template.login_password.clone(),
            notes: template.notes.clone(),
            is_recurring: true,
            recurrence_frequency: template.recurrence_frequency,
            recurrence_day: template.recurrence_day,
        }
    }
}
