use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Creditor record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Creditor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub account_number: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Creditor plus the number of bills that reference it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CreditorWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub creditor: Creditor,
    pub bill_count: i64,
}

/// Column values for an insert or full update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditorFields {
    pub name: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub account_number: Option<String>,
    pub notes: Option<String>,
}
