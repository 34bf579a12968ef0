use serde::Deserialize;

use super::repo_types::CreditorFields;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreditorRequest {
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreditorRequest {
    pub fn into_fields(self) -> Result<CreditorFields, ApiError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::bad_request("Creditor name is required"));
        }
        Ok(CreditorFields {
            name,
            website: non_blank(self.website),
            phone: non_blank(self.phone),
            account_number: non_blank(self.account_number),
            notes: non_blank(self.notes),
        })
    }
}

/// Trims the value; blank input becomes `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
