use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::repo_types::{Bill, NewBill};
use crate::{creditors::dto::non_blank, error::ApiError, recurrence::Frequency};

/// Amounts must fit `NUMERIC(12, 2)`.
const AMOUNT_DIGITS_BEFORE_POINT: u32 = 10;

/// Body of `POST /bills` and `PUT /bills/:id`.
#[derive(Debug, Deserialize)]
pub struct BillRequest {
    pub creditor_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub due_date: Date,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub login_username: Option<String>,
    #[serde(default)]
    pub login_password: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Omitted on update keeps the stored recurrence settings.
    #[serde(default)]
    pub is_recurring: Option<bool>,
    #[serde(default)]
    pub recurrence_frequency: Option<Frequency>,
    #[serde(default)]
    pub recurrence_day: Option<i16>,
}

impl BillRequest {
    /// Checks the request and turns it into column values. `paid_on` becomes
    /// the paid date when the bill is marked paid.
    pub fn into_new_bill(self, user_id: Uuid, paid_on: Date) -> Result<NewBill, ApiError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::bad_request("Bill name is required"));
        }
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(ApiError::bad_request("Amount must not be negative"));
        }
        let amount = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if amount >= Decimal::from(10_i64.pow(AMOUNT_DIGITS_BEFORE_POINT)) {
            return Err(ApiError::bad_request("Amount is too large"));
        }

        let is_recurring = self.is_recurring.unwrap_or(false);
        let (frequency, day) = if is_recurring {
            let Some(frequency) = self.recurrence_frequency else {
                return Err(ApiError::bad_request(
                    "Recurring bills need a recurrence_frequency",
                ));
            };
            if let Some(day) = self.recurrence_day {
                let range = frequency.day_range();
                if !range.contains(&day) {
                    return Err(ApiError::bad_request(format!(
                        "recurrence_day for {} bills must be between {} and {}",
                        frequency,
                        range.start(),
                        range.end()
                    )));
                }
            }
            (Some(frequency), self.recurrence_day)
        } else {
            (None, None)
        };

        Ok(NewBill {
            user_id,
            creditor_id: self.creditor_id,
            template_id: None,
            is_generated: false,
            name,
            amount,
            due_date: self.due_date,
            is_paid: self.is_paid,
            paid_date: self.is_paid.then_some(paid_on),
            login_username: non_blank(self.login_username),
            login_password: non_blank(self.login_password),
            notes: non_blank(self.notes),
            is_recurring,
            recurrence_frequency: frequency,
            recurrence_day: day,
        })
    }

    /// Applies a `PUT` body on top of `existing`. Recurrence fields the body
    /// leaves out keep their stored values, as do the series link and the
    /// date an already paid bill was paid.
    pub fn into_update(mut self, existing: &Bill, today: Date) -> Result<NewBill, ApiError> {
        if self.is_recurring.is_none() {
            self.is_recurring = Some(existing.is_recurring);
        }
        self.recurrence_frequency = self.recurrence_frequency.or(existing.recurrence_frequency);
        self.recurrence_day = self.recurrence_day.or(existing.recurrence_day);

        let mut changes = self.into_new_bill(existing.user_id, today)?;
        changes.template_id = existing.template_id;
        changes.is_generated = existing.is_generated;
        Ok(changes.keep_paid_date(existing))
    }
}

/// Which bills `GET /bills` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Upcoming,
    Overdue,
    Paid,
}

#[derive(Debug, Deserialize)]
pub struct BillListQuery {
    #[serde(default)]
    pub status: StatusFilter,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn request(json: &str) -> BillRequest {
        serde_json::from_str(json).expect("valid json")
    }

    const CREDITOR: &str = "6f1d3c1e-8f1e-4a53-9d0c-0a4f7b0b9c11";

    #[test]
    fn one_off_bill_drops_recurrence_fields() {
        let bill = request(&format!(
            r#"{{"creditor_id":"{CREDITOR}","name":" Electric ","amount":"82.5",
                "due_date":"2024-03-10","recurrence_frequency":"monthly","recurrence_day":10}}"#
        ))
        .into_new_bill(Uuid::new_v4(), date!(2024 - 03 - 01))
        .unwrap();

        assert_eq!(bill.name, "Electric");
        assert_eq!(bill.amount, Decimal::new(8250, 2));
        assert_eq!(bill.due_date, date!(2024 - 03 - 10));
        assert!(!bill.is_recurring);
        assert_eq!(bill.recurrence_frequency, None);
        assert_eq!(bill.recurrence_day, None);
        assert_eq!(bill.paid_date, None);
    }

    #[test]
    fn paid_bill_gets_paid_date() {
        let bill = request(&format!(
            r#"{{"creditor_id":"{CREDITOR}","name":"Water","amount":40,
                "due_date":"2024-03-10","is_paid":true}}"#
        ))
        .into_new_bill(Uuid::new_v4(), date!(2024 - 03 - 05))
        .unwrap();
        assert_eq!(bill.paid_date, Some(date!(2024 - 03 - 05)));
    }

    #[test]
    fn recurring_bill_requires_frequency() {
        let err = request(&format!(
            r#"{{"creditor_id":"{CREDITOR}","name":"Rent","amount":"1200.00",
                "due_date":"2024-03-01","is_recurring":true}}"#
        ))
        .into_new_bill(Uuid::new_v4(), date!(2024 - 03 - 01))
        .unwrap_err();
        assert!(err.to_string().contains("recurrence_frequency"));
    }

    #[test]
    fn recurrence_day_is_range_checked() {
        let err = request(&format!(
            r#"{{"creditor_id":"{CREDITOR}","name":"Gym","amount":"25",
                "due_date":"2024-03-01","is_recurring":true,
                "recurrence_frequency":"weekly","recurrence_day":9}}"#
        ))
        .into_new_bill(Uuid::new_v4(), date!(2024 - 03 - 01))
        .unwrap_err();
        assert!(err.to_string().contains("between 1 and 7"));
    }

    #[test]
    fn negative_amount_and_blank_name_are_rejected() {
        let negative = request(&format!(
            r#"{{"creditor_id":"{CREDITOR}","name":"Refund","amount":"-1",
                "due_date":"2024-03-01"}}"#
        ))
        .into_new_bill(Uuid::new_v4(), date!(2024 - 03 - 01));
        assert!(matches!(negative, Err(ApiError::BadRequest(_))));

        let blank = request(&format!(
            r#"{{"creditor_id":"{CREDITOR}","name":"  ","amount":"1","due_date":"2024-03-01"}}"#
        ))
        .into_new_bill(Uuid::new_v4(), date!(2024 - 03 - 01));
        assert!(matches!(blank, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn amounts_round_half_away_from_zero_and_must_fit_the_column() {
        let rounded = request(&format!(
            r#"{{"creditor_id":"{CREDITOR}","name":"Tip","amount":"0.125","due_date":"2024-03-01"}}"#
        ))
        .into_new_bill(Uuid::new_v4(), date!(2024 - 03 - 01))
        .unwrap();
        assert_eq!(rounded.amount, Decimal::new(13, 2));

        let largest = request(&format!(
            r#"{{"creditor_id":"{CREDITOR}","name":"Yacht","amount":"9999999999.99","due_date":"2024-03-01"}}"#
        ))
        .into_new_bill(Uuid::new_v4(), date!(2024 - 03 - 01));
        assert!(largest.is_ok());

        let too_big = request(&format!(
            r#"{{"creditor_id":"{CREDITOR}","name":"Island","amount":"10000000000","due_date":"2024-03-01"}}"#
        ))
        .into_new_bill(Uuid::new_v4(), date!(2024 - 03 - 01));
        assert!(matches!(too_big, Err(ApiError::BadRequest(_))));
    }

    fn stored(json: &str, paid_on: Date) -> Bill {
        request(json)
            .into_new_bill(Uuid::new_v4(), paid_on)
            .unwrap()
            .into_bill()
    }

    #[test]
    fn update_without_recurrence_fields_keeps_the_series() {
        let template = stored(
            &format!(
                r#"{{"creditor_id":"{CREDITOR}","name":"Internet","amount":"60",
                    "due_date":"2024-01-15","is_recurring":true,
                    "recurrence_frequency":"monthly","recurrence_day":15}}"#
            ),
            date!(2024 - 01 - 01),
        );

        let changes = request(&format!(
            r#"{{"creditor_id":"{CREDITOR}","name":"Fiber","amount":"70","due_date":"2024-01-20"}}"#
        ))
        .into_update(&template, date!(2024 - 01 - 10))
        .unwrap();

        assert_eq!(changes.name, "Fiber");
        assert_eq!(changes.user_id, template.user_id);
        assert!(changes.is_recurring);
        assert_eq!(changes.recurrence_frequency, Some(Frequency::Monthly));
        assert_eq!(changes.recurrence_day, Some(15));

        let stopped = request(&format!(
            r#"{{"creditor_id":"{CREDITOR}","name":"Fiber","amount":"70",
                "due_date":"2024-01-20","is_recurring":false}}"#
        ))
        .into_update(&template, date!(2024 - 01 - 10))
        .unwrap();
        assert!(!stopped.is_recurring);
        assert_eq!(stopped.recurrence_frequency, None);
    }

    #[test]
    fn update_keeps_generated_occurrence_linked() {
        let mut occurrence = stored(
            &format!(
                r#"{{"creditor_id":"{CREDITOR}","name":"Internet","amount":"60",
                    "due_date":"2024-02-15","is_recurring":true,"recurrence_frequency":"monthly"}}"#
            ),
            date!(2024 - 01 - 01),
        );
        let template_id = Uuid::new_v4();
        occurrence.template_id = Some(template_id);
        occurrence.is_generated = true;

        let changes = request(&format!(
            r#"{{"creditor_id":"{CREDITOR}","name":"Internet","amount":"65","due_date":"2024-02-15"}}"#
        ))
        .into_update(&occurrence, date!(2024 - 02 - 01))
        .unwrap();
        assert_eq!(changes.template_id, Some(template_id));
        assert!(changes.is_generated);
    }

    #[test]
    fn paid_date_follows_paid_transitions_on_update() {
        let body_paid = format!(
            r#"{{"creditor_id":"{CREDITOR}","name":"Water","amount":"40",
                "due_date":"2024-03-10","is_paid":true}}"#
        );
        let body_unpaid = format!(
            r#"{{"creditor_id":"{CREDITOR}","name":"Water","amount":"40","due_date":"2024-03-10"}}"#
        );
        let today = date!(2024 - 03 - 20);

        // paid -> paid keeps the first paid date
        let paid = stored(&body_paid, date!(2024 - 03 - 05));
        let resaved = request(&body_paid).into_update(&paid, today).unwrap();
        assert_eq!(resaved.paid_date, Some(date!(2024 - 03 - 05)));

        // unpaid -> paid stamps today
        let unpaid = stored(&body_unpaid, date!(2024 - 03 - 05));
        let now_paid = request(&body_paid).into_update(&unpaid, today).unwrap();
        assert_eq!(now_paid.paid_date, Some(today));

        // paid -> unpaid clears it
        let cleared = request(&body_unpaid).into_update(&paid, today).unwrap();
        assert!(!cleared.is_paid);
        assert_eq!(cleared.paid_date, None);
    }

    #[test]
    fn status_filter_defaults_to_all() {
        let q: BillListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.status, StatusFilter::All);
        let q: BillListQuery = serde_json::from_str(r#"{"status":"overdue"}"#).unwrap();
        assert_eq!(q.status, StatusFilter::Overdue);
    }
}
