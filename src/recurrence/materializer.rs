use serde::Serialize;
use time::Date;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::{BillStore, Horizon, Series, SeriesMatch};
use crate::bills::repo_types::{Bill, NewBill};
use crate::config::RecurrenceConfig;

/// Outcome of one generator run. The run itself never fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaterializeReport {
    pub templates: usize,
    pub created: u64,
    pub skipped_existing: usize,
    pub failed_templates: usize,
}

/// Projects recurring templates forward and inserts the missing occurrences.
#[derive(Debug, Clone, Copy)]
pub struct RecurringMaterializer {
    horizon: Horizon,
    series_match: SeriesMatch,
}

struct Plan {
    staged: Vec<NewBill>,
    skipped_existing: usize,
}

impl RecurringMaterializer {
    pub fn new(horizon: Horizon, series_match: SeriesMatch) -> Self {
        Self {
            horizon,
            series_match,
        }
    }

    pub fn from_config(cfg: &RecurrenceConfig) -> Self {
        Self::new(cfg.horizon, cfg.series_match)
    }

    /// Ensures every occurrence of each of `user_id`'s templates exists up to
    /// the horizon measured from `today`. Store errors are logged per template
    /// and the run moves on to the next one.
    #[instrument(skip(self, store), fields(horizon_months = self.horizon.months()))]
    pub async fn materialize<S>(&self, store: &S, user_id: Uuid, today: Date) -> MaterializeReport
    where
        S: BillStore + ?Sized,
    {
        let mut report = MaterializeReport::default();

        let templates = match store.recurring_templates(user_id).await {
            Ok(t) => t,
            Err(e) => {
                error!(error = %e, "load recurring templates failed");
                return report;
            }
        };
        if templates.is_empty() {
            debug!("no recurring templates");
            return report;
        }

        let horizon_end = self.horizon.end_date(today);
        for template in &templates {
            report.templates += 1;

            let plan = match self.plan(store, template, horizon_end).await {
                Ok(plan) => plan,
                Err(e) => {
                    warn!(error = %e, template_id = %template.id, "skipping recurring template");
                    report.failed_templates += 1;
                    continue;
                }
            };
            report.skipped_existing += plan.skipped_existing;

            if plan.staged.is_empty() {
                continue;
            }
            match store.insert_bills(&plan.staged).await {
                Ok(n) => {
                    debug!(template_id = %template.id, inserted = n, "occurrences inserted");
                    report.created += n;
                }
                Err(e) => {
                    error!(
                        error = %e,
                        template_id = %template.id,
                        staged = plan.staged.len(),
                        "insert occurrences failed"
                    );
                    report.failed_templates += 1;
                }
            }
        }

        info!(
            templates = report.templates,
            created = report.created,
            skipped_existing = report.skipped_existing,
            failed_templates = report.failed_templates,
            %horizon_end,
            "recurring bills materialized"
        );
        report
    }

    async fn plan<S>(&self, store: &S, template: &Bill, horizon_end: Date) -> anyhow::Result<Plan>
    where
        S: BillStore + ?Sized,
    {
        anyhow::ensure!(template.is_template(), "bill {} is not a recurring template", template.id);
        let Some(frequency) = template.recurrence_frequency else {
            anyhow::bail!("recurring bill has no frequency");
        };
        let series = Series::of(template, self.series_match);
        let preferred_day = template.due_date.day();

        let mut anchor = store
            .latest_due_date(&series)
            .await?
            .unwrap_or(template.due_date);

        let mut plan = Plan {
            staged: Vec::new(),
            skipped_existing: 0,
        };
        while let Some(next) = frequency.advance(anchor, preferred_day) {
            if next > horizon_end {
                break;
            }
            anchor = next;

            let exists = match store.occurrence_exists(&series, next).await {
                Ok(exists) => exists,
                Err(e) => {
                    // Unknown counts as missing; a duplicate beats a silent gap.
                    warn!(error = %e, template_id = %template.id, due_date = %next, "occurrence check failed");
                    false
                }
            };
            if exists {
                plan.skipped_existing += 1;
            } else {
                plan.staged.push(NewBill::occurrence_of(template, next));
            }
        }
        Ok(plan)
    }
}
