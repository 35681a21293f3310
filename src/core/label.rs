use crate::domain::model::{PeriodKind, ReleaseLabel};
use crate::utils::error::{ReleaseError, Result};
use chrono::Datelike;

pub const MAX_MONTH: u32 = 12;
pub const MAX_WEEK: u32 = 52;

/// Builds release labels against a configured year allow-list.
///
/// Month and week labels always use the current calendar year, so only this
/// year's monthly or weekly releases can be labelled.
#[derive(Debug, Clone)]
pub struct LabelFormatter {
    allowed_years: Vec<i32>,
}

impl LabelFormatter {
    pub fn new(allowed_years: Vec<i32>) -> Self {
        Self { allowed_years }
    }

    pub fn format(&self, kind: PeriodKind, value: u32) -> Result<ReleaseLabel> {
        let current_year = chrono::Local::now().year();
        self.format_for_year(kind, value, current_year)
    }

    pub fn format_for_year(
        &self,
        kind: PeriodKind,
        value: u32,
        current_year: i32,
    ) -> Result<ReleaseLabel> {
        format_label(kind, value, &self.allowed_years, current_year)
    }
}

pub fn format_label(
    kind: PeriodKind,
    value: u32,
    allowed_years: &[i32],
    current_year: i32,
) -> Result<ReleaseLabel> {
    let label = match kind {
        PeriodKind::Year => {
            let allowed = i32::try_from(value)
                .map(|year| allowed_years.contains(&year))
                .unwrap_or(false);
            if !allowed {
                return Err(invalid_period(
                    kind,
                    value,
                    format!("year must be one of {:?}", allowed_years),
                ));
            }
            format!("RY.{}", value)
        }
        PeriodKind::Month => {
            if !(1..=MAX_MONTH).contains(&value) {
                return Err(invalid_period(
                    kind,
                    value,
                    format!("month must be between 1 and {}", MAX_MONTH),
                ));
            }
            format!("RM.{}.{:02}", current_year, value)
        }
        PeriodKind::Week => {
            if !(1..=MAX_WEEK).contains(&value) {
                return Err(invalid_period(
                    kind,
                    value,
                    format!("week must be between 1 and {}", MAX_WEEK),
                ));
            }
            format!("RW.{}.{:02}", current_year, value)
        }
    };

    tracing::debug!("Formatted {} label {}", kind, label);
    Ok(ReleaseLabel::new(label))
}

fn invalid_period(kind: PeriodKind, value: u32, reason: String) -> ReleaseError {
    ReleaseError::InvalidPeriod {
        kind: kind.as_str().to_string(),
        value,
        reason,
    }
}
