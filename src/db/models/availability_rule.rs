use serde::{Deserialize, Serialize};
use time::macros::time;
use time::Time;

use super::hhmm;

pub const DAYS_PER_WEEK: usize = 7;

/// One weekday of the recurring template. `day_of_week` is 0-based with
/// Sunday = 0, matching what the dashboard sends.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRule {
    pub day_of_week: i16,
    #[serde(with = "hhmm")]
    pub start_time: Time,
    #[serde(with = "hhmm")]
    pub end_time: Time,
    pub is_active: bool,
}

/// Default skeleton: Monday to Friday, 09:00-17:00, weekend closed.
pub fn default_week() -> Vec<AvailabilityRule> {
    (0..DAYS_PER_WEEK as i16)
        .map(|day| AvailabilityRule {
            day_of_week: day,
            start_time: time!(09:00),
            end_time: time!(17:00),
            is_active: (1..=5).contains(&day),
        })
        .collect()
}

/// Materializes exactly one rule per weekday, filling gaps with the
/// default skeleton. Total over any input set.
pub fn normalize(rules: &[AvailabilityRule]) -> Vec<AvailabilityRule> {
    default_week()
        .into_iter()
        .map(|fallback| {
            rules
                .iter()
                .find(|rule| rule.day_of_week == fallback.day_of_week)
                .cloned()
                .unwrap_or(fallback)
        })
        .collect()
}

/// A replacement set must cover all 7 days exactly once, and active days
/// need a non-empty window.
pub fn validate_week(rules: &[AvailabilityRule]) -> Result<(), String> {
    if rules.len() != DAYS_PER_WEEK {
        return Err(format!(
            "Expected exactly {DAYS_PER_WEEK} rules, got {}",
            rules.len()
        ));
    }
    let mut seen = [false; DAYS_PER_WEEK];
    for rule in rules {
        let day = usize::try_from(rule.day_of_week)
            .ok()
            .filter(|day| *day < DAYS_PER_WEEK)
            .ok_or_else(|| format!("dayOfWeek out of range: {}", rule.day_of_week))?;
        if seen[day] {
            return Err(format!("Duplicate rule for dayOfWeek {}", rule.day_of_week));
        }
        seen[day] = true;
        if rule.is_active && rule.start_time >= rule.end_time {
            return Err(format!(
                "startTime must precede endTime on active dayOfWeek {}",
                rule.day_of_week
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_week_covers_business_days() {
        let week = default_week();
        assert_eq!(week.len(), 7);
        assert!(!week[0].is_active, "Sunday is closed by default");
        assert!(!week[6].is_active, "Saturday is closed by default");
        assert!(week[1..=5].iter().all(|rule| rule.is_active));
    }

    #[test]
    fn normalize_fills_missing_days_with_defaults() {
        let custom = AvailabilityRule {
            day_of_week: 3,
            start_time: time!(10:00),
            end_time: time!(14:00),
            is_active: true,
        };
        let week = normalize(&[custom.clone()]);
        assert_eq!(week.len(), 7);
        assert_eq!(week[3], custom);
        assert_eq!(week[2], default_week()[2]);
    }

    #[test]
    fn normalize_of_empty_input_is_the_skeleton() {
        assert_eq!(normalize(&[]), default_week());
    }

    #[test]
    fn validate_week_rejects_incomplete_sets() {
        let mut week = default_week();
        week.pop();
        assert!(validate_week(&week).is_err());
    }

    #[test]
    fn validate_week_rejects_duplicate_days() {
        let mut week = default_week();
        week[0].day_of_week = 1;
        assert!(validate_week(&week).is_err());
    }

    #[test]
    fn validate_week_rejects_inverted_window_on_active_day() {
        let mut week = default_week();
        week[2].start_time = time!(18:00);
        assert!(validate_week(&week).is_err());

        // An inactive day may carry any window, it yields no slots anyway.
        week[2].is_active = false;
        assert!(validate_week(&week).is_ok());
    }
}
