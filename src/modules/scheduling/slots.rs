use time::{Date, Duration, OffsetDateTime, Time};

use crate::db::models::{AvailabilityRule, Booking};

/// Free slot start times for one calendar date, ascending.
///
/// Pure over its inputs: the weekly template, the day's bookings and the
/// clock all arrive as arguments. `now` must already be in the business
/// timezone, since "today" filtering compares wall-clock times.
///
/// A missing or inactive rule means the day is closed and yields an empty
/// grid; that is a result, not an error. Slots whose end would overflow
/// the window are dropped, and slots at or before `now` are dropped when
/// `date` is today.
pub fn compute_slots(
    date: Date,
    duration_minutes: i64,
    rules: &[AvailabilityRule],
    bookings: &[Booking],
    now: OffsetDateTime,
) -> Vec<Time> {
    if duration_minutes <= 0 {
        return Vec::new();
    }

    let day = i16::from(date.weekday().number_days_from_sunday());
    let Some(rule) = rules.iter().find(|rule| rule.day_of_week == day) else {
        return Vec::new();
    };
    if !rule.is_active {
        return Vec::new();
    }

    let window_start = minutes_from_midnight(rule.start_time);
    let window_end = minutes_from_midnight(rule.end_time);

    let mut slots = Vec::new();
    let mut at = window_start;
    while at + duration_minutes <= window_end {
        let slot = Time::MIDNIGHT + Duration::minutes(at);
        let taken = bookings.iter().any(|booking| {
            booking.scheduled_date == date
                && booking.scheduled_time == slot
                && booking.status.is_blocking()
        });
        let in_past = date == now.date() && slot <= now.time();
        if !taken && !in_past {
            slots.push(slot);
        }
        at += duration_minutes;
    }
    slots
}

fn minutes_from_midnight(time: Time) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}
