//! Calendar helpers for the rental period clause of a receipt.
//!
//! The clause reads "du {last day of previous month}/{previous month} au
//! {day before the last day of month}/{month}/{year}". Every helper returns `None`
//! when `month` is outside `1..=12`.

use chrono::{Datelike, NaiveDate};

fn days_in_month(month: u32, year: i32) -> Option<u32> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let (next_month, next_year) = if month == 12 { (1, year + 1) } else { (month + 1, year) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?
        .pred_opt()
        .map(|last| last.day())
}

fn previous_month(month: u32, year: i32) -> Option<(u32, i32)> {
    match month {
        1 => Some((12, year - 1)),
        2..=12 => Some((month - 1, year)),
        _ => None,
    }
}

/// Last day of the month before `month/year`, zero-padded.
pub fn last_day_of_previous_month(month: u32, year: i32) -> Option<String> {
    let (prev_month, prev_year) = previous_month(month, year)?;
    days_in_month(prev_month, prev_year).map(|day| format!("{day:02}"))
}

/// The month before `month/year` as `MM/YYYY`.
pub fn previous_month_formatted(month: u32, year: i32) -> Option<String> {
    previous_month(month, year).map(|(m, y)| format!("{m:02}/{y}"))
}

/// Last day of `month/year` minus one, zero-padded.
pub fn day_before_last_day_of_month(month: u32, year: i32) -> Option<String> {
    days_in_month(month, year).map(|day| format!("{:02}", day - 1))
}

/// `"{from} au {to}"` bounds of the rental period, e.g. `"31/07/2024 au 30/08/2024"`.
pub fn period_bounds(month: u32, year: i32) -> Option<(String, String)> {
    let from = format!(
        "{}/{}",
        last_day_of_previous_month(month, year)?,
        previous_month_formatted(month, year)?
    );
    let to = format!(
        "{}/{month:02}/{year}",
        day_before_last_day_of_month(month, year)?
    );
    Some((from, to))
}

/// Day/month/year as printed on French documents.
pub fn format_french_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
