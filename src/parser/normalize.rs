//! Text cleanup for the raw cell contents of the results table.
//!
//! Every function here is total: empty or malformed input degrades to a
//! fallback value instead of an error.

use crate::constants::{PENDING_RESULT, UNKNOWN_FIGHTER, UNKNOWN_LOCATION};
use crate::parser::selectors;
use chrono::{Duration, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::warn;

static HTML_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

const DATE_FORMAT: &str = "%Y-%m-%d";

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips comment markup, collapses whitespace and falls back to
/// "Unknown Location" when nothing is left.
pub fn clean_location(text: &str) -> String {
    let without_comments = HTML_COMMENT.replace_all(text, "");
    let cleaned = collapse_whitespace(&without_comments);

    if cleaned.is_empty() {
        UNKNOWN_LOCATION.to_string()
    } else {
        cleaned
    }
}

/// Fighter name from a `td.boxer_*` cell, or `None` if the cell has no name.
///
/// Link text wins when present. Otherwise the first line of the cell text is
/// used with any record annotation such as "(7-0, 6 KO)" cut off.
pub fn fighter_name(cell: ElementRef<'_>) -> Option<String> {
    if let Some(link) = cell.select(&selectors::LINK).next() {
        let link_text = link.text().collect::<String>();
        let link_text = link_text.trim();
        if !link_text.is_empty() {
            return Some(link_text.to_string());
        }
    }

    let full_text = cell.text().collect::<String>();
    let first_line = full_text.trim().lines().next().unwrap_or_default().trim();
    let name = match first_line.find('(') {
        Some(idx) => first_line[..idx].trim(),
        None => first_line,
    };

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Like [`fighter_name`] but substitutes "Unknown Fighter" for an empty cell.
pub fn extract_fighter_name(cell: ElementRef<'_>) -> String {
    fighter_name(cell).unwrap_or_else(|| UNKNOWN_FIGHTER.to_string())
}

/// Result text of a `td.vs` cell with whitespace collapsed, "TBD" if empty.
pub fn extract_result(cell: ElementRef<'_>) -> String {
    let text = collapse_whitespace(&cell.text().collect::<String>());
    if text.is_empty() {
        PENDING_RESULT.to_string()
    } else {
        text
    }
}

/// [`fighter_name`] over a cell's inner markup.
pub fn fighter_name_from_markup(markup: &str) -> Option<String> {
    let fragment = Html::parse_fragment(markup);
    fighter_name(fragment.root_element())
}

/// [`extract_result`] over a cell's inner markup.
pub fn result_from_markup(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    extract_result(fragment.root_element())
}

/// Resolves a bare day-of-month against `year`/`month` into YYYY-MM-DD.
///
/// Days past the end of the month roll into the following month. A token that
/// is not a number is replaced by today's date; the record is kept with a
/// wrong date rather than dropped.
pub fn format_date(day_token: &str, year: i32, month: u32) -> String {
    let day: i64 = match day_token.trim().parse() {
        Ok(day) => day,
        Err(e) => {
            warn!(token = %day_token, error = %e, "Error parsing day number, using today's date");
            return today();
        }
    };

    match resolve_day(year, month, day) {
        Some(date) => date.format(DATE_FORMAT).to_string(),
        None => {
            warn!(year, month, day, "Day is outside the representable calendar, using today's date");
            today()
        }
    }
}

fn resolve_day(year: i32, month: u32, day: i64) -> Option<NaiveDate> {
    let first_of_month = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = Duration::try_days(day.checked_sub(1)?)?;
    first_of_month.checked_add_signed(offset)
}

fn today() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}
