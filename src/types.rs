use crate::error::FightError;
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};

/// A fully normalized fight entry as served by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightRecord {
    pub id: String,
    /// YYYY-MM-DD
    pub date: String,
    pub fighter1: String,
    pub fighter2: String,
    pub result: String,
    pub location: String,
    /// RFC3339 timestamp of the conversion
    pub parsed_at: String,
}

/// A fight row lifted out of the page but not yet normalized.
///
/// Cell contents are kept as owned markup so the candidate can be moved into a
/// worker task; the worker re-parses them during conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FightCandidate {
    /// Location in effect when the row was scanned, already cleaned
    pub location: String,
    /// Bare day-of-month as found in the date cell
    pub date_token: String,
    pub fighter1: String,
    pub fighter2: String,
    pub result: String,
    /// Outer HTML of the originating row
    pub row_html: String,
}

/// Exactly one of these is produced per dispatched candidate.
pub type ProcessingOutcome = std::result::Result<FightRecord, FightError>;

/// Year and month applied to every bare day number on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthContext {
    pub year: i32,
    pub month: u32,
}

impl MonthContext {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// The current local year and month
    pub fn current() -> Self {
        let today = Local::now().date_naive();
        Self::new(today.year(), today.month())
    }
}

/// Output of the extraction stage: candidates in document order plus the
/// month context captured before row iteration.
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub context: MonthContext,
    pub candidates: Vec<FightCandidate>,
}
