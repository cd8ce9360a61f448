//! Walks the results tables and lifts fight rows out in document order.
//!
//! Tables interleave two kinds of rows: a `td.place` row naming the venue, and
//! fight rows (`td.date`, `td.boxer_1`, `td.vs`, `td.boxer_2`). A fight row
//! belongs to the closest venue row above it in the same table.

use crate::constants::UNKNOWN_LOCATION;
use crate::parser::normalize::{clean_location, fighter_name};
use crate::parser::selectors;
use crate::types::{ExtractedPage, FightCandidate, MonthContext};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::{debug, info};

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("valid year regex"));

const ENGLISH_MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

// Stems cover the nominative and genitive forms ("октябрь", "октября")
const RUSSIAN_MONTH_STEMS: [&str; 12] = [
    "январ", "феврал", "март", "апрел", "ма", "июн", "июл", "август", "сентябр", "октябр",
    "ноябр", "декабр",
];

enum RowKind<'a> {
    Location(String),
    Fight(FightCells<'a>),
    Other,
}

struct FightCells<'a> {
    date: ElementRef<'a>,
    fighter1: ElementRef<'a>,
    vs: ElementRef<'a>,
    fighter2: ElementRef<'a>,
}

/// Extract every fight candidate on the page along with the page's month
/// context.
pub fn extract_page(document: &Html) -> ExtractedPage {
    let context = month_context(document);

    let mut candidates = Vec::new();
    for (table_index, table) in document.select(&selectors::TABLE).enumerate() {
        let found = extract_table(table);
        debug!(table_index, count = found.len(), "Scanned table");
        candidates.extend(found);
    }

    ExtractedPage {
        context,
        candidates,
    }
}

/// Candidates from one table. The current location starts out unknown and is
/// replaced each time a venue row is passed.
fn extract_table(table: ElementRef<'_>) -> Vec<FightCandidate> {
    let (_, candidates) = table.select(&selectors::ROW).fold(
        (UNKNOWN_LOCATION.to_string(), Vec::new()),
        |(location, mut candidates), row| match classify_row(row) {
            RowKind::Location(next_location) => {
                info!("Found location: {}", next_location);
                (next_location, candidates)
            }
            RowKind::Fight(cells) => {
                if let Some(candidate) = build_candidate(&location, row, &cells) {
                    candidates.push(candidate);
                }
                (location, candidates)
            }
            RowKind::Other => (location, candidates),
        },
    );
    candidates
}

fn classify_row(row: ElementRef<'_>) -> RowKind<'_> {
    if let Some(place) = row.select(&selectors::PLACE_CELL).next() {
        return RowKind::Location(clean_location(&place.text().collect::<String>()));
    }

    let date = row.select(&selectors::DATE_CELL).next();
    let fighter1 = row.select(&selectors::FIGHTER1_CELL).next();
    let vs = row.select(&selectors::VS_CELL).next();
    let fighter2 = row.select(&selectors::FIGHTER2_CELL).next();

    match (date, fighter1, vs, fighter2) {
        (Some(date), Some(fighter1), Some(vs), Some(fighter2)) => RowKind::Fight(FightCells {
            date,
            fighter1,
            vs,
            fighter2,
        }),
        _ => RowKind::Other,
    }
}

/// `None` when either fighter cell has no usable name.
fn build_candidate(
    location: &str,
    row: ElementRef<'_>,
    cells: &FightCells<'_>,
) -> Option<FightCandidate> {
    let first = fighter_name(cells.fighter1)?;
    let second = fighter_name(cells.fighter2)?;
    let date_token = cells.date.text().collect::<String>().trim().to_string();

    debug!("Extracted fight: {} vs {} on day {} in {}", first, second, date_token, location);

    Some(FightCandidate {
        location: location.to_string(),
        date_token,
        fighter1: cells.fighter1.inner_html(),
        fighter2: cells.fighter2.inner_html(),
        result: cells.vs.inner_html(),
        row_html: row.html(),
    })
}

/// Month and year from the first `div.month` element, falling back to the
/// current month for anything it doesn't state.
pub fn month_context(document: &Html) -> MonthContext {
    let fallback = MonthContext::current();
    match document.select(&selectors::MONTH).next() {
        Some(element) => {
            let text = element.text().collect::<String>();
            info!("Found month context: {}", text.trim());
            parse_month_context(&text, fallback)
        }
        None => fallback,
    }
}

pub fn parse_month_context(text: &str, fallback: MonthContext) -> MonthContext {
    let lower = text.to_lowercase();
    let month = lower
        .split(|c: char| !c.is_alphabetic())
        .filter(|word| !word.is_empty())
        .find_map(month_from_word);
    let year = YEAR.find(&lower).and_then(|m| m.as_str().parse().ok());

    MonthContext::new(year.unwrap_or(fallback.year), month.unwrap_or(fallback.month))
}

fn month_from_word(word: &str) -> Option<u32> {
    let english = ENGLISH_MONTHS
        .iter()
        .position(|name| word.chars().count() >= 3 && name.starts_with(word));

    let russian = || {
        RUSSIAN_MONTH_STEMS.iter().position(|stem| match *stem {
            // "ма" alone would also match "март"
            "ма" => matches!(word, "май" | "мая" | "мае"),
            stem => word.starts_with(stem),
        })
    };

    english.or_else(russian).map(|idx| idx as u32 + 1)
}
