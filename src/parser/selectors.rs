use crate::constants::{
    DATE_CELL_SELECTOR, FIGHTER1_CELL_SELECTOR, FIGHTER2_CELL_SELECTOR, LINK_SELECTOR,
    MONTH_SELECTOR, PLACE_CELL_SELECTOR, ROW_SELECTOR, TABLE_SELECTOR, VS_CELL_SELECTOR,
};
use once_cell::sync::Lazy;
use scraper::Selector;

fn compile(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

pub(crate) static MONTH: Lazy<Selector> = Lazy::new(|| compile(MONTH_SELECTOR));
pub(crate) static TABLE: Lazy<Selector> = Lazy::new(|| compile(TABLE_SELECTOR));
pub(crate) static ROW: Lazy<Selector> = Lazy::new(|| compile(ROW_SELECTOR));
pub(crate) static PLACE_CELL: Lazy<Selector> = Lazy::new(|| compile(PLACE_CELL_SELECTOR));
pub(crate) static DATE_CELL: Lazy<Selector> = Lazy::new(|| compile(DATE_CELL_SELECTOR));
pub(crate) static FIGHTER1_CELL: Lazy<Selector> = Lazy::new(|| compile(FIGHTER1_CELL_SELECTOR));
pub(crate) static VS_CELL: Lazy<Selector> = Lazy::new(|| compile(VS_CELL_SELECTOR));
pub(crate) static FIGHTER2_CELL: Lazy<Selector> = Lazy::new(|| compile(FIGHTER2_CELL_SELECTOR));
pub(crate) static LINK: Lazy<Selector> = Lazy::new(|| compile(LINK_SELECTOR));
