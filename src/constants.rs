/// Results page scraped when no URL is configured
pub const DEFAULT_SOURCE_URL: &str = "https://vringe.com/results/";

// Fallback strings substituted when a cell yields no text
pub const UNKNOWN_LOCATION: &str = "Unknown Location";
pub const UNKNOWN_FIGHTER: &str = "Unknown Fighter";
pub const PENDING_RESULT: &str = "TBD";

pub const ID_PREFIX: &str = "fight";

// Selectors describing the results table markup
pub const MONTH_SELECTOR: &str = "div.month";
pub const TABLE_SELECTOR: &str = "table";
pub const ROW_SELECTOR: &str = "tr";
pub const PLACE_CELL_SELECTOR: &str = "td.place";
pub const DATE_CELL_SELECTOR: &str = "td.date";
pub const FIGHTER1_CELL_SELECTOR: &str = "td.boxer_1";
pub const VS_CELL_SELECTOR: &str = "td.vs";
pub const FIGHTER2_CELL_SELECTOR: &str = "td.boxer_2";
pub const LINK_SELECTOR: &str = "a";

// Processing defaults
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;
pub const DEFAULT_ITEM_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_COLLECTION_TIMEOUT_SECS: u64 = 5;

/// Browser-like request headers sent with every page fetch.
pub const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
    ),
    ("accept-language", "ru,ru-RU;q=0.9,en-US;q=0.8,en;q=0.7"),
    ("cache-control", "max-age=0"),
    ("priority", "u=0, i"),
    ("referer", "https://www.google.com/"),
    (
        "sec-ch-ua",
        r#""Not)A;Brand";v="8", "Chromium";v="138", "Google Chrome";v="138""#,
    ),
    ("sec-ch-ua-mobile", "?1"),
    ("sec-ch-ua-platform", "\"Android\""),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "cross-site"),
    ("sec-fetch-user", "?1"),
    ("upgrade-insecure-requests", "1"),
    (
        "user-agent",
        "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Mobile Safari/537.36",
    ),
];
