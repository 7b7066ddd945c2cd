//! RANKING SCRAPER
//! Pulls every page of a paginated ranking API in bounded concurrent batches
//! and appends `(id, color)` rows to a CSV file.

mod macros;

pub mod backoff;
pub mod buffer;
pub mod config;
pub mod error;
pub mod logging;
pub mod parse;
pub mod process;
pub mod progress;
pub mod request;
pub mod rotation;
pub mod sink;

pub use config::Config;
pub use error::{Error, Result};

const BASE_URL: &str = "https://api.jbzd.com.pl/ranking/get";
const PER_PAGE: u32 = 50;
/// How many pages worth of records are buffered before writing to disk.
const MEMORY_BATCH: usize = 100;
const CONCURRENT_REQUESTS: usize = 10;
const REQUEST_TIMEOUT_SECS: u64 = 10;
const CSV_FILE: &str = "jbzd_users_colors.csv";
const LOG_FILE: &str = "jbzd_scraper_log.txt";
const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.5845.96 Safari/537.36",
];
