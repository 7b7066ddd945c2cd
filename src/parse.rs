use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

/// A ranking entry's identifier. The API hands out both numbers and strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub color: String,
}

#[derive(Deserialize)]
struct Listing {
    rankings: ListingRankings,
}

#[derive(Deserialize)]
struct ListingRankings {
    data: Vec<Entry>,
}

#[derive(Deserialize)]
struct Entry {
    id: RecordId,
    model: Model,
}

#[derive(Deserialize)]
struct Model {
    color: String,
}

#[derive(Deserialize)]
struct PageCount {
    rankings: PageCountRankings,
}

#[derive(Deserialize)]
struct PageCountRankings {
    last_page: u32,
}

/// Extracts the `(id, color)` records from `rankings.data`, in listing order.
pub fn parse_records(body: Value) -> Result<Vec<Record>> {
    let listing: Listing = serde_json::from_value(body)?;
    let records = listing
        .rankings
        .data
        .into_iter()
        .map(|entry| Record {
            id: entry.id,
            color: entry.model.color,
        })
        .collect();
    Ok(records)
}

/// Reads `rankings.last_page`. A missing or malformed value is fatal for the run.
pub fn parse_total_pages(body: &Value) -> Result<u32> {
    let count = PageCount::deserialize(body).map_err(Error::PageCount)?;
    Ok(count.rankings.last_page)
}
