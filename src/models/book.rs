//! Book model and related types.
//!
//! Every field except `name` is optional on input. Absent values are kept
//! absent and left out of the JSON output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Full book record as stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Opaque unique identifier, assigned at creation
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Total number of pages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<i64>,
    /// Pages read so far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_page: Option<i64>,
    /// `readPage == pageCount`, as of the write that last derived it
    pub finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading: Option<bool>,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short book representation for lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            name: book.name.clone(),
            publisher: book.publisher.clone(),
        }
    }
}

/// Create / update request body
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    /// Required
    pub name: Option<String>,
    pub year: Option<i32>,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    pub page_count: Option<i64>,
    pub read_page: Option<i64>,
    pub reading: Option<bool>,
}

/// Mutable book fields, after validation
#[derive(Debug, Clone, PartialEq)]
pub struct BookFields {
    pub name: String,
    pub year: Option<i32>,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    pub page_count: Option<i64>,
    pub read_page: Option<i64>,
    pub reading: Option<bool>,
}

impl BookFields {
    /// Two absent page values count as finished.
    pub fn finished(&self) -> bool {
        self.page_count == self.read_page
    }
}

/// Query parameters for listing books.
///
/// Built from the raw query pairs so that a repeated parameter keeps every
/// value instead of failing the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Case-insensitive substring of the book name
    pub name: Vec<String>,
    /// `1`/`true` or `0`/`false`
    pub reading: Vec<String>,
    /// `1`/`true` or `0`/`false`
    pub finished: Vec<String>,
}

impl FromIterator<(String, String)> for BookQuery {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut query = BookQuery::default();
        for (key, value) in pairs {
            match key.as_str() {
                "name" => query.name.push(value),
                "reading" => query.reading.push(value),
                "finished" => query.finished.push(value),
                _ => {}
            }
        }
        query
    }
}

/// The single filter applied by a list request.
///
/// Filters do not combine. When several query parameters are given, the
/// last one in the order `name`, `reading`, `finished` wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    All,
    /// Lowercased needle
    Name(String),
    Reading(bool),
    Finished(bool),
}

impl BookFilter {
    pub fn from_query(query: &BookQuery) -> Self {
        let mut filter = BookFilter::All;

        // last recognized value of each parameter
        if let Some(name) = query.name.iter().rev().find(|n| !n.is_empty()) {
            filter = BookFilter::Name(name.to_lowercase());
        }
        if let Some(reading) = query.reading.iter().rev().find_map(|v| parse_flag(v)) {
            filter = BookFilter::Reading(reading);
        }
        if let Some(finished) = query.finished.iter().rev().find_map(|v| parse_flag(v)) {
            filter = BookFilter::Finished(finished);
        }

        filter
    }

    pub fn matches(&self, book: &Book) -> bool {
        match self {
            BookFilter::All => true,
            BookFilter::Name(needle) => book.name.to_lowercase().contains(needle.as_str()),
            BookFilter::Reading(reading) => book.reading == Some(*reading),
            BookFilter::Finished(finished) => book.finished == *finished,
        }
    }
}

/// Unrecognized values are ignored, same as an absent parameter
fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
