use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Row of the admin panel's `message_responder` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ResponderRow {
    pub id: i64,
    pub text_recieved: String,
    pub response_by_bot: String,
    pub botid: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResponder {
    pub text_recieved: String,
    pub response_by_bot: String,
    pub botid: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponderChanges {
    pub text_recieved: Option<String>,
    pub response_by_bot: Option<String>,
}

/// Columns the admin surface may filter, search or sort on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderField {
    Id,
    TextRecieved,
    ResponseByBot,
    BotId,
}

impl ResponderField {
    pub const ALL: [ResponderField; 4] = [
        ResponderField::Id,
        ResponderField::TextRecieved,
        ResponderField::ResponseByBot,
        ResponderField::BotId,
    ];

    pub fn column(self) -> &'static str {
        match self {
            ResponderField::Id => "id",
            ResponderField::TextRecieved => "text_recieved",
            ResponderField::ResponseByBot => "response_by_bot",
            ResponderField::BotId => "botid",
        }
    }

    /// Value of this column rendered as text, the form filters compare against.
    pub fn value_of(self, row: &ResponderRow) -> String {
        match self {
            ResponderField::Id => row.id.to_string(),
            ResponderField::TextRecieved => row.text_recieved.clone(),
            ResponderField::ResponseByBot => row.response_by_bot.clone(),
            ResponderField::BotId => row.botid.to_string(),
        }
    }
}

impl fmt::Display for ResponderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for ResponderField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_prefix("message_responder.").unwrap_or(name);
        ResponderField::ALL
            .into_iter()
            .find(|field| field.column().eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("Unknown field '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(format!("Invalid sort direction '{}'", s)),
        }
    }
}

/// A fully resolved list query, already whitelisted and paginated.
#[derive(Debug, Clone)]
pub struct ResponderQuery {
    pub search: Option<String>,
    pub order_by: ResponderField,
    pub direction: SortDirection,
    pub field_filter: Option<(ResponderField, String)>,
    pub allowed_texts: Option<Vec<String>>,
    pub bot_id: Option<i64>,
    /// `None` returns every matching row (report export).
    pub limit: Option<i64>,
    pub offset: i64,
}

/// One page of rows plus the unpaginated match count.
#[derive(Debug, Clone, Default)]
pub struct ResponderPage {
    pub rows: Vec<ResponderRow>,
    pub total: i64,
}
