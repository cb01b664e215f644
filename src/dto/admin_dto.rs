use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::responder::ResponderRow;
use crate::utils::flash::Flash;
use crate::utils::validation::{non_empty, sanitize_string, FieldErrors};

pub const PAGE_TITLE: &str = "Message Responder";
pub const VIEW_PAGE_TITLE: &str = "View  Message Responder";
pub const ADD_PAGE_TITLE: &str = "Add New Message Responder";
pub const EDIT_PAGE_TITLE: &str = "Edit  Message Responder";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResponderListQuery {
    pub search: Option<String>,
    pub orderby: Option<String>,
    pub ordertype: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DeleteQuery {
    pub csrf_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
#[serde(default)]
pub struct AddResponderForm {
    #[validate(required(message = "text_recieved is required"))]
    pub text_recieved: Option<String>,
    #[validate(required(message = "response_by_bot is required"))]
    pub response_by_bot: Option<String>,
    #[validate(
        required(message = "botid is required"),
        custom(function = "crate::utils::validation::validate_numeric")
    )]
    pub botid: Option<String>,
}

impl AddResponderForm {
    /// Trims every value and drops the empty ones; run before validation.
    pub fn normalized(self) -> Self {
        Self {
            text_recieved: non_empty(self.text_recieved),
            response_by_bot: non_empty(self.response_by_bot),
            botid: non_empty(self.botid),
        }
    }

    /// Strips markup from the free-text fields of an already validated form.
    pub fn sanitized(self) -> Self {
        Self {
            text_recieved: self.text_recieved.map(|v| sanitize_string(&v)),
            response_by_bot: self.response_by_bot.map(|v| sanitize_string(&v)),
            botid: self.botid,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
#[serde(default)]
pub struct EditResponderForm {
    #[validate(required(message = "text_recieved is required"))]
    pub text_recieved: Option<String>,
    #[validate(required(message = "response_by_bot is required"))]
    pub response_by_bot: Option<String>,
}

impl EditResponderForm {
    pub fn normalized(self) -> Self {
        Self {
            text_recieved: non_empty(self.text_recieved),
            response_by_bot: non_empty(self.response_by_bot),
        }
    }

    pub fn sanitized(self) -> Self {
        Self {
            text_recieved: self.text_recieved.map(|v| sanitize_string(&v)),
            response_by_bot: self.response_by_bot.map(|v| sanitize_string(&v)),
        }
    }
}

/// Inline single-field update.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EditFieldPayload {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditFieldResponse {
    pub num_rows: u64,
    pub rec_id: String,
}

/// Layout hints the panel's print/export views use.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub report_filename: String,
    pub report_title: String,
    pub report_layout: String,
    pub report_paper_size: String,
    pub report_orientation: String,
}

impl ReportMeta {
    pub fn new(title: &str, date: chrono::NaiveDate) -> Self {
        Self {
            report_filename: format!("{}-{}", date.format("%Y-%m-%d"), title),
            report_title: title.to_string(),
            report_layout: "report_layout".to_string(),
            report_paper_size: "A4".to_string(),
            report_orientation: "portrait".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponderListPage {
    pub page_title: String,
    pub records: Vec<ResponderRow>,
    pub record_count: usize,
    pub total_records: i64,
    pub total_page: i64,
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub flash: Option<Flash>,
    pub csrf_token: String,
    pub report: ReportMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponderViewPage {
    pub page_title: String,
    pub record: ResponderRow,
    pub csrf_token: String,
    pub report: ReportMeta,
}

/// Add/edit form state: current values plus any field-level errors.
#[derive(Debug, Clone, Serialize)]
pub struct ResponderFormPage<T: Serialize> {
    pub page_title: String,
    pub rec_id: Option<i64>,
    pub values: T,
    pub errors: FieldErrors,
    pub csrf_token: String,
}
