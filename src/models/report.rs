use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;

/// Server-generated sales report. The client never mutates one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    #[serde(alias = "report_name")]
    pub name: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub total_orders: i64,
    #[serde(default)]
    pub total_revenue: f64,
    #[serde(default)]
    pub generated_at: Option<String>,
}

/// Pagination block of a report list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub pages: u32,
    pub current_page: u32,
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.current_page < self.pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

/// One page of reports. Rebuilt on every fetch, never merged with another page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportListing {
    pub reports: Vec<Report>,
    pub pagination: Option<Pagination>,
}

/// Page cursor for the report list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportQuery {
    pub page: u32,
    pub per_page: u32,
}

impl ReportQuery {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

/// Body of `POST /admin/reports`. Absent dates are left out of the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateReportRequest {
    pub report_name: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_canonical_date"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_canonical_date"
    )]
    pub end_date: Option<NaiveDate>,
}

impl GenerateReportRequest {
    pub fn new(report_name: impl Into<String>) -> Self {
        Self {
            report_name: report_name.into(),
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_range(
        mut self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }
}

/// Body of `POST /admin/reports/{id}/email`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailReportRequest {
    pub recipient_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_email: Option<String>,
}

impl EmailReportRequest {
    pub fn new(recipient_email: impl Into<String>) -> Self {
        Self {
            recipient_email: recipient_email.into(),
            sender_email: None,
        }
    }

    pub fn with_sender(mut self, sender_email: impl Into<String>) -> Self {
        self.sender_email = Some(sender_email.into());
        self
    }
}

/// A downloaded PDF or chart image that has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedArtifact {
    pub filename: String,
    pub path: PathBuf,
    pub bytes: usize,
}

/// Midnight UTC of `date`, in the millisecond ISO-8601 form the backend expects.
pub fn canonical_timestamp(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN)
        .and_utc()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

fn serialize_canonical_date<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(date) => serializer.serialize_str(&canonical_timestamp(*date)),
        None => serializer.serialize_none(),
    }
}
