//! Report transport: one HTTP request per admin report operation, every
//! outcome folded into an [`OperationResult`].

use async_trait::async_trait;

use crate::models::{
    EmailReportRequest, GenerateReportRequest, Order, OperationResult, Report, ReportListing,
    ReportQuery, SavedArtifact, User,
};

pub mod artifacts;
pub mod http;

pub use self::artifacts::{chart_filename, pdf_filename, ArtifactSink, DirectorySink};
pub use self::http::HttpReportClient;

pub const GENERATE_FAILED: &str = "Failed to generate report";
pub const LIST_FAILED: &str = "Failed to fetch reports";
pub const DOWNLOAD_REPORT_FAILED: &str = "Failed to download report";
pub const DOWNLOAD_CHART_FAILED: &str = "Failed to download chart";
pub const EMAIL_FAILED: &str = "Failed to send email";
pub const USERS_FAILED: &str = "Failed to fetch users";
pub const ORDERS_FAILED: &str = "Failed to fetch orders";

/// Backend report operations as seen by the view-state controller.
///
/// Implementations never panic or return errors: network failures, non-OK
/// statuses and unreadable bodies all come back as `success == false`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportTransport: Send + Sync {
    /// `POST /admin/reports`
    async fn generate_report(&self, request: GenerateReportRequest) -> OperationResult<Report>;

    /// `GET /admin/reports?page=&per_page=`
    async fn get_all_reports(&self, query: ReportQuery) -> OperationResult<ReportListing>;

    /// `GET /admin/reports/{id}/download`, saved as `{name}_{id}.pdf`
    async fn download_report_pdf(
        &self,
        report_id: i64,
        report_name: &str,
    ) -> OperationResult<SavedArtifact>;

    /// `GET /admin/reports/{id}/charts/{chart_type}`, saved as
    /// `{chart_type}_chart_{name}_{id}.png`
    async fn download_chart(
        &self,
        report_id: i64,
        chart_type: &str,
        report_name: &str,
    ) -> OperationResult<SavedArtifact>;

    /// `POST /admin/reports/{id}/email`
    async fn send_report_email(
        &self,
        report_id: i64,
        request: EmailReportRequest,
    ) -> OperationResult<()>;
}

/// Read-only admin collections backing the dashboard tables.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// `GET /admin/users`
    async fn fetch_users(&self) -> OperationResult<Vec<User>>;

    /// `GET /admin/orders`
    async fn fetch_orders(&self) -> OperationResult<Vec<Order>>;
}
