//! View-state controller for the admin report manager.
//!
//! Owns everything the report view shows and sequences user actions against a
//! [`ReportTransport`]. Each action clears the banners, marks the view as
//! loading, awaits its single transport call, and then reconciles the result.
//! Failures only touch the error banner; list, pagination and dialog state are
//! left as they were.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::models::{
    EmailReportRequest, GenerateReportRequest, OperationResult, Pagination, Report, ReportQuery,
    SavedArtifact,
};
use crate::transport::ReportTransport;

pub const REPORT_NAME_REQUIRED: &str = "Report name is required";
pub const RECIPIENT_REQUIRED: &str = "Recipient email is required";
pub const INVALID_START_DATE: &str = "Invalid start date";
pub const INVALID_END_DATE: &str = "Invalid end date";
pub const DATE_RANGE_INVERTED: &str = "Start date must be before end date";
pub const NO_EMAIL_TARGET: &str = "No report selected for email";

const FORM_DATE_FORMAT: &str = "%Y-%m-%d";

/// Form buffer of the "generate report" dialog. Dates are `YYYY-MM-DD`; blank
/// means not set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateForm {
    pub report_name: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateDialog {
    pub open: bool,
    pub form: GenerateForm,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmailForm {
    pub recipient_email: String,
    pub sender_email: String,
}

/// Report the email dialog was opened for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailTarget {
    pub report_id: i64,
    pub report_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmailDialog {
    pub open: bool,
    pub target: Option<EmailTarget>,
    pub form: EmailForm,
}

/// Everything the report view renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportViewState {
    pub reports: Vec<Report>,
    pub pagination: Option<Pagination>,
    pub current_page: u32,
    pub loading: bool,
    pub error: Option<String>,
    pub success: Option<String>,
    pub generate_dialog: GenerateDialog,
    pub email_dialog: EmailDialog,
}

impl Default for ReportViewState {
    fn default() -> Self {
        Self {
            reports: Vec::new(),
            pagination: None,
            current_page: 1,
            loading: false,
            error: None,
            success: None,
            generate_dialog: GenerateDialog::default(),
            email_dialog: EmailDialog::default(),
        }
    }
}

impl ReportViewState {
    fn clear_banners(&mut self) {
        self.error = None;
        self.success = None;
    }

    fn reject(&mut self, message: &str) {
        self.success = None;
        self.error = Some(message.to_string());
    }

    fn apply_banner<T>(&mut self, result: &OperationResult<T>) {
        if result.success {
            self.success = Some(result.message.clone());
        } else {
            self.error = Some(result.message.clone());
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    view: ReportViewState,
    in_flight: usize,
    latest_list_token: u64,
}

impl Inner {
    fn begin(&mut self, clear_banners: bool) {
        if clear_banners {
            self.view.clear_banners();
        }
        self.in_flight += 1;
        self.view.loading = true;
    }

    fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.view.loading = self.in_flight > 0;
    }
}

fn parse_form_date(raw: &str, invalid: &'static str) -> Result<Option<NaiveDate>, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, FORM_DATE_FORMAT)
        .map(Some)
        .map_err(|_| invalid)
}

impl GenerateForm {
    /// Validates the buffer into a request, or returns the banner text.
    pub fn to_request(&self) -> Result<GenerateReportRequest, &'static str> {
        let name = self.report_name.trim();
        if name.is_empty() {
            return Err(REPORT_NAME_REQUIRED);
        }
        let start = parse_form_date(&self.start_date, INVALID_START_DATE)?;
        let end = parse_form_date(&self.end_date, INVALID_END_DATE)?;
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(DATE_RANGE_INVERTED);
            }
        }
        Ok(GenerateReportRequest::new(name).with_range(start, end))
    }
}

impl EmailForm {
    pub fn to_request(&self) -> Result<EmailReportRequest, &'static str> {
        let recipient = self.recipient_email.trim();
        if recipient.is_empty() {
            return Err(RECIPIENT_REQUIRED);
        }
        let request = EmailReportRequest::new(recipient);
        let sender = self.sender_email.trim();
        Ok(if sender.is_empty() {
            request
        } else {
            request.with_sender(sender)
        })
    }
}

/// Drives the report view against a transport.
pub struct ReportController<T: ?Sized> {
    transport: Arc<T>,
    per_page: u32,
    inner: Mutex<Inner>,
}

impl<T> ReportController<T>
where
    T: ReportTransport + ?Sized,
{
    pub fn new(transport: Arc<T>, per_page: u32) -> Self {
        Self {
            transport,
            per_page: per_page.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Copy of the current view state.
    pub async fn snapshot(&self) -> ReportViewState {
        self.inner.lock().await.view.clone()
    }

    pub async fn dismiss_banners(&self) {
        self.inner.lock().await.view.clear_banners();
    }

    /// Fetches the page under the cursor, replacing the list on success.
    pub async fn load_reports(&self) -> OperationResult<()> {
        self.fetch_page(true).await
    }

    #[instrument(skip(self))]
    async fn fetch_page(&self, clear_banners: bool) -> OperationResult<()> {
        let (token, page) = {
            let mut inner = self.inner.lock().await;
            inner.latest_list_token += 1;
            inner.begin(clear_banners);
            (inner.latest_list_token, inner.view.current_page)
        };

        let result = self
            .transport
            .get_all_reports(ReportQuery::new(page, self.per_page))
            .await;

        let mut inner = self.inner.lock().await;
        inner.settle();
        if token != inner.latest_list_token {
            debug!(page, token, "Discarding stale report page");
            return result.map(|_| ());
        }

        if result.success {
            let listing = result.data.clone().unwrap_or_default();
            debug!(page, count = listing.reports.len(), "Applied report page");
            inner.view.reports = listing.reports;
            inner.view.pagination = listing.pagination;
        } else {
            warn!(page, "Report list fetch failed: {}", result.message);
            inner.view.error = Some(result.message.clone());
        }
        result.map(|_| ())
    }

    /// Moves the pagination cursor and refetches. Returns `None` when the page
    /// is unchanged or out of range, in which case nothing is fetched.
    pub async fn set_page(&self, page: u32) -> Option<OperationResult<()>> {
        {
            let mut inner = self.inner.lock().await;
            let view = &mut inner.view;
            let beyond_last = view
                .pagination
                .map(|p| page > p.pages.max(1))
                .unwrap_or(false);
            if page == 0 || page == view.current_page || beyond_last {
                debug!(page, current = view.current_page, "Ignoring page change");
                return None;
            }
            view.current_page = page;
        }
        Some(self.load_reports().await)
    }

    /// Advances one page unless the last known page is already shown.
    pub async fn next_page(&self) -> Option<OperationResult<()>> {
        let (current, pagination) = self.cursor().await;
        if pagination.is_some_and(|p| !p.has_next()) {
            return None;
        }
        self.set_page(current.saturating_add(1)).await
    }

    pub async fn previous_page(&self) -> Option<OperationResult<()>> {
        let (current, pagination) = self.cursor().await;
        if pagination.is_some_and(|p| !p.has_previous()) {
            return None;
        }
        self.set_page(current.saturating_sub(1)).await
    }

    async fn cursor(&self) -> (u32, Option<Pagination>) {
        let inner = self.inner.lock().await;
        (inner.view.current_page, inner.view.pagination)
    }

    pub async fn open_generate_dialog(&self) {
        self.inner.lock().await.view.generate_dialog.open = true;
    }

    pub async fn close_generate_dialog(&self) {
        self.inner.lock().await.view.generate_dialog = GenerateDialog::default();
    }

    pub async fn update_generate_form(&self, form: GenerateForm) {
        self.inner.lock().await.view.generate_dialog.form = form;
    }

    /// Submits the generate dialog. On success the dialog closes, its form is
    /// cleared and the current page is refetched.
    #[instrument(skip(self))]
    pub async fn submit_generate(&self) -> OperationResult<Report> {
        let request = {
            let mut inner = self.inner.lock().await;
            match inner.view.generate_dialog.form.to_request() {
                Ok(request) => {
                    inner.begin(true);
                    request
                }
                Err(message) => {
                    inner.view.reject(message);
                    return OperationResult::failure(message, None);
                }
            }
        };

        let result = self.transport.generate_report(request).await;

        {
            let mut inner = self.inner.lock().await;
            inner.settle();
            inner.view.apply_banner(&result);
            if result.success {
                inner.view.generate_dialog = GenerateDialog::default();
            }
        }

        if result.success {
            info!("Report generated; refreshing list");
            self.fetch_page(false).await;
        }
        result
    }

    pub async fn open_email_dialog(&self, report_id: i64, report_name: impl Into<String>) {
        self.inner.lock().await.view.email_dialog = EmailDialog {
            open: true,
            target: Some(EmailTarget {
                report_id,
                report_name: report_name.into(),
            }),
            form: EmailForm::default(),
        };
    }

    pub async fn close_email_dialog(&self) {
        self.inner.lock().await.view.email_dialog = EmailDialog::default();
    }

    pub async fn update_email_form(&self, form: EmailForm) {
        self.inner.lock().await.view.email_dialog.form = form;
    }

    /// Submits the email dialog for its target report.
    #[instrument(skip(self))]
    pub async fn submit_email(&self) -> OperationResult<()> {
        let (report_id, request) = {
            let mut inner = self.inner.lock().await;
            let dialog = &inner.view.email_dialog;
            let prepared = match &dialog.target {
                None => Err(NO_EMAIL_TARGET),
                Some(target) => dialog.form.to_request().map(|r| (target.report_id, r)),
            };
            match prepared {
                Ok(prepared) => {
                    inner.begin(true);
                    prepared
                }
                Err(message) => {
                    inner.view.reject(message);
                    return OperationResult::failure(message, None);
                }
            }
        };

        let result = self.transport.send_report_email(report_id, request).await;

        let mut inner = self.inner.lock().await;
        inner.settle();
        inner.view.apply_banner(&result);
        if result.success {
            inner.view.email_dialog = EmailDialog::default();
        }
        result
    }

    #[instrument(skip(self))]
    pub async fn download_pdf(
        &self,
        report_id: i64,
        report_name: &str,
    ) -> OperationResult<SavedArtifact> {
        self.inner.lock().await.begin(true);
        let result = self
            .transport
            .download_report_pdf(report_id, report_name)
            .await;
        self.settle_download(&result).await;
        result
    }

    #[instrument(skip(self))]
    pub async fn download_chart(
        &self,
        report_id: i64,
        chart_type: &str,
        report_name: &str,
    ) -> OperationResult<SavedArtifact> {
        self.inner.lock().await.begin(true);
        let result = self
            .transport
            .download_chart(report_id, chart_type, report_name)
            .await;
        self.settle_download(&result).await;
        result
    }

    async fn settle_download(&self, result: &OperationResult<SavedArtifact>) {
        let mut inner = self.inner.lock().await;
        inner.settle();
        inner.view.apply_banner(result);
    }
}
