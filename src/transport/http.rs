use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::artifacts::{chart_filename, pdf_filename, ArtifactSink, DirectorySink};
use super::{
    AdminDirectory, ReportTransport, DOWNLOAD_CHART_FAILED, DOWNLOAD_REPORT_FAILED, EMAIL_FAILED,
    GENERATE_FAILED, LIST_FAILED, ORDERS_FAILED, USERS_FAILED,
};
use crate::config::ClientConfig;
use crate::errors::TransportError;
use crate::models::{
    EmailReportRequest, GenerateReportRequest, Order, OperationResult, Pagination, Report,
    ReportListing, ReportQuery, SavedArtifact, User,
};

const GENERATED: &str = "Report generated successfully";
const LISTED: &str = "Reports loaded";
const EMAILED: &str = "Report sent successfully";

/// Raw list response; every field may be missing.
#[derive(Debug, Deserialize)]
struct ReportListBody {
    #[serde(default)]
    reports: Option<Vec<Report>>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    pages: Option<u32>,
    #[serde(default)]
    current_page: Option<u32>,
}

impl ReportListBody {
    fn into_listing(self, per_page: u32) -> ReportListing {
        let pagination = match (self.total, self.pages, self.current_page) {
            (Some(total), Some(pages), Some(current_page)) => Some(Pagination {
                total,
                pages,
                current_page,
            }),
            _ => None,
        };

        let mut reports = self.reports.unwrap_or_default();
        if reports.len() > per_page as usize {
            warn!(
                received = reports.len(),
                per_page, "Backend returned more reports than requested; truncating"
            );
            reports.truncate(per_page as usize);
        }

        ReportListing {
            reports,
            pagination,
        }
    }
}

/// Confirmation body sent by the email and generate endpoints.
#[derive(Debug, Default, Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

/// Admin collections arrive either wrapped (`{"users": [...]}`) or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Collection<T> {
    Wrapped {
        #[serde(alias = "users", alias = "orders")]
        items: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<T> Collection<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Collection::Wrapped { items } => items,
            Collection::Bare(items) => items,
        }
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, TransportError> {
    serde_json::from_slice(body).map_err(|e| TransportError::Decode(e.to_string()))
}

fn non_blank(message: Option<String>) -> Option<String> {
    message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

/// reqwest-backed client for the storefront admin API.
#[derive(Clone)]
pub struct HttpReportClient {
    client: Client,
    base_url: Url,
    sink: Arc<dyn ArtifactSink>,
}

impl HttpReportClient {
    /// Builds a client from configuration, saving downloads into
    /// `config.download_dir`.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = config.session_cookie.as_deref() {
            let value = HeaderValue::from_str(cookie).map_err(|_| {
                TransportError::validation("session cookie contains invalid characters")
            })?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .cookie_store(true)
            .default_headers(headers)
            .build()?;

        Self::with_client(
            config,
            client,
            Arc::new(DirectorySink::new(config.download_dir())),
        )
    }

    /// Build a client from an existing reqwest client and sink (useful for testing).
    pub fn with_client(
        config: &ClientConfig,
        client: Client,
        sink: Arc<dyn ArtifactSink>,
    ) -> Result<Self, TransportError> {
        let base_url = Url::parse(config.api_base_url())?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::validation(format!(
                "API base URL {} cannot carry a path",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            sink,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client.request(method, self.endpoint(segments))
    }

    /// Sends the request and returns the body of a successful response. A
    /// non-OK body is only inspected for an error message.
    async fn execute(&self, request: RequestBuilder) -> Result<Bytes, TransportError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(TransportError::status(status, &body));
        }
        Ok(body)
    }

    #[instrument(skip(self), fields(report_name = %request.report_name))]
    async fn try_generate_report(
        &self,
        request: GenerateReportRequest,
    ) -> Result<(Option<Report>, String), TransportError> {
        if request.report_name.trim().is_empty() {
            return Err(TransportError::validation("Report name is required"));
        }

        let body = self
            .execute(
                self.request(Method::POST, &["admin", "reports"])
                    .json(&request),
            )
            .await?;

        let value: serde_json::Value = decode(&body)?;
        let message = non_blank(
            value
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_owned),
        )
        .unwrap_or_else(|| GENERATED.to_string());
        // Either `{"report": {...}}` or the report itself at the top level.
        let report = match value.get("report").or_else(|| value.get("id").map(|_| &value)) {
            Some(raw) => Some(serde_json::from_value::<Report>(raw.clone()).map_err(|e| {
                warn!("Generated report in response is unreadable: {}", e);
                TransportError::Decode(e.to_string())
            })?),
            None => None,
        };

        info!(report_id = report.as_ref().map(|r| r.id), "Report generated");
        Ok((report, message))
    }

    #[instrument(skip(self))]
    async fn try_get_all_reports(
        &self,
        query: ReportQuery,
    ) -> Result<ReportListing, TransportError> {
        let page = query.page.max(1);
        let per_page = query.per_page.max(1);

        let body = self
            .execute(
                self.request(Method::GET, &["admin", "reports"])
                    .query(&[("page", page), ("per_page", per_page)]),
            )
            .await?;

        let listing = decode::<ReportListBody>(&body)?.into_listing(per_page);
        debug!(
            count = listing.reports.len(),
            has_pagination = listing.pagination.is_some(),
            "Fetched report page"
        );
        Ok(listing)
    }

    async fn download(
        &self,
        segments: &[&str],
        filename: String,
    ) -> Result<SavedArtifact, TransportError> {
        let body = self.execute(self.request(Method::GET, segments)).await?;
        let saved = self
            .sink
            .save(&filename, body)
            .await
            .map_err(|source| TransportError::Io {
                filename: filename.clone(),
                source,
            })?;

        info!(
            filename = %saved.filename,
            bytes = saved.bytes,
            path = %saved.path.display(),
            "Saved artifact"
        );
        Ok(saved)
    }

    #[instrument(skip(self))]
    async fn try_download_report_pdf(
        &self,
        report_id: i64,
        report_name: &str,
    ) -> Result<SavedArtifact, TransportError> {
        let id = report_id.to_string();
        self.download(
            &["admin", "reports", &id, "download"],
            pdf_filename(report_id, report_name),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn try_download_chart(
        &self,
        report_id: i64,
        chart_type: &str,
        report_name: &str,
    ) -> Result<SavedArtifact, TransportError> {
        let id = report_id.to_string();
        self.download(
            &["admin", "reports", &id, "charts", chart_type],
            chart_filename(report_id, chart_type, report_name),
        )
        .await
    }

    #[instrument(skip(self, request))]
    async fn try_send_report_email(
        &self,
        report_id: i64,
        request: EmailReportRequest,
    ) -> Result<String, TransportError> {
        if request.recipient_email.trim().is_empty() {
            return Err(TransportError::validation("Recipient email is required"));
        }

        let id = report_id.to_string();
        let body = self
            .execute(
                self.request(Method::POST, &["admin", "reports", &id, "email"])
                    .json(&request),
            )
            .await?;

        let parsed: MessageBody = decode(&body)?;
        Ok(non_blank(parsed.message).unwrap_or_else(|| EMAILED.to_string()))
    }

    async fn fetch_collection<T: DeserializeOwned>(
        &self,
        resource: &str,
    ) -> Result<Vec<T>, TransportError> {
        let body = self
            .execute(self.request(Method::GET, &["admin", resource]))
            .await?;
        Ok(decode::<Collection<T>>(&body)?.into_vec())
    }
}

/// Logs a failed operation and folds it into a failure result.
fn fail<T>(operation: &str, err: TransportError, fallback: &str) -> OperationResult<T> {
    match &err {
        TransportError::Validation(msg) => debug!(operation, "Rejected before sending: {}", msg),
        TransportError::Status { status, .. } if *status == StatusCode::UNAUTHORIZED => {
            warn!(operation, "Admin session rejected by backend")
        }
        e if e.is_network() => error!(operation, "Request failed: {}", e),
        e => warn!(operation, "Request unsuccessful: {}", e),
    }
    err.into_result(fallback)
}

#[async_trait]
impl ReportTransport for HttpReportClient {
    async fn generate_report(&self, request: GenerateReportRequest) -> OperationResult<Report> {
        match self.try_generate_report(request).await {
            Ok((report, message)) => OperationResult::accepted(report, message),
            Err(e) => fail("generate_report", e, GENERATE_FAILED),
        }
    }

    async fn get_all_reports(&self, query: ReportQuery) -> OperationResult<ReportListing> {
        match self.try_get_all_reports(query).await {
            Ok(listing) => OperationResult::success(listing, LISTED),
            Err(e) => fail("get_all_reports", e, LIST_FAILED),
        }
    }

    async fn download_report_pdf(
        &self,
        report_id: i64,
        report_name: &str,
    ) -> OperationResult<SavedArtifact> {
        match self.try_download_report_pdf(report_id, report_name).await {
            Ok(saved) => {
                let message = format!("Downloaded {}", saved.filename);
                OperationResult::success(saved, message)
            }
            Err(e) => fail("download_report_pdf", e, DOWNLOAD_REPORT_FAILED),
        }
    }

    async fn download_chart(
        &self,
        report_id: i64,
        chart_type: &str,
        report_name: &str,
    ) -> OperationResult<SavedArtifact> {
        match self
            .try_download_chart(report_id, chart_type, report_name)
            .await
        {
            Ok(saved) => {
                let message = format!("Downloaded {}", saved.filename);
                OperationResult::success(saved, message)
            }
            Err(e) => fail("download_chart", e, DOWNLOAD_CHART_FAILED),
        }
    }

    async fn send_report_email(
        &self,
        report_id: i64,
        request: EmailReportRequest,
    ) -> OperationResult<()> {
        match self.try_send_report_email(report_id, request).await {
            Ok(message) => OperationResult::success((), message),
            Err(e) => fail("send_report_email", e, EMAIL_FAILED),
        }
    }
}

#[async_trait]
impl AdminDirectory for HttpReportClient {
    #[instrument(skip(self))]
    async fn fetch_users(&self) -> OperationResult<Vec<User>> {
        match self.fetch_collection::<User>("users").await {
            Ok(users) => {
                let message = format!("Loaded {} users", users.len());
                OperationResult::success(users, message)
            }
            Err(e) => fail("fetch_users", e, USERS_FAILED),
        }
    }

    #[instrument(skip(self))]
    async fn fetch_orders(&self) -> OperationResult<Vec<Order>> {
        match self.fetch_collection::<Order>("orders").await {
            Ok(orders) => {
                let message = format!("Loaded {} orders", orders.len());
                OperationResult::success(orders, message)
            }
            Err(e) => fail("fetch_orders", e, ORDERS_FAILED),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpReportClient {
        HttpReportClient::new(&ClientConfig::new(base)).unwrap()
    }

    #[test]
    fn endpoints_respect_base_path() {
        let root = client("http://localhost:5000");
        assert_eq!(
            root.endpoint(&["admin", "reports"]).as_str(),
            "http://localhost:5000/admin/reports"
        );

        let nested = client("https://shop.example/api/");
        assert_eq!(
            nested.endpoint(&["admin", "reports", "42", "download"]).as_str(),
            "https://shop.example/api/admin/reports/42/download"
        );
    }

    #[test]
    fn chart_type_is_path_encoded_not_validated() {
        let api = client("http://localhost:5000");
        assert_eq!(
            api.endpoint(&["admin", "reports", "1", "charts", "top products"])
                .as_str(),
            "http://localhost:5000/admin/reports/1/charts/top%20products"
        );
    }

    #[test]
    fn rejects_base_without_path() {
        let result = HttpReportClient::new(&ClientConfig::new("mailto:ops@magnetcraft.shop"));
        assert!(matches!(result, Err(TransportError::Validation(_))));
    }

    #[test]
    fn rejects_invalid_session_cookie() {
        let mut config = ClientConfig::default();
        config.session_cookie = Some("session=abc\ninjected".into());
        assert!(matches!(
            HttpReportClient::new(&config),
            Err(TransportError::Validation(_))
        ));
    }

    #[test]
    fn listing_requires_complete_pagination() {
        let body: ReportListBody =
            serde_json::from_str(r#"{"reports":[{"id":1,"name":"A"}],"total":1}"#).unwrap();
        let listing = body.into_listing(10);
        assert_eq!(listing.reports.len(), 1);
        assert!(listing.pagination.is_none());

        let body: ReportListBody = serde_json::from_str("{}").unwrap();
        let listing = body.into_listing(10);
        assert!(listing.reports.is_empty());
        assert!(listing.pagination.is_none());
    }

    #[test]
    fn listing_never_exceeds_page_size() {
        let body: ReportListBody = serde_json::from_str(
            r#"{"reports":[{"id":1,"name":"A"},{"id":2,"name":"B"},{"id":3,"name":"C"}],
                "total":3,"pages":1,"current_page":1}"#,
        )
        .unwrap();
        let listing = body.into_listing(2);
        assert_eq!(listing.reports.len(), 2);
        assert_eq!(listing.pagination.unwrap().total, 3);
    }

    #[test]
    fn collections_accept_wrapped_and_bare_shapes() {
        let wrapped: Collection<User> = serde_json::from_str(
            r#"{"users":[{"id":1,"username":"ada","email":"ada@example.com"}]}"#,
        )
        .unwrap();
        assert_eq!(wrapped.into_vec().len(), 1);

        let bare: Collection<Order> =
            serde_json::from_str(r#"[{"id":1,"user_id":1,"total_amount":5,"status":"pending"}]"#)
                .unwrap();
        assert_eq!(bare.into_vec().len(), 1);
    }
}
