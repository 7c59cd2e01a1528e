//! Grid service HTTP client with redacted credentials and safe logging.
//!
//! # Security
//!
//! - Auth headers and tokens are never logged
//! - Cell values are never logged
//! - Only HTTP method, sanitized path, status and duration are logged

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::config::UploadConfig;
use crate::error::AppError;
use crate::grid::{
    BatchOutcome, BoxFuture, CellFeed, CellIdentity, CellOutcome, CellStatus, CreatedDocument,
    GridDocument, GridServiceOps, Mutation, Worksheet,
};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// User agent string for all grid API requests.
const CLIENT_USER_AGENT: &str = "gridpush/0.1.0";

/// Link relation of the cell feed's batch endpoint.
const BATCH_LINK_REL: &str = "batch";

/// Query parameter keys (case-insensitive) that should have their values redacted.
const SENSITIVE_QUERY_PARAMS: &[&str] = &[
    "access_token",
    "token",
    "key",
    "signature",
    "authorization",
];

// ─────────────────────────────────────────────────────────────────────────────
// LoggingMode
// ─────────────────────────────────────────────────────────────────────────────

/// Controls how URLs are sanitized for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoggingMode {
    /// Log only the path component.
    /// Example: `/api/v1/documents`
    #[default]
    PathOnly,

    /// Log path and query parameters, but redact sensitive values.
    /// Example: `/api/v1/cells?return-empty=true&token=***`
    PathAndQueryRedacted,
}

// ─────────────────────────────────────────────────────────────────────────────
// GridCredentials
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque bearer credential supplied by the caller.
#[derive(Clone)]
pub struct GridCredentials {
    pub access_token: SecretString,
}

impl GridCredentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for GridCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridCredentials")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// URL Sanitization
// ─────────────────────────────────────────────────────────────────────────────

fn is_sensitive_param(key: &str) -> bool {
    let key_lower = key.to_ascii_lowercase();
    SENSITIVE_QUERY_PARAMS
        .iter()
        .any(|&sensitive| key_lower == sensitive)
}

/// Sanitizes a URL for safe logging based on the specified mode.
///
/// The result never contains the scheme, host, or fragment.
pub fn sanitize_url_for_logs(url: &Url, mode: LoggingMode) -> String {
    let path = url.path();

    match mode {
        LoggingMode::PathOnly => path.to_string(),
        LoggingMode::PathAndQueryRedacted => {
            let query_pairs: Vec<_> = url.query_pairs().collect();
            if query_pairs.is_empty() {
                return path.to_string();
            }

            let redacted_pairs: Vec<String> = query_pairs
                .into_iter()
                .map(|(key, value)| {
                    if is_sensitive_param(&key) {
                        format!("{}=***", key)
                    } else {
                        format!("{}={}", key, value)
                    }
                })
                .collect();

            format!("{}?{}", path, redacted_pairs.join("&"))
        }
    }
}

/// Redacts an id for logging (shows first 8 chars).
pub(crate) fn redact_id(id: &str) -> String {
    match id.char_indices().nth(8) {
        Some((idx, _)) => format!("{}...", &id[..idx]),
        None => id.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CreateDocumentRequest<'a> {
    title: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDocument {
    id: String,
    title: String,
    url: String,
    worksheets_url: String,
    #[serde(default)]
    default_worksheet: Option<Worksheet>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateWorksheetRequest<'a> {
    title: &'a str,
    row_count: usize,
    col_count: usize,
}

#[derive(Debug, Deserialize)]
struct WireLink {
    rel: String,
    href: String,
}

#[derive(Debug, Deserialize)]
struct WireCellFeed {
    #[serde(default)]
    entries: Vec<CellIdentity>,
    #[serde(default)]
    links: Vec<WireLink>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBatchEntry<'a> {
    batch_id: &'a str,
    operation: &'static str,
    id: &'a str,
    edit_url: &'a str,
    input_value: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WireBatchRequest<'a> {
    entries: Vec<WireBatchEntry<'a>>,
}

#[derive(Debug, Deserialize)]
struct WireBatchStatus {
    code: u16,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBatchResult {
    batch_id: String,
    status: WireBatchStatus,
}

#[derive(Debug, Deserialize)]
struct WireBatchResponse {
    #[serde(default)]
    entries: Vec<WireBatchResult>,
}

/// Grid API error response format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireGridError {
    message: String,
    error_code: String,
}

impl From<WireBatchResult> for CellOutcome {
    fn from(wire: WireBatchResult) -> Self {
        let status = if (200..300).contains(&wire.status.code) {
            CellStatus::Success
        } else {
            CellStatus::Failure {
                code: wire.status.code,
                reason: wire.status.reason,
                content: wire.status.content,
            }
        };
        CellOutcome {
            batch_id: wire.batch_id,
            status,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GridClient
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP implementation of [`GridServiceOps`].
#[derive(Clone)]
pub struct GridClient {
    http: reqwest::Client,
    base_url: Url,
    creds: GridCredentials,
    logging_mode: LoggingMode,
}

impl GridClient {
    /// Creates a client for the configured API base.
    ///
    /// # Errors
    ///
    /// - `AppError::NotAuthenticated` - the token is empty
    /// - `AppError::InvalidConfig` - the API base does not parse
    /// - `AppError::Internal` - the HTTP client fails to initialize
    pub fn new(config: &UploadConfig, creds: GridCredentials) -> Result<Self, AppError> {
        if creds.is_empty() {
            return Err(AppError::NotAuthenticated);
        }
        let base_url = config.api_base_url()?;
        let http = build_http_client(config.request_timeout())?;
        Ok(Self {
            http,
            base_url,
            creds,
            logging_mode: LoggingMode::default(),
        })
    }

    /// Updates the logging mode for URL sanitization.
    pub fn with_logging_mode(mut self, mode: LoggingMode) -> Self {
        self.logging_mode = mode;
        self
    }

    /// Resolves an href from the service. Absolute hrefs are kept as-is and
    /// relative ones are joined onto the API base.
    fn resolve(&self, href: &str) -> Result<Url, AppError> {
        self.base_url
            .join(href)
            .map_err(|e| AppError::Internal(format!("Invalid href {}: {}", href, e)))
    }

    /// Executes one authenticated request with timing and logging, and maps
    /// non-success statuses to `AppError`.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response, AppError> {
        let start = Instant::now();
        let sanitized_url = sanitize_url_for_logs(&url, self.logging_mode);

        let mut request = self
            .http
            .request(method.clone(), url.as_str())
            .bearer_auth(self.creds.access_token.expose_secret());
        if let Some(body) = body {
            request = request.json(body);
        }

        let result = request.send().await;
        let duration_ms = start.elapsed().as_millis();

        let response = match result {
            Ok(response) => response,
            Err(_) => {
                // The raw reqwest error may carry the full URL.
                info!("[GRID] {} {} FAILED {}ms", method, sanitized_url, duration_ms);
                return Err(AppError::ConnectionFailed(
                    "Connection to grid service failed".to_string(),
                ));
            }
        };

        let status = response.status();
        let x_request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        info!(
            "[GRID] {} {} {} {}ms {}",
            method,
            sanitized_url,
            status.as_u16(),
            duration_ms,
            x_request_id
        );

        if !status.is_success() {
            return Err(parse_error_response(response, status).await);
        }
        Ok(response)
    }

    async fn create_document_impl(&self, title: &str) -> Result<CreatedDocument, AppError> {
        let url = self.resolve("documents")?;
        let response = self
            .execute(Method::POST, url, Some(&CreateDocumentRequest { title }))
            .await?;

        let wire: WireDocument = response.json().await.map_err(|e| {
            AppError::GridServiceError(format!("Failed to parse document response: {}", e))
        })?;

        info!("[GRID] Created document {}", redact_id(&wire.id));
        Ok(CreatedDocument {
            document: GridDocument {
                id: wire.id,
                title: wire.title,
                url: wire.url,
                worksheets_url: wire.worksheets_url,
            },
            default_worksheet: wire.default_worksheet,
        })
    }

    async fn create_worksheet_impl(
        &self,
        document: &GridDocument,
        title: &str,
        rows: usize,
        cols: usize,
    ) -> Result<Worksheet, AppError> {
        let url = self.resolve(&document.worksheets_url)?;
        let body = CreateWorksheetRequest {
            title,
            row_count: rows,
            col_count: cols,
        };
        let response = self.execute(Method::POST, url, Some(&body)).await?;

        response.json().await.map_err(|e| {
            AppError::GridServiceError(format!("Failed to parse worksheet response: {}", e))
        })
    }

    async fn delete_worksheet_impl(&self, worksheet: &Worksheet) -> Result<(), AppError> {
        let url = self.resolve(&format!(
            "documents/{}/worksheets/{}",
            worksheet.document_id, worksheet.id
        ))?;
        self.execute::<()>(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn fetch_cells_impl(
        &self,
        worksheet: &Worksheet,
        return_empty: bool,
    ) -> Result<CellFeed, AppError> {
        let mut url = self.resolve(&worksheet.cells_url)?;
        if return_empty {
            url.query_pairs_mut().append_pair("return-empty", "true");
        }
        let response = self.execute::<()>(Method::GET, url, None).await?;

        let wire: WireCellFeed = response.json().await.map_err(|e| {
            AppError::GridServiceError(format!("Failed to parse cell feed: {}", e))
        })?;

        let batch_link = wire
            .links
            .into_iter()
            .find(|link| link.rel == BATCH_LINK_REL)
            .map(|link| link.href);
        Ok(CellFeed {
            entries: wire.entries,
            batch_link,
        })
    }

    async fn submit_batch_impl(
        &self,
        batch_link: &str,
        mutations: &[Mutation],
    ) -> Result<BatchOutcome, AppError> {
        let url = self.resolve(batch_link)?;
        let body = WireBatchRequest {
            entries: mutations
                .iter()
                .map(|m| WireBatchEntry {
                    batch_id: &m.batch_id,
                    operation: "update",
                    id: &m.cell.id,
                    edit_url: &m.cell.edit_url,
                    input_value: &m.value,
                    link: m.link.as_deref(),
                })
                .collect(),
        };
        let response = self.execute(Method::POST, url, Some(&body)).await?;

        let wire: WireBatchResponse = response.json().await.map_err(|e| {
            AppError::GridServiceError(format!("Failed to parse batch response: {}", e))
        })?;

        Ok(BatchOutcome {
            results: wire.entries.into_iter().map(CellOutcome::from).collect(),
        })
    }
}

impl GridServiceOps for GridClient {
    fn create_document<'a>(
        &'a self,
        title: &'a str,
    ) -> BoxFuture<'a, Result<CreatedDocument, AppError>> {
        Box::pin(self.create_document_impl(title))
    }

    fn create_worksheet<'a>(
        &'a self,
        document: &'a GridDocument,
        title: &'a str,
        rows: usize,
        cols: usize,
    ) -> BoxFuture<'a, Result<Worksheet, AppError>> {
        Box::pin(self.create_worksheet_impl(document, title, rows, cols))
    }

    fn delete_worksheet<'a>(
        &'a self,
        worksheet: &'a Worksheet,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(self.delete_worksheet_impl(worksheet))
    }

    fn fetch_cells<'a>(
        &'a self,
        worksheet: &'a Worksheet,
        return_empty: bool,
    ) -> BoxFuture<'a, Result<CellFeed, AppError>> {
        Box::pin(self.fetch_cells_impl(worksheet, return_empty))
    }

    fn submit_batch<'a>(
        &'a self,
        batch_link: &'a str,
        mutations: &'a [Mutation],
    ) -> BoxFuture<'a, Result<BatchOutcome, AppError>> {
        Box::pin(self.submit_batch_impl(batch_link, mutations))
    }
}

/// Parses an error response and maps it to the appropriate AppError.
async fn parse_error_response(response: reqwest::Response, status: reqwest::StatusCode) -> AppError {
    if status == reqwest::StatusCode::UNAUTHORIZED {
        warn!("[GRID] Request rejected as unauthorized");
        return AppError::NotAuthenticated;
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return AppError::RateLimited {
            retry_after_secs: retry_after,
        };
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return AppError::NotFound("Grid resource not found".to_string());
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("Unable to read error body"));

    if let Ok(error) = serde_json::from_str::<WireGridError>(&body) {
        return AppError::GridServiceError(format!("[{}] {}", error.error_code, error.message));
    }

    AppError::GridServiceError(format!(
        "HTTP {} - {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown error")
    ))
}

/// Builds the configured HTTP client.
fn build_http_client(timeout: Duration) -> Result<reqwest::Client, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_client(mock_url: &str) -> GridClient {
        let config = UploadConfig::default().api_base(format!("{}/api/v1", mock_url));
        GridClient::new(&config, GridCredentials::new("test_token")).unwrap()
    }

    fn worksheet_json(mock_url: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "ws-1",
            "documentId": "doc-1",
            "title": "Uploaded Data",
            "rowCount": 2,
            "colCount": 1,
            "cellsUrl": format!("{}/api/v1/documents/doc-1/worksheets/ws-1/cells", mock_url)
        })
    }

    fn test_worksheet(mock_url: &str) -> Worksheet {
        serde_json::from_value(worksheet_json(mock_url)).unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sanitization / credentials
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn sanitize_strips_scheme_host_and_query() {
        let url = Url::parse("https://grid.test/api/v1/cells?return-empty=true&token=abc").unwrap();

        assert_eq!(sanitize_url_for_logs(&url, LoggingMode::PathOnly), "/api/v1/cells");

        let redacted = sanitize_url_for_logs(&url, LoggingMode::PathAndQueryRedacted);
        assert!(redacted.contains("return-empty=true"));
        assert!(redacted.contains("token=***"));
        assert!(!redacted.contains("abc"));
        assert!(!redacted.contains("grid.test"));
    }

    #[test]
    fn is_sensitive_param_requires_exact_match() {
        assert!(is_sensitive_param("TOKEN"));
        assert!(!is_sensitive_param("tokens"));
        assert!(!is_sensitive_param("return-empty"));
    }

    #[test]
    fn credentials_debug_redacts_token() {
        let creds = GridCredentials::new("super_secret_token_12345");
        let debug_output = format!("{:?}", creds);
        assert!(!debug_output.contains("super_secret_token_12345"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        let result = GridClient::new(&UploadConfig::default(), GridCredentials::new("  "));
        assert!(matches!(result, Err(AppError::NotAuthenticated)));
    }

    #[test]
    fn redact_id_shortens_long_ids() {
        assert_eq!(redact_id("abcdefghijkl"), "abcdefgh...");
        assert_eq!(redact_id("short"), "short");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Remote operations
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn create_document_parses_default_worksheet() {
        let mock_server = MockServer::start().await;
        let client = create_test_client(&mock_server.uri());

        let response_body = serde_json::json!({
            "id": "doc-1",
            "title": "Export",
            "url": "https://grid.test/d/doc-1",
            "worksheetsUrl": format!("{}/api/v1/documents/doc-1/worksheets", mock_server.uri()),
            "defaultWorksheet": worksheet_json(&mock_server.uri())
        });

        Mock::given(method("POST"))
            .and(path("/api/v1/documents"))
            .and(header("Authorization", "Bearer test_token"))
            .and(body_json(serde_json::json!({ "title": "Export" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(&response_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let created = client.create_document("Export").await.unwrap();

        assert_eq!(created.document.url, "https://grid.test/d/doc-1");
        assert_eq!(created.default_worksheet.map(|w| w.id), Some("ws-1".to_string()));
    }

    #[tokio::test]
    async fn create_worksheet_sends_explicit_size() {
        let mock_server = MockServer::start().await;
        let client = create_test_client(&mock_server.uri());

        Mock::given(method("POST"))
            .and(path("/api/v1/documents/doc-1/worksheets"))
            .and(body_json(serde_json::json!({
                "title": "Uploaded Data",
                "rowCount": 2,
                "colCount": 1
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(worksheet_json(&mock_server.uri())))
            .expect(1)
            .mount(&mock_server)
            .await;

        let document = GridDocument {
            id: "doc-1".into(),
            title: "Export".into(),
            url: "https://grid.test/d/doc-1".into(),
            worksheets_url: format!("{}/api/v1/documents/doc-1/worksheets", mock_server.uri()),
        };
        let worksheet = client
            .create_worksheet(&document, "Uploaded Data", 2, 1)
            .await
            .unwrap();

        assert_eq!(worksheet.dimensions(), (2, 1));
    }

    #[tokio::test]
    async fn delete_worksheet_targets_worksheet_path() {
        let mock_server = MockServer::start().await;
        let client = create_test_client(&mock_server.uri());

        Mock::given(method("DELETE"))
            .and(path("/api/v1/documents/doc-1/worksheets/ws-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client.delete_worksheet(&test_worksheet(&mock_server.uri())).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn fetch_cells_requests_empty_cells_and_finds_batch_link() {
        let mock_server = MockServer::start().await;
        let client = create_test_client(&mock_server.uri());

        let response_body = serde_json::json!({
            "entries": [
                { "id": "c1", "row": 1, "col": 1, "editUrl": "e1" },
                { "id": "c2", "row": 2, "col": 1, "editUrl": "e2" }
            ],
            "links": [
                { "rel": "self", "href": "cells" },
                { "rel": "batch", "href": "https://grid.test/batch" }
            ]
        });

        Mock::given(method("GET"))
            .and(path("/api/v1/documents/doc-1/worksheets/ws-1/cells"))
            .and(query_param("return-empty", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let feed = client
            .fetch_cells(&test_worksheet(&mock_server.uri()), true)
            .await
            .unwrap();

        assert_eq!(feed.entries.len(), 2);
        assert_eq!(feed.entries[1].row, 2);
        assert_eq!(feed.batch_link.as_deref(), Some("https://grid.test/batch"));
    }

    #[tokio::test]
    async fn submit_batch_maps_per_cell_status() {
        let mock_server = MockServer::start().await;
        let client = create_test_client(&mock_server.uri());

        let expected_request = serde_json::json!({
            "entries": [
                {
                    "batchId": "R1C1",
                    "operation": "update",
                    "id": "c1",
                    "editUrl": "e1",
                    "inputValue": "hello",
                    "link": "https://example.com"
                },
                {
                    "batchId": "R2C1",
                    "operation": "update",
                    "id": "c2",
                    "editUrl": "e2",
                    "inputValue": "world"
                }
            ]
        });
        let response_body = serde_json::json!({
            "entries": [
                { "batchId": "R1C1", "status": { "code": 200, "reason": "Success" } },
                { "batchId": "R2C1", "status": { "code": 409, "reason": "Conflict", "content": "stale" } }
            ]
        });

        Mock::given(method("POST"))
            .and(path("/api/v1/batch"))
            .and(body_json(&expected_request))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mutations = vec![
            Mutation {
                cell: CellIdentity { id: "c1".into(), row: 1, col: 1, edit_url: "e1".into() },
                value: "hello".into(),
                link: Some("https://example.com".into()),
                batch_id: "R1C1".into(),
            },
            Mutation {
                cell: CellIdentity { id: "c2".into(), row: 2, col: 1, edit_url: "e2".into() },
                value: "world".into(),
                link: None,
                batch_id: "R2C1".into(),
            },
        ];

        let outcome = client.submit_batch("batch", &mutations).await.unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.results[0].is_success());
        assert_eq!(
            outcome.results[1].status,
            CellStatus::Failure {
                code: 409,
                reason: "Conflict".into(),
                content: Some("stale".into()),
            }
        );
    }

    #[tokio::test]
    async fn error_statuses_map_to_app_errors() {
        let mock_server = MockServer::start().await;
        let client = create_test_client(&mock_server.uri());

        Mock::given(method("POST"))
            .and(path("/api/v1/documents"))
            .respond_with(
                ResponseTemplate::new(429).insert_header("Retry-After", "12"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client.create_document("Export").await;
        assert!(matches!(
            result,
            Err(AppError::RateLimited { retry_after_secs: Some(12) })
        ));
    }

    #[tokio::test]
    async fn unauthorized_is_not_authenticated() {
        let mock_server = MockServer::start().await;
        let client = create_test_client(&mock_server.uri());

        Mock::given(method("POST"))
            .and(path("/api/v1/documents"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let result = client.create_document("Export").await;
        assert!(matches!(result, Err(AppError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn structured_error_body_is_reported() {
        let mock_server = MockServer::start().await;
        let client = create_test_client(&mock_server.uri());

        Mock::given(method("POST"))
            .and(path("/api/v1/documents"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "errorCode": "INVALID_TITLE",
                "message": "Title too long"
            })))
            .mount(&mock_server)
            .await;

        match client.create_document("Export").await {
            Err(AppError::GridServiceError(msg)) => {
                assert_eq!(msg, "[INVALID_TITLE] Title too long");
            }
            other => panic!("Unexpected result: {:?}", other.map(|d| d.document)),
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_connection_failed() {
        let config = UploadConfig::default().api_base("http://127.0.0.1:9/api/v1");
        let client = GridClient::new(&config, GridCredentials::new("test_token")).unwrap();

        let result = client.create_document("Export").await;
        assert!(matches!(result, Err(AppError::ConnectionFailed(_))));
    }
}
