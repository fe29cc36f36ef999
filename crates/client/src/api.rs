//! InvoiceClient - HTTP facade over the invoice API

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared::{BackendError, ClientConfig, InvoiceRecord, StatusFilter, ALREADY_PAID_MESSAGE};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Invoice operations the fragments depend on
#[async_trait]
pub trait InvoiceApi: Send + Sync {
    /// Invoices matching `filter`, filtered server-side
    async fn list_invoices(&self, filter: StatusFilter) -> Result<Vec<InvoiceRecord>, BackendError>;

    async fn get_invoice(&self, id: &str) -> Result<InvoiceRecord, BackendError>;

    /// Mark an invoice paid; the returned record is authoritative
    async fn mark_paid(&self, id: &str) -> Result<InvoiceRecord, BackendError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: Option<String>,
    invoice_id: Option<String>,
    paid_date: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize)]
struct MarkPaidBody {
    invoice: InvoiceRecord,
}

/// Health response of the backend
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// reqwest-based client of the invoice API
#[derive(Debug, Clone)]
pub struct InvoiceClient {
    http: Client,
    base_url: String,
}

impl InvoiceClient {
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| BackendError::NetworkError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn network_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_connect() {
            BackendError::NetworkError(format!("Cannot connect to {}", self.base_url))
        } else if e.is_timeout() {
            BackendError::NetworkError(format!("Request to {} timed out", self.base_url))
        } else {
            BackendError::NetworkError(e.to_string())
        }
    }

    /// `GET /health` with its own timeout
    pub async fn health(&self, timeout: Duration) -> Result<HealthStatus, BackendError> {
        let response = self
            .http
            .get(self.url("/health"))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| self.network_error(e))?;
        self.decode(response, "").await
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response, invoice_id: &str) -> Result<T, BackendError> {
        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|e| BackendError::ServerError {
                status: status.as_u16(),
                message: format!("Invalid response body: {}", e),
            });
        }

        let body: Option<ErrorBody> = response.json().await.ok();
        let invoice_id = body
            .as_ref()
            .and_then(|b| b.invoice_id.clone())
            .unwrap_or_else(|| invoice_id.to_string());

        let err = match status {
            StatusCode::NOT_FOUND => BackendError::NotFound { invoice_id },
            StatusCode::BAD_REQUEST
                if body.as_ref().and_then(|b| b.error.as_deref()) == Some(ALREADY_PAID_MESSAGE) =>
            {
                BackendError::AlreadyPaid {
                    invoice_id,
                    paid_date: body.as_ref().and_then(|b| b.paid_date),
                }
            }
            _ => BackendError::ServerError {
                status: status.as_u16(),
                message: body
                    .and_then(|b| b.error)
                    .unwrap_or_else(|| status.to_string()),
            },
        };
        warn!(status = status.as_u16(), error = %err, "Backend request failed");
        Err(err)
    }
}

#[async_trait]
impl InvoiceApi for InvoiceClient {
    async fn list_invoices(&self, filter: StatusFilter) -> Result<Vec<InvoiceRecord>, BackendError> {
        let mut request = self.http.get(self.url("/api/invoices"));
        if let Some(status) = filter.as_query() {
            request = request.query(&[("status", status)]);
        }

        let response = request.send().await.map_err(|e| self.network_error(e))?;
        let invoices: Vec<InvoiceRecord> = self.decode(response, "").await?;
        debug!(filter = ?filter, count = invoices.len(), "Listed invoices");
        Ok(invoices)
    }

    async fn get_invoice(&self, id: &str) -> Result<InvoiceRecord, BackendError> {
        let response = self
            .http
            .get(self.url(&format!("/api/invoices/{}", id)))
            .send()
            .await
            .map_err(|e| self.network_error(e))?;
        self.decode(response, id).await
    }

    async fn mark_paid(&self, id: &str) -> Result<InvoiceRecord, BackendError> {
        let response = self
            .http
            .post(self.url(&format!("/api/invoices/{}/paid", id)))
            .send()
            .await
            .map_err(|e| self.network_error(e))?;
        let body: MarkPaidBody = self.decode(response, id).await?;
        info!(invoice = %body.invoice.invoice_number, "Invoice paid");
        Ok(body.invoice)
    }
}
