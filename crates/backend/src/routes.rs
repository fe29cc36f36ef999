//! HTTP routes of the invoice API

use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use shared::{BackendConfig, StatusFilter, ALREADY_PAID_MESSAGE};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{InvoiceStore, StoreError};

const SERVICE_NAME: &str = "PayBridge Backend";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InvoiceStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn InvoiceStore>) -> Self {
        Self { store }
    }
}

/// Error response of the invoice API
#[derive(Debug)]
enum ApiError {
    NotFound(String),
    AlreadyPaid {
        invoice_id: String,
        paid_date: Option<DateTime<Utc>>,
    },
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { invoice_id } => ApiError::NotFound(invoice_id),
            StoreError::AlreadyPaid {
                invoice_id,
                paid_date,
            } => ApiError::AlreadyPaid {
                invoice_id,
                paid_date,
            },
            StoreError::Persistence { message } => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(invoice_id) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Invoice not found", "invoiceId": invoice_id })),
            )
                .into_response(),
            ApiError::AlreadyPaid {
                invoice_id,
                paid_date,
            } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": ALREADY_PAID_MESSAGE,
                    "invoiceId": invoice_id,
                    "paidDate": paid_date,
                })),
            )
                .into_response(),
            ApiError::Internal(message) => {
                error!(error = %message, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// CORS restricted to the configured origins, with credentials
pub fn cors_layer(config: &BackendConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Build the API router
pub fn router(store: Arc<dyn InvoiceStore>, config: &BackendConfig) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/health", get(health))
        .route("/api/invoices", get(list_invoices))
        .route("/api/invoices/:id", get(get_invoice))
        .route("/api/invoices/:id/paid", post(mark_paid))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
        .with_state(AppState::new(store))
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "PayBridge API Server",
        "version": "1.0.0",
        "endpoints": {
            "health": "/api/health",
            "invoices": "/api/invoices",
        },
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "service": SERVICE_NAME,
    }))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
}

async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    // An unrecognised status matches nothing
    let filter = match query.status.as_deref().map(StatusFilter::from_query) {
        None => StatusFilter::All,
        Some(Some(filter)) => filter,
        Some(None) => return Ok(Json(json!([])).into_response()),
    };
    let invoices = state.store.list(filter)?;
    Ok(Json(invoices).into_response())
}

async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.store.get(&id)? {
        Some(invoice) => Ok(Json(invoice).into_response()),
        None => Err(ApiError::NotFound(id)),
    }
}

async fn mark_paid(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let invoice = state.store.mark_paid(&id, Utc::now())?;
    info!(invoice = %invoice.invoice_number, "Invoice marked as paid");

    Ok(Json(json!({
        "success": true,
        "message": "Invoice marked as paid successfully",
        "invoice": invoice,
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryInvoiceStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use shared::InvoiceRecord;
    use tower::ServiceExt;

    fn app() -> Router {
        router(
            Arc::new(InMemoryInvoiceStore::seeded()),
            &BackendConfig::default(),
        )
    }

    async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    // ============== Info Endpoint Tests ==============

    #[tokio::test]
    async fn test_root() {
        let (status, body) = send(app(), Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "PayBridge API Server");
        assert_eq!(body["endpoints"]["invoices"], "/api/invoices");
    }

    #[tokio::test]
    async fn test_health_on_both_paths() {
        for path in ["/health", "/api/health"] {
            let (status, body) = send(app(), Method::GET, path).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "ok");
            assert_eq!(body["service"], "PayBridge Backend");
            assert!(body["timestamp"].is_string());
        }
    }

    // ============== Invoice Endpoint Tests ==============

    #[tokio::test]
    async fn test_list_with_status_filter() {
        let (_, all) = send(app(), Method::GET, "/api/invoices").await;
        assert_eq!(all.as_array().unwrap().len(), 5);

        let (_, all) = send(app(), Method::GET, "/api/invoices?status=all").await;
        assert_eq!(all.as_array().unwrap().len(), 5);

        let (status, unpaid) = send(app(), Method::GET, "/api/invoices?status=unpaid").await;
        assert_eq!(status, StatusCode::OK);
        let unpaid: Vec<InvoiceRecord> = serde_json::from_value(unpaid).unwrap();
        assert_eq!(unpaid.len(), 3);
        assert!(unpaid.iter().all(|i| !i.is_paid()));

        let (_, unknown) = send(app(), Method::GET, "/api/invoices?status=refunded").await;
        assert_eq!(unknown, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_status_filter_is_case_sensitive() {
        let (status, body) = send(app(), Method::GET, "/api/invoices?status=PAID").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));

        let (_, paid) = send(app(), Method::GET, "/api/invoices?status=paid").await;
        assert_eq!(paid.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_invoice() {
        let (status, body) = send(app(), Method::GET, "/api/invoices/inv-003").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["clientName"], "Global Enterprises Ltd");
        assert_eq!(body["items"][0]["unitPrice"], 3000.0);

        let (status, body) = send(app(), Method::GET, "/api/invoices/inv-404").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Invoice not found");
        assert_eq!(body["invoiceId"], "inv-404");
    }

    #[tokio::test]
    async fn test_mark_paid_flow() {
        let app = app();
        let before = Utc::now();

        let (status, body) = send(app.clone(), Method::POST, "/api/invoices/inv-001/paid").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Invoice marked as paid successfully");
        let invoice: InvoiceRecord = serde_json::from_value(body["invoice"].clone()).unwrap();
        assert!(invoice.is_paid());
        assert!(invoice.paid_date.unwrap() >= before);

        let (status, body) = send(app.clone(), Method::POST, "/api/invoices/inv-001/paid").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invoice already paid");
        assert_eq!(body["invoiceId"], "inv-001");
        assert!(body["paidDate"].is_string());

        let (status, _) = send(app, Method::POST, "/api/invoices/inv-404/paid").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    mod edge_cases {
        use super::*;

        struct BrokenStore;

        impl InvoiceStore for BrokenStore {
            fn list(&self, _: StatusFilter) -> Result<Vec<InvoiceRecord>, StoreError> {
                Err(StoreError::Persistence {
                    message: "disk on fire".to_string(),
                })
            }
            fn get(&self, _: &str) -> Result<Option<InvoiceRecord>, StoreError> {
                self.list(StatusFilter::All).map(|_| None)
            }
            fn mark_paid(&self, _: &str, _: chrono::DateTime<Utc>) -> Result<InvoiceRecord, StoreError> {
                Err(StoreError::Persistence {
                    message: "disk on fire".to_string(),
                })
            }
            fn count(&self) -> Result<usize, StoreError> {
                Ok(0)
            }
        }

        #[tokio::test]
        async fn test_store_failure_is_500() {
            let app = router(Arc::new(BrokenStore), &BackendConfig::default());
            let (status, body) = send(app, Method::GET, "/api/invoices").await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, serde_json::json!({ "error": "Internal server error" }));
        }

        #[tokio::test]
        async fn test_cors_allows_configured_origin() {
            let response = app()
                .oneshot(
                    Request::builder()
                        .uri("/health")
                        .header("Origin", "http://localhost:3002")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            let headers = response.headers();
            assert_eq!(
                headers.get("access-control-allow-origin").unwrap(),
                "http://localhost:3002"
            );
            assert_eq!(headers.get("access-control-allow-credentials").unwrap(), "true");
        }
    }
}
