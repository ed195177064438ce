//! # API Server Module
//!
//! ## Purpose
//! REST API server exposing the document-metadata CRUD and query surface,
//! with request validation, a uniform response envelope, and domain-error
//! to status-code mapping.
//!
//! ## Input/Output Specification
//! - **Input**: HTTP requests with JSON payloads, path/query parameters,
//!   and an optional bearer token
//! - **Output**: JSON responses wrapped in `ApiResponse { success, message,
//!   data }`
//! - **Endpoints**: Create, fetch, filter, search, count, delete, statistics,
//!   identity echo, health
//!
//! ## Key Features
//! - Explicit per-request identity resolution, threaded into mutating
//!   operations as audit context (no ambient security state)
//! - Domain errors mapped to 409/404/400; everything else is an opaque 500
//! - CORS support for web frontends

use crate::errors::DocumentError;
use crate::identity::CallerIdentity;
use crate::search::DocumentStatistics;
use crate::utils::{FileUtils, Timer};
use crate::{AppState, Document, DocumentDraft, DocumentId, UserId};
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, Result as ActixResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Application server for the document API
pub struct ApiServer {
    app_state: AppState,
}

/// Uniform response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Indicates if the operation was successful
    pub success: bool,
    /// Message describing the result
    pub message: String,
    /// The actual data payload
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    fn failure(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data,
        }
    }
}

/// Document creation payload
#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub title: String,
    pub category: String,
    /// Original file name; the type label and storage reference derive from it
    pub file_name: String,
    pub user_id: UserId,
    /// Accepted for upstream compatibility; not persisted on the record
    pub description: Option<String>,
    /// Defaults to the creation date when omitted
    pub date: Option<NaiveDate>,
}

/// Inclusive date-range query parameters
#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Free-text search parameters
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub term: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub components: HealthComponents,
}

/// Component health status
#[derive(Debug, Serialize)]
pub struct HealthComponents {
    pub storage: String,
}

impl ApiServer {
    /// Create new API server
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }

    /// Run the API server until the process is stopped
    pub async fn run(self) -> crate::Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.app_state.config.server.host, self.app_state.config.server.port
        );
        let payload_limit =
            self.app_state.config.server.max_payload_size_mb as usize * 1024 * 1024;
        let enable_cors = self.app_state.config.server.enable_cors;
        let app_state = self.app_state;

        tracing::info!("Starting API server on {}", bind_addr);

        let server = HttpServer::new(move || {
            let cors = if enable_cors {
                Cors::permissive()
            } else {
                Cors::default()
            };
            App::new()
                .app_data(web::Data::new(app_state.clone()))
                .app_data(web::JsonConfig::default().limit(payload_limit))
                .wrap(cors)
                .configure(routes)
        })
        .bind(&bind_addr)
        .map_err(|e| DocumentError::Internal {
            message: format!("Failed to bind server to {}: {}", bind_addr, e),
        })?
        .run();

        server
            .await
            .map_err(|e| DocumentError::Internal {
                message: format!("Server error: {}", e),
            })?;

        Ok(())
    }
}

/// Register every route; shared between the server and the endpoint tests
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index_handler))
        .route("/health", web::get().to(health_handler))
        .route("/api/documents", web::post().to(create_document_handler))
        .route("/api/documents", web::get().to(all_documents_handler))
        .route("/api/documents/by-id/{id}", web::get().to(document_by_id_handler))
        .route("/api/documents/by-id/{id}", web::delete().to(delete_document_handler))
        .route("/api/documents/users/{user_id}", web::get().to(documents_by_user_handler))
        .route(
            "/api/documents/users/{user_id}",
            web::delete().to(delete_user_documents_handler),
        )
        .route(
            "/api/documents/users/{user_id}/type/{doc_type}",
            web::get().to(documents_by_user_and_type_handler),
        )
        .route(
            "/api/documents/users/{user_id}/category/{category}",
            web::get().to(documents_by_user_and_category_handler),
        )
        .route(
            "/api/documents/users/{user_id}/date-range",
            web::get().to(documents_by_user_and_date_range_handler),
        )
        .route("/api/documents/type/{doc_type}", web::get().to(documents_by_type_handler))
        .route(
            "/api/documents/category/{category}",
            web::get().to(documents_by_category_handler),
        )
        .route("/api/documents/name/{name}", web::get().to(documents_by_name_handler))
        .route("/api/documents/date/{date}", web::get().to(documents_by_date_handler))
        .route("/api/documents/date-range", web::get().to(documents_by_date_range_handler))
        .route("/api/documents/search", web::get().to(search_documents_handler))
        .route(
            "/api/documents/user/{user_id}/search",
            web::get().to(search_by_user_handler),
        )
        .route("/api/documents/user/{user_id}/count", web::get().to(count_by_user_handler))
        .route(
            "/api/documents/count/type/{doc_type}",
            web::get().to(count_by_type_handler),
        )
        .route(
            "/api/documents/count/category/{category}",
            web::get().to(count_by_category_handler),
        )
        .route("/api/documents/statistics", web::get().to(statistics_handler))
        .route("/api/documents/test-auth", web::get().to(test_auth_handler));
}

/// Resolve the caller identity from the request, fail-open
fn resolve_caller(req: &HttpRequest, state: &AppState) -> Option<CallerIdentity> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    state.identity.resolve(auth_header)
}

/// Map a domain error to its response class
fn error_response(err: &DocumentError) -> HttpResponse {
    match err {
        DocumentError::AlreadyExists { .. } => {
            HttpResponse::Conflict().json(ApiResponse::<()>::failure(err.to_string(), None))
        }
        DocumentError::NotFound { .. } => {
            HttpResponse::NotFound().json(ApiResponse::<()>::failure(err.to_string(), None))
        }
        DocumentError::ValidationFailed { field, reason } => {
            let mut errors = HashMap::new();
            errors.insert(field.clone(), reason.clone());
            HttpResponse::BadRequest().json(ApiResponse::failure("Validation failed", Some(errors)))
        }
        _ => {
            tracing::error!("Request failed: {} (category: {})", err, err.category());
            HttpResponse::InternalServerError().json(ApiResponse::<()>::failure(
                format!("An unexpected error occurred: {}", err),
                None,
            ))
        }
    }
}

fn list_response(result: crate::Result<Vec<Document>>, message: &str) -> HttpResponse {
    match result {
        Ok(documents) => HttpResponse::Ok().json(ApiResponse::ok(message, documents)),
        Err(e) => error_response(&e),
    }
}

fn count_response(result: crate::Result<u64>) -> HttpResponse {
    match result {
        Ok(count) => HttpResponse::Ok().json(ApiResponse::ok("Count retrieved", count)),
        Err(e) => error_response(&e),
    }
}

/// Create a new document
async fn create_document_handler(
    state: web::Data<AppState>,
    request: web::Json<CreateDocumentRequest>,
    http_request: HttpRequest,
) -> ActixResult<HttpResponse> {
    let timer = Timer::new("create_document");
    let request = request.into_inner();

    // Field validation happens at the boundary; the service only owns the
    // uniqueness and date rules
    let mut errors = HashMap::new();
    if request.title.trim().is_empty() {
        errors.insert("title".to_string(), "Document title is required".to_string());
    }
    if request.category.trim().is_empty() {
        errors.insert(
            "category".to_string(),
            "Document category is required".to_string(),
        );
    }
    if request.file_name.trim().is_empty() {
        errors.insert("file_name".to_string(), "File name is required".to_string());
    }
    if !errors.is_empty() {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::failure("Validation failed", Some(errors))));
    }

    if request.description.is_some() {
        tracing::debug!("Ignoring description for '{}': not persisted", request.title);
    }

    let doc_type = FileUtils::type_label(&request.file_name);
    let stored_name = FileUtils::stored_name(&request.file_name);
    let draft = DocumentDraft {
        name: request.title,
        category: request.category,
        doc_type,
        date: request.date,
        url: format!("/api/documents/download/{}", stored_name),
        user_id: request.user_id,
    };

    let caller = resolve_caller(&http_request, &state);
    let response = match state.service.create_document(draft, caller.as_ref()) {
        Ok(document) => HttpResponse::Created()
            .json(ApiResponse::ok("Document created successfully", document)),
        Err(e) => error_response(&e),
    };

    timer.stop();
    Ok(response)
}

/// Get all documents
async fn all_documents_handler(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(list_response(
        state.service.all_documents(),
        "Documents retrieved",
    ))
}

/// Get a document by its id
async fn document_by_id_handler(
    state: web::Data<AppState>,
    path: web::Path<DocumentId>,
) -> ActixResult<HttpResponse> {
    Ok(match state.service.document_by_id(path.into_inner()) {
        Ok(document) => HttpResponse::Ok().json(ApiResponse::ok("Document found", document)),
        Err(e) => error_response(&e),
    })
}

/// Delete a document by its id
async fn delete_document_handler(
    state: web::Data<AppState>,
    path: web::Path<DocumentId>,
    http_request: HttpRequest,
) -> ActixResult<HttpResponse> {
    let caller = resolve_caller(&http_request, &state);
    Ok(
        match state
            .service
            .delete_document(path.into_inner(), caller.as_ref())
        {
            Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::ok("Document deleted", ())),
            Err(e) => error_response(&e),
        },
    )
}

/// Get all documents for a specific user
async fn documents_by_user_handler(
    state: web::Data<AppState>,
    path: web::Path<UserId>,
) -> ActixResult<HttpResponse> {
    Ok(list_response(
        state.service.documents_by_user(path.into_inner()),
        "Documents retrieved",
    ))
}

/// Delete every document a user owns
async fn delete_user_documents_handler(
    state: web::Data<AppState>,
    path: web::Path<UserId>,
    http_request: HttpRequest,
) -> ActixResult<HttpResponse> {
    let caller = resolve_caller(&http_request, &state);
    Ok(
        match state
            .service
            .delete_documents_for_user(path.into_inner(), caller.as_ref())
        {
            Ok(removed) => HttpResponse::Ok().json(ApiResponse::ok("Documents deleted", removed)),
            Err(e) => error_response(&e),
        },
    )
}

/// Get documents by user and type
async fn documents_by_user_and_type_handler(
    state: web::Data<AppState>,
    path: web::Path<(UserId, String)>,
) -> ActixResult<HttpResponse> {
    let (user_id, doc_type) = path.into_inner();
    Ok(list_response(
        state.service.documents_by_user_and_type(user_id, &doc_type),
        "Documents retrieved",
    ))
}

/// Get documents by user and category
async fn documents_by_user_and_category_handler(
    state: web::Data<AppState>,
    path: web::Path<(UserId, String)>,
) -> ActixResult<HttpResponse> {
    let (user_id, category) = path.into_inner();
    Ok(list_response(
        state
            .service
            .documents_by_user_and_category(user_id, &category),
        "Documents retrieved",
    ))
}

/// Get documents by user within an inclusive date range
async fn documents_by_user_and_date_range_handler(
    state: web::Data<AppState>,
    path: web::Path<UserId>,
    query: web::Query<DateRangeQuery>,
) -> ActixResult<HttpResponse> {
    if query.start > query.end {
        return Ok(error_response(&DocumentError::ValidationFailed {
            field: "start".to_string(),
            reason: "Start date must not be after end date".to_string(),
        }));
    }
    Ok(list_response(
        state
            .service
            .documents_by_user_and_date_range(path.into_inner(), query.start, query.end),
        "Documents retrieved",
    ))
}

/// Get documents by type
async fn documents_by_type_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    Ok(list_response(
        state.service.documents_by_type(&path.into_inner()),
        "Documents retrieved",
    ))
}

/// Get documents by category
async fn documents_by_category_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    Ok(list_response(
        state.service.documents_by_category(&path.into_inner()),
        "Documents retrieved",
    ))
}

/// Get documents by exact name
async fn documents_by_name_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    Ok(list_response(
        state.service.documents_by_name(&path.into_inner()),
        "Documents retrieved",
    ))
}

/// Get documents dated on a specific day
async fn documents_by_date_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let raw = path.into_inner();
    let date: NaiveDate = match raw.parse() {
        Ok(date) => date,
        Err(_) => {
            return Ok(error_response(&DocumentError::ValidationFailed {
                field: "date".to_string(),
                reason: format!("Invalid date '{}', expected YYYY-MM-DD", raw),
            }))
        }
    };
    Ok(list_response(
        state.service.documents_by_date(date),
        "Documents retrieved",
    ))
}

/// Get documents within an inclusive date range
async fn documents_by_date_range_handler(
    state: web::Data<AppState>,
    query: web::Query<DateRangeQuery>,
) -> ActixResult<HttpResponse> {
    if query.start > query.end {
        return Ok(error_response(&DocumentError::ValidationFailed {
            field: "start".to_string(),
            reason: "Start date must not be after end date".to_string(),
        }));
    }
    Ok(list_response(
        state.service.documents_by_date_range(query.start, query.end),
        "Documents retrieved",
    ))
}

/// Search all documents by term
async fn search_documents_handler(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> ActixResult<HttpResponse> {
    let timer = Timer::new("search_documents");
    let response = list_response(
        state.service.search_documents(&query.term),
        "Search completed",
    );
    timer.stop();
    Ok(response)
}

/// Search a user's documents by term
async fn search_by_user_handler(
    state: web::Data<AppState>,
    path: web::Path<UserId>,
    query: web::Query<SearchQuery>,
    http_request: HttpRequest,
) -> ActixResult<HttpResponse> {
    let timer = Timer::new("search_by_user");
    let user_id = path.into_inner();
    if let Some(caller) = resolve_caller(&http_request, &state) {
        tracing::debug!("Search for user {} requested by '{}'", user_id, caller.username);
    }
    let response = list_response(
        state.service.search_documents_by_user(user_id, &query.term),
        "Search completed",
    );
    timer.stop();
    Ok(response)
}

/// Count a user's documents
async fn count_by_user_handler(
    state: web::Data<AppState>,
    path: web::Path<UserId>,
) -> ActixResult<HttpResponse> {
    Ok(count_response(
        state.service.count_documents_by_user(path.into_inner()),
    ))
}

/// Count documents of a type
async fn count_by_type_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    Ok(count_response(
        state.service.count_documents_by_type(&path.into_inner()),
    ))
}

/// Count documents in a category
async fn count_by_category_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    Ok(count_response(
        state.service.count_documents_by_category(&path.into_inner()),
    ))
}

/// Aggregate document statistics
async fn statistics_handler(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(match state.service.statistics() {
        Ok(stats) => {
            HttpResponse::Ok().json(ApiResponse::<DocumentStatistics>::ok(
                "Statistics retrieved",
                stats,
            ))
        }
        Err(e) => error_response(&e),
    })
}

/// Identity echo endpoint: reports what the resolver made of the token
async fn test_auth_handler(
    state: web::Data<AppState>,
    http_request: HttpRequest,
) -> ActixResult<HttpResponse> {
    Ok(match resolve_caller(&http_request, &state) {
        Some(identity) => HttpResponse::Ok().json(ApiResponse::ok(
            format!("Authenticated as '{}'", identity.username),
            identity,
        )),
        None => HttpResponse::Ok().json(ApiResponse::<CallerIdentity>::failure(
            "No identity resolved",
            None,
        )),
    })
}

/// Health check endpoint handler
async fn health_handler(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let storage_status = match state.service.health_check() {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let response = HealthResponse {
        status: storage_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        components: HealthComponents {
            storage: storage_status.to_string(),
        },
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Index page handler
async fn index_handler() -> ActixResult<HttpResponse> {
    let html = r#"
    <!DOCTYPE html>
    <html>
    <head>
        <title>Document Metadata Service</title>
        <style>
            body { font-family: Arial, sans-serif; margin: 40px; }
            .header { color: #2c3e50; }
            .endpoint { margin: 20px 0; padding: 15px; background: #f8f9fa; border-radius: 5px; }
            .method { font-weight: bold; color: #27ae60; }
        </style>
    </head>
    <body>
        <h1 class="header">Document Metadata Service API</h1>
        <p>This service stores metadata records for uploaded documents and provides filtered retrieval, search, and counting per user.</p>

        <h2>Available Endpoints</h2>

        <div class="endpoint">
            <span class="method">POST</span> /api/documents
            <p>Create a document record. Fails with 409 when the user already owns a document with the same name.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET</span> /api/documents/users/{userId}
            <p>List every document a user owns.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET</span> /api/documents/search?term=...
            <p>Substring search across document name, category, and type.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET</span> /health
            <p>Check the health status of the service and its storage.</p>
        </div>

        <h2>Example Create Request</h2>
        <pre>{
  "title": "Invoice1",
  "category": "Finance",
  "file_name": "invoice-march.pdf",
  "user_id": 7
}</pre>
    </body>
    </html>
    "#;

    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::identity::IdentityResolver;
    use crate::service::DocumentService;
    use crate::storage::DocumentStore;
    use actix_web::test;
    use std::sync::Arc;

    fn test_state(dir: &tempfile::TempDir) -> AppState {
        let mut config = Config::default();
        config.storage.db_path = dir.path().join("documents.db");

        let store = Arc::new(DocumentStore::open(&config.storage).unwrap());
        let service = Arc::new(DocumentService::new(store, config.query.clone()));
        let identity = Arc::new(IdentityResolver::new(&config.auth));

        AppState {
            config: Arc::new(config),
            service,
            identity,
        }
    }

    fn create_body(title: &str, category: &str, file_name: &str, user_id: u64) -> serde_json::Value {
        serde_json::json!({
            "title": title,
            "category": category,
            "file_name": file_name,
            "user_id": user_id,
        })
    }

    macro_rules! test_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .configure(routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_create_document_assigns_id_type_and_date() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(test_state(&dir));

        let req = test::TestRequest::post()
            .uri("/api/documents")
            .set_json(create_body("Invoice1", "Finance", "invoice-march.pdf", 7))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["type"], "PDF");
        assert_eq!(body["data"]["user_id"], 7);
        assert!(body["data"]["id"].is_u64());
        assert_eq!(
            body["data"]["date"],
            chrono::Utc::now().date_naive().to_string()
        );
        assert!(body["data"]["url"]
            .as_str()
            .unwrap()
            .starts_with("/api/documents/download/"));
    }

    #[actix_web::test]
    async fn test_duplicate_create_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(test_state(&dir));

        let first = test::TestRequest::post()
            .uri("/api/documents")
            .set_json(create_body("Invoice1", "Finance", "a.pdf", 7))
            .to_request();
        assert_eq!(test::call_service(&app, first).await.status(), 201);

        let second = test::TestRequest::post()
            .uri("/api/documents")
            .set_json(create_body("Invoice1", "Finance", "b.pdf", 7))
            .to_request();
        let resp = test::call_service(&app, second).await;
        assert_eq!(resp.status(), 409);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);

        // Same name under another user is a different slot
        let other_user = test::TestRequest::post()
            .uri("/api/documents")
            .set_json(create_body("Invoice1", "Finance", "c.pdf", 8))
            .to_request();
        assert_eq!(test::call_service(&app, other_user).await.status(), 201);
    }

    #[actix_web::test]
    async fn test_blank_fields_rejected_with_field_map() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(test_state(&dir));

        let req = test::TestRequest::post()
            .uri("/api/documents")
            .set_json(create_body("  ", "", "a.pdf", 7))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["data"]["title"], "Document title is required");
        assert_eq!(body["data"]["category"], "Document category is required");
    }

    #[actix_web::test]
    async fn test_get_and_delete_missing_are_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(test_state(&dir));

        let get = test::TestRequest::get()
            .uri("/api/documents/by-id/999")
            .to_request();
        assert_eq!(test::call_service(&app, get).await.status(), 404);

        let delete = test::TestRequest::delete()
            .uri("/api/documents/by-id/999")
            .to_request();
        assert_eq!(test::call_service(&app, delete).await.status(), 404);
    }

    #[actix_web::test]
    async fn test_search_and_count_for_user() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(test_state(&dir));

        let create = test::TestRequest::post()
            .uri("/api/documents")
            .set_json(create_body("Invoice1", "Finance", "invoice.pdf", 7))
            .to_request();
        assert_eq!(test::call_service(&app, create).await.status(), 201);

        // "Fin" matches through the category field
        let search = test::TestRequest::get()
            .uri("/api/documents/user/7/search?term=Fin")
            .to_request();
        let resp = test::call_service(&app, search).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["name"], "Invoice1");

        let count = test::TestRequest::get()
            .uri("/api/documents/user/7/count")
            .to_request();
        let resp = test::call_service(&app, count).await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["data"], 1);
    }

    #[actix_web::test]
    async fn test_malformed_token_fails_open_on_reads() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(test_state(&dir));

        let req = test::TestRequest::get()
            .uri("/api/documents/user/7/search?term=Fin")
            .insert_header((header::AUTHORIZATION, "Bearer not.a.valid.token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let req = test::TestRequest::get()
            .uri("/api/documents/test-auth")
            .insert_header((header::AUTHORIZATION, "Bearer not.a.valid.token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "No identity resolved");
    }

    #[actix_web::test]
    async fn test_valid_token_echoes_identity() {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let secret = state.config.auth.jwt_secret.clone();
        let app = test_app!(state);

        let exp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs()
            + 3600;
        let token = encode(
            &Header::default(),
            &serde_json::json!({ "sub": "alice", "exp": exp }),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        let req = test::TestRequest::get()
            .uri("/api/documents/test-auth")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["username"], "alice");
    }

    #[actix_web::test]
    async fn test_date_range_validation() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(test_state(&dir));

        let req = test::TestRequest::get()
            .uri("/api/documents/date-range?start=2025-06-01&end=2025-01-01")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let req = test::TestRequest::get()
            .uri("/api/documents/date/not-a-date")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_statistics_and_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(test_state(&dir));

        let create = test::TestRequest::post()
            .uri("/api/documents")
            .set_json(create_body("Invoice1", "Finance", "invoice.pdf", 7))
            .to_request();
        assert_eq!(test::call_service(&app, create).await.status(), 201);

        let stats = test::TestRequest::get()
            .uri("/api/documents/statistics")
            .to_request();
        let resp = test::call_service(&app, stats).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["total_documents"], 1);
        assert_eq!(body["data"]["documents_this_month"], 1);

        let health = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, health).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
    }
}
