//! # API REST
//!
//! REST API implementation for Bibliotek.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (multipart parsing, status codes, CORS, body limits)
//!
//! Uses `api-shared` for request/response types and `bibliotek-core` for every catalog operation.
//! Core calls touch the disk, so handlers run them on the blocking pool.

#![warn(rust_2018_idioms)]

use api_shared::{
    BookRes, DeleteBookRes, HealthRes, HealthService, LoginReq, LoginRes, MessageRes,
    RegisterBookReq, SearchParams, UploadBookForm,
};
use axum::{
    body::Body,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bibliotek_core::{
    BookError, BookMetadata, BookRecord, BookResult, BookService, CoreConfig, UploadRequest,
    UploadedFile,
};
use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream};
use tokio::io::AsyncReadExt;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const DOWNLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Application state for the REST API server.
#[derive(Clone)]
pub struct AppState {
    service: BookService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        login,
        list_books,
        search_books,
        get_book,
        register_book,
        upload_book,
        download_book,
        download_cover,
        delete_book,
    ),
    components(schemas(
        HealthRes,
        LoginReq,
        LoginRes,
        MessageRes,
        BookRes,
        RegisterBookReq,
        UploadBookForm,
        DeleteBookRes,
    ))
)]
struct ApiDoc;

/// Error returned by every handler: a status code plus a `{ "message": ... }` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal error".into(),
        }
    }
}

impl From<BookError> for ApiError {
    fn from(e: BookError) -> Self {
        let status = match &e {
            BookError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BookError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            BookError::NotFound(_) => StatusCode::NOT_FOUND,
            BookError::DuplicateEntry { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("request failed: {:?}", e);
            return Self::internal();
        }

        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        tracing::warn!("failed to read multipart body: {}", e);
        Self {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(MessageRes::new(self.message))).into_response()
    }
}

/// Builds the router with all routes, Swagger UI, permissive CORS and the upload size limit.
pub fn router(service: BookService, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(login))
        .route("/api/books", get(list_books).post(register_book))
        .route("/api/books/search", get(search_books))
        .route("/api/books/upload", post(upload_book))
        .route("/api/books/download/:name", get(download_book))
        .route("/api/books/covers/:name", get(download_cover))
        .route("/api/books/:id", get(get_book).delete(delete_book))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(AppState { service })
}

/// Opens the core services described by `cfg` and serves the REST API on `addr`.
///
/// # Errors
/// Returns an error if:
/// - the catalog, uploads or user storage cannot be opened,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
pub async fn serve(addr: &str, cfg: CoreConfig) -> anyhow::Result<()> {
    let service = BookService::open(&cfg)?;
    let app = router(service, cfg.max_upload_bytes());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("++ Bibliotek REST listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Runs a synchronous core call on the blocking pool.
///
/// The call runs to completion even if the client goes away, so ingestion cleanup always happens.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> BookResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            tracing::error!("blocking task failed: {}", e);
            ApiError::internal()
        })?
        .map_err(ApiError::from)
}

fn book_res(record: BookRecord) -> BookRes {
    BookRes {
        id: record.id.to_string(),
        title: record.title.into_string(),
        author: record.author.into_string(),
        category: record.category,
        year: record.year,
        description: record.description,
        pdf_url: record.pdf_url,
        image_url: record.image_url,
        created_at: record.created_at.to_rfc3339(),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginRes),
        (status = 401, description = "Unknown user or wrong password", body = MessageRes)
    )
)]
/// Checks a username/password pair against the user directory.
#[axum::debug_handler]
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> Result<Json<LoginRes>, ApiError> {
    let account = state.service.login(&req.username, &req.password)?;
    Ok(Json(LoginRes {
        username: account.username,
        role: account.role.to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/books",
    responses(
        (status = 200, description = "Every book in the catalog", body = [BookRes]),
        (status = 500, description = "Internal server error", body = MessageRes)
    )
)]
#[axum::debug_handler]
async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<BookRes>>, ApiError> {
    let records = blocking(move || state.service.list_books()).await?;
    Ok(Json(records.into_iter().map(book_res).collect()))
}

#[utoipa::path(
    get,
    path = "/api/books/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Books whose title, author or category contain the query", body = [BookRes]),
        (status = 500, description = "Internal server error", body = MessageRes)
    )
)]
#[axum::debug_handler]
async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<BookRes>>, ApiError> {
    let records = blocking(move || state.service.search_books(&params.q)).await?;
    Ok(Json(records.into_iter().map(book_res).collect()))
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(("id" = String, Path, description = "Book id (32 hex characters)")),
    responses(
        (status = 200, description = "The book", body = BookRes),
        (status = 404, description = "No book with this id", body = MessageRes)
    )
)]
#[axum::debug_handler]
async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookRes>, ApiError> {
    let record = blocking(move || state.service.get_book(&id)).await?;
    Ok(Json(book_res(record)))
}

#[utoipa::path(
    post,
    path = "/api/books",
    request_body = RegisterBookReq,
    responses(
        (status = 200, description = "Book registered without a document", body = BookRes),
        (status = 400, description = "Missing title or author", body = MessageRes),
        (status = 409, description = "Same title and author already exist", body = MessageRes)
    )
)]
/// Registers catalog metadata without uploading a document.
#[axum::debug_handler]
async fn register_book(
    State(state): State<AppState>,
    Json(req): Json<RegisterBookReq>,
) -> Result<Json<BookRes>, ApiError> {
    let metadata = BookMetadata::new(
        &req.title,
        &req.author,
        &req.category,
        req.year,
        &req.description,
    )?;
    let record = blocking(move || state.service.register_book(metadata)).await?;
    Ok(Json(book_res(record)))
}

#[utoipa::path(
    post,
    path = "/api/books/upload",
    request_body(content = UploadBookForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Book stored", body = BookRes),
        (status = 400, description = "Missing or invalid fields", body = MessageRes),
        (status = 409, description = "Same title and author already exist", body = MessageRes),
        (status = 500, description = "Storage or catalog failure", body = MessageRes)
    )
)]
/// Stores an uploaded PDF (and optional cover) and creates its catalog entry.
///
/// Duplicate (title, author) pairs are rejected before anything is written.
#[axum::debug_handler]
async fn upload_book(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BookRes>, ApiError> {
    let request = read_upload(multipart).await?;
    tracing::info!(
        "upload of '{}' by '{}' ({} bytes)",
        request.metadata.title,
        request.metadata.author,
        request.document.content.len()
    );

    let record = blocking(move || state.service.upload_book(request)).await?;
    Ok(Json(book_res(record)))
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadRequest, ApiError> {
    let mut title = String::new();
    let mut author = String::new();
    let mut category = String::new();
    let mut year = None;
    let mut description = String::new();
    let mut document = None;
    let mut cover = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        match name.as_str() {
            "title" => title = field.text().await?,
            "author" => author = field.text().await?,
            "category" => category = field.text().await?,
            "description" => description = field.text().await?,
            "year" => {
                let text = field.text().await?;
                let parsed = text
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| ApiError::bad_request(format!("year must be an integer, got '{}'", text)))?;
                year = Some(parsed);
            }
            "file" => {
                let bytes = field.bytes().await?;
                document = Some((file_name.unwrap_or_else(|| "file".into()), bytes.to_vec()));
            }
            "cover" => {
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no cover was picked.
                if !bytes.is_empty() {
                    cover = Some((file_name.unwrap_or_else(|| "cover".into()), bytes.to_vec()));
                }
            }
            other => tracing::debug!("ignoring multipart field '{}'", other),
        }
    }

    let year = year.ok_or_else(|| ApiError::bad_request("year is required"))?;
    let metadata = BookMetadata::new(&title, &author, &category, year, &description)?;
    let (document_name, document_bytes) =
        document.ok_or_else(|| ApiError::bad_request("file is required"))?;
    let document = UploadedFile::new(document_name, document_bytes)?;
    let cover = cover
        .map(|(name, bytes)| UploadedFile::new(name, bytes))
        .transpose()?;

    Ok(UploadRequest {
        metadata,
        document,
        cover,
    })
}

#[utoipa::path(
    get,
    path = "/api/books/download/{name}",
    params(("name" = String, Path, description = "Stored name from the book's pdfUrl")),
    responses(
        (status = 200, description = "The PDF, served inline as application/pdf"),
        (status = 404, description = "No such file", body = MessageRes)
    )
)]
#[axum::debug_handler]
async fn download_book(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let lookup = name.clone();
    let reader = blocking(move || state.service.open_document(&lookup)).await?;
    let size = reader.size();
    let file = tokio::fs::File::from_std(reader.into_file());

    let disposition = HeaderValue::from_str(&format!("inline; filename=\"{}\"", name))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"));

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(size)),
        ],
        Body::from_stream(file_chunks(file)),
    )
        .into_response())
}

/// Reads an open file as a stream of chunks for a response body.
fn file_chunks(file: tokio::fs::File) -> impl Stream<Item = std::io::Result<Bytes>> {
    stream::try_unfold(file, |mut file| async move {
        let mut buffer = BytesMut::with_capacity(DOWNLOAD_CHUNK_BYTES);
        if file.read_buf(&mut buffer).await? == 0 {
            return Ok(None);
        }
        Ok(Some((buffer.freeze(), file)))
    })
}

#[utoipa::path(
    get,
    path = "/api/books/covers/{name}",
    params(("name" = String, Path, description = "Stored name from the book's imageUrl")),
    responses(
        (status = 200, description = "The cover image"),
        (status = 404, description = "No such file", body = MessageRes)
    )
)]
#[axum::debug_handler]
async fn download_cover(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let cover = blocking(move || state.service.read_cover(&name)).await?;

    Ok((
        [(header::CONTENT_TYPE, HeaderValue::from_static(cover.media_type))],
        cover.bytes,
    )
        .into_response())
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(("id" = String, Path, description = "Book id (32 hex characters)")),
    responses(
        (status = 200, description = "Book and its files deleted", body = DeleteBookRes),
        (status = 404, description = "No book with this id", body = MessageRes)
    )
)]
#[axum::debug_handler]
async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteBookRes>, ApiError> {
    let report = blocking(move || state.service.delete_book(&id)).await?;
    Ok(Json(DeleteBookRes {
        message: format!("book {} deleted", report.id),
        document_deleted: report.document_deleted,
        cover_deleted: report.cover_deleted,
    }))
}
