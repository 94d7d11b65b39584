//! # API Shared
//!
//! Request and response types for the Bibliotek REST API.
//!
//! Contains:
//! - Book DTOs using the catalog's wire field names (`_id`, `pdfUrl`, `imageUrl`)
//! - Login DTOs
//! - Shared services like `HealthService`
//!
//! Every type derives `utoipa::ToSchema` so `api-rest` can publish an OpenAPI document.

pub mod auth;
pub mod books;
pub mod health;

pub use auth::{LoginReq, LoginRes};
pub use books::{BookRes, DeleteBookRes, RegisterBookReq, SearchParams, UploadBookForm};
pub use health::{HealthRes, HealthService};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

impl MessageRes {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
