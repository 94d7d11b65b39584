use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// A catalog entry as returned over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookRes {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub year: i32,
    pub description: String,
    /// Stored name of the PDF; empty for metadata-only entries.
    pub pdf_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

/// Metadata-only registration body for `POST /api/books`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RegisterBookReq {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub category: String,
    pub year: i32,
    #[serde(default)]
    pub description: String,
}

/// Multipart form accepted by `POST /api/books/upload`. Used for the OpenAPI document only.
#[derive(Debug, ToSchema)]
pub struct UploadBookForm {
    pub title: String,
    pub author: String,
    pub category: String,
    pub year: i32,
    pub description: String,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub cover: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBookRes {
    pub message: String,
    pub document_deleted: bool,
    pub cover_deleted: bool,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring matched against title, author and category.
    #[serde(default)]
    pub q: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_res_uses_wire_field_names() {
        let book = BookRes {
            id: "0123456789abcdef0123456789abcdef".into(),
            title: "Don Quijote".into(),
            author: "Cervantes".into(),
            category: "Novela".into(),
            year: 1605,
            description: String::new(),
            pdf_url: "abc_fileA".into(),
            image_url: None,
            created_at: "2026-01-01T00:00:00Z".into(),
        };

        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["_id"], "0123456789abcdef0123456789abcdef");
        assert_eq!(json["pdfUrl"], "abc_fileA");
        assert_eq!(json["createdAt"], "2026-01-01T00:00:00Z");
        assert!(json.get("imageUrl").is_none());
    }

    #[test]
    fn test_register_book_req_defaults_optional_fields() {
        let req: RegisterBookReq =
            serde_json::from_str(r#"{"title":"La Regenta","author":"Clarín","year":1884}"#)
                .unwrap();
        assert_eq!(req.category, "");
        assert_eq!(req.description, "");
    }
}
