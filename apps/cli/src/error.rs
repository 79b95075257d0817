//! # API Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Vanity POS                             │
//! │                                                                         │
//! │  vanity bill checkout                                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<Output, ApiError>                                        │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ─── DbError::QueryFailed("...") ──┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Business Error? ─── CoreError::EmptyCart ─────── ApiError ────►│  │
//! │  │         │                                          ▲            │  │
//! │  │         ▼                                          │            │  │
//! │  │  Barcode Error? ──── BarcodeError::InvalidCheckDigit            │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  stderr:  error[INSUFFICIENT_STOCK]: Insufficient stock for Gel: ...    │
//! │  --json:  {"code":"INSUFFICIENT_STOCK","message":"..."}                 │
//! │  exit status 1                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use vanity_core::{BarcodeError, CoreError, ValidationError};
use vanity_db::DbError;

/// Error returned from CLI commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: SKU-123"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Record not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// A unique value (SKU, barcode, invoice number) is taken
    Duplicate,

    /// Database operation failed
    DatabaseError,

    /// Business rule refused the operation
    BusinessLogic,

    /// Cart operation failed
    CartError,

    /// Insufficient stock
    InsufficientStock,

    /// Payload cannot be encoded in the requested symbology
    BarcodeError,

    /// Image or label could not be produced
    RenderError,

    /// Reading or writing a file failed
    IoError,

    /// Internal error
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::Duplicate => "DUPLICATE",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::BusinessLogic => "BUSINESS_LOGIC",
            ErrorCode::CartError => "CART_ERROR",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::BarcodeError => "BARCODE_ERROR",
            ErrorCode::RenderError => "RENDER_ERROR",
            ErrorCode::IoError => "IO_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }

    pub fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        ApiError::new(ErrorCode::IoError, format!("{}: {}", path.display(), err))
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self.code {
            ErrorCode::DatabaseError | ErrorCode::IoError | ErrorCode::Internal => 2,
            _ => 1,
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Duplicate,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but show a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted"),
            DbError::Rejected(core) => ApiError::from(core),
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::ServiceNotFound(id) => ApiError::not_found("Service", &id),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::ServiceInactive(_)
            | CoreError::ItemNotInCart(_)
            | CoreError::EmptyCart
            | CoreError::CartTooLarge { .. } => ApiError::cart(err.to_string()),
            CoreError::QuantityTooLarge { .. } | CoreError::InvalidDiscount { .. } => {
                ApiError::validation(err.to_string())
            }
            CoreError::Export { .. } => ApiError::internal(err.to_string()),
            CoreError::Barcode(e) => ApiError::from(e),
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<BarcodeError> for ApiError {
    fn from(err: BarcodeError) -> Self {
        let code = match err {
            BarcodeError::RenderingUnavailable(_) => ErrorCode::RenderError,
            _ => ErrorCode::BarcodeError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::internal(format!("JSON error: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error[{}]: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_serializes_screaming_snake_case() {
        let err = ApiError::new(ErrorCode::InsufficientStock, "short");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"code":"INSUFFICIENT_STOCK","message":"short"}"#);
        assert_eq!(
            serde_json::to_value(ErrorCode::NotFound).unwrap(),
            serde_json::Value::String(ErrorCode::NotFound.as_str().to_string())
        );
    }

    #[test]
    fn test_layered_conversions() {
        let err: ApiError = DbError::Rejected(CoreError::EmptyCart).into();
        assert_eq!(err.code, ErrorCode::CartError);
        assert_eq!(err.exit_code(), 1);

        let err: ApiError = DbError::duplicate("sku", "SH-1").into();
        assert_eq!(err.code, ErrorCode::Duplicate);

        let err: ApiError = BarcodeError::InvalidCheckDigit { expected: 8, actual: 3 }.into();
        assert_eq!(err.code, ErrorCode::BarcodeError);
        assert_eq!(err.to_string(), "error[BARCODE_ERROR]: Check digit 3 is wrong, expected 8");

        let err: ApiError = CoreError::Barcode(BarcodeError::RenderingUnavailable("too wide".into())).into();
        assert_eq!(err.code, ErrorCode::RenderError);

        let err: ApiError = DbError::QueryFailed("disk I/O error".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.exit_code(), 2);
    }
}
