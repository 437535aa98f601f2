use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

/// Error kinds for storefront data-access operations.
///
/// The kinds are coarse on purpose: route handlers translate them into
/// HTTP status codes and only need to tell read-only mode, bad input and
/// backend failures apart.
///
/// # Examples
///
/// ```rust
/// use storefront::errors::{ErrorKind, StorefrontError, StorefrontResult};
///
/// fn example() -> StorefrontResult<()> {
///     Err(StorefrontError::new("Cannot write to static JSON files", ErrorKind::UnsupportedOperation))
/// }
///
/// assert!(example().unwrap_err().is_unsupported());
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// A mutating call reached the read-only snapshot backend
    UnsupportedOperation,

    // IO and storage errors
    /// Generic IO error
    IOError,
    /// The file was not found
    FileNotFound,
    /// Permission denied for file operation
    PermissionDenied,
    /// Collection file is too damaged to load
    FileCorrupted,

    /// Error encoding or decoding JSON
    EncodingError,

    /// The document was rejected before reaching the backend
    ValidationError,
    /// A unique index would hold the same value twice
    UniqueConstraintViolation,
    /// Malformed query
    FilterError,
    /// Malformed update document
    InvalidOperation,

    /// Error while normalizing legacy container documents
    MigrationError,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::UnsupportedOperation => write!(f, "Unsupported operation"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::FileNotFound => write!(f, "File not found"),
            ErrorKind::PermissionDenied => write!(f, "Permission denied"),
            ErrorKind::FileCorrupted => write!(f, "File corrupted"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::UniqueConstraintViolation => write!(f, "Unique constraint violation"),
            ErrorKind::FilterError => write!(f, "Filter error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::MigrationError => write!(f, "Migration error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Storefront error type.
///
/// Carries a message, an [ErrorKind], an optional cause and the backtrace
/// captured where the error was created.
#[derive(Clone)]
pub struct StorefrontError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<StorefrontError>>,
    backtrace: Backtrace,
}

impl StorefrontError {
    /// Creates a new `StorefrontError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        StorefrontError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Backtrace::new(),
        }
    }

    /// Creates a new `StorefrontError` that keeps `cause` in its chain.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: StorefrontError) -> Self {
        StorefrontError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Backtrace::new(),
        }
    }

    /// Shorthand for the error every mutating call on the snapshot backend returns.
    pub fn unsupported(operation: &str) -> Self {
        StorefrontError::new(
            &format!("Cannot {} in static JSON mode: fixtures are read-only", operation),
            ErrorKind::UnsupportedOperation,
        )
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&StorefrontError> {
        self.cause.as_deref()
    }

    /// True when the failure means "the active backend is read-only".
    pub fn is_unsupported(&self) -> bool {
        self.error_kind == ErrorKind::UnsupportedOperation
    }

    /// True for the backend I/O family (missing files, permissions, corruption).
    pub fn is_io(&self) -> bool {
        matches!(
            self.error_kind,
            ErrorKind::IOError
                | ErrorKind::FileNotFound
                | ErrorKind::PermissionDenied
                | ErrorKind::FileCorrupted
        )
    }
}

impl Display for StorefrontError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for StorefrontError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{} ({})\nCaused by: {:?}", self.message, self.error_kind, cause),
            None => write!(f, "{} ({})\n{:?}", self.message, self.error_kind, self.backtrace),
        }
    }
}

impl Error for StorefrontError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// `StorefrontResult<T>` is shorthand for `Result<T, StorefrontError>`.
pub type StorefrontResult<T> = Result<T, StorefrontError>;

impl From<std::io::Error> for StorefrontError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IOError,
        };
        StorefrontError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<serde_json::Error> for StorefrontError {
    fn from(err: serde_json::Error) -> Self {
        let error_kind = if err.is_io() {
            ErrorKind::IOError
        } else {
            ErrorKind::EncodingError
        };
        StorefrontError::new(&format!("JSON error: {}", err), error_kind)
    }
}

impl From<String> for StorefrontError {
    fn from(msg: String) -> Self {
        StorefrontError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for StorefrontError {
    fn from(msg: &str) -> Self {
        StorefrontError::new(msg, ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_error_has_no_cause() {
        let error = StorefrontError::new("An error occurred", ErrorKind::IOError);
        assert_eq!(error.message(), "An error occurred");
        assert_eq!(error.kind(), &ErrorKind::IOError);
        assert!(error.cause().is_none());
        assert!(error.source().is_none());
    }

    #[test]
    fn new_with_cause_keeps_chain() {
        let cause = StorefrontError::new("disk gone", ErrorKind::IOError);
        let error = StorefrontError::new_with_cause("seed failed", ErrorKind::MigrationError, cause);
        assert_eq!(error.cause().map(|c| c.message()), Some("disk gone"));
        assert!(error.source().is_some());
        assert!(format!("{:?}", error).contains("Caused by: disk gone"));
    }

    #[test]
    fn unsupported_is_distinguishable() {
        let error = StorefrontError::unsupported("create");
        assert!(error.is_unsupported());
        assert!(!error.is_io());
        assert!(error.message().contains("create"));
    }

    #[test]
    fn io_error_maps_kind() {
        let not_found = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: StorefrontError = not_found.into();
        assert_eq!(error.kind(), &ErrorKind::FileNotFound);
        assert!(error.is_io());

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: StorefrontError = denied.into();
        assert_eq!(error.kind(), &ErrorKind::PermissionDenied);

        let other = std::io::Error::other("boom");
        let error: StorefrontError = other.into();
        assert_eq!(error.kind(), &ErrorKind::IOError);
    }

    #[test]
    fn json_error_maps_to_encoding() {
        let err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let error: StorefrontError = err.into();
        assert_eq!(error.kind(), &ErrorKind::EncodingError);
    }

    #[test]
    fn display_prints_message_only() {
        let error = StorefrontError::new("plain", ErrorKind::InternalError);
        assert_eq!(format!("{}", error), "plain");
        assert_eq!(format!("{}", ErrorKind::UniqueConstraintViolation), "Unique constraint violation");
    }
}
