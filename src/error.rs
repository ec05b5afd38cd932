use thiserror::Error;

/// Malformed or missing user input. The message is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        ValidationError(msg.into())
    }
}

/// A ledger line that does not have the expected record shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("line does not match the {kind} pattern: {line}")]
    Pattern { kind: &'static str, line: String },

    #[error("invalid number '{value}' in line: {line}")]
    Number { value: String, line: String },

    #[error("stored total {stored:.2} does not match computed {computed:.2} in line: {line}")]
    TotalMismatch {
        stored: f64,
        computed: f64,
        line: String,
    },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<mongodb::error::Error> for PersistenceError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        match err.kind.as_ref() {
            ErrorKind::Write(_) | ErrorKind::BulkWrite(_) => PersistenceError::Write(err.to_string()),
            ErrorKind::Authentication { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ServerSelection { .. }
            | ErrorKind::DnsResolve { .. } => PersistenceError::Connection(err.to_string()),
            ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
                PersistenceError::Serialization(err.to_string())
            }
            _ => PersistenceError::Query(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Address error: {0}")]
    Address(String),

    #[error("Message building error: {0}")]
    Message(String),

    #[error("SMTP error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
#[error("Template error: {0}")]
pub struct TemplateError(#[from] pub tera::Error);

/// Every failure a user action can produce.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl AppError {
    /// Title used for the error dialog.
    pub fn title(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Input Error",
            AppError::Persistence(_) => "Database Error",
            AppError::Notification(_) => "Email Error",
            AppError::Render(_) => "Export Error",
            AppError::Config(_) => "Configuration Error",
            AppError::Template(_) => "Template Error",
        }
    }
}
