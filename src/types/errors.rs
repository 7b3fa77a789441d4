//! Error types for the QA Sphere MCP server.

use thiserror::Error;

/// Default result type.
pub type QaSphereResult<T> = Result<T, QaSphereError>;

/// Errors produced by the server.
#[derive(Error, Debug)]
pub enum QaSphereError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tool arguments failed validation before any remote call was made.
    #[error("{0}")]
    InvalidParams(String),

    /// The QA Sphere API rejected the request or could not be reached.
    ///
    /// `status` is `None` for transport failures (connection refused, timeout).
    /// `server_message` is the body's `message` field, when the server sent one.
    #[error("{message}")]
    Api {
        status: Option<u16>,
        message: String,
        server_message: Option<String>,
    },

    /// The API answered with a body that does not have the expected shape.
    #[error("{0}")]
    InvalidResponse(String),

    #[error("MCP server error: {0}")]
    McpServer(String),

    #[error("{0}")]
    Other(String),
}

impl QaSphereError {
    /// Creates a generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an input validation error.
    pub fn invalid_params<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParams(msg.into())
    }

    /// Creates a response shape error.
    pub fn invalid_response<S: Into<String>>(msg: S) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// HTTP status of a failed API call, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }

    /// The `message` field of the API's error body, if there was one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { server_message, .. } => server_message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for QaSphereError {
    fn from(value: reqwest::Error) -> Self {
        let status = value.status().map(|s| s.as_u16());
        // Strip the URL so tenant hosts do not leak into tool output
        let message = value.without_url().to_string();
        Self::Api {
            status,
            message,
            server_message: None,
        }
    }
}
