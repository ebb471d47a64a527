use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Text shown to the user when an orchestrator records a failure in its state.
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Network(e) if e.is_timeout() => {
                "The server took too long to respond. Please try again.".to_string()
            }
            AgentError::Network(e) if e.is_connect() => {
                "Could not reach the server. Check your connection and the API URL.".to_string()
            }
            AgentError::Network(_) => "A network error occurred. Please try again.".to_string(),
            AgentError::Server { status, message } if message.is_empty() => {
                format!("The server returned an error ({})", status)
            }
            AgentError::Server { message, .. } => message.clone(),
            AgentError::Validation(msg) => msg.clone(),
            AgentError::NotFound(what) => format!("{} was not found", what),
            other => other.to_string(),
        }
    }

    /// Whether the failure happened before any request left the client.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            AgentError::Validation(_) | AgentError::Config(_) | AgentError::Storage(_)
        )
    }
}

impl From<config::ConfigError> for AgentError {
    fn from(e: config::ConfigError) -> Self {
        AgentError::Config(e.to_string())
    }
}

impl From<toml::de::Error> for AgentError {
    fn from(e: toml::de::Error) -> Self {
        AgentError::Config(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for AgentError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        AgentError::WebSocket(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
