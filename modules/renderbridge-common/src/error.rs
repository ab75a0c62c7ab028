use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed payload for {message_type}")]
    Payload {
        message_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Route registered twice: {0}")]
    DuplicateRoute(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
