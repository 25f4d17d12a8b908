use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("Cooldown active, retry after {retry_after_ms}ms")]
    CooldownDenied { retry_after_ms: i64 },

    #[error("Handler failure: {0}")]
    HandlerFailure(String),

    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Git error: {0}")]
    Git(String),

    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
