use crate::api::Error as ApiError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never got a usable answer
    #[error(transparent)]
    Transport(#[from] anyhow::Error),

    /// The server answered with an error
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("a change to {0} is still being submitted")]
    AlreadyPending(String),

    #[error("{0}")]
    Unsupported(&'static str),

    #[error("{0} is not loaded")]
    NotLoaded(String),
}

impl Error {
    pub fn not_found() -> Error {
        Error::Api(ApiError::NotFound)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api(ApiError::NotFound))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Text suitable for an error notification
    pub fn user_message(&self) -> String {
        match self {
            Error::Transport(_) => String::from("Could not reach the server. Please try again."),
            Error::Api(ApiError::Validation(msg)) if !msg.is_empty() => msg.clone(),
            Error::Api(ApiError::Unknown(_)) => String::from("Something went wrong."),
            Error::Api(e) => e.to_string(),
            e => e.to_string(),
        }
    }
}
