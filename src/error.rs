use crate::models::Id;
use crate::repo::RepoError;
use crate::session::SessionStoreError;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("invalid username or password")] CredentialsInvalid,
    #[error("not logged in")] NotLoggedIn,
    #[error("not allowed to modify an item written by {0}")] Forbidden(String),
    #[error("{0}")] Validation(String),
    #[error("post {0} is not on the current page")] UnknownPost(Id),
    #[error("comment {0} is not loaded")] UnknownComment(Id),
    #[error("reply {0} is not loaded")] UnknownReply(Id),
    #[error("no post is being edited")] NotEditing,
    #[error(transparent)] Repo(#[from] RepoError),
    #[error(transparent)] Session(#[from] SessionStoreError),
}

impl ClientError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        ClientError::Validation(msg.into())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Result of an operation gated on interactive confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Declined,
}
