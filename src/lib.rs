pub mod auth;
pub mod board;
pub mod cli;
pub mod comments;
pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod render;
pub mod repo;
pub mod session;

// Re-export commonly used items for tests / external users
pub use auth::{AuthGate, CredentialCheck, Role, StaticAllowList};
pub use board::{BoardController, Confirm, FixedAnswer, View};
pub use config::{ClientConfig, ReloadTarget};
pub use error::{ClientError, ClientResult, Outcome};
pub use models::{Comment, Id, Post, PostPage, Reply, Session};
pub use repo::{Repo, RepoError};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
