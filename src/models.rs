use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

// Server-assigned integer ids
pub type Id = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Id,
    pub title: String,
    pub content: String,
    pub author: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: String,
}

/// Edit payload. Author is fixed at creation and never resubmitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePost {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Id,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub content: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Id,
    #[serde(alias = "text")] // one backend revision names the body `text`
    pub content: String,
    pub author: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReply {
    pub content: String,
    pub author: String,
}

/// One page of posts plus the total count reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PostPageWire")]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: u64,
}

// Older backends answer `GET /posts` with a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum PostPageWire {
    Paged { posts: Vec<Post>, total: u64 },
    Bare(Vec<Post>),
}

impl From<PostPageWire> for PostPage {
    fn from(w: PostPageWire) -> Self {
        match w {
            PostPageWire::Paged { posts, total } => PostPage { posts, total },
            PostPageWire::Bare(posts) => {
                let total = posts.len() as u64;
                PostPage { posts, total }
            }
        }
    }
}

/// The authenticated identity. The password is never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub role: Role,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self { username: username.into(), role, logged_in_at: Utc::now() }
    }

    /// Admins may modify anything; everyone else only what they wrote.
    pub fn can_modify(&self, author: &str) -> bool {
        self.role == Role::Admin || self.username == author
    }

    /// Greeting label shown next to the logout control.
    pub fn role_label(&self) -> &'static str {
        match self.role {
            Role::Admin => "administrator",
            Role::User => "member",
        }
    }
}
