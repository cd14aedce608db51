use async_trait::async_trait;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")] NotFound,
    #[error("network error: {0}")] Network(String),
    #[error("server error {status}: {detail}")] Server { status: u16, detail: String },
    #[error("malformed response: {0}")] Decode(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait PostRepo: Send + Sync {
    async fn list_posts(&self, limit: u64, offset: u64) -> RepoResult<PostPage>;
    async fn create_post(&self, new: NewPost) -> RepoResult<Post>;
    async fn update_post(&self, id: Id, upd: UpdatePost) -> RepoResult<()>;
    async fn delete_post(&self, id: Id) -> RepoResult<()>;
}

#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn list_comments(&self, post_id: Id) -> RepoResult<Vec<Comment>>;
    async fn create_comment(&self, post_id: Id, new: NewComment) -> RepoResult<()>;
    async fn delete_comment(&self, post_id: Id, comment_id: Id) -> RepoResult<()>;
}

#[async_trait]
pub trait ReplyRepo: Send + Sync {
    async fn create_reply(&self, post_id: Id, comment_id: Id, new: NewReply) -> RepoResult<()>;
    async fn delete_reply(&self, post_id: Id, comment_id: Id, reply_id: Id) -> RepoResult<()>;
}

pub trait Repo: PostRepo + CommentRepo + ReplyRepo {}

impl<T> Repo for T where T: PostRepo + CommentRepo + ReplyRepo {}

/// REST backend. One request per call: no retry, no timeout.
pub mod http {
    use super::*;
    use reqwest::{Client, RequestBuilder, Response, StatusCode};
    use tracing::{debug, error};

    #[derive(Clone)]
    pub struct HttpRepo {
        client: Client,
        base_url: String,
    }

    impl HttpRepo {
        pub fn new(base_url: &str) -> Self { Self::with_client(Client::new(), base_url) }

        pub fn with_client(client: Client, base_url: &str) -> Self {
            Self { client, base_url: base_url.trim_end_matches('/').to_string() }
        }

        pub fn base_url(&self) -> &str { &self.base_url }

        fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

        async fn send(&self, what: &str, req: RequestBuilder) -> RepoResult<Response> {
            let resp = req.send().await.map_err(|e| {
                error!("{what}: transport failure: {e}");
                RepoError::from(e)
            })?;
            let status = resp.status();
            debug!(%status, "{what}");
            if status.is_success() {
                return Ok(resp);
            }
            if status == StatusCode::NOT_FOUND {
                return Err(RepoError::NotFound);
            }
            let body = resp.text().await.unwrap_or_default();
            let detail = error_detail(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            error!(%status, %detail, "{what} rejected");
            Err(RepoError::Server { status: status.as_u16(), detail })
        }
    }

    impl From<reqwest::Error> for RepoError {
        fn from(e: reqwest::Error) -> Self {
            if e.is_decode() { RepoError::Decode(e.to_string()) } else { RepoError::Network(e.to_string()) }
        }
    }

    /// Pulls a human-readable message out of an error body: FastAPI's
    /// `detail`, else `error`, else `message`.
    pub(crate) fn error_detail(body: &str) -> Option<String> {
        let v: serde_json::Value = serde_json::from_str(body).ok()?;
        ["detail", "error", "message"].iter().find_map(|k| match v.get(*k)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
    }

    #[async_trait]
    impl PostRepo for HttpRepo {
        async fn list_posts(&self, limit: u64, offset: u64) -> RepoResult<PostPage> {
            let req = self.client.get(self.url("/posts")).query(&[("limit", limit), ("offset", offset)]);
            Ok(self.send("list posts", req).await?.json::<PostPage>().await?)
        }
        async fn create_post(&self, new: NewPost) -> RepoResult<Post> {
            let req = self.client.post(self.url("/posts")).json(&new);
            Ok(self.send("create post", req).await?.json::<Post>().await?)
        }
        async fn update_post(&self, id: Id, upd: UpdatePost) -> RepoResult<()> {
            let req = self.client.put(self.url(&format!("/posts/{id}"))).json(&upd);
            self.send("update post", req).await.map(drop)
        }
        async fn delete_post(&self, id: Id) -> RepoResult<()> {
            let req = self.client.delete(self.url(&format!("/posts/{id}")));
            self.send("delete post", req).await.map(drop)
        }
    }

    #[async_trait]
    impl CommentRepo for HttpRepo {
        async fn list_comments(&self, post_id: Id) -> RepoResult<Vec<Comment>> {
            let req = self.client.get(self.url(&format!("/posts/{post_id}/comments")));
            Ok(self.send("list comments", req).await?.json::<Vec<Comment>>().await?)
        }
        async fn create_comment(&self, post_id: Id, new: NewComment) -> RepoResult<()> {
            let req = self.client.post(self.url(&format!("/posts/{post_id}/comments"))).json(&new);
            self.send("create comment", req).await.map(drop)
        }
        async fn delete_comment(&self, post_id: Id, comment_id: Id) -> RepoResult<()> {
            let req = self.client.delete(self.url(&format!("/posts/{post_id}/comments/{comment_id}")));
            self.send("delete comment", req).await.map(drop)
        }
    }

    #[async_trait]
    impl ReplyRepo for HttpRepo {
        async fn create_reply(&self, post_id: Id, comment_id: Id, new: NewReply) -> RepoResult<()> {
            let path = format!("/posts/{post_id}/comments/{comment_id}/replies");
            let req = self.client.post(self.url(&path)).json(&new);
            self.send("create reply", req).await.map(drop)
        }
        async fn delete_reply(&self, post_id: Id, comment_id: Id, reply_id: Id) -> RepoResult<()> {
            let path = format!("/posts/{post_id}/comments/{comment_id}/replies/{reply_id}");
            let req = self.client.delete(self.url(&path));
            self.send("delete reply", req).await.map(drop)
        }
    }

}

/// Process-local backend with optional JSON snapshot, for tests and offline use.
#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
    use tracing::{info, warn};

    #[derive(Default, Serialize, Deserialize)]
    struct State {
        posts: BTreeMap<Id, Post>,
        comments: BTreeMap<Id, Vec<Comment>>, // keyed by post id
        next_id: Id,
    }

    #[derive(Clone, Default)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
        snapshot_path: Option<Arc<PathBuf>>,
    }

    impl InMemRepo {
        pub fn new() -> Self { Self::default() }

        /// Loads `path` if present and writes it back after every mutation.
        pub fn with_snapshot(path: impl Into<PathBuf>) -> Self {
            let path = path.into();
            let state = Self::load_state_from(&path);
            Self { state: Arc::new(RwLock::new(state)), snapshot_path: Some(Arc::new(path)) }
        }

        fn load_state_from(path: &Path) -> State {
            match std::fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<State>(&bytes) {
                    Ok(s) => {
                        info!("loaded board snapshot '{}'", path.display());
                        s
                    }
                    Err(e) => {
                        warn!("failed to parse snapshot '{}': {e}; starting empty", path.display());
                        State::default()
                    }
                },
                Err(_) => State::default(),
            }
        }

        fn persist(&self) {
            let Some(path) = &self.snapshot_path else { return };
            let body = match serde_json::to_vec_pretty(&*self.read()) {
                Ok(b) => b,
                Err(e) => {
                    warn!("failed to encode snapshot: {e}");
                    return;
                }
            };
            if let Some(dir) = path.parent() {
                let _ = std::fs::create_dir_all(dir);
            }
            if let Err(e) = std::fs::write(path.as_path(), body) {
                warn!("failed to write snapshot '{}': {e}", path.display());
            }
        }

        fn read(&self) -> RwLockReadGuard<'_, State> {
            self.state.read().unwrap_or_else(|p| p.into_inner())
        }

        fn write(&self) -> RwLockWriteGuard<'_, State> {
            self.state.write().unwrap_or_else(|p| p.into_inner())
        }

        fn next_id(state: &mut State) -> Id {
            state.next_id += 1;
            state.next_id
        }

        fn comment_mut<'a>(s: &'a mut State, post_id: Id, comment_id: Id) -> RepoResult<&'a mut Comment> {
            s.comments
                .get_mut(&post_id)
                .and_then(|cs| cs.iter_mut().find(|c| c.id == comment_id))
                .ok_or(RepoError::NotFound)
        }
    }

    #[async_trait]
    impl PostRepo for InMemRepo {
        async fn list_posts(&self, limit: u64, offset: u64) -> RepoResult<PostPage> {
            let s = self.read();
            let posts = s.posts.values().skip(offset as usize).take(limit as usize).cloned().collect();
            Ok(PostPage { posts, total: s.posts.len() as u64 })
        }
        async fn create_post(&self, new: NewPost) -> RepoResult<Post> {
            let mut s = self.write();
            let id = Self::next_id(&mut s);
            let post = Post { id, title: new.title, content: new.content, author: new.author };
            s.posts.insert(id, post.clone());
            drop(s);
            self.persist();
            Ok(post)
        }
        async fn update_post(&self, id: Id, upd: UpdatePost) -> RepoResult<()> {
            let mut s = self.write();
            let post = s.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
            post.title = upd.title;
            post.content = upd.content;
            drop(s);
            self.persist();
            Ok(())
        }
        async fn delete_post(&self, id: Id) -> RepoResult<()> {
            let mut s = self.write();
            s.posts.remove(&id).ok_or(RepoError::NotFound)?;
            s.comments.remove(&id);
            drop(s);
            self.persist();
            Ok(())
        }
    }

    #[async_trait]
    impl CommentRepo for InMemRepo {
        async fn list_comments(&self, post_id: Id) -> RepoResult<Vec<Comment>> {
            let s = self.read();
            if !s.posts.contains_key(&post_id) { return Err(RepoError::NotFound); }
            Ok(s.comments.get(&post_id).cloned().unwrap_or_default())
        }
        async fn create_comment(&self, post_id: Id, new: NewComment) -> RepoResult<()> {
            let mut s = self.write();
            if !s.posts.contains_key(&post_id) { return Err(RepoError::NotFound); }
            let id = Self::next_id(&mut s);
            let comment = Comment { id, content: new.content, author: new.author, replies: Vec::new() };
            s.comments.entry(post_id).or_default().push(comment);
            drop(s);
            self.persist();
            Ok(())
        }
        async fn delete_comment(&self, post_id: Id, comment_id: Id) -> RepoResult<()> {
            let mut s = self.write();
            let list = s.comments.get_mut(&post_id).ok_or(RepoError::NotFound)?;
            let before = list.len();
            list.retain(|c| c.id != comment_id);
            if list.len() == before { return Err(RepoError::NotFound); }
            drop(s);
            self.persist();
            Ok(())
        }
    }

    #[async_trait]
    impl ReplyRepo for InMemRepo {
        async fn create_reply(&self, post_id: Id, comment_id: Id, new: NewReply) -> RepoResult<()> {
            let mut s = self.write();
            Self::comment_mut(&mut s, post_id, comment_id)?;
            let id = Self::next_id(&mut s);
            let comment = Self::comment_mut(&mut s, post_id, comment_id)?;
            comment.replies.push(Reply { id, content: new.content, author: new.author });
            drop(s);
            self.persist();
            Ok(())
        }
        async fn delete_reply(&self, post_id: Id, comment_id: Id, reply_id: Id) -> RepoResult<()> {
            let mut s = self.write();
            let comment = Self::comment_mut(&mut s, post_id, comment_id)?;
            let before = comment.replies.len();
            comment.replies.retain(|r| r.id != reply_id);
            if comment.replies.len() == before { return Err(RepoError::NotFound); }
            drop(s);
            self.persist();
            Ok(())
        }
    }
}
