//! Top-level controller owning all client state.
//!
//! Every mutation goes through the repo and then re-runs the fetch path for
//! whatever it touched; nothing is patched locally.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::auth::AuthGate;
use crate::comments::{CommentSections, FetchTicket};
use crate::config::{ClientConfig, ReloadTarget};
use crate::error::{ClientError, ClientResult, Outcome};
use crate::models::*;
use crate::pagination::PageWindow;
use crate::render::{self, BoardView, EditDraft, MenuState, RenderContext};
use crate::repo::{Repo, RepoError};
use crate::require_modify;

/// Interactive yes/no before destructive operations.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&self, _prompt: &str) -> bool { self.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Board,
}

fn required(field: &str, value: &str) -> ClientResult<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ClientError::validation(format!("{field} must not be empty")));
    }
    Ok(v.to_string())
}

// A second delete of the same item is already-successful from here.
fn tolerate_missing(what: &str, id: Id, res: Result<(), RepoError>) -> ClientResult<()> {
    match res {
        Err(RepoError::NotFound) => {
            debug!(id, "{what} already gone");
            Ok(())
        }
        other => Ok(other?),
    }
}

pub struct BoardController {
    repo: Arc<dyn Repo>,
    auth: AuthGate,
    confirm: Box<dyn Confirm>,
    config: ClientConfig,
    window: PageWindow,
    posts: Vec<Post>,
    /// Set when the last post-list fetch failed; the previous list stays.
    list_error: Option<String>,
    menus: MenuState,
    editing: Option<EditDraft>,
    sections: CommentSections,
}

impl BoardController {
    pub fn new(repo: Arc<dyn Repo>, auth: AuthGate, confirm: Box<dyn Confirm>, config: ClientConfig) -> Self {
        let window = PageWindow::new(1, config.page_size);
        Self {
            repo,
            auth,
            confirm,
            config,
            window,
            posts: Vec::new(),
            list_error: None,
            menus: MenuState::default(),
            editing: None,
            sections: CommentSections::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig { &self.config }
    pub fn session(&self) -> Option<&Session> { self.auth.session() }
    pub fn window(&self) -> PageWindow { self.window }
    pub fn posts(&self) -> &[Post] { &self.posts }
    pub fn list_error(&self) -> Option<&str> { self.list_error.as_deref() }
    pub fn menus(&self) -> &MenuState { &self.menus }
    pub fn editing(&self) -> Option<&EditDraft> { self.editing.as_ref() }
    pub fn sections(&self) -> &CommentSections { &self.sections }

    pub fn view(&self) -> View {
        if self.auth.session().is_some() { View::Board } else { View::Login }
    }

    /// Startup: adopt a stored session and show page 1, or stay on the login view.
    /// A failed first fetch is shown on the board, not returned.
    pub async fn start(&mut self) -> ClientResult<View> {
        if self.restore()? == View::Board {
            self.show_page(1).await;
        }
        Ok(self.view())
    }

    /// Adopts a stored session without fetching anything.
    pub fn restore(&mut self) -> ClientResult<View> {
        self.auth.restore_session()?;
        Ok(self.view())
    }

    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<Session> {
        let session = self.auth.login(username, password).await?;
        self.reset_board();
        self.show_page(1).await;
        Ok(session)
    }

    pub fn logout(&mut self) -> ClientResult<()> {
        self.auth.logout()?;
        self.reset_board();
        Ok(())
    }

    fn reset_board(&mut self) {
        self.window = PageWindow::new(1, self.config.page_size);
        self.posts.clear();
        self.list_error = None;
        self.menus.close_all();
        self.editing = None;
        self.sections.clear();
    }

    /// Fetches `page` (1-indexed) and replaces the displayed list. On a
    /// failed fetch the previous list stays and the error is recorded for
    /// the board as well as returned.
    pub async fn load_page(&mut self, page: u64) -> ClientResult<()> {
        self.auth.require_session()?;
        let page = page.max(1);
        let mut window = PageWindow::new(page, self.config.page_size);
        let offset = window
            .offset()
            .ok_or_else(|| ClientError::validation(format!("page {page} is out of range")))?;
        let fetched = match self.repo.list_posts(window.limit(), offset).await {
            Ok(f) => f,
            Err(e) => {
                error!(page, "failed to load posts: {e}");
                self.list_error = Some(e.to_string());
                return Err(e.into());
            }
        };
        window.total = fetched.total;
        self.list_error = None;
        debug!(page, shown = fetched.posts.len(), total = fetched.total, "loaded page");
        self.window = window;
        self.posts = fetched.posts;
        self.menus.close_all();
        self.editing = None;
        let ids: Vec<Id> = self.posts.iter().map(|p| p.id).collect();
        self.sections.retain_posts(&ids);
        Ok(())
    }

    /// Refetch after a committed change. Errors are already logged and
    /// recorded in `list_error`, so the change itself still reports success.
    async fn show_page(&mut self, page: u64) -> bool {
        self.load_page(page).await.is_ok()
    }

    async fn reload(&mut self, target: ReloadTarget) {
        let page = match target {
            ReloadTarget::CurrentPage => self.window.page,
            ReloadTarget::FirstPage => 1,
        };
        if !self.show_page(page).await {
            return;
        }
        // the page we were on may have emptied out
        let last = self.window.page_count().max(1);
        if self.window.page > last {
            self.show_page(last).await;
        }
    }

    pub fn board_view(&self) -> ClientResult<BoardView> {
        let viewer = self.auth.require_session()?;
        let ctx = RenderContext {
            viewer,
            menus: &self.menus,
            sections: &self.sections,
            editing: self.editing.as_ref(),
            newest_first: self.config.newest_first,
        };
        Ok(BoardView {
            username: viewer.username.clone(),
            role_label: viewer.role_label().to_string(),
            posts: render::render(&self.posts, &ctx),
            list_error: self.list_error.clone(),
            pages: self.window.controls(),
        })
    }

    fn displayed_post(&self, id: Id) -> ClientResult<&Post> {
        self.posts.iter().find(|p| p.id == id).ok_or(ClientError::UnknownPost(id))
    }

    // ---------------- posts ------------------------------------------

    pub async fn create_post(&mut self, title: &str, content: &str) -> ClientResult<Post> {
        let author = self.auth.require_session()?.username.clone();
        let title = required("title", title)?;
        let content = required("content", content)?;
        let post = self.repo.create_post(NewPost { title, content, author }).await.map_err(|e| {
            error!("failed to create post: {e}");
            e
        })?;
        info!(id = post.id, "post created");
        self.show_page(1).await;
        Ok(post)
    }

    /// Switches one post into its inline edit form.
    pub fn begin_edit(&mut self, id: Id) -> ClientResult<&EditDraft> {
        let session = self.auth.require_session()?;
        let post = self.displayed_post(id)?;
        require_modify!(session, &post.author);
        let draft = EditDraft { post_id: id, title: post.title.clone(), content: post.content.clone() };
        self.menus.close_all();
        Ok(&*self.editing.insert(draft))
    }

    /// Submits title and content only, then reloads.
    pub async fn save_edit(&mut self, title: &str, content: &str) -> ClientResult<()> {
        let id = self.editing.as_ref().map(|d| d.post_id).ok_or(ClientError::NotEditing)?;
        let title = required("title", title)?;
        let content = required("content", content)?;
        self.repo.update_post(id, UpdatePost { title, content }).await.map_err(|e| {
            error!(id, "failed to update post: {e}");
            e
        })?;
        info!(id, "post updated");
        self.editing = None;
        self.reload(self.config.reload_after_edit).await;
        Ok(())
    }

    /// Drops the draft and reloads the current page without mutating anything.
    pub async fn cancel_edit(&mut self) -> ClientResult<()> {
        self.editing.take().ok_or(ClientError::NotEditing)?;
        self.show_page(self.window.page).await;
        Ok(())
    }

    pub async fn delete_post(&mut self, id: Id) -> ClientResult<Outcome> {
        let session = self.auth.require_session()?;
        let post = self.displayed_post(id)?;
        require_modify!(session, &post.author);
        if !self.confirm.confirm("Delete this post?") {
            return Ok(Outcome::Declined);
        }
        let res = self.repo.delete_post(id).await;
        tolerate_missing("post", id, res).map_err(|e| {
            error!(id, "failed to delete post: {e}");
            e
        })?;
        info!(id, "post deleted");
        self.reload(self.config.reload_after_delete).await;
        Ok(Outcome::Applied)
    }

    pub fn toggle_menu(&mut self, id: Id) -> ClientResult<()> {
        let session = self.auth.require_session()?;
        let post = self.displayed_post(id)?;
        require_modify!(session, &post.author);
        self.menus.toggle(id);
        Ok(())
    }

    pub fn close_menus(&mut self) { self.menus.close_all(); }

    // ---------------- comments & replies -----------------------------

    /// Shows/hides a post's comments, fetching them on first expansion.
    pub async fn toggle_comments(&mut self, post_id: Id) -> ClientResult<()> {
        self.auth.require_session()?;
        self.displayed_post(post_id)?;
        if let Some(ticket) = self.sections.toggle(post_id) {
            self.fetch_comments(ticket).await;
        }
        Ok(())
    }

    /// Refetches a section, e.g. after a failed load.
    pub async fn refresh_comments(&mut self, post_id: Id) -> ClientResult<()> {
        self.auth.require_session()?;
        self.displayed_post(post_id)?;
        let ticket = self.sections.refresh(post_id);
        self.fetch_comments(ticket).await;
        Ok(())
    }

    /// Marks a section loading and hands out the ticket for its fetch.
    pub fn begin_comment_fetch(&mut self, post_id: Id) -> FetchTicket { self.sections.refresh(post_id) }

    /// Applies a fetch result; stale tickets and vanished sections are ignored.
    pub fn complete_comment_fetch(&mut self, ticket: FetchTicket, result: Result<Vec<Comment>, String>) -> bool {
        self.sections.complete(ticket, result)
    }

    async fn fetch_comments(&mut self, ticket: FetchTicket) {
        let result = self.repo.list_comments(ticket.post_id).await.map_err(|e| {
            warn!(post_id = ticket.post_id, "failed to load comments: {e}");
            e.to_string()
        });
        self.sections.complete(ticket, result);
    }

    fn loaded_comment(&self, post_id: Id, comment_id: Id) -> ClientResult<&Comment> {
        self.sections
            .get(post_id)
            .and_then(|s| s.comments())
            .and_then(|cs| cs.iter().find(|c| c.id == comment_id))
            .ok_or(ClientError::UnknownComment(comment_id))
    }

    /// Blank text is rejected before any request is made.
    pub async fn add_comment(&mut self, post_id: Id, text: &str) -> ClientResult<()> {
        let content = required("comment", text)?;
        let author = self.auth.require_session()?.username.clone();
        self.displayed_post(post_id)?;
        self.repo.create_comment(post_id, NewComment { content, author }).await.map_err(|e| {
            error!(post_id, "failed to add comment: {e}");
            e
        })?;
        self.refresh_comments(post_id).await
    }

    pub async fn delete_comment(&mut self, post_id: Id, comment_id: Id) -> ClientResult<Outcome> {
        let session = self.auth.require_session()?;
        let comment = self.loaded_comment(post_id, comment_id)?;
        require_modify!(session, &comment.author);
        if !self.confirm.confirm("Delete this comment?") {
            return Ok(Outcome::Declined);
        }
        let res = self.repo.delete_comment(post_id, comment_id).await;
        tolerate_missing("comment", comment_id, res).map_err(|e| {
            error!(post_id, comment_id, "failed to delete comment: {e}");
            e
        })?;
        self.refresh_comments(post_id).await?;
        Ok(Outcome::Applied)
    }

    pub async fn add_reply(&mut self, post_id: Id, comment_id: Id, text: &str) -> ClientResult<()> {
        let content = required("reply", text)?;
        let author = self.auth.require_session()?.username.clone();
        self.loaded_comment(post_id, comment_id)?;
        self.repo.create_reply(post_id, comment_id, NewReply { content, author }).await.map_err(|e| {
            error!(post_id, comment_id, "failed to add reply: {e}");
            e
        })?;
        self.refresh_comments(post_id).await
    }

    pub async fn delete_reply(&mut self, post_id: Id, comment_id: Id, reply_id: Id) -> ClientResult<Outcome> {
        let session = self.auth.require_session()?;
        let reply = self
            .loaded_comment(post_id, comment_id)?
            .replies
            .iter()
            .find(|r| r.id == reply_id)
            .ok_or(ClientError::UnknownReply(reply_id))?;
        require_modify!(session, &reply.author);
        if !self.confirm.confirm("Delete this reply?") {
            return Ok(Outcome::Declined);
        }
        let res = self.repo.delete_reply(post_id, comment_id, reply_id).await;
        tolerate_missing("reply", reply_id, res).map_err(|e| {
            error!(post_id, comment_id, reply_id, "failed to delete reply: {e}");
            e
        })?;
        self.refresh_comments(post_id).await?;
        Ok(Outcome::Applied)
    }
}
