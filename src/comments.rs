//! Per-post comment sections.
//!
//! A section fetches its comments the first time it is expanded and only
//! hides/shows afterwards, until a mutation asks for a refetch. Each fetch
//! carries a generation; a completion older than the newest fetch is dropped
//! so a slow response never overwrites a fresher one.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{Comment, Id};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Loaded(Vec<Comment>),
    Failed(String),
}

/// What the section looks like from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Collapsed,
    Loading,
    Visible,
    Failed,
}

/// Handle for one in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub post_id: Id,
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct CommentSection {
    visible: bool,
    load: LoadState,
    generation: u64,
}

impl Default for CommentSection {
    fn default() -> Self { Self { visible: false, load: LoadState::NotLoaded, generation: 0 } }
}

impl CommentSection {
    pub fn is_visible(&self) -> bool { self.visible }
    pub fn load_state(&self) -> &LoadState { &self.load }

    pub fn phase(&self) -> Phase {
        if !self.visible {
            return Phase::Collapsed;
        }
        match self.load {
            LoadState::NotLoaded | LoadState::Loading => Phase::Loading,
            LoadState::Loaded(_) => Phase::Visible,
            LoadState::Failed(_) => Phase::Failed,
        }
    }

    pub fn comments(&self) -> Option<&[Comment]> {
        match &self.load {
            LoadState::Loaded(c) => Some(c),
            _ => None,
        }
    }

    /// Flips visibility. Returns true when this expansion needs the first fetch.
    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible && self.load == LoadState::NotLoaded
    }

    pub fn begin_fetch(&mut self, post_id: Id) -> FetchTicket {
        self.generation += 1;
        self.visible = true;
        self.load = LoadState::Loading;
        FetchTicket { post_id, generation: self.generation }
    }

    /// Applies a fetch result unless a newer fetch was started since.
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<Vec<Comment>, String>) -> bool {
        if ticket.generation != self.generation {
            debug!(post_id = ticket.post_id, "discarding stale comment response");
            return false;
        }
        self.load = match result {
            Ok(c) => LoadState::Loaded(c),
            Err(msg) => LoadState::Failed(msg),
        };
        true
    }
}

/// All sections on the current page, keyed by post id.
#[derive(Debug, Default)]
pub struct CommentSections {
    sections: HashMap<Id, CommentSection>,
}

impl CommentSections {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, post_id: Id) -> Option<&CommentSection> { self.sections.get(&post_id) }

    pub fn phase(&self, post_id: Id) -> Phase {
        self.get(post_id).map_or(Phase::Collapsed, CommentSection::phase)
    }

    /// Returns a ticket when the toggle is the first expansion of the section.
    pub fn toggle(&mut self, post_id: Id) -> Option<FetchTicket> {
        let section = self.sections.entry(post_id).or_default();
        section.toggle().then(|| section.begin_fetch(post_id))
    }

    /// Starts a refetch (after a mutation, or a retry of a failed load).
    pub fn refresh(&mut self, post_id: Id) -> FetchTicket {
        self.sections.entry(post_id).or_default().begin_fetch(post_id)
    }

    /// Applies a completion. Sections that left the page ignore it.
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<Vec<Comment>, String>) -> bool {
        match self.sections.get_mut(&ticket.post_id) {
            Some(section) => section.complete(ticket, result),
            None => {
                debug!(post_id = ticket.post_id, "comment section gone; dropping response");
                false
            }
        }
    }

    /// Drops sections whose post is no longer displayed.
    pub fn retain_posts(&mut self, post_ids: &[Id]) {
        self.sections.retain(|id, _| post_ids.contains(id));
    }

    pub fn clear(&mut self) { self.sections.clear(); }
}
