//! Display tree for the board page.
//!
//! Views are rebuilt from controller state on every call; nothing here is
//! patched in place. Authorization for the edit/delete controls is decided
//! per item through `Session::can_modify`.

use std::fmt;

use serde::Serialize;

use crate::comments::{CommentSections, LoadState};
use crate::models::{Comment, Id, Post, Reply, Session};
use crate::pagination::PageButton;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Comment,
    Reply,
}

/// A node of the comment tree. Comments have replies as children; replies
/// are leaves (one nesting level).
pub trait ThreadNode {
    fn id(&self) -> Id;
    fn author(&self) -> &str;
    fn content(&self) -> &str;
    fn kind(&self) -> NodeKind;
    fn children(&self) -> Vec<&dyn ThreadNode>;
}

impl ThreadNode for Comment {
    fn id(&self) -> Id { self.id }
    fn author(&self) -> &str { &self.author }
    fn content(&self) -> &str { &self.content }
    fn kind(&self) -> NodeKind { NodeKind::Comment }
    fn children(&self) -> Vec<&dyn ThreadNode> {
        self.replies.iter().map(|r| r as &dyn ThreadNode).collect()
    }
}

impl ThreadNode for Reply {
    fn id(&self) -> Id { self.id }
    fn author(&self) -> &str { &self.author }
    fn content(&self) -> &str { &self.content }
    fn kind(&self) -> NodeKind { NodeKind::Reply }
    fn children(&self) -> Vec<&dyn ThreadNode> { Vec::new() }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub id: Id,
    pub kind: NodeKind,
    /// Comment id for replies.
    pub parent: Option<Id>,
    pub author: String,
    pub content: String,
    pub can_delete: bool,
    /// Comments accept replies from any signed-in viewer, not only the
    /// author or an admin.
    pub can_reply: bool,
    pub children: Vec<NodeView>,
}

/// One function for every level of the tree.
pub fn render_node(node: &dyn ThreadNode, parent: Option<Id>, viewer: &Session) -> NodeView {
    NodeView {
        id: node.id(),
        kind: node.kind(),
        parent,
        author: node.author().to_string(),
        content: node.content().to_string(),
        can_delete: viewer.can_modify(node.author()),
        can_reply: node.kind() == NodeKind::Comment,
        children: node
            .children()
            .into_iter()
            .map(|child| render_node(child, Some(node.id()), viewer))
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "items", rename_all = "lowercase")]
pub enum CommentsView {
    Hidden,
    Loading,
    /// Loaded with zero comments; shown explicitly, never as a blank list.
    Empty,
    Failed(String),
    Listed(Vec<NodeView>),
}

/// Which overflow menu is open. At most one at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuState {
    open: Option<Id>,
}

impl MenuState {
    /// Opening a menu closes any other; toggling the open one closes it.
    pub fn toggle(&mut self, post_id: Id) {
        self.open = if self.open == Some(post_id) { None } else { Some(post_id) };
    }

    /// A click outside every dropdown.
    pub fn close_all(&mut self) { self.open = None; }

    pub fn is_open(&self, post_id: Id) -> bool { self.open == Some(post_id) }

    pub fn open_menu(&self) -> Option<Id> { self.open }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuView {
    pub open: bool,
}

/// Inline edit form contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditDraft {
    pub post_id: Id,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    pub id: Id,
    pub title: String,
    pub content: String,
    pub author: String,
    /// Present only when the viewer may edit/delete the post.
    pub menu: Option<MenuView>,
    pub editing: Option<EditDraft>,
    pub comments: CommentsView,
}

pub struct RenderContext<'a> {
    pub viewer: &'a Session,
    pub menus: &'a MenuState,
    pub sections: &'a CommentSections,
    pub editing: Option<&'a EditDraft>,
    pub newest_first: bool,
}

fn comments_view(post_id: Id, ctx: &RenderContext<'_>) -> CommentsView {
    let Some(section) = ctx.sections.get(post_id).filter(|s| s.is_visible()) else {
        return CommentsView::Hidden;
    };
    match section.load_state() {
        LoadState::NotLoaded | LoadState::Loading => CommentsView::Loading,
        LoadState::Failed(msg) => CommentsView::Failed(msg.clone()),
        LoadState::Loaded(list) if list.is_empty() => CommentsView::Empty,
        LoadState::Loaded(list) => CommentsView::Listed(
            list.iter().map(|c| render_node(c, None, ctx.viewer)).collect(),
        ),
    }
}

/// Builds the post list in server order (reversed when `newest_first`).
pub fn render(posts: &[Post], ctx: &RenderContext<'_>) -> Vec<PostView> {
    let mut views: Vec<PostView> = posts
        .iter()
        .map(|p| PostView {
            id: p.id,
            title: p.title.clone(),
            content: p.content.clone(),
            author: p.author.clone(),
            menu: ctx
                .viewer
                .can_modify(&p.author)
                .then(|| MenuView { open: ctx.menus.is_open(p.id) }),
            editing: ctx.editing.filter(|d| d.post_id == p.id).cloned(),
            comments: comments_view(p.id, ctx),
        })
        .collect();
    if ctx.newest_first {
        views.reverse();
    }
    views
}

/// Whole page: greeting, posts, page selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub username: String,
    pub role_label: String,
    pub posts: Vec<PostView>,
    /// Why the latest post-list fetch failed, if it did.
    pub list_error: Option<String>,
    pub pages: Vec<PageButton>,
}

impl fmt::Display for BoardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Signed in as {} ({})", self.username, self.role_label)?;
        if let Some(msg) = &self.list_error {
            writeln!(f, "\n  posts: failed to load ({msg})")?;
        } else if self.posts.is_empty() {
            writeln!(f, "\n  (no posts)")?;
        }
        for post in &self.posts {
            writeln!(f)?;
            write!(f, "#{} {}  by {}", post.id, post.title, post.author)?;
            match &post.menu {
                Some(MenuView { open: true }) => writeln!(f, "  [edit | delete]")?,
                Some(MenuView { open: false }) => writeln!(f, "  [...]")?,
                None => writeln!(f)?,
            }
            match &post.editing {
                Some(d) => {
                    writeln!(f, "    editing title:   {}", d.title)?;
                    writeln!(f, "    editing content: {}", d.content)?;
                }
                None => writeln!(f, "    {}", post.content)?,
            }
            match &post.comments {
                CommentsView::Hidden => {}
                CommentsView::Loading => writeln!(f, "    comments: loading...")?,
                CommentsView::Empty => writeln!(f, "    comments: no comments yet")?,
                CommentsView::Failed(msg) => writeln!(f, "    comments: failed to load ({msg})")?,
                CommentsView::Listed(nodes) => {
                    writeln!(f, "    comments:")?;
                    for node in nodes {
                        write_node(f, node, 3)?;
                    }
                }
            }
        }
        if !self.pages.is_empty() {
            let row: Vec<String> = self
                .pages
                .iter()
                .map(|b| if b.active { format!("[{}]", b.number) } else { b.number.to_string() })
                .collect();
            writeln!(f, "\nPages: {}", row.join(" "))?;
        }
        Ok(())
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &NodeView, depth: usize) -> fmt::Result {
    let marker = match node.kind {
        NodeKind::Comment => "-",
        NodeKind::Reply => "^",
    };
    let delete = if node.can_delete { "  (x)" } else { "" };
    writeln!(f, "{:indent$}{marker} #{} {}: {}{delete}", "", node.id, node.author, node.content, indent = depth * 2)?;
    for child in &node.children {
        write_node(f, child, depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn post(id: Id, author: &str) -> Post {
        Post { id, title: format!("t{id}"), content: "body".into(), author: author.into() }
    }

    fn ctx<'a>(viewer: &'a Session, menus: &'a MenuState, sections: &'a CommentSections) -> RenderContext<'a> {
        RenderContext { viewer, menus, sections, editing: None, newest_first: false }
    }

    #[test]
    fn menu_only_on_own_posts_for_users() {
        let viewer = Session::new("u1", Role::User);
        let (menus, sections) = (MenuState::default(), CommentSections::new());
        let views = render(&[post(1, "u1"), post(2, "u2")], &ctx(&viewer, &menus, &sections));
        assert!(views[0].menu.is_some());
        assert!(views[1].menu.is_none());
    }

    #[test]
    fn admin_sees_every_menu() {
        let viewer = Session::new("admin", Role::Admin);
        let (menus, sections) = (MenuState::default(), CommentSections::new());
        let views = render(&[post(1, "u1"), post(2, "u2")], &ctx(&viewer, &menus, &sections));
        assert!(views.iter().all(|v| v.menu.is_some()));
    }

    #[test]
    fn newest_first_reverses_display_only() {
        let viewer = Session::new("u1", Role::User);
        let (menus, sections) = (MenuState::default(), CommentSections::new());
        let mut c = ctx(&viewer, &menus, &sections);
        c.newest_first = true;
        let ids: Vec<_> = render(&[post(1, "a"), post(2, "b"), post(3, "c")], &c).iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn one_menu_open_at_a_time() {
        let mut m = MenuState::default();
        m.toggle(1);
        m.toggle(2);
        assert!(!m.is_open(1));
        assert!(m.is_open(2));
        m.toggle(2);
        assert_eq!(m.open_menu(), None);
        m.toggle(3);
        m.close_all();
        assert_eq!(m.open_menu(), None);
    }

    #[test]
    fn tree_render_nests_replies_with_parent() {
        let viewer = Session::new("u1", Role::User);
        let c = Comment {
            id: 10,
            content: "top".into(),
            author: "u2".into(),
            replies: vec![Reply { id: 11, content: "re".into(), author: "u1".into() }],
        };
        let v = render_node(&c, None, &viewer);
        assert!(!v.can_delete);
        assert!(v.can_reply);
        assert_eq!(v.children.len(), 1);
        let r = &v.children[0];
        assert_eq!(r.parent, Some(10));
        assert!(r.can_delete);
        assert!(!r.can_reply);
        assert!(r.children.is_empty());
    }

    #[test]
    fn empty_comment_list_is_explicit() {
        let viewer = Session::new("u1", Role::User);
        let menus = MenuState::default();
        let mut sections = CommentSections::new();
        let t = sections.toggle(1).unwrap();
        sections.complete(t, Ok(vec![]));
        let views = render(&[post(1, "u1")], &ctx(&viewer, &menus, &sections));
        assert_eq!(views[0].comments, CommentsView::Empty);
    }
}
