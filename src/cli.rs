//! Command-line front end.
//!
//! One-shot subcommands restore the stored session, act, and print the
//! resulting board. `shell` keeps a single controller alive across commands
//! so menus, edit forms and comment sections behave as on the page. Both
//! read the same `Commands` grammar; the shell adds a few page-only actions.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::auth::{AuthGate, StaticAllowList};
use crate::board::{BoardController, Confirm, View};
use crate::config::ClientConfig;
use crate::error::Outcome;
use crate::models::Id;
use crate::repo::http::HttpRepo;
use crate::repo::Repo;
use crate::session::FileSessionStore;

#[derive(Parser, Debug)]
#[command(name = "bbs")]
#[command(author, version, about = "Command-line client for the bulletin board", long_about = None)]
pub struct Cli {
    /// Board API base URL (overrides BBS_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Posts per page (overrides BBS_PAGE_SIZE)
    #[arg(long)]
    pub page_size: Option<u64>,

    /// Directory for the session file (overrides BBS_DATA_DIR)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Use a local snapshot file instead of the REST backend
    #[arg(long)]
    pub offline: bool,

    /// Override log level (e.g. debug, bbs_client=trace)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Answer yes to delete confirmations
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// `--page` on the post-scoped commands: one-shot runs default to page 1,
/// the shell stays on the page it shows.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Log in and show the first page
    Login {
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the current session
    Whoami,
    /// List a page of posts
    Posts {
        #[arg(short, long, default_value_t = 1)]
        page: u64,
        /// Expand every post's comments
        #[arg(long)]
        comments: bool,
    },
    /// Create a post
    New {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        content: String,
    },
    /// Edit a post's title and content
    Edit {
        id: Id,
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        content: String,
        /// Page the post is on
        #[arg(long)]
        page: Option<u64>,
    },
    /// Delete a post
    Delete {
        id: Id,
        #[arg(long)]
        page: Option<u64>,
    },
    /// Show or hide a post's comments
    Comments {
        post_id: Id,
        #[arg(long)]
        page: Option<u64>,
    },
    /// Comment on a post
    Comment {
        post_id: Id,
        text: String,
        #[arg(long)]
        page: Option<u64>,
    },
    /// Delete a comment
    DeleteComment {
        post_id: Id,
        comment_id: Id,
        #[arg(long)]
        page: Option<u64>,
    },
    /// Reply to a comment
    Reply {
        post_id: Id,
        comment_id: Id,
        text: String,
        #[arg(long)]
        page: Option<u64>,
    },
    /// Delete a reply
    DeleteReply {
        post_id: Id,
        comment_id: Id,
        reply_id: Id,
        #[arg(long)]
        page: Option<u64>,
    },
    /// Interactive session
    Shell,
}

impl Cli {
    /// Layers command-line overrides on top of the environment config.
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(size) = self.page_size.filter(|s| *s > 0) {
            config.page_size = size;
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        config
    }
}

/// Prompts on stdin unless told to assume yes.
pub struct StdinConfirm {
    pub assume_yes: bool,
}

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{prompt} [y/N] ");
        let _ = std::io::stdout().flush();
        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

fn build_repo(cli: &Cli, config: &ClientConfig) -> Result<Arc<dyn Repo>> {
    if cli.offline {
        #[cfg(feature = "inmem-store")]
        {
            let path = config.snapshot_path();
            tracing::info!("using offline board at '{}'", path.display());
            return Ok(Arc::new(crate::repo::inmem::InMemRepo::with_snapshot(path)));
        }
        #[cfg(not(feature = "inmem-store"))]
        bail!("--offline needs the inmem-store feature");
    }
    Ok(Arc::new(HttpRepo::new(&config.api_url)))
}

pub fn build_controller(cli: &Cli, config: ClientConfig) -> Result<BoardController> {
    let repo = build_repo(cli, &config)?;
    let auth = AuthGate::new(
        Box::new(StaticAllowList::default()),
        Box::new(FileSessionStore::in_dir(&config.data_dir)),
    );
    let confirm = Box::new(StdinConfirm { assume_yes: cli.yes });
    Ok(BoardController::new(repo, auth, confirm, config))
}

fn print_board(board: &BoardController) -> Result<()> {
    print!("{}", board.board_view()?);
    Ok(())
}

fn report(outcome: Outcome) {
    if outcome == Outcome::Declined {
        println!("Cancelled.");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    OneShot,
    Shell,
}

/// Brings the board to `page` before a post-scoped command.
async fn board_at(board: &mut BoardController, mode: Mode, page: Option<u64>) -> Result<()> {
    match mode {
        Mode::OneShot => {
            if board.restore()? == View::Login {
                bail!("not logged in; run `bbs login <username> -p <password>` first");
            }
            board.load_page(page.unwrap_or(1)).await.context("could not load posts")?;
        }
        Mode::Shell => {
            if let Some(page) = page {
                board.load_page(page).await.context("could not load posts")?;
            }
        }
    }
    Ok(())
}

/// Comment-level commands need the post's comments in memory.
async fn ensure_comments(board: &mut BoardController, post_id: Id) -> Result<()> {
    if board.sections().get(post_id).and_then(|s| s.comments()).is_none() {
        board.refresh_comments(post_id).await?;
    }
    Ok(())
}

/// Runs one command. Returns whether the board should be printed afterwards.
async fn execute(board: &mut BoardController, cmd: Commands, mode: Mode) -> Result<bool> {
    match cmd {
        Commands::Login { username, password } => {
            board.login(&username, &password).await?;
        }
        Commands::Logout => {
            board.logout()?;
            println!("Logged out.");
            return Ok(false);
        }
        Commands::Whoami => {
            if mode == Mode::OneShot {
                board.restore()?;
            }
            match board.session() {
                Some(s) => println!("{} ({}) since {}", s.username, s.role_label(), s.logged_in_at.to_rfc3339()),
                None => println!("Not logged in."),
            }
            return Ok(false);
        }
        Commands::Posts { page, comments } => {
            board_at(board, mode, Some(page)).await?;
            if comments {
                let ids: Vec<Id> = board.posts().iter().map(|p| p.id).collect();
                for id in ids {
                    ensure_comments(board, id).await?;
                }
            }
        }
        Commands::New { title, content } => {
            board_at(board, mode, None).await?;
            let post = board.create_post(&title, &content).await?;
            println!("Created post #{}.", post.id);
        }
        Commands::Edit { id, title, content, page } => {
            board_at(board, mode, page).await?;
            board.begin_edit(id)?;
            board.save_edit(&title, &content).await?;
        }
        Commands::Delete { id, page } => {
            board_at(board, mode, page).await?;
            report(board.delete_post(id).await?);
        }
        Commands::Comments { post_id, page } => {
            board_at(board, mode, page).await?;
            board.toggle_comments(post_id).await?;
        }
        Commands::Comment { post_id, text, page } => {
            board_at(board, mode, page).await?;
            board.add_comment(post_id, &text).await?;
        }
        Commands::DeleteComment { post_id, comment_id, page } => {
            board_at(board, mode, page).await?;
            ensure_comments(board, post_id).await?;
            report(board.delete_comment(post_id, comment_id).await?);
        }
        Commands::Reply { post_id, comment_id, text, page } => {
            board_at(board, mode, page).await?;
            ensure_comments(board, post_id).await?;
            board.add_reply(post_id, comment_id, &text).await?;
        }
        Commands::DeleteReply { post_id, comment_id, reply_id, page } => {
            board_at(board, mode, page).await?;
            ensure_comments(board, post_id).await?;
            report(board.delete_reply(post_id, comment_id, reply_id).await?);
        }
        Commands::Shell => {
            println!("Already in the shell.");
            return Ok(false);
        }
    }
    Ok(true)
}

pub async fn run(cli: Cli, config: ClientConfig) -> Result<()> {
    let mut board = build_controller(&cli, config)?;
    if cli.command == Commands::Shell {
        return shell(&mut board).await;
    }
    if execute(&mut board, cli.command, Mode::OneShot).await? {
        print_board(&board)?;
    }
    Ok(())
}

// ---------------- interactive shell ----------------------------------

/// One shell line: any one-shot command plus the page-only actions.
#[derive(Parser, Debug)]
#[command(name = "bbs", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    #[command(flatten)]
    Board(Commands),
    /// Open the inline edit form for a post
    BeginEdit { id: Id },
    /// Submit the open edit form
    Save {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        content: String,
    },
    /// Close the edit form without saving
    Cancel,
    /// Open or close a post's action menu
    Menu { id: Id },
    /// Close any open menu
    Close,
    /// Refetch a post's comments
    Retry { post_id: Id },
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// Splits a line into words. Single or double quotes group words.
fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => word.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_word = true;
            }
            None if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            None => {
                word.push(ch);
                in_word = true;
            }
        }
    }
    if quote.is_some() {
        return Err("unterminated quote".into());
    }
    if in_word {
        words.push(word);
    }
    Ok(words)
}

/// `Ok(None)` for a blank line. Usage errors and `help` come back as the
/// text clap renders for them.
pub fn parse_shell_line(line: &str) -> Result<Option<ShellCommand>, String> {
    let words = split_words(line)?;
    if words.is_empty() {
        return Ok(None);
    }
    ShellLine::try_parse_from(words).map(|l| Some(l.command)).map_err(|e| e.to_string())
}

/// Runs one shell command. Returns false when the shell should exit.
async fn dispatch(board: &mut BoardController, cmd: ShellCommand) -> Result<bool> {
    let show = match cmd {
        ShellCommand::Quit => return Ok(false),
        ShellCommand::Board(cmd) => execute(board, cmd, Mode::Shell).await?,
        ShellCommand::BeginEdit { id } => {
            board.begin_edit(id)?;
            true
        }
        ShellCommand::Save { title, content } => {
            board.save_edit(&title, &content).await?;
            true
        }
        ShellCommand::Cancel => {
            board.cancel_edit().await?;
            true
        }
        ShellCommand::Menu { id } => {
            board.toggle_menu(id)?;
            true
        }
        ShellCommand::Close => {
            board.close_menus();
            true
        }
        ShellCommand::Retry { post_id } => {
            board.refresh_comments(post_id).await?;
            true
        }
    };
    if show && board.view() == View::Board {
        print_board(board)?;
    }
    Ok(true)
}

async fn shell(board: &mut BoardController) -> Result<()> {
    match board.start().await {
        Ok(View::Board) => print_board(board)?,
        Ok(View::Login) => println!("Not logged in. Use: login <user> -p <password>"),
        Err(e) => println!("error: {e}"),
    }
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("bbs> ");
        std::io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let cmd = match parse_shell_line(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(msg) => {
                println!("{}", msg.trim_end());
                continue;
            }
        };
        match dispatch(board, cmd).await {
            Ok(true) => {}
            Ok(false) => break,
            // failures are reported and the shell keeps going
            Err(e) => println!("error: {e:#}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> ShellCommand {
        parse_shell_line(line).unwrap().unwrap()
    }

    #[test]
    fn shell_reads_the_one_shot_grammar() {
        assert_eq!(
            parsed("reply 3 9 'thanks a lot'"),
            ShellCommand::Board(Commands::Reply { post_id: 3, comment_id: 9, text: "thanks a lot".into(), page: None })
        );
        assert_eq!(
            parsed(r#"new -t "Hello world" -c "first post""#),
            ShellCommand::Board(Commands::New { title: "Hello world".into(), content: "first post".into() })
        );
        assert_eq!(
            parsed("delete-reply 1 2 3 --page 2"),
            ShellCommand::Board(Commands::DeleteReply { post_id: 1, comment_id: 2, reply_id: 3, page: Some(2) })
        );
    }

    #[test]
    fn shell_only_actions() {
        assert_eq!(parsed("  menu 4 "), ShellCommand::Menu { id: 4 });
        assert_eq!(parsed("begin-edit 7"), ShellCommand::BeginEdit { id: 7 });
        assert_eq!(
            parsed("save -t T -c 'new body'"),
            ShellCommand::Save { title: "T".into(), content: "new body".into() }
        );
        assert_eq!(parsed("exit"), ShellCommand::Quit);
    }

    #[test]
    fn blank_and_bad_lines() {
        assert_eq!(parse_shell_line("   "), Ok(None));
        assert!(parse_shell_line("delete abc").is_err());
        assert!(parse_shell_line("frobnicate").is_err());
        assert!(parse_shell_line("login onlyuser").is_err());
        assert!(parse_shell_line("comment 5 'open quote").is_err());
    }

    #[test]
    fn help_lists_both_command_sets() {
        let help = parse_shell_line("help").unwrap_err();
        assert!(help.contains("delete-comment"));
        assert!(help.contains("begin-edit"));
    }

    #[test]
    fn empty_quoted_text_reaches_controller() {
        assert_eq!(
            parsed("comment 5 ''"),
            ShellCommand::Board(Commands::Comment { post_id: 5, text: String::new(), page: None })
        );
    }

    #[test]
    fn huge_page_parses_and_is_left_to_the_controller() {
        assert_eq!(
            parsed("posts --page 9223372036854775807"),
            ShellCommand::Board(Commands::Posts { page: i64::MAX as u64, comments: false })
        );
    }

    #[test]
    fn one_shot_page_defaults() {
        let cli = Cli::parse_from(["bbs", "--yes", "delete", "3"]);
        assert!(cli.yes);
        assert_eq!(cli.command, Commands::Delete { id: 3, page: None });
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from(["bbs", "--api-url", "http://example:9000", "--page-size", "10", "posts"]);
        let c = cli.apply(ClientConfig::default());
        assert_eq!(c.api_url, "http://example:9000");
        assert_eq!(c.page_size, 10);
    }
}
