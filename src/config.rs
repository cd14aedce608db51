use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_PAGE_SIZE: u64 = 5;

/// Which page to show after a mutation succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadTarget {
    CurrentPage,
    FirstPage,
}

impl FromStr for ReloadTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current" | "current-page" => Ok(ReloadTarget::CurrentPage),
            "first" | "first-page" => Ok(ReloadTarget::FirstPage),
            other => Err(format!("unknown reload target '{other}' (expected 'current' or 'first')")),
        }
    }
}

/// Client settings, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub page_size: u64,
    pub data_dir: PathBuf,
    /// Display option only; the server order is unchanged.
    pub newest_first: bool,
    pub reload_after_edit: ReloadTarget,
    pub reload_after_delete: ReloadTarget,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            data_dir: PathBuf::from(".bbs"),
            newest_first: false,
            reload_after_edit: ReloadTarget::CurrentPage,
            reload_after_delete: ReloadTarget::FirstPage,
        }
    }
}

impl ClientConfig {
    /// Reads `BBS_*` variables, falling back to defaults for anything unset
    /// or unparsable.
    pub fn from_env() -> Self {
        fn parsed<T: FromStr>(name: &str, default: T) -> T
        where
            T::Err: std::fmt::Display,
        {
            match std::env::var(name) {
                Ok(raw) => raw.parse().unwrap_or_else(|e| {
                    warn!("ignoring {name}={raw:?}: {e}");
                    default
                }),
                Err(_) => default,
            }
        }
        fn flag(name: &str) -> bool {
            std::env::var(name).map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
        }

        let d = Self::default();
        let mut page_size = parsed("BBS_PAGE_SIZE", d.page_size);
        if page_size == 0 {
            warn!("BBS_PAGE_SIZE must be positive; using {DEFAULT_PAGE_SIZE}");
            page_size = DEFAULT_PAGE_SIZE;
        }
        Self {
            api_url: std::env::var("BBS_API_URL").unwrap_or(d.api_url),
            page_size,
            data_dir: std::env::var("BBS_DATA_DIR").map(PathBuf::from).unwrap_or(d.data_dir),
            newest_first: flag("BBS_NEWEST_FIRST"),
            reload_after_edit: parsed("BBS_RELOAD_AFTER_EDIT", d.reload_after_edit),
            reload_after_delete: parsed("BBS_RELOAD_AFTER_DELETE", d.reload_after_delete),
        }
    }

    pub fn snapshot_path(&self) -> PathBuf { self.data_dir.join("board.json") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_target_parses() {
        assert_eq!("first".parse::<ReloadTarget>().unwrap(), ReloadTarget::FirstPage);
        assert_eq!(" Current ".parse::<ReloadTarget>().unwrap(), ReloadTarget::CurrentPage);
        assert!("last".parse::<ReloadTarget>().is_err());
    }

    #[test]
    fn defaults() {
        let c = ClientConfig::default();
        assert_eq!(c.page_size, 5);
        assert_eq!(c.reload_after_edit, ReloadTarget::CurrentPage);
        assert_eq!(c.reload_after_delete, ReloadTarget::FirstPage);
    }
}
