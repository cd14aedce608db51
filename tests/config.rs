use bbs_client::config::{ClientConfig, ReloadTarget, DEFAULT_PAGE_SIZE};
use serial_test::serial;

const VARS: &[&str] = &[
    "BBS_API_URL",
    "BBS_PAGE_SIZE",
    "BBS_DATA_DIR",
    "BBS_NEWEST_FIRST",
    "BBS_RELOAD_AFTER_EDIT",
    "BBS_RELOAD_AFTER_DELETE",
];

fn clear_env() {
    for v in VARS {
        std::env::remove_var(v);
    }
}

#[test]
#[serial]
fn unset_env_gives_defaults() {
    clear_env();
    assert_eq!(ClientConfig::from_env(), ClientConfig::default());
}

#[test]
#[serial]
fn env_overrides_are_read() {
    clear_env();
    std::env::set_var("BBS_API_URL", "http://board.local:9000");
    std::env::set_var("BBS_PAGE_SIZE", "10");
    std::env::set_var("BBS_DATA_DIR", "/tmp/bbs-test");
    std::env::set_var("BBS_NEWEST_FIRST", "true");
    std::env::set_var("BBS_RELOAD_AFTER_DELETE", "current");
    let c = ClientConfig::from_env();
    assert_eq!(c.api_url, "http://board.local:9000");
    assert_eq!(c.page_size, 10);
    assert!(c.newest_first);
    assert_eq!(c.reload_after_delete, ReloadTarget::CurrentPage);
    assert_eq!(c.snapshot_path(), std::path::PathBuf::from("/tmp/bbs-test/board.json"));
    clear_env();
}

#[test]
#[serial]
fn bad_values_fall_back() {
    clear_env();
    std::env::set_var("BBS_PAGE_SIZE", "0");
    std::env::set_var("BBS_RELOAD_AFTER_EDIT", "sideways");
    let c = ClientConfig::from_env();
    assert_eq!(c.page_size, DEFAULT_PAGE_SIZE);
    assert_eq!(c.reload_after_edit, ReloadTarget::CurrentPage);

    std::env::set_var("BBS_PAGE_SIZE", "many");
    assert_eq!(ClientConfig::from_env().page_size, DEFAULT_PAGE_SIZE);
    clear_env();
}
