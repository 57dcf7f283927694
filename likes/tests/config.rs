use likes::config::Settings;
use likes::db::ConnectionSpec;
use likes::Error;
use likes_test_helper::*;
use pretty_assertions::assert_eq;

#[test_log::test]
fn save_and_load_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::new(ConnectionSpec::new("sqlite", "likes.db"));
    settings.utc_offset_minutes = 120;
    settings.pool_size = 2;
    settings.save(dir.path()).unwrap();
    assert!(dir.path().join("settings.json").exists());
    assert_eq!(Settings::load(dir.path()).unwrap(), settings);
}

#[test_log::test]
fn missing_or_broken_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(Settings::load(dir.path()), Err(Error::Config(_))));
    std::fs::write(dir.path().join("settings.json"), "{").unwrap();
    assert!(matches!(Settings::load(dir.path()), Err(Error::Config(_))));
}

#[test_log::test]
fn now_uses_configured_offset() {
    let mut settings = Settings::new(sqlite_connspec());
    settings.utc_offset_minutes = 330;
    assert_eq!(settings.now().unwrap().offset().local_minus_utc(), 330 * 60);
}

#[test_log::test]
fn pool_connects_to_configured_database() {
    let data = sqlite_file_setup();
    let mut settings = Settings::new(data.connspec());
    settings.pool_size = 0;
    assert!(matches!(settings.pool(), Err(Error::Config(_))));

    settings.pool_size = 2;
    let pool = settings.pool().unwrap();
    let conn = pool.get().unwrap();
    assert!(conn.has_table("likes").unwrap());
}
