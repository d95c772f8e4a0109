use filestore_core::config;

// Only test in this binary, so the variables cannot leak into other tests.
#[test]
fn environment_overrides_file_and_defaults() {
    std::env::set_var("FILESTORE_STORAGE__ROOT", "/tmp/filestore-env");
    std::env::set_var("FILESTORE_LIMITS__MAX_FILE_SIZE", "0");
    std::env::set_var("FILESTORE_LIMITS__ALLOWED_EXTENSIONS", "pdf,txt");

    let cfg = config::load(None).unwrap();
    assert_eq!(cfg.storage.root, "/tmp/filestore-env");
    assert_eq!(cfg.storage.index_file, config::DEFAULT_INDEX_FILE);
    assert_eq!(cfg.limits.max_file_size, 0);
    assert_eq!(cfg.limits.allowed_extensions, vec!["pdf", "txt"]);
}
