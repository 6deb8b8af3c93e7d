use std::fs;
use tempfile::TempDir;

use profilerag_core::config::{resolve_with_base, Config, EmbeddingBackend, IndexBackend, Settings};
use profilerag_core::ErrorKind;

#[test]
fn defaults_apply_without_files() {
    let tmp = TempDir::new().unwrap();
    let settings = Config::load_in(tmp.path(), "dev").unwrap().settings().unwrap();
    assert_eq!(settings.cache.capacity, 200);
    assert_eq!(settings.cache.ttl_secs, 300);
    assert_eq!(settings.query.default_top_k, 5);
    assert_eq!(settings.query.min_candidates, 10);
    assert_eq!(settings.query.context_budget, 1600);
    assert_eq!(settings.embedding.dim, 384);
    assert_eq!(settings.index.backend, IndexBackend::Memory);
}

#[test]
fn env_file_overrides_base_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[cache]\ncapacity = 50\n\n[embedding]\nbackend = \"hash\"\n\n[corpus]\npath = \"data/profile.json\"\n",
    )
    .unwrap();
    fs::write(tmp.path().join("config.test.toml"), "[cache]\ncapacity = 7\n").unwrap();

    let config = Config::load_in(tmp.path(), "test").unwrap();
    let settings = config.settings().unwrap();
    assert_eq!(settings.cache.capacity, 7);
    assert_eq!(settings.embedding.backend, EmbeddingBackend::Hash);
    assert_eq!(settings.corpus.path.as_deref(), Some(tmp.path().join("data/profile.json").to_str().unwrap()));
    let ttl: u64 = config.get("cache.ttl_secs").unwrap();
    assert_eq!(ttl, 300);
}

#[test]
fn invalid_values_are_rejected() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[query]\nconfidence_floor = 1.5\n").unwrap();
    let err = Config::load_in(tmp.path(), "dev").unwrap().settings().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);

    let mut settings = Settings::default();
    settings.cache.capacity = 0;
    assert!(settings.validate().is_err());
}

#[test]
fn relative_paths_resolve_against_base() {
    let base = std::path::Path::new("/srv/profilerag");
    assert_eq!(resolve_with_base(base, "models"), base.join("models"));
    assert_eq!(resolve_with_base(base, "/abs/models"), std::path::PathBuf::from("/abs/models"));
}
