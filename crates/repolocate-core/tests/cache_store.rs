mod support;

use std::fs;

use tempfile::TempDir;

use repolocate_core::cache::CacheStore;
use repolocate_core::identifier::normalize;
use repolocate_core::remotes::LibGitRemotes;

use support::{init_repo, set_origin};

#[test]
fn load_missing_returns_empty_cache() {
    let temp = TempDir::new().unwrap();
    let store = CacheStore::new(temp.path().join("state").join("cache.json"));

    assert!(store.load().is_empty());
}

#[test]
fn corrupt_cache_file_reads_as_empty() {
    let temp = TempDir::new().unwrap();
    let cache_path = temp.path().join("cache.json");
    fs::write(&cache_path, "{ not json").unwrap();
    let store = CacheStore::new(cache_path);

    assert!(store.load().is_empty());

    let id = normalize("github.com/org/repo").unwrap();
    store.store(&id, temp.path()).unwrap();
    assert_eq!(store.load().len(), 1);
}

#[test]
fn store_persists_human_readable_json() {
    let temp = TempDir::new().unwrap();
    let cache_path = temp.path().join("nested").join("cache.json");
    let store = CacheStore::new(cache_path.clone());
    let id = normalize("git@github.com:Org/Repo.git").unwrap();
    let checkout = temp.path().join("repo");

    store.store(&id, &checkout).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&cache_path).unwrap()).unwrap();
    let entry = &raw["github.com/org/repo"];
    assert_eq!(entry["path"], checkout.to_str().unwrap());
    assert!(entry["last_used"].as_str().unwrap().contains('T'));

    let leftovers: Vec<_> = fs::read_dir(cache_path.parent().unwrap())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn lookup_hit_refreshes_timestamp() {
    let temp = TempDir::new().unwrap();
    let checkout = temp.path().join("repo");
    init_repo(&checkout, "https://github.com/org/repo.git");
    let store = CacheStore::new(temp.path().join("cache.json"));
    let id = normalize("github.com/org/repo").unwrap();
    store.store(&id, &checkout).unwrap();
    let before = store.load()[&id].last_used;

    std::thread::sleep(std::time::Duration::from_millis(5));
    assert_eq!(store.lookup(&id, &LibGitRemotes), Some(checkout));

    let after = store.load()[&id].last_used;
    assert!(after > before);
}

#[test]
fn lookup_evicts_deleted_path() {
    let temp = TempDir::new().unwrap();
    let checkout = temp.path().join("repo");
    init_repo(&checkout, "https://github.com/org/repo.git");
    let store = CacheStore::new(temp.path().join("cache.json"));
    let id = normalize("github.com/org/repo").unwrap();
    store.store(&id, &checkout).unwrap();

    fs::remove_dir_all(&checkout).unwrap();

    assert_eq!(store.lookup(&id, &LibGitRemotes), None);
    assert!(!store.load().contains_key(&id));
}

#[test]
fn lookup_evicts_changed_remote() {
    let temp = TempDir::new().unwrap();
    let checkout = temp.path().join("repo");
    init_repo(&checkout, "https://github.com/org/repo.git");
    let store = CacheStore::new(temp.path().join("cache.json"));
    let id = normalize("github.com/org/repo").unwrap();
    store.store(&id, &checkout).unwrap();

    set_origin(&checkout, "https://github.com/someone-else/repo.git");

    assert_eq!(store.lookup(&id, &LibGitRemotes), None);
    assert!(store.load().is_empty());
}

#[test]
fn lookup_leaves_other_entries_alone() {
    let temp = TempDir::new().unwrap();
    let kept = temp.path().join("kept");
    init_repo(&kept, "git@github.com:org/kept.git");
    let store = CacheStore::new(temp.path().join("cache.json"));
    let kept_id = normalize("github.com/org/kept").unwrap();
    let gone_id = normalize("github.com/org/gone").unwrap();
    store.store(&kept_id, &kept).unwrap();
    store.store(&gone_id, &temp.path().join("gone")).unwrap();

    assert_eq!(store.lookup(&gone_id, &LibGitRemotes), None);

    let entries = store.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, kept_id);
}

#[test]
fn evict_and_clear() {
    let temp = TempDir::new().unwrap();
    let store = CacheStore::new(temp.path().join("cache.json"));
    let a = normalize("github.com/org/a").unwrap();
    let b = normalize("github.com/org/b").unwrap();
    store.store(&a, temp.path()).unwrap();
    store.store(&b, temp.path()).unwrap();

    assert!(store.evict(&a).unwrap());
    assert!(!store.evict(&a).unwrap());
    assert_eq!(store.load().len(), 1);

    store.clear().unwrap();
    assert!(store.load().is_empty());
}
