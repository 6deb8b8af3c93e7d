use std::time::Duration;

use profilerag_core::types::{QueryResponse, Source};
use profilerag_engine::{CacheKey, ResponseCache};

fn response(answer: &str) -> QueryResponse {
    QueryResponse { answer: answer.to_string(), sources: vec![Source { text: "t".into(), score: 0.5 }], confidence: 0.5 }
}

fn key(q: &str) -> CacheKey {
    CacheKey::new(q, 5)
}

#[test]
fn overflow_evicts_exactly_the_oldest_entry() {
    let cache = ResponseCache::new(3, Duration::from_secs(60));
    for q in ["a", "b", "c", "d"] {
        cache.put(key(q), response(q));
    }
    assert_eq!(cache.len(), 3);
    assert!(!cache.contains(&key("a")));
    for q in ["b", "c", "d"] {
        assert!(cache.contains(&key(q)));
    }
}

#[test]
fn hit_promotes_entry_past_eviction() {
    let cache = ResponseCache::new(3, Duration::from_secs(60));
    for q in ["a", "b", "c"] {
        cache.put(key(q), response(q));
    }
    assert_eq!(cache.get(&key("a")).unwrap().answer, "a");
    cache.put(key("d"), response("d"));
    assert!(cache.contains(&key("a")));
    assert!(!cache.contains(&key("b")));
}

#[test]
fn reinsert_replaces_and_promotes() {
    let cache = ResponseCache::new(2, Duration::from_secs(60));
    cache.put(key("a"), response("a1"));
    cache.put(key("b"), response("b"));
    cache.put(key("a"), response("a2"));
    cache.put(key("c"), response("c"));
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get(&key("a")).unwrap().answer, "a2");
    assert!(!cache.contains(&key("b")));
}

#[test]
fn top_k_is_part_of_the_key() {
    let cache = ResponseCache::new(10, Duration::from_secs(60));
    cache.put(CacheKey::new("q", 1), response("one"));
    assert!(cache.get(&CacheKey::new("q", 2)).is_none());
    assert_eq!(cache.get(&CacheKey::new("q", 1)).unwrap().answer, "one");
}

#[test]
fn expired_entry_is_removed_on_lookup() {
    let cache = ResponseCache::new(10, Duration::from_millis(20));
    cache.put(key("a"), response("a"));
    std::thread::sleep(Duration::from_millis(50));
    assert!(cache.get(&key("a")).is_none());
    assert!(cache.is_empty());

    let stats = cache.stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 1);
}

#[test]
fn clear_drops_everything() {
    let cache = ResponseCache::new(10, Duration::from_secs(60));
    cache.put(key("a"), response("a"));
    cache.put(key("b"), response("b"));
    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.get(&key("a")).is_none());
}
