// Tests for per-job dedup registries

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use trawler_core::{Category, DedupRegistry, Registries};

#[test]
fn test_first_claim_wins() {
    let registry = DedupRegistry::new();
    assert!(registry.try_claim("http://example.com/a"));
    assert!(!registry.try_claim("http://example.com/a"));
    assert!(!registry.try_claim("http://example.com/a"));
    assert!(registry.try_claim("http://example.com/b"));
    assert_eq!(registry.len(), 2);
    assert!(registry.contains("http://example.com/b"));
}

#[test]
fn test_categories_are_independent() {
    let registries = Registries::new();
    assert!(registries.try_claim(Category::Url, "http://example.com/x"));
    assert!(registries.try_claim(Category::Robots, "http://example.com/x"));
    assert!(registries.try_claim(Category::Sitemap, "http://example.com/x"));
    assert!(!registries.try_claim(Category::Url, "http://example.com/x"));

    let counts = registries.counts();
    assert_eq!(counts.get(&Category::Url), Some(&1));
    assert_eq!(counts.get(&Category::Robots), Some(&1));
    assert_eq!(counts.get(&Category::Form), None);
}

#[test]
fn test_repeated_keys_accepted_once_per_distinct_key() {
    let registry = DedupRegistry::new();
    let keys = ["a", "b", "a", "c", "b", "a", "d", "c"];
    let accepted: Vec<&str> = keys
        .iter()
        .copied()
        .filter(|key| registry.try_claim(key))
        .collect();
    assert_eq!(accepted, vec!["a", "b", "c", "d"]);
}

#[test]
fn test_concurrent_claims_are_atomic() {
    const THREADS: usize = 8;
    const KEYS: usize = 1000;

    let registry = Arc::new(DedupRegistry::new());
    let wins = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = registry.clone();
            let wins = wins.clone();
            thread::spawn(move || {
                let mut mine = HashSet::new();
                // each thread walks the keys in a different order
                for i in 0..KEYS {
                    let key = format!("http://example.com/{}", (i * (t + 1) * 7919) % KEYS);
                    if registry.try_claim(&key) {
                        wins.fetch_add(1, Ordering::SeqCst);
                        assert!(mine.insert(key), "same thread won a key twice");
                    }
                }
                mine
            })
        })
        .collect();

    let mut all_won: HashSet<String> = HashSet::new();
    for handle in handles {
        for key in handle.join().unwrap() {
            assert!(all_won.insert(key), "two threads won the same key");
        }
    }

    assert_eq!(registry.len(), all_won.len());
    assert_eq!(wins.load(Ordering::SeqCst), all_won.len());
}
