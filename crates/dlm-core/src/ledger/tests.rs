//! Tests for the ledger (in-memory DB helper from db).

use super::db::open_memory;
use super::Ledger;

#[tokio::test]
async fn add_then_contains() {
    let ledger = open_memory().await.unwrap();
    assert!(ledger.is_empty());
    assert!(!ledger.contains("https://dl.example/a.mkv"));

    assert!(ledger.add("https://dl.example/a.mkv").await.unwrap());
    assert!(ledger.contains("https://dl.example/a.mkv"));
    assert!(!ledger.contains("https://dl.example/b.mkv"));
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn duplicate_add_is_ignored() {
    let ledger = open_memory().await.unwrap();
    assert!(ledger.add("id-1").await.unwrap());
    assert!(!ledger.add("id-1").await.unwrap());
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.entries(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn entries_newest_first_with_limit() {
    let ledger = open_memory().await.unwrap();
    for id in ["one", "two", "three"] {
        ledger.add(id).await.unwrap();
    }
    let all = ledger.entries(None).await.unwrap();
    let ids: Vec<_> = all.iter().map(|e| e.identity.as_str()).collect();
    assert_eq!(ids, vec!["three", "two", "one"]);

    let limited = ledger.entries(Some(2)).await.unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].identity, "three");
}

#[tokio::test]
async fn concurrent_adds_from_clones() {
    let ledger = open_memory().await.unwrap();
    let mut handles = Vec::new();
    for i in 0..16 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            ledger.add(&format!("id-{}", i % 8)).await.unwrap()
        }));
    }
    let mut inserted = 0;
    for h in handles {
        if h.await.unwrap() {
            inserted += 1;
        }
    }
    assert_eq!(inserted, 8);
    assert_eq!(ledger.len(), 8);
}

#[tokio::test]
async fn survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state dir").join("ledger.db");
    {
        let ledger = Ledger::open_at(&path).await.unwrap();
        ledger.add("https://dl.example/kept.mkv").await.unwrap();
    }
    let reopened = Ledger::open_at(&path).await.unwrap();
    assert!(reopened.contains("https://dl.example/kept.mkv"));
    assert_eq!(reopened.len(), 1);
}
