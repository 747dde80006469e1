#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tagrace_core::{first_match, normalize_tag, WatchList, WatchedTag};

fn watch(tags: &[&str]) -> WatchList {
    WatchList::new(tags.iter().copied()).unwrap()
}

#[test]
fn normalize_strips_hash_and_case() {
    assert_eq!(normalize_tag("#Rust"), "rust");
    assert_eq!(normalize_tag("  ##GoLang "), "golang");
    assert_eq!(normalize_tag("plain"), "plain");
}

#[test]
fn matches_case_and_hash_insensitively() {
    let w = watch(&["#Rust", "golang"]);
    let hit = w.first_match(&["RUST"]).unwrap();
    assert_eq!(hit.name(), "rust");

    let hit = w.first_match(&["#GoLang"]).unwrap();
    assert_eq!(hit.name(), "golang");
}

#[test]
fn first_watch_list_entry_wins() {
    let w = watch(&["rust", "golang"]);
    // event order puts golang first, watch-list order still picks rust
    let hit = w.first_match(&["golang", "rust"]).unwrap();
    assert_eq!(hit.name(), "rust");

    let w = watch(&["golang", "rust"]);
    let hit = w.first_match(&["rust", "golang"]).unwrap();
    assert_eq!(hit.name(), "golang");
}

#[test]
fn no_match_cases() {
    let w = watch(&["rust", "golang"]);
    assert!(w.first_match(&["python", "java"]).is_none());
    assert!(w.first_match::<&str>(&[]).is_none());
    // substring is not a match
    assert!(w.first_match(&["rustacean"]).is_none());
}

#[test]
fn free_function_agrees_with_watch_list() {
    let tags = vec![WatchedTag::parse("a").unwrap(), WatchedTag::parse("b").unwrap()];
    let hashtags = vec!["B".to_string(), "A".to_string()];
    assert_eq!(first_match(&tags, &hashtags).unwrap().name(), "a");
}

#[test]
fn watch_list_from_csv() {
    let w = WatchList::from_csv("#Rust, golang,,").unwrap();
    assert_eq!(w.len(), 2);
    assert_eq!(w.tags()[0].name(), "rust");
    assert_eq!(w.track_terms(), vec!["#Rust".to_string(), "golang".to_string()]);
}

#[test]
fn watch_list_rejects_empty_and_duplicates() {
    let err = WatchList::from_csv(" , ").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");

    let err = WatchList::from_csv("rust,#RUST").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");

    assert!(WatchedTag::parse("#").is_err());
}
