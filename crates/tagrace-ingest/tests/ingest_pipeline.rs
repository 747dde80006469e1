#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use tagrace_core::protocol::stream::{Disconnect, StallWarning, StreamMessage, Tweet};
use tagrace_core::{CounterKey, Result, TagRaceError, WatchList, STALL_EXIT_CODE};
use tagrace_ingest::{exit_code, IngestOutcome, IngestState, Ingestor, MessageSource};
use tagrace_store::{CounterStore, MemoryCounterStore, StoreError, StoreResult};

/// Replays a fixed script; optionally hangs once exhausted (a quiet stream).
struct ScriptedSource {
    script: VecDeque<Result<Option<StreamMessage>>>,
    hang_when_empty: bool,
    stopped: Arc<AtomicBool>,
}

impl ScriptedSource {
    fn new(items: Vec<StreamMessage>) -> (Self, Arc<AtomicBool>) {
        let stopped = Arc::new(AtomicBool::new(false));
        let src = Self {
            script: items.into_iter().map(|m| Ok(Some(m))).collect(),
            hang_when_empty: true,
            stopped: Arc::clone(&stopped),
        };
        (src, stopped)
    }

    fn then(mut self, item: Result<Option<StreamMessage>>) -> Self {
        self.script.push_back(item);
        self.hang_when_empty = false;
        self
    }
}

#[async_trait]
impl MessageSource for ScriptedSource {
    async fn next_message(&mut self) -> Result<Option<StreamMessage>> {
        match self.script.pop_front() {
            Some(item) => item,
            None if self.hang_when_empty => std::future::pending().await,
            None => Ok(None),
        }
    }

    async fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Fails the first `failures` increments.
struct FlakyIncr {
    inner: MemoryCounterStore,
    failures: AtomicU32,
}

#[async_trait]
impl CounterStore for FlakyIncr {
    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
    async fn get(&self, key: &CounterKey) -> StoreResult<Option<i64>> {
        self.inner.get(key).await
    }
    async fn set(&self, key: &CounterKey, value: i64) -> StoreResult<()> {
        self.inner.set(key, value).await
    }
    async fn incr(&self, key: &CounterKey) -> StoreResult<i64> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        self.inner.incr(key).await
    }
}

fn tweet(tags: &[&str]) -> StreamMessage {
    StreamMessage::Tweet(Tweet {
        id: None,
        hashtags: tags.iter().map(|t| t.to_string()).collect(),
    })
}

fn stall() -> StreamMessage {
    StreamMessage::StallWarning(StallWarning {
        code: "FALLING_BEHIND".into(),
        message: "Your connection is falling behind".into(),
        percent_full: Some(60),
    })
}

fn key(s: &str) -> CounterKey {
    CounterKey::from_client(s).unwrap()
}

fn watch_list() -> WatchList {
    WatchList::from_csv("rust,go").unwrap()
}

fn connected<S: MessageSource>(src: S) -> impl std::future::Future<Output = Result<S>> {
    async move { Ok(src) }
}

#[tokio::test]
async fn matched_events_increment_until_stall() {
    let store = Arc::new(MemoryCounterStore::new());
    let mut ingestor = Ingestor::new(store.clone(), watch_list());
    ingestor.initialize().await.unwrap();

    let (src, stopped) = ScriptedSource::new(vec![
        tweet(&["Rust"]),
        tweet(&["#RUST", "unrelated"]),
        tweet(&["go"]),
        tweet(&["python"]),
        stall(),
        tweet(&["rust"]),
    ]);
    let (_tx, rx) = watch::channel(false);

    let outcome = ingestor.run(connected(src), rx).await.unwrap();
    match outcome {
        IngestOutcome::StallWarning(w) => assert_eq!(w.code, "FALLING_BEHIND"),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(stopped.load(Ordering::SeqCst));
    assert_eq!(ingestor.state(), IngestState::Terminated);

    // the event after the stall warning is never applied
    assert_eq!(store.get(&key("rust")).await.unwrap(), Some(2));
    assert_eq!(store.get(&key("go")).await.unwrap(), Some(1));

    let stats = ingestor.stats();
    assert_eq!(stats.seen, 4);
    assert_eq!(stats.matched, 3);
    assert_eq!(stats.incremented, 3);
}

#[tokio::test]
async fn event_with_two_watched_tags_counts_once_for_the_first() {
    let store = Arc::new(MemoryCounterStore::new());
    let mut ingestor = Ingestor::new(store.clone(), watch_list());

    // event order says go first, watch-list order says rust
    let (src, _) = ScriptedSource::new(vec![tweet(&["go", "rust"]), stall()]);
    let (_tx, rx) = watch::channel(false);
    ingestor.run(connected(src), rx).await.unwrap();

    assert_eq!(store.get(&key("rust")).await.unwrap(), Some(1));
    assert_eq!(store.get(&key("go")).await.unwrap(), None);
}

#[tokio::test]
async fn non_tweets_are_ignored() {
    let store = Arc::new(MemoryCounterStore::new());
    let mut ingestor = Ingestor::new(store.clone(), watch_list());

    let (src, _) = ScriptedSource::new(vec![
        StreamMessage::Other,
        StreamMessage::Disconnect(Disconnect {
            code: Some(7),
            stream_name: None,
            reason: "admin logout".into(),
        }),
        tweet(&[]),
        stall(),
    ]);
    let (_tx, rx) = watch::channel(false);
    ingestor.run(connected(src), rx).await.unwrap();

    assert!(store.is_empty());
    let stats = ingestor.stats();
    assert_eq!(stats.ignored, 2);
    assert_eq!(stats.seen, 1);
    assert_eq!(stats.matched, 0);
}

#[tokio::test]
async fn increment_failures_do_not_stop_ingest() {
    let store = Arc::new(FlakyIncr {
        inner: MemoryCounterStore::new(),
        failures: AtomicU32::new(2),
    });
    let mut ingestor = Ingestor::new(store.clone(), watch_list());

    let (src, _) = ScriptedSource::new(vec![
        tweet(&["rust"]),
        tweet(&["rust"]),
        tweet(&["rust"]),
        tweet(&["go"]),
        stall(),
    ]);
    let (_tx, rx) = watch::channel(false);
    let outcome = ingestor.run(connected(src), rx).await.unwrap();
    assert!(matches!(outcome, IngestOutcome::StallWarning(_)));

    assert_eq!(store.get(&key("rust")).await.unwrap(), Some(1));
    assert_eq!(store.get(&key("go")).await.unwrap(), Some(1));
    let stats = ingestor.stats();
    assert_eq!(stats.increment_failed, 2);
    assert_eq!(stats.incremented, 2);
}

#[tokio::test]
async fn initialize_keeps_existing_counts() {
    let store = Arc::new(MemoryCounterStore::with_values([("key.rust", 41)]));
    let ingestor = Ingestor::new(store.clone(), watch_list());

    assert_eq!(ingestor.initialize().await.unwrap(), 1);
    assert_eq!(store.get(&key("rust")).await.unwrap(), Some(41));
    assert_eq!(store.get(&key("go")).await.unwrap(), Some(0));
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_a_quiet_stream() {
    let store = Arc::new(MemoryCounterStore::new());
    let mut ingestor = Ingestor::new(store.clone(), watch_list());

    let (src, stopped) = ScriptedSource::new(vec![tweet(&["go"])]);
    let (tx, rx) = watch::channel(false);

    let trigger = async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        tx.send(true).unwrap();
    };
    let (res, ()) = tokio::join!(ingestor.run(connected(src), rx), trigger);

    assert_eq!(res.unwrap(), IngestOutcome::Shutdown);
    assert!(stopped.load(Ordering::SeqCst));
    assert_eq!(ingestor.state(), IngestState::Terminated);
    assert_eq!(store.get(&key("go")).await.unwrap(), Some(1));
}

#[tokio::test]
async fn shutdown_before_connect_skips_the_stream() {
    let store = Arc::new(MemoryCounterStore::new());
    let mut ingestor = Ingestor::new(store, watch_list());
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    let never = std::future::pending::<Result<ScriptedSource>>();
    assert_eq!(ingestor.run(never, rx).await.unwrap(), IngestOutcome::Shutdown);
    assert_eq!(ingestor.state(), IngestState::Terminated);
}

#[tokio::test]
async fn connect_failure_is_fatal() {
    let store = Arc::new(MemoryCounterStore::new());
    let mut ingestor = Ingestor::new(store, watch_list());
    let (_tx, rx) = watch::channel(false);

    let refused = async { Err::<ScriptedSource, _>(TagRaceError::Stream("401 Unauthorized".into())) };
    let err = ingestor.run(refused, rx).await.unwrap_err();
    assert_eq!(err.client_code().as_str(), "STREAM_FAILED");
    assert_eq!(ingestor.state(), IngestState::Faulted);
}

#[tokio::test]
async fn stream_errors_fault_the_run() {
    let store = Arc::new(MemoryCounterStore::new());
    let mut ingestor = Ingestor::new(store.clone(), watch_list());
    let (_tx, rx) = watch::channel(false);

    let (src, _) = ScriptedSource::new(vec![tweet(&["rust"])]);
    let src = src.then(Err(TagRaceError::Stream("giving up after 5 reconnect attempts".into())));
    let err = ingestor.run(connected(src), rx).await.unwrap_err();
    assert!(err.to_string().contains("reconnect"));
    assert_eq!(ingestor.state(), IngestState::Faulted);
    assert_eq!(store.get(&key("rust")).await.unwrap(), Some(1));
}

#[tokio::test]
async fn end_of_stream_is_an_error() {
    let store = Arc::new(MemoryCounterStore::new());
    let mut ingestor = Ingestor::new(store, watch_list());
    let (_tx, rx) = watch::channel(false);

    let (src, _) = ScriptedSource::new(vec![]);
    let src = src.then(Ok(None));
    assert!(ingestor.run(connected(src), rx).await.is_err());
    assert_eq!(ingestor.state(), IngestState::Faulted);
}

#[tokio::test]
async fn run_results_map_to_exit_status() {
    let (_tx, rx) = watch::channel(false);
    let mut ingestor = Ingestor::new(Arc::new(MemoryCounterStore::new()), watch_list());
    let (src, _) = ScriptedSource::new(vec![tweet(&["rust"]), stall()]);
    let stalled = ingestor.run(connected(src), rx).await;
    assert_eq!(exit_code(&stalled), STALL_EXIT_CODE);
    assert_eq!(exit_code(&stalled), 24);

    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();
    let mut ingestor = Ingestor::new(Arc::new(MemoryCounterStore::new()), watch_list());
    let (src, _) = ScriptedSource::new(vec![]);
    let stopped = ingestor.run(connected(src), rx).await;
    assert_eq!(exit_code(&stopped), 0);

    let (_tx, rx) = watch::channel(false);
    let mut ingestor = Ingestor::new(Arc::new(MemoryCounterStore::new()), watch_list());
    let refused = async { Err::<ScriptedSource, _>(TagRaceError::Stream("401".into())) };
    let faulted = ingestor.run(refused, rx).await;
    assert_eq!(exit_code(&faulted), 1);
}
