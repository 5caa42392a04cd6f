mod common;

use async_trait::async_trait;
use common::{quote, store_with, ProbeKv};
use quotebook_core::{
    FormatError, MergeStrategy, ReconcileOutcome, Reconciler, ReconcilerSettings, RemoteFormat,
    RemoteSource, SharedStore, SyncError, SyncState,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex, Notify};

enum Reply {
    Document(Value),
    Fail(&'static str),
    Hang,
}

struct ScriptedRemote {
    reply: Reply,
    calls: AtomicUsize,
}

impl ScriptedRemote {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSource for ScriptedRemote {
    async fn fetch(&self, _url: &str) -> Result<Value, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Document(value) => Ok(value.clone()),
            Reply::Fail(message) => Err(SyncError::Transport((*message).to_string())),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(json!([]))
            }
        }
    }
}

/// Remote that parks inside `fetch` until released.
struct GatedRemote {
    entered: Notify,
    release: Notify,
    document: Value,
}

#[async_trait]
impl RemoteSource for GatedRemote {
    async fn fetch(&self, _url: &str) -> Result<Value, SyncError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.document.clone())
    }
}

fn settings(strategy: MergeStrategy) -> ReconcilerSettings {
    ReconcilerSettings {
        url: "https://example.invalid/quotes".to_string(),
        interval: Duration::from_secs(60),
        timeout: Duration::from_secs(5),
        strategy,
        format: RemoteFormat::Quotes,
    }
}

fn shared_ab() -> (SharedStore<ProbeKv>, ProbeKv) {
    let (store, probe) = store_with(&[quote("A", "x"), quote("B", "y")]);
    (Arc::new(Mutex::new(store)), probe)
}

#[tokio::test]
async fn successful_reconcile_overwrites_local_collection() {
    let (store, probe) = shared_ab();
    let remote = ScriptedRemote::new(Reply::Document(json!([{ "text": "C", "category": "z" }])));
    let reconciler = Reconciler::new(
        Arc::clone(&store),
        remote.clone(),
        settings(MergeStrategy::Overwrite),
    );

    let outcome = reconciler.reconcile().await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Applied { count: 1 });
    assert_eq!(store.lock().await.all(), &[quote("C", "z")]);
    assert_eq!(
        quotebook_core::import_document(&probe.raw("quotes").unwrap()).unwrap(),
        vec![quote("C", "z")]
    );
    assert_eq!(reconciler.state(), SyncState::Idle);
}

#[tokio::test]
async fn failed_fetch_leaves_collection_and_reports_transport_error() {
    let (store, _) = shared_ab();
    let remote = ScriptedRemote::new(Reply::Fail("connection refused"));
    let reconciler = Reconciler::new(
        Arc::clone(&store),
        remote.clone(),
        settings(MergeStrategy::Overwrite),
    );

    let err = reconciler.reconcile().await.unwrap_err();

    assert!(matches!(err, SyncError::Transport(_)));
    assert_eq!(remote.calls(), 1);
    assert_eq!(
        store.lock().await.all(),
        &[quote("A", "x"), quote("B", "y")]
    );
    assert_eq!(reconciler.state(), SyncState::Idle);
}

#[tokio::test]
async fn malformed_remote_document_is_rejected_without_changes() {
    let (store, _) = shared_ab();
    let remote = ScriptedRemote::new(Reply::Document(json!({ "quotes": [] })));
    let reconciler = Reconciler::new(Arc::clone(&store), remote, settings(MergeStrategy::Overwrite));

    let err = reconciler.reconcile().await.unwrap_err();

    assert!(matches!(err, SyncError::Format(FormatError::NotAnArray)));
    assert_eq!(store.lock().await.len(), 2);
}

#[tokio::test]
async fn store_write_failure_rolls_back_and_surfaces_store_error() {
    let (store, probe) = shared_ab();
    let before = probe.raw("quotes");
    probe.fail_writes(true);
    let remote = ScriptedRemote::new(Reply::Document(json!([{ "text": "C", "category": "z" }])));
    let reconciler = Reconciler::new(Arc::clone(&store), remote, settings(MergeStrategy::Overwrite));

    let err = reconciler.reconcile().await.unwrap_err();

    assert!(matches!(err, SyncError::Store(_)));
    assert_eq!(
        store.lock().await.all(),
        &[quote("A", "x"), quote("B", "y")]
    );
    assert_eq!(probe.raw("quotes"), before);
    assert_eq!(reconciler.state(), SyncState::Idle);
}

#[tokio::test(start_paused = true)]
async fn hung_fetch_times_out_and_releases_latch() {
    let (store, _) = shared_ab();
    let remote = ScriptedRemote::new(Reply::Hang);
    let reconciler = Reconciler::new(Arc::clone(&store), remote, settings(MergeStrategy::Overwrite));

    let err = reconciler.reconcile().await.unwrap_err();

    assert!(matches!(err, SyncError::Timeout(limit) if limit == Duration::from_secs(5)));
    assert_eq!(err.code(), "sync_timeout");
    assert_eq!(reconciler.state(), SyncState::Idle);
    assert_eq!(store.lock().await.len(), 2);
}

#[tokio::test]
async fn trigger_while_syncing_is_dropped_and_store_stays_writable() {
    let (store, _) = shared_ab();
    let remote = Arc::new(GatedRemote {
        entered: Notify::new(),
        release: Notify::new(),
        document: json!([{ "text": "C", "category": "z" }]),
    });
    let reconciler = Reconciler::new(
        Arc::clone(&store),
        remote.clone(),
        settings(MergeStrategy::Overwrite),
    );

    let (first, second) = tokio::join!(reconciler.reconcile(), async {
        remote.entered.notified().await;
        assert_eq!(reconciler.state(), SyncState::Syncing);
        let skipped = reconciler.reconcile().await;
        store.lock().await.add("D", "w").unwrap();
        remote.release.notify_one();
        skipped
    });

    assert_eq!(second.unwrap(), ReconcileOutcome::Skipped);
    assert_eq!(first.unwrap(), ReconcileOutcome::Applied { count: 1 });
    assert_eq!(store.lock().await.all(), &[quote("C", "z")]);
}

#[tokio::test]
async fn append_new_only_keeps_local_and_skips_known_text() {
    let (store, _) = shared_ab();
    let remote = ScriptedRemote::new(Reply::Document(json!([
        { "text": "B", "category": "server" },
        { "text": "C", "category": "z" }
    ])));
    let reconciler = Reconciler::new(
        Arc::clone(&store),
        remote,
        settings(MergeStrategy::AppendNewOnly),
    );

    let outcome = reconciler.reconcile().await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Applied { count: 3 });
    assert_eq!(
        store.lock().await.all(),
        &[quote("A", "x"), quote("B", "y"), quote("C", "z")]
    );
}

#[tokio::test(start_paused = true)]
async fn periodic_loop_reports_each_run_and_stops_on_shutdown() {
    let (store, _) = shared_ab();
    let remote = ScriptedRemote::new(Reply::Document(json!([{ "text": "C", "category": "z" }])));
    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&store),
        remote.clone(),
        settings(MergeStrategy::Overwrite),
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (reports_tx, mut reports_rx) = mpsc::unbounded_channel();

    let started = tokio::time::Instant::now();
    let handle = Arc::clone(&reconciler).spawn_periodic(shutdown_rx, reports_tx);

    let first = reports_rx.recv().await.unwrap();
    assert_eq!(first.unwrap(), ReconcileOutcome::Applied { count: 1 });
    assert!(started.elapsed() >= Duration::from_secs(60));

    let second = reports_rx.recv().await.unwrap();
    assert!(second.is_ok());
    assert_eq!(remote.calls(), 2);

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
    assert!(reports_rx.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn periodic_failures_are_reported_once_per_fire() {
    let (store, _) = shared_ab();
    let remote = ScriptedRemote::new(Reply::Fail("offline"));
    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&store),
        remote.clone(),
        settings(MergeStrategy::Overwrite),
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (reports_tx, mut reports_rx) = mpsc::unbounded_channel();
    let handle = Arc::clone(&reconciler).spawn_periodic(shutdown_rx, reports_tx);

    let report = reports_rx.recv().await.unwrap();
    assert!(matches!(report, Err(SyncError::Transport(_))));
    assert_eq!(remote.calls(), 1);
    assert_eq!(store.lock().await.len(), 2);

    drop(shutdown_tx);
    handle.await.unwrap();
}

#[tokio::test]
async fn unbounded_durations_are_clamped_instead_of_panicking() {
    let (store, _) = shared_ab();
    let remote = ScriptedRemote::new(Reply::Document(json!([{ "text": "C", "category": "z" }])));
    let mut unbounded = settings(MergeStrategy::Overwrite);
    unbounded.interval = Duration::MAX;
    unbounded.timeout = Duration::MAX;
    let reconciler = Arc::new(Reconciler::new(Arc::clone(&store), remote.clone(), unbounded));

    assert_eq!(
        reconciler.reconcile().await.unwrap(),
        ReconcileOutcome::Applied { count: 1 }
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (reports_tx, mut reports_rx) = mpsc::unbounded_channel();
    let handle = Arc::clone(&reconciler).spawn_periodic(shutdown_rx, reports_tx);
    tokio::task::yield_now().await;

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
    assert!(reports_rx.recv().await.is_none());
    assert_eq!(remote.calls(), 1);
}
