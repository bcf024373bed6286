//! The per-editing-context autosave session.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::AutosaveConfig;
use crate::error::Result;
use crate::models::{DraftId, DraftPatch, DraftSnapshot};
use crate::remote::{DraftRepository, RemoteError};
use crate::snapshot::{SnapshotKey, SnapshotStore};
use crate::util::now_ms;

use super::reconcile::{fold_resolved_image, ReconcileOutcome, Reconciler};
use super::scheduler::{Scheduler, TickFlow};
use super::SessionStart;

/// Where a session currently is in its sync lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Session started, nothing edited yet
    Idle,
    /// An edit is waiting out the debounce
    Editing,
    /// The latest edits are in the local snapshot store
    LocalSynced,
    /// A remote sync call is in flight
    RemoteSyncing,
    /// The remote record matches the last captured snapshot
    RemoteSynced,
    /// The last remote sync failed; retried on the next tick unless the
    /// binding was lost
    Error,
    /// Stopped; no further timers fire
    Closed,
}

struct SessionState {
    snapshot: DraftSnapshot,
    phase: SessionPhase,
    edit_version: u64,
    in_flight: bool,
    stopped: bool,
    remote_halted: bool,
    last_error: Option<String>,
    last_synced_at: Option<i64>,
    consecutive_failures: u32,
    store_degraded: bool,
    image_applied_at: i64,
}

struct SessionInner {
    config: AutosaveConfig,
    store: Arc<dyn SnapshotStore>,
    reconciler: Reconciler,
    scheduler: Scheduler,
    key: SnapshotKey,
    state: Mutex<SessionState>,
}

/// An active editing session.
///
/// Each editing context constructs its own session: timers, the in-flight
/// guard, and all sync state are instance state, never shared across
/// sessions or tabs. Must be started from within a tokio runtime.
pub struct AutosaveSession {
    inner: Arc<SessionInner>,
}

impl AutosaveSession {
    /// Start a session and its timers.
    ///
    /// If the initial fields are already non-empty (e.g. resumed from
    /// recovery), one remote tick runs immediately instead of waiting out
    /// the first interval.
    #[must_use]
    pub fn start(
        config: AutosaveConfig,
        store: Arc<dyn SnapshotStore>,
        repo: Arc<dyn DraftRepository>,
        init: SessionStart,
    ) -> Self {
        let scheduler = Scheduler::new(config.debounce, config.tick_interval);
        let immediate = init.snapshot.fields.is_substantial();

        let inner = Arc::new(SessionInner {
            config,
            store,
            reconciler: Reconciler::new(repo),
            scheduler,
            key: init.key,
            state: Mutex::new(SessionState {
                snapshot: init.snapshot,
                phase: SessionPhase::Idle,
                edit_version: 0,
                in_flight: false,
                stopped: false,
                remote_halted: false,
                last_error: None,
                last_synced_at: None,
                consecutive_failures: 0,
                store_degraded: false,
                image_applied_at: 0,
            }),
        });

        let tick_inner = Arc::clone(&inner);
        inner.scheduler.spawn_ticker(immediate, move || {
            let inner = Arc::clone(&tick_inner);
            async move { SessionInner::run_tick(&inner).await }
        });

        Self { inner }
    }

    /// Record a field edit; the local snapshot write is debounced.
    pub fn notify_edit(&self, patch: DraftPatch) {
        let version = {
            let mut state = self.inner.state.lock();
            if state.stopped {
                return;
            }
            state.snapshot.fields.apply(patch);
            state.phase = SessionPhase::Editing;
            state.edit_version += 1;
            state.edit_version
        };

        let inner = Arc::clone(&self.inner);
        self.inner
            .scheduler
            .spawn_debounce(move || SessionInner::commit_local(&inner, version));
    }

    /// Mark a cover-image upload as started.
    pub fn begin_upload(&self) {
        let mut state = self.inner.state.lock();
        if state.stopped {
            return;
        }
        state.snapshot.upload.in_progress = true;
        state.snapshot.upload.progress_percent = 0;
    }

    /// Report progress of the running upload.
    pub fn set_upload_progress(&self, percent: u8) {
        let mut state = self.inner.state.lock();
        if state.stopped {
            return;
        }
        state.snapshot.upload.progress_percent = percent.min(100);
    }

    /// Record a resolved upload.
    ///
    /// The reference is folded into the next tick's payload; a tick already
    /// in flight is unaffected and never waited on.
    pub fn complete_upload(&self, reference: impl Into<String>) {
        let version = {
            let mut state = self.inner.state.lock();
            if state.stopped {
                return;
            }
            state.snapshot.upload.resolve(reference, now_ms());
            state.edit_version += 1;
            state.edit_version
        };

        let inner = Arc::clone(&self.inner);
        self.inner
            .scheduler
            .spawn_debounce(move || SessionInner::commit_local(&inner, version));
    }

    /// Stop the session: cancels both timers; no tick fires after return.
    ///
    /// Safe to call while a tick is in flight — the call completes and its
    /// result is applied if it still matches the current binding, but no
    /// new tick is scheduled.
    pub fn stop(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.stopped {
                return;
            }
            state.stopped = true;
            if !state.in_flight {
                state.phase = SessionPhase::Closed;
            }
        }
        self.inner.scheduler.stop();
        tracing::debug!("Autosave session stopped");
    }

    /// Stop the session and clear its local snapshot slot.
    ///
    /// Called on successful publish, discard, or manual save-as-final: the
    /// local copy has served its purpose.
    pub fn finish(&self) -> Result<()> {
        self.stop();
        self.inner.store.clear(&self.inner.key)
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.inner.state.lock().phase
    }

    /// The remote draft this session is bound to, if any.
    #[must_use]
    pub fn remote_id(&self) -> Option<DraftId> {
        self.inner.state.lock().snapshot.remote_id
    }

    /// Timestamp of the last successful remote sync (Unix ms).
    #[must_use]
    pub fn last_synced_at(&self) -> Option<i64> {
        self.inner.state.lock().last_synced_at
    }

    /// The last autosave error, kept for optional display; retry is the
    /// default recovery path.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.inner.state.lock().last_error.clone()
    }

    /// Whether sync trouble has escalated past silent retry: either the
    /// remote binding was lost, or the configured number of consecutive
    /// transient failures was reached.
    #[must_use]
    pub fn needs_attention(&self) -> bool {
        let state = self.inner.state.lock();
        state.remote_halted
            || state.consecutive_failures >= self.inner.config.failure_escalation_threshold
    }

    /// Whether local snapshot writes have failed and the session is running
    /// remote-only.
    #[must_use]
    pub fn local_degraded(&self) -> bool {
        self.inner.state.lock().store_degraded
    }

    /// A copy of the current snapshot (for the publish path and UI).
    #[must_use]
    pub fn snapshot(&self) -> DraftSnapshot {
        self.inner.state.lock().snapshot.clone()
    }
}

impl Drop for AutosaveSession {
    /// A dropped session must not keep ticking in the background.
    fn drop(&mut self) {
        self.stop();
    }
}

impl SessionInner {
    /// Debounced local write: runs only if no newer edit superseded it.
    fn commit_local(inner: &Arc<Self>, version: u64) {
        let mut state = inner.state.lock();
        if state.stopped || version != state.edit_version {
            return;
        }
        state.snapshot.last_saved_at = now_ms();
        Self::persist_local(inner.store.as_ref(), &inner.key, &mut state);
        if state.phase == SessionPhase::Editing {
            state.phase = SessionPhase::LocalSynced;
        }
    }

    /// Best-effort local write; a failure degrades the session to
    /// remote-only with a one-time warning instead of propagating.
    fn persist_local(store: &dyn SnapshotStore, key: &SnapshotKey, state: &mut SessionState) {
        match store.save(key, &state.snapshot) {
            Ok(()) => {}
            Err(error) => {
                if !state.store_degraded {
                    state.store_degraded = true;
                    tracing::warn!(
                        "Local snapshot write failed, continuing in remote-only mode: {error}"
                    );
                }
            }
        }
    }

    /// One remote sync tick.
    ///
    /// At most one call is in flight per session: the guard is set before
    /// the call and cleared on every exit path, and a tick arriving while
    /// it is set is dropped, not queued. The next tick picks up whatever
    /// edits accumulated meanwhile.
    async fn run_tick(inner: &Arc<Self>) -> TickFlow {
        let (fields, bound) = {
            let mut guard = inner.state.lock();
            let state = &mut *guard;
            if state.stopped {
                return TickFlow::Stop;
            }
            if state.in_flight || state.remote_halted {
                return TickFlow::Continue;
            }
            state.image_applied_at = fold_resolved_image(
                &mut state.snapshot.fields,
                &state.snapshot.upload,
                state.image_applied_at,
            );
            // Empty sessions never sync remotely.
            if !state.snapshot.fields.is_substantial() {
                return TickFlow::Continue;
            }
            state.in_flight = true;
            state.phase = SessionPhase::RemoteSyncing;
            (state.snapshot.fields.clone(), state.snapshot.remote_id)
        };

        let result = inner.reconciler.reconcile(&fields, bound.as_ref()).await;

        let mut state = inner.state.lock();
        state.in_flight = false;
        match result {
            Ok(outcome) => {
                // Apply only if the binding is unchanged since capture
                // (stop() lets an in-flight call land, but never across a
                // rebind).
                if state.snapshot.remote_id == bound {
                    if let ReconcileOutcome::Created(id) = outcome {
                        state.snapshot.remote_id = Some(id);
                        state.snapshot.last_saved_at = now_ms();
                        // Persist the binding at once: a crash here must not
                        // lose it and duplicate the draft on next load.
                        Self::persist_local(inner.store.as_ref(), &inner.key, &mut state);
                        tracing::debug!("Session bound to remote draft {id}");
                    }
                    state.last_synced_at = Some(now_ms());
                    state.last_error = None;
                    state.consecutive_failures = 0;
                    state.phase = if state.stopped {
                        SessionPhase::Closed
                    } else {
                        SessionPhase::RemoteSynced
                    };
                }
            }
            Err(error @ RemoteError::NotFound(_)) => {
                // The bound draft is gone (concurrently deleted). Recreating
                // could duplicate published content, so remote sync halts
                // until the user decides.
                state.last_error = Some(error.to_string());
                state.remote_halted = true;
                state.phase = if state.stopped {
                    SessionPhase::Closed
                } else {
                    SessionPhase::Error
                };
                tracing::error!("Remote draft binding lost, halting sync: {error}");
            }
            Err(error) => {
                state.consecutive_failures += 1;
                state.last_error = Some(error.to_string());
                if state.consecutive_failures == inner.config.failure_escalation_threshold {
                    tracing::error!(
                        "Remote sync failed {} consecutive times: {error}",
                        state.consecutive_failures
                    );
                } else {
                    tracing::warn!("Remote sync failed, retrying on next tick: {error}");
                }
                state.phase = if state.stopped {
                    SessionPhase::Closed
                } else {
                    SessionPhase::Error
                };
            }
        }

        if state.stopped {
            TickFlow::Stop
        } else {
            TickFlow::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autosave::testing::{FakeDraftRepository, RepoCall};
    use crate::autosave::{RecoveryManager, SessionMode};
    use crate::models::DraftFields;
    use crate::snapshot::MemorySnapshotStore;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    const DEBOUNCE: Duration = Duration::from_secs(1);
    const INTERVAL: Duration = Duration::from_secs(30);

    fn test_config() -> AutosaveConfig {
        AutosaveConfig::default()
            .with_debounce(DEBOUNCE)
            .with_tick_interval(INTERVAL)
            .with_failure_escalation_threshold(3)
    }

    fn start_new_session(
        store: &Arc<MemorySnapshotStore>,
        repo: &Arc<FakeDraftRepository>,
        init: SessionStart,
    ) -> AutosaveSession {
        AutosaveSession::start(
            test_config(),
            Arc::clone(store) as Arc<dyn SnapshotStore>,
            Arc::clone(repo) as Arc<dyn DraftRepository>,
            init,
        )
    }

    /// Snapshot store that fails every write, for degraded-mode tests.
    struct BrokenStore;

    impl SnapshotStore for BrokenStore {
        fn save(&self, _: &SnapshotKey, _: &DraftSnapshot) -> Result<()> {
            Err(crate::error::Error::Snapshot("quota exceeded".to_string()))
        }

        fn load(&self, _: &SnapshotKey) -> Result<Option<DraftSnapshot>> {
            Ok(None)
        }

        fn clear(&self, _: &SnapshotKey) -> Result<()> {
            Ok(())
        }
    }

    /// Store wrapper counting successful saves.
    struct CountingStore {
        inner: MemorySnapshotStore,
        saves: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: MemorySnapshotStore::new(),
                saves: AtomicUsize::new(0),
            }
        }

        fn save_count(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }
    }

    impl SnapshotStore for CountingStore {
        fn save(&self, key: &SnapshotKey, snapshot: &DraftSnapshot) -> Result<()> {
            self.inner.save(key, snapshot)?;
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn load(&self, key: &SnapshotKey) -> Result<Option<DraftSnapshot>> {
            self.inner.load(key)
        }

        fn clear(&self, key: &SnapshotKey) -> Result<()> {
            self.inner.clear(key)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn typed_title_yields_exactly_one_create_with_that_title() {
        let store = Arc::new(MemorySnapshotStore::new());
        let repo = Arc::new(FakeDraftRepository::new());
        let session = start_new_session(
            &store,
            &repo,
            SessionStart::new_article(DraftFields::default()),
        );

        session.notify_edit(DraftPatch::title("My first article"));
        sleep(INTERVAL + Duration::from_secs(2)).await;

        assert_eq!(repo.create_count(), 1);
        let RepoCall::Create(fields) = &repo.calls()[0] else {
            panic!("expected a create");
        };
        assert_eq!(fields.title, "My first article");
        assert_eq!(session.remote_id(), repo.created_ids().first().copied());
        assert_eq!(session.phase(), SessionPhase::RemoteSynced);

        // Later ticks keep updating the same draft, never creating another.
        sleep(INTERVAL * 2).await;
        assert_eq!(repo.create_count(), 1);
        assert!(repo.update_count() >= 1);

        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn empty_session_never_syncs_remotely() {
        let store = Arc::new(MemorySnapshotStore::new());
        let repo = Arc::new(FakeDraftRepository::new());
        let session = start_new_session(
            &store,
            &repo,
            SessionStart::new_article(DraftFields::default()),
        );

        sleep(INTERVAL * 3).await;
        assert!(repo.calls().is_empty());

        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_coalesce_into_one_local_write() {
        let store = Arc::new(CountingStore::new());
        let repo = Arc::new(FakeDraftRepository::new());
        let session = AutosaveSession::start(
            test_config(),
            Arc::clone(&store) as Arc<dyn SnapshotStore>,
            Arc::clone(&repo) as Arc<dyn DraftRepository>,
            SessionStart::new_article(DraftFields::default()),
        );

        session.notify_edit(DraftPatch::title("Dra"));
        sleep(Duration::from_millis(200)).await;
        session.notify_edit(DraftPatch::title("Draft titl"));
        sleep(Duration::from_millis(200)).await;
        session.notify_edit(DraftPatch::title("Draft title"));

        sleep(DEBOUNCE + Duration::from_millis(100)).await;
        assert_eq!(store.save_count(), 1);
        assert_eq!(session.phase(), SessionPhase::LocalSynced);

        let saved = store.load(&SnapshotKey::NewArticle).unwrap().unwrap();
        assert_eq!(saved.fields.title, "Draft title");

        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn non_empty_start_ticks_immediately() {
        let store = Arc::new(MemorySnapshotStore::new());
        let repo = Arc::new(FakeDraftRepository::new());
        let id = DraftId::new();
        let session = start_new_session(
            &store,
            &repo,
            SessionStart::edit_existing(
                id,
                DraftFields {
                    title: "Existing".to_string(),
                    content: "Body".to_string(),
                    ..DraftFields::default()
                },
            ),
        );

        sleep(Duration::from_millis(100)).await;
        assert_eq!(repo.update_count(), 1);
        assert_eq!(repo.create_count(), 0);
        assert_eq!(session.remote_id(), Some(id));

        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_ticks_never_double_create() {
        let store = Arc::new(MemorySnapshotStore::new());
        let repo = Arc::new(FakeDraftRepository::new());
        let gate = repo.install_gate();
        let session = start_new_session(
            &store,
            &repo,
            SessionStart::new_article(DraftFields {
                title: "Guarded".to_string(),
                ..DraftFields::default()
            }),
        );

        // The immediate tick starts and blocks inside create.
        sleep(Duration::from_millis(10)).await;
        assert_eq!(repo.create_count(), 1);

        // Two more reentrant ticks while the first is in flight: both must
        // be dropped by the guard without touching the repository.
        let flow = SessionInner::run_tick(&session.inner).await;
        assert_eq!(flow, TickFlow::Continue);
        SessionInner::run_tick(&session.inner).await;
        assert_eq!(repo.create_count(), 1);

        gate.notify_one();
        repo.clear_gate();
        sleep(Duration::from_millis(10)).await;

        assert_eq!(repo.create_count(), 1);
        assert_eq!(repo.created_ids().len(), 1);
        assert_eq!(session.remote_id(), repo.created_ids().first().copied());

        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn offline_ticks_accumulate_and_recover() {
        let store = Arc::new(MemorySnapshotStore::new());
        let repo = Arc::new(FakeDraftRepository::new());
        let id = DraftId::new();
        let session = start_new_session(
            &store,
            &repo,
            SessionStart::edit_existing(
                id,
                DraftFields {
                    title: "Offline test".to_string(),
                    ..DraftFields::default()
                },
            ),
        );
        // Let the immediate tick succeed first.
        sleep(Duration::from_millis(100)).await;

        // Three intervals of network failure, with edits in between.
        repo.fail_next_calls(3);
        session.notify_edit(DraftPatch::content("first"));
        sleep(INTERVAL).await;
        session.notify_edit(DraftPatch::content("first second"));
        sleep(INTERVAL).await;
        session.notify_edit(DraftPatch::content("first second third"));
        sleep(INTERVAL).await;
        assert_eq!(session.phase(), SessionPhase::Error);
        assert!(session.last_error().is_some());

        // Network recovers: the next tick carries the full accumulated state.
        sleep(INTERVAL).await;
        assert_eq!(
            repo.remote_fields().map(|fields| fields.content),
            Some("first second third".to_string())
        );
        assert_eq!(session.phase(), SessionPhase::RemoteSynced);
        assert!(session.last_error().is_none());

        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_after_reload_resumes_binding_without_second_create() {
        let store = Arc::new(MemorySnapshotStore::new());
        let repo = Arc::new(FakeDraftRepository::new());

        // First session: type, bind, then "crash" (no stop/finish).
        let session = start_new_session(
            &store,
            &repo,
            SessionStart::new_article(DraftFields::default()),
        );
        session.notify_edit(DraftPatch::title("Survives reload"));
        sleep(INTERVAL + Duration::from_secs(2)).await;
        let bound = session.remote_id().unwrap();
        session.stop();

        // Reload: recovery is offered and adopted.
        let recovery = RecoveryManager::inspect(
            Arc::clone(&store) as Arc<dyn SnapshotStore>,
            &SessionMode::NewArticle,
        )
        .unwrap();
        assert!(recovery.has_pending());
        let init = recovery.recover().unwrap();
        assert_eq!(init.remote_id(), Some(bound));
        assert_eq!(init.fields().title, "Survives reload");

        let session = start_new_session(&store, &repo, init);
        sleep(INTERVAL + Duration::from_secs(1)).await;

        // Only updates against the original binding; never a second create.
        assert_eq!(repo.create_count(), 1);
        assert!(repo
            .calls()
            .iter()
            .filter_map(|call| match call {
                RepoCall::Update(id, _) => Some(*id),
                _ => None,
            })
            .all(|id| id == bound));

        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn discard_clears_recovery_and_fresh_session_is_unbound() {
        let store = Arc::new(MemorySnapshotStore::new());
        let repo = Arc::new(FakeDraftRepository::new());

        let session = start_new_session(
            &store,
            &repo,
            SessionStart::new_article(DraftFields::default()),
        );
        session.notify_edit(DraftPatch::title("Abandoned"));
        sleep(INTERVAL + Duration::from_secs(2)).await;
        session.stop();

        let recovery = RecoveryManager::inspect(
            Arc::clone(&store) as Arc<dyn SnapshotStore>,
            &SessionMode::NewArticle,
        )
        .unwrap();
        assert!(recovery.has_pending());
        recovery.discard().unwrap();

        let recovery = RecoveryManager::inspect(
            Arc::clone(&store) as Arc<dyn SnapshotStore>,
            &SessionMode::NewArticle,
        )
        .unwrap();
        assert!(!recovery.has_pending());

        let session = start_new_session(
            &store,
            &repo,
            SessionStart::new_article(DraftFields::default()),
        );
        assert_eq!(session.remote_id(), None);
        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn upload_resolved_after_capture_lands_on_next_tick() {
        let store = Arc::new(MemorySnapshotStore::new());
        let repo = Arc::new(FakeDraftRepository::new());
        let id = DraftId::new();
        let session = start_new_session(
            &store,
            &repo,
            SessionStart::edit_existing(
                id,
                DraftFields {
                    title: "With cover".to_string(),
                    ..DraftFields::default()
                },
            ),
        );

        // Immediate tick captures a payload without the image.
        sleep(Duration::from_millis(100)).await;
        assert_eq!(
            repo.remote_fields().and_then(|fields| fields.image_reference),
            None
        );

        session.begin_upload();
        session.set_upload_progress(60);
        session.complete_upload("img/cover-final.png");

        sleep(INTERVAL).await;
        assert_eq!(
            repo.remote_fields().and_then(|fields| fields.image_reference),
            Some("img/cover-final.png".to_string())
        );

        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_mid_flight_applies_result_and_schedules_nothing_more() {
        let store = Arc::new(MemorySnapshotStore::new());
        let repo = Arc::new(FakeDraftRepository::new());
        let gate = repo.install_gate();
        let session = start_new_session(
            &store,
            &repo,
            SessionStart::new_article(DraftFields {
                title: "Stopping".to_string(),
                ..DraftFields::default()
            }),
        );

        // Immediate tick is now blocked inside create.
        sleep(Duration::from_millis(10)).await;
        assert_eq!(repo.create_count(), 1);

        session.stop();
        assert_eq!(session.phase(), SessionPhase::RemoteSyncing);

        gate.notify_one();
        repo.clear_gate();
        sleep(Duration::from_millis(10)).await;

        // The in-flight create completed and its binding was applied.
        assert!(session.remote_id().is_some());
        assert_eq!(session.phase(), SessionPhase::Closed);

        // But no further ticks fire.
        sleep(INTERVAL * 3).await;
        assert_eq!(repo.create_count(), 1);
        assert_eq!(repo.update_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn broken_local_store_degrades_but_keeps_remote_sync() {
        let store: Arc<dyn SnapshotStore> = Arc::new(BrokenStore);
        let repo = Arc::new(FakeDraftRepository::new());
        let session = AutosaveSession::start(
            test_config(),
            store,
            Arc::clone(&repo) as Arc<dyn DraftRepository>,
            SessionStart::new_article(DraftFields::default()),
        );

        session.notify_edit(DraftPatch::title("Remote only"));
        sleep(DEBOUNCE + Duration::from_millis(100)).await;
        assert!(session.local_degraded());

        sleep(INTERVAL).await;
        assert_eq!(repo.create_count(), 1);
        assert_eq!(session.phase(), SessionPhase::RemoteSynced);

        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn binding_violation_halts_remote_sync() {
        let store = Arc::new(MemorySnapshotStore::new());
        let repo = Arc::new(FakeDraftRepository::new());
        let id = DraftId::new();
        repo.mark_lost(id);
        let session = start_new_session(
            &store,
            &repo,
            SessionStart::edit_existing(
                id,
                DraftFields {
                    title: "Doomed".to_string(),
                    ..DraftFields::default()
                },
            ),
        );

        sleep(Duration::from_millis(100)).await;
        assert_eq!(session.phase(), SessionPhase::Error);
        assert!(session.needs_attention());

        // No silent recreate, and no further remote calls.
        let calls_after_violation = repo.calls().len();
        sleep(INTERVAL * 3).await;
        assert_eq!(repo.calls().len(), calls_after_violation);
        assert_eq!(repo.create_count(), 0);

        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_failures_escalate_and_reset_on_success() {
        let store = Arc::new(MemorySnapshotStore::new());
        let repo = Arc::new(FakeDraftRepository::new());
        let id = DraftId::new();
        let session = start_new_session(
            &store,
            &repo,
            SessionStart::edit_existing(
                id,
                DraftFields {
                    title: "Flaky network".to_string(),
                    ..DraftFields::default()
                },
            ),
        );
        sleep(Duration::from_millis(100)).await;

        // Threshold is 3 in the test config.
        repo.fail_next_calls(3);
        sleep(INTERVAL).await;
        assert!(!session.needs_attention());
        sleep(INTERVAL).await;
        assert!(!session.needs_attention());
        sleep(INTERVAL).await;
        assert!(session.needs_attention());

        // Retries continue and a success clears the escalation.
        sleep(INTERVAL).await;
        assert!(!session.needs_attention());
        assert_eq!(session.phase(), SessionPhase::RemoteSynced);
        assert!(session.last_synced_at().is_some());

        session.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn edits_after_stop_are_ignored() {
        let store = Arc::new(MemorySnapshotStore::new());
        let repo = Arc::new(FakeDraftRepository::new());
        let session = start_new_session(
            &store,
            &repo,
            SessionStart::new_article(DraftFields::default()),
        );

        session.stop();
        session.notify_edit(DraftPatch::title("Too late"));
        sleep(INTERVAL * 2).await;

        assert!(repo.calls().is_empty());
        assert_eq!(session.snapshot().fields.title, "");
        assert_eq!(session.phase(), SessionPhase::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn finish_clears_the_local_slot() {
        let store = Arc::new(MemorySnapshotStore::new());
        let repo = Arc::new(FakeDraftRepository::new());
        let session = start_new_session(
            &store,
            &repo,
            SessionStart::new_article(DraftFields::default()),
        );

        session.notify_edit(DraftPatch::title("Published"));
        sleep(INTERVAL + Duration::from_secs(2)).await;
        assert!(store.load(&SnapshotKey::NewArticle).unwrap().is_some());

        session.finish().unwrap();
        assert!(store.load(&SnapshotKey::NewArticle).unwrap().is_none());
        assert_eq!(session.phase(), SessionPhase::Closed);
    }
}
