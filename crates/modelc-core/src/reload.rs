//! Background worker coalescing reload requests.
//!
//! Change notifications are merged into a pending set. The single worker
//! thread waits for a quiet period, drains the set and runs one resolution.
//! Notifications arriving while a run is in progress are folded into the
//! next run, so at most one run executes at a time.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::model::FileId;
use crate::store::{ModelStore, ReloadOutcome};

/// Configuration for the reload worker.
#[derive(Debug, Clone)]
pub struct ReloadWorkerConfig {
    /// Quiet period after the first notification before a run starts
    /// (milliseconds).
    pub debounce_ms: u64,
}

impl Default for ReloadWorkerConfig {
    fn default() -> Self {
        Self { debounce_ms: 50 }
    }
}

impl ReloadWorkerConfig {
    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }
}

#[derive(Debug, Default)]
struct WorkerState {
    pending: BTreeSet<FileId>,
    /// Re-read every file on the next run.
    full: bool,
    running: bool,
    shutdown: bool,
    completed_runs: u64,
}

impl WorkerState {
    fn has_work(&self) -> bool {
        self.full || !self.pending.is_empty()
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<WorkerState>,
    /// Signalled on new work and on shutdown.
    wake: Condvar,
    /// Signalled when a run completes.
    idle: Condvar,
}

/// Background worker that re-resolves a [`ModelStore`] on change.
pub struct ReloadWorker {
    shared: Arc<Shared>,
    /// Worker thread handle.
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ReloadWorker {
    /// Start the worker thread.
    pub fn start(store: Arc<ModelStore>, config: ReloadWorkerConfig) -> Self {
        let shared = Arc::new(Shared::default());
        let shared_clone = shared.clone();

        let handle = thread::spawn(move || {
            Self::worker_loop(store, config, shared_clone);
        });

        Self {
            shared,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Queue a run for the given changed files.
    pub fn notify_changed<I>(&self, files: I)
    where
        I: IntoIterator<Item = FileId>,
    {
        let mut state = self.shared.state.lock();
        let before = state.pending.len();
        state.pending.extend(files);
        if state.pending.len() != before {
            self.shared.wake.notify_one();
        }
    }

    /// Queue a run that re-reads every file.
    pub fn notify_all(&self) {
        let mut state = self.shared.state.lock();
        state.full = true;
        self.shared.wake.notify_one();
    }

    /// Number of runs completed so far.
    pub fn completed_runs(&self) -> u64 {
        self.shared.state.lock().completed_runs
    }

    /// Wait until no run is queued or in progress.
    ///
    /// Returns `false` if the timeout elapsed first.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while state.running || state.has_work() {
            if self.shared.idle.wait_until(&mut state, deadline).timed_out() {
                return !(state.running || state.has_work());
            }
        }
        true
    }

    /// Stop the worker and wait for it to finish. Queued work is run first.
    pub fn stop(&self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            self.shared.wake.notify_one();
        }
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }

    /// Check if the worker is still running.
    pub fn is_running(&self) -> bool {
        self.handle.lock().as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// The main worker loop.
    fn worker_loop(store: Arc<ModelStore>, config: ReloadWorkerConfig, shared: Arc<Shared>) {
        let debounce = Duration::from_millis(config.debounce_ms);

        loop {
            let (changed, full) = {
                let mut state = shared.state.lock();
                while !state.has_work() && !state.shutdown {
                    shared.wake.wait(&mut state);
                }
                if !state.has_work() {
                    break;
                }

                // Let a burst of notifications settle.
                let deadline = Instant::now() + debounce;
                while !state.shutdown && !debounce.is_zero() {
                    if shared.wake.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }

                state.running = true;
                (std::mem::take(&mut state.pending), std::mem::take(&mut state.full))
            };

            Self::run(&store, &changed, full);

            let mut state = shared.state.lock();
            state.running = false;
            state.completed_runs += 1;
            shared.idle.notify_all();
        }

        tracing::debug!("reload worker stopped");
    }

    fn run(store: &ModelStore, changed: &BTreeSet<FileId>, full: bool) {
        let result = if full {
            store.reload()
        } else {
            store.reload_changed(changed)
        };

        match result {
            Ok(ReloadOutcome::Published { version, .. }) => {
                tracing::debug!(version, files = changed.len(), "reload published");
            }
            Ok(ReloadOutcome::Rejected { errors }) => {
                tracing::debug!(errors, files = changed.len(), "reload rejected");
            }
            Err(e) => {
                tracing::error!(error = %e, files = changed.len(), "reload failed");
            }
        }
    }
}

impl Drop for ReloadWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ReloadWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadWorker")
            .field("running", &self.is_running())
            .field("completed_runs", &self.completed_runs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::source::MemorySources;

    fn pays_id() -> FileId {
        FileId::new("App", "Model", "Pays")
    }

    fn setup() -> (Arc<MemorySources>, Arc<ModelStore>) {
        let sources = Arc::new(
            MemorySources::new()
                .with_file(
                    FileId::new("App", "Domain", "Domains"),
                    r#"domain DO_CODE { map sql = "varchar"; map ts = "string"; }"#,
                )
                .with_file(pays_id(), "class Pays reference { field Code: DO_CODE primary; }"),
        );
        let store = ModelStore::open(sources.clone(), GeneratorConfig::new("App")).unwrap();
        (sources, Arc::new(store))
    }

    #[test]
    fn test_notification_triggers_reload() {
        let (sources, store) = setup();
        let worker = ReloadWorker::start(store.clone(), ReloadWorkerConfig::default());

        sources.insert(
            pays_id(),
            "class Pays reference { field Code: DO_CODE primary; field Nom: DO_CODE; }",
        );
        worker.notify_changed([pays_id()]);
        assert!(worker.wait_idle(Duration::from_secs(5)));

        let model = store.current().unwrap();
        assert_eq!(model.version(), 2);
        assert!(model.class_by_name("Pays").unwrap().property("Nom").is_some());
        worker.stop();
        assert!(!worker.is_running());
    }

    #[test]
    fn test_burst_is_coalesced() {
        let (sources, store) = setup();
        let worker = ReloadWorker::start(
            store.clone(),
            ReloadWorkerConfig::default().with_debounce_ms(200),
        );

        for i in 0..10 {
            sources.insert(
                pays_id(),
                format!("class Pays reference {{ field Code: DO_CODE primary; field F{}: DO_CODE; }}", i),
            );
            worker.notify_changed([pays_id()]);
        }
        assert!(worker.wait_idle(Duration::from_secs(5)));

        assert_eq!(worker.completed_runs(), 1);
        let model = store.current().unwrap();
        assert!(model.class_by_name("Pays").unwrap().property("F9").is_some());
    }

    #[test]
    fn test_failed_reload_keeps_serving() {
        let (sources, store) = setup();
        let worker = ReloadWorker::start(store.clone(), ReloadWorkerConfig::default());

        sources.insert(pays_id(), "class Pays {");
        worker.notify_changed([pays_id()]);
        assert!(worker.wait_idle(Duration::from_secs(5)));

        assert_eq!(store.current_version(), 1);
        assert!(store.last_error().is_some());
        assert!(worker.is_running());
    }

    #[test]
    fn test_stop_runs_queued_work() {
        let (sources, store) = setup();
        let worker = ReloadWorker::start(
            store.clone(),
            ReloadWorkerConfig::default().with_debounce_ms(0),
        );

        sources.insert(pays_id(), "class Pays reference { field Code: DO_CODE primary; abstract; }");
        worker.notify_all();
        worker.stop();

        assert_eq!(store.current_version(), 2);
        assert!(store.current().unwrap().class_by_name("Pays").unwrap().is_abstract);
    }
}
