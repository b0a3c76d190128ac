use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use preview_compute::ComputeService;
use preview_core::{
    ContextSnapshotProvider, PipelineResult, PipelineResults, PreviewMode, PreviewModeSource,
};

use crate::chain::StageChain;
use crate::config::PipelineConfig;
use crate::events::{GenerationOutcome, PipelineEvent};
use crate::state::{PendingRun, PipelineState, PipelineStatus};

struct Inner {
    config: PipelineConfig,
    chain: StageChain,
    snapshots: Arc<dyn ContextSnapshotProvider>,
    modes: Arc<dyn PreviewModeSource>,
    state: Mutex<PipelineState>,
    events: broadcast::Sender<PipelineEvent>,
}

/// Session-wide preview service.
///
/// Cloning is cheap and every clone drives the same state. Generations run
/// one at a time; failures land in `last_error` instead of being returned.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    inner: Arc<Inner>,
}

impl PipelineOrchestrator {
    pub fn new(
        config: PipelineConfig,
        service: Arc<dyn ComputeService>,
        snapshots: Arc<dyn ContextSnapshotProvider>,
        modes: Arc<dyn PreviewModeSource>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                config,
                chain: StageChain::new(service),
                snapshots,
                modes,
                state: Mutex::new(PipelineState::default()),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.inner.events.subscribe()
    }

    pub fn status(&self) -> PipelineStatus {
        self.lock_state().status()
    }

    pub fn is_generating(&self) -> bool {
        self.lock_state().generating
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock_state().last_error.clone()
    }

    pub fn results(&self) -> PipelineResults {
        self.lock_state().results.clone()
    }

    pub fn result(&self, mode: PreviewMode) -> Option<PipelineResult> {
        self.lock_state().results.get(mode)
    }

    /// Arm a trailing-edge run after `delay` (the configured default when `None`).
    ///
    /// Any run still waiting is cancelled, so a burst of calls collapses into
    /// one generation using the last call's mode. A `None` mode is resolved
    /// from the mode source when the timer fires. Must be called from within
    /// a tokio runtime.
    pub fn schedule(&self, mode: Option<PreviewMode>, delay: Option<Duration>) {
        let delay = delay.unwrap_or(self.inner.config.default_delay);
        let token = CancellationToken::new();

        let run_id = {
            let mut state = self.lock_state();
            if state.cancel_pending() {
                log::debug!("Replacing pending preview run");
            }
            state.next_run_id += 1;
            let run_id = state.next_run_id;
            state.pending = Some(PendingRun {
                id: run_id,
                token: token.clone(),
            });
            run_id
        };

        self.emit(PipelineEvent::Scheduled {
            mode,
            delay_ms: delay.as_millis() as u64,
        });

        let orchestrator = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    log::trace!("Preview run {} cancelled before firing", run_id);
                }
                _ = tokio::time::sleep(delay) => {
                    if orchestrator.release_pending(run_id) {
                        orchestrator.generate_now(mode).await;
                    }
                }
            }
        });
    }

    /// Run the stage chain for `mode` right away.
    ///
    /// A call made while another generation is in flight does nothing and
    /// returns [`GenerationOutcome::Skipped`].
    pub async fn generate_now(&self, mode: Option<PreviewMode>) -> GenerationOutcome {
        let mode = mode.unwrap_or_else(|| self.inner.modes.current_mode());

        let epoch = {
            let mut state = self.lock_state();
            if state.generating {
                log::debug!("Preview generation already in flight, ignoring {} request", mode);
                return GenerationOutcome::Skipped;
            }
            state.generating = true;
            state.last_error = None;
            state.epoch
        };

        self.emit(PipelineEvent::Started { mode });
        log::debug!("Generating {} preview", mode);
        let started = Instant::now();

        let outcome = match self.inner.snapshots.snapshot().await {
            Ok(snapshot) => self.inner.chain.run(mode, &snapshot).await,
            Err(e) => Err(e),
        };

        let mut state = self.lock_state();
        if state.epoch != epoch {
            drop(state);
            log::info!("Dropping {} preview that finished after clear", mode);
            self.emit(PipelineEvent::Discarded { mode });
            return GenerationOutcome::Discarded;
        }
        state.generating = false;

        match outcome {
            Ok(result) => {
                let at = Utc::now();
                let count = result.messages().len();
                state.results.store(result);
                state.last_generated_at = Some(at);
                drop(state);

                log::info!(
                    "Generated {} preview: {} messages in {}ms",
                    mode,
                    count,
                    started.elapsed().as_millis()
                );
                self.emit(PipelineEvent::Completed { mode, at });
                GenerationOutcome::Completed
            }
            Err(e) => {
                let error = e.to_string();
                state.last_error = Some(error.clone());
                drop(state);

                log::warn!("{} preview failed: {}", mode, error);
                self.emit(PipelineEvent::Failed { mode, error });
                GenerationOutcome::Failed
            }
        }
    }

    /// Back to the empty state. Cancels a pending run; output from a
    /// generation still in flight will be dropped when it lands.
    pub fn clear(&self) {
        {
            let mut state = self.lock_state();
            state.cancel_pending();
            state.generating = false;
            state.last_error = None;
            state.last_generated_at = None;
            state.results = PipelineResults::default();
            state.epoch += 1;
        }
        log::debug!("Preview state cleared");
        self.emit(PipelineEvent::Cleared);
    }

    /// Hand the pending slot over to the run that owns it.
    fn release_pending(&self, run_id: u64) -> bool {
        let mut state = self.lock_state();
        match &state.pending {
            Some(run) if run.id == run_id => {
                state.pending = None;
                true
            }
            _ => false,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PipelineState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: PipelineEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}
