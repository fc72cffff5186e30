use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::model::config::GhostConfig;
use crate::model::row::{GridRow, RowId};

use super::progress::stutter_progress;

/// Error type for ghost batch transitions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GhostError {
    #[error("a generation batch is already in progress")]
    BatchActive,
    #[error("no generation is loading")]
    NotLoading,
    #[error("no generated rows are waiting for review")]
    NotReady,
    #[error("no generated row with id {0}")]
    UnknownGhost(RowId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostStatus {
    Idle,
    Loading,
    Ready,
}

/// Outcome of a batch, reported when it returns to Idle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub ready: usize,
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Debug)]
enum Phase<R> {
    Idle,
    Loading {
        requested: usize,
        estimate: Duration,
        started: Instant,
        /// Set once the generator resolved; the rows wait out the grace delay
        finished: Option<(Instant, Vec<R>)>,
    },
    Ready {
        items: Vec<R>,
        summary: BatchSummary,
    },
}

/// Generated rows on their way from an asynchronous generator into the
/// real dataset: `Idle → Loading → Ready → Idle`, one batch at a time.
///
/// Time is passed in explicitly so the lifecycle can be driven by the UI's
/// event loop and by tests alike.
#[derive(Debug)]
pub struct GhostLifecycle<R> {
    phase: Phase<R>,
    ceiling: f32,
    grace: Duration,
}

impl<R: GridRow> GhostLifecycle<R> {
    pub fn new(ceiling: f32, grace: Duration) -> Self {
        GhostLifecycle {
            phase: Phase::Idle,
            ceiling,
            grace,
        }
    }

    pub fn from_config(config: &GhostConfig) -> Self {
        Self::new(config.ceiling, Duration::from_millis(config.grace_ms))
    }

    pub fn status(&self) -> GhostStatus {
        match self.phase {
            Phase::Idle => GhostStatus::Idle,
            Phase::Loading { .. } => GhostStatus::Loading,
            Phase::Ready { .. } => GhostStatus::Ready,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// Whether the progress display needs periodic redraws
    pub fn needs_tick(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    /// Start a batch of `count` rows expected to take about `estimate`.
    pub fn begin_loading(&mut self, count: usize, estimate: Duration, now: Instant) -> Result<(), GhostError> {
        if self.is_active() {
            return Err(GhostError::BatchActive);
        }
        info!(count, estimate_ms = estimate.as_millis() as u64, "generation started");
        self.phase = Phase::Loading {
            requested: count,
            estimate,
            started: now,
            finished: None,
        };
        Ok(())
    }

    /// The generator resolved. Progress jumps to 100 and the rows become
    /// reviewable after the grace delay. An empty result ends the batch.
    pub fn finish_loading(&mut self, items: Vec<R>, now: Instant) -> Result<Option<BatchSummary>, GhostError> {
        let Phase::Loading { finished, .. } = &mut self.phase else {
            return Err(GhostError::NotLoading);
        };
        if finished.is_some() {
            return Err(GhostError::NotLoading);
        }
        if items.is_empty() {
            debug!("generator returned no rows");
            self.phase = Phase::Idle;
            return Ok(Some(BatchSummary::default()));
        }
        debug!(rows = items.len(), "generation finished");
        *finished = Some((now, items));
        if self.grace.is_zero() {
            self.tick(now);
        }
        Ok(None)
    }

    /// Advance timers. Returns true if the batch became Ready.
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = matches!(
            &self.phase,
            Phase::Loading { finished: Some((at, _)), .. }
                if now.saturating_duration_since(*at) >= self.grace
        );
        if !due {
            return false;
        }
        if let Phase::Loading {
            finished: Some((_, items)),
            ..
        } = std::mem::replace(&mut self.phase, Phase::Idle)
        {
            debug!(rows = items.len(), "ghost rows ready");
            self.phase = Phase::Ready {
                summary: BatchSummary {
                    ready: items.len(),
                    ..BatchSummary::default()
                },
                items,
            };
        }
        true
    }

    /// Percent shown by the loading rows, None outside Loading.
    pub fn progress(&self, now: Instant) -> Option<f32> {
        match &self.phase {
            Phase::Loading { finished: Some(_), .. } => Some(100.0),
            Phase::Loading { estimate, started, .. } => {
                let elapsed = now.saturating_duration_since(*started);
                Some(stutter_progress(
                    elapsed.as_millis() as u64,
                    estimate.as_millis() as u64,
                    self.ceiling,
                ))
            }
            _ => None,
        }
    }

    /// Number of placeholder rows to draw while loading
    pub fn loading_rows(&self) -> usize {
        match &self.phase {
            Phase::Loading { requested, .. } => *requested,
            _ => 0,
        }
    }

    /// Rows waiting for review
    pub fn items(&self) -> &[R] {
        match &self.phase {
            Phase::Ready { items, .. } => items,
            _ => &[],
        }
    }

    pub fn is_ghost(&self, id: &RowId) -> bool {
        self.items().iter().any(|r| &r.row_id() == id)
    }

    /// Move one ghost into the real rows through `merge`.
    pub fn accept(&mut self, id: &RowId, merge: impl FnOnce(R)) -> Result<Option<BatchSummary>, GhostError> {
        let row = self.take(id)?;
        merge(row);
        self.record(1, 0)
    }

    /// Discard one ghost.
    pub fn reject(&mut self, id: &RowId) -> Result<Option<BatchSummary>, GhostError> {
        self.take(id)?;
        self.record(0, 1)
    }

    /// Accept every remaining ghost, in display order.
    pub fn accept_all(&mut self, mut merge: impl FnMut(R)) -> Result<BatchSummary, GhostError> {
        let items = self.drain()?;
        let n = items.len();
        for row in items {
            merge(row);
        }
        Ok(self.record(n, 0)?.unwrap_or_default())
    }

    pub fn reject_all(&mut self) -> Result<BatchSummary, GhostError> {
        let n = self.drain()?.len();
        Ok(self.record(0, n)?.unwrap_or_default())
    }

    /// Drop the batch in any state, e.g. when the generator failed.
    /// Returns whether a batch was active.
    pub fn abort(&mut self) -> bool {
        let was_active = self.is_active();
        if was_active {
            info!(status = ?self.status(), "generation batch aborted");
        }
        self.phase = Phase::Idle;
        was_active
    }

    fn take(&mut self, id: &RowId) -> Result<R, GhostError> {
        let Phase::Ready { items, .. } = &mut self.phase else {
            return Err(GhostError::NotReady);
        };
        let pos = items
            .iter()
            .position(|r| &r.row_id() == id)
            .ok_or_else(|| GhostError::UnknownGhost(id.clone()))?;
        Ok(items.remove(pos))
    }

    fn drain(&mut self) -> Result<Vec<R>, GhostError> {
        let Phase::Ready { items, .. } = &mut self.phase else {
            return Err(GhostError::NotReady);
        };
        Ok(std::mem::take(items))
    }

    /// Count resolutions and return to Idle once nothing is left.
    fn record(&mut self, accepted: usize, rejected: usize) -> Result<Option<BatchSummary>, GhostError> {
        let Phase::Ready { items, summary } = &mut self.phase else {
            return Err(GhostError::NotReady);
        };
        summary.accepted += accepted;
        summary.rejected += rejected;
        if !items.is_empty() {
            return Ok(None);
        }
        let summary = *summary;
        info!(
            accepted = summary.accepted,
            rejected = summary.rejected,
            "generation batch resolved"
        );
        self.phase = Phase::Idle;
        Ok(Some(summary))
    }
}
