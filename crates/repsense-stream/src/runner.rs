//! Session runner.
//!
//! Each session owns one rep counter and runs as a single task: receive a
//! frame, advance the counter, publish the report, repeat. Reports go out on
//! a bounded channel, so a slow consumer holds back frame intake.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use repsense_core::{Clock, Error, MonotonicClock, Result, SessionId};
use repsense_motion::{build_counter, Exercise, ExerciseConfig, FrameReport, RepCounter, RepTally};

use crate::source::{ObservationSource, TimedObservation};

/// Control signal sent to a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Run,
    /// Discard counts and phase, restart the countdown
    Reset,
    Stop,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The source ran out of frames
    StreamEnded,
    Stopped,
    /// The report receiver was dropped
    ConsumerGone,
    SourceFailed,
}

/// Final state of a session; its counts are authoritative
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub exercise: Exercise,
    #[serde(flatten)]
    pub tally: RepTally,
    pub frames: u64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub end_reason: EndReason,
}

/// One exercise session
pub struct SessionRunner {
    id: SessionId,
    counter: Box<dyn RepCounter>,
    clock: Arc<dyn Clock>,
    frames: u64,
    started_at: DateTime<Utc>,
}

impl SessionRunner {
    /// Validate `config` and build a fresh session
    pub fn new(config: &ExerciseConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    /// As [`SessionRunner::new`], reading untimed frames from `clock`
    pub fn with_clock(config: &ExerciseConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let counter = build_counter(config)?;
        Ok(Self {
            id: SessionId::new(),
            counter,
            clock,
            frames: 0,
            started_at: Utc::now(),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn exercise(&self) -> Exercise {
        self.counter.exercise()
    }

    pub fn tally(&self) -> RepTally {
        self.counter.tally()
    }

    /// Advance the session by one frame
    pub fn process(&mut self, frame: &TimedObservation) -> FrameReport {
        let now = frame.timestamp.unwrap_or_else(|| self.clock.now());
        self.frames += 1;
        self.counter.process(&frame.observation, now)
    }

    pub fn reset(&mut self) {
        info!(session = %self.id, "session reset");
        self.counter.reset();
    }

    pub fn summary(&self, end_reason: EndReason) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            exercise: self.counter.exercise(),
            tally: self.counter.tally(),
            frames: self.frames,
            started_at: self.started_at,
            ended_at: Utc::now(),
            end_reason,
        }
    }

    /// Drive the session from `source` until it ends, is stopped, or the
    /// report consumer goes away
    pub async fn run<S: ObservationSource>(
        mut self,
        mut source: S,
        reports: mpsc::Sender<FrameReport>,
        mut control: watch::Receiver<SessionCommand>,
    ) -> SessionSummary {
        info!(
            session = %self.id,
            exercise = %self.exercise(),
            source = source.name(),
            "session started"
        );
        let mut control_open = true;

        let end_reason = loop {
            tokio::select! {
                biased;

                changed = control.changed(), if control_open => {
                    if changed.is_err() {
                        // Handle dropped; keep running until the source ends
                        control_open = false;
                        continue;
                    }
                    let command = *control.borrow_and_update();
                    match command {
                        SessionCommand::Stop => break EndReason::Stopped,
                        SessionCommand::Reset => self.reset(),
                        SessionCommand::Run => {}
                    }
                }

                frame = source.recv() => match frame {
                    Ok(frame) => {
                        let report = self.process(&frame);
                        if report.counters_reset {
                            debug!(session = %self.id, "counters zeroed by guard");
                        }
                        if reports.send(report).await.is_err() {
                            break EndReason::ConsumerGone;
                        }
                    }
                    Err(Error::StreamEnded) => break EndReason::StreamEnded,
                    Err(e) => {
                        error!(session = %self.id, error = %e, "observation source failed");
                        break EndReason::SourceFailed;
                    }
                },
            }
        };

        let summary = self.summary(end_reason);
        info!(
            session = %summary.session_id,
            total = summary.tally.total,
            correct = summary.tally.correct,
            frames = summary.frames,
            reason = ?summary.end_reason,
            "session ended"
        );
        summary
    }
}

/// Handle to a session running on its own task
pub struct SessionHandle {
    id: SessionId,
    control: watch::Sender<SessionCommand>,
    task: JoinHandle<SessionSummary>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn stop(&self) {
        self.control.send_replace(SessionCommand::Stop);
    }

    pub fn reset(&self) {
        self.control.send_replace(SessionCommand::Reset);
    }

    /// Wait for the session to finish
    pub async fn join(self) -> Result<SessionSummary> {
        self.task
            .await
            .map_err(|e| Error::Source(format!("session task failed: {e}")))
    }
}

/// Spawn a session reading from `source`.
///
/// Fails before anything is spawned if the configuration is invalid.
pub fn start_session<S: ObservationSource + 'static>(
    config: &ExerciseConfig,
    source: S,
    queue_size: usize,
) -> Result<(SessionHandle, mpsc::Receiver<FrameReport>)> {
    let runner = SessionRunner::new(config)?;
    Ok(spawn(runner, source, queue_size))
}

/// Spawn an already built runner
pub fn spawn<S: ObservationSource + 'static>(
    runner: SessionRunner,
    source: S,
    queue_size: usize,
) -> (SessionHandle, mpsc::Receiver<FrameReport>) {
    let (tx, rx) = mpsc::channel(queue_size.max(1));
    let (control, control_rx) = watch::channel(SessionCommand::Run);
    let id = runner.id();
    let task = tokio::spawn(runner.run(source, tx, control_rx));
    (SessionHandle { id, control, task }, rx)
}
