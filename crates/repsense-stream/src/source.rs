//! Observation sources feeding a session.
//!
//! The pose estimator runs outside this crate. A live adapter pushes its
//! per-frame landmarks through a [`ChannelSource`]; recorded sessions are
//! replayed from JSON lines with [`JsonLinesSource`].

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tracing::warn;

use repsense_core::{Error, Observation, PoseLandmarks, Result, Timestamp};

/// One frame as delivered by a source
#[derive(Debug, Clone, PartialEq)]
pub struct TimedObservation {
    pub observation: Observation,
    /// Capture time; the session clock is read when absent
    pub timestamp: Option<Timestamp>,
}

impl TimedObservation {
    pub fn new(observation: Observation, timestamp: Timestamp) -> Self {
        Self {
            observation,
            timestamp: Some(timestamp),
        }
    }

    pub fn untimed(observation: Observation) -> Self {
        Self {
            observation,
            timestamp: None,
        }
    }
}

/// Trait for frame sources
#[async_trait]
pub trait ObservationSource: Send {
    /// Short label used in logs
    fn name(&self) -> &str;

    /// Wait for the next frame. Returns [`Error::StreamEnded`] once the source
    /// is exhausted.
    async fn recv(&mut self) -> Result<TimedObservation>;
}

/// Frames pushed from another task, typically a live pose adapter
pub struct ChannelSource {
    rx: mpsc::Receiver<TimedObservation>,
}

impl ChannelSource {
    /// Create a source and the sender that feeds it
    pub fn channel(capacity: usize) -> (mpsc::Sender<TimedObservation>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

#[async_trait]
impl ObservationSource for ChannelSource {
    fn name(&self) -> &str {
        "channel"
    }

    async fn recv(&mut self) -> Result<TimedObservation> {
        self.rx.recv().await.ok_or(Error::StreamEnded)
    }
}

/// One line of a recorded session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Seconds since the start of the recording
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
    /// Missing or empty means no person was detected
    #[serde(default)]
    pub landmarks: Option<PoseLandmarks>,
}

impl RecordedFrame {
    pub fn into_observation(self) -> TimedObservation {
        let observation = self
            .landmarks
            .map(Observation::from_landmarks)
            .unwrap_or(Observation::NoPerson);
        TimedObservation {
            observation,
            timestamp: self.t.map(Timestamp::from_secs_f64),
        }
    }
}

/// Replays recorded frames, one JSON object per line.
///
/// Blank lines are ignored. Lines that fail to parse are logged and skipped
/// so a single corrupt frame does not end the replay.
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    line_no: usize,
    skipped: usize,
}

impl JsonLinesSource<BufReader<File>> {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .await
            .map_err(|e| Error::Source(format!("cannot open {}: {e}", path.display())))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            skipped: 0,
        }
    }

    /// Lines dropped because they could not be parsed
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> ObservationSource for JsonLinesSource<R> {
    fn name(&self) -> &str {
        "json-lines"
    }

    async fn recv(&mut self) -> Result<TimedObservation> {
        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| Error::Source(e.to_string()))?
                .ok_or(Error::StreamEnded)?;
            self.line_no += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<RecordedFrame>(line) {
                Ok(frame) => return Ok(frame.into_observation()),
                Err(e) => {
                    self.skipped += 1;
                    warn!(line = self.line_no, error = %e, "skipping malformed frame");
                }
            }
        }
    }
}
