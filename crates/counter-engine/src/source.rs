//! Frame sources feeding a counter.
//!
//! A source stands in for the camera plus pose estimator. Sources are
//! pulled from a blocking worker, so an implementation may block until its
//! next frame is ready.

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use repcount_common::clock::{RateController, SessionClock};
use repcount_common::error::{RepcountError, RepcountResult};
use repcount_pose_model::landmark::LandmarkFrame;
use repcount_pose_model::stream::{parse_frames, parse_header, LandmarkStreamHeader};

/// Input port for landmark frames.
pub trait FrameSource: Send {
    /// Next frame, or `None` once the source is exhausted.
    ///
    /// Errors are collaborator failures and end the session.
    fn next_frame(&mut self) -> RepcountResult<Option<LandmarkFrame>>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// In-memory frames, for tests.
pub struct StubSource {
    frames: VecDeque<LandmarkFrame>,
}

impl StubSource {
    pub fn new(frames: Vec<LandmarkFrame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    /// A source that is exhausted immediately.
    pub fn empty() -> Self {
        Self::new(vec![])
    }
}

impl FrameSource for StubSource {
    fn next_frame(&mut self) -> RepcountResult<Option<LandmarkFrame>> {
        Ok(self.frames.pop_front())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

struct Pacing {
    clock: SessionClock,
    rate: RateController,
}

/// Replays a recorded JSONL landmark stream.
///
/// Without pacing frames are delivered as fast as they are pulled. With
/// [`ReplaySource::realtime`] they are spaced at the stream's nominal fps.
pub struct ReplaySource {
    name: String,
    header: Option<LandmarkStreamHeader>,
    frames: VecDeque<LandmarkFrame>,
    pacing: Option<Pacing>,
}

impl ReplaySource {
    /// Load a stream file.
    pub fn open(path: &Path) -> RepcountResult<Self> {
        if !path.exists() {
            return Err(RepcountError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_jsonl(path.display().to_string(), &content)
    }

    /// Parse a stream held in memory.
    pub fn from_jsonl(name: impl Into<String>, content: &str) -> RepcountResult<Self> {
        let name = name.into();
        let frames = parse_frames(content)
            .map_err(|e| RepcountError::source(format!("{name}: malformed landmark stream: {e}")))?;

        tracing::debug!(source = %name, frames = frames.len(), "Loaded landmark stream");

        Ok(Self {
            header: parse_header(content),
            name,
            frames: frames.into(),
            pacing: None,
        })
    }

    /// Pace delivery at the header fps, or `fallback_fps` when the stream
    /// does not declare one.
    pub fn realtime(mut self, fallback_fps: u32) -> Self {
        let fps = self.fps().unwrap_or(fallback_fps);
        self.pacing = Some(Pacing {
            clock: SessionClock::start(),
            rate: RateController::new(fps),
        });
        self
    }

    /// Nominal frame rate declared by the stream header.
    pub fn fps(&self) -> Option<u32> {
        self.header.as_ref().and_then(|h| h.fps)
    }

    pub fn header(&self) -> Option<&LandmarkStreamHeader> {
        self.header.as_ref()
    }

    /// Frames not yet delivered.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    fn wait_for_tick(pacing: &mut Pacing) {
        loop {
            let now = pacing.clock.elapsed_ns();
            if pacing.rate.should_tick(now) {
                return;
            }
            std::thread::sleep(Duration::from_nanos(pacing.rate.remaining_ns(now)));
        }
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> RepcountResult<Option<LandmarkFrame>> {
        if self.frames.is_empty() {
            return Ok(None);
        }
        if let Some(pacing) = self.pacing.as_mut() {
            Self::wait_for_tick(pacing);
        }
        Ok(self.frames.pop_front())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
