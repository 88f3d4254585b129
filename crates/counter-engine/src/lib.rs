//! RepCount Counter Engine
//!
//! Runs counting sessions against a live or replayed stream of landmark
//! frames. The engine owns the mutable session state, feeds each frame
//! through the repetition machine, and publishes a snapshot for readers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  FramePipeline                    │
//! │  ┌─────────────┐   latest    ┌─────────────────┐  │
//! │  │ FrameSource │ ──frame───▶ │   RepCounter    │  │
//! │  │ (producer)  │    slot     │ (CounterSession)│  │
//! │  └─────────────┘             └────────┬────────┘  │
//! │        ▲  stop flag / control         │ snapshot   │
//! └────────┼──────────────────────────────┼───────────┘
//!          │                              ▼
//!   PipelineControl               watch::Receiver
//!   (stop, reset)                 (UI / CLI readers)
//! ```

pub mod pipeline;
pub mod session;
pub mod source;

pub use pipeline::*;
pub use session::*;
pub use source::*;
