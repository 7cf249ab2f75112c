//! Transcript display core for PingLearn voice classroom sessions.
//!
//! Streaming speech recognition re-emits partial and final results, so the
//! same fragment often arrives several times in quick succession. The
//! [`display_buffer::TranscriptDisplayBuffer`] drops those repeats, keeps a
//! bounded history per session, and wakes the renderer on every new item.

pub mod cli;
pub mod display_buffer;
pub mod ingest;
pub mod protocol;
pub mod session;
pub mod settings;

pub use display_buffer::{
    Candidate, Clock, DisplayItem, DisplayItemKind, ManualClock, Subscription, SystemClock,
    TranscriptDisplayBuffer,
};
pub use settings::BufferSettings;
