//! Real-time transcript display buffer.
//!
//! Receives streaming speech-to-text fragments from a voice session and
//! exposes them to a renderer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  TranscriptDisplayBuffer                     │
//! │                                                              │
//! │  Candidate ──▶ ┌─────────────┐ new ──▶ ┌──────────────────┐  │
//! │                │ DedupLedger │         │ items (VecDeque) │  │
//! │                │ sha256→ts   │         │ capped, FIFO     │  │
//! │                └─────────────┘         └────────┬─────────┘  │
//! │                       ▲ survives clear          │            │
//! │                       │                         ▼            │
//! │                    Clock                   Subscribers ──▶ UI│
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod buffer;
mod clock;
mod dedup;
mod item;
mod subscribers;

pub use buffer::TranscriptDisplayBuffer;
pub use clock::{Clock, ManualClock, SystemClock};
pub use item::{Candidate, DisplayItem, DisplayItemKind};
pub(crate) use item::check_reserved_fields;
pub use subscribers::{Subscribers, Subscription};
