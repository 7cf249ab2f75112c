//! Per-session ownership of display buffers.
//!
//! Each active voice session (room) gets its own buffer; ending the session
//! drops it. There is no process-wide buffer.

use crate::display_buffer::{Clock, TranscriptDisplayBuffer};
use crate::settings::BufferSettings;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;

/// Owner of the display buffers of all active voice sessions.
pub struct TranscriptSessions {
    /// Buffers keyed by session id (room name)
    sessions: HashMap<String, TranscriptDisplayBuffer>,

    /// Settings applied to every new buffer
    settings: BufferSettings,

    /// Time source shared by all buffers
    clock: Arc<dyn Clock>,
}

impl TranscriptSessions {
    pub fn new(settings: BufferSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: HashMap::new(),
            settings,
            clock,
        }
    }

    /// Start a voice session.
    ///
    /// Returns `true` if a new buffer was created. Starting a session that is
    /// already active is a restart: its displayed items are cleared but the
    /// dedup history and subscribers are kept, and `false` is returned.
    pub fn start_session(&mut self, session_id: &str) -> bool {
        if let Some(buffer) = self.sessions.get_mut(session_id) {
            buffer.clear_buffer();
            info!("Transcript session '{}' restarted", session_id);
            return false;
        }

        let buffer = TranscriptDisplayBuffer::new(self.settings, self.clock.clone());
        self.sessions.insert(session_id.to_string(), buffer);
        info!("Transcript session '{}' started", session_id);
        true
    }

    /// End a voice session and drop its buffer.
    pub fn end_session(&mut self, session_id: &str) -> bool {
        match self.sessions.remove(session_id) {
            Some(buffer) => {
                info!(
                    "Transcript session '{}' ended with {} items",
                    session_id,
                    buffer.len()
                );
                true
            }
            None => {
                debug!("No transcript session '{}' to end", session_id);
                false
            }
        }
    }

    pub fn get(&self, session_id: &str) -> Option<&TranscriptDisplayBuffer> {
        self.sessions.get(session_id)
    }

    pub fn get_mut(&mut self, session_id: &str) -> Option<&mut TranscriptDisplayBuffer> {
        self.sessions.get_mut(session_id)
    }

    /// Active session ids, sorted.
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn settings(&self) -> &BufferSettings {
        &self.settings
    }
}
