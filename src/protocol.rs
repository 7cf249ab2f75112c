//! Line-oriented JSON protocol of the transcript sidecar.
//!
//! The host process (the web app's voice session layer) writes one request
//! per line on stdin and reads responses and `changed` notifications from
//! stdout, the same IPC shape the other sidecars use.

use crate::display_buffer::{Candidate, DisplayItem, Subscription};
use crate::ingest;
use crate::session::TranscriptSessions;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Request types from the host
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    StartSession { session_id: String },
    EndSession { session_id: String },
    AddItem { session_id: String, item: Candidate },
    /// Raw data-channel packet from the voice agent
    Ingest { session_id: String, packet: Value },
    GetItems { session_id: String },
    Clear { session_id: String },
    ListSessions,
    Status,
    Shutdown,
}

/// Response types to the host
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok { message: String },
    Added { accepted: bool },
    Ingested { accepted: usize },
    Items { session_id: String, items: Vec<DisplayItem> },
    Sessions { sessions: Vec<String> },
    Status {
        sessions: usize,
        max_capacity: usize,
        dedup_window_ms: u64,
    },
    /// An item was accepted into the session's buffer; re-read with `get_items`
    Changed { session_id: String },
    Error { message: String },
}

/// Where responses go (stdout in the binary, a Vec in tests).
pub type Emitter = Arc<dyn Fn(&Response) + Send + Sync>;

/// Request dispatcher holding all session buffers.
pub struct Sidecar {
    sessions: TranscriptSessions,
    /// Change subscription of each session, removed on `end_session`
    subscriptions: HashMap<String, Subscription>,
    emit: Emitter,
}

impl Sidecar {
    pub fn new(sessions: TranscriptSessions, emit: Emitter) -> Self {
        Self {
            sessions,
            subscriptions: HashMap::new(),
            emit,
        }
    }

    /// Parse and handle one input line. Returns `false` once the sidecar
    /// should exit.
    pub fn handle_line(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return true;
        }

        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request),
            Err(e) => {
                warn!("Rejected request line: {}", e);
                self.send(Response::Error {
                    message: format!("Invalid request: {}", e),
                });
                true
            }
        }
    }

    /// Handle one request. Returns `false` once the sidecar should exit.
    pub fn handle(&mut self, request: Request) -> bool {
        match request {
            Request::StartSession { session_id } => {
                let created = self.sessions.start_session(&session_id);
                if created {
                    self.watch(&session_id);
                }
                self.send(Response::Ok {
                    message: if created {
                        format!("Session {} started", session_id)
                    } else {
                        format!("Session {} restarted", session_id)
                    },
                });
            }

            Request::EndSession { session_id } => {
                if let Some(subscription) = self.subscriptions.remove(&session_id) {
                    subscription.unsubscribe();
                }
                if self.sessions.end_session(&session_id) {
                    self.send(Response::Ok {
                        message: format!("Session {} ended", session_id),
                    });
                } else {
                    self.send(unknown_session(&session_id));
                }
            }

            Request::AddItem { session_id, item } => match self.sessions.get_mut(&session_id) {
                Some(buffer) => {
                    let accepted = buffer.add_item(item);
                    self.send(Response::Added { accepted });
                }
                None => self.send(unknown_session(&session_id)),
            },

            Request::Ingest { session_id, packet } => match self.sessions.get_mut(&session_id) {
                Some(buffer) => match ingest::ingest_value(buffer, packet) {
                    Ok(accepted) => self.send(Response::Ingested { accepted }),
                    Err(e) => {
                        warn!("Bad packet for session {}: {:#}", session_id, e);
                        self.send(Response::Error {
                            message: format!("{:#}", e),
                        });
                    }
                },
                None => self.send(unknown_session(&session_id)),
            },

            Request::GetItems { session_id } => match self.sessions.get(&session_id) {
                Some(buffer) => {
                    let items = buffer.get_items();
                    debug!("Returning {} items for session {}", items.len(), session_id);
                    self.send(Response::Items { session_id, items });
                }
                None => self.send(unknown_session(&session_id)),
            },

            Request::Clear { session_id } => match self.sessions.get_mut(&session_id) {
                Some(buffer) => {
                    buffer.clear_buffer();
                    self.send(Response::Ok {
                        message: format!("Session {} cleared", session_id),
                    });
                }
                None => self.send(unknown_session(&session_id)),
            },

            Request::ListSessions => {
                let sessions = self.sessions.session_ids();
                self.send(Response::Sessions { sessions });
            }

            Request::Status => {
                let settings = *self.sessions.settings();
                self.send(Response::Status {
                    sessions: self.sessions.len(),
                    max_capacity: settings.max_capacity,
                    dedup_window_ms: settings.dedup_window_ms,
                });
            }

            Request::Shutdown => {
                info!("Shutdown requested");
                self.send(Response::Ok {
                    message: "Shutting down".to_string(),
                });
                return false;
            }
        }

        true
    }

    /// Emit `changed` for every item accepted into this session's buffer.
    fn watch(&mut self, session_id: &str) {
        let Some(buffer) = self.sessions.get(session_id) else {
            return;
        };

        let emit = self.emit.clone();
        let id = session_id.to_string();
        let subscription = buffer.subscribe(move || {
            emit(&Response::Changed {
                session_id: id.clone(),
            })
        });
        self.subscriptions.insert(session_id.to_string(), subscription);
    }

    fn send(&self, response: Response) {
        (self.emit)(&response);
    }
}

fn unknown_session(session_id: &str) -> Response {
    Response::Error {
        message: format!("Unknown session: {}", session_id),
    }
}
