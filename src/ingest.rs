//! Decoding of voice-agent data-channel packets.
//!
//! The agent publishes JSON messages on the room's data channel. Transcript
//! messages carry a speaker and a list of segments, each of which becomes one
//! display candidate:
//!
//! ```json
//! {"type": "transcript", "speaker": "teacher",
//!  "segments": [{"type": "math", "content": "a^2 + b^2 = c^2", "confidence": 0.94}]}
//! ```
//!
//! Other message types (`agent_connected`, `agent_disconnected`, ...) are not
//! transcript content and are skipped.

use crate::display_buffer::{
    check_reserved_fields, Candidate, DisplayItemKind, TranscriptDisplayBuffer,
};
use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map, Value};

const TRANSCRIPT_PACKET: &str = "transcript";

#[derive(Debug, Deserialize)]
struct PacketHeader {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptPacket {
    speaker: String,
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(rename = "type")]
    kind: DisplayItemKind,
    content: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(flatten)]
    metadata: Map<String, Value>,
}

/// Decode a raw data-channel payload into candidates, in segment order.
pub fn parse_packet(payload: &[u8]) -> Result<Vec<Candidate>> {
    let value: Value =
        serde_json::from_slice(payload).context("Data packet is not valid JSON")?;
    parse_packet_value(value)
}

/// Same as `parse_packet` for an already decoded JSON value.
pub fn parse_packet_value(value: Value) -> Result<Vec<Candidate>> {
    let header: PacketHeader =
        serde_json::from_value(value.clone()).context("Data packet has no 'type' field")?;

    if header.kind != TRANSCRIPT_PACKET {
        debug!("Skipping non-transcript data packet '{}'", header.kind);
        return Ok(Vec::new());
    }

    let packet: TranscriptPacket =
        serde_json::from_value(value).context("Malformed transcript packet")?;

    if packet.segments.is_empty() {
        warn!("Transcript packet from '{}' has no segments", packet.speaker);
    }

    for (index, segment) in packet.segments.iter().enumerate() {
        check_reserved_fields(&segment.metadata)
            .map_err(|e| anyhow!("Segment {}: {}", index, e))
            .context("Malformed transcript packet")?;
    }

    let speaker = packet.speaker;
    Ok(packet
        .segments
        .into_iter()
        .map(|segment| Candidate {
            kind: segment.kind,
            content: segment.content,
            speaker: speaker.clone(),
            confidence: segment.confidence,
            metadata: segment.metadata,
        })
        .collect())
}

/// Feed every segment of a packet to the buffer. Returns how many were
/// accepted; duplicates are not an error.
pub fn ingest_packet(buffer: &mut TranscriptDisplayBuffer, payload: &[u8]) -> Result<usize> {
    let candidates = parse_packet(payload)?;
    Ok(add_all(buffer, candidates))
}

/// `ingest_packet` for an already decoded JSON value.
pub fn ingest_value(buffer: &mut TranscriptDisplayBuffer, value: Value) -> Result<usize> {
    let candidates = parse_packet_value(value)?;
    Ok(add_all(buffer, candidates))
}

fn add_all(buffer: &mut TranscriptDisplayBuffer, candidates: Vec<Candidate>) -> usize {
    let offered = candidates.len();
    let accepted = candidates
        .into_iter()
        .map(|candidate| buffer.add_item(candidate))
        .filter(|accepted| *accepted)
        .count();

    if accepted < offered {
        debug!("Ingested packet: {} of {} segments accepted", accepted, offered);
    }
    accepted
}
