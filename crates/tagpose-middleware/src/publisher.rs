//! Sinks for position messages.
//!
//! The pose core never talks to a transport directly.  Whatever sits on the
//! other side (an MQTT client, a WebSocket bridge, stdout) implements
//! [`PosePublisher`].

use std::io::Write;

use serde::Serialize;
use tagpose_types::{PoseError, PositionMessage, position_topic};
use tracing::debug;

use crate::bus::PoseBus;
use crate::tracks::TrackRegistry;

/// Anything that can deliver a [`PositionMessage`] on a topic.
pub trait PosePublisher {
    fn publish(&mut self, topic: &str, message: &PositionMessage) -> Result<(), PoseError>;
}

#[derive(Serialize)]
struct Line<'a> {
    topic: &'a str,
    payload: &'a PositionMessage,
}

/// Writes one `{"topic": .., "payload": ..}` JSON object per line.
pub struct JsonLinesPublisher<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> PosePublisher for JsonLinesPublisher<W> {
    fn publish(&mut self, topic: &str, message: &PositionMessage) -> Result<(), PoseError> {
        let line = serde_json::to_string(&Line {
            topic,
            payload: message,
        })
        .map_err(|e| PoseError::Serialization(e.to_string()))?;
        writeln!(self.writer, "{line}").map_err(|e| PoseError::Io(e.to_string()))?;
        self.writer.flush().map_err(|e| PoseError::Io(e.to_string()))
    }
}

/// Publishing onto the bus with nobody subscribed is not a failure.
impl PosePublisher for PoseBus {
    fn publish(&mut self, topic: &str, message: &PositionMessage) -> Result<(), PoseError> {
        if let Err(e) = self.send(topic, *message) {
            debug!(topic, error = %e, "position dropped");
        }
        Ok(())
    }
}

/// Publish every track in `tracks` that has been seen for more than
/// `min_ticks` frames, on `"{prefix}{id}/position"`.
///
/// Returns the number of messages published.
pub fn publish_stable(
    tracks: &TrackRegistry,
    min_ticks: u64,
    topic_prefix: &str,
    publisher: &mut dyn PosePublisher,
) -> Result<usize, PoseError> {
    let mut published = 0;
    for track in tracks.stable(min_ticks) {
        let topic = position_topic(topic_prefix, track.pose.marker_id);
        publisher.publish(&topic, &PositionMessage::from(&track.pose))?;
        published += 1;
    }
    Ok(published)
}
