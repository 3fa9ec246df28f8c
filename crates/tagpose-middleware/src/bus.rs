//! In-process position bus.
//!
//! Uses a [`tokio::sync::broadcast`] channel so that every subscriber (the
//! dashboard bridge, a neighbourhood service, a logger) receives every
//! position message without any single subscriber blocking the others.

use serde::{Deserialize, Serialize};
use tagpose_types::{PoseError, PositionMessage};
use tokio::sync::broadcast;
use tracing::warn;

/// Default channel capacity (messages buffered before slow subscribers
/// start lagging).
const DEFAULT_CAPACITY: usize = 256;

/// A position message together with the topic it was published on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: String,
    pub payload: PositionMessage,
}

/// Shared bus. Clone it cheaply – all clones share the same channel.
#[derive(Clone, Debug)]
pub struct PoseBus {
    sender: broadcast::Sender<Envelope>,
}

impl PoseBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a message.
    ///
    /// Returns the number of subscribers that were handed the message, or a
    /// [`PoseError::Channel`] when nobody is listening.
    pub fn send(&self, topic: &str, payload: PositionMessage) -> Result<usize, PoseError> {
        self.sender
            .send(Envelope {
                topic: topic.to_string(),
                payload,
            })
            .map_err(|_| PoseError::Channel(format!("no subscribers for {topic}")))
    }

    pub fn subscribe(&self) -> PoseReceiver {
        PoseReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for PoseBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Receiving end of a [`PoseBus`] subscription.
pub struct PoseReceiver {
    receiver: broadcast::Receiver<Envelope>,
}

impl PoseReceiver {
    /// Wait for the next message.
    ///
    /// * `Err(RecvError::Lagged(n))` – the subscriber fell behind and `n`
    ///   messages were dropped.
    /// * `Err(RecvError::Closed)` – every bus handle has been dropped.
    pub async fn recv(&mut self) -> Result<Envelope, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Non-blocking receive; `None` when no message is queued.
    ///
    /// A lagging subscriber skips ahead to the oldest message still
    /// buffered.
    pub fn try_recv(&mut self) -> Option<Envelope> {
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) => return Some(envelope),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "position subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }
}
