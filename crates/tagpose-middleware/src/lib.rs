//! `tagpose-middleware` – gets smoothed poses out of the process.
//!
//! # Modules
//!
//! - [`tracks`] – [`TrackRegistry`]: counts consecutive sightings so only
//!   stable markers are published.
//! - [`bus`] – [`PoseBus`]: in-process broadcast of position messages built
//!   on Tokio broadcast channels.
//! - [`publisher`] – [`PosePublisher`] trait, a JSON-lines sink and the
//!   stable-track publishing step.

pub mod bus;
pub mod publisher;
pub mod tracks;

pub use bus::{Envelope, PoseBus, PoseReceiver};
pub use publisher::{JsonLinesPublisher, PosePublisher, publish_stable};
pub use tracks::{Track, TrackRegistry};
