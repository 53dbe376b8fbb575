mod payload;
mod progress_axis;
mod status_event;
mod tracker_events;

pub use payload::ImagePayload;
pub use progress_axis::ProgressAxis;
pub use status_event::StatusEvent;
pub use tracker_events::{ProgressEvent, RateEvent};
