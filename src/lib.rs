//! Protocol and progress tracking for serial-attached EzGraver laser engravers.

pub mod clock;
pub mod consts;
pub mod engraver;
pub mod error;
pub mod events;
pub mod image;
pub mod progress;
pub mod protocol;
pub mod rate;
pub mod transport;
pub mod types;

pub use engraver::Engraver;
pub use error::{EngraverError, Result};
pub use types::{ImagePayload, ProgressEvent, RateEvent, StatusEvent};
