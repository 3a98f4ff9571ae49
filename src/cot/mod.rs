//! Output event records: classification, synthesis, serialization.

mod classify;
mod event;
mod writer;

pub use classify::{classify, Classification, FREEHAND_TYPE};
pub use event::{synthesize, synthesize_at, CotEvent, Detail, EventPoint};
pub use writer::{to_xml, COT_DECLARATION};

/// File extension of the event-record format.
pub const COT_EXTENSION: &str = "cot";
