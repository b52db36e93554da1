pub mod constants;
pub mod content;
pub mod preferences;
pub mod shared_selector;
pub mod shared_sequence;
pub mod validation;

pub use content::{ContentDocument, ContentItem, ContentPool, Pool, StageDefinition};
pub use shared_selector::{Draw, Selector};
pub use shared_sequence::{ChooseOutcome, Ignored, Phase, RevealTicket, Sequence, SequenceEvent};
