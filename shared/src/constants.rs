pub const NO_CONTENT_MESSAGE: &str = "No content available for this category";
pub const FALLBACK_CATEGORY: &str = "default";
pub const FALLBACK_SEQUENCE: &str = "default";
pub const FALLBACK_ITEM_TEXT: &str = "Content could not be loaded. Make up your own challenge!";
pub const FALLBACK_STAGE_TITLE: &str = "Pick a card";

pub const IMPORT_SHAPE_ERROR: &str = "Import file is not a preferences export";
pub const IMPORT_TAG_ERROR: &str = "Import file contains an unknown preference";

// Reveal timing used by the animated games
pub const REVEAL_HOLD_MS: u64 = 2000;  // How long a chosen option stays highlighted before it locks
pub const STAGE_PAUSE_MS: u64 = 500;   // Pause between a locked stage and the next one
pub const OFFER_COUNT: usize = 5;      // Options shown per stage (5 of N)
