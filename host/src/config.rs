use party_shared::constants::{OFFER_COUNT, REVEAL_HOLD_MS, STAGE_PAUSE_MS};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Bundled content, resolved against the crate so the host starts from any directory.
/// `PARTY_CONTENT_PATH` overrides it.
const DEFAULT_CONTENT_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/content/party.json");
const DEFAULT_PREFERENCES_PATH: &str = "preferences.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTiming {
    pub hold: Duration,
    pub pause: Duration,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            hold: Duration::from_millis(REVEAL_HOLD_MS),
            pause: Duration::from_millis(STAGE_PAUSE_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    pub content_path: PathBuf,
    pub preferences_path: PathBuf,
    pub timing: RevealTiming,
    pub offer_count: usize,
    pub seed: Option<u64>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            content_path: PathBuf::from(DEFAULT_CONTENT_PATH),
            preferences_path: PathBuf::from(DEFAULT_PREFERENCES_PATH),
            timing: RevealTiming::default(),
            offer_count: OFFER_COUNT,
            seed: None,
        }
    }
}

impl HostConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unparsable values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let hold = parse_or(&lookup, "PARTY_REVEAL_HOLD_MS", REVEAL_HOLD_MS);
        let pause = parse_or(&lookup, "PARTY_STAGE_PAUSE_MS", STAGE_PAUSE_MS);
        let offer_count = match parse_or(&lookup, "PARTY_OFFER_COUNT", OFFER_COUNT) {
            0 => {
                warn!("PARTY_OFFER_COUNT must be at least 1, using {}", OFFER_COUNT);
                OFFER_COUNT
            }
            count => count,
        };
        let seed = lookup("PARTY_SEED").and_then(|raw| match raw.parse::<u64>() {
            Ok(seed) => Some(seed),
            Err(_) => {
                warn!("Ignoring invalid PARTY_SEED '{}'", raw);
                None
            }
        });

        Self {
            content_path: lookup("PARTY_CONTENT_PATH").map(PathBuf::from).unwrap_or(defaults.content_path),
            preferences_path: lookup("PARTY_PREFERENCES_PATH").map(PathBuf::from).unwrap_or(defaults.preferences_path),
            timing: RevealTiming {
                hold: Duration::from_millis(hold),
                pause: Duration::from_millis(pause),
            },
            offer_count,
            seed,
        }
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value '{}' for {}, using {}", raw, key, default);
            default
        }),
        None => default,
    }
}
