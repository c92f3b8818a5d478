//! Event types for profiling.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A profiling event with timestamp and optional duration.
#[derive(Serialize)]
pub struct ProfileEvent {
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The type of event
    pub event_type: EventType,
    /// Duration in microseconds (for timed events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_us: Option<u64>,
    /// Additional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ProfileEvent {
    /// Create a new event with the current timestamp.
    pub fn new(event_type: EventType) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            duration_us: None,
            metadata: None,
        }
    }

    /// Create a new event with duration.
    pub fn with_duration(event_type: EventType, duration: std::time::Duration) -> Self {
        Self {
            duration_us: Some(duration.as_micros() as u64),
            ..Self::new(event_type)
        }
    }

    /// Create a new event with metadata.
    pub fn with_metadata(event_type: EventType, metadata: serde_json::Value) -> Self {
        Self {
            metadata: Some(metadata),
            ..Self::new(event_type)
        }
    }
}

/// Types of events that can be logged.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventType {
    // === Session lifecycle ===
    SessionStart {
        session_id: String,
    },
    SessionEnd {
        /// Total events logged
        total_events: u64,
    },

    // === Engine ===
    /// One generation request finished
    EngineRun {
        label: String,
        variants: u32,
        demand: u32,
        entries: i64,
        warnings: i64,
    },
    /// Fresh candidates loaded for one chapter
    PoolLoad {
        chapter: String,
        loaded: i64,
        /// Size of the recently-used exclusion set
        excluded: i64,
    },
    /// One draw of the stratified selector
    TierDraw {
        chapter: String,
        /// exact_outcome, chapter or cross_chapter
        tier: String,
        /// Target rank, 0 for fallback tiers
        rank: u8,
        requested: i64,
        drawn: i64,
    },
    /// One slot split across variants
    Distribution {
        chapter: String,
        rank: u8,
        required: i64,
        available: i64,
    },

    // === Timed scope ===
    /// A timed code block completed
    TimedScope {
        name: String,
    },

    // === Custom events ===
    Custom {
        name: String,
        data: serde_json::Value,
    },
}
