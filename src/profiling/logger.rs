//! JSONL file logger for profiling events.

use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;

use super::event::{EventType, ProfileEvent};
use crate::paths;

/// Global logger instance - must be initialized via init().
static LOGGER: Mutex<Option<ProfileLogger>> = Mutex::new(None);

/// Event counter for session statistics.
static EVENT_COUNT: AtomicU64 = AtomicU64::new(0);

/// The profile logger that writes events to a JSONL file.
pub struct ProfileLogger {
    writer: BufWriter<File>,
    session_id: String,
}

impl ProfileLogger {
    /// Create a new logger with a timestamped filename under DATA_DIR.
    fn new() -> std::io::Result<Self> {
        let session_id = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let filename = paths::profile_log_path(&session_id);

        create_dir_all(paths::data_dir())?;

        let file = OpenOptions::new().create(true).append(true).open(&filename)?;

        tracing::info!("Profiling enabled: writing to {}", filename);

        Ok(Self {
            writer: BufWriter::new(file),
            session_id,
        })
    }

    fn log(&mut self, event: ProfileEvent) {
        if let Ok(json) = serde_json::to_string(&event) {
            let _ = writeln!(self.writer, "{}", json);
            // Flush periodically for durability (every 100 events)
            if EVENT_COUNT.load(Ordering::Relaxed) % 100 == 0 {
                let _ = self.writer.flush();
            }
            tracing::trace!("[PROFILE] {}", json);
        }
        EVENT_COUNT.fetch_add(1, Ordering::Relaxed);
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}

fn with_logger(f: impl FnOnce(&mut ProfileLogger)) {
    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(ref mut logger) = *guard {
            f(logger);
        }
    }
}

/// Initialize the profiler. Call this from main() before any logging.
pub fn init() {
    let Ok(mut guard) = LOGGER.lock() else {
        tracing::error!("Profiler lock poisoned");
        return;
    };
    if guard.is_some() {
        tracing::warn!("Profiler already initialized");
        return;
    }

    match ProfileLogger::new() {
        Ok(logger) => {
            let session_id = logger.session_id.clone();
            *guard = Some(logger);

            drop(guard); // Release lock before logging
            log_event(EventType::SessionStart { session_id });
        }
        Err(e) => {
            tracing::error!("Failed to initialize profiler: {}", e);
        }
    }
}

/// Shutdown the profiler and flush remaining events.
pub fn shutdown() {
    let total_events = EVENT_COUNT.load(Ordering::Relaxed);
    log_event(EventType::SessionEnd { total_events });

    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(ref mut logger) = *guard {
            logger.flush();
            tracing::info!("Profiling session ended: {} events logged", total_events);
        }
        *guard = None;
    }
}

/// Log a profiling event.
pub fn log_event(event_type: EventType) {
    with_logger(|logger| logger.log(ProfileEvent::new(event_type)));
}

/// Log a profiling event with additional metadata.
pub fn log_event_with_meta(event_type: EventType, metadata: serde_json::Value) {
    with_logger(|logger| logger.log(ProfileEvent::with_metadata(event_type, metadata)));
}

/// Log a timed scope completion.
pub fn log_timed(name: &str, duration: Duration) {
    let event_type = EventType::TimedScope { name: name.to_string() };
    with_logger(|logger| logger.log(ProfileEvent::with_duration(event_type, duration)));
}
