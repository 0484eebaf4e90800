//! Append-only activity log shared by every component of the server.
//!
//! Entries are numbered sequentially from 1 and stamped with wall-clock time
//! in UTC. Each entry is also emitted as a `tracing` event so operators see
//! the same history in the structured log stream.

use std::sync::{Mutex, PoisonError};

use homeguard_protocol::ActivityRecord;
use strum::{Display, IntoStaticStr};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::info;

pub(crate) const ACTIVITY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::activity");

/// Placeholder recorded when an entry has no actor or device.
pub const NOT_APPLICABLE: &str = "N/A";

/// Actor recorded for entries raised by the server itself.
pub const SYSTEM_USER: &str = "SYSTEM";

/// Coarse category of an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum ActionType {
    /// Server lifecycle.
    System,
    /// Client connections coming and going.
    Session,
    /// Login and signup attempts.
    Auth,
    /// Device state changes and failed device operations.
    Device,
    /// Frames the dispatcher could not act on.
    Protocol,
}

/// An entry waiting to be appended to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    action_type: ActionType,
    user: String,
    device_id: String,
    device_name: String,
    message: String,
}

impl ActivityEntry {
    /// Starts an entry attributed to [`SYSTEM_USER`] with no device.
    pub fn new(action_type: ActionType, message: impl Into<String>) -> Self {
        Self {
            action_type,
            user: SYSTEM_USER.to_owned(),
            device_id: NOT_APPLICABLE.to_owned(),
            device_name: NOT_APPLICABLE.to_owned(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`ActionType::Device`] entry about one device.
    pub fn device(device_id: &str, device_name: &str, message: impl Into<String>) -> Self {
        Self::new(ActionType::Device, message).with_device(device_id, device_name)
    }

    /// Attributes the entry to a user.
    #[must_use]
    pub fn with_user(mut self, user: &str) -> Self {
        user.clone_into(&mut self.user);
        self
    }

    /// Attaches the affected device.
    #[must_use]
    pub fn with_device(mut self, device_id: &str, device_name: &str) -> Self {
        device_id.clone_into(&mut self.device_id);
        device_name.clone_into(&mut self.device_name);
        self
    }

    /// Category of the entry.
    #[must_use]
    pub const fn action_type(&self) -> ActionType {
        self.action_type
    }

    /// Description of the entry.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Destination for activity entries.
pub trait ActivitySink: Send + Sync {
    /// Appends an entry.
    fn record(&self, entry: ActivityEntry);

    /// Returns a snapshot of every entry in insertion order.
    fn records(&self) -> Vec<ActivityRecord>;
}

/// In-memory [`ActivitySink`].
#[derive(Debug, Default)]
pub struct ActivityLog {
    state: Mutex<LogState>,
}

#[derive(Debug, Default)]
struct LogState {
    last_id: u64,
    records: Vec<ActivityRecord>,
}

impl ActivityLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LogState> {
        // Entries are appended whole, so a poisoned log is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ActivitySink for ActivityLog {
    fn record(&self, entry: ActivityEntry) {
        let now = OffsetDateTime::now_utc();
        let action: &'static str = entry.action_type.into();
        info!(
            target: ACTIVITY_TARGET,
            action,
            user = %entry.user,
            device_id = %entry.device_id,
            "{}",
            entry.message
        );

        let mut state = self.lock();
        state.last_id += 1;
        let record = ActivityRecord {
            log_id: state.last_id,
            user: entry.user,
            action_type: action.to_owned(),
            device_name: entry.device_name,
            device_id: entry.device_id,
            message: entry.message,
            timestamp_ms: unix_millis(now),
            date_time: format_date_time(now),
        };
        state.records.push(record);
    }

    fn records(&self) -> Vec<ActivityRecord> {
        self.lock().records.clone()
    }
}

fn unix_millis(now: OffsetDateTime) -> u64 {
    u64::try_from((now - OffsetDateTime::UNIX_EPOCH).whole_milliseconds()).unwrap_or(0)
}

fn format_date_time(now: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    now.format(format).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn numbers_entries_from_one() {
        let log = ActivityLog::new();
        log.record(ActivityEntry::new(ActionType::System, "started"));
        log.record(ActivityEntry::device("light1", "Lamp", "set to ON").with_user("admin1"));

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].log_id, 1);
        assert_eq!(records[0].user, SYSTEM_USER);
        assert_eq!(records[0].device_id, NOT_APPLICABLE);
        assert_eq!(records[1].log_id, 2);
        assert_eq!(records[1].user, "admin1");
        assert_eq!(records[1].action_type, "Device");
        assert_eq!(records[1].device_name, "Lamp");
    }

    #[rstest]
    fn stamps_entries_with_utc_time() {
        let log = ActivityLog::new();
        log.record(ActivityEntry::new(ActionType::System, "tick"));
        let record = &log.records()[0];
        assert!(record.timestamp_ms > 0);
        assert_eq!(record.date_time.len(), "2024-01-01 00:00:00".len());
        assert_eq!(record.date_time.as_bytes()[10], b' ');
    }

    #[rstest]
    fn converts_instants_to_millis_and_wall_clock() {
        let instant = time::macros::datetime!(2024-01-02 03:04:05.678 UTC);
        assert_eq!(unix_millis(instant), 1_704_164_645_678);
        assert_eq!(format_date_time(instant), "2024-01-02 03:04:05");
        assert_eq!(unix_millis(OffsetDateTime::UNIX_EPOCH), 0);
    }

    #[rstest]
    fn concurrent_writers_get_unique_ids() {
        let log = Arc::new(ActivityLog::new());
        let writers: Vec<_> = (0..8)
            .map(|_| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for _ in 0..25 {
                        log.record(ActivityEntry::new(ActionType::Session, "ping"));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().expect("writer thread");
        }

        let ids: Vec<u64> = log.records().iter().map(|record| record.log_id).collect();
        assert_eq!(ids, (1..=200).collect::<Vec<_>>());
    }
}
