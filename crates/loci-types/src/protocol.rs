//! Client-facing subscription protocol constants.
//!
//! These are the event and command names spoken over whatever persistent
//! connection transport the serving layer mounts (the transport itself
//! lives outside this workspace). Keeping them here means the server and
//! any Rust-side client agree on the strings by construction.

/// Inbound command: join the room for a job's progress events.
pub const SUBSCRIBE_JOB: &str = "subscribe-job";

/// Inbound command: leave a job's room.
pub const UNSUBSCRIBE_JOB: &str = "unsubscribe-job";

/// Outbound event name carrying a [`ProgressEvent`] payload.
///
/// [`ProgressEvent`]: crate::ProgressEvent
pub const TASK_PROGRESS: &str = "task-progress";

/// Room name for a job's subscribers.
pub fn room_name(job_id: &str) -> String {
    format!("job:{job_id}")
}
