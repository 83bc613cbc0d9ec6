pub mod decision_snapshot;
pub mod events;
pub mod holdings;
pub mod instruments;
pub mod job_runs;
pub mod notification_log;
pub mod prices;
pub mod signal_history;
pub mod snapshots;
