//! Background Tasks Module
//!
//! Long-running registry tasks.
//!
//! # Tasks
//! - Heartbeat: probes instances and evicts the unresponsive ones
//! - Push worker: delivers membership updates to instances

mod heartbeat;
mod push;

pub use heartbeat::{probe_client, run_heartbeat_cycle, spawn_heartbeat_task, PROBE_ATTEMPTS};
pub use push::{spawn_push_worker, PushJob, PushQueue, PushStats};
