//! In-process scheduling for pulse.
//!
//! Drives the two recurring sweeps the engine needs:
//!
//! - **Trigger sweep**: evaluates the trigger catalog for every recently
//!   active user.
//! - **Queue sweep**: delivers deferred notifications whose time has come.
//!
//! Single process, single active scheduling loop. Shutdown is cooperative:
//! an in-flight sweep finishes its current user, then halts.

pub mod scheduler;

pub use scheduler::{Scheduler, SchedulerConfig, SchedulerHandle};
