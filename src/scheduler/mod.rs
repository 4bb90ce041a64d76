//! Daily alarm scheduling.
//!
//! [`daily`] holds the pure next-occurrence computation; [`alarm`] arms the
//! recurring tokio timer and dispatches firings to an [`AlarmListener`].

pub mod alarm;
pub mod daily;

pub use alarm::{ALARM_PERIOD, AlarmListener, AlarmScheduler, DAILY_DIGEST_ALARM};
pub use daily::{delay_until_next, next_daily_occurrence};
