//! Named recurring alarms backed by tokio timers.
//!
//! Each alarm is a spawned task: sleep until the first fire, then tick with
//! a fixed 24-hour period. Arming is keyed by name, so an alarm that already
//! exists is left alone.

use super::daily::{delay_until_next, next_daily_occurrence};
use crate::error::{KelimeError, Result};
use crate::settings::Settings;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Local};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Name of the daily digest alarm.
pub const DAILY_DIGEST_ALARM: &str = "daily-digest";

/// Period between firings.
pub const ALARM_PERIOD: std::time::Duration = std::time::Duration::from_secs(24 * 60 * 60);

/// Receives alarm firings.
#[async_trait]
pub trait AlarmListener: Send + Sync {
    async fn on_alarm(&self, name: &str) -> anyhow::Result<()>;
}

struct ArmedAlarm {
    first_fire: DateTime<Local>,
    handle: JoinHandle<()>,
}

impl ArmedAlarm {
    fn next_fire(&self, now: DateTime<Local>) -> DateTime<Local> {
        if now <= self.first_fire {
            return self.first_fire;
        }
        let period = Duration::hours(24);
        let elapsed = now - self.first_fire;
        let periods = elapsed.num_seconds().div_euclid(period.num_seconds()) + 1;
        self.first_fire + period * i32::try_from(periods).unwrap_or(i32::MAX)
    }
}

/// Daily alarm registry.
#[derive(Clone)]
pub struct AlarmScheduler {
    settings: Settings,
    listener: Arc<dyn AlarmListener>,
    alarms: Arc<Mutex<HashMap<String, ArmedAlarm>>>,
}

impl std::fmt::Debug for AlarmScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlarmScheduler")
            .field("active", &self.active_count())
            .finish_non_exhaustive()
    }
}

impl AlarmScheduler {
    pub fn new(settings: Settings, listener: Arc<dyn AlarmListener>) -> Self {
        Self {
            settings,
            listener,
            alarms: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, ArmedAlarm>>> {
        self.alarms
            .lock()
            .map_err(|_| KelimeError::Scheduler("alarm registry poisoned".to_owned()))
    }

    /// Arm the daily digest alarm unless it is already armed.
    ///
    /// Returns the next fire time.
    pub fn ensure_scheduled(&self) -> Result<DateTime<Local>> {
        let mut alarms = self.lock()?;
        let now = Local::now();
        if let Some(existing) = alarms.get(DAILY_DIGEST_ALARM)
            && !existing.handle.is_finished()
        {
            return Ok(existing.next_fire(now));
        }

        let digest = self.settings.current().digest;
        let first_fire = next_daily_occurrence(&now, digest.send_hour, digest.send_minute)?;
        let delay = delay_until_next(&now, digest.send_hour, digest.send_minute)?
            .to_std()
            .map_err(|e| KelimeError::Scheduler(e.to_string()))?;

        let handle = spawn_alarm(DAILY_DIGEST_ALARM, delay, Arc::clone(&self.listener));
        alarms.insert(
            DAILY_DIGEST_ALARM.to_owned(),
            ArmedAlarm { first_fire, handle },
        );
        info!(
            alarm = DAILY_DIGEST_ALARM,
            next_fire = %first_fire,
            delay_minutes = delay.as_secs() / 60,
            "daily alarm armed"
        );
        Ok(first_fire)
    }

    /// Clear the daily alarm and arm it again from current settings.
    pub fn reschedule(&self) -> Result<DateTime<Local>> {
        self.clear()?;
        self.ensure_scheduled()
    }

    /// Cancel the daily alarm. Returns `true` when one was armed.
    pub fn clear(&self) -> Result<bool> {
        let removed = self.lock()?.remove(DAILY_DIGEST_ALARM);
        match removed {
            Some(alarm) => {
                alarm.handle.abort();
                debug!(alarm = DAILY_DIGEST_ALARM, "alarm cleared");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Next fire time of the daily alarm, if armed.
    #[must_use]
    pub fn next_fire(&self) -> Option<DateTime<Local>> {
        let alarms = self.alarms.lock().ok()?;
        alarms
            .get(DAILY_DIGEST_ALARM)
            .filter(|a| !a.handle.is_finished())
            .map(|a| a.next_fire(Local::now()))
    }

    /// Number of armed alarms.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.alarms
            .lock()
            .map(|alarms| alarms.values().filter(|a| !a.handle.is_finished()).count())
            .unwrap_or_default()
    }
}

fn spawn_alarm(
    name: &'static str,
    delay: std::time::Duration,
    listener: Arc<dyn AlarmListener>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + delay;
        let mut ticker = tokio::time::interval_at(start, ALARM_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            debug!(alarm = name, "alarm fired");
            let listener = Arc::clone(&listener);
            // Run the listener on its own task so a failure never stops the timer.
            tokio::spawn(async move {
                if let Err(e) = listener.on_alarm(name).await {
                    error!(alarm = name, error = %e, "alarm listener failed");
                }
            });
        }
    })
}
