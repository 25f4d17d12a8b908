use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;

use crate::error::BotError;

pub const DEFAULT_COOLDOWN_SECONDS: u64 = 3;
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct CooldownEntry {
    last_invocation_ms: i64,
    window_ms: i64,
}

impl CooldownEntry {
    fn expires_at(&self) -> i64 {
        self.last_invocation_ms + self.window_ms
    }
}

/// Per command, per user timestamps of the last allowed invocation.
#[derive(Default)]
pub struct CooldownGate {
    entries: Mutex<HashMap<String, HashMap<u64, CooldownEntry>>>,
}

impl CooldownGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, HashMap<u64, CooldownEntry>>> {
        // The map holds plain timestamps, so a poisoned lock is still consistent.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Checks and records under a single lock, so two concurrent calls for the
    /// same key cannot both be allowed. A denial is `BotError::CooldownDenied`.
    pub fn check_and_record(
        &self,
        command: &str,
        user_id: u64,
        cooldown_seconds: u64,
        now_ms: i64,
    ) -> Result<(), BotError> {
        let window_ms = (cooldown_seconds as i64).saturating_mul(1000);
        let mut entries = self.entries();
        let timestamps = entries.entry(command.to_string()).or_default();

        if let Some(entry) = timestamps.get(&user_id) {
            let expires_at = entry.last_invocation_ms + window_ms;
            if now_ms < expires_at {
                return Err(BotError::CooldownDenied {
                    retry_after_ms: expires_at - now_ms,
                });
            }
        }

        timestamps.insert(
            user_id,
            CooldownEntry {
                last_invocation_ms: now_ms,
                window_ms,
            },
        );
        Ok(())
    }

    /// Drops entries whose window has elapsed. Returns how many were removed.
    pub fn sweep(&self, now_ms: i64) -> usize {
        let mut entries = self.entries();
        let mut removed = 0;
        entries.retain(|_, timestamps| {
            let before = timestamps.len();
            timestamps.retain(|_, entry| now_ms < entry.expires_at());
            removed += before - timestamps.len();
            !timestamps.is_empty()
        });
        removed
    }

    /// Periodically reclaims expired entries until the process exits.
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = self.sweep(chrono::Utc::now().timestamp_millis());
                if removed > 0 {
                    debug!("Swept {} expired cooldown entries", removed);
                }
            }
        })
    }

    pub fn tracked(&self) -> usize {
        self.entries().values().map(HashMap::len).sum()
    }
}
