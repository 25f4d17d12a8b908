use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serenity::cache::Cache;
use serenity::client::bridge::gateway::{ShardId, ShardManager};
use serenity::http::Http;
use serenity::prelude::*;

use crate::changelog::ChangelogManager;
use crate::config::Config;
use crate::embed::DiscordPublisher;
use crate::git::ShellGit;
use crate::status::{resident_memory_mb, BotStatusManager, StatusSnapshot};

pub struct ShardManagerContainer;

impl TypeMapKey for ShardManagerContainer {
    type Value = Arc<Mutex<ShardManager>>;
}

/// What command and event handlers get to work with.
#[derive(Clone)]
pub struct BotState {
    pub ctx: Context,
    pub config: Arc<Config>,
    pub started_at: DateTime<Utc>,
    pub command_count: usize,
}

/// Builds the publishers that command and event handlers report through.
pub trait Reporters: Send + Sync + 'static {
    fn status_manager(&self) -> BotStatusManager;
    fn changelog_manager(&self) -> ChangelogManager;
}

impl Reporters for BotState {
    fn status_manager(&self) -> BotStatusManager {
        status_manager(&self.ctx.http, &self.ctx.cache, &self.config, self.started_at, self.command_count)
    }

    fn changelog_manager(&self) -> ChangelogManager {
        let cache = &self.ctx.cache;
        ChangelogManager::new(
            Arc::new(DiscordPublisher::new(self.ctx.http.clone(), cache.current_user_id().0)),
            self.config.changelog_channel_id,
            Arc::new(ShellGit::new(self.config.git_dir.clone())),
            cache.current_user().avatar_url(),
        )
    }
}

impl BotState {
    pub async fn gateway_latency(&self) -> Option<Duration> {
        let data = self.ctx.data.read().await;
        let manager = data.get::<ShardManagerContainer>()?.clone();
        drop(data);

        let manager = manager.lock().await;
        let runners = manager.runners.lock().await;
        let latency = runners.get(&ShardId(self.ctx.shard_id)).and_then(|runner| runner.latency);
        latency
    }
}

pub fn snapshot(cache: &Cache, started_at: DateTime<Utc>, command_count: usize) -> StatusSnapshot {
    let uptime = Utc::now().signed_duration_since(started_at).num_seconds().max(0) as u64;
    StatusSnapshot {
        guilds: cache.guild_count(),
        users: cache.user_count(),
        commands: command_count,
        uptime_seconds: uptime,
        memory_mb: resident_memory_mb(),
        avatar_url: cache.current_user().avatar_url(),
    }
}

/// Also used at shutdown, where only the client's cache and http are left.
pub fn status_manager(
    http: &Arc<Http>,
    cache: &Arc<Cache>,
    config: &Config,
    started_at: DateTime<Utc>,
    command_count: usize,
) -> BotStatusManager {
    BotStatusManager::new(
        Arc::new(DiscordPublisher::new(http.clone(), cache.current_user_id().0)),
        config.status_channel_id,
        snapshot(cache, started_at, command_count),
    )
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::embed::test_support::MemoryChannel;
    use crate::git::test_support::FixedGit;

    pub const STATUS_CHANNEL: u64 = 10;
    pub const CHANGELOG_CHANNEL: u64 = 20;

    /// Reports into one in-memory channel store, with a fixed git history.
    #[derive(Clone)]
    pub struct FakeReporters {
        pub channel: Arc<MemoryChannel>,
        pub git: Arc<FixedGit>,
    }

    impl FakeReporters {
        pub fn new(git: FixedGit) -> Self {
            FakeReporters {
                channel: Arc::new(MemoryChannel::default()),
                git: Arc::new(git),
            }
        }
    }

    impl Reporters for FakeReporters {
        fn status_manager(&self) -> BotStatusManager {
            BotStatusManager::new(self.channel.clone(), Some(STATUS_CHANNEL), StatusSnapshot::default())
        }

        fn changelog_manager(&self) -> ChangelogManager {
            ChangelogManager::new(self.channel.clone(), Some(CHANGELOG_CHANNEL), self.git.clone(), None)
        }
    }
}
