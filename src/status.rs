use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, warn};

use crate::embed::{ChannelPublisher, RichMessage};
use crate::error::BotError;

pub const STATUS_TITLE: &str = "🌙 Mizuki Bot Status";
const STATUS_MARKER: &str = "Mizuki Bot Status";
const RECENT_MESSAGES: u64 = 20;

pub const MAINTENANCE_MESSAGE: &str = "El bot está en mantenimiento";
pub const ERROR_MESSAGE: &str = "El bot ha encontrado un error";
pub const RESTARTING_MESSAGE: &str = "El bot se está reiniciando...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotStatus {
    Online,
    Offline,
    Maintenance,
    Restarting,
    Error,
}

impl BotStatus {
    pub const CHOICES: [(&'static str, &'static str); 5] = [
        ("🟢 Online", "online"),
        ("🔴 Offline", "offline"),
        ("🟡 Mantenimiento", "maintenance"),
        ("🔄 Reiniciando", "restarting"),
        ("❌ Error", "error"),
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "online" => Some(Self::Online),
            "offline" => Some(Self::Offline),
            "maintenance" => Some(Self::Maintenance),
            "restarting" => Some(Self::Restarting),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Online => "🟢 Online",
            Self::Offline => "🔴 Offline",
            Self::Maintenance => "🟡 Mantenimiento",
            Self::Restarting => "🔄 Reiniciando",
            Self::Error => "❌ Error",
        }
    }

    pub fn color(&self) -> u32 {
        match self {
            Self::Online => 0x00ff00,
            Self::Offline | Self::Error => 0xff0000,
            Self::Maintenance => 0xffff00,
            Self::Restarting => 0x0099ff,
        }
    }
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Maintenance => "maintenance",
            Self::Restarting => "restarting",
            Self::Error => "error",
        };
        f.write_str(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub guilds: usize,
    pub users: usize,
    pub commands: usize,
    pub uptime_seconds: u64,
    pub memory_mb: Option<u64>,
    pub avatar_url: Option<String>,
}

pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Resident set size of this process, where procfs is available.
pub fn resident_memory_mb() -> Option<u64> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(pages * 4096 / 1024 / 1024)
}

pub fn status_embed(status: BotStatus, message: Option<&str>, snapshot: &StatusSnapshot, now: DateTime<Utc>) -> RichMessage {
    let memory = snapshot
        .memory_mb
        .map(|mb| format!("{} MB", mb))
        .unwrap_or_else(|| "n/d".to_string());

    let mut embed = RichMessage::new(STATUS_TITLE, status.color())
        .thumbnail(snapshot.avatar_url.clone())
        .field("🔄 Status", format!("**{}**", status.label()), true)
        .field("⏰ Uptime", format_uptime(snapshot.uptime_seconds), true)
        .field("📊 Servidores", format!("**{}** servidores", snapshot.guilds), true)
        .field("👥 Usuarios", format!("**{}** usuarios", snapshot.users), true)
        .field("💾 Memoria", memory, true)
        .field("🔧 Comandos", format!("**{}** comandos", snapshot.commands), true)
        .footer(
            format!("Mizuki Bot • {}", now.with_timezone(&chrono::Local).format("%d/%m/%Y, %H:%M:%S")),
            snapshot.avatar_url.clone(),
        )
        .timestamp(now);

    if let Some(message) = message.filter(|m| !m.is_empty()) {
        embed = embed.field("📝 Mensaje", message, false);
    }
    embed
}

pub struct BotStatusManager {
    publisher: Arc<dyn ChannelPublisher>,
    channel_id: Option<u64>,
    snapshot: StatusSnapshot,
}

impl BotStatusManager {
    pub fn new(publisher: Arc<dyn ChannelPublisher>, channel_id: Option<u64>, snapshot: StatusSnapshot) -> Self {
        BotStatusManager {
            publisher,
            channel_id,
            snapshot,
        }
    }

    pub async fn update_status(&self, status: BotStatus, message: Option<&str>) {
        match self.try_update(status, message).await {
            Ok(()) => info!("✅ Status updated to: {}", status),
            Err(why @ BotError::CollaboratorUnavailable(_)) => warn!("⚠️ {}", why),
            Err(why) => error!("❌ Error updating status message: {}", why),
        }
    }

    async fn try_update(&self, status: BotStatus, message: Option<&str>) -> Result<(), BotError> {
        let channel_id = self
            .channel_id
            .ok_or_else(|| BotError::CollaboratorUnavailable("status channel ID not configured".to_string()))?;
        let embed = status_embed(status, message, &self.snapshot, Utc::now());
        self.publish(channel_id, &embed).await
    }

    /// Edits the bot's latest status message if one is among the recent
    /// messages, otherwise sends a new one.
    async fn publish(&self, channel_id: u64, embed: &RichMessage) -> Result<(), BotError> {
        let author = self.publisher.author_id();
        let recent = self.publisher.recent(channel_id, RECENT_MESSAGES).await?;
        let existing = recent.iter().find(|message| {
            message.author_id == author
                && message
                    .embed_title
                    .as_deref()
                    .map_or(false, |title| title.contains(STATUS_MARKER))
        });

        match existing {
            Some(message) => {
                self.publisher.edit(channel_id, message.id, embed).await?;
                info!("📝 Status message updated");
            }
            None => {
                self.publisher.send(channel_id, embed).await?;
                info!("📤 New status message sent");
            }
        }
        Ok(())
    }

    pub async fn set_online(&self) {
        self.update_status(BotStatus::Online, None).await
    }

    pub async fn set_offline(&self) {
        self.update_status(BotStatus::Offline, None).await
    }

    pub async fn set_maintenance(&self, message: &str) {
        self.update_status(BotStatus::Maintenance, Some(message)).await
    }

    pub async fn set_restarting(&self) {
        self.update_status(BotStatus::Restarting, Some(RESTARTING_MESSAGE)).await
    }

    pub async fn set_error(&self, message: &str) {
        self.update_status(BotStatus::Error, Some(message)).await
    }
}
