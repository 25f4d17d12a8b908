use std::env;
use std::path::PathBuf;

use serenity::model::gateway::Activity;

use crate::error::BotError;

pub const DEFAULT_PRESENCE_TEXT: &str = "🌙 Gestionando servidores";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceKind {
    Playing,
    Listening,
    Watching,
    Competing,
}

impl PresenceKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "playing" => Some(Self::Playing),
            "listening" => Some(Self::Listening),
            "watching" => Some(Self::Watching),
            "competing" => Some(Self::Competing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Presence {
    pub kind: PresenceKind,
    pub text: String,
}

impl Presence {
    pub fn activity(&self) -> Activity {
        match self.kind {
            PresenceKind::Playing => Activity::playing(&self.text),
            PresenceKind::Listening => Activity::listening(&self.text),
            PresenceKind::Watching => Activity::watching(&self.text),
            PresenceKind::Competing => Activity::competing(&self.text),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub guild_id: Option<u64>,
    pub status_channel_id: Option<u64>,
    pub changelog_channel_id: Option<u64>,
    pub log_level: String,
    pub presence: Presence,
    pub git_dir: Option<PathBuf>,
}

impl Config {
    /// Reads the process environment. Call after `dotenv()` so `.env` values are visible.
    pub fn from_env() -> Result<Self, BotError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset, matching how the .env template ships them.
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let token = get("DISCORD_TOKEN")
            .ok_or_else(|| BotError::Config("Expected DISCORD_TOKEN in environment".to_string()))?;

        let guild_id = parse_id("GUILD_ID", get("GUILD_ID"))?;
        let status_channel_id = parse_id(
            "STATUS_CHANNEL_ID",
            get("STATUS_CHANNEL_ID").or_else(|| get("bot_status_id")),
        )?;
        let changelog_channel_id = parse_id(
            "CHANGELOG_CHANNEL_ID",
            get("CHANGELOG_CHANNEL_ID").or_else(|| get("chanelog_id")),
        )?;

        let kind = match get("PRESENCE_TYPE") {
            None => PresenceKind::Watching,
            Some(raw) => PresenceKind::parse(&raw).ok_or_else(|| {
                BotError::Config(format!("PRESENCE_TYPE must be playing, listening, watching or competing, got {}", raw))
            })?,
        };

        Ok(Config {
            token,
            guild_id,
            status_channel_id,
            changelog_channel_id,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            presence: Presence {
                kind,
                text: get("PRESENCE_TEXT").unwrap_or_else(|| DEFAULT_PRESENCE_TEXT.to_string()),
            },
            git_dir: get("GIT_DIR_PATH").map(PathBuf::from),
        })
    }
}

fn parse_id(key: &str, value: Option<String>) -> Result<Option<u64>, BotError> {
    match value {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| BotError::Config(format!("{} must be an integer, got {}", key, raw))),
    }
}
