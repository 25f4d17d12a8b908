use std::sync::Arc;

use chrono::Utc;
use log::{error, info, warn};

use crate::embed::{ChannelPublisher, RichMessage, EMBED_TOTAL_LIMIT};
use crate::error::BotError;
use crate::git::{format_commit_message, GitCommit, GitSource, RepositoryInfo};

const CHANGELOG_COLOR: u32 = 0x5865f2;
// Discord allows 25 fields; leave room for the repository link.
const MAX_HISTORY_FIELDS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangelogKind {
    Last,
    History,
    Weekly,
    Release,
}

impl ChangelogKind {
    pub const CHOICES: [(&'static str, &'static str); 4] = [
        ("Último Commit", "last"),
        ("Historial (5 commits)", "history"),
        ("Semanal (10 commits)", "weekly"),
        ("Release (20 commits)", "release"),
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "last" => Some(Self::Last),
            "history" => Some(Self::History),
            "weekly" => Some(Self::Weekly),
            "release" => Some(Self::Release),
            _ => None,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Self::Last => 1,
            Self::History => 5,
            Self::Weekly => 10,
            Self::Release => 20,
        }
    }

    pub fn confirmation(&self) -> &'static str {
        match self {
            Self::Last => "✅ Changelog del último commit enviado exitosamente.",
            Self::History => "✅ Changelog con historial de 5 commits enviado exitosamente.",
            Self::Weekly => "✅ Changelog semanal enviado exitosamente.",
            Self::Release => "✅ Changelog de release enviado exitosamente.",
        }
    }
}

pub struct ChangelogManager {
    publisher: Arc<dyn ChannelPublisher>,
    channel_id: Option<u64>,
    git: Arc<dyn GitSource>,
    avatar_url: Option<String>,
}

impl ChangelogManager {
    pub fn new(
        publisher: Arc<dyn ChannelPublisher>,
        channel_id: Option<u64>,
        git: Arc<dyn GitSource>,
        avatar_url: Option<String>,
    ) -> Self {
        ChangelogManager {
            publisher,
            channel_id,
            git,
            avatar_url,
        }
    }

    pub async fn send(&self, kind: ChangelogKind) {
        match kind.depth() {
            1 => self.send_last_commit().await,
            depth => self.send_history(depth).await,
        }
    }

    pub async fn send_last_commit(&self) {
        report(self.try_send_last_commit().await);
    }

    pub async fn send_history(&self, limit: usize) {
        report(self.try_send_history(limit).await);
    }

    fn channel(&self) -> Result<u64, BotError> {
        self.channel_id
            .ok_or_else(|| BotError::CollaboratorUnavailable("changelog channel ID not configured".to_string()))
    }

    /// Number of commits published; zero when there was no history to show.
    async fn try_send_last_commit(&self) -> Result<usize, BotError> {
        let channel_id = self.channel()?;
        let Some(commit) = self.git.history(1).await.into_iter().next() else {
            return Ok(0);
        };

        let repository = self.git.repository().await;
        self.publisher.send(channel_id, &self.commit_embed(&commit, &repository)).await?;
        Ok(1)
    }

    async fn try_send_history(&self, limit: usize) -> Result<usize, BotError> {
        let channel_id = self.channel()?;
        let commits = self.git.history(limit).await;
        if commits.is_empty() {
            return Ok(0);
        }

        let repository = self.git.repository().await;
        let embed = self.history_embed(&commits, &repository);
        self.publisher.send(channel_id, &embed).await?;
        Ok(embed.fields.len() - usize::from(repository.remote_url.is_some()))
    }

    fn commit_embed(&self, commit: &GitCommit, repository: &RepositoryInfo) -> RichMessage {
        let mut embed = RichMessage::new("📝 Changelog - Último Commit", CHANGELOG_COLOR)
            .thumbnail(self.avatar_url.clone())
            .field("🔖 Commit", format!("`{}`", commit.short_hash), true)
            .field("👤 Autor", &commit.author, true)
            .field("📅 Fecha", format!("<t:{}:F>", commit.timestamp), true)
            .field("🌿 Rama", format!("`{}`", commit.branch), true)
            .field("📝 Mensaje", format_commit_message(&commit.subject), false)
            .footer("Mizuki Bot • Changelog", self.avatar_url.clone())
            .timestamp(Utc::now());

        if let Some(remote) = &repository.remote_url {
            embed = embed.field(
                "🔗 Repositorio",
                format!("[Ver en GitHub]({}/commit/{})", remote, commit.hash),
                false,
            );
        }
        embed
    }

    fn history_embed(&self, commits: &[GitCommit], repository: &RepositoryInfo) -> RichMessage {
        let link = repository
            .remote_url
            .as_ref()
            .map(|remote| ("🔗 Repositorio", format!("[Ver en GitHub]({})", remote)));
        let description = |shown: usize| format!("Últimos **{}** commits:", shown);
        let reserved = description(MAX_HISTORY_FIELDS).chars().count()
            + link.as_ref().map_or(0, |(name, value)| name.chars().count() + value.chars().count());

        let mut embed = RichMessage::new("📝 Changelog - Historial de Commits", CHANGELOG_COLOR)
            .thumbnail(self.avatar_url.clone())
            .footer("Mizuki Bot • Changelog", self.avatar_url.clone())
            .timestamp(Utc::now());

        for commit in commits.iter().take(MAX_HISTORY_FIELDS) {
            let candidate = embed.clone().field(
                format!("`{}` {}", commit.short_hash, format_commit_message(&commit.subject)),
                format!("👤 {} • <t:{}:R>", commit.author, commit.timestamp),
                false,
            );
            if candidate.char_count() + reserved > EMBED_TOTAL_LIMIT {
                break;
            }
            embed = candidate;
        }

        let shown = embed.fields.len();
        embed = embed.description(description(shown));
        if let Some((name, value)) = link {
            embed = embed.field(name, value, false);
        }
        embed
    }
}

fn report(sent: Result<usize, BotError>) {
    match sent {
        Ok(0) => warn!("⚠️ No commit history available"),
        Ok(count) => info!("✅ Changelog with {} commit(s) sent successfully", count),
        Err(why @ BotError::CollaboratorUnavailable(_)) => warn!("⚠️ {}", why),
        Err(why) => error!("❌ Error sending changelog: {}", why),
    }
}
