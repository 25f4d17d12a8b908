use std::sync::Arc;

use chrono::{DateTime, Utc};
use serenity::async_trait;
use serenity::builder::CreateEmbed;
use serenity::http::Http;
use serenity::model::id::{ChannelId, MessageId};
use serenity::model::Timestamp;
use serenity::utils::Colour;

use crate::error::BotError;

// Discord rejects embeds past these sizes.
const FIELD_NAME_LIMIT: usize = 256;
const FIELD_VALUE_LIMIT: usize = 1024;
pub const EMBED_TOTAL_LIMIT: usize = 6000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    pub text: String,
    pub icon_url: Option<String>,
}

/// Platform independent embed payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichMessage {
    pub title: String,
    pub description: Option<String>,
    pub color: u32,
    pub thumbnail: Option<String>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<Footer>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl RichMessage {
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        RichMessage {
            title: title.into(),
            color,
            ..Default::default()
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: truncate(name.into(), FIELD_NAME_LIMIT),
            value: truncate(value.into(), FIELD_VALUE_LIMIT),
            inline,
        });
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn thumbnail(mut self, url: Option<String>) -> Self {
        self.thumbnail = url.filter(|url| !url.is_empty());
        self
    }

    pub fn footer(mut self, text: impl Into<String>, icon_url: Option<String>) -> Self {
        self.footer = Some(Footer {
            text: text.into(),
            icon_url: icon_url.filter(|url| !url.is_empty()),
        });
        self
    }

    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    /// Characters Discord counts against `EMBED_TOTAL_LIMIT`.
    pub fn char_count(&self) -> usize {
        let text = |s: &str| s.chars().count();
        text(&self.title)
            + self.description.as_deref().map_or(0, text)
            + self.fields.iter().map(|f| text(&f.name) + text(&f.value)).sum::<usize>()
            + self.footer.as_ref().map_or(0, |f| text(&f.text))
    }

    pub fn apply<'a>(&self, embed: &'a mut CreateEmbed) -> &'a mut CreateEmbed {
        embed.title(&self.title).colour(Colour::new(self.color));
        if let Some(description) = &self.description {
            embed.description(description);
        }
        if let Some(thumbnail) = &self.thumbnail {
            embed.thumbnail(thumbnail);
        }
        for field in &self.fields {
            embed.field(&field.name, &field.value, field.inline);
        }
        if let Some(footer) = &self.footer {
            embed.footer(|f| {
                f.text(&footer.text);
                if let Some(icon_url) = &footer.icon_url {
                    f.icon_url(icon_url);
                }
                f
            });
        }
        if let Some(at) = self.timestamp {
            if let Ok(timestamp) = Timestamp::from_unix_timestamp(at.timestamp()) {
                embed.timestamp(timestamp);
            }
        }
        embed
    }
}

fn truncate(text: String, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text;
    }
    let mut cut: String = text.chars().take(limit - 1).collect();
    cut.push('…');
    cut
}

/// What the publisher needs to know about a message already in a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub id: u64,
    pub author_id: u64,
    pub embed_title: Option<String>,
}

#[async_trait]
pub trait ChannelPublisher: Send + Sync {
    /// The account messages are published as.
    fn author_id(&self) -> u64;
    /// Most recent messages first.
    async fn recent(&self, channel_id: u64, limit: u64) -> Result<Vec<PostedMessage>, BotError>;
    async fn send(&self, channel_id: u64, message: &RichMessage) -> Result<u64, BotError>;
    async fn edit(&self, channel_id: u64, message_id: u64, message: &RichMessage) -> Result<(), BotError>;
}

pub struct DiscordPublisher {
    http: Arc<Http>,
    bot_id: u64,
}

impl DiscordPublisher {
    pub fn new(http: Arc<Http>, bot_id: u64) -> Self {
        DiscordPublisher { http, bot_id }
    }
}

#[async_trait]
impl ChannelPublisher for DiscordPublisher {
    fn author_id(&self) -> u64 {
        self.bot_id
    }

    async fn recent(&self, channel_id: u64, limit: u64) -> Result<Vec<PostedMessage>, BotError> {
        let messages = ChannelId(channel_id)
            .messages(&self.http, |retriever| retriever.limit(limit))
            .await?;
        Ok(messages
            .into_iter()
            .map(|message| PostedMessage {
                id: message.id.0,
                author_id: message.author.id.0,
                embed_title: message.embeds.first().and_then(|embed| embed.title.clone()),
            })
            .collect())
    }

    async fn send(&self, channel_id: u64, message: &RichMessage) -> Result<u64, BotError> {
        let sent = ChannelId(channel_id)
            .send_message(&self.http, |m| m.embed(|e| message.apply(e)))
            .await?;
        Ok(sent.id.0)
    }

    async fn edit(&self, channel_id: u64, message_id: u64, message: &RichMessage) -> Result<(), BotError> {
        ChannelId(channel_id)
            .edit_message(&self.http, MessageId(message_id), |m| m.embed(|e| message.apply(e)))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub mod test_support {
    use std::sync::Mutex;

    use super::*;

    pub const BOT_ID: u64 = 900;

    /// In-memory channel; the newest message is last in `messages`.
    #[derive(Default)]
    pub struct MemoryChannel {
        pub messages: Mutex<Vec<(u64, u64, u64, RichMessage)>>,
        pub edits: Mutex<usize>,
        pub fail: bool,
    }

    impl MemoryChannel {
        pub fn in_channel(&self, channel_id: u64) -> Vec<RichMessage> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .filter(|(channel, _, _, _)| *channel == channel_id)
                .map(|(_, _, _, message)| message.clone())
                .collect()
        }

        pub fn post_as(&self, channel_id: u64, author_id: u64, message: RichMessage) {
            let mut messages = self.messages.lock().unwrap();
            let id = messages.len() as u64 + 1;
            messages.push((channel_id, id, author_id, message));
        }

        pub fn edits(&self) -> usize {
            *self.edits.lock().unwrap()
        }
    }

    #[async_trait]
    impl ChannelPublisher for MemoryChannel {
        fn author_id(&self) -> u64 {
            BOT_ID
        }

        async fn recent(&self, channel_id: u64, limit: u64) -> Result<Vec<PostedMessage>, BotError> {
            if self.fail {
                return Err(BotError::CollaboratorUnavailable("channel offline".to_string()));
            }
            Ok(self
                .messages
                .lock()
                .unwrap()
                .iter()
                .rev()
                .filter(|(channel, _, _, _)| *channel == channel_id)
                .take(limit as usize)
                .map(|(_, id, author, message)| PostedMessage {
                    id: *id,
                    author_id: *author,
                    embed_title: Some(message.title.clone()),
                })
                .collect())
        }

        async fn send(&self, channel_id: u64, message: &RichMessage) -> Result<u64, BotError> {
            if self.fail {
                return Err(BotError::CollaboratorUnavailable("channel offline".to_string()));
            }
            self.post_as(channel_id, BOT_ID, message.clone());
            Ok(self.messages.lock().unwrap().len() as u64)
        }

        async fn edit(&self, _channel_id: u64, message_id: u64, message: &RichMessage) -> Result<(), BotError> {
            let mut messages = self.messages.lock().unwrap();
            let slot = messages
                .iter_mut()
                .find(|(_, id, _, _)| *id == message_id)
                .ok_or_else(|| BotError::Discord(serenity::Error::Other("unknown message")))?;
            slot.3 = message.clone();
            *self.edits.lock().unwrap() += 1;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_field_values_are_truncated() {
        let message = RichMessage::new("title", 0).field("name", "x".repeat(2000), false);
        let value = &message.fields[0].value;
        assert_eq!(value.chars().count(), FIELD_VALUE_LIMIT);
        assert!(value.ends_with('…'));
    }

    #[test]
    fn char_count_covers_every_text_part() {
        let message = RichMessage::new("abc", 0)
            .description("de")
            .field("f", "gh", true)
            .footer("ijk", None)
            .thumbnail(Some("https://example.com/not-counted.png".to_string()));
        assert_eq!(message.char_count(), 11);
    }

    #[test]
    fn empty_urls_are_dropped() {
        let message = RichMessage::new("title", 0)
            .thumbnail(Some(String::new()))
            .footer("footer", Some(String::new()));
        assert_eq!(message.thumbnail, None);
        assert_eq!(message.footer.unwrap().icon_url, None);
    }
}
