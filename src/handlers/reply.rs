use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serenity::async_trait;
use serenity::cache::Cache;
use serenity::http::Http;
use serenity::model::application::interaction::application_command::{
    ApplicationCommandInteraction,
    CommandDataOption,
    CommandDataOptionValue,
};
use serenity::model::application::interaction::InteractionResponseType;

use crate::error::BotError;
use crate::handlers::command::Invocation;

/// Discord snowflakes count milliseconds from 2015-01-01.
const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

/// Answers the user who triggered an invocation.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn reply(&self, content: &str, ephemeral: bool) -> Result<(), BotError>;
    async fn defer(&self, ephemeral: bool) -> Result<(), BotError>;
    /// Replaces the content of the initial response or deferral.
    async fn edit(&self, content: &str) -> Result<(), BotError>;
    async fn follow_up(&self, content: &str, ephemeral: bool) -> Result<(), BotError>;
    /// True once an initial response or a deferral has been acknowledged.
    fn has_responded(&self) -> bool;
}

pub struct InteractionResponder {
    http: Arc<Http>,
    command: ApplicationCommandInteraction,
    responded: AtomicBool,
}

impl InteractionResponder {
    pub fn new(http: Arc<Http>, command: ApplicationCommandInteraction) -> Self {
        InteractionResponder {
            http,
            command,
            responded: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Responder for InteractionResponder {
    async fn reply(&self, content: &str, ephemeral: bool) -> Result<(), BotError> {
        self.command
            .create_interaction_response(&self.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|message| message.content(content).ephemeral(ephemeral))
            })
            .await?;
        self.responded.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn defer(&self, ephemeral: bool) -> Result<(), BotError> {
        if ephemeral {
            self.command.defer_ephemeral(&self.http).await?;
        } else {
            self.command.defer(&self.http).await?;
        }
        self.responded.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn edit(&self, content: &str) -> Result<(), BotError> {
        self.command
            .edit_original_interaction_response(&self.http, |response| response.content(content))
            .await?;
        Ok(())
    }

    async fn follow_up(&self, content: &str, ephemeral: bool) -> Result<(), BotError> {
        self.command
            .create_followup_message(&self.http, |message| message.content(content).ephemeral(ephemeral))
            .await?;
        Ok(())
    }

    fn has_responded(&self) -> bool {
        self.responded.load(Ordering::SeqCst)
    }
}

pub fn snowflake_created_at_ms(id: u64) -> i64 {
    (id >> 22) as i64 + DISCORD_EPOCH_MS
}

pub fn invocation_from(http: Arc<Http>, cache: &Arc<Cache>, command: ApplicationCommandInteraction) -> Invocation {
    Invocation {
        command_name: command.data.name.clone(),
        user_id: command.user.id.0,
        user_tag: command.user.tag(),
        guild_name: command.guild_id.and_then(|id| id.name(cache)),
        created_at_ms: snowflake_created_at_ms(command.id.0),
        options: string_options(&command.data.options),
        responder: Arc::new(InteractionResponder::new(http, command)),
    }
}

/// Flattens the top level options into name -> value strings. Only string,
/// integer, number and boolean values are kept; every command here takes strings.
pub fn string_options(options: &[CommandDataOption]) -> HashMap<String, String> {
    options
        .iter()
        .filter_map(|option| {
            let value = match option.resolved.as_ref()? {
                CommandDataOptionValue::String(s) => s.clone(),
                CommandDataOptionValue::Integer(i) => i.to_string(),
                CommandDataOptionValue::Number(n) => n.to_string(),
                CommandDataOptionValue::Boolean(b) => b.to_string(),
                _ => return None,
            };
            Some((option.name.clone(), value))
        })
        .collect()
}

#[cfg(test)]
pub mod test_support {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Sent {
        Reply { content: String, ephemeral: bool },
        Defer { ephemeral: bool },
        Edit { content: String },
        FollowUp { content: String, ephemeral: bool },
    }

    #[derive(Default)]
    pub struct RecordingResponder {
        pub sent: Mutex<Vec<Sent>>,
        responded: AtomicBool,
    }

    impl RecordingResponder {
        pub fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn push(&self, sent: Sent) {
            self.sent.lock().unwrap().push(sent);
        }
    }

    #[async_trait]
    impl Responder for RecordingResponder {
        async fn reply(&self, content: &str, ephemeral: bool) -> Result<(), BotError> {
            self.push(Sent::Reply { content: content.to_string(), ephemeral });
            self.responded.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn defer(&self, ephemeral: bool) -> Result<(), BotError> {
            self.push(Sent::Defer { ephemeral });
            self.responded.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn edit(&self, content: &str) -> Result<(), BotError> {
            self.push(Sent::Edit { content: content.to_string() });
            Ok(())
        }

        async fn follow_up(&self, content: &str, ephemeral: bool) -> Result<(), BotError> {
            self.push(Sent::FollowUp { content: content.to_string(), ephemeral });
            Ok(())
        }

        fn has_responded(&self) -> bool {
            self.responded.load(Ordering::SeqCst)
        }
    }

    pub fn invocation(command: &str, user_id: u64) -> (Invocation, Arc<RecordingResponder>) {
        let responder = Arc::new(RecordingResponder::default());
        let invocation = Invocation {
            command_name: command.to_string(),
            user_id,
            user_tag: format!("user#{}", user_id),
            guild_name: Some("Servidor de Prueba".to_string()),
            created_at_ms: 0,
            options: HashMap::new(),
            responder: responder.clone(),
        };
        (invocation, responder)
    }
}
