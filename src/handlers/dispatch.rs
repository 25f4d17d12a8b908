use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use log::{debug, error, warn};
use serenity::futures::FutureExt;

use crate::error::BotError;
use crate::handlers::command::{CommandRegistry, Invocation};
use crate::handlers::cooldown::{CooldownGate, DEFAULT_COOLDOWN_SECONDS};
use crate::logging;

pub const FAILURE_MESSAGE: &str = "❌ Hubo un error ejecutando este comando!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ignored,
    Denied { retry_after_ms: i64 },
    Completed,
    Failed,
}

pub struct Dispatcher<C> {
    commands: Arc<CommandRegistry<C>>,
    cooldowns: Arc<CooldownGate>,
}

impl<C: Send + 'static> Dispatcher<C> {
    pub fn new(commands: CommandRegistry<C>) -> Self {
        Dispatcher {
            commands: Arc::new(commands),
            cooldowns: Arc::new(CooldownGate::new()),
        }
    }

    pub fn commands(&self) -> &CommandRegistry<C> {
        &self.commands
    }

    pub fn cooldowns(&self) -> Arc<CooldownGate> {
        self.cooldowns.clone()
    }

    pub async fn dispatch(&self, state: C, invocation: Invocation) -> DispatchOutcome {
        self.dispatch_at(state, invocation, chrono::Utc::now().timestamp_millis()).await
    }

    pub async fn dispatch_at(&self, state: C, invocation: Invocation, now_ms: i64) -> DispatchOutcome {
        let Some(command) = self.commands.lookup(&invocation.command_name) else {
            debug!("Ignoring unknown command {}", invocation.command_name);
            return DispatchOutcome::Ignored;
        };

        let cooldown = command.cooldown_seconds.unwrap_or(DEFAULT_COOLDOWN_SECONDS);
        match self
            .cooldowns
            .check_and_record(&command.name, invocation.user_id, cooldown, now_ms)
        {
            Ok(()) => {}
            Err(BotError::CooldownDenied { retry_after_ms }) => {
                debug!("{} on cooldown for {}", command.name, invocation.user_tag);
                let content = format!(
                    "⏰ Por favor espera, puedes usar `{}` <t:{}:R>.",
                    command.name,
                    (now_ms + retry_after_ms + 999) / 1000
                );
                if let Err(why) = invocation.responder.reply(&content, true).await {
                    warn!("Cannot send cooldown notice for {}: {}", command.name, why);
                }
                return DispatchOutcome::Denied { retry_after_ms };
            }
            Err(why) => {
                error!("Cooldown check failed for {}: {}", command.name, why);
                return DispatchOutcome::Failed;
            }
        }

        let responder = invocation.responder.clone();
        let user = invocation.user_tag.clone();
        let guild = invocation.guild_name.clone();

        let failure = match AssertUnwindSafe(command.run(state, invocation)).catch_unwind().await {
            Ok(Ok(())) => {
                logging::command_executed(&command.name, &user, guild.as_deref());
                return DispatchOutcome::Completed;
            }
            Ok(Err(why)) => why.to_string(),
            Err(panic) => logging::panic_message(panic.as_ref()),
        };

        error!("Error ejecutando comando {}: {}", command.name, failure);
        let sent = if responder.has_responded() {
            responder.follow_up(FAILURE_MESSAGE, true).await
        } else {
            responder.reply(FAILURE_MESSAGE, true).await
        };
        if let Err(why) = sent {
            error!("Cannot report failure of {}: {}", command.name, why);
        }
        DispatchOutcome::Failed
    }
}
