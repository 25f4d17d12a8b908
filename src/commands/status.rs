use serenity::builder;
use serenity::model::permissions::Permissions;
use serenity::model::prelude::command::CommandOptionType;

use crate::error::BotError;
use crate::handlers::{CommandDefinition, Invocation};
use crate::state::Reporters;
use crate::status::{BotStatus, BotStatusManager, ERROR_MESSAGE, MAINTENANCE_MESSAGE};

pub fn definition<S: Reporters>() -> CommandDefinition<S> {
    CommandDefinition::new("status", "Cambia el estado del bot")
        .schema(register)
        .cooldown(10)
        .handler(run::<S>)
}

pub fn register(
    command: &mut builder::CreateApplicationCommand,
) -> &mut builder::CreateApplicationCommand {
    command
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .create_option(|option| {
            option
                .name("estado")
                .description("Estado a establecer")
                .kind(CommandOptionType::String)
                .required(true);
            for (name, value) in BotStatus::CHOICES {
                option.add_string_choice(name, value);
            }
            option
        })
        .create_option(|option| {
            option
                .name("mensaje")
                .description("Mensaje personalizado (opcional)")
                .kind(CommandOptionType::String)
                .required(false)
        })
}

pub async fn run<S: Reporters>(state: S, invocation: Invocation) -> Result<(), BotError> {
    let estado = invocation.required_option("estado")?;
    let status = BotStatus::parse(estado)
        .ok_or_else(|| BotError::HandlerFailure(format!("unknown status {}", estado)))?;
    let mensaje = invocation.option("mensaje");

    invocation.responder.defer(true).await?;
    apply(&state.status_manager(), status, mensaje).await;
    invocation.responder.edit(&confirmation(status, mensaje)).await
}

pub async fn apply(manager: &BotStatusManager, status: BotStatus, message: Option<&str>) {
    match status {
        BotStatus::Online => manager.set_online().await,
        BotStatus::Offline => manager.set_offline().await,
        BotStatus::Maintenance => manager.set_maintenance(message.unwrap_or(MAINTENANCE_MESSAGE)).await,
        BotStatus::Restarting => manager.set_restarting().await,
        BotStatus::Error => manager.set_error(message.unwrap_or(ERROR_MESSAGE)).await,
    }
}

fn confirmation(status: BotStatus, message: Option<&str>) -> String {
    match message {
        Some(message) => format!("✅ Estado cambiado a: **{}**\n📝 Mensaje: {}", status, message),
        None => format!("✅ Estado cambiado a: **{}**", status),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::embed::test_support::MemoryChannel;
    use crate::git::test_support::FixedGit;
    use crate::handlers::dispatch::{DispatchOutcome, FAILURE_MESSAGE};
    use crate::handlers::reply::test_support::{invocation, RecordingResponder, Sent};
    use crate::handlers::{CommandRegistry, Dispatcher};
    use crate::state::test_support::{FakeReporters, STATUS_CHANNEL};
    use crate::status::StatusSnapshot;

    const T: i64 = 1_700_000_000_000;

    fn manager(channel: Arc<MemoryChannel>) -> BotStatusManager {
        BotStatusManager::new(channel, Some(1), StatusSnapshot::default())
    }

    fn dispatcher() -> Dispatcher<FakeReporters> {
        let mut commands = CommandRegistry::new();
        commands.register(definition()).unwrap();
        Dispatcher::new(commands)
    }

    fn status_invocation(options: &[(&str, &str)]) -> (Invocation, Arc<RecordingResponder>) {
        let (mut invocation, responder) = invocation("status", 7);
        for (name, value) in options {
            invocation.options.insert(name.to_string(), value.to_string());
        }
        (invocation, responder)
    }

    #[tokio::test]
    async fn maintenance_is_confirmed_after_deferring() {
        let reporters = FakeReporters::new(FixedGit::default());
        let dispatcher = dispatcher();
        let options = [("estado", "maintenance"), ("mensaje", "upgrading")];

        let (first, responder) = status_invocation(&options);
        assert_eq!(dispatcher.dispatch_at(reporters.clone(), first, T).await, DispatchOutcome::Completed);
        assert_eq!(
            responder.sent(),
            [
                Sent::Defer { ephemeral: true },
                Sent::Edit { content: "✅ Estado cambiado a: **maintenance**\n📝 Mensaje: upgrading".to_string() },
            ]
        );

        let (second, _) = status_invocation(&options);
        assert_eq!(dispatcher.dispatch_at(reporters.clone(), second, T + 10_000).await, DispatchOutcome::Completed);

        let posted = reporters.channel.in_channel(STATUS_CHANNEL);
        assert_eq!(posted.len(), 1);
        assert_eq!(reporters.channel.edits(), 1);
        assert_eq!(posted[0].fields.last().unwrap().value, "upgrading");
    }

    #[tokio::test]
    async fn missing_or_unknown_status_fails_before_deferring() {
        for options in [vec![], vec![("estado", "sleeping")]] {
            let reporters = FakeReporters::new(FixedGit::default());
            let (invocation, responder) = status_invocation(&options);
            assert_eq!(dispatcher().dispatch_at(reporters.clone(), invocation, T).await, DispatchOutcome::Failed);
            assert_eq!(
                responder.sent(),
                [Sent::Reply { content: FAILURE_MESSAGE.to_string(), ephemeral: true }]
            );
            assert!(reporters.channel.in_channel(STATUS_CHANNEL).is_empty());
        }
    }

    #[tokio::test]
    async fn maintenance_with_message_keeps_one_status_message() {
        let channel = Arc::new(MemoryChannel::default());
        let manager = manager(channel.clone());

        apply(&manager, BotStatus::Maintenance, Some("upgrading")).await;
        apply(&manager, BotStatus::Maintenance, Some("upgrading")).await;

        let posted = channel.in_channel(1);
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].color, 0xffff00);
        assert_eq!(posted[0].fields.last().unwrap().value, "upgrading");
    }

    #[tokio::test]
    async fn error_without_message_uses_the_default() {
        let channel = Arc::new(MemoryChannel::default());
        apply(&manager(channel.clone()), BotStatus::Error, None).await;
        assert_eq!(channel.in_channel(1)[0].fields.last().unwrap().value, ERROR_MESSAGE);
    }

    #[test]
    fn confirmation_echoes_the_message() {
        assert_eq!(confirmation(BotStatus::Online, None), "✅ Estado cambiado a: **online**");
        assert!(confirmation(BotStatus::Maintenance, Some("upgrading")).ends_with("📝 Mensaje: upgrading"));
    }
}
