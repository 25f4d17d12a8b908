pub mod changelog;
pub mod ping;
pub mod status;

use log::{info, warn};
use serenity::builder::CreateApplicationCommands;
use serenity::http::Http;
use serenity::model::application::command::Command;
use serenity::model::id::GuildId;

use crate::error::BotError;
use crate::handlers::{CommandDefinition, CommandRegistry};
use crate::state::BotState;

pub fn definitions() -> Vec<CommandDefinition<BotState>> {
    vec![ping::definition(), status::definition(), changelog::definition()]
}

/// Registers every definition, skipping invalid ones with a warning.
pub fn load<C: Send + 'static>(definitions: Vec<CommandDefinition<C>>) -> CommandRegistry<C> {
    let mut registry = CommandRegistry::new();
    for definition in definitions {
        let name = definition.name.clone();
        match registry.register(definition) {
            Ok(()) => info!("✅ Comando cargado: {}", name),
            Err(why) => warn!("⚠️ Comando inválido {}: {}", name, why),
        }
    }
    registry
}

fn build_all<'a>(
    registry: &CommandRegistry<BotState>,
    commands: &'a mut CreateApplicationCommands,
) -> &'a mut CreateApplicationCommands {
    for definition in registry.list_all() {
        commands.create_application_command(|command| definition.build(command));
    }
    commands
}

/// Publishes the slash commands to one guild when `guild_id` is set, globally otherwise.
pub async fn deploy(
    http: &Http,
    guild_id: Option<u64>,
    registry: &CommandRegistry<BotState>,
) -> Result<usize, BotError> {
    let deployed = match guild_id {
        Some(id) => {
            GuildId(id)
                .set_application_commands(http, |commands| build_all(registry, commands))
                .await?
        }
        None => Command::set_global_application_commands(http, |commands| build_all(registry, commands)).await?,
    };
    Ok(deployed.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shipped_command_loads() {
        let registry = load(definitions());
        let names: Vec<_> = registry.list_all().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["ping", "status", "changelog"]);
        assert_eq!(registry.lookup("status").unwrap().cooldown_seconds, Some(10));
    }

    #[test]
    fn invalid_definitions_are_skipped() {
        let definitions = vec![
            CommandDefinition::new("broken", "no handler"),
            CommandDefinition::new("fine", "ok").handler(|_: (), _| async { Ok(()) }),
        ];
        let registry = load(definitions);
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("broken").is_none());
    }
}
