use serenity::builder;
use serenity::model::permissions::Permissions;
use serenity::model::prelude::command::CommandOptionType;

use crate::changelog::ChangelogKind;
use crate::error::BotError;
use crate::handlers::{CommandDefinition, Invocation};
use crate::state::Reporters;

pub fn definition<S: Reporters>() -> CommandDefinition<S> {
    CommandDefinition::new("changelog", "Envía el changelog del bot al canal correspondiente.")
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
                .name("tipo")
                .description("Tipo de changelog a enviar")
                .kind(CommandOptionType::String)
                .required(true);
            for (name, value) in ChangelogKind::CHOICES {
                option.add_string_choice(name, value);
            }
            option
        })
}

pub async fn run<S: Reporters>(state: S, invocation: Invocation) -> Result<(), BotError> {
    let tipo = invocation.required_option("tipo")?;
    invocation.responder.defer(true).await?;

    let Some(kind) = ChangelogKind::parse(tipo) else {
        return invocation.responder.edit("❌ Tipo de changelog no reconocido.").await;
    };

    state.changelog_manager().send(kind).await;
    invocation.responder.edit(kind.confirmation()).await
}
