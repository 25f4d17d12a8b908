use log::info;

use crate::error::BotError;
use crate::handlers::event::READY;
use crate::handlers::EventDefinition;
use crate::logging;
use crate::state::BotState;

pub fn definition() -> EventDefinition<BotState> {
    EventDefinition::new(READY).once().handler(run)
}

async fn run(state: BotState) -> Result<(), BotError> {
    let cache = &state.ctx.cache;
    let user = cache.current_user();

    logging::header("Mizuki Bot Iniciada");
    logging::bot_ready(&user.tag(), cache.guild_count(), cache.user_count());
    info!("🌙 Comandos cargados: {}", state.command_count);
    logging::separator();

    state.ctx.set_activity(state.config.presence.activity()).await;
    info!("🌙 Mizuki está lista para ayudar!");
    Ok(())
}
