use log::info;

use crate::error::BotError;
use crate::handlers::event::READY;
use crate::handlers::EventDefinition;
use crate::state::{BotState, Reporters};

/// Announces the deployed commit once per process start.
pub fn definition() -> EventDefinition<BotState> {
    EventDefinition::new(READY).once().handler(run)
}

async fn run(state: BotState) -> Result<(), BotError> {
    state.changelog_manager().send_last_commit().await;
    info!("✅ Changelog inicial procesado");
    Ok(())
}
