use crate::error::BotError;
use crate::handlers::event::READY;
use crate::handlers::EventDefinition;
use crate::state::{BotState, Reporters};

/// Runs on every ready, reconnections included.
pub fn definition() -> EventDefinition<BotState> {
    EventDefinition::new(READY).handler(run)
}

async fn run(state: BotState) -> Result<(), BotError> {
    state.status_manager().set_online().await;
    Ok(())
}
