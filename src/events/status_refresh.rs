use std::time::Duration;

use log::{debug, error, info};

use crate::error::BotError;
use crate::handlers::event::READY;
use crate::handlers::EventDefinition;
use crate::state::{BotState, Reporters};

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub fn definition() -> EventDefinition<BotState> {
    EventDefinition::new(READY).once().handler(run)
}

async fn run(state: BotState) -> Result<(), BotError> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REFRESH_INTERVAL);
        // The first tick completes immediately; the status update event already covered it.
        interval.tick().await;
        loop {
            interval.tick().await;
            let state = state.clone();
            let refresh = tokio::spawn(async move { state.status_manager().set_online().await });
            match refresh.await {
                Ok(()) => debug!("🔄 Status refreshed automatically"),
                Err(why) => error!("❌ Error refreshing status: {}", why),
            }
        }
    });

    info!("✅ Status auto-refresh enabled (every {} minutes)", REFRESH_INTERVAL.as_secs() / 60);
    Ok(())
}
