mod changelog;
mod ready;
mod status_refresh;
mod status_update;

use log::{info, warn};

use crate::handlers::{EventDefinition, EventRegistry};
use crate::state::BotState;

pub fn definitions() -> Vec<EventDefinition<BotState>> {
    vec![
        ready::definition(),
        changelog::definition(),
        status_update::definition(),
        status_refresh::definition(),
    ]
}

/// Subscribes every definition, skipping invalid ones with a warning.
pub fn load<C: Clone + Send + 'static>(definitions: Vec<EventDefinition<C>>) -> EventRegistry<C> {
    let registry = EventRegistry::new();
    for definition in definitions {
        let name = definition.name.clone();
        match registry.register(definition) {
            Ok(()) => info!("✅ Evento cargado: {}", name),
            Err(why) => warn!("⚠️ Evento inválido {}: {}", name, why),
        }
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::event::READY;

    #[test]
    fn every_shipped_event_listens_to_ready() {
        let registry = load(definitions());
        assert_eq!(registry.listeners(READY), 4);
    }
}
