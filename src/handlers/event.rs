use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error};
use serenity::futures::future::BoxFuture;
use serenity::futures::FutureExt;

use crate::error::BotError;
use crate::logging;

pub const READY: &str = "ready";

pub type EventCallback<C> = Arc<dyn Fn(C) -> BoxFuture<'static, Result<(), BotError>> + Send + Sync>;

pub struct EventDefinition<C> {
    pub name: String,
    pub once: bool,
    callback: Option<EventCallback<C>>,
}

impl<C: Send + 'static> EventDefinition<C> {
    pub fn new(name: impl Into<String>) -> Self {
        EventDefinition {
            name: name.into(),
            once: false,
            callback: None,
        }
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BotError>> + Send + 'static,
    {
        let callback: EventCallback<C> =
            Arc::new(move |state| -> BoxFuture<'static, Result<(), BotError>> { Box::pin(handler(state)) });
        self.callback = Some(callback);
        self
    }
}

struct Subscription<C> {
    name: String,
    once: bool,
    callback: EventCallback<C>,
}

/// Named event bus. Subscribers fire in registration order.
pub struct EventRegistry<C> {
    subscriptions: Mutex<Vec<Subscription<C>>>,
}

impl<C: Clone + Send + 'static> EventRegistry<C> {
    pub fn new() -> Self {
        EventRegistry {
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    fn subscriptions(&self) -> MutexGuard<'_, Vec<Subscription<C>>> {
        self.subscriptions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn register(&self, definition: EventDefinition<C>) -> Result<(), BotError> {
        if definition.name.trim().is_empty() {
            return Err(BotError::InvalidDefinition("event without a name".to_string()));
        }
        let Some(callback) = definition.callback else {
            return Err(BotError::InvalidDefinition(format!("event {} has no handler", definition.name)));
        };

        self.subscriptions().push(Subscription {
            name: definition.name,
            once: definition.once,
            callback,
        });
        Ok(())
    }

    /// Runs every subscriber of `name`. One-shot subscribers are removed before
    /// their handler runs, so concurrent emits cannot fire them twice. A failing
    /// or panicking subscriber is logged and the rest still run.
    pub async fn emit(&self, name: &str, state: C) {
        let callbacks: Vec<EventCallback<C>> = {
            let mut subscriptions = self.subscriptions();
            let selected = subscriptions
                .iter()
                .filter(|s| s.name == name)
                .map(|s| s.callback.clone())
                .collect();
            subscriptions.retain(|s| !(s.once && s.name == name));
            selected
        };

        debug!("Emitting {} to {} listener(s)", name, callbacks.len());
        for callback in callbacks {
            let run = AssertUnwindSafe(async { callback(state.clone()).await });
            match run.catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(why)) => error!("❌ Error in {} event handler: {}", name, why),
                Err(panic) => error!("❌ {} event handler {}", name, logging::panic_message(panic.as_ref())),
            }
        }
    }

    pub fn listeners(&self, name: &str) -> usize {
        self.subscriptions().iter().filter(|s| s.name == name).count()
    }
}

impl<C: Clone + Send + 'static> Default for EventRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recording(name: &str, label: &'static str, log: &Log) -> EventDefinition<()> {
        let log = log.clone();
        EventDefinition::new(name).handler(move |_| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(label);
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn once_fires_a_single_time_and_repeating_fires_every_time() {
        let log = Log::default();
        let events = EventRegistry::new();
        events.register(recording(READY, "once", &log).once()).unwrap();
        events.register(recording(READY, "always", &log)).unwrap();

        events.emit(READY, ()).await;
        events.emit(READY, ()).await;

        assert_eq!(*log.lock().unwrap(), ["once", "always", "always"]);
        assert_eq!(events.listeners(READY), 1);
    }

    #[tokio::test]
    async fn subscribers_fire_in_registration_order() {
        let log = Log::default();
        let events = EventRegistry::new();
        for label in ["first", "second", "third"] {
            events.register(recording(READY, label, &log)).unwrap();
        }
        events.register(recording("other", "other", &log)).unwrap();

        events.emit(READY, ()).await;
        assert_eq!(*log.lock().unwrap(), ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn failing_handler_does_not_stop_the_rest() {
        let log = Log::default();
        let events = EventRegistry::new();
        events
            .register(EventDefinition::new(READY).handler(|_| async {
                Err(BotError::HandlerFailure("boom".to_string()))
            }))
            .unwrap();
        events.register(recording(READY, "after", &log)).unwrap();

        events.emit(READY, ()).await;
        assert_eq!(*log.lock().unwrap(), ["after"]);
    }

    async fn explodes(_: ()) -> Result<(), BotError> {
        panic!("boom")
    }

    #[tokio::test]
    async fn panicking_handler_does_not_stop_the_rest() {
        let log = Log::default();
        let events = EventRegistry::new();
        events
            .register(EventDefinition::new(READY).once().handler(explodes))
            .unwrap();
        events.register(recording(READY, "once", &log).once()).unwrap();
        events.register(recording(READY, "always", &log)).unwrap();

        events.emit(READY, ()).await;
        events.emit(READY, ()).await;

        assert_eq!(*log.lock().unwrap(), ["once", "always", "always"]);
        assert_eq!(events.listeners(READY), 1);
    }

    #[test]
    fn missing_name_or_handler_is_invalid() {
        let events: EventRegistry<()> = EventRegistry::new();
        assert!(matches!(
            events.register(EventDefinition::new(READY)),
            Err(BotError::InvalidDefinition(_))
        ));
        assert!(matches!(
            events.register(EventDefinition::new(" ").handler(|_| async { Ok(()) })),
            Err(BotError::InvalidDefinition(_))
        ));
        assert_eq!(events.listeners(READY), 0);
    }
}
