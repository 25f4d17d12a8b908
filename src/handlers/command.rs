use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serenity::builder::CreateApplicationCommand;
use serenity::futures::future::BoxFuture;

use crate::error::BotError;
use crate::handlers::reply::Responder;

pub type CommandHandler<C> =
    Arc<dyn Fn(C, Invocation) -> BoxFuture<'static, Result<(), BotError>> + Send + Sync>;

/// Adds options and permissions to the slash command builder. Name and
/// description are applied from the definition itself.
pub type OptionSchema = fn(&mut CreateApplicationCommand) -> &mut CreateApplicationCommand;

pub struct CommandDefinition<C> {
    pub name: String,
    pub description: String,
    pub schema: Option<OptionSchema>,
    pub cooldown_seconds: Option<u64>,
    handler: Option<CommandHandler<C>>,
}

impl<C: Send + 'static> CommandDefinition<C> {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        CommandDefinition {
            name: name.into(),
            description: description.into(),
            schema: None,
            cooldown_seconds: None,
            handler: None,
        }
    }

    pub fn schema(mut self, schema: OptionSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn cooldown(mut self, seconds: u64) -> Self {
        self.cooldown_seconds = Some(seconds);
        self
    }

    pub fn handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(C, Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BotError>> + Send + 'static,
    {
        let handler: CommandHandler<C> = Arc::new(
            move |state, invocation| -> BoxFuture<'static, Result<(), BotError>> {
                Box::pin(handler(state, invocation))
            },
        );
        self.handler = Some(handler);
        self
    }

    pub fn run(&self, state: C, invocation: Invocation) -> BoxFuture<'static, Result<(), BotError>> {
        match &self.handler {
            Some(handler) => handler(state, invocation),
            None => {
                let name = self.name.clone();
                Box::pin(async move { Err(BotError::HandlerFailure(format!("{} has no handler", name))) })
            }
        }
    }

    /// Writes this command into a serenity builder for deployment.
    pub fn build<'a>(&self, command: &'a mut CreateApplicationCommand) -> &'a mut CreateApplicationCommand {
        command.name(&self.name).description(&self.description);
        match self.schema {
            Some(schema) => schema(command),
            None => command,
        }
    }
}

/// A single inbound request to run a named command.
#[derive(Clone)]
pub struct Invocation {
    pub command_name: String,
    pub user_id: u64,
    pub user_tag: String,
    pub guild_name: Option<String>,
    pub created_at_ms: i64,
    pub options: HashMap<String, String>,
    pub responder: Arc<dyn Responder>,
}

impl Invocation {
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    pub fn required_option(&self, name: &str) -> Result<&str, BotError> {
        self.option(name)
            .ok_or_else(|| BotError::HandlerFailure(format!("missing required option {}", name)))
    }
}

pub struct CommandRegistry<C> {
    commands: HashMap<String, Arc<CommandDefinition<C>>>,
    order: Vec<String>,
}

impl<C> CommandRegistry<C> {
    pub fn new() -> Self {
        CommandRegistry {
            commands: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Last registration wins; a replaced command keeps its original position.
    pub fn register(&mut self, definition: CommandDefinition<C>) -> Result<(), BotError> {
        if definition.name.trim().is_empty() {
            return Err(BotError::InvalidDefinition("command without a name".to_string()));
        }
        if definition.handler.is_none() {
            return Err(BotError::InvalidDefinition(format!("command {} has no handler", definition.name)));
        }

        let name = definition.name.clone();
        if self.commands.insert(name.clone(), Arc::new(definition)).is_none() {
            self.order.push(name);
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<CommandDefinition<C>>> {
        self.commands.get(name).cloned()
    }

    pub fn list_all(&self) -> impl Iterator<Item = &CommandDefinition<C>> + '_ {
        self.order
            .iter()
            .filter_map(|name| self.commands.get(name).map(Arc::as_ref))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<C> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::handlers::reply::test_support::invocation;

    fn tagged(name: &str, tag: usize, seen: Arc<AtomicUsize>) -> CommandDefinition<()> {
        CommandDefinition::new(name, "test command").handler(move |_, _| {
            let seen = seen.clone();
            async move {
                seen.store(tag, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn second_registration_replaces_the_first() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut registry = CommandRegistry::new();
        registry.register(tagged("ping", 1, seen.clone())).unwrap();
        registry.register(tagged("ping", 2, seen.clone())).unwrap();

        assert_eq!(registry.len(), 1);
        let command = registry.lookup("ping").unwrap();
        let (invocation, _) = invocation("ping", 7);
        command.run((), invocation).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_name_or_handler_is_invalid() {
        let mut registry: CommandRegistry<()> = CommandRegistry::new();
        let nameless = CommandDefinition::new("", "x").handler(|_, _| async { Ok(()) });
        assert!(matches!(registry.register(nameless), Err(BotError::InvalidDefinition(_))));
        assert!(matches!(
            registry.register(CommandDefinition::new("status", "x")),
            Err(BotError::InvalidDefinition(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn list_all_follows_registration_order_and_restarts() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut registry = CommandRegistry::new();
        for name in ["status", "ping", "changelog"] {
            registry.register(tagged(name, 0, seen.clone())).unwrap();
        }
        registry.register(tagged("ping", 1, seen)).unwrap();

        let names: Vec<_> = registry.list_all().map(|c| c.name.clone()).collect();
        assert_eq!(names, ["status", "ping", "changelog"]);
        assert_eq!(registry.list_all().count(), 3);
    }

    #[test]
    fn lookup_of_unknown_name_is_none() {
        let registry: CommandRegistry<()> = CommandRegistry::new();
        assert!(registry.lookup("nope").is_none());
    }
}
