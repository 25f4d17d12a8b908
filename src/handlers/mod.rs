pub mod command;
pub mod cooldown;
pub mod dispatch;
pub mod event;
pub mod reply;

pub use command::{CommandDefinition, CommandRegistry, Invocation};
pub use dispatch::Dispatcher;
pub use event::{EventDefinition, EventRegistry};
