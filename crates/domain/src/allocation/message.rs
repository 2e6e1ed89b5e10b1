//! Message wrapper dispatched by the bus.

use super::{Command, Event};

/// A dispatchable unit for the message bus: either a command or an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Command(Command),
    Event(Event),
}

impl Message {
    /// Returns the name of the wrapped command or event.
    pub fn name(&self) -> &'static str {
        match self {
            Message::Command(command) => command.command_type(),
            Message::Event(event) => event.event_type(),
        }
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Message::Command(command)
    }
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Message::Event(event)
    }
}
