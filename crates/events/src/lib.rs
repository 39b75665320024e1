//! Domain events, commands and the decide/apply execution helper.

pub mod command;
pub mod envelope;
pub mod event;
pub mod handler;

pub use command::Command;
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::execute;
