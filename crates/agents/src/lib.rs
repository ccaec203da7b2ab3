//! Public boundary for the insight and trend agents: typed commands in,
//! `{success, data | error}` envelopes out.

pub mod command;
pub mod dispatcher;

pub use command::AgentCommand;
pub use dispatcher::Dispatcher;
