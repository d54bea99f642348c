//! Log handlers and the registry the service picks them from.
//!
//! A handler is a closure over [`LogRecord`](crate::parser::LogRecord)s,
//! registered on the log socket's dispatcher at startup. Handlers that need
//! to talk back to the game server queue commands through a [CommandSender]
//! instead of holding the rcon client themselves; the service drains the
//! queue on the task that owns the client.

pub mod headshots;
pub mod logfile;

use crate::config::Config;
use crate::dispatch::HandlerId;
use crate::error::HandlerError;
use crate::logstream::LogSocket;
use log::warn;
use tokio::sync::mpsc;

/// Queues rcon commands for the task owning the [Client](crate::client::Client).
#[derive(Clone)]
pub struct CommandSender {
    queue: mpsc::UnboundedSender<String>,
}

impl CommandSender {
    /// Creates the sender along with the receiving end the client owner
    /// drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (queue, commands) = mpsc::unbounded_channel();
        (CommandSender { queue }, commands)
    }

    /// Queues a command. Delivery is fire-and-forget: if the client is
    /// already gone the command is dropped with a warning.
    pub fn send(&self, command: impl Into<String>) {
        if self.queue.send(command.into()).is_err() {
            warn!("rcon command queue is closed, dropping command");
        }
    }
}

/// Attaches the named handler to the log socket. This is the compile-time
/// registry: configuration names a handler, this matches it to its module.
pub fn init(
    name: &str,
    rcon: &CommandSender,
    log: &LogSocket,
    config: &Config,
) -> Result<HandlerId, HandlerError> {
    match name {
        "logfile" => {
            let file_config = config
                .handler
                .logfile
                .as_ref()
                .ok_or(HandlerError::MissingConfig("logfile"))?;
            logfile::init(log.dispatcher(), file_config)
        }
        "headshots" => Ok(headshots::init(
            rcon,
            log.dispatcher(),
            config.handler.headshots.clone().unwrap_or_default(),
        )),
        other => Err(HandlerError::Unknown(other.to_owned())),
    }
}
