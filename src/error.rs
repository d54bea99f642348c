use thiserror::Error;
use tokio::time::error::Elapsed;

/// Possible errors while speaking the rcon protocol.
#[derive(Error, Debug)]
pub enum RconError {
    /// Returned if we received a packet that does not have a type known to us.
    #[error("unknown rcon packet type: {0}")]
    UnknownPacketType(i32),
    /// Returned if the advertised packet size cannot be honored. The protocol
    /// needs at least 10 bytes for the id, type and terminators.
    #[error("{0} is not a valid packet size")]
    InvalidPacketSize(i32),
    /// Returned if the header is mangled in some way (bad offsets, incomplete
    /// response)
    #[error("packet header malformed (can't parse size, id or type)")]
    MalformedPacketHeader(#[from] std::array::TryFromSliceError),
    /// Returned if the body is mangled in some way.
    #[error("packet body malformed (not valid ascii or utf-8)")]
    MalformedPacketBody(#[from] std::str::Utf8Error),
    /// Returned if an outgoing body exceeds the 4086 byte protocol limit.
    /// Rejected before anything touches the wire.
    #[error("packet body is {0} bytes, above the 4086 byte protocol limit")]
    BodyTooLarge(usize),
    /// Returned if the host is down or behind a firewall.
    #[error("host cannot be reached")]
    UnreachableHost(#[source] std::io::Error),
    /// Internal error used if the stream was successfully established, but
    /// there was a problem writing to the socket.
    #[error("cannot send message to host")]
    SendError(#[source] std::io::Error),
    /// Internal error used if the stream was successfully established, but
    /// there was a problem reading from the socket.
    #[error("cannot receive response from host")]
    ReceiveError(#[source] std::io::Error),
    /// Returned if the server hung up in the middle of an exchange.
    #[error("connection closed by the remote host")]
    ConnectionLost,
    /// Returned if the server did not respond in time.
    #[error("timeout")]
    TimeoutError(#[from] Elapsed),
}

/// Possible errors while ingesting the log stream.
#[derive(Error, Debug)]
pub enum LogError {
    /// Returned if the receive socket cannot be bound, usually because the
    /// port is taken or privileged.
    #[error("cannot bind the log receive socket")]
    BindError(#[source] std::io::Error),
    /// Returned if receiving a datagram failed outright.
    #[error("cannot receive from the log socket")]
    ReceiveError(#[source] std::io::Error),
    /// Returned if a log line does not open with a `MM/DD/YYYY HH:MM:SS`
    /// timestamp, or the fields do not form a real calendar date.
    #[error("log line carries a malformed timestamp")]
    MalformedTimestamp,
    /// Returned if a player blob does not follow `NAME<ID><USER_ID><TEAM>`.
    #[error("player info blob is malformed")]
    MalformedPlayerInfo,
}

/// Possible errors when managing dispatcher registrations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DispatchError {
    /// Returned when unregistering an id that is not (or no longer)
    /// registered.
    #[error("no handler registered under the given id")]
    HandlerNotFound,
}

/// Possible errors while loading the service configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration file")]
    Io(#[from] std::io::Error),
    #[error("configuration file is not valid toml: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0} is not a valid log level")]
    InvalidLogLevel(String),
}

/// Possible errors while attaching log handlers at startup.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("unknown log handler: {0}")]
    Unknown(String),
    #[error("log handler {0} requires a [handler.{0}] section in the configuration")]
    MissingConfig(&'static str),
    #[error("cannot open handler output file")]
    Io(#[from] std::io::Error),
}
