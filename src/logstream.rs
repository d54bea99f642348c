use crate::dispatch::{Dispatcher, HandlerId};
use crate::error::{DispatchError, LogError};
use crate::parser::{parse_record, LogRecord};
use log::{info, trace, warn};
use std::cell::RefCell;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::signal;

/// The port game servers send their log stream to unless told otherwise.
pub const DEFAULT_PORT: u16 = 1776;

/// How much to pull off the socket per wakeup.
const READ_SIZE: usize = 1024;

/// Every frame starts with 6 bytes of junk plus a separator.
const HEADER_SIZE: usize = 7;

/// Listens for the UDP log stream of a game server and broadcasts each
/// parsed [LogRecord] to registered handlers.
///
/// The stream is a sequence of NUL terminated frames that can be split
/// across datagrams, so incoming chunks accumulate in a buffer and only
/// complete frames are parsed out of it. The socket and its [Dispatcher]
/// are built for a single task; a handler is free to call [LogSocket::stop]
/// (or unregister itself) from inside a broadcast.
///
/// ## Example
/// ```no_run
/// use sourlog::logstream::LogSocket;
/// use std::error::Error;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn Error>> {
///     let socket = LogSocket::new("0.0.0.0:1776".parse()?);
///     socket.register(|record| {
///         if let (Some(timestamp), Some(message)) = (&record.timestamp, &record.message) {
///             println!("{}: {}", timestamp, String::from_utf8_lossy(message));
///         }
///     });
///
///     // blocks until a handler calls stop() or ctrl-c arrives
///     socket.start().await?;
///     Ok(())
/// }
/// ```
pub struct LogSocket {
    address: SocketAddr,
    socket: RefCell<Option<UdpSocket>>,
    dispatch: Dispatcher<LogRecord>,
}

impl LogSocket {
    pub fn new(address: SocketAddr) -> Self {
        LogSocket {
            address,
            socket: RefCell::new(None),
            dispatch: Dispatcher::new(),
        }
    }

    /// Registers a handler for decoded log records. Handlers receive the
    /// `(None, None)` sentinel as the last record when the socket stops and
    /// should do their teardown there.
    pub fn register<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&LogRecord) + 'static,
    {
        self.dispatch.register(handler)
    }

    pub fn unregister(&self, id: HandlerId) -> Result<(), DispatchError> {
        self.dispatch.unregister(id)
    }

    /// The dispatcher records are broadcast through, for wiring up handlers
    /// that take one directly.
    pub fn dispatcher(&self) -> &Dispatcher<LogRecord> {
        &self.dispatch
    }

    /// Binds the receive socket without starting the loop, and reports the
    /// bound address. Useful to learn the real port when configured with
    /// port 0.
    pub async fn bind(&self) -> Result<SocketAddr, LogError> {
        let socket = UdpSocket::bind(self.address)
            .await
            .map_err(LogError::BindError)?;
        let address = socket.local_addr().map_err(LogError::BindError)?;

        info!("listening for log messages on {}", address);
        self.socket.replace(Some(socket));

        Ok(address)
    }

    /// Receives and dispatches log records until [LogSocket::stop] is called
    /// or a ctrl-c arrives, then broadcasts the end-of-stream sentinel
    /// exactly once.
    ///
    /// A receive failure propagates immediately, without the sentinel. A
    /// frame that does not parse is dropped with a warning and the stream
    /// keeps going.
    pub async fn start(&self) -> Result<(), LogError> {
        if self.socket.borrow().is_none() {
            self.bind().await?;
        }

        let mut buffer = Vec::new();
        let mut chunk = [0u8; READ_SIZE];

        loop {
            let received = {
                let socket = self.socket.borrow();
                let Some(socket) = socket.as_ref() else { break };

                tokio::select! {
                    received = socket.recv_from(&mut chunk) => {
                        let (len, _) = received.map_err(LogError::ReceiveError)?;
                        Some(len)
                    }
                    _ = signal::ctrl_c() => None,
                }
            };

            let Some(len) = received else {
                trace!("interrupted, shutting the log socket down");
                self.stop();
                break;
            };

            buffer.extend_from_slice(&chunk[..len]);

            // everything up to a NUL is a complete frame; whatever trails
            // the last NUL stays buffered for the next datagram
            while let Some(end) = buffer.iter().position(|&ch| ch == 0) {
                let frame: Vec<u8> = buffer.drain(..=end).collect();
                self.dispatch_frame(&frame[..frame.len() - 1]);
            }

            // don't process anything else if one of the handlers stopped us
            if self.socket.borrow().is_none() {
                break;
            }
        }

        self.dispatch.fire(&LogRecord::end_of_stream());
        Ok(())
    }

    /// Closes the receive socket and stops the loop. Safe to call from a
    /// handler in the middle of a broadcast; the loop notices once the
    /// current wakeup's frames are done.
    pub fn stop(&self) {
        self.socket.borrow_mut().take();
    }

    fn dispatch_frame(&self, frame: &[u8]) {
        // the header junk in front, the newline at the back
        if frame.len() <= HEADER_SIZE {
            warn!("dropping a runt log frame of {} bytes", frame.len());
            return;
        }
        let payload = &frame[HEADER_SIZE..frame.len() - 1];

        match parse_record(payload) {
            Ok(record) => self.dispatch.fire(&record),
            Err(err) => warn!("dropping an unparseable log record: {}", err),
        }
    }
}
