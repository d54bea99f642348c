use crate::{
    error::RconError,
    packet::{Packet, PacketType},
};
use log::{trace, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// The port game servers listen on for rcon connections unless told
/// otherwise.
pub const DEFAULT_PORT: u16 = 27015;

/// How long to wait on a single read before giving up on the server.
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Simple asynchronous rcon client. Call `connect()` to establish a
/// connection, then `authenticate()` before issuing commands. Each packet
/// carries a fresh random id, so the client keeps no state besides the
/// stream itself and a session is not reusable once closed.
///
/// ## Example
/// ```no_run
/// use sourlog::client::Client;
/// use std::error::Error;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn Error>> {
///     let mut client = Client::connect("dev.viora.sh", 27016).await?;
///     if !client.authenticate("<put rcon password here>").await? {
///         return Err("bad password".into());
///     }
///
///     let response = client.command("echo hi").await?;
///     assert_eq!(response.body(), "hi");
///
///     client.close().await?;
///     Ok(())
/// }
/// ```
pub struct Client {
    stream: TcpStream,
}

/// Container struct for a response that can be glued together from multiple
/// [Packet]s.
pub struct Response {
    body: String,
}

impl Response {
    pub fn body(&self) -> &str {
        self.body.as_ref()
    }
}

impl Client {
    pub async fn connect(host: &str, port: u16) -> Result<Self, RconError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(RconError::UnreachableHost)?;

        trace!("opened tcp stream to {}:{}", host, port);

        Ok(Client { stream })
    }

    /// Authenticates against the server, returning whether the password was
    /// accepted.
    ///
    /// The server answers an auth request with two packets: an empty
    /// response-value packet mirroring our id, then the actual auth response
    /// whose id repeats ours on success and is -1 on failure. Both must be
    /// read; stopping after the first would leave the verdict in the stream.
    pub async fn authenticate(&mut self, password: &str) -> Result<bool, RconError> {
        let auth_packet = Packet::new(PacketType::Auth, password)?;

        trace!("sending auth packet to server");
        self.write_packet(&auth_packet).await?;

        let mirror = self.read_packet().await?;
        if mirror.id() != auth_packet.id() {
            warn!(
                "auth acknowledgement carries id {} instead of ours",
                mirror.id()
            );
        }

        let verdict = self.read_packet().await?;
        trace!("auth verdict arrived with id {}", verdict.id());

        Ok(verdict.id() != -1)
    }

    /// Run a rcon command asynchronously. In case of a response being split
    /// between multiple packets, they will be joined together afterwards.
    pub async fn command(&mut self, command: &str) -> Result<Response, RconError> {
        let command_packet = Packet::new(PacketType::Exec, command)?;
        // since srcds can split up the response but it won't tell us how many
        // packets to expect, we send an empty response-value packet right
        // behind the command; the server processes packets in order and
        // mirrors it back, so the first response with a different id marks
        // the end of the command output.
        let terminator_packet = Packet::new(PacketType::Response, "")?;

        trace!("sending command packet to server");
        self.write_packet(&command_packet).await?;
        trace!("sending terminator (blank) packet to server");
        self.write_packet(&terminator_packet).await?;

        let mut bodies = Vec::<String>::new();

        // we are guaranteed to receive responses to packets in the order we
        // sent them, so collect bodies until the id changes
        let mut response = self.read_packet().await?;
        while response.id() == command_packet.id() {
            trace!("received response fragment for packet id {}", response.id());
            bodies.push(response.into_body());
            response = self.read_packet().await?;
        }

        // the packet that broke the loop belongs to the terminator, and
        // mirroring it makes the server emit one more packet; drop that too
        // so the stream is clean for the next exchange
        self.read_packet().await?;

        Ok(Response {
            body: bodies.concat(),
        })
    }

    /// Shuts the connection down. Consumes the client: a closed session
    /// cannot be re-used, reconnect instead.
    pub async fn close(mut self) -> Result<(), RconError> {
        self.stream.shutdown().await.map_err(RconError::SendError)
    }

    /// The address of our end of the stream. The service uses it to tell the
    /// game server where to send its log stream.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.stream.local_addr()
    }

    async fn write_packet(&mut self, packet: &Packet) -> Result<(), RconError> {
        self.stream
            .write_all(&packet.pack())
            .await
            .map_err(RconError::SendError)
    }

    async fn read_packet(&mut self) -> Result<Packet, RconError> {
        let mut size_buf = [0u8; 4];
        self.read_exact(&mut size_buf).await?;

        let size = i32::from_le_bytes(size_buf);
        if size < Packet::BASE_PACKET_SIZE {
            return Err(RconError::InvalidPacketSize(size));
        }
        if size > Packet::MAX_PACKET_SIZE {
            // some servers stuff more than 4096 bytes into a packet; the
            // layout is still intact, so read it anyway
            warn!("packet size {} exceeds the protocol maximum", size);
        }

        let mut payload = vec![0u8; size as usize];
        self.read_exact(&mut payload).await?;

        Packet::unpack(&payload)
    }

    /// Reads until `buf` is full, under [READ_TIMEOUT]. A peer that hangs up
    /// mid-packet is a lost connection, never an end-of-stream.
    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), RconError> {
        match timeout(READ_TIMEOUT, self.stream.read_exact(buf)).await? {
            Ok(_) => Ok(()),
            Err(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(RconError::ConnectionLost)
            }
            Err(e) => Err(RconError::ReceiveError(e)),
        }
    }
}
