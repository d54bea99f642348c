use log::{error, info, Metadata, Record};
use sourlog::client::Client;
use sourlog::config::Config;
use sourlog::handlers::{self, CommandSender};
use sourlog::logstream::LogSocket;
use std::error::Error;
use std::net::SocketAddr;
use std::process::ExitCode;

struct SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{} - {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: SimpleLogger = SimpleLogger;

#[tokio::main]
async fn main() -> ExitCode {
    let Some(config_path) = std::env::args().nth(1) else {
        eprintln!("usage: sourlog CONFIG");
        return ExitCode::FAILURE;
    };

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}: {}", config_path, err);
            return ExitCode::FAILURE;
        }
    };

    let level = match config.server.level_filter() {
        Ok(level) => level,
        Err(err) => {
            eprintln!("{}: {}", config_path, err);
            return ExitCode::FAILURE;
        }
    };
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(level));

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn Error>> {
    info!(
        "connecting to server at {}:{}",
        config.rcon.host, config.rcon.port
    );
    let mut client = Client::connect(&config.rcon.host, config.rcon.port).await?;

    if !client.authenticate(&config.rcon.password).await? {
        client.close().await?;
        return Err("the server did not accept the rcon password".into());
    }

    // the game server has to be told to send a copy of its log stream our
    // way, which conveniently is an rcon command
    let our_ip = client.local_addr()?.ip();
    info!(
        "pointing the server's log stream at {}:{}",
        our_ip, config.log.port
    );
    client.command("logaddress_delall").await?;
    client
        .command(&format!("logaddress_add {}:{}", our_ip, config.log.port))
        .await?;
    client.command("log on").await?;

    let log_socket = LogSocket::new(SocketAddr::new(our_ip, config.log.port));

    // handlers queue their rcon commands; the client lives on its own task
    // and drains the queue until every sender is gone
    let (sender, mut commands) = CommandSender::channel();
    let writer = tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            if let Err(err) = client.command(&command).await {
                error!("rcon command failed: {}", err);
            }
        }
        client.close().await
    });

    for name in &config.server.handlers {
        info!("attaching log handler {}", name);
        handlers::init(name, &sender, &log_socket, &config)?;
    }
    drop(sender);

    info!("starting log collector");
    log_socket.start().await?;
    info!("stopped log collector");

    // dropping the socket releases the handlers and with them the last
    // queue senders, letting the writer task wind down and disconnect
    drop(log_socket);
    writer.await??;
    info!("closed rcon connection");

    Ok(())
}
