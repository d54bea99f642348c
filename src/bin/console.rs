//! A standalone interactive rcon console.
//!
//! Run via:
//!
//! ```text
//! console HOSTNAME[:PORT]
//! ```

use sourlog::client::{Client, DEFAULT_PORT};
use std::io::Write;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[tokio::main]
async fn main() -> ExitCode {
    let Some(target) = std::env::args().nth(1) else {
        eprintln!("usage: console HOSTNAME[:PORT]");
        return ExitCode::FAILURE;
    };

    let (host, port) = match target.rsplit_once(':') {
        Some((host, port)) => match port.parse() {
            Ok(port) => (host.to_owned(), port),
            Err(_) => {
                eprintln!("{} is not a valid port", port);
                return ExitCode::FAILURE;
            }
        },
        None => (target.clone(), DEFAULT_PORT),
    };

    let mut client = match Client::connect(&host, port).await {
        Ok(client) => client,
        Err(err) => {
            eprintln!("could not connect to rcon on {}: {}", target, err);
            return ExitCode::FAILURE;
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let Some(password) = prompt(&mut lines, "Password: ").await else {
        return ExitCode::FAILURE;
    };

    match client.authenticate(&password).await {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("could not connect - password not accepted");
            return ExitCode::FAILURE;
        }
        Err(err) => {
            eprintln!("could not authenticate: {}", err);
            return ExitCode::FAILURE;
        }
    }

    loop {
        let Some(command) = prompt(&mut lines, "> ").await else {
            // end of input counts as a disconnect
            let _ = client.close().await;
            return ExitCode::FAILURE;
        };

        match command.as_str() {
            "" => {}
            ".disconnect" => {
                let _ = client.close().await;
                return ExitCode::SUCCESS;
            }
            ".help" => {
                println!(".help - Print this page");
                println!(".disconnect - Exit this session");
            }
            command => match client.command(command).await {
                Ok(response) => print!("{}", response.body()),
                Err(err) => {
                    eprintln!("command failed: {}", err);
                    return ExitCode::FAILURE;
                }
            },
        }
    }
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, text: &str) -> Option<String> {
    print!("{}", text);
    let _ = std::io::stdout().flush();

    lines.next_line().await.ok().flatten()
}
