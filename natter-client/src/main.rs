//! natter - terminal chat client

use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use natter_utils::{init_logging_with_config, LogConfig, NatterError, Result};

mod cli;
mod connection;

use cli::Args;
use connection::Connection;

/// Typing this line alone closes the client without telling the server
const EXIT_COMMAND: &str = "exit()";

/// Prompt for and read a display name from stdin
async fn prompt_name(lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>) -> Result<String> {
    use std::io::Write;

    print!("Enter your name: ");
    std::io::stdout().flush()?;

    match lines.next_line().await? {
        Some(name) => Ok(name),
        None => Err(NatterError::connection("No name given")),
    }
}

/// Run the interactive chat loop
async fn run_chat(args: Args) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let name = match args.name {
        Some(name) => name,
        None => prompt_name(&mut lines).await?,
    };

    let mut conn = Connection::new(args.addr.clone());
    conn.connect().await?;
    println!("Connected to {}", args.addr);

    // The first chunk on the wire names this client
    conn.send(Bytes::from(name)).await?;

    loop {
        tokio::select! {
            chunk = conn.recv() => {
                match chunk {
                    Some(chunk) => println!("{}", String::from_utf8_lossy(&chunk)),
                    None => {
                        eprintln!("Server closed the connection");
                        break;
                    }
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) if line == EXIT_COMMAND => break,
                    Some(line) => conn.send(Bytes::from(line)).await?,
                    None => break,
                }
            }
        }
    }

    conn.disconnect().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    init_logging_with_config(LogConfig::client())?;
    info!("natter client starting");

    if let Err(e) = run_chat(args).await {
        tracing::error!("Client error: {}", e);
        eprintln!("Error: {}", e);
        return Err(e);
    }

    Ok(())
}
