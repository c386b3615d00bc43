// ABOUTME: Interactive demo binary: reads command lines from stdin, sends them, prints the reply.
// ABOUTME: Uses argh for flags and the crate's own quoting module to split each typed line.

use argh::FromArgs;
use respio::quoting;
use respio::{ConnectionConfig, Connection};
use std::io::{self, BufRead, Write};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Minimal interactive client for the wire protocol this crate speaks.
#[derive(FromArgs)]
struct CliArgs {
    /// whether to enable verbose tracing
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the server hostname or IP address (default: 127.0.0.1)
    #[argh(option)]
    host: Option<String>,

    /// the server port (default: 6379)
    #[argh(option, short = 'p')]
    port: Option<u16>,

    /// the password to AUTH with, if the server requires one
    #[argh(option)]
    password: Option<String>,

    /// the database number to SELECT after connecting
    #[argh(option)]
    db: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debugging { Level::DEBUG } else { Level::WARN })
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let host = cli_args.host.unwrap_or_else(|| "127.0.0.1".to_owned());
    let port = cli_args.port.unwrap_or(6379);

    let mut config = ConnectionConfig::new(host.clone(), port);
    if let Some(password) = cli_args.password {
        config = config.with_password(password);
    }
    if let Some(db) = cli_args.db {
        config = config.with_db(db);
    }

    let conn = Connection::connect(config).await?;
    println!("connected to {host}:{port}");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            break;
        }

        let args = match quoting::split(trimmed) {
            Ok(args) if !args.is_empty() => args,
            Ok(_) => continue,
            Err(e) => {
                eprintln!("parse error: {e}");
                continue;
            }
        };

        let result = conn.execute(args.into_iter().map(Into::into).collect()).await;
        if result.success {
            println!("{:?} ({}ms)", result.data.unwrap(), result.duration_ms);
        } else {
            println!("(error) {} ({}ms)", result.error.unwrap(), result.duration_ms);
        }
    }

    conn.disconnect().await?;
    Ok(())
}
