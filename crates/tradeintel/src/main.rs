use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tradeintel", about = "Trade intelligence tool server", version)]
struct Cli {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve JSON-RPC on stdin/stdout
    Stdio,

    /// Serve the HTTP API
    Http {
        /// Listen address, overriding `server.http_addr`
        #[arg(long)]
        addr: Option<String>,
    },

    /// Print every registered tool
    List {
        #[arg(long)]
        pretty: bool,
    },

    /// Call one tool and print its result
    Call {
        name: String,

        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,

        #[arg(long)]
        pretty: bool,
    },
}

fn init_tracing(format: LogFormat) {
    // stdout belongs to the JSON-RPC stream, so logs always go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = tradeintel::load_config(cli.config.as_deref())?;
    let dispatcher =
        tradeintel::build_dispatcher(&config).context("Failed to build dispatcher")?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received");
                cancel.cancel();
            }
        });
    }

    match cli.command {
        Command::Stdio => {
            tradeintel::stdio::serve(dispatcher, tokio::io::stdin(), tokio::io::stdout(), cancel)
                .await
                .context("JSON-RPC server failed")?;
        }
        Command::Http { addr } => {
            let addr = addr.unwrap_or_else(|| config.server.http_addr.clone());
            let listener = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;
            tradeintel::http::serve(listener, dispatcher, config.mode, cancel)
                .await
                .context("HTTP server failed")?;
        }
        Command::List { pretty } => {
            print_json(&json!({ "tools": dispatcher.list() }), pretty)?;
        }
        Command::Call { name, args, pretty } => {
            let args: Value =
                serde_json::from_str(&args).context("Failed to parse --args as JSON")?;
            let result = dispatcher.call(&name, &args).await;
            print_json(&result, pretty)?;
            if result.is_error {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
