use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use parley_net::{ChatClient, ChatServer, Lifecycle};
use parley_proto::constants::DEFAULT_PORT;

/// Minimal TCP chat
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Minimal TCP chat transport", long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the relay server
    Serve {
        /// TCP bind address
        #[arg(short, long, default_value_t = format!("0.0.0.0:{DEFAULT_PORT}"))]
        bind: String,
    },
    /// Connect to a server and chat (type `quit` to leave)
    Connect {
        /// Server address, `host` or `host:port`
        addr: String,

        /// Display name announced to the server
        #[arg(short, long, default_value = "Unknown")]
        name: String,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let lifecycle = Lifecycle::new();

    match args.command {
        Command::Serve { bind } => {
            let server = ChatServer::bind(&bind)?;
            server.run(lifecycle);
        }
        Command::Connect { addr, name } => {
            let addr = if addr.contains(':') {
                addr
            } else {
                format!("{addr}:{DEFAULT_PORT}")
            };
            let client = ChatClient::connect(&addr, &name)?;
            client.run(lifecycle);
        }
    }

    Ok(())
}
