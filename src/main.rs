mod bell;
mod cli;
mod display;
mod icon;
mod listen;
mod notify;

use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Listen {
            display,
            app_name,
            default_icon,
            timeout_ms,
            icon_size,
        } => {
            let config = listen::ListenConfig {
                display,
                icon_size,
                notifier: notify::NotifierConfig {
                    app_name,
                    default_icon,
                    timeout_ms,
                },
            };
            if let Err(e) = listen::run(config).await {
                tracing::error!(error = %e, "listen failed");
                eprintln!("xkbnotify listen: {e}");
                std::process::exit(1);
            }
        }
        Command::Ring { display, name } => {
            let result = display::DisplaySession::connect(display.as_deref())
                .and_then(|session| session.ring(&name));
            if let Err(e) = result {
                tracing::error!(error = %e, "ring failed");
                eprintln!("xkbnotify ring: {e}");
                std::process::exit(1);
            }
        }
    }
}
