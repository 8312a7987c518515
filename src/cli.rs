use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xkbnotify", about = "Forward X11 keyboard bells to desktop notifications")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Listen for bell events and show a notification for each
    Listen {
        /// X display to connect to (defaults to $DISPLAY)
        #[arg(long)]
        display: Option<String>,

        /// Application name reported to the notification server
        #[arg(long, default_value = "xkbnotify")]
        app_name: String,

        /// Icon name used when the ringing window has no icon
        #[arg(long, default_value = "dialog-information")]
        default_icon: String,

        /// Notification expiry in milliseconds (-1: server default)
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        timeout_ms: i32,

        /// Preferred icon size when a window offers several
        #[arg(long, default_value_t = 64)]
        icon_size: u32,
    },

    /// Send a named bell event, for testing a running listener
    Ring {
        /// X display to connect to (defaults to $DISPLAY)
        #[arg(long)]
        display: Option<String>,

        /// Bell name
        #[arg(default_value = "TerminalBell")]
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_defaults() {
        let cli = Cli::try_parse_from(["xkbnotify", "listen"]).unwrap();
        match cli.command {
            Command::Listen {
                display,
                app_name,
                default_icon,
                timeout_ms,
                icon_size,
            } => {
                assert_eq!(display, None);
                assert_eq!(app_name, "xkbnotify");
                assert_eq!(default_icon, "dialog-information");
                assert_eq!(timeout_ms, -1);
                assert_eq!(icon_size, 64);
            }
            Command::Ring { .. } => panic!("expected listen"),
        }
    }

    #[test]
    fn listen_overrides() {
        let cli = Cli::try_parse_from([
            "xkbnotify",
            "listen",
            "--display",
            ":1",
            "--timeout-ms",
            "5000",
            "--icon-size",
            "128",
        ])
        .unwrap();
        match cli.command {
            Command::Listen {
                display,
                timeout_ms,
                icon_size,
                ..
            } => {
                assert_eq!(display.as_deref(), Some(":1"));
                assert_eq!(timeout_ms, 5000);
                assert_eq!(icon_size, 128);
            }
            Command::Ring { .. } => panic!("expected listen"),
        }
    }

    #[test]
    fn ring_name() {
        let cli = Cli::try_parse_from(["xkbnotify", "ring", "Alert"]).unwrap();
        match cli.command {
            Command::Ring { name, display } => {
                assert_eq!(name, "Alert");
                assert_eq!(display, None);
            }
            Command::Listen { .. } => panic!("expected ring"),
        }
    }

    #[test]
    fn ring_default_name() {
        let cli = Cli::try_parse_from(["xkbnotify", "ring"]).unwrap();
        assert!(matches!(cli.command, Command::Ring { name, .. } if name == "TerminalBell"));
    }
}
