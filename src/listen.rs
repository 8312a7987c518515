//! Listen loop: bell events in, desktop notifications out.
//!
//! Strictly sequential: wait for a bell, build its record, hand it to the
//! notifier, drop it, repeat. SIGINT/SIGTERM stop the loop between
//! events.

use tokio::signal::unix::{SignalKind, signal as tokio_signal};

use crate::bell::BellEvent;
use crate::display::{DisplayError, DisplaySession};
use crate::notify::{Notifier, NotifierConfig, NotifyError};

/// Listen command errors.
#[derive(Debug, thiserror::Error)]
pub enum ListenError {
    #[error("display: {0}")]
    Display(#[from] DisplayError),
    #[error("notifications: {0}")]
    Notify(#[from] NotifyError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Settings for the listen loop, built from the command line.
#[derive(Debug, Clone)]
pub struct ListenConfig {
    /// X display, `None` for `$DISPLAY`.
    pub display: Option<String>,
    /// Preferred icon edge when a window offers several sizes.
    pub icon_size: u32,
    pub notifier: NotifierConfig,
}

/// Run until a signal arrives or the display connection fails.
pub async fn run(config: ListenConfig) -> Result<(), ListenError> {
    let session = DisplaySession::connect(config.display.as_deref())?;
    tracing::info!(screen = session.screen_num(), "connected to X11 display");

    let notifier = Notifier::connect(config.notifier.clone()).await?;

    let mut sig_term = tokio_signal(SignalKind::terminate())?;
    let mut sig_int = tokio_signal(SignalKind::interrupt())?;

    tracing::info!("listening for bell events");

    loop {
        tokio::select! {
            bell = session.next_bell() => {
                let notify = bell?;
                let event = BellEvent::capture(&session, &notify, config.icon_size);
                tracing::debug!(
                    window = format_args!("0x{:x}", event.window()),
                    pitch = event.pitch(),
                    percent = event.percent(),
                    duration = event.duration(),
                    bell_class = event.bell_class(),
                    bell_id = event.bell_id(),
                    event_only = event.event_only(),
                    has_icon = event.icon().is_some(),
                    "bell event"
                );

                // A failed notification never stops the daemon.
                if let Err(e) = notifier.send(&event).await {
                    tracing::warn!(error = %e, "notification failed");
                }
            }

            _ = sig_term.recv() => {
                tracing::info!("received SIGTERM, shutting down");
                break;
            }

            _ = sig_int.recv() => {
                tracing::info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    Ok(())
}
