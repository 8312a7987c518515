//! Desktop notifications via `org.freedesktop.Notifications`.
//!
//! Each bell event becomes one `Notify` call on the session bus. The
//! window icon, when there is one, travels as an `image-data` hint;
//! otherwise the configured default icon name is used.

pub mod format;

use std::collections::HashMap;

use zbus::zvariant::{Structure, Value};
use zbus::{Connection, proxy};

use crate::bell::BellEvent;

/// Notifier errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("D-Bus: {0}")]
    Bus(#[from] zbus::Error),
}

/// Proxy for org.freedesktop.Notifications
#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    /// Show a notification
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: HashMap<&str, Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// How notifications are presented.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub app_name: String,
    /// Icon name used when the window has no icon.
    pub default_icon: String,
    /// Expiry in milliseconds; `-1` lets the server decide.
    pub timeout_ms: i32,
}

/// Session-bus notification sender.
pub struct Notifier {
    proxy: NotificationsProxy<'static>,
    config: NotifierConfig,
}

impl Notifier {
    /// Connect to the session bus.
    pub async fn connect(config: NotifierConfig) -> Result<Self, NotifyError> {
        let conn = Connection::session().await?;
        let proxy = NotificationsProxy::new(&conn).await?;
        tracing::info!("connected to D-Bus session bus");
        Ok(Self { proxy, config })
    }

    /// Send one notification for `event`, returning the server's id.
    ///
    /// This is where the icon's pixels are actually produced.
    pub async fn send(&self, event: &BellEvent) -> Result<u32, NotifyError> {
        let summary = format::summary(event);
        let body = format::body(event);

        let mut hints = HashMap::new();
        let mut app_icon = self.config.default_icon.as_str();

        if let Some(image) = event.icon().and_then(format::image_data) {
            let structure = Structure::from((
                image.width,
                image.height,
                image.rowstride,
                image.has_alpha,
                image.bits_per_sample,
                image.channels,
                image.data,
            ));
            hints.insert("image-data", Value::from(structure));
            app_icon = "";
        }

        let id = self
            .proxy
            .notify(
                &self.config.app_name,
                0,
                app_icon,
                &summary,
                &body,
                &[],
                hints,
                self.config.timeout_ms,
            )
            .await?;

        tracing::debug!(id, %summary, "notification sent");
        Ok(id)
    }
}
