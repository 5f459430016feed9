//! Desktop implementation of the notification seam.
//!
//! Immediate notifications go straight to the platform service via
//! `notify-rust`; delayed ones are armed as one-shot tokio timers that post
//! when they fire. "Cancel" aborts armed timers; "dismiss" closes what is
//! already on screen (Linux only — other platforms have no close API, so
//! reposting under the fixed playback replace-id is the effective update
//! path there).

use async_trait::async_trait;
use notify_rust::Notification;
use radio47_core::notify::{NotificationContent, Notifier, Trigger};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const APP_NAME: &str = "Radio 47";

/// Fixed replace-id for the single persistent playback notification.
#[cfg(target_os = "linux")]
const PLAYBACK_NOTIFICATION_ID: u32 = 0x5234_0037;

pub struct DesktopNotifier {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    /// Armed-but-unfired reminder timers.
    pending: Mutex<Vec<JoinHandle<()>>>,
    /// Handles for notifications currently on screen, for dismissal.
    #[cfg(target_os = "linux")]
    shown: Mutex<Vec<notify_rust::NotificationHandle>>,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::default()),
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

async fn post(inner: &Inner, content: &NotificationContent) -> anyhow::Result<()> {
    let mut notification = Notification::new();
    notification
        .appname(APP_NAME)
        .summary(&content.title)
        .body(&content.body);

    #[cfg(target_os = "linux")]
    {
        use notify_rust::{Hint, Timeout};
        use radio47_core::notify::CATEGORY_PLAYBACK;

        for action in &content.actions {
            notification.action(&action.id, &action.label);
        }
        if content.sticky {
            notification.hint(Hint::Resident(true));
            notification.timeout(Timeout::Never);
        }
        if !content.sound {
            notification.hint(Hint::SuppressSound(true));
        }
        if content.category == CATEGORY_PLAYBACK {
            // Reposting under a fixed id updates the notification in place
            notification.id(PLAYBACK_NOTIFICATION_ID);
        }
        notification.hint(Hint::Category(content.category.clone()));
    }

    #[cfg(target_os = "linux")]
    {
        let handle = notification.show()?;
        inner.shown.lock().await.push(handle);
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = inner;
        notification.show()?;
    }

    debug!("posted notification: {}", content.title);
    Ok(())
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn schedule(
        &self,
        content: NotificationContent,
        trigger: Trigger,
    ) -> anyhow::Result<()> {
        match trigger {
            Trigger::Immediate => post(&self.inner, &content).await,
            Trigger::AfterSeconds(secs) => {
                let inner = Arc::clone(&self.inner);
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(secs)).await;
                    if let Err(e) = post(&inner, &content).await {
                        warn!("delayed notification failed: {e:#}");
                    }
                });
                self.inner.pending.lock().await.push(handle);
                Ok(())
            }
        }
    }

    async fn cancel_all_scheduled(&self) -> anyhow::Result<()> {
        let mut pending = self.inner.pending.lock().await;
        for handle in pending.drain(..) {
            handle.abort();
        }
        Ok(())
    }

    async fn dismiss_all(&self) -> anyhow::Result<()> {
        #[cfg(target_os = "linux")]
        {
            let mut shown = self.inner.shown.lock().await;
            for handle in shown.drain(..) {
                handle.close();
            }
        }
        #[cfg(not(target_os = "linux"))]
        debug!("dismiss_all: platform has no close API");
        Ok(())
    }
}
