//! Renders and delivers the posters for today's events.
//!
//! Every event is handled on its own: a failure is logged and the run moves
//! on to the next one.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use anyhow::Result;
use log::error;
use log::info;
use log::warn;
use tracing::Instrument;

use crate::event::EventMatch;
use crate::messenger::MessageComposer;
use crate::messenger::MessageSender;
use crate::poster::PosterRenderer;

/// Where and whether posters are sent.
#[derive(Clone, Debug, Default)]
pub struct DeliveryOptions {
    pub send_personal_messages: bool,
    pub send_to_group: bool,
    pub group_chat_id: String,
    /// Render only; nothing is sent.
    pub dry_run: bool,
    /// Directory rendered posters are written to.
    pub save_posters: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub matched: usize,
    pub processed: usize,
    pub personal_sent: usize,
    pub group_sent: usize,
    pub failed_sends: usize,
    pub failed_events: usize,
}

pub struct Notifier {
    renderer: Arc<dyn PosterRenderer>,
    sender: Arc<dyn MessageSender>,
    composer: MessageComposer,
    options: DeliveryOptions,
}

impl Notifier {
    pub fn new(
        renderer: Arc<dyn PosterRenderer>,
        sender: Arc<dyn MessageSender>,
        composer: MessageComposer,
        options: DeliveryOptions,
    ) -> Self {
        Self {
            renderer,
            sender,
            composer,
            options,
        }
    }

    /// Handles every event in order and reports what happened.
    pub async fn notify_all(&self, events: &[EventMatch]) -> RunSummary {
        let mut summary = RunSummary {
            matched: events.len(),
            ..RunSummary::default()
        };

        for event in events {
            let span = tracing::info_span!(
                "event",
                name = %event.name,
                event = %event.event_name
            );
            let result = self.notify(event, &mut summary).instrument(span).await;
            match result {
                Ok(()) => summary.processed += 1,
                Err(e) => {
                    error!("Error processing {}: {:#}", event.name, e);
                    summary.failed_events += 1;
                }
            }
        }

        summary
    }

    async fn notify(&self, event: &EventMatch, summary: &mut RunSummary) -> Result<()> {
        info!("Processing: {} - {}", event.name, event.event_name);

        let poster = self
            .renderer
            .render(event)
            .await
            .context("failed to create poster")?;
        let personal_msg = self
            .composer
            .personal(event)
            .context("failed to render personal message")?;
        let group_msg = self
            .composer
            .group(event)
            .context("failed to render group message")?;

        if let Some(dir) = &self.options.save_posters {
            save_poster(dir, event, &poster).await;
        }

        if self.options.send_personal_messages
            && let Some(telegram_id) = &event.telegram_id
        {
            if self.options.dry_run {
                info!("[dry run] Would send personal message to {}: {}", telegram_id, personal_msg);
            } else {
                match self.sender.send_photo(telegram_id, &poster, &personal_msg).await {
                    Ok(()) => {
                        info!("Personal message sent to {}", event.name);
                        summary.personal_sent += 1;
                    }
                    Err(e) => {
                        warn!("Failed to send personal message: {}", e);
                        summary.failed_sends += 1;
                    }
                }
            }
        }

        if self.options.send_to_group {
            let chat_id = &self.options.group_chat_id;
            if self.options.dry_run {
                info!("[dry run] Would send group message to {}: {}", chat_id, group_msg);
            } else {
                match self.sender.send_photo(chat_id, &poster, &group_msg).await {
                    Ok(()) => {
                        info!("Group message sent");
                        summary.group_sent += 1;
                    }
                    Err(e) => {
                        warn!("Failed to send group message: {}", e);
                        summary.failed_sends += 1;
                    }
                }
            }
        }

        Ok(())
    }
}

async fn save_poster(dir: &Path, event: &EventMatch, poster: &[u8]) {
    let path = dir.join(poster_file_name(event));
    let result = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, poster).await
    }
    .await;

    match result {
        Ok(()) => info!("Poster saved to {}", path.display()),
        Err(e) => warn!("Failed to save poster to {}: {}", path.display(), e),
    }
}

/// `<name>-<event>.png` with anything but ASCII letters, digits, `-` and `_`
/// replaced by `_`.
pub fn poster_file_name(event: &EventMatch) -> String {
    fn sanitize(s: &str) -> String {
        s.trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
    format!("{}-{}.png", sanitize(&event.name), sanitize(&event.event_name))
}
