use super::client::TelegramClient;
use super::types::Update;
use crate::conversation::session::ChatId;
use crate::conversation::{Dispatcher, Event};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, PartialEq)]
pub struct Inbound {
    pub chat: ChatId,
    pub event: Event,
    pub callback_id: Option<String>,
}

/// Maps a Bot API update onto a conversation event, if it carries one.
pub fn route(update: Update) -> Option<Inbound> {
    if let Some(query) = update.callback_query {
        let chat = query
            .message
            .as_ref()
            .map_or(query.from.id, |m| m.chat.id);
        return Some(Inbound {
            chat,
            event: Event::Selection(query.data.unwrap_or_default()),
            callback_id: Some(query.id),
        });
    }

    let message = update.message?;
    let text = message.text?;
    Some(Inbound {
        chat: message.chat.id,
        event: Event::from_message(&text),
        callback_id: None,
    })
}

async fn handle(client: Arc<TelegramClient>, dispatcher: Arc<Dispatcher>, inbound: Inbound) {
    if let Some(id) = &inbound.callback_id {
        if let Err(e) = client.answer_callback(id).await {
            warn!(error = %e, "Failed to answer callback query");
        }
    }
    if let Err(e) = dispatcher.dispatch(inbound.chat, inbound.event).await {
        error!(chat = inbound.chat, error = %e, "Failed to deliver reply");
    }
}

/// Long-polls for updates until Ctrl-C, handling each on its own task.
pub async fn run_polling(
    client: Arc<TelegramClient>,
    dispatcher: Arc<Dispatcher>,
    poll_timeout_secs: u64,
) -> Result<()> {
    let mut offset = 0;
    info!("Bot started, polling for updates");

    loop {
        let updates = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
            result = client.get_updates(offset, poll_timeout_secs) => result,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                error!(error = %e, "Failed to fetch updates, retrying");
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let update_id = update.update_id;
            match route(update) {
                Some(inbound) => {
                    tokio::spawn(handle(
                        Arc::clone(&client),
                        Arc::clone(&dispatcher),
                        inbound,
                    ));
                }
                None => debug!(update_id, "Ignoring update without text or callback"),
            }
        }
    }
}
