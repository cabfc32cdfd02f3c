//! The conversation flow: a few prompts collecting an amount and two
//! currency codes, plus quick-pair shortcuts, all driving the resolver.

pub mod reply;
pub mod session;

use crate::core::config::{QUICK_PAIR_PREFIX, QuickPair};
use crate::core::{Amount, ConversionRequest, CurrencyCode};
use crate::resolver::{RateResolver, Resolution};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reply::{InlineButton, Keyboard, Reply};
use session::{ChatId, SessionStore};
use std::sync::Arc;
use tracing::{debug, error, instrument};

pub const MANUAL_SELECTION: &str = "manual";

/// Per-chat progress through the manual conversion prompts.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingAmount,
    AwaitingSource {
        amount: Amount,
    },
    AwaitingDestination {
        amount: Amount,
        source: CurrencyCode,
    },
}

impl ConversationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ConversationState::Idle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Cancel,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(Command),
    Text(String),
    Selection(String),
}

impl Event {
    /// Classifies an incoming text message, recognising `/command` and
    /// `/command@botname` forms.
    pub fn from_message(text: &str) -> Self {
        let trimmed = text.trim();
        let Some(command) = trimmed.strip_prefix('/') else {
            return Event::Text(text.to_string());
        };
        let name = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default();
        Event::Command(match name.to_ascii_lowercase().as_str() {
            "start" => Command::Start,
            "cancel" => Command::Cancel,
            _ => Command::Unknown,
        })
    }
}

fn parse_quick_pair_data(payload: &str) -> Result<ConversionRequest> {
    let parts: Vec<&str> = payload.split(':').collect();
    match parts.as_slice() {
        [amount, from, to] => ConversionRequest::parse(amount, from, to)
            .with_context(|| format!("Malformed quick pair: {payload}")),
        _ => Err(anyhow!("Malformed quick pair: {}", payload)),
    }
}

/// The narrow outbound capability the flow needs from a chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, chat: ChatId, reply: &Reply) -> Result<()>;
}

pub struct ConversationFlow {
    resolver: Arc<RateResolver>,
    quick_pairs: Vec<QuickPair>,
    currency_presets: Vec<String>,
}

impl ConversationFlow {
    pub fn new(
        resolver: Arc<RateResolver>,
        quick_pairs: Vec<QuickPair>,
        currency_presets: Vec<String>,
    ) -> Self {
        ConversationFlow {
            resolver,
            quick_pairs,
            currency_presets,
        }
    }

    pub async fn handle(&self, state: &mut ConversationState, event: Event) -> Result<Reply> {
        match event {
            Event::Command(Command::Start) => Ok(self.start(state)),
            Event::Command(Command::Cancel) => Ok(self.cancel(state)),
            Event::Command(Command::Unknown) => Ok(self.prompt(state)),
            Event::Text(text) => Ok(self.text(state, &text).await),
            Event::Selection(data) => self.selection(state, &data).await,
        }
    }

    pub fn start(&self, state: &mut ConversationState) -> Reply {
        *state = ConversationState::Idle;

        let mut rows: Vec<Vec<InlineButton>> = self
            .quick_pairs
            .iter()
            .map(|pair| {
                vec![InlineButton {
                    label: pair.label(),
                    data: pair.callback_data(),
                }]
            })
            .collect();
        rows.push(vec![InlineButton {
            label: reply::MANUAL_BUTTON.to_string(),
            data: MANUAL_SELECTION.to_string(),
        }]);

        Reply::text(reply::MENU).with_keyboard(Keyboard::Inline(rows))
    }

    pub fn cancel(&self, state: &mut ConversationState) -> Reply {
        *state = ConversationState::Idle;
        Reply::text(reply::CANCELLED).with_keyboard(Keyboard::Remove)
    }

    pub async fn selection(&self, state: &mut ConversationState, data: &str) -> Result<Reply> {
        if data == MANUAL_SELECTION {
            *state = ConversationState::AwaitingAmount;
            return Ok(Reply::text(reply::ASK_AMOUNT).with_keyboard(Keyboard::Remove));
        }
        let payload = data
            .strip_prefix(QUICK_PAIR_PREFIX)
            .ok_or_else(|| anyhow!("Unknown selection: {}", data))?;
        let request = parse_quick_pair_data(payload)?;
        Ok(self.convert(&request).await)
    }

    /// Advances the manual flow. Invalid input re-prompts and leaves the
    /// state exactly as it was.
    pub async fn text(&self, state: &mut ConversationState, input: &str) -> Reply {
        match state {
            ConversationState::Idle => Reply::text(reply::IDLE_HINT),
            ConversationState::AwaitingAmount => match input.parse::<Amount>() {
                Ok(amount) => {
                    *state = ConversationState::AwaitingSource { amount };
                    Reply::text(reply::ASK_SOURCE).with_keyboard(self.presets())
                }
                Err(e) => {
                    debug!(error = %e, "Rejected amount");
                    Reply::text(reply::INVALID_AMOUNT)
                }
            },
            ConversationState::AwaitingSource { amount } => match input.parse::<CurrencyCode>() {
                Ok(source) => {
                    *state = ConversationState::AwaitingDestination {
                        amount: *amount,
                        source,
                    };
                    Reply::text(reply::ASK_DESTINATION).with_keyboard(self.presets())
                }
                Err(e) => {
                    debug!(error = %e, "Rejected source currency");
                    Reply::text(reply::INVALID_SOURCE)
                }
            },
            ConversationState::AwaitingDestination { amount, source } => {
                match input.parse::<CurrencyCode>() {
                    Ok(destination) => {
                        let request = ConversionRequest::new(*amount, source.clone(), destination);
                        *state = ConversationState::Idle;
                        self.convert(&request).await
                    }
                    Err(e) => {
                        debug!(error = %e, "Rejected destination currency");
                        Reply::text(reply::INVALID_DESTINATION)
                    }
                }
            }
        }
    }

    /// Repeats the question for the current step, or the start hint when
    /// no conversation is in progress.
    pub fn prompt(&self, state: &ConversationState) -> Reply {
        match state {
            ConversationState::Idle => Reply::text(reply::IDLE_HINT),
            ConversationState::AwaitingAmount => Reply::text(reply::ASK_AMOUNT),
            ConversationState::AwaitingSource { .. } => {
                Reply::text(reply::ASK_SOURCE).with_keyboard(self.presets())
            }
            ConversationState::AwaitingDestination { .. } => {
                Reply::text(reply::ASK_DESTINATION).with_keyboard(self.presets())
            }
        }
    }

    async fn convert(&self, request: &ConversionRequest) -> Reply {
        let text = match self.resolver.resolve(request).await {
            Resolution::Resolved { value, .. } => reply::format_conversion(request, value),
            Resolution::Unavailable => reply::UNAVAILABLE.to_string(),
        };
        Reply::text(text).with_keyboard(Keyboard::Remove)
    }

    fn presets(&self) -> Keyboard {
        reply::choices_keyboard(&self.currency_presets)
    }
}

/// Routes inbound events to the right chat session and sends the reply.
pub struct Dispatcher {
    flow: ConversationFlow,
    sessions: SessionStore,
    transport: Arc<dyn ChatTransport>,
}

impl Dispatcher {
    pub fn new(flow: ConversationFlow, transport: Arc<dyn ChatTransport>) -> Self {
        Dispatcher {
            flow,
            sessions: SessionStore::new(),
            transport,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handles one event. Failures inside the flow are logged and answered
    /// with a generic message; only a failed send is returned to the caller.
    #[instrument(name = "Dispatch", skip(self, event))]
    pub async fn dispatch(&self, chat: ChatId, event: Event) -> Result<()> {
        let slot = self.sessions.checkout(chat).await;
        let reply = {
            let mut state = slot.lock().await;
            match self.flow.handle(&mut state, event).await {
                Ok(reply) => reply,
                Err(e) => {
                    error!(error = %e, "Failed to handle event");
                    Reply::text(reply::FAILED)
                }
            }
        };
        self.sessions.release(chat, slot).await;

        self.transport
            .send(chat, &reply)
            .await
            .with_context(|| format!("Failed to send reply to chat {chat}"))
    }
}
