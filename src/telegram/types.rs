//! The subset of the Telegram Bot API the bot uses.

use crate::conversation::reply::{Keyboard, Reply};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct KeyboardButton {
    pub text: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Inline {
        inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
    },
    Keyboard {
        keyboard: Vec<Vec<KeyboardButton>>,
        one_time_keyboard: bool,
        resize_keyboard: bool,
    },
    Remove {
        remove_keyboard: bool,
    },
}

impl ReplyMarkup {
    pub fn from_keyboard(keyboard: &Keyboard) -> Option<Self> {
        match keyboard {
            Keyboard::None => None,
            Keyboard::Inline(rows) => Some(ReplyMarkup::Inline {
                inline_keyboard: rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|b| InlineKeyboardButton {
                                text: b.label.clone(),
                                callback_data: b.data.clone(),
                            })
                            .collect()
                    })
                    .collect(),
            }),
            Keyboard::Choices(rows) => Some(ReplyMarkup::Keyboard {
                keyboard: rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|label| KeyboardButton {
                                text: label.clone(),
                            })
                            .collect()
                    })
                    .collect(),
                one_time_keyboard: true,
                resize_keyboard: true,
            }),
            Keyboard::Remove => Some(ReplyMarkup::Remove {
                remove_keyboard: true,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendMessage {
    pub fn new(chat_id: i64, reply: &Reply) -> Self {
        SendMessage {
            chat_id,
            text: reply.text.clone(),
            reply_markup: ReplyMarkup::from_keyboard(&reply.keyboard),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnswerCallbackQuery {
    pub callback_query_id: String,
}

#[derive(Debug, Serialize)]
pub struct GetUpdates {
    pub offset: i64,
    pub timeout: u64,
    pub allowed_updates: Vec<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::reply::InlineButton;
    use serde_json::json;

    #[test]
    fn test_update_deserialization() {
        let raw = r#"{
            "update_id": 42,
            "callback_query": {
                "id": "cb-1",
                "from": {"id": 9, "is_bot": false, "first_name": "A"},
                "message": {"message_id": 3, "date": 0, "chat": {"id": 100, "type": "private"}},
                "data": "convert:1:EUR:USD"
            }
        }"#;

        let update: Update = serde_json::from_str(raw).unwrap();
        assert_eq!(update.update_id, 42);
        assert!(update.message.is_none());
        let query = update.callback_query.unwrap();
        assert_eq!(query.from.id, 9);
        assert_eq!(query.message.unwrap().chat.id, 100);
        assert_eq!(query.data.as_deref(), Some("convert:1:EUR:USD"));
    }

    #[test]
    fn test_send_message_markup() {
        let reply = Reply::text("Pick").with_keyboard(Keyboard::Inline(vec![vec![InlineButton {
            label: "1 EUR → USD".to_string(),
            data: "convert:1:EUR:USD".to_string(),
        }]]));
        assert_eq!(
            serde_json::to_value(SendMessage::new(5, &reply)).unwrap(),
            json!({
                "chat_id": 5,
                "text": "Pick",
                "reply_markup": {
                    "inline_keyboard": [[{"text": "1 EUR → USD", "callback_data": "convert:1:EUR:USD"}]]
                }
            })
        );

        let reply = Reply::text("Choose").with_keyboard(Keyboard::Choices(vec![vec![
            "USD".to_string(),
        ]]));
        assert_eq!(
            serde_json::to_value(SendMessage::new(5, &reply)).unwrap()["reply_markup"],
            json!({"keyboard": [[{"text": "USD"}]], "one_time_keyboard": true, "resize_keyboard": true})
        );

        let reply = Reply::text("Done").with_keyboard(Keyboard::Remove);
        assert_eq!(
            serde_json::to_value(SendMessage::new(5, &reply)).unwrap()["reply_markup"],
            json!({"remove_keyboard": true})
        );

        let value = serde_json::to_value(SendMessage::new(5, &Reply::text("Hi"))).unwrap();
        assert!(value.get("reply_markup").is_none());
    }
}
