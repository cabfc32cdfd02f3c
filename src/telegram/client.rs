use super::types::{AnswerCallbackQuery, ApiResponse, GetUpdates, SendMessage, Update};
use crate::conversation::ChatTransport;
use crate::conversation::reply::Reply;
use crate::conversation::session::ChatId;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("fxbot/", env!("CARGO_PKG_VERSION"));

/// Minimal Bot API client. The token is part of every request path, so it
/// is kept out of logs and error messages.
pub struct TelegramClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(base_url: &str, token: &str, poll_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            // long polls hold the connection for up to `poll_timeout`
            .timeout(poll_timeout + Duration::from_secs(10))
            .build()
            .context("Failed to build Telegram HTTP client")?;
        Ok(TelegramClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }

    async fn call<P: Serialize, T: DeserializeOwned>(&self, method: &str, params: &P) -> Result<T> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        debug!(method, "Calling Telegram API");

        let response = self
            .client
            .post(&url)
            .json(params)
            .send()
            .await
            .map_err(|e| anyhow!("Request error calling {}: {}", method, e.without_url()))?;

        let status = response.status();
        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse {} response ({}): {}", method, status, e.without_url()))?;

        if !body.ok {
            return Err(anyhow!(
                "Telegram API error calling {}: {}",
                method,
                body.description.as_deref().unwrap_or("unknown error")
            ));
        }
        body.result
            .ok_or_else(|| anyhow!("Telegram API returned no result for {}", method))
    }

    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: timeout_secs,
                allowed_updates: vec!["message", "callback_query"],
            },
        )
        .await
    }

    pub async fn send_message(&self, chat: ChatId, reply: &Reply) -> Result<()> {
        let _: serde_json::Value = self
            .call("sendMessage", &SendMessage::new(chat, reply))
            .await?;
        Ok(())
    }

    pub async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQuery {
                    callback_query_id: callback_id.to_string(),
                },
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send(&self, chat: ChatId, reply: &Reply) -> Result<()> {
        self.send_message(chat, reply).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::reply::Keyboard;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TelegramClient {
        TelegramClient::new(&server.uri(), "TEST", Duration::from_secs(1)).unwrap()
    }

    #[tokio::test]
    async fn test_send_message_posts_reply() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/sendMessage"))
            .and(body_json(json!({
                "chat_id": 12,
                "text": "1 EUR = 1.08 USD",
                "reply_markup": {"remove_keyboard": true}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true, "result": {"message_id": 1}})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let reply = Reply::text("1 EUR = 1.08 USD").with_keyboard(Keyboard::Remove);
        client(&mock_server).send(12, &reply).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_updates() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [
                    {"update_id": 5, "message": {"message_id": 1, "date": 0, "chat": {"id": 3, "type": "private"}, "text": "/start"}}
                ]
            })))
            .mount(&mock_server)
            .await;

        let updates = client(&mock_server).get_updates(0, 0).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 5);
        assert_eq!(
            updates[0].message.as_ref().unwrap().text.as_deref(),
            Some("/start")
        );
    }

    #[tokio::test]
    async fn test_api_error_hides_token() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/answerCallbackQuery"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: query is too old"
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server).answer_callback("x").await.unwrap_err();
        let message = err.to_string();
        assert_eq!(
            message,
            "Telegram API error calling answerCallbackQuery: Bad Request: query is too old"
        );
        assert!(!message.contains("TEST"));
    }
}
