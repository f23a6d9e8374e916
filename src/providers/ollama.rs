use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::history::Message;
use crate::providers::http_errors::request_error;

#[derive(Debug, Serialize)]
struct ChatRequestBody {
    model: String,
    stream: bool,
    messages: Vec<WireMessage>,
    options: SamplingOptions,
}

#[derive(Debug, Serialize)]
struct SamplingOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: String,
}

#[derive(Debug, Serialize)]
struct ShowRequestBody {
    model: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponseBody {
    #[serde(default)]
    models: Vec<TagEntry>,
}

/// Older servers expose the model identifier as `name`, newer ones as
/// `model`; accept either.
#[derive(Debug, Deserialize)]
struct TagEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

fn chat_url(base_url: &str) -> String {
    format!("{}/api/chat", base_url.trim_end_matches('/'))
}

fn show_url(base_url: &str) -> String {
    format!("{}/api/show", base_url.trim_end_matches('/'))
}

fn tags_url(base_url: &str) -> String {
    format!("{}/api/tags", base_url.trim_end_matches('/'))
}

fn build_wire_messages(settings: &Settings, messages: &[Message]) -> Vec<WireMessage> {
    let mut wire = Vec::with_capacity(messages.len() + 1);
    if !settings.system_prompt.trim().is_empty() {
        wire.push(WireMessage {
            role: "system".to_string(),
            content: settings.system_prompt.clone(),
        });
    }
    wire.extend(messages.iter().map(|msg| WireMessage {
        role: msg.role.as_str().to_string(),
        content: msg.content.clone(),
    }));
    wire
}

/// Ollama answers 404 on `/api/chat` when the model is not installed.
fn status_error(status: StatusCode, body: String, settings: &Settings) -> Error {
    if status == StatusCode::NOT_FOUND {
        return Error::ModelNotFound {
            model: settings.model.clone(),
            endpoint: settings.base_url.clone(),
        };
    }
    Error::UnexpectedResponse(format!("status {status}: {body}"))
}

pub async fn chat(client: &Client, settings: &Settings, messages: &[Message]) -> Result<String> {
    let api_url = chat_url(&settings.base_url);
    let body = ChatRequestBody {
        model: settings.model.clone(),
        stream: false,
        messages: build_wire_messages(settings, messages),
        options: SamplingOptions {
            temperature: settings.temperature,
            top_p: settings.top_p,
        },
    };
    debug!(
        api_url = %api_url,
        model = %settings.model,
        message_count = body.messages.len(),
        "sending ollama chat request"
    );

    let response = client
        .post(&api_url)
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(
                api_url = %api_url,
                model = %settings.model,
                error = %err,
                "ollama request failed"
            );
            request_error(err, &settings.base_url, settings.timeout_secs)
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let response_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string());
        warn!(
            api_url = %api_url,
            model = %settings.model,
            status = %status,
            response_body_len = response_body.len(),
            "ollama returned non-success status"
        );
        return Err(status_error(status, response_body, settings));
    }

    let parsed: ChatResponseBody = response
        .json()
        .await
        .map_err(|err| Error::UnexpectedResponse(format!("undecodable chat response: {err}")))?;
    debug!(
        model = %settings.model,
        response_len = parsed.message.content.len(),
        "received ollama chat response"
    );
    Ok(parsed.message.content)
}

/// Startup availability probe: ask the server about the configured model
/// directly, falling back to a scan of the installed-model list on servers
/// that do not answer `/api/show` for it.
pub async fn check_model(client: &Client, settings: &Settings) -> Result<()> {
    let api_url = show_url(&settings.base_url);
    let response = client
        .post(&api_url)
        .json(&ShowRequestBody {
            model: settings.model.clone(),
        })
        .send()
        .await
        .map_err(|err| request_error(err, &settings.base_url, settings.timeout_secs))?;

    let status = response.status();
    if status.is_success() {
        debug!(model = %settings.model, "model is available");
        return Ok(());
    }
    if status != StatusCode::NOT_FOUND {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, body, settings));
    }

    let tags_api_url = tags_url(&settings.base_url);
    let response = client
        .get(&tags_api_url)
        .send()
        .await
        .map_err(|err| request_error(err, &settings.base_url, settings.timeout_secs))?;
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, body, settings));
    }

    let tags: TagsResponseBody = response
        .json()
        .await
        .map_err(|err| Error::UnexpectedResponse(format!("undecodable tags response: {err}")))?;
    if model_in_tags(&tags, &settings.model) {
        debug!(model = %settings.model, "model found in installed-model list");
        Ok(())
    } else {
        warn!(model = %settings.model, installed = tags.models.len(), "model not installed");
        Err(Error::ModelNotFound {
            model: settings.model.clone(),
            endpoint: settings.base_url.clone(),
        })
    }
}

fn model_in_tags(tags: &TagsResponseBody, model: &str) -> bool {
    tags.models.iter().any(|entry| {
        entry.name.as_deref() == Some(model) || entry.model.as_deref() == Some(model)
    })
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::{
        TagsResponseBody, build_wire_messages, chat_url, model_in_tags, show_url, status_error,
        tags_url,
    };
    use crate::config::Settings;
    use crate::error::Error;
    use crate::history::Message;

    fn test_settings() -> Settings {
        Settings {
            model: "qwen2.5:3b".to_string(),
            base_url: "http://localhost:11434".to_string(),
            system_prompt: "You are a helpful assistant.".to_string(),
            temperature: 0.7,
            top_p: 0.9,
            timeout_secs: 60,
            max_history_messages: 20,
            memory_window: 6,
            langsmith: None,
        }
    }

    #[test]
    fn chat_url_trims_trailing_slash() {
        assert_eq!(
            chat_url("http://localhost:11434/"),
            "http://localhost:11434/api/chat"
        );
        assert_eq!(
            show_url("http://localhost:11434"),
            "http://localhost:11434/api/show"
        );
        assert_eq!(
            tags_url("http://localhost:11434/"),
            "http://localhost:11434/api/tags"
        );
    }

    #[test]
    fn wire_messages_put_system_prompt_first() {
        let settings = test_settings();
        let wire = build_wire_messages(
            &settings,
            &[Message::user("hi"), Message::assistant("hello")],
        );

        assert_eq!(wire.len(), 3);
        assert_eq!(wire[0].role, "system");
        assert_eq!(wire[0].content, settings.system_prompt);
        assert_eq!(wire[1].role, "user");
        assert_eq!(wire[2].role, "assistant");
    }

    #[test]
    fn blank_system_prompt_is_omitted() {
        let mut settings = test_settings();
        settings.system_prompt = "   ".to_string();
        let wire = build_wire_messages(&settings, &[Message::user("hi")]);
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].role, "user");
    }

    #[test]
    fn chat_request_serializes_model_options_and_no_streaming() {
        let settings = test_settings();
        let body = super::ChatRequestBody {
            model: settings.model.clone(),
            stream: false,
            messages: build_wire_messages(&settings, &[Message::user("hi")]),
            options: super::SamplingOptions {
                temperature: settings.temperature,
                top_p: settings.top_p,
            },
        };

        let value = serde_json::to_value(&body).expect("body should serialize");
        assert_eq!(value["model"], "qwen2.5:3b");
        assert_eq!(value["stream"], false);
        assert_eq!(value["options"]["temperature"], 0.7f32);
        assert_eq!(value["options"]["top_p"], 0.9f32);
        assert_eq!(value["messages"][0]["role"], "system");
    }

    #[test]
    fn not_found_status_maps_to_model_not_found() {
        let settings = test_settings();
        let err = status_error(StatusCode::NOT_FOUND, "model not found".to_string(), &settings);
        match err {
            Error::ModelNotFound { model, endpoint } => {
                assert_eq!(model, "qwen2.5:3b");
                assert_eq!(endpoint, "http://localhost:11434");
            }
            other => panic!("expected ModelNotFound, got {other:?}"),
        }
    }

    #[test]
    fn other_statuses_map_to_unexpected_response() {
        let settings = test_settings();
        let err = status_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "boom".to_string(),
            &settings,
        );
        match err {
            Error::UnexpectedResponse(detail) => {
                assert!(detail.contains("500"), "got: {detail}");
                assert!(detail.contains("boom"), "got: {detail}");
            }
            other => panic!("expected UnexpectedResponse, got {other:?}"),
        }
    }

    #[test]
    fn model_in_tags_accepts_name_and_model_keys() {
        let tags: TagsResponseBody = serde_json::from_value(json!({
            "models": [
                {"name": "llama3.2:1b"},
                {"model": "qwen2.5:3b"},
            ]
        }))
        .expect("tags should parse");

        assert!(model_in_tags(&tags, "qwen2.5:3b"));
        assert!(model_in_tags(&tags, "llama3.2:1b"));
        assert!(!model_in_tags(&tags, "missing:7b"));
    }

    #[test]
    fn empty_tags_body_parses_to_no_models() {
        let tags: TagsResponseBody =
            serde_json::from_value(json!({})).expect("empty tags should parse");
        assert!(!model_in_tags(&tags, "qwen2.5:3b"));
    }
}
