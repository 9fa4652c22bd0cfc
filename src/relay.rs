use crate::config::Config;
use crate::persona::Persona;
use crate::store::{Message, Role};
use anyhow::Result;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::Duration;

/// Message shown instead of raw transport errors; upstream details go to the log.
const SERVICE_ERROR: &str = "Failed to reach the consultation service. Please try again.";

const MISSING_KEY_ERROR: &str = "No API key configured. Set gemini_api_key in config.toml or GEMINI_API_KEY.";

/// Events emitted while a reply is being streamed
#[derive(Debug, Clone)]
pub enum RelayEvent {
    /// Text fragment of the reply, in emission order
    Fragment(String),
    /// Stream finished normally
    Done,
    /// Stream failed; carries a user-safe message
    Failed(String),
}

/// Source of streamed assistant replies.
///
/// Each invocation establishes a fresh one-shot stream; the returned receiver
/// yields fragments in order and ends with exactly one `Done` or `Failed`.
pub trait ReplySource {
    fn stream_reply(&self, prompt: &str, prior_turns: &[Message]) -> mpsc::UnboundedReceiver<RelayEvent>;
}

/// Relay backed by the Google Generative Language streaming API
pub struct GeminiRelay {
    config: Config,
    persona: Persona,
    client: reqwest::Client,
}

impl GeminiRelay {
    pub fn new(config: Config, persona: Persona) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            persona,
            client,
        }
    }
}

impl ReplySource for GeminiRelay {
    fn stream_reply(&self, prompt: &str, prior_turns: &[Message]) -> mpsc::UnboundedReceiver<RelayEvent> {
        let (tx, rx) = mpsc::unbounded_channel();

        let Some(api_key) = self.config.api_key() else {
            let _ = tx.send(RelayEvent::Failed(MISSING_KEY_ERROR.to_string()));
            return rx;
        };

        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.config.base_url, self.config.model, api_key
        );
        let payload = build_payload(&self.persona, prompt, prior_turns);
        let client = self.client.clone();

        tokio::spawn(async move {
            match request_and_stream(client, url, payload, &tx).await {
                Ok(()) => {
                    let _ = tx.send(RelayEvent::Done);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "reply stream failed");
                    let _ = tx.send(RelayEvent::Failed(SERVICE_ERROR.to_string()));
                }
            }
        });

        rx
    }
}

/// Build the request body: persona first, then prior turns, then the prompt.
///
/// The transport is stateless, so prior turns are re-sent on every call.
fn build_payload(persona: &Persona, prompt: &str, prior_turns: &[Message]) -> serde_json::Value {
    let mut contents = Vec::new();

    for message in prior_turns {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "model",
        };
        contents.push(serde_json::json!({
            "role": role,
            "parts": [{"text": message.content}]
        }));
    }

    contents.push(serde_json::json!({
        "role": "user",
        "parts": [{"text": prompt}]
    }));

    serde_json::json!({
        "contents": contents,
        "systemInstruction": {
            "parts": [{"text": persona.system_instruction}]
        },
        "generationConfig": {
            "temperature": persona.temperature,
            "topP": persona.top_p
        }
    })
}

/// Issue the request and forward each SSE fragment as it arrives
async fn request_and_stream(
    client: reqwest::Client,
    url: String,
    payload: serde_json::Value,
    tx: &mpsc::UnboundedSender<RelayEvent>,
) -> Result<()> {
    let response = client
        .post(&url)
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!("Gemini API error ({}): {}", status, error_text));
    }

    let mut stream = response.bytes_stream();
    let mut buffer = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        // Process complete lines
        while let Some(newline_pos) = buffer.find('\n') {
            let line = buffer[..newline_pos].trim().to_string();
            buffer = buffer[newline_pos + 1..].to_string();

            if let Some(text) = fragment_from_sse_line(&line) {
                let _ = tx.send(RelayEvent::Fragment(text));
            }
        }
    }

    // Flush any remaining buffer line (without newline)
    if let Some(text) = fragment_from_sse_line(buffer.trim()) {
        let _ = tx.send(RelayEvent::Fragment(text));
    }

    Ok(())
}

/// Extract the reply text from one SSE data line, if it carries any
fn fragment_from_sse_line(line: &str) -> Option<String> {
    let data = line.strip_prefix("data: ")?;
    if data == "[DONE]" {
        return None;
    }

    let chunk: serde_json::Value = serde_json::from_str(data).ok()?;
    chunk
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(|text| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Message;

    fn sse_line(text: &str) -> String {
        format!(
            r#"data: {{"candidates":[{{"content":{{"parts":[{{"text":"{}"}}],"role":"model"}}}}]}}"#,
            text
        )
    }

    #[test]
    fn extracts_text_from_data_line() {
        assert_eq!(
            fragment_from_sse_line(&sse_line("Hello")),
            Some("Hello".to_string())
        );
    }

    #[test]
    fn ignores_non_data_and_done_lines() {
        assert_eq!(fragment_from_sse_line(""), None);
        assert_eq!(fragment_from_sse_line("event: ping"), None);
        assert_eq!(fragment_from_sse_line("data: [DONE]"), None);
    }

    #[test]
    fn ignores_chunks_without_text() {
        let line = r#"data: {"candidates":[{"finishReason":"STOP"}]}"#;
        assert_eq!(fragment_from_sse_line(line), None);
        assert_eq!(fragment_from_sse_line("data: not-json"), None);
    }

    #[test]
    fn payload_maps_roles_and_appends_prompt_last() {
        let persona = Persona {
            system_instruction: "You are an ophthalmologist.".to_string(),
            temperature: 0.7,
            top_p: 0.95,
        };
        let user = Message::user("My eyes are red");
        let mut reply = Message::assistant_placeholder();
        reply.content = "Redness can have many causes.".to_string();

        let payload = build_payload(&persona, "Should I see a doctor?", &[user, reply]);

        let contents = payload["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[2]["parts"][0]["text"], "Should I see a doctor?");
        assert_eq!(
            payload["systemInstruction"]["parts"][0]["text"],
            "You are an ophthalmologist."
        );
        let top_p = payload["generationConfig"]["topP"].as_f64().unwrap();
        assert!((top_p - 0.95).abs() < 1e-6);
    }
}
