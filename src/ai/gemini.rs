//! Google Gemini backend for the Quixy analyst.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::parsing::parse_envelope;
use super::types::{ResponseEnvelope, WebSource};
use super::{FinancialModel, GatewayError, GatewayErrorKind, REQUEST_TIMEOUT_SECS, TEMPERATURE};

fn api_url(model: &str, api_key: &str) -> String {
    format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
        model, api_key
    )
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction")]
    system_instruction: SystemInstruction,
    tools: Vec<Tool>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Tool {
    #[serde(rename = "googleSearch")]
    google_search: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "groundingMetadata")]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GroundingMetadata {
    #[serde(rename = "groundingChunks")]
    grounding_chunks: Option<Vec<GroundingChunk>>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

/// Truncate an error body for logging without splitting a UTF-8 sequence.
fn truncate_body(body: &str, max: usize) -> &str {
    if body.len() <= max {
        return body;
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Map a Gemini API error status to a gateway error
fn parse_error(status: u16, body: &str, model: &str) -> GatewayError {
    match status {
        429 => GatewayError::rate_limit(model),
        401 | 403 => GatewayError::invalid_api_key(model),
        500..=599 => GatewayError::server_error(model, &format!("HTTP {}", status)),
        _ => GatewayError::server_error(
            model,
            &format!("HTTP {}: {}", status, truncate_body(body, 200)),
        ),
    }
}

/// Client for the Gemini `generateContent` API.
///
/// Sends the fixed system instruction with the Google Search tool enabled
/// and a hard request deadline. There is no retry loop: a failed call is
/// reported once and retried only when the user asks again.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|e| GatewayError::network(&model, &e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One generateContent round trip, returning a validated envelope.
    async fn generate(&self, prompt: &str) -> Result<ResponseEnvelope, GatewayError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: super::prompts::SYSTEM_INSTRUCTION.to_string(),
                }],
            },
            tools: vec![Tool {
                google_search: serde_json::Map::new(),
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let response = self
            .http
            .post(api_url(&self.model, &self.api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::timeout(&self.model)
                } else if e.is_connect() {
                    GatewayError::network(&self.model, "conexión fallida")
                } else {
                    GatewayError::network(&self.model, &e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &body, &self.model));
        }

        let data: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::malformed_response(&self.model, &e.to_string()))?;

        let candidate = data
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or_else(|| GatewayError::empty_response(&self.model))?;

        let sources = extract_sources(candidate.grounding_metadata.as_ref());

        let text = collect_text(candidate.content);
        if text.trim().is_empty() {
            return Err(GatewayError::empty_response(&self.model));
        }

        debug!(model = %self.model, bytes = text.len(), "received analyst reply");

        let mut envelope = parse_envelope(&text, &self.model)?;
        if !sources.is_empty() {
            envelope.sources = Some(sources);
        }
        Ok(envelope)
    }
}

/// Concatenate the text of every candidate part. With the search tool
/// enabled the model splits one JSON reply across several parts, so reading
/// only the first would truncate it.
fn collect_text(content: Option<CandidateContent>) -> String {
    content
        .and_then(|c| c.parts)
        .map(|parts| {
            parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Web citations from grounding metadata; chunks without a URI are dropped.
fn extract_sources(metadata: Option<&GroundingMetadata>) -> Vec<WebSource> {
    metadata
        .and_then(|m| m.grounding_chunks.as_ref())
        .map(|chunks| {
            chunks
                .iter()
                .filter_map(|chunk| chunk.web.as_ref())
                .filter_map(|web| {
                    web.uri.as_ref().map(|uri| WebSource {
                        uri: uri.clone(),
                        title: web.title.clone().unwrap_or_default(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl FinancialModel for GeminiClient {
    /// Never fails: every error becomes a `general_text` apology the chat
    /// can render directly.
    async fn financial_response(&self, prompt: &str) -> ResponseEnvelope {
        match self.generate(prompt).await {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(model = %self.model, kind = ?err.kind, "analyst request failed: {}", err);
                match err.kind {
                    GatewayErrorKind::MalformedResponse | GatewayErrorKind::MismatchedType => {
                        ResponseEnvelope::general_text(
                            "Recibí un formato de datos inesperado. Por favor, intenta tu solicitud de nuevo.",
                        )
                    }
                    _ => ResponseEnvelope::general_text(format!(
                        "Lo siento, encontré un error: {}",
                        err.message
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_gemini_wire_names() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: "hola".to_string(),
                }],
            }],
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: "instrucciones".to_string(),
                }],
            },
            tools: vec![Tool {
                google_search: serde_json::Map::new(),
            }],
            generation_config: GenerationConfig { temperature: 0.1 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("systemInstruction").is_some());
        assert!(json.get("generationConfig").is_some());
        assert!(json["tools"][0].get("googleSearch").is_some());
        assert_eq!(json["generationConfig"]["temperature"], 0.1);
    }

    #[test]
    fn grounding_chunks_without_uri_are_dropped() {
        let metadata = GroundingMetadata {
            grounding_chunks: Some(vec![
                GroundingChunk {
                    web: Some(WebChunk {
                        uri: Some("https://www.reuters.com/a".to_string()),
                        title: Some("Reuters".to_string()),
                    }),
                },
                GroundingChunk {
                    web: Some(WebChunk {
                        uri: None,
                        title: Some("sin enlace".to_string()),
                    }),
                },
                GroundingChunk { web: None },
            ]),
        };
        let sources = extract_sources(Some(&metadata));
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].uri, "https://www.reuters.com/a");
    }

    #[test]
    fn reply_split_across_parts_is_joined() {
        let content = CandidateContent {
            parts: Some(vec![
                ResponsePart {
                    text: Some("{\"response_type\":\"general_text\",".to_string()),
                },
                ResponsePart { text: None },
                ResponsePart {
                    text: Some("\"conversational_response\":\"Hola.\"}".to_string()),
                },
            ]),
        };
        let text = collect_text(Some(content));
        let envelope: ResponseEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(envelope.conversational_response, "Hola.");

        assert_eq!(collect_text(None), "");
    }

    #[test]
    fn error_body_truncation_respects_char_boundaries() {
        // 300 bytes of 3-byte chars: byte 200 falls inside a char.
        let body = "€".repeat(100);
        let cut = truncate_body(&body, 200);
        assert_eq!(cut.len(), 198);
        assert!(cut.chars().all(|c| c == '€'));
        assert_eq!(truncate_body("corto", 200), "corto");

        // Must not panic while formatting the error message either.
        let err = parse_error(418, &body, "m");
        assert_eq!(err.kind, GatewayErrorKind::ServerError);
    }

    #[test]
    fn error_status_maps_to_kind() {
        assert_eq!(
            parse_error(429, "", "m").kind,
            GatewayErrorKind::RateLimit
        );
        assert_eq!(
            parse_error(401, "", "m").kind,
            GatewayErrorKind::InvalidApiKey
        );
        assert_eq!(
            parse_error(503, "", "m").kind,
            GatewayErrorKind::ServerError
        );
    }
}
