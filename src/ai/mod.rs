//! Quixy response gateway.
//!
//! Talks to the Gemini `generateContent` API and turns raw model output into
//! validated [`types::ResponseEnvelope`] values. The public entry point never
//! fails: transport and format problems become apologetic `general_text`
//! envelopes so the chat surface always has something to render.

pub mod gemini;
pub mod parsing;
pub mod prompts;
pub mod types;

use async_trait::async_trait;

use types::ResponseEnvelope;

// ============================================================================
// Structured Gateway Errors
// ============================================================================

/// Types of gateway errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// Network/connection error
    Network,
    /// Request deadline exceeded
    Timeout,
    /// The model returned no text at all
    EmptyResponse,
    /// Invalid or expired API key
    InvalidApiKey,
    /// Rate limit exceeded
    RateLimit,
    /// Server error on the provider side
    ServerError,
    /// Response text was not valid JSON
    MalformedResponse,
    /// Valid JSON, but the declared `response_type` has no matching payload
    MismatchedType,
}

/// Structured gateway error with details
#[derive(Debug, Clone)]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
    pub model: String,
}

impl GatewayError {
    pub fn network(model: &str, details: &str) -> Self {
        Self {
            kind: GatewayErrorKind::Network,
            message: format!("Error de red: {}", details),
            model: model.to_string(),
        }
    }

    pub fn timeout(model: &str) -> Self {
        Self {
            kind: GatewayErrorKind::Timeout,
            message: "La solicitud excedió el tiempo de espera.".to_string(),
            model: model.to_string(),
        }
    }

    pub fn empty_response(model: &str) -> Self {
        Self {
            kind: GatewayErrorKind::EmptyResponse,
            message: "El modelo no devolvió ninguna respuesta.".to_string(),
            model: model.to_string(),
        }
    }

    pub fn invalid_api_key(model: &str) -> Self {
        Self {
            kind: GatewayErrorKind::InvalidApiKey,
            message: "Clave de API inválida. Verifica tu configuración.".to_string(),
            model: model.to_string(),
        }
    }

    pub fn rate_limit(model: &str) -> Self {
        Self {
            kind: GatewayErrorKind::RateLimit,
            message: "Demasiadas solicitudes. Espera un momento.".to_string(),
            model: model.to_string(),
        }
    }

    pub fn server_error(model: &str, details: &str) -> Self {
        Self {
            kind: GatewayErrorKind::ServerError,
            message: format!("Error del servidor: {}", details),
            model: model.to_string(),
        }
    }

    pub fn malformed_response(model: &str, details: &str) -> Self {
        Self {
            kind: GatewayErrorKind::MalformedResponse,
            message: format!("Respuesta con formato inesperado: {}", details),
            model: model.to_string(),
        }
    }

    pub fn mismatched_type(model: &str, declared: types::ResponseType) -> Self {
        Self {
            kind: GatewayErrorKind::MismatchedType,
            message: format!(
                "La respuesta declara '{}' pero no incluye esos datos.",
                declared
            ),
            model: model.to_string(),
        }
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GatewayError {}

// ============================================================================
// Request Configuration Constants
// ============================================================================

/// Request timeout in seconds. Every outbound call carries this deadline;
/// retries are always explicit user actions, never automatic.
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Sampling temperature. Kept low: the model must emit strict JSON.
pub const TEMPERATURE: f64 = 0.1;

// ============================================================================
// Backend Seam
// ============================================================================

/// The seam between the state store and the analyst backend. The store only
/// depends on this trait, so tests can swap in scripted backends.
#[async_trait]
pub trait FinancialModel: Send + Sync {
    /// Answer a user prompt. Infallible by contract: implementations fold
    /// every failure into a `general_text` envelope.
    async fn financial_response(&self, prompt: &str) -> ResponseEnvelope;
}
