//! Parsing and validation of raw model output.
//!
//! The model is instructed to answer with exactly one JSON object but will
//! occasionally wrap it in a markdown code fence. Parsing strips the fence,
//! deserializes, validates that the declared `response_type` actually carries
//! its payload, and then copies the top-level narrative into the nested
//! payload so every view has the text close at hand.

use super::types::ResponseEnvelope;
use super::GatewayError;

/// Extract the JSON body from raw model text.
///
/// Handles ```` ```json ... ``` ```` and bare ```` ``` ... ``` ```` fences;
/// anything else is returned trimmed as-is.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        // Skip an optional language tag on the fence line.
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }
    trimmed
}

/// Parse raw model text into a validated [`ResponseEnvelope`].
///
/// Rejects text that is not valid JSON for the envelope shape, and envelopes
/// whose declared `response_type` has no matching payload. On success the
/// top-level narrative is mirrored into the populated payload.
pub fn parse_envelope(text: &str, model: &str) -> Result<ResponseEnvelope, GatewayError> {
    let json = extract_json(text);
    let mut envelope: ResponseEnvelope = serde_json::from_str(json)
        .map_err(|e| GatewayError::malformed_response(model, &e.to_string()))?;

    if !envelope.has_declared_payload() {
        return Err(GatewayError::mismatched_type(model, envelope.response_type));
    }

    propagate_narrative(&mut envelope);
    Ok(envelope)
}

/// Copy `conversational_response` into whichever nested payload carries its
/// own narrative slot. Views render the payload alone, so the text has to
/// travel with it.
pub fn propagate_narrative(envelope: &mut ResponseEnvelope) {
    if envelope.conversational_response.is_empty() {
        return;
    }
    let narrative = envelope.conversational_response.clone();

    if let Some(details) = envelope.portfolio_details.as_mut() {
        details.conversational_response = Some(narrative.clone());
    }
    if let Some(summary) = envelope.market_summary.as_mut() {
        summary.conversational_response = Some(narrative.clone());
    }
    if let Some(results) = envelope.screener_results.as_mut() {
        results.conversational_response = Some(narrative.clone());
    }
    if let Some(indicators) = envelope.economic_indicators.as_mut() {
        indicators.conversational_response = Some(narrative.clone());
    }
    if let Some(cf) = envelope.commodities_forex.as_mut() {
        cf.conversational_response = Some(narrative.clone());
    }
    if let Some(local) = envelope.local_market_summary.as_mut() {
        local.conversational_response = Some(narrative);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::ResponseType;

    const GENERAL: &str =
        r#"{"response_type":"general_text","conversational_response":"Hola."}"#;

    #[test]
    fn extracts_from_json_fence() {
        let wrapped = format!("```json\n{}\n```", GENERAL);
        assert_eq!(extract_json(&wrapped), GENERAL);
    }

    #[test]
    fn extracts_from_anonymous_fence() {
        let wrapped = format!("```\n{}\n```", GENERAL);
        assert_eq!(extract_json(&wrapped), GENERAL);
    }

    #[test]
    fn bare_json_passes_through_unchanged() {
        assert_eq!(extract_json(GENERAL), GENERAL);
        assert_eq!(extract_json(&format!("  {}  \n", GENERAL)), GENERAL);
    }

    #[test]
    fn fence_with_leading_prose_still_yields_body() {
        let wrapped = format!("Aquí está el análisis:\n```json\n{}\n```", GENERAL);
        assert_eq!(extract_json(&wrapped), GENERAL);
    }

    #[test]
    fn parse_rejects_non_json() {
        let err = parse_envelope("esto no es json", "gemini-2.5-pro").unwrap_err();
        assert_eq!(err.kind, super::super::GatewayErrorKind::MalformedResponse);
    }

    #[test]
    fn parse_rejects_declared_payload_missing() {
        let json = r#"{
            "response_type": "stock_analysis",
            "conversational_response": "Análisis de AAPL."
        }"#;
        let err = parse_envelope(json, "gemini-2.5-pro").unwrap_err();
        assert_eq!(err.kind, super::super::GatewayErrorKind::MismatchedType);
    }

    #[test]
    fn parse_accepts_general_text_without_payload() {
        let envelope = parse_envelope(GENERAL, "gemini-2.5-pro").unwrap();
        assert_eq!(envelope.response_type, ResponseType::GeneralText);
        assert_eq!(envelope.conversational_response, "Hola.");
    }

    #[test]
    fn narrative_is_copied_into_nested_payload() {
        let json = r#"{
            "response_type": "economic_indicators",
            "conversational_response": "Resumen de indicadores.",
            "economic_indicators": { "summary": "Economía estable." }
        }"#;
        let envelope = parse_envelope(json, "gemini-2.5-pro").unwrap();
        let indicators = envelope.economic_indicators.unwrap();
        assert_eq!(
            indicators.conversational_response.as_deref(),
            Some("Resumen de indicadores.")
        );
    }

    #[test]
    fn narrative_is_copied_into_local_market_payload() {
        let json = r#"{
            "response_type": "local_market_summary",
            "conversational_response": "Mercado colombiano hoy.",
            "local_market_summary": {
                "summary": {
                    "market_sentiment": "Neutral",
                    "summary_text": "Sin cambios relevantes.",
                    "colcap_performance": {
                        "index_name": "MSCI COLCAP", "value": "1,380.50",
                        "change": "-5.20", "change_percentage": "-0.38%"
                    },
                    "key_stocks": [],
                    "news": []
                }
            }
        }"#;
        let envelope = parse_envelope(json, "gemini-2.5-pro").unwrap();
        let local = envelope.local_market_summary.unwrap();
        assert_eq!(
            local.conversational_response.as_deref(),
            Some("Mercado colombiano hoy.")
        );
    }
}
