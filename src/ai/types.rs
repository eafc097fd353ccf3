//! Wire types for the Quixy financial analyst backend.
//!
//! These structs mirror the JSON contract the model is instructed to follow:
//! a single envelope tagged by `response_type`, carrying a conversational
//! narrative plus at most one structured payload, optional chart descriptors
//! and optional web-search citations. Field names are the authoritative
//! external names and must not be renamed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Response Envelope
// ============================================================================

/// The nine intents the model may answer with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    StockAnalysis,
    PortfolioCreation,
    MarketSummary,
    StockScreener,
    EconomicIndicators,
    CommoditiesForex,
    LocalMarketSummary,
    News,
    GeneralText,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::StockAnalysis => "stock_analysis",
            ResponseType::PortfolioCreation => "portfolio_creation",
            ResponseType::MarketSummary => "market_summary",
            ResponseType::StockScreener => "stock_screener",
            ResponseType::EconomicIndicators => "economic_indicators",
            ResponseType::CommoditiesForex => "commodities_forex",
            ResponseType::LocalMarketSummary => "local_market_summary",
            ResponseType::News => "news",
            ResponseType::GeneralText => "general_text",
        }
    }
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level response object returned by the gateway.
///
/// Exactly one variant payload is expected to be populated, selected by
/// `response_type`; `general_text` carries none. `charts` and `sources` may
/// accompany any variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub response_type: ResponseType,
    pub conversational_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_analysis: Option<StockAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_details: Option<PortfolioDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_summary: Option<MarketSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screener_results: Option<StockScreenerResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub economic_indicators: Option<EconomicIndicators>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commodities_forex: Option<CommoditiesForex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_market_summary: Option<LocalMarketResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charts: Option<Vec<Chart>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news: Option<Vec<NewsArticle>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<WebSource>>,
}

impl ResponseEnvelope {
    /// Build a bare `general_text` envelope carrying only a narrative.
    pub fn general_text(narrative: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::GeneralText,
            conversational_response: narrative.into(),
            stock_analysis: None,
            portfolio_details: None,
            market_summary: None,
            screener_results: None,
            economic_indicators: None,
            commodities_forex: None,
            local_market_summary: None,
            charts: None,
            news: None,
            sources: None,
        }
    }

    /// Whether the payload slot selected by the declared `response_type` is
    /// actually populated. The `news` list doubles as the variant payload for
    /// the news intent; `general_text` needs nothing beyond the narrative.
    pub fn has_declared_payload(&self) -> bool {
        match self.response_type {
            ResponseType::StockAnalysis => self.stock_analysis.is_some(),
            ResponseType::PortfolioCreation => self.portfolio_details.is_some(),
            ResponseType::MarketSummary => self.market_summary.is_some(),
            ResponseType::StockScreener => self.screener_results.is_some(),
            ResponseType::EconomicIndicators => self.economic_indicators.is_some(),
            ResponseType::CommoditiesForex => self.commodities_forex.is_some(),
            ResponseType::LocalMarketSummary => self.local_market_summary.is_some(),
            ResponseType::News => self.news.is_some(),
            ResponseType::GeneralText => true,
        }
    }
}

/// A web-search grounding citation attached by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebSource {
    pub uri: String,
    pub title: String,
}

// ============================================================================
// Variant Payloads
// ============================================================================

/// A named metric with a plain-language explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyMetric {
    pub name: String,
    pub value: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAnalysis {
    pub company_name: String,
    pub ticker: String,
    pub current_price: f64,
    pub price_change: f64,
    pub change_percentage: f64,
    /// "Buy" | "Sell" | "Hold" — left as free text, the model occasionally
    /// localizes it.
    pub recommendation: String,
    pub price_target: f64,
    pub summary: String,
    pub market_sentiment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_metrics: Option<Vec<KeyMetric>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_highlights: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_analysis: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_analysis: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioAsset {
    pub company_name: String,
    pub ticker: String,
    pub allocation_percentage: f64,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalPerformance {
    pub one_year: String,
    pub three_year_annualized: String,
    pub five_year_annualized: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAnalysis {
    pub beta: String,
    pub standard_deviation: String,
    pub summary: String,
}

/// A model-proposed portfolio. Allocation percentages are instructed to sum
/// to 100 but that is never enforced on this side of the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioDetails {
    pub strategy_name: String,
    pub total_capital: f64,
    pub risk_level: String,
    pub investment_horizon: String,
    pub strategy_rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<PortfolioAsset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversational_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_annual_return: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_performance: Option<HistoricalPerformance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_analysis: Option<RiskAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charts: Option<Vec<Chart>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexPerformance {
    pub index_name: String,
    pub value: String,
    pub change: String,
    pub change_percentage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketMover {
    pub ticker: String,
    pub company_name: String,
    pub price: String,
    pub change: String,
    pub change_percentage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorSnapshot {
    pub sector_name: String,
    pub change_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicEvent {
    pub event_name: String,
    pub date: String,
    pub impact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSummary {
    pub market_sentiment: String,
    pub summary_text: String,
    #[serde(default)]
    pub index_performance: Vec<IndexPerformance>,
    #[serde(default)]
    pub top_gainers: Vec<MarketMover>,
    #[serde(default)]
    pub top_losers: Vec<MarketMover>,
    #[serde(default)]
    pub sector_performance: Vec<SectorSnapshot>,
    #[serde(default)]
    pub economic_calendar: Vec<EconomicEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversational_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news: Option<Vec<NewsArticle>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalMarketMover {
    pub ticker: String,
    pub company_name: String,
    pub price: String,
    pub change_percentage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalMarketSummary {
    pub market_sentiment: String,
    pub summary_text: String,
    pub colcap_performance: IndexPerformance,
    #[serde(default)]
    pub key_stocks: Vec<LocalMarketMover>,
    #[serde(default)]
    pub news: Vec<NewsArticle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalMarketResponse {
    pub summary: LocalMarketSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversational_response: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerStock {
    pub company_name: String,
    pub ticker: String,
    pub current_price: f64,
    pub justification: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_metrics: Option<Vec<KeyMetric>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockScreenerResult {
    pub query_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<ScreenerStock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charts: Option<Vec<Chart>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversational_response: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicIndicator {
    pub name: String,
    pub value: String,
    pub trend: String,
    pub period: String,
    pub interpretation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicIndicators {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<Vec<EconomicIndicator>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversational_response: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commodity {
    pub name: String,
    pub price: String,
    pub change: String,
    pub change_percentage: String,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForexPair {
    pub pair: String,
    pub rate: String,
    pub change: String,
    pub change_percentage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommoditiesForex {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commodities: Option<Vec<Commodity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forex_pairs: Option<Vec<ForexPair>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversational_response: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub uri: String,
    pub title: String,
    pub source: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

// ============================================================================
// Chart Descriptors
// ============================================================================

/// Chart shape requested by the model. `Radar` is part of the contract but
/// has no rendering; the adapter reports it as unsupported.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Composed,
    Line,
    Bar,
    Radar,
}

/// One series declaration: the row field to read, the display name shown in
/// legends/tooltips, and a suggested color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartDataKey {
    pub key: String,
    pub name: String,
    pub color: String,
}

/// A single data row. `name` is the X-axis label; every other field is a
/// series value addressed through `ChartDataKey::key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartRow {
    pub name: String,
    #[serde(flatten)]
    pub values: HashMap<String, serde_json::Value>,
}

impl ChartRow {
    /// Numeric value of a series field, if present and numeric.
    pub fn value(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(|v| v.as_f64())
    }
}

/// Chart data: either one flat row sequence or one sequence per timeframe
/// label.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartData {
    Rows(Vec<ChartRow>),
    Timeframes(HashMap<String, Vec<ChartRow>>),
}

/// A chart descriptor as produced by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chart {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframes: Option<Vec<String>>,
    pub data: ChartData,
    #[serde(rename = "dataKeys")]
    pub data_keys: Vec<ChartDataKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_roundtrips_with_external_field_names() {
        let json = r#"{
            "response_type": "commodities_forex",
            "conversational_response": "Panorama actual.",
            "commodities_forex": {
                "summary": "Mercados mixtos.",
                "commodities": [
                    { "name": "Oro", "price": "2,350.50", "change": "+10.20",
                      "change_percentage": "+0.44%", "unit": "USD/oz" }
                ],
                "forex_pairs": [
                    { "pair": "EUR/USD", "rate": "1.0855", "change": "-0.0010",
                      "change_percentage": "-0.09%" }
                ]
            }
        }"#;
        let envelope: ResponseEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.response_type, ResponseType::CommoditiesForex);
        assert!(envelope.has_declared_payload());
        let cf = envelope.commodities_forex.as_ref().unwrap();
        assert_eq!(cf.commodities.as_ref().unwrap()[0].name, "Oro");
        assert_eq!(cf.forex_pairs.as_ref().unwrap()[0].pair, "EUR/USD");
    }

    #[test]
    fn chart_parses_timeframe_mapping_and_flat_rows() {
        let json = r##"{
            "type": "composed",
            "title": "Historial de Precios y Volumen",
            "timeframes": ["30D", "1Y"],
            "data": {
                "30D": [{ "name": "2026-08-01", "Precio": 145.6, "Volumen": 50000000 }],
                "1Y": [{ "name": "2025-09-01", "Precio": 120.8, "Volumen": 70000000 }]
            },
            "dataKeys": [
                { "key": "Precio", "name": "Precio", "color": "#3b82f6" },
                { "key": "Volumen", "name": "Volumen", "color": "#4B5563" }
            ]
        }"##;
        let chart: Chart = serde_json::from_str(json).unwrap();
        assert_eq!(chart.kind, ChartKind::Composed);
        match &chart.data {
            ChartData::Timeframes(map) => {
                let rows = &map["30D"];
                assert_eq!(rows[0].value("Precio"), Some(145.6));
                assert_eq!(rows[0].value("Volumen"), Some(50_000_000.0));
            }
            ChartData::Rows(_) => panic!("expected timeframe mapping"),
        }

        let flat = r##"{
            "type": "bar",
            "title": "Sectores",
            "data": [{ "name": "Tecnología", "Cambio": 1.25 }],
            "dataKeys": [{ "key": "Cambio", "name": "Cambio", "color": "#22c55e" }]
        }"##;
        let chart: Chart = serde_json::from_str(flat).unwrap();
        match &chart.data {
            ChartData::Rows(rows) => assert_eq!(rows[0].value("Cambio"), Some(1.25)),
            ChartData::Timeframes(_) => panic!("expected flat rows"),
        }
    }

    #[test]
    fn missing_declared_payload_is_detected() {
        let json = r#"{
            "response_type": "market_summary",
            "conversational_response": "Sin datos."
        }"#;
        let envelope: ResponseEnvelope = serde_json::from_str(json).unwrap();
        assert!(!envelope.has_declared_payload());
    }
}
