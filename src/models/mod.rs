//! Application domain types: chat messages, saved portfolios, and the
//! persisted dashboard snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai::types::{
    CommoditiesForex, EconomicIndicators, IndexPerformance, LocalMarketResponse, MarketSummary,
    NewsArticle, PortfolioDetails, ResponseEnvelope, ResponseType,
};

/// Version of the persisted snapshot layout. A stored blob with a different
/// version hydrates to defaults instead of being misread.
pub const SCHEMA_VERSION: u32 = 1;

/// Symbols shown in the index ticker strip until the user edits the list.
pub const DEFAULT_TICKER_TAPE: [&str; 8] = [
    "QQQ", "VOO", "ARKK", "BTC-USD", "COLCAP", "NVDA", "GOOGL", "TTWO",
];

const WELCOME_MESSAGE: &str = "¡Hola! Soy Quixy, tu asistente financiero de BrightStone Finance. \
¿Cómo puedo ayudarte hoy? Puedes preguntar sobre una acción como '¿Cómo está TSLA?' o 'Dame un \
análisis de Apple'. También puedes pedirme que cree un portafolio o que busque acciones por ti.";

// ============================================================================
// Chat
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// One entry in the append-only chat log. Messages are addressed by `id`, so
/// a loading placeholder can be resolved in place no matter what else was
/// appended in the meantime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ResponseEnvelope>,
    #[serde(default)]
    pub is_loading: bool,
}

impl Message {
    pub fn from_user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::User,
            text: Some(text.into()),
            analysis: None,
            is_loading: false,
        }
    }

    pub fn bot_loading() -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::Bot,
            text: None,
            analysis: None,
            is_loading: true,
        }
    }

    pub fn from_bot(analysis: ResponseEnvelope) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::Bot,
            text: None,
            analysis: Some(analysis),
            is_loading: false,
        }
    }
}

// ============================================================================
// Saved Portfolios
// ============================================================================

/// A model-proposed portfolio the user chose to keep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPortfolio {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub details: PortfolioDetails,
}

impl SavedPortfolio {
    /// Wrap freshly proposed details under a user-chosen display name. An
    /// empty name keeps the strategy's own name.
    pub fn new(details: PortfolioDetails, name: &str) -> Self {
        let name = if name.trim().is_empty() {
            details.strategy_name.clone()
        } else {
            name.trim().to_string()
        };
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            name,
            details,
        }
    }
}

// ============================================================================
// Persisted Snapshot
// ============================================================================

/// Everything the dashboard persists between sessions: the chat log, saved
/// portfolios, the last good copy of each view's data, and the ticker list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppData {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub chat_history: Vec<Message>,
    #[serde(default)]
    pub portfolios: Vec<SavedPortfolio>,
    #[serde(default)]
    pub market_summary: Option<MarketSummary>,
    #[serde(default)]
    pub index_performance: Option<Vec<IndexPerformance>>,
    #[serde(default)]
    pub commodities_forex: Option<CommoditiesForex>,
    #[serde(default)]
    pub economic_indicators: Option<EconomicIndicators>,
    #[serde(default)]
    pub news: Option<Vec<NewsArticle>>,
    #[serde(default)]
    pub local_market: Option<LocalMarketResponse>,
    #[serde(default)]
    pub ticker_tape: Vec<String>,
}

impl Default for AppData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            chat_history: vec![Message::from_bot(ResponseEnvelope::general_text(
                WELCOME_MESSAGE,
            ))],
            portfolios: Vec::new(),
            market_summary: None,
            index_performance: None,
            commodities_forex: None,
            economic_indicators: None,
            news: None,
            local_market: None,
            ticker_tape: DEFAULT_TICKER_TAPE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ============================================================================
// Dashboard Views
// ============================================================================

/// The refreshable dashboard views, each owning one cached data slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardView {
    Market,
    CommoditiesForex,
    Indicators,
    News,
    LocalMarket,
}

impl DashboardView {
    pub const ALL: [DashboardView; 5] = [
        DashboardView::Market,
        DashboardView::CommoditiesForex,
        DashboardView::Indicators,
        DashboardView::News,
        DashboardView::LocalMarket,
    ];

    /// The `response_type` a refresh of this view must come back with; any
    /// other reply leaves the cached slice untouched.
    pub fn expected_response_type(&self) -> ResponseType {
        match self {
            DashboardView::Market => ResponseType::MarketSummary,
            DashboardView::CommoditiesForex => ResponseType::CommoditiesForex,
            DashboardView::Indicators => ResponseType::EconomicIndicators,
            DashboardView::News => ResponseType::News,
            DashboardView::LocalMarket => ResponseType::LocalMarketSummary,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardView::Market => "market",
            DashboardView::CommoditiesForex => "commodities_forex",
            DashboardView::Indicators => "indicators",
            DashboardView::News => "news",
            DashboardView::LocalMarket => "local_market",
        }
    }
}

impl std::fmt::Display for DashboardView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-view in-flight flags, plus the ticker strip.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadingStates {
    pub market: bool,
    pub ticker: bool,
    pub commodities_forex: bool,
    pub indicators: bool,
    pub news: bool,
    pub local_market: bool,
}

impl LoadingStates {
    pub fn is_loading(&self, view: DashboardView) -> bool {
        match view {
            DashboardView::Market => self.market,
            DashboardView::CommoditiesForex => self.commodities_forex,
            DashboardView::Indicators => self.indicators,
            DashboardView::News => self.news,
            DashboardView::LocalMarket => self.local_market,
        }
    }

    pub fn set(&mut self, view: DashboardView, value: bool) {
        match view {
            DashboardView::Market => self.market = value,
            DashboardView::CommoditiesForex => self.commodities_forex = value,
            DashboardView::Indicators => self.indicators = value,
            DashboardView::News => self.news = value,
            DashboardView::LocalMarket => self.local_market = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_seeds_welcome_message() {
        let data = AppData::default();
        assert_eq!(data.schema_version, SCHEMA_VERSION);
        assert_eq!(data.chat_history.len(), 1);
        let first = &data.chat_history[0];
        assert_eq!(first.sender, Sender::Bot);
        let analysis = first.analysis.as_ref().unwrap();
        assert!(analysis.conversational_response.contains("Quixy"));
        assert_eq!(data.ticker_tape.len(), 8);
    }

    #[test]
    fn saved_portfolio_falls_back_to_strategy_name() {
        let details: PortfolioDetails = serde_json::from_str(
            r#"{
                "strategy_name": "Crecimiento Moderado",
                "total_capital": 10000.0,
                "risk_level": "Moderado",
                "investment_horizon": "Largo Plazo",
                "strategy_rationale": "Diversificación amplia."
            }"#,
        )
        .unwrap();

        let unnamed = SavedPortfolio::new(details.clone(), "   ");
        assert_eq!(unnamed.name, "Crecimiento Moderado");

        let named = SavedPortfolio::new(details, "Mi plan");
        assert_eq!(named.name, "Mi plan");
    }

    #[test]
    fn every_view_maps_to_a_distinct_response_type() {
        let mut seen = std::collections::HashSet::new();
        for view in DashboardView::ALL {
            assert!(seen.insert(view.expected_response_type()));
        }
    }
}
