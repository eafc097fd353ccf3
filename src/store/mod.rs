//! Application state store.
//!
//! Owns the persisted dashboard snapshot, the per-view loading flags, and
//! every mutation the UI can perform. The analyst backend is injected as an
//! [`FinancialModel`] trait object so tests run against scripted backends.
//!
//! Locking discipline: the interior mutex is only held for synchronous state
//! edits, never across a backend call. Each refresh records a generation
//! number while holding the lock, awaits the backend unlocked, and re-locks
//! to commit. Only the newest generation for a view commits its result, so
//! overlapping refreshes of one view resolve deterministically.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ai::types::{PortfolioDetails, ResponseEnvelope, ResponseType};
use crate::ai::{prompts, FinancialModel};
use crate::models::{
    AppData, DashboardView, LoadingStates, Message, SavedPortfolio, SCHEMA_VERSION,
};

/// Snapshot filename inside the data directory.
pub const DATA_FILE: &str = "brightstone.json";

struct Inner {
    data: AppData,
    loading: LoadingStates,
    view_generations: HashMap<DashboardView, u64>,
    ticker_generation: u64,
}

pub struct AppStore {
    backend: Arc<dyn FinancialModel>,
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl AppStore {
    /// Hydrate the store from the snapshot file, falling back to the seeded
    /// default when the file is absent, unreadable, or from another schema
    /// version. A persisted but empty chat history is reseeded with the
    /// welcome message.
    pub fn load(path: impl Into<PathBuf>, backend: Arc<dyn FinancialModel>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<AppData>(&raw) {
                Ok(mut data) if data.schema_version == SCHEMA_VERSION => {
                    if data.chat_history.is_empty() {
                        data.chat_history = AppData::default().chat_history;
                    }
                    info!(path = %path.display(), "hydrated snapshot");
                    data
                }
                Ok(data) => {
                    warn!(
                        found = data.schema_version,
                        expected = SCHEMA_VERSION,
                        "snapshot schema version mismatch, starting fresh"
                    );
                    AppData::default()
                }
                Err(e) => {
                    warn!(path = %path.display(), "unreadable snapshot, starting fresh: {}", e);
                    AppData::default()
                }
            },
            Err(_) => AppData::default(),
        };

        Self {
            backend,
            path,
            inner: Mutex::new(Inner {
                data,
                loading: LoadingStates::default(),
                view_generations: HashMap::new(),
                ticker_generation: 0,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone of the current snapshot.
    pub fn snapshot(&self) -> AppData {
        self.inner.lock().expect("store lock poisoned").data.clone()
    }

    pub fn loading(&self) -> LoadingStates {
        self.inner.lock().expect("store lock poisoned").loading
    }

    fn persist_locked(&self, inner: &Inner) {
        match serde_json::to_string_pretty(&inner.data) {
            Ok(json) => {
                if let Some(parent) = self.path.parent() {
                    let _ = std::fs::create_dir_all(parent);
                }
                if let Err(e) = std::fs::write(&self.path, json) {
                    warn!(path = %self.path.display(), "failed to persist snapshot: {}", e);
                }
            }
            Err(e) => warn!("failed to serialize snapshot: {}", e),
        }
    }

    /// Run a synchronous mutation under the lock and persist the result.
    fn mutate<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let result = f(&mut inner);
        self.persist_locked(&inner);
        result
    }

    // ========================================================================
    // Chat
    // ========================================================================

    pub fn set_chat_history(&self, messages: Vec<Message>) {
        self.mutate(|inner| inner.data.chat_history = messages);
    }

    /// Send a user message: the message and a loading placeholder appear in
    /// the log immediately, and the placeholder is resolved by id once the
    /// backend answers. Returns the resolved placeholder id.
    pub async fn send_chat(&self, text: &str) -> Uuid {
        let placeholder = Message::bot_loading();
        let placeholder_id = placeholder.id;
        self.mutate(|inner| {
            inner.data.chat_history.push(Message::from_user(text));
            inner.data.chat_history.push(placeholder);
        });

        let response = self.backend.financial_response(text).await;
        self.resolve_message(placeholder_id, response);
        placeholder_id
    }

    /// Fill in a loading placeholder. A placeholder that was removed in the
    /// meantime (cleared history) is dropped silently.
    pub fn resolve_message(&self, id: Uuid, analysis: ResponseEnvelope) {
        self.mutate(|inner| {
            match inner.data.chat_history.iter_mut().find(|m| m.id == id) {
                Some(message) => {
                    message.analysis = Some(analysis);
                    message.is_loading = false;
                }
                None => debug!(%id, "placeholder vanished before the reply arrived"),
            }
        });
    }

    // ========================================================================
    // Portfolios
    // ========================================================================

    /// Keep a proposed portfolio under a display name. Returns the new id.
    pub fn save_portfolio(&self, details: PortfolioDetails, name: &str) -> Uuid {
        let portfolio = SavedPortfolio::new(details, name);
        let id = portfolio.id;
        self.mutate(|inner| inner.data.portfolios.push(portfolio));
        id
    }

    /// Remove exactly the portfolio with this id, preserving order. Returns
    /// whether anything was removed.
    pub fn delete_portfolio(&self, id: Uuid) -> bool {
        self.mutate(|inner| {
            let before = inner.data.portfolios.len();
            inner.data.portfolios.retain(|p| p.id != id);
            inner.data.portfolios.len() < before
        })
    }

    // ========================================================================
    // View Refresh
    // ========================================================================

    /// Refresh one dashboard view. Marks the view loading, asks the backend
    /// with the view's fixed prompt, and commits the reply into the view's
    /// slice only when it declares the expected `response_type`. When
    /// refreshes of the same view overlap, only the newest one commits.
    pub async fn refresh_view(&self, view: DashboardView) {
        let generation = {
            let mut inner = self.inner.lock().expect("store lock poisoned");
            inner.loading.set(view, true);
            let gen = inner.view_generations.entry(view).or_insert(0);
            *gen += 1;
            *gen
        };

        let response = self
            .backend
            .financial_response(prompts::view_prompt(view))
            .await;

        self.mutate(|inner| {
            if inner.view_generations.get(&view).copied() != Some(generation) {
                debug!(%view, generation, "discarding stale refresh result");
                return;
            }
            inner.loading.set(view, false);

            if response.response_type != view.expected_response_type() {
                warn!(
                    %view,
                    got = %response.response_type,
                    "refresh reply had the wrong response type, keeping cached data"
                );
                return;
            }
            commit_view_slice(&mut inner.data, view, response);
        });
    }

    /// Refresh the index ticker strip. An empty symbol list short-circuits to
    /// an empty strip without a backend call.
    pub async fn refresh_ticker(&self) {
        let (symbols, generation) = {
            let mut inner = self.inner.lock().expect("store lock poisoned");
            if inner.data.ticker_tape.is_empty() {
                inner.data.index_performance = Some(Vec::new());
                self.persist_locked(&inner);
                return;
            }
            inner.loading.ticker = true;
            inner.ticker_generation += 1;
            (inner.data.ticker_tape.clone(), inner.ticker_generation)
        };

        let response = self
            .backend
            .financial_response(&prompts::ticker_prompt(&symbols))
            .await;

        self.mutate(|inner| {
            if inner.ticker_generation != generation {
                return;
            }
            inner.loading.ticker = false;

            let performance = match response.response_type {
                ResponseType::MarketSummary => response
                    .market_summary
                    .map(|s| s.index_performance)
                    .unwrap_or_default(),
                _ => {
                    warn!("ticker reply was not a market summary");
                    Vec::new()
                }
            };
            inner.data.index_performance = Some(performance);
        });
    }

    /// Replace the ticker symbol list; the cached strip data is invalidated
    /// so the next refresh rebuilds it.
    pub fn set_ticker_tape(&self, symbols: Vec<String>) {
        self.mutate(|inner| {
            inner.data.ticker_tape = symbols;
            inner.data.index_performance = None;
        });
    }
}

/// Write a matching reply into the slice a view owns. Callers have already
/// checked the `response_type`.
fn commit_view_slice(data: &mut AppData, view: DashboardView, response: ResponseEnvelope) {
    match view {
        DashboardView::Market => {
            if let Some(summary) = response.market_summary {
                data.market_summary = Some(summary);
            }
        }
        DashboardView::CommoditiesForex => {
            if let Some(cf) = response.commodities_forex {
                data.commodities_forex = Some(cf);
            }
        }
        DashboardView::Indicators => {
            if let Some(indicators) = response.economic_indicators {
                data.economic_indicators = Some(indicators);
            }
        }
        DashboardView::News => {
            if let Some(news) = response.news {
                data.news = Some(news);
            }
        }
        DashboardView::LocalMarket => {
            if let Some(local) = response.local_market_summary {
                data.local_market = Some(local);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::MarketSummary;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::Notify;

    /// Holds one scripted reply until the test releases it, and signals when
    /// the backend has actually been reached.
    #[derive(Clone)]
    struct Gate {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl Gate {
        fn new() -> Self {
            Self {
                started: Arc::new(Notify::new()),
                release: Arc::new(Notify::new()),
            }
        }
    }

    /// Backend that replays scripted envelopes in call order, optionally
    /// gating a reply so tests can interleave refreshes deterministically.
    struct ScriptedModel {
        replies: tokio::sync::Mutex<VecDeque<(Option<Gate>, ResponseEnvelope)>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<(Option<Gate>, ResponseEnvelope)>) -> Self {
            Self {
                replies: tokio::sync::Mutex::new(replies.into()),
            }
        }

        fn always(envelope: ResponseEnvelope, copies: usize) -> Self {
            Self::new(vec![(None, envelope); copies].into_iter().collect())
        }
    }

    #[async_trait]
    impl FinancialModel for ScriptedModel {
        async fn financial_response(&self, _prompt: &str) -> ResponseEnvelope {
            let (gate, reply) = self
                .replies
                .lock()
                .await
                .pop_front()
                .expect("scripted backend ran out of replies");
            if let Some(gate) = gate {
                gate.started.notify_one();
                gate.release.notified().await;
            }
            reply
        }
    }

    fn market_reply(summary_text: &str) -> ResponseEnvelope {
        let summary: MarketSummary = serde_json::from_value(serde_json::json!({
            "market_sentiment": "Alcista",
            "summary_text": summary_text,
            "index_performance": [{
                "index_name": "S&P 500", "value": "5,470.50",
                "change": "+25.10", "change_percentage": "+0.46%"
            }]
        }))
        .unwrap();
        let mut envelope = ResponseEnvelope::general_text("Resumen listo.");
        envelope.response_type = ResponseType::MarketSummary;
        envelope.market_summary = Some(summary);
        envelope
    }

    fn portfolio_details() -> PortfolioDetails {
        serde_json::from_value(serde_json::json!({
            "strategy_name": "Crecimiento",
            "total_capital": 10000.0,
            "risk_level": "Moderado",
            "investment_horizon": "Largo Plazo",
            "strategy_rationale": "Diversificación."
        }))
        .unwrap()
    }

    fn store_at(dir: &tempfile::TempDir, backend: Arc<dyn FinancialModel>) -> AppStore {
        AppStore::load(dir.path().join(DATA_FILE), backend)
    }

    #[tokio::test]
    async fn save_and_delete_portfolio() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(&dir, Arc::new(ScriptedModel::new(vec![])));

        let before = chrono::Utc::now();
        let a = store.save_portfolio(portfolio_details(), "Plan A");
        let b = store.save_portfolio(portfolio_details(), "Plan B");
        let c = store.save_portfolio(portfolio_details(), "Plan C");
        assert_ne!(a, b);
        assert_ne!(b, c);

        let data = store.snapshot();
        assert_eq!(data.portfolios.len(), 3);
        assert!(data.portfolios.iter().all(|p| p.created_at >= before));

        assert!(store.delete_portfolio(b));
        let data = store.snapshot();
        let names: Vec<_> = data.portfolios.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Plan A", "Plan C"]);

        // Deleting again is a no-op.
        assert!(!store.delete_portfolio(b));
        assert_eq!(store.snapshot().portfolios.len(), 2);
    }

    #[tokio::test]
    async fn refresh_commits_matching_reply_and_clears_loading() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(
            &dir,
            Arc::new(ScriptedModel::always(market_reply("Mercado al alza."), 1)),
        );

        store.refresh_view(DashboardView::Market).await;

        assert!(!store.loading().market);
        let summary = store.snapshot().market_summary.unwrap();
        assert_eq!(summary.summary_text, "Mercado al alza.");
    }

    #[tokio::test]
    async fn mismatched_reply_keeps_cached_slice() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(
            &dir,
            Arc::new(ScriptedModel::new(vec![
                (None, market_reply("Primera carga.")),
                (None, ResponseEnvelope::general_text("Lo siento, encontré un error.")),
            ])),
        );

        store.refresh_view(DashboardView::Market).await;
        store.refresh_view(DashboardView::Market).await;

        assert!(!store.loading().market);
        let summary = store.snapshot().market_summary.unwrap();
        assert_eq!(summary.summary_text, "Primera carga.");
    }

    #[tokio::test]
    async fn overlapping_refreshes_commit_only_the_newest() {
        let dir = tempfile::tempdir().unwrap();
        let gate = Gate::new();
        let store = Arc::new(store_at(
            &dir,
            Arc::new(ScriptedModel::new(vec![
                (Some(gate.clone()), market_reply("Respuesta vieja.")),
                (None, market_reply("Respuesta nueva.")),
            ])),
        ));

        let stale = tokio::spawn({
            let store = store.clone();
            async move { store.refresh_view(DashboardView::Market).await }
        });
        // Wait until the first refresh is parked inside the backend.
        gate.started.notified().await;

        store.refresh_view(DashboardView::Market).await;
        assert_eq!(
            store.snapshot().market_summary.unwrap().summary_text,
            "Respuesta nueva."
        );

        gate.release.notify_one();
        stale.await.unwrap();

        // The stale completion must not overwrite the newer data.
        assert_eq!(
            store.snapshot().market_summary.unwrap().summary_text,
            "Respuesta nueva."
        );
        assert!(!store.loading().market);
    }

    #[tokio::test]
    async fn send_chat_resolves_placeholder_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(
            &dir,
            Arc::new(ScriptedModel::always(
                ResponseEnvelope::general_text("TSLA cotiza estable."),
                1,
            )),
        );

        let id = store.send_chat("¿Cómo está TSLA?").await;

        let history = store.snapshot().chat_history;
        // Seeded welcome + user message + resolved placeholder.
        assert_eq!(history.len(), 3);
        let resolved = history.iter().find(|m| m.id == id).unwrap();
        assert!(!resolved.is_loading);
        assert_eq!(
            resolved.analysis.as_ref().unwrap().conversational_response,
            "TSLA cotiza estable."
        );
    }

    #[tokio::test]
    async fn empty_persisted_chat_is_reseeded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DATA_FILE);

        let mut data = AppData::default();
        data.chat_history.clear();
        std::fs::write(&path, serde_json::to_string(&data).unwrap()).unwrap();

        let store = AppStore::load(&path, Arc::new(ScriptedModel::new(vec![])));
        let history = store.snapshot().chat_history;
        assert_eq!(history.len(), 1);
        assert!(history[0]
            .analysis
            .as_ref()
            .unwrap()
            .conversational_response
            .contains("Quixy"));
    }

    #[tokio::test]
    async fn unreadable_snapshot_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DATA_FILE);
        std::fs::write(&path, "{ esto no es json").unwrap();

        let store = AppStore::load(&path, Arc::new(ScriptedModel::new(vec![])));
        let data = store.snapshot();
        assert_eq!(data.chat_history.len(), 1);
        assert!(data.portfolios.is_empty());
    }

    #[tokio::test]
    async fn schema_version_mismatch_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DATA_FILE);

        let mut data = AppData::default();
        data.schema_version = SCHEMA_VERSION + 1;
        data.ticker_tape = vec!["XYZ".to_string()];
        std::fs::write(&path, serde_json::to_string(&data).unwrap()).unwrap();

        let store = AppStore::load(&path, Arc::new(ScriptedModel::new(vec![])));
        assert_eq!(store.snapshot().ticker_tape.len(), 8);
    }

    #[tokio::test]
    async fn mutations_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DATA_FILE);

        let store = AppStore::load(&path, Arc::new(ScriptedModel::new(vec![])));
        let id = store.save_portfolio(portfolio_details(), "Persistente");
        store.set_ticker_tape(vec!["NVDA".to_string()]);
        drop(store);

        let reloaded = AppStore::load(&path, Arc::new(ScriptedModel::new(vec![])));
        let data = reloaded.snapshot();
        assert_eq!(data.portfolios.len(), 1);
        assert_eq!(data.portfolios[0].id, id);
        assert_eq!(data.ticker_tape, ["NVDA"]);
        assert!(data.index_performance.is_none());
    }

    #[tokio::test]
    async fn empty_ticker_tape_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        // No scripted replies: a backend call would panic the test.
        let store = store_at(&dir, Arc::new(ScriptedModel::new(vec![])));
        store.set_ticker_tape(Vec::new());

        store.refresh_ticker().await;

        assert!(store.snapshot().index_performance.unwrap().is_empty());
        assert!(!store.loading().ticker);
    }

    #[tokio::test]
    async fn ticker_refresh_commits_index_performance() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(
            &dir,
            Arc::new(ScriptedModel::always(market_reply("Tickers."), 1)),
        );

        store.refresh_ticker().await;

        let strip = store.snapshot().index_performance.unwrap();
        assert_eq!(strip.len(), 1);
        assert_eq!(strip[0].index_name, "S&P 500");
    }
}
