//! Terminal UI.
//!
//! One `App` value owns all transient screen state (active screen, input
//! line, selections); durable state lives in the [`AppStore`] and is
//! re-read on every draw. Backend calls run in spawned tasks and report
//! back over an mpsc channel so the input loop never blocks on the network.

mod views;

use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::info;

use crate::ai::types::{PortfolioDetails, ResponseEnvelope};
use crate::ai::{prompts, FinancialModel};
use crate::models::DashboardView;
use crate::store::AppStore;

const INPUT_TICK_MS: u64 = 100;

/// Top-level screens reachable from the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Chat,
    Analysis,
    Portfolios,
    Market,
    Indicators,
    CommoditiesForex,
    Screener,
    News,
    LocalMarket,
    Settings,
}

impl Screen {
    pub const ALL: [Screen; 10] = [
        Screen::Chat,
        Screen::Analysis,
        Screen::Portfolios,
        Screen::Market,
        Screen::Indicators,
        Screen::CommoditiesForex,
        Screen::Screener,
        Screen::News,
        Screen::LocalMarket,
        Screen::Settings,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Screen::Chat => "Chat",
            Screen::Analysis => "Análisis",
            Screen::Portfolios => "Portafolios",
            Screen::Market => "Mercado",
            Screen::Indicators => "Indicadores",
            Screen::CommoditiesForex => "Commodities y Divisas",
            Screen::Screener => "Buscador",
            Screen::News => "Noticias",
            Screen::LocalMarket => "Mercado Colombia",
            Screen::Settings => "Ajustes",
        }
    }

    /// The refreshable view behind this screen, if it has one.
    fn dashboard_view(&self) -> Option<DashboardView> {
        match self {
            Screen::Market => Some(DashboardView::Market),
            Screen::Indicators => Some(DashboardView::Indicators),
            Screen::CommoditiesForex => Some(DashboardView::CommoditiesForex),
            Screen::News => Some(DashboardView::News),
            Screen::LocalMarket => Some(DashboardView::LocalMarket),
            _ => None,
        }
    }
}

/// Which widget the text input line currently feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    None,
    Chat,
    Analysis,
    Screener,
    NewPortfolio,
    PortfolioName,
    TickerTape,
}

/// Completions reported by spawned backend tasks.
enum UiEvent {
    /// The store changed; redraw from a fresh snapshot.
    StoreChanged,
    AnalysisReady(Box<ResponseEnvelope>),
    ScreenerResult(Box<ResponseEnvelope>),
    ProposalReady(Box<ResponseEnvelope>),
}

pub struct App {
    store: Arc<AppStore>,
    backend: Arc<dyn FinancialModel>,
    model_name: String,

    screen: Screen,
    input: String,
    input_mode: InputMode,

    analysis_loading: bool,
    analysis: Option<ResponseEnvelope>,

    screener_loading: bool,
    screener_result: Option<ResponseEnvelope>,

    proposal_loading: bool,
    proposal: Option<ResponseEnvelope>,

    selected_portfolio: usize,
    portfolio_detail: bool,
    selected_news: usize,
    /// Index into the active chart's `timeframes`, cycled with `t`.
    timeframe_index: usize,

    events_tx: mpsc::UnboundedSender<UiEvent>,
    events_rx: mpsc::UnboundedReceiver<UiEvent>,
    should_quit: bool,
}

impl App {
    pub fn new(
        store: Arc<AppStore>,
        backend: Arc<dyn FinancialModel>,
        model_name: String,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            store,
            backend,
            model_name,
            screen: Screen::Chat,
            input: String::new(),
            input_mode: InputMode::None,
            analysis_loading: false,
            analysis: None,
            screener_loading: false,
            screener_result: None,
            proposal_loading: false,
            proposal: None,
            selected_portfolio: 0,
            portfolio_detail: false,
            selected_news: 0,
            timeframe_index: 0,
            events_tx,
            events_rx,
            should_quit: false,
        }
    }

    /// Kick off the initial loads the way a first visit would: every empty
    /// view slice and the ticker strip.
    pub fn request_initial_data(&self) {
        let snapshot = self.store.snapshot();
        let mut views = Vec::new();
        if snapshot.market_summary.is_none() {
            views.push(DashboardView::Market);
        }
        if snapshot.commodities_forex.is_none() {
            views.push(DashboardView::CommoditiesForex);
        }
        if snapshot.economic_indicators.is_none() {
            views.push(DashboardView::Indicators);
        }
        if snapshot.news.is_none() {
            views.push(DashboardView::News);
        }
        if snapshot.local_market.is_none() {
            views.push(DashboardView::LocalMarket);
        }
        for view in views {
            self.spawn_refresh(view);
        }
        if snapshot.index_performance.is_none() {
            self.spawn_ticker_refresh();
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ratatui::init();
        let mut input_tick =
            tokio::time::interval(std::time::Duration::from_millis(INPUT_TICK_MS));

        let result = loop {
            tokio::select! {
                _ = input_tick.tick() => {
                    if let Err(e) = self.poll_input() {
                        break Err(e);
                    }
                    if self.should_quit {
                        break Ok(());
                    }
                    if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                        break Err(e.into());
                    }
                }
                Some(event) = self.events_rx.recv() => {
                    self.apply_event(event);
                    if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                        break Err(e.into());
                    }
                }
            }
        };

        ratatui::restore();
        result
    }

    fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::StoreChanged => {}
            UiEvent::AnalysisReady(envelope) => {
                self.analysis_loading = false;
                self.analysis = Some(*envelope);
                self.timeframe_index = 0;
            }
            UiEvent::ScreenerResult(envelope) => {
                self.screener_loading = false;
                self.screener_result = Some(*envelope);
                self.timeframe_index = 0;
            }
            UiEvent::ProposalReady(envelope) => {
                self.proposal_loading = false;
                self.proposal = Some(*envelope);
                self.timeframe_index = 0;
            }
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        views::render(frame, self);
    }

    // ========================================================================
    // Input
    // ========================================================================

    fn poll_input(&mut self) -> Result<()> {
        while event::poll(std::time::Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.input_mode != InputMode::None {
            self.handle_input_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(c @ '0'..='9') => {
                if let Some(screen) = screen_for_digit(c) {
                    self.screen = screen;
                    self.portfolio_detail = false;
                    self.timeframe_index = 0;
                }
            }
            KeyCode::Char('r') => self.refresh_current(),
            KeyCode::Char('i') | KeyCode::Char('/') => self.begin_input(),
            KeyCode::Char('t') => self.timeframe_index = self.timeframe_index.wrapping_add(1),
            KeyCode::Char('n') if self.screen == Screen::Portfolios => {
                self.input_mode = InputMode::NewPortfolio;
                self.input.clear();
            }
            KeyCode::Char('s') if self.screen == Screen::Portfolios && self.proposal.is_some() => {
                self.input_mode = InputMode::PortfolioName;
                self.input.clear();
            }
            KeyCode::Char('d') if self.screen == Screen::Portfolios => self.delete_selected(),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Enter if self.screen == Screen::Portfolios => {
                self.portfolio_detail = !self.portfolio_detail;
            }
            KeyCode::Esc if self.portfolio_detail => self.portfolio_detail = false,
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::None;
                self.input.clear();
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => self.submit_input(),
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn begin_input(&mut self) {
        self.input_mode = match self.screen {
            Screen::Chat => InputMode::Chat,
            Screen::Analysis => InputMode::Analysis,
            Screen::Screener => InputMode::Screener,
            Screen::Settings => InputMode::TickerTape,
            _ => return,
        };
        if self.input_mode == InputMode::TickerTape {
            self.input = self.store.snapshot().ticker_tape.join(", ");
        } else {
            self.input.clear();
        }
    }

    fn submit_input(&mut self) {
        let text = self.input.trim().to_string();
        let mode = self.input_mode;
        self.input_mode = InputMode::None;
        self.input.clear();
        if text.is_empty() && mode != InputMode::PortfolioName {
            return;
        }

        match mode {
            InputMode::None => {}
            InputMode::Chat => self.spawn_chat(text),
            InputMode::Analysis => self.spawn_analysis(text),
            InputMode::Screener => self.spawn_screener(text),
            InputMode::NewPortfolio => self.spawn_proposal(text),
            InputMode::PortfolioName => self.save_proposal(&text),
            InputMode::TickerTape => self.apply_ticker_tape(&text),
        }
    }

    fn refresh_current(&mut self) {
        if let Some(view) = self.screen.dashboard_view() {
            self.spawn_refresh(view);
        } else if self.screen == Screen::Settings {
            self.spawn_ticker_refresh();
        }
    }

    fn move_selection(&mut self, delta: isize) {
        match self.screen {
            Screen::Portfolios => {
                let len = self.store.snapshot().portfolios.len();
                self.selected_portfolio = step(self.selected_portfolio, delta, len);
            }
            Screen::News => {
                let len = self
                    .store
                    .snapshot()
                    .news
                    .map(|n| n.len())
                    .unwrap_or_default();
                self.selected_news = step(self.selected_news, delta, len);
            }
            _ => {}
        }
    }

    fn delete_selected(&mut self) {
        let portfolios = self.store.snapshot().portfolios;
        if let Some(portfolio) = portfolios.get(self.selected_portfolio) {
            info!(name = %portfolio.name, "deleting portfolio");
            self.store.delete_portfolio(portfolio.id);
            self.selected_portfolio = self
                .selected_portfolio
                .min(portfolios.len().saturating_sub(2));
            self.portfolio_detail = false;
        }
    }

    fn save_proposal(&mut self, name: &str) {
        let details: Option<PortfolioDetails> = self
            .proposal
            .as_ref()
            .and_then(|p| p.portfolio_details.clone());
        if let Some(details) = details {
            self.store.save_portfolio(details, name);
            self.proposal = None;
        }
    }

    fn apply_ticker_tape(&mut self, text: &str) {
        let symbols: Vec<String> = text
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        self.store.set_ticker_tape(symbols);
        self.spawn_ticker_refresh();
    }

    // ========================================================================
    // Background Tasks
    // ========================================================================

    fn spawn_refresh(&self, view: DashboardView) {
        let store = self.store.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            store.refresh_view(view).await;
            let _ = tx.send(UiEvent::StoreChanged);
        });
    }

    fn spawn_ticker_refresh(&self) {
        let store = self.store.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            store.refresh_ticker().await;
            let _ = tx.send(UiEvent::StoreChanged);
        });
    }

    fn spawn_chat(&self, text: String) {
        let store = self.store.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            store.send_chat(&text).await;
            let _ = tx.send(UiEvent::StoreChanged);
        });
    }

    fn spawn_analysis(&mut self, symbol: String) {
        self.analysis_loading = true;
        let backend = self.backend.clone();
        let tx = self.events_tx.clone();
        let prompt = prompts::stock_analysis_prompt(&symbol.to_uppercase());
        tokio::spawn(async move {
            let envelope = backend.financial_response(&prompt).await;
            let _ = tx.send(UiEvent::AnalysisReady(Box::new(envelope)));
        });
    }

    fn spawn_screener(&mut self, text: String) {
        self.screener_loading = true;
        let backend = self.backend.clone();
        let tx = self.events_tx.clone();
        let prompt = prompts::screener_prompt(&text);
        tokio::spawn(async move {
            let envelope = backend.financial_response(&prompt).await;
            let _ = tx.send(UiEvent::ScreenerResult(Box::new(envelope)));
        });
    }

    fn spawn_proposal(&mut self, description: String) {
        self.proposal_loading = true;
        let backend = self.backend.clone();
        let tx = self.events_tx.clone();
        let prompt = prompts::portfolio_prompt(&description);
        tokio::spawn(async move {
            let envelope = backend.financial_response(&prompt).await;
            let _ = tx.send(UiEvent::ProposalReady(Box::new(envelope)));
        });
    }
}

/// Sidebar screens answer to the digit row: `1`-`9` for the first nine,
/// `0` for the tenth.
fn screen_for_digit(c: char) -> Option<Screen> {
    let idx = match c {
        '0' => 9,
        '1'..='9' => (c as u8 - b'1') as usize,
        _ => return None,
    };
    Screen::ALL.get(idx).copied()
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = current as isize + delta;
    next.clamp(0, len as isize - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_stepping_clamps() {
        assert_eq!(step(0, -1, 5), 0);
        assert_eq!(step(4, 1, 5), 4);
        assert_eq!(step(2, 1, 5), 3);
        assert_eq!(step(0, 1, 0), 0);
    }

    #[test]
    fn screen_order_matches_number_keys() {
        assert_eq!(screen_for_digit('1'), Some(Screen::Chat));
        assert_eq!(screen_for_digit('2'), Some(Screen::Analysis));
        assert_eq!(screen_for_digit('0'), Some(Screen::Settings));
        assert_eq!(screen_for_digit('x'), None);
    }
}
