//! Screen rendering.
//!
//! Pure draw code: every function takes the current snapshot and transient
//! app state and paints widgets. No mutation happens here beyond list
//! states local to a draw.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap,
};
use ratatui::Frame;

use crate::ai::types::{Chart, ResponseEnvelope};
use crate::charts::render::render_chart;
use crate::models::{AppData, DashboardView, LoadingStates, Message, Sender};

use super::{App, InputMode, Screen};

const ACCENT: Color = Color::Cyan;
const DIM: Color = Color::DarkGray;

pub(super) fn render(frame: &mut Frame, app: &App) {
    let data = app.store.snapshot();
    let loading = app.store.loading();

    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_ticker_strip(frame, outer[0], &data, &loading);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(26), Constraint::Min(20)])
        .split(outer[1]);

    render_sidebar(frame, body[0], app.screen);

    match app.screen {
        Screen::Chat => render_chat(frame, body[1], app, &data),
        Screen::Analysis => render_analysis(frame, body[1], app),
        Screen::Portfolios => render_portfolios(frame, body[1], app, &data),
        Screen::Market => render_market(frame, body[1], &data, &loading),
        Screen::Indicators => render_indicators(frame, body[1], &data, &loading),
        Screen::CommoditiesForex => render_commodities_forex(frame, body[1], &data, &loading),
        Screen::Screener => render_screener(frame, body[1], app),
        Screen::News => render_news(frame, body[1], app, &data, &loading),
        Screen::LocalMarket => render_local_market(frame, body[1], &data, &loading),
        Screen::Settings => render_settings(frame, body[1], app, &data),
    }

    render_status_line(frame, outer[2], app);
}

// ============================================================================
// Frame chrome
// ============================================================================

fn render_ticker_strip(frame: &mut Frame, area: Rect, data: &AppData, loading: &LoadingStates) {
    let line = if loading.ticker {
        Line::from(Span::styled("Actualizando tickers...", Style::default().fg(DIM)))
    } else {
        match &data.index_performance {
            Some(entries) if !entries.is_empty() => {
                let mut spans = Vec::new();
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        spans.push(Span::styled("  |  ", Style::default().fg(DIM)));
                    }
                    spans.push(Span::styled(
                        format!("{} ", entry.index_name),
                        Style::default().add_modifier(Modifier::BOLD),
                    ));
                    spans.push(Span::raw(format!("{} ", entry.value)));
                    spans.push(Span::styled(
                        entry.change_percentage.clone(),
                        Style::default().fg(pct_color(&entry.change_percentage)),
                    ));
                }
                Line::from(spans)
            }
            Some(_) => Line::from(Span::styled(
                "Sin datos de tickers.",
                Style::default().fg(DIM),
            )),
            None => Line::from(Span::styled("Cargando tickers...", Style::default().fg(DIM))),
        }
    };

    let strip = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title("BrightStone Finance"));
    frame.render_widget(strip, area);
}

fn render_sidebar(frame: &mut Frame, area: Rect, active: Screen) {
    let items: Vec<ListItem> = Screen::ALL
        .iter()
        .enumerate()
        .map(|(i, screen)| {
            let digit = (i + 1) % 10;
            let label = format!("{} {}", digit, screen.label());
            let style = if *screen == active {
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Span::styled(label, style))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Vistas"));
    frame.render_widget(list, area);
}

fn render_status_line(frame: &mut Frame, area: Rect, app: &App) {
    let hint = if app.input_mode != InputMode::None {
        "Enter enviar · Esc cancelar"
    } else {
        match app.screen {
            Screen::Chat => "i escribir · t periodo gráfico · 0-9 vistas · q salir",
            Screen::Analysis => "i ticker · t periodo gráfico · q salir",
            Screen::Portfolios => {
                "n proponer · s guardar propuesta · d borrar · Enter detalle · q salir"
            }
            Screen::Screener => "i buscar · t periodo gráfico · q salir",
            Screen::Settings => "i editar tickers · r actualizar tickers · q salir",
            Screen::News => "↑/↓ elegir · r actualizar · q salir",
            _ => "r actualizar · 0-9 vistas · q salir",
        }
    };
    frame.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(DIM))),
        area,
    );
}

// ============================================================================
// Chat
// ============================================================================

fn render_chat(frame: &mut Frame, area: Rect, app: &App, data: &AppData) {
    let latest_chart = data
        .chat_history
        .iter()
        .rev()
        .filter(|m| m.sender == Sender::Bot)
        .find_map(|m| m.analysis.as_ref())
        .and_then(|a| a.charts.as_ref())
        .and_then(|charts| charts.first());

    let constraints = if latest_chart.is_some() {
        vec![
            Constraint::Min(6),
            Constraint::Length(14),
            Constraint::Length(3),
        ]
    } else {
        vec![Constraint::Min(6), Constraint::Length(3)]
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    for message in &data.chat_history {
        lines.extend(message_lines(message));
        lines.push(Line::default());
    }

    // Keep the newest messages in view.
    let height = chunks[0].height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(height) as u16;

    let messages = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(Block::default().borders(Borders::ALL).title("Quixy"));
    frame.render_widget(messages, chunks[0]);

    if let Some(chart) = latest_chart {
        render_chart_panel(frame, chunks[1], chart, app.timeframe_index);
    }

    let input_area = chunks[chunks.len() - 1];
    render_input_line(
        frame,
        input_area,
        app,
        InputMode::Chat,
        "Mensaje (i para escribir)",
    );
}

fn message_lines(message: &Message) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    match message.sender {
        Sender::User => {
            lines.push(Line::from(vec![
                Span::styled("Tú: ", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
                Span::raw(message.text.clone().unwrap_or_default()),
            ]));
        }
        Sender::Bot if message.is_loading => {
            lines.push(Line::from(Span::styled(
                "Quixy está pensando...",
                Style::default().fg(DIM).add_modifier(Modifier::ITALIC),
            )));
        }
        Sender::Bot => {
            let narrative = message
                .analysis
                .as_ref()
                .map(|a| a.conversational_response.clone())
                .or_else(|| message.text.clone())
                .unwrap_or_default();
            lines.push(Line::from(vec![
                Span::styled(
                    "Quixy: ",
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
                Span::raw(narrative),
            ]));
            if let Some(analysis) = &message.analysis {
                lines.extend(analysis_summary_lines(analysis));
            }
        }
    }
    lines
}

/// Compact per-payload summary under a bot message.
fn analysis_summary_lines(analysis: &ResponseEnvelope) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if let Some(stock) = &analysis.stock_analysis {
        lines.push(Line::from(Span::styled(
            format!(
                "  {} ({})  ${:.2}  {:+.2} ({:+.2}%)  {} · objetivo ${:.2}",
                stock.company_name,
                stock.ticker,
                stock.current_price,
                stock.price_change,
                stock.change_percentage,
                stock.recommendation,
                stock.price_target
            ),
            Style::default().fg(change_color(stock.price_change)),
        )));
        if let Some(metrics) = &stock.key_metrics {
            for metric in metrics.iter().take(4) {
                lines.push(Line::from(Span::styled(
                    format!("  {}: {}", metric.name, metric.value),
                    Style::default().fg(DIM),
                )));
            }
        }
    }
    if let Some(details) = &analysis.portfolio_details {
        lines.push(Line::from(Span::styled(
            format!(
                "  {} · ${:.0} · {} · {}",
                details.strategy_name,
                details.total_capital,
                details.risk_level,
                details.investment_horizon
            ),
            Style::default().fg(DIM),
        )));
    }
    if let Some(sources) = &analysis.sources {
        for source in sources.iter().take(3) {
            lines.push(Line::from(Span::styled(
                format!("  fuente: {}", source.uri),
                Style::default().fg(DIM),
            )));
        }
    }
    lines
}

fn render_chart_panel(frame: &mut Frame, area: Rect, chart: &Chart, timeframe_index: usize) {
    let active = chart.timeframes.as_ref().and_then(|tfs| {
        if tfs.is_empty() {
            None
        } else {
            tfs.get(timeframe_index % tfs.len()).map(String::as_str)
        }
    });
    render_chart(frame, area, chart, active);
}

fn render_input_line(frame: &mut Frame, area: Rect, app: &App, mode: InputMode, idle_hint: &str) {
    let (text, style) = if app.input_mode == mode {
        (
            format!("> {}_", app.input),
            Style::default().fg(Color::White),
        )
    } else {
        (idle_hint.to_string(), Style::default().fg(DIM))
    };
    let input = Paragraph::new(text)
        .style(style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(input, area);
}

// ============================================================================
// Stock Analysis
// ============================================================================

fn render_analysis(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    render_input_line(
        frame,
        chunks[0],
        app,
        InputMode::Analysis,
        "Ticker, p. ej. AAPL o TSLA (i para escribir)",
    );

    let block = Block::default().borders(Borders::ALL).title("Análisis");
    if app.analysis_loading {
        frame.render_widget(
            Paragraph::new("Buscando análisis...")
                .style(Style::default().fg(DIM))
                .block(block),
            chunks[1],
        );
        return;
    }
    let Some(result) = &app.analysis else {
        frame.render_widget(
            Paragraph::new("Escribe un ticker y Quixy preparará el análisis completo.")
                .style(Style::default().fg(DIM))
                .wrap(Wrap { trim: false })
                .block(block),
            chunks[1],
        );
        return;
    };

    let Some(stock) = &result.stock_analysis else {
        frame.render_widget(
            Paragraph::new(result.conversational_response.clone())
                .wrap(Wrap { trim: false })
                .block(block),
            chunks[1],
        );
        return;
    };

    let chart = result.charts.as_ref().and_then(|charts| charts.first());
    let inner = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if chart.is_some() {
            vec![Constraint::Min(8), Constraint::Length(14)]
        } else {
            vec![Constraint::Min(8)]
        })
        .split(chunks[1]);

    let change_style = Style::default().fg(change_color(stock.price_change));
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{} ({})  ", stock.company_name, stock.ticker),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("${:.2}  ", stock.current_price)),
            Span::styled(
                format!(
                    "{:+.2} ({:+.2}%)",
                    stock.price_change, stock.change_percentage
                ),
                change_style,
            ),
        ]),
        Line::from(vec![
            Span::raw("Recomendación: "),
            Span::styled(
                stock.recommendation.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  ·  Objetivo: ${:.2}", stock.price_target)),
            Span::raw("  ·  Sentimiento: "),
            Span::styled(
                stock.market_sentiment.clone(),
                Style::default().fg(sentiment_color(&stock.market_sentiment)),
            ),
        ]),
        Line::default(),
        Line::from(stock.summary.clone()),
    ];
    if let Some(metrics) = &stock.key_metrics {
        lines.push(Line::default());
        for metric in metrics {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{}: ", metric.name),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(metric.value.clone()),
                Span::styled(
                    format!("  — {}", metric.explanation),
                    Style::default().fg(DIM),
                ),
            ]));
        }
    }
    if let Some(sources) = &result.sources {
        lines.push(Line::default());
        for source in sources.iter().take(3) {
            lines.push(Line::from(Span::styled(
                format!("fuente: {}", source.uri),
                Style::default().fg(DIM),
            )));
        }
    }
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        inner[0],
    );

    if let Some(chart) = chart {
        render_chart_panel(frame, inner[1], chart, app.timeframe_index);
    }
}

// ============================================================================
// Portfolios
// ============================================================================

fn render_portfolios(frame: &mut Frame, area: Rect, app: &App, data: &AppData) {
    if app.portfolio_detail {
        if let Some(portfolio) = data.portfolios.get(app.selected_portfolio) {
            render_portfolio_detail(frame, area, &portfolio.name, &portfolio.details);
            return;
        }
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let items: Vec<ListItem> = if data.portfolios.is_empty() {
        vec![ListItem::new(Span::styled(
            "Sin portafolios guardados. Presiona 'n' para proponer uno.",
            Style::default().fg(DIM),
        ))]
    } else {
        data.portfolios
            .iter()
            .map(|p| {
                ListItem::new(Line::from(vec![
                    Span::styled(p.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(
                        format!("  {}", p.created_at.format("%Y-%m-%d")),
                        Style::default().fg(DIM),
                    ),
                ]))
            })
            .collect()
    };

    let mut state = ListState::default();
    if !data.portfolios.is_empty() {
        state.select(Some(app.selected_portfolio.min(data.portfolios.len() - 1)));
    }
    let list = List::new(items)
        .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title("Guardados"));
    frame.render_stateful_widget(list, chunks[0], &mut state);

    render_proposal_panel(frame, chunks[1], app);
}

fn render_proposal_panel(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title("Propuesta");
    if app.proposal_loading {
        frame.render_widget(
            Paragraph::new("Quixy está diseñando el portafolio...")
                .style(Style::default().fg(DIM))
                .block(block),
            area,
        );
        return;
    }

    let Some(proposal) = &app.proposal else {
        frame.render_widget(
            Paragraph::new(
                "Presiona 'n' y describe el portafolio: directivas, capital, riesgo y \
                 horizonte (por defecto $10000, Moderado, Largo Plazo).",
            )
                .style(Style::default().fg(DIM))
                .wrap(Wrap { trim: false })
                .block(block),
            area,
        );
        return;
    };

    match &proposal.portfolio_details {
        Some(details) => {
            let inner_title = format!("Propuesta: {}", details.strategy_name);
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(4), Constraint::Length(1)])
                .split(area);
            render_portfolio_detail(frame, chunks[0], &inner_title, details);
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "s guardar con nombre · n proponer otro",
                    Style::default().fg(DIM),
                )),
                chunks[1],
            );
        }
        None => {
            // The model answered, but without portfolio data.
            frame.render_widget(
                Paragraph::new(proposal.conversational_response.clone())
                    .wrap(Wrap { trim: false })
                    .block(block),
                area,
            );
        }
    }
}

fn render_portfolio_detail(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    details: &crate::ai::types::PortfolioDetails,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(5),
            Constraint::Length(5),
        ])
        .split(area);

    let mut header = vec![Line::from(vec![
        Span::raw(format!(
            "Capital ${:.0} · Riesgo {} · Horizonte {}",
            details.total_capital, details.risk_level, details.investment_horizon
        )),
    ])];
    if let Some(ret) = &details.estimated_annual_return {
        header.push(Line::from(Span::styled(
            format!("Retorno anual estimado: {}", ret),
            Style::default().fg(Color::Green),
        )));
    }
    frame.render_widget(
        Paragraph::new(header)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(title.to_string())),
        chunks[0],
    );

    let assets = details.assets.as_deref().unwrap_or(&[]);
    let rows: Vec<Row> = assets
        .iter()
        .map(|asset| {
            Row::new(vec![
                Cell::from(asset.ticker.clone()),
                Cell::from(asset.company_name.clone()),
                Cell::from(format!("{:.1}%", asset.allocation_percentage)),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Min(20),
            Constraint::Length(8),
        ],
    )
    .header(
        Row::new(vec!["Ticker", "Empresa", "Peso"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title("Activos"));
    frame.render_widget(table, chunks[1]);

    let mut footer = Vec::new();
    if let Some(perf) = &details.historical_performance {
        footer.push(Line::from(format!(
            "Histórico: 1A {} · 3A {} · 5A {}",
            perf.one_year, perf.three_year_annualized, perf.five_year_annualized
        )));
    }
    if let Some(risk) = &details.risk_analysis {
        footer.push(Line::from(format!(
            "Riesgo: beta {} · desviación {} — {}",
            risk.beta, risk.standard_deviation, risk.summary
        )));
    }
    if footer.is_empty() {
        footer.push(Line::from(Span::styled(
            details.strategy_rationale.clone(),
            Style::default().fg(DIM),
        )));
    }
    frame.render_widget(
        Paragraph::new(footer)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Análisis")),
        chunks[2],
    );
}

// ============================================================================
// Dashboard views
// ============================================================================

fn render_market(frame: &mut Frame, area: Rect, data: &AppData, loading: &LoadingStates) {
    let Some(summary) = &data.market_summary else {
        render_view_placeholder(frame, area, "Mercado", loading.is_loading(DashboardView::Market));
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(7),
            Constraint::Min(6),
            Constraint::Length(5),
        ])
        .split(area);

    let header = vec![
        Line::from(vec![
            Span::raw("Sentimiento: "),
            Span::styled(
                summary.market_sentiment.clone(),
                Style::default().fg(sentiment_color(&summary.market_sentiment)),
            ),
        ]),
        Line::from(summary.summary_text.clone()),
    ];
    frame.render_widget(
        Paragraph::new(header)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Mercado")),
        chunks[0],
    );

    let index_rows: Vec<Row> = summary
        .index_performance
        .iter()
        .map(|idx| {
            Row::new(vec![
                Cell::from(idx.index_name.clone()),
                Cell::from(idx.value.clone()),
                Cell::from(Span::styled(
                    idx.change.clone(),
                    Style::default().fg(pct_color(&idx.change)),
                )),
                Cell::from(Span::styled(
                    idx.change_percentage.clone(),
                    Style::default().fg(pct_color(&idx.change_percentage)),
                )),
            ])
        })
        .collect();
    frame.render_widget(
        Table::new(
            index_rows,
            [
                Constraint::Min(12),
                Constraint::Length(12),
                Constraint::Length(10),
                Constraint::Length(10),
            ],
        )
        .header(
            Row::new(vec!["Índice", "Valor", "Cambio", "%"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("Índices")),
        chunks[1],
    );

    let movers = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    render_movers_table(frame, movers[0], "Ganadores", &summary.top_gainers, Color::Green);
    render_movers_table(frame, movers[1], "Perdedores", &summary.top_losers, Color::Red);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[3]);

    let sector_lines: Vec<Line> = summary
        .sector_performance
        .iter()
        .map(|s| {
            Line::from(vec![
                Span::raw(format!("{}: ", s.sector_name)),
                Span::styled(
                    format!("{:+.2}%", s.change_percentage),
                    Style::default().fg(change_color(s.change_percentage)),
                ),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(sector_lines)
            .block(Block::default().borders(Borders::ALL).title("Sectores")),
        bottom[0],
    );

    let calendar_lines: Vec<Line> = summary
        .economic_calendar
        .iter()
        .map(|e| Line::from(format!("{} · {} · impacto {}", e.date, e.event_name, e.impact)))
        .collect();
    frame.render_widget(
        Paragraph::new(calendar_lines)
            .block(Block::default().borders(Borders::ALL).title("Calendario")),
        bottom[1],
    );
}

fn render_movers_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    movers: &[crate::ai::types::MarketMover],
    color: Color,
) {
    let rows: Vec<Row> = movers
        .iter()
        .map(|m| {
            Row::new(vec![
                Cell::from(m.ticker.clone()),
                Cell::from(m.price.clone()),
                Cell::from(Span::styled(
                    m.change_percentage.clone(),
                    Style::default().fg(color),
                )),
            ])
        })
        .collect();
    frame.render_widget(
        Table::new(
            rows,
            [
                Constraint::Length(10),
                Constraint::Length(10),
                Constraint::Length(10),
            ],
        )
        .block(Block::default().borders(Borders::ALL).title(title.to_string())),
        area,
    );
}

fn render_indicators(frame: &mut Frame, area: Rect, data: &AppData, loading: &LoadingStates) {
    let Some(indicators) = &data.economic_indicators else {
        render_view_placeholder(
            frame,
            area,
            "Indicadores",
            loading.is_loading(DashboardView::Indicators),
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(5)])
        .split(area);

    frame.render_widget(
        Paragraph::new(indicators.summary.clone())
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Indicadores económicos")),
        chunks[0],
    );

    let entries = indicators.indicators.as_deref().unwrap_or(&[]);
    let rows: Vec<Row> = entries
        .iter()
        .map(|ind| {
            Row::new(vec![
                Cell::from(ind.name.clone()),
                Cell::from(ind.value.clone()),
                Cell::from(ind.trend.clone()),
                Cell::from(ind.period.clone()),
                Cell::from(ind.interpretation.clone()),
            ])
        })
        .collect();
    frame.render_widget(
        Table::new(
            rows,
            [
                Constraint::Length(18),
                Constraint::Length(10),
                Constraint::Length(8),
                Constraint::Length(10),
                Constraint::Min(20),
            ],
        )
        .header(
            Row::new(vec!["Indicador", "Valor", "Tendencia", "Periodo", "Lectura"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL)),
        chunks[1],
    );
}

fn render_commodities_forex(
    frame: &mut Frame,
    area: Rect,
    data: &AppData,
    loading: &LoadingStates,
) {
    let Some(cf) = &data.commodities_forex else {
        render_view_placeholder(
            frame,
            area,
            "Commodities y Divisas",
            loading.is_loading(DashboardView::CommoditiesForex),
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(5)])
        .split(area);

    frame.render_widget(
        Paragraph::new(cf.summary.clone())
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Commodities y Divisas")),
        chunks[0],
    );

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    let commodity_rows: Vec<Row> = cf
        .commodities
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|c| {
            Row::new(vec![
                Cell::from(c.name.clone()),
                Cell::from(format!("{} {}", c.price, c.unit)),
                Cell::from(Span::styled(
                    c.change_percentage.clone(),
                    Style::default().fg(pct_color(&c.change_percentage)),
                )),
            ])
        })
        .collect();
    frame.render_widget(
        Table::new(
            commodity_rows,
            [
                Constraint::Min(14),
                Constraint::Length(16),
                Constraint::Length(10),
            ],
        )
        .header(
            Row::new(vec!["Materia prima", "Precio", "%"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("Commodities")),
        halves[0],
    );

    let forex_rows: Vec<Row> = cf
        .forex_pairs
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|p| {
            Row::new(vec![
                Cell::from(p.pair.clone()),
                Cell::from(p.rate.clone()),
                Cell::from(Span::styled(
                    p.change_percentage.clone(),
                    Style::default().fg(pct_color(&p.change_percentage)),
                )),
            ])
        })
        .collect();
    frame.render_widget(
        Table::new(
            forex_rows,
            [
                Constraint::Length(10),
                Constraint::Length(10),
                Constraint::Length(10),
            ],
        )
        .header(
            Row::new(vec!["Par", "Tasa", "%"]).style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("Divisas")),
        halves[1],
    );
}

fn render_screener(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    render_input_line(
        frame,
        chunks[0],
        app,
        InputMode::Screener,
        "Criterios de búsqueda, p. ej. 'acciones de IA infravaloradas' (i para escribir)",
    );

    let block = Block::default().borders(Borders::ALL).title("Resultado");
    if app.screener_loading {
        frame.render_widget(
            Paragraph::new("Analizando el mercado...")
                .style(Style::default().fg(DIM))
                .block(block),
            chunks[1],
        );
        return;
    }
    let Some(result) = &app.screener_result else {
        frame.render_widget(
            Paragraph::new("Describe los criterios y Quixy buscará la mejor coincidencia.")
                .style(Style::default().fg(DIM))
                .wrap(Wrap { trim: false })
                .block(block),
            chunks[1],
        );
        return;
    };

    let Some(results) = &result.screener_results else {
        frame.render_widget(
            Paragraph::new(result.conversational_response.clone())
                .wrap(Wrap { trim: false })
                .block(block),
            chunks[1],
        );
        return;
    };

    let chart = result
        .charts
        .as_ref()
        .or(results.charts.as_ref())
        .and_then(|charts| charts.first());
    let inner = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if chart.is_some() {
            vec![Constraint::Min(5), Constraint::Length(12)]
        } else {
            vec![Constraint::Min(5)]
        })
        .split(chunks[1]);

    let mut lines = vec![Line::from(Span::styled(
        results.query_summary.clone(),
        Style::default().fg(DIM),
    ))];
    if let Some(stock) = &results.stock {
        lines.push(Line::from(Span::styled(
            format!(
                "{} ({}) · ${:.2}",
                stock.company_name, stock.ticker, stock.current_price
            ),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(stock.justification.clone()));
        if let Some(metrics) = &stock.key_metrics {
            for metric in metrics {
                lines.push(Line::from(Span::styled(
                    format!("{}: {}", metric.name, metric.value),
                    Style::default().fg(DIM),
                )));
            }
        }
    }
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        inner[0],
    );

    if let Some(chart) = chart {
        render_chart_panel(frame, inner[1], chart, app.timeframe_index);
    }
}

fn render_news(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    data: &AppData,
    loading: &LoadingStates,
) {
    let Some(articles) = &data.news else {
        render_view_placeholder(frame, area, "Noticias", loading.is_loading(DashboardView::News));
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(7)])
        .split(area);

    let items: Vec<ListItem> = articles
        .iter()
        .map(|article| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("[{}] ", article.source),
                    Style::default().fg(DIM),
                ),
                Span::raw(article.title.clone()),
            ]))
        })
        .collect();
    let mut state = ListState::default();
    if !articles.is_empty() {
        state.select(Some(app.selected_news.min(articles.len() - 1)));
    }
    let list = List::new(items)
        .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title("Noticias"));
    frame.render_stateful_widget(list, chunks[0], &mut state);

    let detail = articles
        .get(app.selected_news.min(articles.len().saturating_sub(1)))
        .map(|article| {
            vec![
                Line::from(Span::styled(
                    article.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(article.summary.clone()),
                Line::from(Span::styled(
                    article.uri.clone(),
                    Style::default().fg(DIM),
                )),
            ]
        })
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(detail)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Detalle")),
        chunks[1],
    );
}

fn render_local_market(frame: &mut Frame, area: Rect, data: &AppData, loading: &LoadingStates) {
    let Some(local) = &data.local_market else {
        render_view_placeholder(
            frame,
            area,
            "Mercado Colombia",
            loading.is_loading(DashboardView::LocalMarket),
        );
        return;
    };
    let summary = &local.summary;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(7),
            Constraint::Min(4),
        ])
        .split(area);

    let colcap = &summary.colcap_performance;
    let header = vec![
        Line::from(vec![
            Span::styled(
                format!("{} {} ", colcap.index_name, colcap.value),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{} ({})", colcap.change, colcap.change_percentage),
                Style::default().fg(pct_color(&colcap.change_percentage)),
            ),
            Span::raw("  ·  Sentimiento: "),
            Span::styled(
                summary.market_sentiment.clone(),
                Style::default().fg(sentiment_color(&summary.market_sentiment)),
            ),
        ]),
        Line::from(summary.summary_text.clone()),
    ];
    frame.render_widget(
        Paragraph::new(header)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Mercado Colombia")),
        chunks[0],
    );

    let rows: Vec<Row> = summary
        .key_stocks
        .iter()
        .map(|stock| {
            Row::new(vec![
                Cell::from(stock.ticker.clone()),
                Cell::from(stock.company_name.clone()),
                Cell::from(stock.price.clone()),
                Cell::from(Span::styled(
                    stock.change_percentage.clone(),
                    Style::default().fg(pct_color(&stock.change_percentage)),
                )),
            ])
        })
        .collect();
    frame.render_widget(
        Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Min(16),
                Constraint::Length(14),
                Constraint::Length(8),
            ],
        )
        .header(
            Row::new(vec!["Ticker", "Empresa", "Precio", "%"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("Acciones clave")),
        chunks[1],
    );

    let news_lines: Vec<Line> = summary
        .news
        .iter()
        .map(|article| {
            Line::from(vec![
                Span::styled(format!("[{}] ", article.source), Style::default().fg(DIM)),
                Span::raw(article.title.clone()),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(news_lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Noticias locales")),
        chunks[2],
    );
}

fn render_settings(frame: &mut Frame, area: Rect, app: &App, data: &AppData) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(area);

    let lines = vec![
        Line::from(vec![
            Span::styled("Modelo: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(app.model_name.clone()),
        ]),
        Line::from(vec![
            Span::styled("Datos: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(app.store.path().display().to_string()),
        ]),
        Line::from(vec![
            Span::styled("Tickers: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(data.ticker_tape.join(", ")),
        ]),
        Line::default(),
        Line::from(Span::styled(
            "Edita la lista de tickers con 'i' (separados por comas).",
            Style::default().fg(DIM),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Ajustes")),
        chunks[0],
    );

    render_input_line(
        frame,
        chunks[1],
        app,
        InputMode::TickerTape,
        "Tickers (i para editar)",
    );
}

fn render_view_placeholder(frame: &mut Frame, area: Rect, title: &str, is_loading: bool) {
    let text = if is_loading {
        "Cargando datos del mercado..."
    } else {
        "No se pudieron cargar los datos. Presiona 'r' para reintentar."
    };
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(DIM))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title.to_string())),
        area,
    );
}

// ============================================================================
// Helpers
// ============================================================================

/// Color for a formatted change string like "+0.46%" or "-1.35".
fn pct_color(value: &str) -> Color {
    if value.trim_start().starts_with('-') {
        Color::Red
    } else {
        Color::Green
    }
}

fn change_color(value: f64) -> Color {
    if value < 0.0 {
        Color::Red
    } else {
        Color::Green
    }
}

fn sentiment_color(sentiment: &str) -> Color {
    let lower = sentiment.to_lowercase();
    if lower.contains("alcista") || lower.contains("bull") {
        Color::Green
    } else if lower.contains("bajista") || lower.contains("bear") {
        Color::Red
    } else {
        Color::Yellow
    }
}
