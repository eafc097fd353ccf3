//! Terminal rendering for prepared charts.
//!
//! Maps a [`ChartShape`](super::ChartShape) onto ratatui widgets: braille
//! line plots for price and line series, bar groups for volume and bar
//! charts. Placeholder shapes render as centered notices.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart as ChartWidget, Dataset, GraphType,
    Paragraph,
};
use ratatui::Frame;

use super::{format_large_number, format_value, prepare, ChartShape};
use crate::ai::types::{Chart, ChartDataKey, ChartRow};

const NO_DATA: &str = "No hay datos para mostrar el gráfico.";
const UNSUPPORTED: &str = "Tipo de gráfico no soportado.";
const INVALID_COMPOSED: &str = "Configuración de gráfico compuesto inválida.";

/// Render one chart descriptor into the given area.
pub fn render_chart(frame: &mut Frame, area: Rect, chart: &Chart, active_timeframe: Option<&str>) {
    let title = block_title(chart, active_timeframe);
    match prepare(chart, active_timeframe) {
        ChartShape::NoData => render_notice(frame, area, &title, NO_DATA),
        ChartShape::Unsupported => render_notice(frame, area, &title, UNSUPPORTED),
        ChartShape::InvalidComposed => render_notice(frame, area, &title, INVALID_COMPOSED),
        ChartShape::Composed {
            rows,
            price,
            volume,
            price_domain,
        } => render_composed(frame, area, &title, rows, price, volume, price_domain),
        ChartShape::Line { rows, series } => render_line(frame, area, &title, rows, series),
        ChartShape::Bar { rows, series } => render_bar(frame, area, &title, rows, series),
    }
}

fn block_title(chart: &Chart, active_timeframe: Option<&str>) -> String {
    let active = active_timeframe.or_else(|| {
        chart
            .timeframes
            .as_ref()
            .and_then(|tfs| tfs.first().map(String::as_str))
    });
    match active {
        Some(tf) => format!("{} [{}]", chart.title, tf),
        None => chart.title.clone(),
    }
}

fn render_notice(frame: &mut Frame, area: Rect, title: &str, text: &str) {
    let notice = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(notice, area);
}

fn render_composed(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[ChartRow],
    price: &ChartDataKey,
    volume: &ChartDataKey,
    price_domain: Option<(f64, f64)>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let points = series_points(rows, &price.key);
    let (y_min, y_max) = price_domain.unwrap_or((0.0, 1.0));
    let color = color_from_hex(&price.color);

    let datasets = vec![Dataset::default()
        .name(price.name.clone())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points)];

    let price_chart = ChartWidget::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, (rows.len().saturating_sub(1)) as f64])
                .labels(x_labels(rows)),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("${:.2}", y_min)),
                    Span::raw(format!("${:.2}", (y_min + y_max) / 2.0)),
                    Span::raw(format!("${:.2}", y_max)),
                ]),
        );
    frame.render_widget(price_chart, chunks[0]);

    let bars = volume_bars(rows, volume);
    let volume_chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(volume.name.clone()),
        )
        .bar_width(3)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(volume_chart, chunks[1]);
}

fn render_line(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[ChartRow],
    series: &[ChartDataKey],
) {
    let all_points: Vec<Vec<(f64, f64)>> = series
        .iter()
        .map(|key| series_points(rows, &key.key))
        .collect();

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for points in &all_points {
        for &(_, y) in points {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        render_notice(frame, area, title, NO_DATA);
        return;
    }
    let padding = (y_max - y_min) * 0.1;
    let (y_min, y_max) = (y_min - padding, y_max + padding);

    let datasets: Vec<Dataset> = series
        .iter()
        .zip(all_points.iter())
        .map(|(key, points)| {
            Dataset::default()
                .name(key.name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(color_from_hex(&key.color)))
                .data(points)
        })
        .collect();

    let chart = ChartWidget::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, (rows.len().saturating_sub(1)) as f64])
                .labels(x_labels(rows)),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format_large_number(y_min)),
                    Span::raw(format_large_number((y_min + y_max) / 2.0)),
                    Span::raw(format_large_number(y_max)),
                ]),
        );
    frame.render_widget(chart, area);
}

fn render_bar(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[ChartRow],
    series: &[ChartDataKey],
) {
    let Some(key) = series.first() else {
        render_notice(frame, area, title, NO_DATA);
        return;
    };

    let values: Vec<(String, f64)> = rows
        .iter()
        .map(|row| (row.name.clone(), row.value(&key.key).unwrap_or(0.0)))
        .collect();
    let max_abs = values
        .iter()
        .map(|(_, v)| v.abs())
        .fold(0.0_f64, f64::max)
        .max(f64::MIN_POSITIVE);

    // Bar heights are scaled magnitudes; sign shows through the color.
    let bars: Vec<Bar> = values
        .iter()
        .map(|(name, value)| {
            let color = if *value >= 0.0 {
                Color::Green
            } else {
                Color::Red
            };
            Bar::default()
                .value(((value.abs() / max_abs) * 100.0).round() as u64)
                .text_value(format_value(&key.name, *value))
                .label(Line::from(name.clone()))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        })
        .collect();

    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .bar_width(9)
        .bar_gap(2)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn series_points(rows: &[ChartRow], key: &str) -> Vec<(f64, f64)> {
    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| row.value(key).map(|v| (i as f64, v)))
        .collect()
}

fn volume_bars<'a>(rows: &[ChartRow], volume: &'a ChartDataKey) -> Vec<Bar<'a>> {
    let max = rows
        .iter()
        .filter_map(|r| r.value(&volume.key))
        .fold(0.0_f64, f64::max)
        .max(f64::MIN_POSITIVE);
    rows.iter()
        .map(|row| {
            let value = row.value(&volume.key).unwrap_or(0.0);
            Bar::default()
                .value(((value / max) * 100.0).round() as u64)
                .text_value(format_large_number(value))
                .style(Style::default().fg(color_from_hex(&volume.color)))
        })
        .collect()
}

/// First, middle, and last row names as X-axis labels.
fn x_labels(rows: &[ChartRow]) -> Vec<Span<'static>> {
    let mut labels = Vec::new();
    if let Some(first) = rows.first() {
        labels.push(Span::raw(first.name.clone()));
    }
    if rows.len() > 2 {
        labels.push(Span::raw(rows[rows.len() / 2].name.clone()));
    }
    if rows.len() > 1 {
        labels.push(Span::raw(rows[rows.len() - 1].name.clone()));
    }
    labels
}

/// Parse a `#rrggbb` series color, falling back to cyan.
fn color_from_hex(hex: &str) -> Color {
    let hex = hex.trim_start_matches('#');
    if hex.len() == 6 && hex.is_ascii() {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&hex[0..2], 16),
            u8::from_str_radix(&hex[2..4], 16),
            u8::from_str_radix(&hex[4..6], 16),
        ) {
            return Color::Rgb(r, g, b);
        }
    }
    Color::Cyan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse() {
        assert_eq!(color_from_hex("#3b82f6"), Color::Rgb(0x3b, 0x82, 0xf6));
        assert_eq!(color_from_hex("#22c55e"), Color::Rgb(0x22, 0xc5, 0x5e));
        assert_eq!(color_from_hex("azul"), Color::Cyan);
        assert_eq!(color_from_hex("#zzzzzz"), Color::Cyan);
    }

    #[test]
    fn multibyte_color_strings_fall_back_without_panicking() {
        // Six bytes but two chars; byte-slicing these would split a char.
        assert_eq!(color_from_hex("€€"), Color::Cyan);
        assert_eq!(color_from_hex("#ééé"), Color::Cyan);
    }

    #[test]
    fn sparse_rows_skip_non_numeric_points() {
        let rows: Vec<ChartRow> = serde_json::from_value(serde_json::json!([
            { "name": "d0", "Precio": 10.0 },
            { "name": "d1", "Precio": "No disponible" },
            { "name": "d2", "Precio": 12.0 }
        ]))
        .unwrap();
        let points = series_points(&rows, "Precio");
        assert_eq!(points, vec![(0.0, 10.0), (2.0, 12.0)]);
    }
}
