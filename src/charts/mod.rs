//! Chart adapter.
//!
//! Pure selection and derivation logic between the wire-level chart
//! descriptor and the terminal renderer: which rows are active for the
//! chosen timeframe, which shape the chart resolves to, axis domains, and
//! number formatting. Everything here is testable without a terminal.

pub mod render;

use crate::ai::types::{Chart, ChartData, ChartDataKey, ChartKind, ChartRow};

/// The render-ready resolution of a chart descriptor for one timeframe.
#[derive(Debug)]
pub enum ChartShape<'a> {
    /// Nothing to plot for the active timeframe.
    NoData,
    /// Radar charts are part of the wire contract but have no rendering.
    Unsupported,
    /// A composed chart without both a price and a volume series.
    InvalidComposed,
    Composed {
        rows: &'a [ChartRow],
        price: &'a ChartDataKey,
        volume: &'a ChartDataKey,
        /// Padded Y domain for the price axis; `None` when the rows hold no
        /// numeric price values.
        price_domain: Option<(f64, f64)>,
    },
    Line {
        rows: &'a [ChartRow],
        series: &'a [ChartDataKey],
    },
    Bar {
        rows: &'a [ChartRow],
        series: &'a [ChartDataKey],
    },
}

/// Rows for the active timeframe. Charts with a `timeframes` list resolve
/// through the mapping (defaulting to the first label); flat charts use
/// their rows directly.
pub fn active_rows<'a>(chart: &'a Chart, active_timeframe: Option<&str>) -> &'a [ChartRow] {
    let has_timeframes = chart
        .timeframes
        .as_ref()
        .is_some_and(|tfs| !tfs.is_empty());

    match (&chart.data, has_timeframes) {
        (ChartData::Timeframes(map), true) => {
            let label = active_timeframe
                .or_else(|| {
                    chart
                        .timeframes
                        .as_ref()
                        .and_then(|tfs| tfs.first().map(String::as_str))
                })
                .unwrap_or_default();
            map.get(label).map(Vec::as_slice).unwrap_or(&[])
        }
        (ChartData::Timeframes(_), false) => &[],
        (ChartData::Rows(rows), _) => rows,
    }
}

/// Resolve a chart descriptor to its renderable shape.
pub fn prepare<'a>(chart: &'a Chart, active_timeframe: Option<&str>) -> ChartShape<'a> {
    let rows = active_rows(chart, active_timeframe);
    if rows.is_empty() {
        return ChartShape::NoData;
    }

    match chart.kind {
        ChartKind::Composed => {
            let price = find_series(&chart.data_keys, "precio");
            let volume = find_series(&chart.data_keys, "volumen");
            match (price, volume) {
                (Some(price), Some(volume)) => ChartShape::Composed {
                    rows,
                    price_domain: price_domain(rows, &price.key),
                    price,
                    volume,
                },
                _ => ChartShape::InvalidComposed,
            }
        }
        ChartKind::Line => ChartShape::Line {
            rows,
            series: &chart.data_keys,
        },
        ChartKind::Bar => ChartShape::Bar {
            rows,
            series: &chart.data_keys,
        },
        ChartKind::Radar => ChartShape::Unsupported,
    }
}

/// Find a series by display name, case-insensitively.
pub fn find_series<'a>(keys: &'a [ChartDataKey], name: &str) -> Option<&'a ChartDataKey> {
    keys.iter().find(|k| k.name.eq_ignore_ascii_case(name))
}

/// Y domain for a price series: min and max padded by 10% of their spread,
/// so the curve never hugs the chart edges. `None` when no row holds a
/// numeric value for the key.
pub fn price_domain(rows: &[ChartRow], key: &str) -> Option<(f64, f64)> {
    let prices: Vec<f64> = rows.iter().filter_map(|r| r.value(key)).collect();
    if prices.is_empty() {
        return None;
    }
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let padding = (max - min) * 0.1;
    Some((min - padding, max + padding))
}

/// Abbreviate large magnitudes: thousands, millions, and billions with one
/// decimal place.
pub fn format_large_number(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        value.to_string()
    }
}

/// Format one data point for display: price series get two-decimal dollar
/// values, everything else the abbreviated form.
pub fn format_value(series_name: &str, value: f64) -> String {
    if series_name.eq_ignore_ascii_case("precio") {
        format!("${:.2}", value)
    } else {
        format_large_number(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chart_from(value: serde_json::Value) -> Chart {
        serde_json::from_value(value).unwrap()
    }

    fn composed_chart(precio: &[f64]) -> Chart {
        let rows: Vec<_> = precio
            .iter()
            .enumerate()
            .map(|(i, p)| json!({ "name": format!("d{i}"), "Precio": p, "Volumen": 1_000_000 }))
            .collect();
        chart_from(json!({
            "type": "composed",
            "title": "Historial de Precios y Volumen",
            "timeframes": ["30D"],
            "data": { "30D": rows },
            "dataKeys": [
                { "key": "Precio", "name": "Precio", "color": "#3b82f6" },
                { "key": "Volumen", "name": "Volumen", "color": "#4B5563" }
            ]
        }))
    }

    #[test]
    fn price_domain_pads_by_ten_percent_of_spread() {
        let chart = composed_chart(&[10.0, 20.0, 30.0]);
        match prepare(&chart, None) {
            ChartShape::Composed { price_domain, .. } => {
                assert_eq!(price_domain, Some((8.0, 32.0)));
            }
            other => panic!("expected composed shape, got {:?}", other),
        }
    }

    #[test]
    fn composed_without_volume_is_invalid() {
        let chart = chart_from(json!({
            "type": "composed",
            "title": "Solo precio",
            "data": [{ "name": "d0", "Precio": 10.0 }],
            "dataKeys": [{ "key": "Precio", "name": "Precio", "color": "#3b82f6" }]
        }));
        assert!(matches!(prepare(&chart, None), ChartShape::InvalidComposed));
    }

    #[test]
    fn series_lookup_is_case_insensitive() {
        let chart = chart_from(json!({
            "type": "composed",
            "title": "Mayúsculas",
            "data": [{ "name": "d0", "PRECIO": 10.0, "vol": 5.0 }],
            "dataKeys": [
                { "key": "PRECIO", "name": "PRECIO", "color": "#3b82f6" },
                { "key": "vol", "name": "VOLUMEN", "color": "#4B5563" }
            ]
        }));
        assert!(matches!(prepare(&chart, None), ChartShape::Composed { .. }));
    }

    #[test]
    fn radar_is_unsupported() {
        let chart = chart_from(json!({
            "type": "radar",
            "title": "Radar",
            "data": [{ "name": "a", "Valor": 1.0 }],
            "dataKeys": [{ "key": "Valor", "name": "Valor", "color": "#3b82f6" }]
        }));
        assert!(matches!(prepare(&chart, None), ChartShape::Unsupported));
    }

    #[test]
    fn empty_active_timeframe_is_no_data() {
        let chart = chart_from(json!({
            "type": "line",
            "title": "Vacío",
            "timeframes": ["30D", "1Y"],
            "data": { "30D": [], "1Y": [{ "name": "m0", "Valor": 1.0 }] },
            "dataKeys": [{ "key": "Valor", "name": "Valor", "color": "#3b82f6" }]
        }));
        // Default timeframe (first label) has no rows.
        assert!(matches!(prepare(&chart, None), ChartShape::NoData));
        // The other timeframe does.
        assert!(matches!(prepare(&chart, Some("1Y")), ChartShape::Line { .. }));
    }

    #[test]
    fn unknown_timeframe_label_is_no_data() {
        let chart = composed_chart(&[10.0]);
        assert!(matches!(prepare(&chart, Some("5Y")), ChartShape::NoData));
    }

    #[test]
    fn flat_rows_ignore_timeframe_selection() {
        let chart = chart_from(json!({
            "type": "bar",
            "title": "Sectores",
            "data": [{ "name": "Tecnología", "Cambio": 1.25 }],
            "dataKeys": [{ "key": "Cambio", "name": "Cambio", "color": "#22c55e" }]
        }));
        assert_eq!(active_rows(&chart, Some("30D")).len(), 1);
    }

    #[test]
    fn large_number_abbreviation() {
        assert_eq!(format_large_number(50_000_000.0), "50.0M");
        assert_eq!(format_large_number(2_500_000_000.0), "2.5B");
        assert_eq!(format_large_number(1_500.0), "1.5K");
        assert_eq!(format_large_number(-1_500.0), "-1.5K");
        assert_eq!(format_large_number(999.0), "999");
    }

    #[test]
    fn price_series_formats_as_currency() {
        assert_eq!(format_value("Precio", 145.6), "$145.60");
        assert_eq!(format_value("precio", 145.6), "$145.60");
        assert_eq!(format_value("Volumen", 50_000_000.0), "50.0M");
    }

    #[test]
    fn domain_is_none_without_numeric_prices() {
        let chart = chart_from(json!({
            "type": "composed",
            "title": "Sin números",
            "data": [{ "name": "d0", "Precio": "No disponible", "Volumen": 1.0 }],
            "dataKeys": [
                { "key": "Precio", "name": "Precio", "color": "#3b82f6" },
                { "key": "Volumen", "name": "Volumen", "color": "#4B5563" }
            ]
        }));
        match prepare(&chart, None) {
            ChartShape::Composed { price_domain, .. } => assert_eq!(price_domain, None),
            other => panic!("expected composed shape, got {:?}", other),
        }
    }
}
