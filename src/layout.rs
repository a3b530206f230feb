use crate::error::{PluginError, PluginResult};
use crate::ir::{BarRect, BarScene, RenderedChart};
use crate::scale::coerce_number;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// How bars that share a category are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Stack,
    Dodge,
    Overlap,
}

/// Lay out the selected configuration as bars in band/value space.
///
/// Values are summed per (category, series). Percent mode stacks and
/// normalizes every category to 1.0; stack mode stacks; group mode dodges
/// side by side; otherwise bars overlap at full band width.
pub fn build_scene(rendered: &RenderedChart<'_>) -> PluginResult<BarScene> {
    let config = &rendered.config;
    let category_field = config
        .category_field()
        .ok_or_else(|| PluginError::InvalidData("no column bound to the category axis".to_string()))?;
    let value_field = config
        .value_field()
        .ok_or_else(|| PluginError::InvalidData("no metric bound to the value axis".to_string()))?;

    let mut categories = Interner::default();
    let mut series = Interner::default();
    if config.series_field.is_none() {
        series.intern(String::new());
    }

    let mut sums: HashMap<(usize, usize), f64> = HashMap::new();
    let mut skipped = 0usize;
    for row in config.data {
        let c = categories.intern(cell_label(row.get(category_field)));
        let s = match config.series_field {
            Some(field) => series.intern(cell_label(row.get(field))),
            None => 0,
        };
        match row.get(value_field).and_then(coerce_number) {
            Some(value) => *sums.entry((c, s)).or_insert(0.0) += value,
            None => skipped += 1,
        }
    }

    let placement = if config.is_stack || config.is_percent {
        Placement::Stack
    } else if config.is_group {
        Placement::Dodge
    } else {
        Placement::Overlap
    };

    let mut bars = Vec::new();
    for c in 0..categories.len() {
        let present: Vec<(usize, f64)> = (0..series.len())
            .filter_map(|s| sums.get(&(c, s)).map(|v| (s, *v)))
            .collect();
        place_category(c, &present, placement, config.is_percent, config.bar_width_ratio, &mut bars);
    }

    let (data_min, data_max) = bars.iter().fold((0.0f64, 0.0f64), |(lo, hi), b| {
        (lo.min(b.value_start.min(b.value_end)), hi.max(b.value_start.max(b.value_end)))
    });
    let value_max = if config.is_percent {
        1.0
    } else {
        config
            .value_axis()
            .and_then(|axis| axis.max)
            .unwrap_or(data_max)
    };
    let value_max = if value_max > data_min { value_max } else { data_min + 1.0 };

    debug!(
        categories = categories.len(),
        series = series.len(),
        bars = bars.len(),
        skipped,
        ?placement,
        "built bar scene"
    );

    Ok(BarScene {
        orientation: config.orientation(),
        categories: categories.into_names(),
        series: series.into_names(),
        bars,
        value_min: data_min,
        value_max,
        label_position: config.label.position,
        font_size: config.label.style.font_size,
        legend: config.legend.position,
        percent: config.is_percent,
    })
}

fn place_category(
    category: usize,
    present: &[(usize, f64)],
    placement: Placement,
    percent: bool,
    width_ratio: f64,
    bars: &mut Vec<BarRect>,
) {
    let center = category as f64 + 0.5;
    let half = width_ratio / 2.0;
    let total: f64 = present.iter().map(|(_, v)| v.abs()).sum();

    match placement {
        Placement::Stack => {
            let (mut pos, mut neg) = (0.0, 0.0);
            for &(series, raw) in present {
                let value = if percent {
                    if total > 0.0 { raw.abs() / total } else { 0.0 }
                } else {
                    raw
                };
                let (start, end) = if value >= 0.0 {
                    pos += value;
                    (pos - value, pos)
                } else {
                    neg += value;
                    (neg - value, neg)
                };
                bars.push(BarRect {
                    category,
                    series,
                    band_start: center - half,
                    band_end: center + half,
                    value_start: start,
                    value_end: end,
                    raw_value: raw,
                });
            }
        }
        Placement::Dodge => {
            let slot = width_ratio / present.len().max(1) as f64;
            for (k, &(series, raw)) in present.iter().enumerate() {
                let start = center - half + k as f64 * slot;
                bars.push(BarRect {
                    category,
                    series,
                    band_start: start,
                    band_end: start + slot,
                    value_start: 0.0,
                    value_end: raw,
                    raw_value: raw,
                });
            }
        }
        Placement::Overlap => {
            for &(series, raw) in present {
                bars.push(BarRect {
                    category,
                    series,
                    band_start: center - half,
                    band_end: center + half,
                    value_start: 0.0,
                    value_end: raw,
                    raw_value: raw,
                });
            }
        }
    }
}

fn cell_label(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Names in first-appearance order.
#[derive(Default)]
struct Interner {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Interner {
    fn intern(&mut self, name: String) -> usize {
        if let Some(&idx) = self.index.get(&name) {
            return idx;
        }
        let idx = self.names.len();
        self.index.insert(name.clone(), idx);
        self.names.push(name);
        idx
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    fn into_names(self) -> Vec<String> {
        self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;
    use crate::form::{ChartType, FormOptions, Orientation};
    use crate::ir::FlatProps;
    use crate::render::render_chart;
    use serde_json::{json, Number};

    fn props(form: FormOptions, data: Value) -> FlatProps {
        let data: Vec<Row> = data
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect();
        FlatProps {
            width: Number::from(800),
            height: Number::from(600),
            data,
            form,
        }
    }

    fn form(cols: &[&str], chart_type: &str) -> FormOptions {
        FormOptions {
            cols: Some(cols.iter().copied().collect()),
            metrics: Some(["count"].into_iter().collect()),
            type_of_chart: Some(ChartType::from(chart_type)),
            ..FormOptions::default()
        }
    }

    fn sales() -> Value {
        json!([
            {"region": "north", "product": "x", "count": 3},
            {"region": "north", "product": "y", "count": 1},
            {"region": "south", "product": "x", "count": 12},
            {"region": "north", "product": "x", "count": 2}
        ])
    }

    #[test]
    fn test_single_series_sums_by_category() {
        let props = props(form(&["region"], "vertical"), sales());
        let scene = build_scene(&render_chart(&props)).unwrap();
        assert_eq!(scene.orientation, Orientation::Vertical);
        assert_eq!(scene.categories, vec!["north", "south"]);
        assert_eq!(scene.series, vec![""]);
        assert_eq!(scene.bars.len(), 2);
        assert_eq!(scene.bars[0].value_end, 6.0);
        assert_eq!(scene.bars[1].value_end, 12.0);
        // axis max comes from the config: 12 + 5
        assert_eq!(scene.value_max, 17.0);
    }

    #[test]
    fn test_stacked_series() {
        let mut f = form(&["region", "product"], "horizontal");
        f.stack_mode = Some(true.into());
        let props = props(f, sales());
        let scene = build_scene(&render_chart(&props)).unwrap();
        assert_eq!(scene.orientation, Orientation::Horizontal);
        assert_eq!(scene.series, vec!["x", "y"]);
        let north: Vec<&BarRect> = scene.bars.iter().filter(|b| b.category == 0).collect();
        assert_eq!(north.len(), 2);
        assert_eq!((north[0].value_start, north[0].value_end), (0.0, 5.0));
        assert_eq!((north[1].value_start, north[1].value_end), (5.0, 6.0));
        assert!((north[0].band_end - north[0].band_start - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_grouped_series_dodge() {
        let mut f = form(&["region", "product"], "vertical");
        f.group_mode = Some(true.into());
        let props = props(f, sales());
        let scene = build_scene(&render_chart(&props)).unwrap();
        let north: Vec<&BarRect> = scene.bars.iter().filter(|b| b.category == 0).collect();
        assert_eq!(north.len(), 2);
        assert!((north[0].band_start - 0.1).abs() < 1e-9);
        assert!((north[0].band_end - 0.5).abs() < 1e-9);
        assert!((north[1].band_start - 0.5).abs() < 1e-9);
        // south only has product x, so it takes the whole slot
        let south: Vec<&BarRect> = scene.bars.iter().filter(|b| b.category == 1).collect();
        assert_eq!(south.len(), 1);
        assert!((south[0].band_end - south[0].band_start - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_percent_normalizes_each_category() {
        let mut f = form(&["region", "product"], "vertical");
        f.percent_mode = Some(true.into());
        let props = props(f, sales());
        let scene = build_scene(&render_chart(&props)).unwrap();
        assert_eq!(scene.value_max, 1.0);
        assert!(scene.percent);
        let north_top = scene
            .bars
            .iter()
            .filter(|b| b.category == 0)
            .map(|b| b.value_end)
            .fold(0.0, f64::max);
        assert!((north_top - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_overlap_without_modes() {
        let props = props(form(&["region", "product"], "vertical"), sales());
        let scene = build_scene(&render_chart(&props)).unwrap();
        assert!(scene.bars.iter().all(|b| b.value_start == 0.0));
        assert!(scene.bars.iter().all(|b| (b.band_end - b.band_start - 0.8).abs() < 1e-9));
    }

    #[test]
    fn test_empty_rows_build_an_empty_scene() {
        let props = props(form(&["region"], "vertical"), json!([]));
        let scene = build_scene(&render_chart(&props)).unwrap();
        assert!(scene.categories.is_empty());
        assert!(scene.bars.is_empty());
        assert_eq!(scene.value_max, 1.0);
    }

    #[test]
    fn test_negative_values_extend_the_axis_down() {
        let props = props(
            form(&["region"], "vertical"),
            json!([{"region": "a", "count": -4}, {"region": "b", "count": 2}]),
        );
        let scene = build_scene(&render_chart(&props)).unwrap();
        assert_eq!(scene.value_min, -4.0);
        assert_eq!(scene.value_max, 7.0);
    }

    #[test]
    fn test_missing_bindings_are_reported() {
        let props = props(form(&[], "vertical"), sales());
        let err = build_scene(&render_chart(&props)).unwrap_err();
        assert!(err.to_string().contains("category axis"));
    }
}
