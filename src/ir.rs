use crate::data::Row;
use crate::form::{FormOptions, LabelPosition, Orientation};
use serde::{Deserialize, Serialize};
use serde_json::Number;

// =============================================================================
// Phase 1: Props
// =============================================================================

/// What the host hands the chart on every render.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPropsEnvelope {
    #[serde(default = "zero")]
    pub width: Number,
    #[serde(default = "zero")]
    pub height: Number,
    #[serde(default)]
    pub form_data: FormOptions,
    #[serde(default)]
    pub queries_data: Vec<crate::data::QueryResult>,
}

/// Flat props: surface size, the first result set's rows and every known
/// form option, all passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatProps {
    pub width: Number,
    pub height: Number,
    pub data: Vec<Row>,
    #[serde(flatten)]
    pub form: FormOptions,
}

fn zero() -> Number {
    Number::from(0)
}

// =============================================================================
// Phase 2: Chart configuration
// =============================================================================

pub const BAR_WIDTH_RATIO: f64 = 0.8;
pub const LABEL_OFFSET: f64 = 4.0;

/// The charting library's entry point the config is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Primitive {
    /// Horizontal bars.
    Bar,
    /// Vertical columns.
    Column,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedChart<'a> {
    pub primitive: Primitive,
    pub config: ChartConfig<'a>,
}

/// Field bindings and options for one of the two primitives. Unset field
/// bindings are left out rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig<'a> {
    pub data: &'a [Row],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_field: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_field: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_field: Option<&'a str>,
    pub is_group: bool,
    pub is_percent: bool,
    pub is_stack: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<AxisConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<AxisConfig>,
    pub label: LabelConfig,
    pub legend: LegendConfig,
    pub bar_width_ratio: f64,
}

impl<'a> ChartConfig<'a> {
    pub fn orientation(&self) -> Orientation {
        if self.x_axis.is_some() {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }

    /// Field laid out along the category axis.
    pub fn category_field(&self) -> Option<&'a str> {
        match self.orientation() {
            Orientation::Horizontal => self.y_field,
            Orientation::Vertical => self.x_field,
        }
    }

    /// Field whose values set the bar lengths.
    pub fn value_field(&self) -> Option<&'a str> {
        match self.orientation() {
            Orientation::Horizontal => self.x_field,
            Orientation::Vertical => self.y_field,
        }
    }

    pub fn value_axis(&self) -> Option<&AxisConfig> {
        self.x_axis.as_ref().or(self.y_axis.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AxisConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelConfig {
    pub position: LabelPosition,
    pub offset: f64,
    pub style: LabelStyle,
    pub auto_rotate: bool,
    pub layout: Vec<LabelLayout>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelStyle {
    pub font_size: f64,
}

/// Post-layout label adjustments run by the charting library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LabelLayout {
    IntervalHideOverlap,
    AdjustColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegendConfig {
    pub position: LegendPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Top,
    Right,
}

// =============================================================================
// Phase 3: Preview scene
// =============================================================================

/// Bars in band/value space, independent of orientation. Category `i`
/// occupies the band `[i, i + 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BarScene {
    pub orientation: Orientation,
    pub categories: Vec<String>,
    /// Series names; a single empty name when the chart has no series field.
    pub series: Vec<String>,
    pub bars: Vec<BarRect>,
    pub value_min: f64,
    pub value_max: f64,
    pub label_position: LabelPosition,
    pub font_size: f64,
    pub legend: LegendPosition,
    pub percent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarRect {
    pub category: usize,
    pub series: usize,
    pub band_start: f64,
    pub band_end: f64,
    pub value_start: f64,
    pub value_end: f64,
    /// The unstacked, unnormalized value, used for the label text.
    pub raw_value: f64,
}
