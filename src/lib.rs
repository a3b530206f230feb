// Library exports for barchart

pub mod controls;
pub mod data;
pub mod error;
pub mod form;
pub mod graph;
pub mod ir;
pub mod layout;
pub mod render;
pub mod scale;
pub mod telemetry;
pub mod transform;

pub use error::{PluginError, PluginResult};
pub use form::{ChartType, FieldList, Flag, FontSize, FormOptions, LabelChoice, LabelPosition, Orientation};
pub use ir::{ChartConfig, ChartPropsEnvelope, FlatProps, Primitive, RenderedChart};
pub use render::render_chart;
pub use transform::transform_props;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}

impl RenderOptions {
    /// Size the preview like the host's render surface, keeping the defaults
    /// for dimensions that are missing or not positive.
    pub fn for_props(props: &FlatProps, format: OutputFormat) -> Self {
        let pixels = |n: &serde_json::Number, fallback: u32| match n.as_f64() {
            Some(v) if v >= 1.0 => v.round().min(u32::MAX as f64) as u32,
            _ => fallback,
        };
        Self {
            width: pixels(&props.width, default_width()),
            height: pixels(&props.height, default_height()),
            format,
        }
    }
}
