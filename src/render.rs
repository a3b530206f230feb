// Chart renderer: flat props -> configuration for the charting library

use crate::form::{FormOptions, Orientation};
use crate::ir::{
    AxisConfig, ChartConfig, FlatProps, LabelConfig, LabelLayout, LabelStyle, LegendConfig,
    LegendPosition, Primitive, RenderedChart, BAR_WIDTH_RATIO, LABEL_OFFSET,
};
use crate::scale::{value_axis_max, BOUND_FIELD};
use tracing::{debug, warn};

/// Build both orientation variants and hand back the one `typeOfChart` selects.
///
/// Only `horizontal` selects horizontal bars. Anything else, including
/// values the control panel never offers, falls back to vertical columns.
/// Other options the chart cannot interpret take their defaults here; the
/// props themselves are never rewritten.
pub fn render_chart(props: &FlatProps) -> RenderedChart<'_> {
    let bound = value_axis_max(&props.data, BOUND_FIELD);
    let form = &props.form;

    for (option, value) in form.unresolved() {
        warn!(option, %value, "unusable form option, using its default");
    }

    let rendered = match form.orientation() {
        Orientation::Horizontal => RenderedChart {
            primitive: Primitive::Bar,
            config: horizontal_config(props, bound),
        },
        Orientation::Vertical => RenderedChart {
            primitive: Primitive::Column,
            config: vertical_config(props, bound),
        },
    };

    debug!(
        primitive = ?rendered.primitive,
        rows = props.data.len(),
        axis_max = ?bound,
        "selected chart configuration"
    );
    rendered
}

/// Columns: categories along x, the metric up y, legend on top.
pub fn vertical_config(props: &FlatProps, bound: Option<f64>) -> ChartConfig<'_> {
    let form = &props.form;
    ChartConfig {
        x_field: form.column(0),
        y_field: form.metric(0),
        y_axis: Some(AxisConfig { max: bound }),
        legend: LegendConfig {
            position: LegendPosition::Top,
        },
        ..shared_config(props)
    }
}

/// Bars: the metric along x, categories down y, legend on the right.
pub fn horizontal_config(props: &FlatProps, bound: Option<f64>) -> ChartConfig<'_> {
    let form = &props.form;
    ChartConfig {
        x_field: form.metric(0),
        y_field: form.column(0),
        x_axis: Some(AxisConfig { max: bound }),
        legend: LegendConfig {
            position: LegendPosition::Right,
        },
        ..shared_config(props)
    }
}

fn shared_config(props: &FlatProps) -> ChartConfig<'_> {
    let form: &FormOptions = &props.form;
    ChartConfig {
        data: &props.data,
        x_field: None,
        y_field: None,
        series_field: form.column(1),
        is_group: form.is_group(),
        is_percent: form.is_percent(),
        is_stack: form.is_stack(),
        x_axis: None,
        y_axis: None,
        label: label_config(form),
        legend: LegendConfig {
            position: LegendPosition::Top,
        },
        bar_width_ratio: BAR_WIDTH_RATIO,
    }
}

fn label_config(form: &FormOptions) -> LabelConfig {
    LabelConfig {
        position: form.label_position(),
        offset: LABEL_OFFSET,
        style: LabelStyle {
            font_size: form.font_size_px(),
        },
        auto_rotate: true,
        layout: vec![LabelLayout::IntervalHideOverlap, LabelLayout::AdjustColor],
    }
}
