use crate::form::{LabelPosition, Orientation};
use crate::ir::{BarRect, BarScene, FlatProps, LegendPosition};
use crate::layout::build_scene;
use crate::render::render_chart;
use crate::{OutputFormat, RenderOptions};
use anyhow::{bail, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::debug;

/// Blank space around the plot, in pixels.
const SURFACE_PADDING: u32 = 16;

/// Largest bitmap the PNG path allocates, in pixels.
const MAX_BITMAP_PIXELS: u64 = 64 * 1024 * 1024;

/// Render flat props straight to an image: select the configuration, lay it
/// out and draw it.
pub fn render_preview(props: &FlatProps, options: &RenderOptions) -> Result<Vec<u8>> {
    let rendered = render_chart(props);
    let scene = build_scene(&rendered).context("Failed to lay out bars")?;
    Canvas::new(options)
        .with_bold_text(props.form.is_bold())
        .render(&scene)
}

/// Drawing surface for a bar scene
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    format: OutputFormat,
    bold_text: bool,
}

impl Canvas {
    pub fn new(options: &RenderOptions) -> Self {
        Self {
            width: options.width.max(1),
            height: options.height.max(1),
            format: options.format,
            bold_text: false,
        }
    }

    pub fn with_bold_text(mut self, bold: bool) -> Self {
        self.bold_text = bold;
        self
    }

    /// Draw the scene and encode it in the canvas' output format
    pub fn render(&self, scene: &BarScene) -> Result<Vec<u8>> {
        debug!(width = self.width, height = self.height, format = ?self.format, "rendering preview");
        match self.format {
            OutputFormat::Png => self.render_png(scene),
            OutputFormat::Svg => self.render_svg(scene).map(String::into_bytes),
        }
    }

    fn render_png(&self, scene: &BarScene) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; rgb_buffer_len(self.width, self.height)?];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root, scene)?;
        }

        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&buffer, self.width, self.height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }

    fn render_svg(&self, scene: &BarScene) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root, scene)?;
        }
        Ok(svg)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>, scene: &BarScene) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE).context("Failed to fill background")?;
        let area = root.margin(SURFACE_PADDING, SURFACE_PADDING, SURFACE_PADDING, SURFACE_PADDING);

        // Category i is centered on i in drawing space.
        let horizontal = scene.orientation == Orientation::Horizontal;
        let n_categories = scene.categories.len().max(1);
        let bands = -0.5..(n_categories as f64 - 0.5);
        let values = scene.value_min..scene.value_max;
        let (x_range, y_range) = if horizontal {
            (values, bands)
        } else {
            (bands, values)
        };
        let point = |band: f64, value: f64| {
            if horizontal {
                (value, band - 0.5)
            } else {
                (band - 0.5, value)
            }
        };

        let mut chart = ChartBuilder::on(&area)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(x_range, y_range)
            .context("Failed to build chart")?;

        let categories = &scene.categories;
        let category_label = |v: &f64| {
            let idx = v.round();
            if (v - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            categories.get(idx as usize).cloned().unwrap_or_default()
        };
        let percent = scene.percent;
        let value_label = |v: &f64| {
            if percent {
                format!("{:.0}%", v * 100.0)
            } else {
                format_value(*v)
            }
        };

        {
            let mut mesh = chart.configure_mesh();
            mesh.disable_x_mesh().disable_y_mesh();
            if horizontal {
                mesh.x_label_formatter(&value_label)
                    .y_label_formatter(&category_label)
                    .y_labels(n_categories);
            } else {
                mesh.x_label_formatter(&category_label)
                    .y_label_formatter(&value_label)
                    .x_labels(n_categories);
            }
            mesh.draw().context("Failed to draw mesh")?;
        }

        for (series_idx, name) in scene.series.iter().enumerate() {
            let color = Palette99::pick(series_idx).to_rgba();
            let rects = scene
                .bars
                .iter()
                .filter(|b| b.series == series_idx)
                .map(|b| {
                    Rectangle::new(
                        [point(b.band_start, b.value_start), point(b.band_end, b.value_end)],
                        color.filled(),
                    )
                });
            let anno = chart.draw_series(rects).context("Failed to draw bars")?;
            if !name.is_empty() {
                anno.label(name.as_str()).legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
            }
        }

        let font = ("sans-serif", scene.font_size).into_font();
        let font = if self.bold_text {
            font.style(FontStyle::Bold)
        } else {
            font
        };
        let text_style = font.color(&BLACK).pos(Pos::new(HPos::Center, VPos::Center));
        let labels = scene.bars.iter().map(|b| {
            let (band, value) = label_anchor(b, scene.label_position);
            Text::new(bar_label(b, percent), point(band, value), text_style.clone())
        });
        chart.draw_series(labels).context("Failed to draw labels")?;

        if scene.series.iter().any(|s| !s.is_empty()) {
            let position = match scene.legend {
                LegendPosition::Top => SeriesLabelPosition::UpperMiddle,
                LegendPosition::Right => SeriesLabelPosition::UpperRight,
            };
            chart
                .configure_series_labels()
                .position(position)
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .context("Failed to draw legend")?;
        }

        root.present().context("Failed to present drawing")?;
        Ok(())
    }
}

/// Size of an RGB8 buffer for a `width` x `height` bitmap.
fn rgb_buffer_len(width: u32, height: u32) -> Result<usize> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels > MAX_BITMAP_PIXELS {
        bail!(
            "{}x{} preview exceeds the {} pixel bitmap limit",
            width,
            height,
            MAX_BITMAP_PIXELS
        );
    }
    usize::try_from(pixels * 3).context("Bitmap size does not fit in memory")
}

/// Where a bar's value label sits, in band/value space. Start-side positions
/// (left, bottom) hug the bar's base, end-side ones (right, top) its tip.
fn label_anchor(bar: &BarRect, position: LabelPosition) -> (f64, f64) {
    let band = (bar.band_start + bar.band_end) / 2.0;
    let value = match position {
        LabelPosition::Middle => (bar.value_start + bar.value_end) / 2.0,
        LabelPosition::Left | LabelPosition::Bottom => bar.value_start,
        LabelPosition::Right | LabelPosition::Top => bar.value_end,
    };
    (band, value)
}

fn bar_label(bar: &BarRect, percent: bool) -> String {
    if percent {
        format!("{:.0}%", (bar.value_end - bar.value_start) * 100.0)
    } else {
        format_value(bar.raw_value)
    }
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.0}", v)
    } else {
        let s = format!("{:.2}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
