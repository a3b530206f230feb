// Form options chosen in the host's control panel

use crate::controls;
use crate::error::{PluginError, PluginResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::str::FromStr;

pub const DEFAULT_FONT_SIZE: f64 = 14.0;

/// Font sizes offered by the control panel, with their display names.
pub const FONT_SIZES: [(f64, &str); 7] = [
    (6.0, "xx-small"),
    (8.0, "x-small"),
    (12.0, "small"),
    (14.0, "medium"),
    (16.0, "large"),
    (20.0, "x-large"),
    (26.0, "xx-large"),
];

/// The closed set of options the chart understands.
///
/// Every field keeps the value the host sent, shape and all, so the options
/// serialize back unchanged. Fields the host left out stay out. Keys not
/// listed here are dropped on decode. Interpreting the values is left to the
/// accessors, which fall back to a default for anything unusable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormOptions {
    /// Grouping dimensions: the first is the category axis, the second splits series.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub cols: Option<FieldList>,
    /// Aggregates; only the first one is plotted.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub metrics: Option<FieldList>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub bold_text: Option<Flag>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub font_size: Option<FontSize>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub group_mode: Option<Flag>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub percent_mode: Option<Flag>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub stack_mode: Option<Flag>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub type_of_chart: Option<ChartType>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub label_position: Option<LabelChoice>,
}

/// A key that is present decodes to `Some`, even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl FormOptions {
    /// Name of the `idx`-th grouping column.
    pub fn column(&self, idx: usize) -> Option<&str> {
        self.cols.as_ref().and_then(|cols| cols.get(idx))
    }

    /// Name of the `idx`-th metric.
    pub fn metric(&self, idx: usize) -> Option<&str> {
        self.metrics.as_ref().and_then(|metrics| metrics.get(idx))
    }

    pub fn is_group(&self) -> bool {
        self.group_mode.as_ref().is_some_and(Flag::is_on)
    }

    pub fn is_percent(&self) -> bool {
        self.percent_mode.as_ref().is_some_and(Flag::is_on)
    }

    pub fn is_stack(&self) -> bool {
        self.stack_mode.as_ref().is_some_and(Flag::is_on)
    }

    pub fn is_bold(&self) -> bool {
        self.bold_text.as_ref().is_some_and(Flag::is_on)
    }

    /// Only the literal `horizontal` selects horizontal bars. Everything else
    /// renders vertically, a missing or unrecognized `typeOfChart` included.
    pub fn orientation(&self) -> Orientation {
        match self.type_of_chart {
            Some(ChartType::Horizontal) => Orientation::Horizontal,
            _ => Orientation::Vertical,
        }
    }

    /// Label font size in pixels.
    pub fn font_size_px(&self) -> f64 {
        self.font_size
            .as_ref()
            .and_then(FontSize::resolve)
            .unwrap_or(DEFAULT_FONT_SIZE)
    }

    pub fn label_position(&self) -> LabelPosition {
        match &self.label_position {
            Some(LabelChoice::Known(pos)) => *pos,
            _ => LabelPosition::default(),
        }
    }

    /// Options that carry a value the chart cannot interpret and will replace
    /// with its default. Missing options and explicit nulls are not listed.
    pub fn unresolved(&self) -> Vec<(&'static str, &Value)> {
        let mut found = Vec::new();
        let flags = [
            ("boldText", &self.bold_text),
            ("groupMode", &self.group_mode),
            ("percentMode", &self.percent_mode),
            ("stackMode", &self.stack_mode),
        ];
        for (name, flag) in flags {
            if let Some(flag) = flag {
                if flag.resolve().is_none() {
                    found.push((name, &flag.0));
                }
            }
        }
        if let Some(size) = &self.font_size {
            if size.resolve().is_none() && !size.0.is_null() {
                found.push(("fontSize", &size.0));
            }
        }
        if let Some(ChartType::Unrecognized(raw)) = &self.type_of_chart {
            if !raw.is_null() {
                found.push(("typeOfChart", raw));
            }
        }
        if let Some(LabelChoice::Unrecognized(raw)) = &self.label_position {
            if !raw.is_null() {
                found.push(("labelPosition", raw));
            }
        }
        found
    }

    /// Check the options against the validators and choices declared by the
    /// control panel. Decoding never rejects a value; this is the strict pass.
    pub fn validate(&self) -> PluginResult<()> {
        let values = serde_json::to_value(self)?;
        let missing = Value::Null;
        let mut problems = Vec::new();

        for control in controls::control_panel().controls() {
            let value = match values.get(control.name) {
                Some(value) => value,
                None if control.validators.is_empty() => continue,
                None => &missing,
            };
            if let Err(msg) = control.check(value) {
                problems.push(format!("{}: {}", control.name, msg));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(PluginError::InvalidFormData(problems.join("; ")))
        }
    }
}

/// A column or metric list as sent by the host. Entries are plain names or
/// ad-hoc objects that carry a `label`, which is the key the rows use. A
/// single entry may arrive without the surrounding array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldList(pub Value);

impl FieldList {
    /// Name of the entry at `idx`, if that entry has one.
    pub fn get(&self, idx: usize) -> Option<&str> {
        match &self.0 {
            Value::Array(items) => items.get(idx).and_then(field_name),
            Value::Null => None,
            single if idx == 0 => field_name(single),
            _ => None,
        }
    }
}

fn field_name(item: &Value) -> Option<&str> {
    match item {
        Value::String(s) => Some(s.as_str()),
        Value::Object(obj) => obj.get("label").and_then(Value::as_str),
        _ => None,
    }
}

impl<S: Into<String>> FromIterator<S> for FieldList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        FieldList(Value::Array(
            iter.into_iter().map(|name| Value::String(name.into())).collect(),
        ))
    }
}

/// An on/off option. Select controls offer `true`/`false` labelled `yes`/`no`,
/// and the host may send either.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flag(pub Value);

impl Flag {
    pub fn resolve(&self) -> Option<bool> {
        match &self.0 {
            Value::Null => Some(false),
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.as_str() {
                "yes" | "true" => Some(true),
                "no" | "false" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Unusable values count as off.
    pub fn is_on(&self) -> bool {
        self.resolve().unwrap_or(false)
    }
}

impl From<bool> for Flag {
    fn from(b: bool) -> Self {
        Flag(Value::Bool(b))
    }
}

/// Label font size: a pixel count, a numeric string or one of the size names
/// the control panel displays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontSize(pub Value);

impl FontSize {
    pub fn resolve(&self) -> Option<f64> {
        let size = match &self.0 {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().or_else(|| {
                FONT_SIZES
                    .iter()
                    .find(|(_, name)| *name == s.as_str())
                    .map(|(size, _)| *size)
            }),
            _ => None,
        };
        size.filter(|size| size.is_finite() && *size > 0.0)
    }
}

impl From<f64> for FontSize {
    fn from(size: f64) -> Self {
        FontSize(Value::from(size))
    }
}

/// Orientation of the bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl FromStr for Orientation {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" => Ok(Orientation::Horizontal),
            "vertical" => Ok(Orientation::Vertical),
            other => Err(PluginError::InvalidFormData(format!(
                "unknown chart type '{}' (expected 'horizontal' or 'vertical')",
                other
            ))),
        }
    }
}

/// The `typeOfChart` option as sent by the host. Anything other than the two
/// known literals is kept verbatim, whatever its JSON type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartType {
    Horizontal,
    Vertical,
    Unrecognized(Value),
}

impl From<&str> for ChartType {
    fn from(s: &str) -> Self {
        match s.parse::<Orientation>() {
            Ok(Orientation::Horizontal) => ChartType::Horizontal,
            Ok(Orientation::Vertical) => ChartType::Vertical,
            Err(_) => ChartType::Unrecognized(Value::String(s.to_string())),
        }
    }
}

impl Serialize for ChartType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChartType::Horizontal => serializer.serialize_str("horizontal"),
            ChartType::Vertical => serializer.serialize_str("vertical"),
            ChartType::Unrecognized(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ChartType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => ChartType::from(s.as_str()),
            other => ChartType::Unrecognized(other),
        })
    }
}

/// Where value labels sit relative to their bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPosition {
    Left,
    #[default]
    Middle,
    Right,
    Top,
    Bottom,
}

impl LabelPosition {
    pub const ALL: [LabelPosition; 5] = [
        LabelPosition::Left,
        LabelPosition::Middle,
        LabelPosition::Right,
        LabelPosition::Top,
        LabelPosition::Bottom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LabelPosition::Left => "left",
            LabelPosition::Middle => "middle",
            LabelPosition::Right => "right",
            LabelPosition::Top => "top",
            LabelPosition::Bottom => "bottom",
        }
    }
}

impl FromStr for LabelPosition {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LabelPosition::ALL
            .into_iter()
            .find(|pos| pos.as_str() == s)
            .ok_or_else(|| PluginError::InvalidFormData(format!("unknown label position '{}'", s)))
    }
}

/// The `labelPosition` option as sent by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelChoice {
    Known(LabelPosition),
    Unrecognized(Value),
}

impl From<LabelPosition> for LabelChoice {
    fn from(pos: LabelPosition) -> Self {
        LabelChoice::Known(pos)
    }
}

impl Serialize for LabelChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LabelChoice::Known(pos) => pos.serialize(serializer),
            LabelChoice::Unrecognized(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for LabelChoice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value.as_str().map(str::parse::<LabelPosition>) {
            Some(Ok(pos)) => Ok(LabelChoice::Known(pos)),
            _ => Ok(LabelChoice::Unrecognized(value)),
        }
    }
}
