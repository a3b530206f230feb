// Control panel declaration consumed by the host UI

use crate::form::{LabelPosition, FONT_SIZES};
use serde::Serialize;
use serde_json::{json, Value};

pub const DEFAULT_ROW_LIMIT: u64 = 10_000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPanel {
    pub sections: Vec<ControlSection>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlSection {
    pub label: &'static str,
    pub expanded: bool,
    pub controls: Vec<Control>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub control_type: ControlType,
    pub label: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    pub multi: bool,
    pub render_trigger: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
}

/// `[value, label]`, the shape select controls take their options in.
#[derive(Debug, Clone, Serialize)]
pub struct Choice(pub Value, pub &'static str);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlType {
    SelectControl,
    MetricsControl,
    AdhocFilterControl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Validator {
    #[serde(rename = "validateNonEmpty")]
    NonEmpty,
}

impl Validator {
    pub fn check(self, value: &Value) -> Result<(), String> {
        match self {
            Validator::NonEmpty => {
                let empty = match value {
                    Value::Null => true,
                    Value::Array(items) => items.is_empty(),
                    Value::String(s) => s.is_empty(),
                    _ => false,
                };
                if empty {
                    Err("cannot be empty".to_string())
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl Control {
    fn select(name: &'static str, label: &'static str, description: &'static str) -> Self {
        Self {
            name,
            control_type: ControlType::SelectControl,
            label,
            description,
            default: None,
            choices: Vec::new(),
            multi: false,
            render_trigger: true,
            validators: Vec::new(),
        }
    }

    /// The default is the label `no` rather than the value `false`; hosts
    /// built against this panel send it back verbatim.
    fn yes_no(name: &'static str, label: &'static str, description: &'static str) -> Self {
        Self {
            default: Some(json!("no")),
            choices: vec![Choice(json!(true), "yes"), Choice(json!(false), "no")],
            ..Self::select(name, label, description)
        }
    }

    /// Run the declared validators, then check the value against the choices
    /// when the control offers a fixed set. A choice's label and the control's
    /// own default are accepted as well as the choice values.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        for validator in &self.validators {
            validator.check(value)?;
        }
        let offered = self.choices.is_empty()
            || self
                .choices
                .iter()
                .any(|c| same_value(&c.0, value) || value.as_str() == Some(c.1))
            || self.default.as_ref().is_some_and(|d| same_value(d, value));
        if offered {
            Ok(())
        } else {
            Err(format!("{} is not one of the offered choices", value))
        }
    }
}

/// JSON equality that treats `14` and `14.0` as the same number.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

impl ControlPanel {
    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.sections.iter().flat_map(|s| s.controls.iter())
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls().find(|c| c.name == name)
    }
}

/// The control panel: a `Query` section feeding the backend query and a
/// `Controls` section with the render-only options.
pub fn control_panel() -> ControlPanel {
    let query = ControlSection {
        label: "Query",
        expanded: true,
        controls: vec![
            Control {
                multi: true,
                render_trigger: false,
                ..Control::select("cols", "Columns", "Columns to group by")
            },
            Control {
                control_type: ControlType::MetricsControl,
                multi: true,
                render_trigger: false,
                validators: vec![Validator::NonEmpty],
                ..Control::select("metrics", "Metrics", "One or many metrics to display")
            },
            Control {
                control_type: ControlType::AdhocFilterControl,
                render_trigger: false,
                ..Control::select("adhoc_filters", "Filters", "Filters applied to the query")
            },
            Control {
                default: Some(json!(DEFAULT_ROW_LIMIT)),
                render_trigger: false,
                ..Control::select("row_limit", "Row limit", "Maximum number of rows to fetch")
            },
        ],
    };

    let chart_controls = ControlSection {
        label: "Controls",
        expanded: true,
        controls: vec![
            Control {
                default: Some(json!("horizontal")),
                choices: vec![
                    Choice(json!("horizontal"), "horizontal"),
                    Choice(json!("vertical"), "vertical"),
                ],
                ..Control::select("typeOfChart", "Type", "Type of chart")
            },
            Control {
                default: Some(json!(LabelPosition::default().as_str())),
                choices: LabelPosition::ALL
                    .iter()
                    .map(|pos| Choice(json!(pos.as_str()), pos.as_str()))
                    .collect(),
                ..Control::select("labelPosition", "Label position", "Label position")
            },
            // `xl` is not among the choices. The chart resolves it to
            // DEFAULT_FONT_SIZE.
            Control {
                default: Some(json!("xl")),
                choices: FONT_SIZES
                    .iter()
                    .map(|(size, name)| Choice(json!(size), *name))
                    .collect(),
                ..Control::select("fontSize", "Font Size", "The size of your font")
            },
            Control::yes_no("groupMode", "Group", "Use group mode"),
            Control::yes_no("percentMode", "Percent", "Use percent mode"),
            Control::yes_no("stackMode", "Stack", "Use stack mode"),
        ],
    };

    ControlPanel {
        sections: vec![query, chart_controls],
    }
}
