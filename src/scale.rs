use crate::data::Row;
use serde_json::Value;
use tracing::{debug, trace};

/// Field the value-axis bound is derived from.
pub const BOUND_FIELD: &str = "count";

/// Headroom added above the tallest bar so it is not clipped.
pub const AXIS_PADDING: f64 = 5.0;

/// Numeric view of a cell. Numbers and strings holding a finite number count;
/// everything else (missing, null, bool, text, NaN, infinities) does not.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let num = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    num.is_finite().then_some(num)
}

/// Largest numeric value of `field` across `rows`, skipping rows where the
/// field is missing or not numeric. `None` when no row contributes.
pub fn max_value(rows: &[Row], field: &str) -> Option<f64> {
    let mut skipped = 0usize;
    let max = rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            let num = row.get(field).and_then(coerce_number);
            if num.is_none() {
                trace!(row = idx, field, "skipping row without a numeric value");
                skipped += 1;
            }
            num
        })
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));

    if skipped > 0 {
        debug!(field, skipped, total = rows.len(), "rows left out of the axis bound");
    }
    max
}

/// Value-axis maximum: the largest `field` value plus [`AXIS_PADDING`].
/// `None` leaves the axis to the charting library's own default.
pub fn value_axis_max(rows: &[Row], field: &str) -> Option<f64> {
    max_value(rows, field).map(|max| max + AXIS_PADDING)
}
