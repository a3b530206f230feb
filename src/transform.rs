use crate::data::Row;
use crate::error::{PluginError, PluginResult};
use crate::ir::{ChartPropsEnvelope, FlatProps};
use tracing::debug;

/// Main entry point: reshape the host's envelope into flat props.
///
/// Only the first result set is used. An envelope without any result set is
/// reported as [`PluginError::MissingQueryResult`].
pub fn transform_props(envelope: ChartPropsEnvelope) -> PluginResult<FlatProps> {
    let ChartPropsEnvelope {
        width,
        height,
        form_data,
        queries_data,
    } = envelope;

    let first = queries_data
        .into_iter()
        .next()
        .ok_or(PluginError::MissingQueryResult)?;

    debug!(rows = first.data.len(), %width, %height, "transformed chart props");

    Ok(FlatProps {
        width,
        height,
        data: first.data,
        form: form_data,
    })
}

/// Same as [`transform_props`], but with rows supplied from elsewhere (a CSV
/// file, for instance) instead of the envelope's result sets.
pub fn transform_props_with_rows(envelope: ChartPropsEnvelope, rows: Vec<Row>) -> FlatProps {
    debug!(rows = rows.len(), "transformed chart props with external rows");
    FlatProps {
        width: envelope.width,
        height: envelope.height,
        data: rows,
        form: envelope.form_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{ChartType, LabelPosition};
    use serde_json::{json, Value};

    fn envelope(value: Value) -> ChartPropsEnvelope {
        serde_json::from_value(value).unwrap()
    }

    fn sample() -> Value {
        json!({
            "width": 640,
            "height": 480,
            "formData": {
                "cols": ["col1", "col2"],
                "metrics": ["count"],
                "groupMode": true,
                "percentMode": false,
                "stackMode": false,
                "typeOfChart": "vertical",
                "fontSize": 16,
                "labelPosition": "top",
                "datasource": "3__table",
                "viz_type": "ext-bar"
            },
            "queriesData": [
                {"data": [{"col1": "a", "count": 3}, {"col1": "b", "count": 12}], "rowcount": 2, "query": "SELECT 1"},
                {"data": [{"col1": "ignored", "count": 1000}]}
            ]
        })
    }

    #[test]
    fn test_transform_uses_first_result_set() {
        let props = transform_props(envelope(sample())).unwrap();
        assert_eq!(props.data.len(), 2);
        assert_eq!(props.data[1]["count"], json!(12));
    }

    #[test]
    fn test_transform_passes_form_through() {
        let props = transform_props(envelope(sample())).unwrap();
        assert_eq!(props.width, serde_json::Number::from(640));
        assert_eq!(props.height, serde_json::Number::from(480));
        assert_eq!(props.form.column(1), Some("col2"));
        assert_eq!(props.form.metric(0), Some("count"));
        assert!(props.form.is_group());
        assert_eq!(props.form.type_of_chart, Some(ChartType::Vertical));
        assert_eq!(props.form.font_size_px(), 16.0);
        assert_eq!(props.form.label_position(), LabelPosition::Top);
    }

    #[test]
    fn test_transform_keeps_non_canonical_options() {
        let options = json!({
            "cols": [{"label": "region", "sqlExpression": "region"}],
            "metrics": [{"sqlExpression": "COUNT(*)"}],
            "boldText": "no",
            "fontSize": "xl",
            "groupMode": "yes",
            "percentMode": "maybe",
            "stackMode": 0,
            "typeOfChart": 5,
            "labelPosition": "inside"
        });
        let mut value = sample();
        value["formData"] = options.clone();
        let props = transform_props(envelope(value)).unwrap();
        let encoded = serde_json::to_value(&props).unwrap();
        for (key, raw) in options.as_object().unwrap() {
            assert_eq!(&encoded[key], raw, "{} changed", key);
        }
    }

    #[test]
    fn test_flat_props_shape() {
        let props = transform_props(envelope(sample())).unwrap();
        let value = serde_json::to_value(&props).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "width", "height", "data", "cols", "metrics", "fontSize", "groupMode",
                "percentMode", "stackMode", "typeOfChart", "labelPosition"
            ]
        );
        assert_eq!(value["width"], json!(640));
        assert!(value.get("viz_type").is_none());
    }

    #[test]
    fn test_transform_reports_missing_result_set() {
        let mut value = sample();
        value["queriesData"] = json!([]);
        let err = transform_props(envelope(value)).unwrap_err();
        assert!(matches!(err, PluginError::MissingQueryResult));
    }

    #[test]
    fn test_transform_accepts_empty_rows() {
        let mut value = sample();
        value["queriesData"] = json!([{"data": []}]);
        let props = transform_props(envelope(value)).unwrap();
        assert!(props.data.is_empty());
    }

    #[test]
    fn test_transform_with_external_rows() {
        let rows = vec![json!({"col1": "z", "count": 1}).as_object().unwrap().clone()];
        let props = transform_props_with_rows(envelope(sample()), rows);
        assert_eq!(props.data.len(), 1);
        assert_eq!(props.data[0]["col1"], json!("z"));
        assert_eq!(props.form.metric(0), Some("count"));
    }
}
