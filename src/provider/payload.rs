use serde::Deserialize;
use serde_json::Value;

use super::ProviderError;
use crate::core::{CurrentRates, HistoricalRecord};

/// Decoded sheet response.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPayload {
    pub historical: Vec<HistoricalRecord>,
    /// `None` for the bare-array form or when the sheet omits current rates.
    pub current_rates: Option<CurrentRates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetObject {
    historical_data: Vec<HistoricalRecord>,
    #[serde(default)]
    current_rates: Option<CurrentRates>,
}

/// Accepts either a bare array of records or `{historicalData, currentRates?}`.
/// An object carrying `error` is reported as a sheet-side failure.
pub fn parse_payload(value: Value) -> Result<SheetPayload, ProviderError> {
    if value.is_array() {
        let historical = serde_json::from_value(value).map_err(ProviderError::Decode)?;
        return Ok(SheetPayload {
            historical,
            current_rates: None,
        });
    }

    let Some(fields) = value.as_object() else {
        return Err(ProviderError::UnexpectedShape);
    };
    if let Some(message) = fields.get("error").filter(|v| !is_falsy(v)) {
        return Err(ProviderError::Sheet(match message {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }));
    }
    if !fields.contains_key("historicalData") {
        return Err(ProviderError::UnexpectedShape);
    }

    let object: SheetObject = serde_json::from_value(value).map_err(ProviderError::Decode)?;
    Ok(SheetPayload {
        historical: object.historical_data,
        current_rates: object.current_rates,
    })
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_is_history_only() {
        let payload = parse_payload(json!([
            {"year": "FY24", "single": 5156.03, "double": 4109.33, "actualCPI": 0.0539},
            {"year": "FY25", "single": 5305.56, "double": 4228.5}
        ]))
        .expect("array payload parses");
        assert_eq!(payload.historical.len(), 2);
        assert_eq!(payload.historical[1].actual_cpi, 0.0);
        assert_eq!(payload.current_rates, None);
    }

    #[test]
    fn object_form_carries_current_rates() {
        let payload = parse_payload(json!({
            "historicalData": [{"year": "FY25", "single": 5305.56, "double": 4228.5}],
            "currentRates": {"single": 4300, "double": 3400}
        }))
        .expect("object payload parses");
        assert_eq!(
            payload.current_rates,
            Some(CurrentRates {
                single: 4300.0,
                double: 3400.0
            })
        );
    }

    #[test]
    fn object_form_without_current_rates_is_accepted() {
        let payload = parse_payload(json!({"historicalData": []})).expect("parses");
        assert!(payload.historical.is_empty());
        assert_eq!(payload.current_rates, None);
    }

    #[test]
    fn blank_and_null_cells_read_as_zero() {
        let payload = parse_payload(json!({
            "historicalData": [
                {"year": "FY25", "single": 5305.56, "double": 4228.5, "actualCPI": 0.0387},
                {"year": "FY26", "single": 5438.2, "double": 4334.21, "actualCPI": null}
            ]
        }))
        .expect("null cells are accepted");
        assert_eq!(payload.historical.len(), 2);
        assert_eq!(payload.historical[1].actual_cpi, 0.0);

        let payload = parse_payload(json!([
            {"year": "FY30", "single": "", "double": "", "actualCPI": ""}
        ]))
        .expect("empty cells are accepted");
        assert_eq!(payload.historical[0].single, 0.0);
        assert_eq!(payload.historical[0].double, 0.0);
    }

    #[test]
    fn error_field_is_a_sheet_failure() {
        let err = parse_payload(json!({"error": "Sheet not found"})).expect_err("error payload");
        assert!(matches!(err, ProviderError::Sheet(ref msg) if msg == "Sheet not found"));
    }

    #[test]
    fn empty_error_field_is_ignored() {
        let payload = parse_payload(json!({"error": "", "historicalData": []})).expect("parses");
        assert!(payload.historical.is_empty());
    }

    #[test]
    fn unknown_shapes_are_rejected() {
        assert!(matches!(
            parse_payload(json!({"rows": []})),
            Err(ProviderError::UnexpectedShape)
        ));
        assert!(matches!(
            parse_payload(json!("FY25")),
            Err(ProviderError::UnexpectedShape)
        ));
        assert!(matches!(
            parse_payload(json!([{"single": 1.0}])),
            Err(ProviderError::Decode(_))
        ));
    }
}
