use std::collections::BTreeMap;

use chrono::DateTime;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{Field, FieldKind, decimal_pattern};

pub type FieldErrors = BTreeMap<String, FieldError>;

/// Errors for one field: either its own messages or, for nested objects,
/// the errors of its members.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldError {
    Messages(Vec<String>),
    Nested(FieldErrors),
}

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const BLANK: &str = "This field may not be blank.";
const INVALID_NUMBER: &str = "A valid number is required.";
const INVALID_INTEGER: &str = "A valid integer is required.";
const INVALID_STRING: &str = "Not a valid string.";
const INVALID_DATETIME: &str = "Datetime has wrong format. Use one of these formats instead: \
     YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].";

static DECIMAL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]*(\.[0-9]+)?$").expect("valid decimal shape regex"));

static DECIMAL_PATTERNS: Lazy<DashMap<u32, Regex>> = Lazy::new(DashMap::new);

fn pattern_for(decimal_places: u32) -> Regex {
    DECIMAL_PATTERNS
        .entry(decimal_places)
        .or_insert_with(|| {
            Regex::new(&decimal_pattern(decimal_places)).expect("valid decimal pattern")
        })
        .clone()
}

/// Checks `value` against the declared fields, collecting every failure
/// rather than stopping at the first one. Unknown keys are ignored.
pub fn validate(fields: &[Field], value: &Value) -> Result<(), FieldErrors> {
    let Some(object) = value.as_object() else {
        let mut errors = FieldErrors::new();
        errors.insert(
            "non_field_errors".to_string(),
            FieldError::Messages(vec![expected_object(value)]),
        );
        return Err(errors);
    };

    let errors = validate_object(fields, object);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_object(fields: &[Field], object: &Map<String, Value>) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for field in fields {
        let error = match object.get(field.name) {
            None if field.required => Some(FieldError::Messages(vec![REQUIRED.to_string()])),
            None => None,
            Some(Value::Null) => Some(FieldError::Messages(vec![NOT_NULL.to_string()])),
            Some(value) => check_field(&field.kind, value),
        };

        if let Some(error) = error {
            errors.insert(field.name.to_string(), error);
        }
    }

    errors
}

fn check_field(kind: &FieldKind, value: &Value) -> Option<FieldError> {
    match kind {
        FieldKind::Object(nested) => match value.as_object() {
            Some(object) => {
                let errors = validate_object(nested, object);
                (!errors.is_empty()).then_some(FieldError::Nested(errors))
            }
            None => Some(FieldError::Messages(vec![expected_object(value)])),
        },
        _ => {
            let messages = check_scalar(kind, value);
            (!messages.is_empty()).then_some(FieldError::Messages(messages))
        }
    }
}

fn check_scalar(kind: &FieldKind, value: &Value) -> Vec<String> {
    match *kind {
        FieldKind::Text {
            min_length,
            max_length,
        } => check_text(value, min_length, max_length),
        FieldKind::Decimal {
            max_digits,
            decimal_places,
        } => check_decimal(value, max_digits, decimal_places),
        FieldKind::Integer { minimum, maximum } => check_integer(value, minimum, maximum),
        FieldKind::DateTime => check_datetime(value),
        FieldKind::Object(_) => Vec::new(),
    }
}

fn check_text(value: &Value, min_length: usize, max_length: usize) -> Vec<String> {
    let Some(text) = value.as_str() else {
        return vec![INVALID_STRING.to_string()];
    };

    // Surrounding whitespace does not count; the stored value is untouched.
    let length = text.trim().chars().count();
    let mut messages = Vec::new();

    if length == 0 && min_length > 0 {
        messages.push(BLANK.to_string());
    } else if length < min_length {
        messages.push(format!(
            "Ensure this field has at least {min_length} characters."
        ));
    }
    if length > max_length {
        messages.push(format!(
            "Ensure this field has no more than {max_length} characters."
        ));
    }

    messages
}

fn check_decimal(value: &Value, max_digits: u32, decimal_places: u32) -> Vec<String> {
    let Some(text) = value.as_str() else {
        return vec![INVALID_NUMBER.to_string()];
    };

    let has_digit = text.bytes().any(|b| b.is_ascii_digit());
    if !has_digit || !DECIMAL_SHAPE.is_match(text) {
        return vec![INVALID_NUMBER.to_string()];
    }

    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let mut messages = Vec::new();
    if !pattern_for(decimal_places).is_match(text) {
        messages.push(format!(
            "Ensure that there are no more than {decimal_places} decimal places."
        ));
    }

    let whole_digits = whole.trim_start_matches('0').len() as u32;
    let total_digits = whole_digits + fraction.len() as u32;
    let max_whole_digits = max_digits.saturating_sub(decimal_places);

    if total_digits > max_digits {
        messages.push(format!(
            "Ensure that there are no more than {max_digits} digits in total."
        ));
    } else if whole_digits > max_whole_digits {
        messages.push(format!(
            "Ensure that there are no more than {max_whole_digits} digits before the decimal point."
        ));
    }

    messages
}

fn check_integer(value: &Value, minimum: i64, maximum: i64) -> Vec<String> {
    let Some(number) = value.as_i64() else {
        return vec![INVALID_INTEGER.to_string()];
    };

    if number < minimum {
        vec![format!(
            "Ensure this value is greater than or equal to {minimum}."
        )]
    } else if number > maximum {
        vec![format!("Ensure this value is less than or equal to {maximum}.")]
    } else {
        Vec::new()
    }
}

fn check_datetime(value: &Value) -> Vec<String> {
    match value.as_str().map(DateTime::parse_from_rfc3339) {
        Some(Ok(_)) => Vec::new(),
        _ => vec![INVALID_DATETIME.to_string()],
    }
}

fn expected_object(value: &Value) -> String {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    };
    format!("Invalid data. Expected a dictionary, but got {kind}.")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FieldError, validate};
    use crate::schema::{Field, FieldKind};

    const PLACE: &[Field] = &[
        Field {
            name: "city",
            title: "City",
            description: None,
            required: true,
            kind: FieldKind::Text {
                min_length: 1,
                max_length: 8,
            },
        },
        Field {
            name: "lat",
            title: "Lat",
            description: None,
            required: true,
            kind: FieldKind::Decimal {
                max_digits: 11,
                decimal_places: 8,
            },
        },
    ];

    const ORDER: &[Field] = &[
        Field {
            name: "place",
            title: "Place",
            description: None,
            required: true,
            kind: FieldKind::Object(PLACE),
        },
        Field {
            name: "weight",
            title: "Weight",
            description: None,
            required: true,
            kind: FieldKind::Decimal {
                max_digits: 7,
                decimal_places: 2,
            },
        },
        Field {
            name: "height",
            title: "Height",
            description: None,
            required: true,
            kind: FieldKind::Integer {
                minimum: 0,
                maximum: 100,
            },
        },
        Field {
            name: "ready_at",
            title: "Ready at",
            description: None,
            required: false,
            kind: FieldKind::DateTime,
        },
    ];

    fn messages(error: Option<&FieldError>) -> Vec<String> {
        match error {
            Some(FieldError::Messages(messages)) => messages.clone(),
            other => panic!("expected messages, got {other:?}"),
        }
    }

    #[test]
    fn accepts_well_formed_payload() {
        let payload = json!({
            "place": { "city": "Ankeborg", "lat": "-64.04000000" },
            "weight": "2.00",
            "height": 20,
            "ready_at": "2020-01-01T10:00:00.123456Z",
            "ignored": true,
        });

        assert!(validate(ORDER, &payload).is_ok());
    }

    #[test]
    fn reports_missing_and_null_fields() {
        let errors = validate(ORDER, &json!({ "weight": null })).unwrap_err();

        assert_eq!(
            messages(errors.get("place")),
            vec!["This field is required."]
        );
        assert_eq!(
            messages(errors.get("weight")),
            vec!["This field may not be null."]
        );
        assert!(!errors.contains_key("ready_at"));
    }

    #[test]
    fn nested_errors_are_grouped_under_parent() {
        let payload = json!({
            "place": { "city": "", "lat": "north" },
            "weight": "1",
            "height": 1,
        });

        let errors = validate(ORDER, &payload).unwrap_err();
        let Some(FieldError::Nested(place)) = errors.get("place") else {
            panic!("expected nested errors");
        };

        assert_eq!(
            messages(place.get("city")),
            vec!["This field may not be blank."]
        );
        assert_eq!(
            messages(place.get("lat")),
            vec!["A valid number is required."]
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn text_length_is_counted_in_characters() {
        let ok = json!({ "place": { "city": "Åäöåäöåä", "lat": "1" }, "weight": "1", "height": 1 });
        assert!(validate(ORDER, &ok).is_ok());

        let long = json!({ "place": { "city": "Ankeborgen", "lat": "1" }, "weight": "1", "height": 1 });
        let errors = validate(ORDER, &long).unwrap_err();
        let Some(FieldError::Nested(place)) = errors.get("place") else {
            panic!("expected nested errors");
        };
        assert_eq!(
            messages(place.get("city")),
            vec!["Ensure this field has no more than 8 characters."]
        );
    }

    #[test]
    fn whitespace_only_text_is_blank() {
        let payload = json!({ "place": { "city": "   ", "lat": "1" }, "weight": "1", "height": 1 });
        let errors = validate(ORDER, &payload).unwrap_err();
        let Some(FieldError::Nested(place)) = errors.get("place") else {
            panic!("expected nested errors");
        };
        assert_eq!(
            messages(place.get("city")),
            vec!["This field may not be blank."]
        );

        let padded = json!({ "place": { "city": "  Ankeborg  ", "lat": "1" }, "weight": "1", "height": 1 });
        assert!(validate(ORDER, &padded).is_ok());
    }

    #[test]
    fn decimal_rules() {
        let check = |weight: serde_json::Value| {
            validate(
                ORDER,
                &json!({ "place": { "city": "A", "lat": "1" }, "weight": weight, "height": 1 }),
            )
            .err()
            .map(|errors| messages(errors.get("weight")))
        };

        assert_eq!(check(json!("2.00")), None);
        assert_eq!(check(json!("-0.5")), None);
        assert_eq!(check(json!(".5")), None);
        assert_eq!(
            check(json!("2.005")),
            Some(vec!["Ensure that there are no more than 2 decimal places.".to_string()])
        );
        assert_eq!(
            check(json!("123456.0")),
            Some(vec![
                "Ensure that there are no more than 5 digits before the decimal point.".to_string()
            ])
        );
        assert_eq!(
            check(json!("")),
            Some(vec!["A valid number is required.".to_string()])
        );
        assert_eq!(
            check(json!("-")),
            Some(vec!["A valid number is required.".to_string()])
        );
        assert_eq!(
            check(json!(2.5)),
            Some(vec!["A valid number is required.".to_string()])
        );
    }

    #[test]
    fn integer_bounds() {
        let check = |height: serde_json::Value| {
            validate(
                ORDER,
                &json!({ "place": { "city": "A", "lat": "1" }, "weight": "1", "height": height }),
            )
            .err()
            .map(|errors| messages(errors.get("height")))
        };

        assert_eq!(check(json!(100)), None);
        assert_eq!(
            check(json!(-1)),
            Some(vec!["Ensure this value is greater than or equal to 0.".to_string()])
        );
        assert_eq!(
            check(json!(101)),
            Some(vec!["Ensure this value is less than or equal to 100.".to_string()])
        );
        assert_eq!(
            check(json!("20")),
            Some(vec!["A valid integer is required.".to_string()])
        );
    }

    #[test]
    fn datetime_must_be_rfc3339() {
        let payload = json!({
            "place": { "city": "A", "lat": "1" },
            "weight": "1",
            "height": 1,
            "ready_at": "yesterday",
        });

        let errors = validate(ORDER, &payload).unwrap_err();
        assert!(messages(errors.get("ready_at"))[0].starts_with("Datetime has wrong format"));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let errors = validate(ORDER, &json!([1, 2])).unwrap_err();
        assert_eq!(
            messages(errors.get("non_field_errors")),
            vec!["Invalid data. Expected a dictionary, but got list."]
        );

        let errors = validate(
            ORDER,
            &json!({ "place": "Ankeborg", "weight": "1", "height": 1 }),
        )
        .unwrap_err();
        assert_eq!(
            messages(errors.get("place")),
            vec!["Invalid data. Expected a dictionary, but got str."]
        );
    }
}
