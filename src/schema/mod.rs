//! Declarative field rules for request payloads.
//!
//! A resource declares its input once as a static table of [`Field`]s. The
//! same table drives [`json_schema`] (what clients use to build forms) and
//! [`validate`] (what the server enforces), so the two cannot drift apart.

mod validate;

use serde_json::{Map, Value, json};

pub use validate::{FieldError, FieldErrors, validate};

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Free text, bounds counted in characters.
    Text { min_length: usize, max_length: usize },
    /// Decimal number carried as a string so its exact digits survive.
    Decimal { max_digits: u32, decimal_places: u32 },
    Integer { minimum: i64, maximum: i64 },
    /// RFC 3339 timestamp.
    DateTime,
    Object(&'static [Field]),
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub title: &'static str,
    pub description: Option<&'static str>,
    pub required: bool,
    pub kind: FieldKind,
}

/// Regex a decimal string with at most `decimal_places` fraction digits
/// must match.
pub fn decimal_pattern(decimal_places: u32) -> String {
    format!(r"^\-?[0-9]*(\.[0-9]{{1,{decimal_places}}})?$")
}

/// Renders an object's fields as a JSON schema document.
pub fn json_schema(fields: &[Field]) -> Value {
    object_schema(None, fields)
}

fn object_schema(title: Option<&str>, fields: &[Field]) -> Value {
    let mut properties = Map::new();
    for field in fields {
        properties.insert(field.name.to_string(), field_schema(field));
    }

    let required: Vec<&str> = fields
        .iter()
        .filter(|field| field.required)
        .map(|field| field.name)
        .collect();

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    if let Some(title) = title {
        schema.insert("title".to_string(), json!(title));
    }
    schema.insert("properties".to_string(), Value::Object(properties));
    schema.insert("required".to_string(), json!(required));
    Value::Object(schema)
}

fn field_schema(field: &Field) -> Value {
    let mut schema = match field.kind {
        FieldKind::Object(nested) => return object_schema(Some(field.title), nested),
        FieldKind::Text {
            min_length,
            max_length,
        } => json!({
            "type": "string",
            "minLength": min_length,
            "maxLength": max_length,
        }),
        FieldKind::Decimal { decimal_places, .. } => json!({
            "type": "string",
            "pattern": decimal_pattern(decimal_places),
        }),
        FieldKind::Integer { minimum, maximum } => json!({
            "type": "integer",
            "minimum": minimum,
            "maximum": maximum,
        }),
        FieldKind::DateTime => json!({
            "type": "string",
            "format": "date-time",
        }),
    };

    if let Value::Object(map) = &mut schema {
        map.insert("title".to_string(), json!(field.title));
        if let Some(description) = field.description {
            map.insert("description".to_string(), json!(description));
        }
    }

    schema
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Field, FieldKind, decimal_pattern, json_schema};

    const POINT: &[Field] = &[
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
        Field {
            name: "label",
            title: "Label",
            description: Some("shown on the map"),
            required: false,
            kind: FieldKind::Text {
                min_length: 1,
                max_length: 32,
            },
        },
    ];

    const ROOT: &[Field] = &[
        Field {
            name: "point",
            title: "Point",
            description: None,
            required: true,
            kind: FieldKind::Object(POINT),
        },
        Field {
            name: "count",
            title: "Count",
            description: Some("in pieces"),
            required: true,
            kind: FieldKind::Integer {
                minimum: 0,
                maximum: 10,
            },
        },
        Field {
            name: "at",
            title: "At",
            description: None,
            required: false,
            kind: FieldKind::DateTime,
        },
    ];

    #[test]
    fn decimal_pattern_tracks_decimal_places() {
        assert_eq!(decimal_pattern(8), r"^\-?[0-9]*(\.[0-9]{1,8})?$");
        assert_eq!(decimal_pattern(2), r"^\-?[0-9]*(\.[0-9]{1,2})?$");
    }

    #[test]
    fn renders_properties_and_required_in_declaration_order() {
        let schema = json_schema(ROOT);

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["point", "count"]));
        assert_eq!(
            schema["properties"]["count"],
            json!({
                "type": "integer",
                "title": "Count",
                "description": "in pieces",
                "minimum": 0,
                "maximum": 10,
            })
        );
        assert_eq!(
            schema["properties"]["at"],
            json!({ "type": "string", "format": "date-time", "title": "At" })
        );
    }

    #[test]
    fn nested_objects_carry_their_own_required_list() {
        let schema = json_schema(ROOT);
        let point = &schema["properties"]["point"];

        assert_eq!(point["type"], "object");
        assert_eq!(point["title"], "Point");
        assert_eq!(point["required"], json!(["lat"]));
        assert_eq!(
            point["properties"]["lat"],
            json!({
                "type": "string",
                "pattern": r"^\-?[0-9]*(\.[0-9]{1,8})?$",
                "title": "Lat",
            })
        );
        assert_eq!(point["properties"]["label"]["maxLength"], 32);
        assert_eq!(point["properties"]["label"]["description"], "shown on the map");
    }
}
