use serde::{Deserialize, Serialize};

use crate::schema::{Field, FieldKind};

/// Street address with coordinates. `lat` and `lon` keep the exact decimal
/// text they were submitted with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street_address: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub lat: String,
    pub lon: String,
}

const COORDINATE: FieldKind = FieldKind::Decimal {
    max_digits: 11,
    decimal_places: 8,
};

pub const ADDRESS_FIELDS: &[Field] = &[
    Field {
        name: "lat",
        title: "Lat",
        description: None,
        required: true,
        kind: COORDINATE,
    },
    Field {
        name: "lon",
        title: "Lon",
        description: None,
        required: true,
        kind: COORDINATE,
    },
    Field {
        name: "street_address",
        title: "Street address",
        description: None,
        required: true,
        kind: FieldKind::Text {
            min_length: 1,
            max_length: 128,
        },
    },
    Field {
        name: "postal_code",
        title: "Postal code",
        description: None,
        required: true,
        kind: FieldKind::Text {
            min_length: 1,
            max_length: 16,
        },
    },
    Field {
        name: "city",
        title: "City",
        description: None,
        required: true,
        kind: FieldKind::Text {
            min_length: 1,
            max_length: 64,
        },
    },
    Field {
        name: "country",
        title: "Country",
        description: None,
        required: true,
        kind: FieldKind::Text {
            min_length: 1,
            max_length: 64,
        },
    },
];
