use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::address::{ADDRESS_FIELDS, Address};
use crate::schema::{Field, FieldError, FieldErrors, FieldKind};

/// Payload a sender submits to register a package for delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPackage {
    pub pickup_at: Address,
    pub deliver_to: Address,
    pub height: i32,
    pub width: i32,
    pub depth: i32,
    pub weight: String,
    pub recipient: String,
    pub recipient_phone: String,
    pub earliest_pickup_time: DateTime<Utc>,
    pub latest_pickup_time: DateTime<Utc>,
    pub earliest_delivery_time: DateTime<Utc>,
    pub latest_delivery_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: Uuid,
    pub pickup_at: Address,
    pub deliver_to: Address,
    pub height: i32,
    pub width: i32,
    pub depth: i32,
    pub weight: String,
    pub recipient: String,
    pub recipient_phone: String,
    pub earliest_pickup_time: DateTime<Utc>,
    pub latest_pickup_time: DateTime<Utc>,
    pub earliest_delivery_time: DateTime<Utc>,
    pub latest_delivery_time: DateTime<Utc>,
    pub sender: Uuid,
    pub courier: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl NewPackage {
    /// Both time windows must open no later than they close.
    pub fn check_windows(&self) -> Result<(), FieldErrors> {
        let mut problems = Vec::new();

        if self.earliest_pickup_time > self.latest_pickup_time {
            problems.push("Earliest pickup time must not be later than latest pickup time.");
        }
        if self.earliest_delivery_time > self.latest_delivery_time {
            problems.push("Earliest delivery time must not be later than latest delivery time.");
        }

        if problems.is_empty() {
            return Ok(());
        }

        let mut errors = FieldErrors::new();
        errors.insert(
            "non_field_errors".to_string(),
            FieldError::Messages(problems.into_iter().map(str::to_string).collect()),
        );
        Err(errors)
    }

    pub fn into_package(self, sender: Uuid) -> Package {
        Package {
            id: Uuid::new_v4(),
            pickup_at: self.pickup_at,
            deliver_to: self.deliver_to,
            height: self.height,
            width: self.width,
            depth: self.depth,
            weight: self.weight,
            recipient: self.recipient,
            recipient_phone: self.recipient_phone,
            earliest_pickup_time: self.earliest_pickup_time,
            latest_pickup_time: self.latest_pickup_time,
            earliest_delivery_time: self.earliest_delivery_time,
            latest_delivery_time: self.latest_delivery_time,
            sender,
            courier: None,
            created_at: Utc::now(),
        }
    }
}

const DIMENSION: FieldKind = FieldKind::Integer {
    minimum: 0,
    maximum: i32::MAX as i64,
};

pub const PACKAGE_FIELDS: &[Field] = &[
    Field {
        name: "pickup_at",
        title: "Pickup at",
        description: None,
        required: true,
        kind: FieldKind::Object(ADDRESS_FIELDS),
    },
    Field {
        name: "deliver_to",
        title: "Deliver to",
        description: None,
        required: true,
        kind: FieldKind::Object(ADDRESS_FIELDS),
    },
    Field {
        name: "height",
        title: "Height",
        description: Some("in cm"),
        required: true,
        kind: DIMENSION,
    },
    Field {
        name: "width",
        title: "Width",
        description: Some("in cm"),
        required: true,
        kind: DIMENSION,
    },
    Field {
        name: "depth",
        title: "Depth",
        description: Some("in cm"),
        required: true,
        kind: DIMENSION,
    },
    Field {
        name: "weight",
        title: "Weight",
        description: Some("in kg"),
        required: true,
        kind: FieldKind::Decimal {
            max_digits: 7,
            decimal_places: 2,
        },
    },
    Field {
        name: "recipient",
        title: "Recipient",
        description: None,
        required: true,
        kind: FieldKind::Text {
            min_length: 1,
            max_length: 128,
        },
    },
    Field {
        name: "recipient_phone",
        title: "Recipient phone number",
        description: None,
        required: true,
        kind: FieldKind::Text {
            min_length: 1,
            max_length: 32,
        },
    },
    Field {
        name: "earliest_pickup_time",
        title: "Earliest pickup time",
        description: None,
        required: true,
        kind: FieldKind::DateTime,
    },
    Field {
        name: "latest_pickup_time",
        title: "Latest pickup time",
        description: None,
        required: true,
        kind: FieldKind::DateTime,
    },
    Field {
        name: "earliest_delivery_time",
        title: "Earliest delivery time",
        description: None,
        required: true,
        kind: FieldKind::DateTime,
    },
    Field {
        name: "latest_delivery_time",
        title: "Latest delivery time",
        description: None,
        required: true,
        kind: FieldKind::DateTime,
    },
];
