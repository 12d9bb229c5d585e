//! Listing records (`properties` / `property` endpoints).

use std::sync::LazyLock;

use reqwest::Url;
use serde_json::{Map, Value};

use crate::core::error::VistaError;
use crate::fields::handlers::{as_number, lookup};
use crate::fields::normalizer::{DerivedField, FieldHandler, FieldWriter, HandlerRegistry, NormalizeOptions, Normalizer};
use crate::fields::table::{ERROR_TEXT, FieldTable};

pub const NO_ROOMS_TEXT: &str = "No rooms found";
pub const NO_TOUR_TEXT: &str = "No virtual tour available";

static REGISTRY: LazyLock<HandlerRegistry> = LazyLock::new(|| {
    HandlerRegistry::builder("listing")
        .handle("property", FieldHandler::Custom(property))
        .handle("office", FieldHandler::Custom(office))
        .handle("agent", FieldHandler::Custom(agent))
        .handle("address", FieldHandler::Custom(address))
        .handle("school", FieldHandler::Custom(school))
        .handle("mls", FieldHandler::Flatten { prefix: "" })
        .handle("geo", FieldHandler::Flatten { prefix: "" })
        .handle("tax", FieldHandler::Flatten { prefix: "" })
        .handle("association", FieldHandler::Flatten { prefix: "hoa-" })
        .handle("photos", FieldHandler::Photos { slots: 10 })
        .handle("virtualTourUrl", FieldHandler::Custom(virtual_tour))
        .handle(
            "modified",
            FieldHandler::SplitTimestamp {
                date_field: "last-modified-date",
                time_field: "last-modified-time",
            },
        )
        .numeric(&["listPrice", "sqft", "sqftPrice"])
        .derive(DerivedField::Ratio {
            output: "sqftPrice",
            numerator: &["listPrice"],
            denominator: &["property", "area"],
        })
        .derive(DerivedField::Custom {
            output: "viewButton",
            compute: view_button,
        })
        .build()
});

pub fn registry() -> &'static HandlerRegistry {
    &REGISTRY
}

pub fn normalize(record: &Value, options: &NormalizeOptions) -> FieldTable {
    Normalizer::new(registry(), options).normalize(record)
}

fn object<'v>(name: &str, value: &'v Value) -> Result<&'v Map<String, Value>, VistaError> {
    value
        .as_object()
        .ok_or_else(|| VistaError::field(name, "expected an object"))
}

fn flatten_except(writer: &mut FieldWriter<'_>, fields: &Map<String, Value>, prefix: &str, skip: &[&str]) {
    for (name, value) in fields.iter().filter(|(name, _)| !skip.contains(&name.as_str())) {
        writer.scalar(&format!("{}{}", prefix, name), value);
    }
}

fn property(writer: &mut FieldWriter<'_>, name: &str, value: &Value) -> Result<(), VistaError> {
    let fields = object(name, value)?;

    writer.optional("sqft", fields.get("area"));

    let full = fields.get("bathsFull").and_then(as_number);
    let half = fields.get("bathsHalf").and_then(as_number);
    match (full, half) {
        (None, None) => writer.none("baths"),
        (full, half) => {
            let baths = full.unwrap_or(0.0) + 0.5 * half.unwrap_or(0.0);
            writer.optional("baths", serde_json::Number::from_f64(baths).map(Value::Number).as_ref());
        }
    }

    let parking = fields.get("parking").and_then(Value::as_object);
    for part in ["leased", "spaces", "description"] {
        writer.optional(&format!("parking-{}", part), parking.and_then(|p| p.get(part)));
    }

    match fields.get("rooms") {
        None => {
            writer.text("rooms", "0");
            writer.text("rooms-info", NO_ROOMS_TEXT);
        }
        Some(Value::Null) => {
            writer.none("rooms");
            writer.none("rooms-info");
        }
        Some(Value::Array(rooms)) => {
            let info: String = rooms
                .iter()
                .map(|room| {
                    let kind = room.get("typeText").and_then(Value::as_str).unwrap_or_default();
                    format!("<p>{}</p>", kind)
                })
                .collect();
            writer.text("rooms", rooms.len().to_string());
            writer.text("rooms-info", info);
        }
        Some(_) => {
            writer.text("rooms", "0");
            writer.text("rooms-info", ERROR_TEXT);
        }
    }

    flatten_except(writer, fields, "", &["parking", "rooms", "area"]);
    Ok(())
}

fn office(writer: &mut FieldWriter<'_>, _name: &str, value: &Value) -> Result<(), VistaError> {
    let fields = value.as_object();
    let contact = fields
        .and_then(|f| f.get("contact"))
        .and_then(Value::as_object);

    for (field, key) in [("office-email", "email"), ("office-phone", "office"), ("office-cell", "cell")] {
        writer.optional(field, contact.and_then(|c| c.get(key)));
    }
    for (field, key) in [
        ("office-name", "name"),
        ("office-servingName", "servingName"),
        ("office-brokerid", "brokerid"),
    ] {
        writer.optional(field, fields.and_then(|f| f.get(key)));
    }
    Ok(())
}

fn agent(writer: &mut FieldWriter<'_>, _name: &str, value: &Value) -> Result<(), VistaError> {
    let Some(fields) = value.as_object() else {
        return Ok(());
    };
    if let Some(contact) = fields.get("contact") {
        writer.flatten(contact, "agent-contact-");
    }
    flatten_except(writer, fields, "agent-", &["contact"]);
    Ok(())
}

fn address(writer: &mut FieldWriter<'_>, name: &str, value: &Value) -> Result<(), VistaError> {
    if value.is_null() {
        writer.none(name);
        return Ok(());
    }
    let fields = object(name, value)?;
    let part = |key: &str| -> String {
        match fields.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    };

    let unit = part("unit");
    let unit = if unit.is_empty() { unit } else { format!("Unit {}, ", unit) };
    writer.text(
        name,
        format!(
            "{} {}, {}{}, {} {}",
            part("streetNumberText"),
            part("streetName"),
            unit,
            part("city"),
            part("state"),
            part("postalCode")
        ),
    );

    writer.flatten(value, "");
    Ok(())
}

fn school(writer: &mut FieldWriter<'_>, _name: &str, value: &Value) -> Result<(), VistaError> {
    let Some(fields) = value.as_object() else {
        return Ok(());
    };
    if let Some(district) = fields.get("district") {
        writer.scalar("school-district", district);
    }
    flatten_except(writer, fields, "", &["district"]);
    Ok(())
}

fn virtual_tour(writer: &mut FieldWriter<'_>, name: &str, value: &Value) -> Result<(), VistaError> {
    let tour = value
        .as_str()
        .and_then(|raw| Url::parse(raw).ok().map(|url| (raw, url)))
        .filter(|(_, url)| url.has_host());

    match tour {
        Some((raw, _)) => writer.text(name, format!("<a class='vista-tour-button' href='{}'>Virtual Tour</a>", raw)),
        None => writer.text(name, NO_TOUR_TEXT),
    }
    Ok(())
}

fn view_button(writer: &mut FieldWriter<'_>, record: &Map<String, Value>) -> Result<(), VistaError> {
    let mls_id = match lookup(record, &["mlsId"]) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            writer.none("viewButton");
            return Ok(());
        }
    };
    let url = writer.options().listing_url(&mls_id);
    writer.text(
        "viewButton",
        format!("<a href='{}' class='vista-view-listing-button'>View Listing</a>", url),
    );
    Ok(())
}
