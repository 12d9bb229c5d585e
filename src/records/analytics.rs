//! Analytics summaries (`analytics` / `analytic` endpoints).

use std::sync::LazyLock;

use serde_json::Value;

use crate::core::error::VistaError;
use crate::fields::handlers::as_number;
use crate::fields::normalizer::{DerivedField, FieldHandler, FieldWriter, HandlerRegistry, NormalizeOptions, Normalizer};
use crate::fields::table::FieldTable;
use crate::utils::text::escape_html;

pub const NO_ANALYTICS_TEXT: &str = "No analytics matched your query";

static REGISTRY: LazyLock<HandlerRegistry> = LazyLock::new(|| {
    HandlerRegistry::builder("analytics")
        .handle("areaDistribution", FieldHandler::Custom(area_distribution))
        .numeric(&["sqftPrice", "avgPrice"])
        .derive(DerivedField::Ratio {
            output: "sqftPrice",
            numerator: &["avgPrice"],
            denominator: &["avgLivingArea"],
        })
        .build()
});

pub fn registry() -> &'static HandlerRegistry {
    &REGISTRY
}

/// A summary with `totalCount == 0` reads `NO_ANALYTICS_TEXT` in every field.
pub fn normalize(record: &Value, options: &NormalizeOptions) -> FieldTable {
    let mut table = Normalizer::new(registry(), options).normalize(record);
    if record.get("totalCount").and_then(as_number) == Some(0.0) {
        table.overwrite_all(NO_ANALYTICS_TEXT);
    }
    table
}

fn area_distribution(writer: &mut FieldWriter<'_>, name: &str, value: &Value) -> Result<(), VistaError> {
    let rows = match value {
        Value::Null => String::new(),
        Value::Object(areas) => areas
            .iter()
            .map(|(area, count)| {
                let count = match count {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!(
                    "<tr><td>{}</td><td>{}</td></tr>",
                    escape_html(area),
                    escape_html(&count)
                )
            })
            .collect(),
        _ => return Err(VistaError::field(name, "expected an area to count map")),
    };

    writer.text(
        name,
        format!(
            "<table class='vista-area-distribution'><thead><tr><th>Area</th><th>Listings</th></tr></thead><tbody>{}</tbody></table>",
            rows
        ),
    );
    Ok(())
}
