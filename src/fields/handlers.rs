//! Handlers shared across record types.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use chrono_tz::Tz;
use serde_json::{Map, Number, Value};

use crate::core::error::VistaError;
use crate::fields::normalizer::FieldWriter;
use crate::utils::text::escape_html;

pub const BAD_TIMEZONE_TEXT: &str = "Timezone not recognized";

pub const PHOTO_ORDINALS: [&str; 10] = [
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
];

/// Ordinal photo fields plus the slideshow in `name`.
///
/// Each slot writes `<ordinal>-photo` (an `<img>`), `<ordinal>-photo-url` and
/// `<ordinal>-photo-url-non-protocol`. Slots past the end of the list read
/// `NONE_TEXT`. A null list fills every slot with `NONE_TEXT`.
pub fn photos(writer: &mut FieldWriter<'_>, name: &str, value: &Value, slots: usize) -> Result<(), VistaError> {
    let urls: Vec<Option<String>> = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(|v| v.as_str().map(escape_html)).collect(),
        _ => return Err(VistaError::field(name, "expected a list of photo URLs")),
    };

    for (index, ordinal) in PHOTO_ORDINALS.iter().take(slots).enumerate() {
        let field = format!("{}-photo", ordinal);
        match urls.get(index).and_then(Option::as_deref) {
            Some(url) => {
                writer.text(
                    &field,
                    format!(
                        "<img class='vista-lead-photo' src='{}' alt='Property cover photo' loading='lazy'> ",
                        url
                    ),
                );
                writer.text(&format!("{}-url", field), url);
                writer.text(&format!("{}-url-non-protocol", field), strip_protocol(url));
            }
            None => {
                writer.none(&field);
                writer.none(&format!("{}-url", field));
                writer.none(&format!("{}-url-non-protocol", field));
            }
        }
    }

    if value.is_null() {
        writer.none(name);
        return Ok(());
    }

    let mut slides = String::new();
    for url in urls.iter().flatten() {
        let default_slide = if slides.is_empty() { "vista-display-default-slide" } else { "" };
        slides.push_str(&format!(
            "<div class='vista-slide-item vista-display-fade {}'><img class='vista-listing-photo' src='{}' alt='Property photo' loading='lazy'></div>",
            default_slide, url
        ));
    }
    writer.text(
        name,
        format!(
            "<div id='vista-slide-number'></div>\n<div class='vista-slideshow-container'>\n   {}\n  <a class='vista-grid-prev' onclick='plusSlides(-1)'>&#10094;</a>\n  <a class='vista-grid-next' onclick='plusSlides(1)'>&#10095;</a>\n</div>",
            slides
        ),
    );
    Ok(())
}

fn strip_protocol(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}

/// Parses RFC 3339 first, then the offset-less forms the API has been seen to send.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

/// `"2024-03-05T14:07:09Z"` → `March 5, 2024` and `2:07:09 PM`.
pub fn split_timestamp(writer: &mut FieldWriter<'_>, value: &Value, date_field: &str, time_field: &str) {
    if value.is_null() {
        writer.none(date_field);
        writer.none(time_field);
        return;
    }
    match value.as_str().and_then(parse_timestamp) {
        Some(parsed) => {
            writer.text(date_field, parsed.format("%B %-d, %Y").to_string());
            writer.text(time_field, parsed.format("%-I:%M:%S %p").to_string());
        }
        None => {
            writer.error(date_field);
            writer.error(time_field);
        }
    }
}

/// Renders a timestamp in the configured timezone as `Mar 5, 2024: 2:07 PM`.
/// Values that do not parse are written as they came.
pub fn local_timestamp(writer: &mut FieldWriter<'_>, name: &str, value: &Value) {
    let Some(parsed) = value.as_str().and_then(|raw| DateTime::parse_from_rfc3339(raw).ok()) else {
        writer.scalar(name, value);
        return;
    };
    match writer.options().timezone.parse::<Tz>() {
        Ok(tz) => {
            let local = parsed.with_timezone(&tz);
            writer.text(name, local.format("%b %-d, %Y: %-I:%M %p").to_string());
        }
        Err(_) => writer.text(name, BAD_TIMEZONE_TEXT),
    }
}

/// Follows `path` through nested objects.
pub fn lookup<'v>(record: &'v Map<String, Value>, path: &[&str]) -> Option<&'v Value> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(record.get(*first)?, |current, key| current.as_object()?.get(*key))
}

/// Numbers and numeric strings; anything else is absent.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `output = numerator / denominator`. Zero or missing inputs read `NONE_TEXT`.
pub fn ratio(
    writer: &mut FieldWriter<'_>,
    record: &Map<String, Value>,
    output: &str,
    numerator: &[&str],
    denominator: &[&str],
) {
    let top = lookup(record, numerator).and_then(as_number).filter(|n| *n != 0.0);
    let bottom = lookup(record, denominator).and_then(as_number).filter(|d| *d != 0.0);

    let quotient = match (top, bottom) {
        (Some(n), Some(d)) => Number::from_f64(n / d),
        _ => None,
    };
    match quotient {
        Some(q) => {
            writer.scalar(output, &Value::Number(q));
        }
        None => writer.none(output),
    }
}
