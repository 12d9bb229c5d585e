//! tests/test_normalizer.rs
//!
//! Field normalization for listings, open houses and analytics summaries.

use serde_json::json;
use vista_listings::fields::handlers::PHOTO_ORDINALS;
use vista_listings::fields::{
    ERROR_TEXT, FieldTable, NONE_TEXT, NOT_FOUND_TEXT, NormalizeOptions, Scalar, format_scalar,
};
use vista_listings::records::{analytics, listing, openhouse};

fn opts() -> NormalizeOptions {
    NormalizeOptions::default()
}

fn listing_table(record: serde_json::Value) -> FieldTable {
    listing::normalize(&record, &opts())
}

// =========================================================================
// END TO END
// =========================================================================

#[test]
fn listing_record_end_to_end() {
    let table = listing_table(json!({
        "listPrice": 300000,
        "property": { "area": 1500, "rooms": null, "parking": { "spaces": 2 } },
        "photos": ["http://a"]
    }));

    assert_eq!(table.field("sqftprice"), "200.00");
    assert_eq!(table.field("rooms-info"), NONE_TEXT);
    assert_eq!(table.field("rooms"), NONE_TEXT);
    assert_eq!(table.field("parking-spaces"), "2");
    assert_eq!(table.field("parking-leased"), NONE_TEXT);
    assert_eq!(table.field("first-photo-url"), "http://a");
    assert_eq!(table.field("listprice"), "300,000");
    assert_eq!(table.field("sqft"), "1,500");
    assert_eq!(table.field("baths"), NONE_TEXT);
    assert_eq!(table.field("viewbutton"), NONE_TEXT);
    assert!(table.failures().is_empty());
}

#[test]
fn normalizing_twice_gives_identical_tables() {
    let record = json!({
        "listPrice": 425000.5,
        "mlsId": 1005,
        "address": { "streetNumberText": "12", "streetName": "Main St", "city": "Austin", "state": "TX", "postalCode": "78701" },
        "photos": ["https://img/1.jpg", "https://img/2.jpg"],
        "modified": "2024-03-05T14:07:09Z",
        "remarks": "Corner lot"
    });
    assert_eq!(listing_table(record.clone()), listing_table(record));
}

#[test]
fn lookups_are_case_insensitive() {
    let table = listing_table(json!({ "listPrice": 1, "Remarks": "x" }));
    assert_eq!(table.field("ListPrice"), table.field("listprice"));
    assert_eq!(table.field("REMARKS"), "x");
    assert!(table.iter().all(|(name, _)| name == name.to_lowercase()));
}

#[test]
fn unknown_field_reads_not_found() {
    let table = listing_table(json!({}));
    assert_eq!(table.field("address"), NOT_FOUND_TEXT);
}

// =========================================================================
// GENERIC FORMATTER
// =========================================================================

#[test]
fn generic_formatter_cases() {
    let table = listing_table(json!({
        "remarks": null,
        "disclaimer": { "text": "nested" },
        "tags": ["a", "b"],
        "waterfront": true,
        "daysOnMarket": 12,
        "ratio": 2.0,
        "listPrice": 1234.5
    }));

    assert_eq!(table.field("remarks"), NONE_TEXT);
    assert!(!table.contains("disclaimer"));
    assert!(!table.contains("tags"));
    assert_eq!(table.field("waterfront"), "true");
    assert_eq!(table.field("daysonmarket"), "12");
    assert_eq!(table.field("ratio"), "2");
    assert_eq!(table.field("listprice"), "1,234.50");
}

#[test]
fn numeric_strings_are_grouped_with_decimals() {
    let table = listing_table(json!({ "listPrice": "1500000" }));
    assert_eq!(table.field("listprice"), "1,500,000.00");
}

#[test]
fn numbers_beyond_u64_keep_their_digits() {
    assert_eq!(
        format_scalar(&json!(1e20), true),
        Scalar::Text("100,000,000,000,000,000,000.00".into())
    );
    assert_eq!(
        format_scalar(&json!(-1e20), true),
        Scalar::Text("-100,000,000,000,000,000,000.00".into())
    );

    let Scalar::Text(text) = format_scalar(&json!("123456789012345678901234"), true) else {
        panic!("expected text");
    };
    assert!(text.starts_with("123,456,789,012,345,"), "{}", text);
    assert!(text.ends_with(".00"));
    assert_eq!(text.len(), "123,456,789,012,345,678,901,234.00".len());
}

// =========================================================================
// RATIO
// =========================================================================

#[test]
fn ratio_with_zero_area_is_none() {
    let table = listing_table(json!({ "listPrice": 300000, "property": { "area": 0 } }));
    assert_eq!(table.field("sqftprice"), NONE_TEXT);
}

#[test]
fn ratio_with_missing_property_is_none() {
    let table = listing_table(json!({ "listPrice": 300000 }));
    assert_eq!(table.field("sqftprice"), NONE_TEXT);
}

// =========================================================================
// PHOTOS
// =========================================================================

#[test]
fn short_photo_list_fills_remaining_slots_with_none() {
    let table = listing_table(json!({ "photos": ["https://a/1", "https://a/2", "https://a/3"] }));

    let populated = PHOTO_ORDINALS
        .iter()
        .filter(|o| table.field(&format!("{}-photo-url", o)) != NONE_TEXT)
        .count();
    let empty = PHOTO_ORDINALS
        .iter()
        .filter(|o| table.field(&format!("{}-photo", o)) == NONE_TEXT)
        .count();

    assert_eq!(populated, 3);
    assert_eq!(empty, 7);
    assert_eq!(table.field("third-photo-url-non-protocol"), "a/3");
    assert!(table.field("first-photo").contains("src='https://a/1'"));
    assert!(table.field("photos").contains("vista-display-default-slide"));
}

#[test]
fn null_photos_fill_every_slot_with_none() {
    let table = listing_table(json!({ "photos": null }));
    assert_eq!(table.field("photos"), NONE_TEXT);
    assert_eq!(table.field("tenth-photo-url"), NONE_TEXT);
}

#[test]
fn bad_photos_value_degrades_only_that_field() {
    let table = listing_table(json!({ "photos": "not a list", "listPrice": 10 }));

    assert_eq!(table.field("photos"), ERROR_TEXT);
    assert_eq!(table.field("listprice"), "10");
    assert_eq!(table.failures().len(), 1);
    assert_eq!(table.failures()[0].field, "photos");
}

// =========================================================================
// LISTING HANDLERS
// =========================================================================

#[test]
fn property_rooms_baths_and_rest() {
    let table = listing_table(json!({
        "property": {
            "bathsFull": 2,
            "bathsHalf": 1,
            "bedrooms": 3,
            "rooms": [{ "typeText": "Bedroom" }, { "typeText": "Kitchen" }]
        }
    }));

    assert_eq!(table.field("baths"), "2.5");
    assert_eq!(table.field("rooms"), "2");
    assert_eq!(table.field("rooms-info"), "<p>Bedroom</p><p>Kitchen</p>");
    assert_eq!(table.field("bedrooms"), "3");
    assert_eq!(table.field("sqft"), NONE_TEXT);
}

#[test]
fn property_without_rooms_key() {
    let table = listing_table(json!({ "property": { "area": 900 } }));
    assert_eq!(table.field("rooms"), "0");
    assert_eq!(table.field("rooms-info"), "No rooms found");
}

#[test]
fn address_line_and_sub_fields() {
    let table = listing_table(json!({
        "address": {
            "streetNumberText": "12",
            "streetName": "Main St",
            "unit": "4B",
            "city": "Austin",
            "state": "TX",
            "postalCode": "78701"
        }
    }));

    assert_eq!(table.field("address"), "12 Main St, Unit 4B, Austin, TX 78701");
    assert_eq!(table.field("city"), "Austin");
}

#[test]
fn prefixed_and_renamed_sub_fields() {
    let table = listing_table(json!({
        "association": { "fee": 100, "name": "Oaks HOA" },
        "school": { "district": "AISD", "highSchool": "Austin High" },
        "agent": { "firstName": "Sam", "contact": { "email": "sam@example.com" } },
        "office": { "name": "Acme Realty", "contact": null }
    }));

    assert_eq!(table.field("hoa-fee"), "100");
    assert_eq!(table.field("hoa-name"), "Oaks HOA");
    assert_eq!(table.field("school-district"), "AISD");
    assert_eq!(table.field("highschool"), "Austin High");
    assert_eq!(table.field("agent-firstname"), "Sam");
    assert_eq!(table.field("agent-contact-email"), "sam@example.com");
    assert_eq!(table.field("office-name"), "Acme Realty");
    assert_eq!(table.field("office-email"), NONE_TEXT);
}

#[test]
fn modified_splits_into_date_and_time() {
    let table = listing_table(json!({ "modified": "2024-03-05T14:07:09Z" }));
    assert_eq!(table.field("last-modified-date"), "March 5, 2024");
    assert_eq!(table.field("last-modified-time"), "2:07:09 PM");

    let table = listing_table(json!({ "modified": "yesterday" }));
    assert_eq!(table.field("last-modified-date"), ERROR_TEXT);
    assert_eq!(table.field("last-modified-time"), ERROR_TEXT);
}

#[test]
fn virtual_tour_and_view_button() {
    let options = NormalizeOptions {
        home_url: "https://example.com/".to_string(),
        ..NormalizeOptions::default()
    };
    let table = listing::normalize(&json!({ "mlsId": 42, "virtualTourUrl": "https://tour.example/1" }), &options);

    assert_eq!(
        table.field("viewbutton"),
        "<a href='https://example.com/individual-listing/?listing=42' class='vista-view-listing-button'>View Listing</a>"
    );
    assert!(table.field("virtualtoururl").contains("href='https://tour.example/1'"));

    let table = listing_table(json!({ "virtualTourUrl": "not a url" }));
    assert_eq!(table.field("virtualtoururl"), "No virtual tour available");
}

// =========================================================================
// OPEN HOUSES
// =========================================================================

#[test]
fn open_house_times_use_configured_timezone() {
    let options = NormalizeOptions {
        timezone: "America/New_York".to_string(),
        ..NormalizeOptions::default()
    };
    let table = openhouse::normalize(
        &json!({ "startTime": "2024-03-05T19:00:00Z", "endTime": "later" }),
        &options,
    );

    assert_eq!(table.field("starttime"), "Mar 5, 2024: 2:00 PM");
    assert_eq!(table.field("endtime"), "later");
}

#[test]
fn open_house_with_unknown_timezone() {
    let options = NormalizeOptions {
        timezone: "Mars/Olympus".to_string(),
        ..NormalizeOptions::default()
    };
    let table = openhouse::normalize(&json!({ "startTime": "2024-03-05T19:00:00Z" }), &options);
    assert_eq!(table.field("starttime"), "Timezone not recognized");
}

#[test]
fn open_house_falls_back_to_embedded_listing() {
    let table = openhouse::normalize(
        &json!({
            "openHouseKey": "OH-1",
            "remarks": "Open house remarks",
            "listing": { "listPrice": 500000, "remarks": "Listing remarks" }
        }),
        &opts(),
    );

    assert_eq!(table.field("openhousekey"), "OH-1");
    assert_eq!(table.field("remarks"), "Open house remarks");
    assert_eq!(table.field("listprice"), "500,000");
    assert_eq!(table.field("missing"), NOT_FOUND_TEXT);
}

// =========================================================================
// ANALYTICS
// =========================================================================

#[test]
fn analytics_summary() {
    let table = analytics::normalize(
        &json!({
            "avgPrice": 300000.0,
            "avgLivingArea": 1500,
            "totalCount": 5,
            "areaDistribution": { "North": 3, "South": 2 }
        }),
        &opts(),
    );

    assert_eq!(table.field("sqftprice"), "200.00");
    assert_eq!(table.field("avgprice"), "300,000.00");
    assert_eq!(table.field("totalcount"), "5");
    let distribution = table.field("areadistribution");
    assert!(distribution.starts_with("<table class='vista-area-distribution'>"));
    assert!(distribution.contains("<tr><td>North</td><td>3</td></tr>"));
}

#[test]
fn analytics_with_no_matches_overwrites_every_field() {
    let table = analytics::normalize(
        &json!({ "avgPrice": null, "avgLivingArea": 0, "totalCount": 0 }),
        &opts(),
    );

    assert!(!table.is_empty());
    assert!(table.iter().all(|(_, value)| value == "No analytics matched your query"));
}
