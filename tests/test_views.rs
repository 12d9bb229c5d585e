//! tests/test_views.rs
//!
//! Page-level rendering: single-record fields, lists, totals, pagination
//! buttons, filtered lists, the map container and query links. The API is
//! replaced by a transport that routes on the `endpoint` query parameter.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};
use vista_listings::VistaError;
use vista_listings::api::client::ApiContext;
use vista_listings::configs::VistaConfig;
use vista_listings::display::multiple::{NO_LISTINGS_TEXT, filter_params};
use vista_listings::display::page::ONE_MAP_TEXT;
use vista_listings::display::pagination::NO_TYPE_TEXT;
use vista_listings::display::shortcode::{NO_FIELD_TEXT, NO_PAGE_TEXT};
use vista_listings::display::single::{LISTING_UNAVAILABLE_TEXT, NO_LISTING_PARAM_TEXT, NO_OPENHOUSE_PARAM_TEXT};
use vista_listings::display::{MultiKind, PageRender, RenderContext, SingleKind, replace_fields};
use vista_listings::loggers::{Logger, LoggerBuilder};
use vista_listings::records::analytics::NO_ANALYTICS_TEXT;
use vista_listings::retrieve::http::{OutboundRequest, Transport, TransportReply};
use vista_listings::store::MemoryStore;

const PAGE: &str = "https://example.com/listings/";

/// Answers by endpoint name; unknown endpoints get an upstream error envelope.
struct RoutingTransport {
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
    routes: Vec<(&'static str, String)>,
}

impl RoutingTransport {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
            routes: Vec::new(),
        }
    }

    fn route(mut self, endpoint: &'static str, total: &str, body: Value) -> Self {
        let envelope = json!({ "headers": { "X-Total-Count": [total] }, "body": body });
        self.routes.push((endpoint, envelope.to_string()));
        self
    }

    fn route_without_count(mut self, endpoint: &'static str, body: Value) -> Self {
        let envelope = json!({ "headers": {}, "body": body });
        self.routes.push((endpoint, envelope.to_string()));
        self
    }

    fn fail(mut self, endpoint: &'static str, message: &str) -> Self {
        let envelope = json!({ "headers": {}, "body": {}, "error": true, "message": message });
        self.routes.push((endpoint, envelope.to_string()));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_url(&self) -> String {
        self.urls.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl Transport for RoutingTransport {
    async fn post(&self, request: &OutboundRequest) -> Result<TransportReply, VistaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(request.url.clone());

        let endpoint = reqwest::Url::parse(&request.url)
            .ok()
            .and_then(|url| {
                url.query_pairs()
                    .find(|(k, _)| k == "endpoint")
                    .map(|(_, v)| v.into_owned())
            })
            .unwrap_or_default();

        let body = self
            .routes
            .iter()
            .find(|(name, _)| *name == endpoint)
            .map(|(_, body)| body.clone())
            .unwrap_or_else(|| json!({ "headers": {}, "body": {}, "error": true, "message": "no route" }).to_string());

        Ok(TransportReply { status: 200, body })
    }
}

struct Fixture {
    store: MemoryStore,
    config: VistaConfig,
    logger: Logger,
}

impl Fixture {
    fn new() -> Self {
        let config = VistaConfig {
            remote_url: "https://proxy.example/rets".to_string(),
            home_url: "https://example.com".to_string(),
            ..VistaConfig::default()
        };
        Self {
            store: MemoryStore::new(),
            logger: LoggerBuilder::from_config("test-views", &config).build().unwrap(),
            config,
        }
    }

    fn page<'a>(&'a self, transport: &'a RoutingTransport, query: &str) -> PageRender<'a, RoutingTransport> {
        let api = ApiContext {
            transport,
            store: &self.store,
            config: &self.config,
            logger: &self.logger,
        };
        PageRender::new(RenderContext::new(api, PAGE, query))
    }
}

fn listing(id: i64, price: i64) -> Value {
    json!({
        "mlsId": id,
        "listPrice": price,
        "property": { "area": 1000, "bedrooms": 3 },
        "address": { "city": "Austin" }
    })
}

// =========================================================================
// SINGLE RECORD VIEWS
// =========================================================================

#[tokio::test]
async fn listing_field_fetches_once_per_page() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new().route("property", "1", listing(123, 300000));
    let mut page = fixture.page(&transport, "listing=123");

    assert_eq!(page.field(SingleKind::Listing, Some("listPrice")).await, "300,000");
    assert_eq!(page.field(SingleKind::Listing, Some("sqftprice")).await, "300.00");
    assert_eq!(page.field(SingleKind::Listing, Some("nope")).await, "Field not found");

    assert_eq!(transport.calls(), 1);
    let url = transport.last_url();
    assert!(url.contains("endpoint=property&objectID=123&include=rooms"), "{}", url);
}

#[tokio::test]
async fn listing_field_without_listing_param() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new();
    let mut page = fixture.page(&transport, "");

    assert_eq!(page.field(SingleKind::Listing, Some("listPrice")).await, NO_LISTING_PARAM_TEXT);
    assert_eq!(page.field(SingleKind::OpenHouse, Some("remarks")).await, NO_OPENHOUSE_PARAM_TEXT);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn field_shortcode_without_field_attribute() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new();
    let mut page = fixture.page(&transport, "listing=1");

    assert_eq!(page.field(SingleKind::Listing, None).await, NO_FIELD_TEXT);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn failed_listing_reads_unavailable_in_every_field() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new().fail("property", "listing gone");
    let mut page = fixture.page(&transport, "listing=9");

    assert_eq!(page.field(SingleKind::Listing, Some("listPrice")).await, LISTING_UNAVAILABLE_TEXT);
    assert_eq!(page.field(SingleKind::Listing, Some("address")).await, LISTING_UNAVAILABLE_TEXT);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn failed_open_house_shows_the_upstream_message() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new().fail("openhouse", "boom");
    let mut page = fixture.page(&transport, "openhouse=OH-1");

    assert_eq!(
        page.field(SingleKind::OpenHouse, Some("remarks")).await,
        "Error returned by API: boom"
    );
}

#[tokio::test]
async fn open_house_field_falls_back_to_listing() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new().route(
        "openhouse",
        "1",
        json!({ "openHouseKey": "OH-1", "listing": listing(5, 250000) }),
    );
    let mut page = fixture.page(&transport, "openhouse=OH-1");

    assert_eq!(page.field(SingleKind::OpenHouse, Some("openHouseKey")).await, "OH-1");
    assert_eq!(page.field(SingleKind::OpenHouse, Some("listprice")).await, "250,000");
    assert!(transport.last_url().contains("endpoint=openhouse&objectID=OH-1"));
}

#[tokio::test]
async fn analytics_with_no_matches() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new().route(
        "analytics",
        "0",
        json!({ "avgPrice": null, "avgLivingArea": null, "totalCount": 0 }),
    );
    let mut page = fixture.page(&transport, "vista-cities=Austin");

    assert_eq!(page.field(SingleKind::Analytics, Some("avgPrice")).await, NO_ANALYTICS_TEXT);
    assert!(transport.last_url().contains("cities=Austin"));
}

// =========================================================================
// MULTI RECORD VIEWS
// =========================================================================

#[tokio::test]
async fn list_and_total_share_one_fetch() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new().route("properties", "2", json!([listing(1, 100), listing(2, 200)]));
    let mut page = fixture.page(&transport, "vista-status=Active");

    let html = page.list(MultiKind::Listings, "<li>[mlsId]: [listPrice] in [city]</li>").await;
    assert_eq!(html, "<li>1: 100 in Austin</li><li>2: 200 in Austin</li>");
    assert_eq!(page.total(MultiKind::Listings).await, "2");
    assert_eq!(transport.calls(), 1);

    let url = transport.last_url();
    assert!(url.contains("endpoint=properties&status=Active&count=true&limit=20"), "{}", url);
}

#[tokio::test]
async fn visitor_limit_replaces_default_limit() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new().route("properties", "1", json!([listing(1, 100)]));
    let mut page = fixture.page(&transport, "limit=5");

    page.total(MultiKind::Listings).await;
    let url = transport.last_url();
    assert!(url.contains("limit=5"));
    assert!(!url.contains("limit=20"));
}

#[tokio::test]
async fn empty_results_read_no_listings() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new().route("properties", "0", json!([]));
    let mut page = fixture.page(&transport, "");

    assert_eq!(page.list(MultiKind::Listings, "[mlsId]").await, NO_LISTINGS_TEXT);
    assert_eq!(page.total(MultiKind::Listings).await, NO_LISTINGS_TEXT);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn open_house_list_uses_its_own_endpoint() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new().route(
        "openhouses",
        "1",
        json!([{ "openHouseKey": "OH-7", "listing": listing(7, 700000) }]),
    );
    let mut page = fixture.page(&transport, "vista-listingId=7&minbeds=3");

    assert_eq!(page.list(MultiKind::OpenHouses, "[openHouseKey]/[listPrice]").await, "OH-7/700,000");
    let url = transport.last_url();
    assert!(url.contains("listingId=7"));
    assert!(!url.contains("minbeds"));
}

#[tokio::test]
async fn paginator_links_to_next_page() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new().route("properties", "3", json!([listing(1, 100), listing(2, 200)]));
    let mut page = fixture.page(&transport, "offset=0&limit=2&vista-status=Active");

    let forward = page.paginator(MultiKind::Listings, Some("forward"), "Next").await;
    assert_eq!(
        forward,
        "<button class='vista-listings-paginator listings-forward' onclick=\"window.location.href='https://example.com/listings/?offset=2&limit=1&vista-status=Active'\" >Next</button>"
    );

    let backward = page.paginator(MultiKind::Listings, Some("backward"), "Prev").await;
    assert!(backward.contains("disabled"));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn missing_total_count_header_reads_zero() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new().route_without_count("properties", json!([listing(1, 100), listing(2, 200)]));
    let mut page = fixture.page(&transport, "offset=0&limit=2");

    assert_eq!(page.total(MultiKind::Listings).await, "0");

    let forward = page.paginator(MultiKind::Listings, Some("forward"), "Next").await;
    assert!(forward.contains("?offset=2&limit=-2"), "{}", forward);
    assert!(forward.contains("disabled"));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn paginator_without_type_skips_the_fetch() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new();
    let mut page = fixture.page(&transport, "");

    assert_eq!(page.paginator(MultiKind::Listings, None, "Next").await, NO_TYPE_TEXT);
    assert_eq!(page.paginator(MultiKind::Listings, Some("back"), "Prev").await, NO_TYPE_TEXT);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn listing_filter_searches_ids_through_q() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new().route("properties", "1", json!([listing(1, 100)]));
    let mut page = fixture.page(&transport, "vista-status=Active");

    let html = page
        .listing_filter(&[("listing_ids", "A1, B2"), ("minprice", "100"), ("bogus", "x")], "[mlsId]")
        .await;
    assert_eq!(html, "1");

    let url = transport.last_url();
    assert!(url.contains("minprice=100"));
    assert!(url.contains("q=A1&q=B2"), "{}", url);
    assert!(!url.contains("bogus"));
    assert!(!url.contains("count=true"));
    assert!(!url.contains("status=Active"));
}

#[test]
fn filter_params_split_on_commas() {
    let params = filter_params(&[("cities", "Austin,Dallas,  Houston"), ("mls_area", "North")]);
    assert_eq!(params.pairs(), vec![
        ("cities", "Austin"),
        ("cities", "Dallas"),
        ("cities", "Houston"),
        ("q", "North"),
    ]);
}

#[tokio::test]
async fn only_one_map_per_page() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new().route("properties", "1", json!([listing(1, 100)]));
    let mut page = fixture.page(&transport, "");

    let map = page.listings_map("<b>[listPrice]</b>").await;
    assert!(map.contains("data-listings='[{"));
    assert!(map.contains("&quot;listprice&quot;:&quot;100&quot;"));
    assert!(map.contains("<b><span class='vsta-map-field' id='vsta-map-info-listPrice'></span></b>"));

    assert_eq!(page.listings_map("<b>[listPrice]</b>").await, ONE_MAP_TEXT);
}

// =========================================================================
// TEMPLATES AND LINKS
// =========================================================================

#[tokio::test]
async fn link_query_keeps_safe_characters_only() {
    let fixture = Fixture::new();
    let transport = RoutingTransport::new();
    let page = fixture.page(&transport, "status=Active&city=<x>");

    assert_eq!(
        page.link_query(Some("/search/"), "Search"),
        "<a href='/search/?status=Active&city=x'>Search</a>"
    );
    assert_eq!(page.link_query(None, "Search"), NO_PAGE_TEXT);
}

#[test]
fn replace_fields_substitutes_every_token() {
    let out = replace_fields("<p>[a] and &#91;b&#93;</p>", |name| name.to_uppercase());
    assert_eq!(out, "<p>A and B</p>");
}

#[test]
fn replace_fields_marks_stray_brackets() {
    let out = replace_fields("[a] and [b [c]", |name| name.trim().to_uppercase());
    assert_eq!(out, "A and BERROR: Extra [ before c");
}
