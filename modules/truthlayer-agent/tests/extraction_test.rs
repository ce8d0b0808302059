//! Listing extraction tests.
//!
//! Static HTML fixtures for each supported site family, run through the
//! extractor and through `PageScraper` with an in-memory or HTTP page source.
//! Missing markup must leave fields unset rather than fail.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use truthlayer_agent::scrape::extract::extract;
use truthlayer_agent::scrape::{
    validate_url, HttpPageSource, ListingScraper, PageScraper, PageSource,
};
use truthlayer_common::ScrapeError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const ZILLOW_URL: &str = "https://www.zillow.com/homedetails/456-Oak-St/123_zpid/";
const ZILLOW_HTML: &str = r#"
<html><body>
  <h1 data-testid="property-details-address">456 Oak St, Oakland, CA 94610</h1>
  <span data-testid="property-details-price">$3,150/mo</span>
  <span data-testid="property-details-beds">2 bd</span>
  <span data-testid="property-details-baths">1.5 ba</span>
  <span data-testid="property-details-sqft">1,050 sqft</span>
  <div class="property-details-description">Top floor unit with a view of the lake.</div>
  <img data-testid="photo-1" src="https://photos.zillowstatic.com/a.jpg">
  <img data-testid="photo-2" src="data:image/gif;base64,R0lGOD">
  <img data-testid="photo-3" src="https://photos.zillowstatic.com/b.jpg">
</body></html>
"#;

const CRAIGSLIST_URL: &str = "https://sfbay.craigslist.org/sfc/apa/d/sunny-2br/7700.html";
const CRAIGSLIST_HTML: &str = r#"
<html><body>
  <h1><span id="titletextonly">Sunny 2BR in the Mission</span>
      <span class="price">$3,400</span>
      <span class="housing">/ 2br - 900ft2 - </span></h1>
  <div id="thumbs">
    <a><img src="https://images.craigslist.org/1.jpg"></a>
    <a><img src="https://images.craigslist.org/2.jpg"></a>
  </div>
  <section id="postingbody">Hardwood floors, in-unit laundry.</section>
  <a href="tel:+14155550100">(415) 555-0100</a>
</body></html>
"#;

const APARTMENTS_URL: &str = "https://www.apartments.com/the-lofts-san-jose-ca/abc123/";
const APARTMENTS_HTML: &str = r#"
<html><body>
  <div class="property-title"><h1>The Lofts at Santana Row</h1></div>
  <div class="pricing-details"><span class="price-range">$2,800 - $3,600</span></div>
  <div class="bed-bath-sqft">2 Beds 2 Baths 1,100 Sq Ft</div>
</body></html>
"#;

const GENERIC_HTML: &str = r#"
<html>
  <head><title>Cozy loft downtown</title></head>
  <body>
    <h1>Cozy loft</h1>
    <p>Deposit $500. Rent $3,200 per month, $45 application fee.</p>
    <p>2 bedrooms, 1 bath, 850 sq ft.</p>
  </body>
</html>
"#;

/// Serves canned HTML by URL and counts fetches.
#[derive(Default)]
struct FixturePages {
    pages: HashMap<String, String>,
    fetches: Arc<AtomicUsize>,
}

impl FixturePages {
    fn with(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }
}

#[async_trait]
impl PageSource for FixturePages {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::Navigation(format!("no fixture for {url}")))
    }
}

// ---------------------------------------------------------------------------
// Site extractors
// ---------------------------------------------------------------------------

#[test]
fn zillow_listing() {
    let listing = extract(ZILLOW_URL, ZILLOW_HTML);

    assert_eq!(listing.url, ZILLOW_URL);
    assert_eq!(listing.title.as_deref(), Some("456 Oak St, Oakland, CA 94610"));
    assert_eq!(listing.address, listing.title);
    assert_eq!(listing.rent, Some(3150));
    assert_eq!(listing.bedrooms, Some(2));
    assert_eq!(listing.bathrooms, Some(1.5));
    assert_eq!(listing.sqft, Some(1050));
    assert_eq!(
        listing.description.as_deref(),
        Some("Top floor unit with a view of the lake.")
    );
    assert_eq!(
        listing.photos,
        vec![
            "https://photos.zillowstatic.com/a.jpg",
            "https://photos.zillowstatic.com/b.jpg"
        ]
    );
}

#[test]
fn craigslist_listing() {
    let listing = extract(CRAIGSLIST_URL, CRAIGSLIST_HTML);

    assert_eq!(listing.title.as_deref(), Some("Sunny 2BR in the Mission"));
    assert_eq!(listing.address, None);
    assert_eq!(listing.rent, Some(3400));
    assert_eq!(listing.bedrooms, Some(2));
    assert_eq!(listing.sqft, Some(900));
    assert_eq!(
        listing.description.as_deref(),
        Some("Hardwood floors, in-unit laundry.")
    );
    assert_eq!(listing.photos.len(), 2);

    let contact = listing.contact_info.expect("phone link should be captured");
    assert_eq!(contact.phone.as_deref(), Some("(415) 555-0100"));
    assert_eq!(contact.email, None);
}

#[test]
fn apartments_listing() {
    let listing = extract(APARTMENTS_URL, APARTMENTS_HTML);

    assert_eq!(listing.title.as_deref(), Some("The Lofts at Santana Row"));
    assert_eq!(listing.rent, Some(2800), "first figure of a price range");
    assert_eq!(listing.bedrooms, Some(2));
    assert_eq!(listing.bathrooms, Some(2.0));
    assert_eq!(listing.sqft, Some(1100));
}

#[test]
fn generic_page_takes_the_largest_price() {
    let listing = extract("https://rentals.example.com/listing/42", GENERIC_HTML);

    assert_eq!(listing.title.as_deref(), Some("Cozy loft downtown"));
    assert_eq!(listing.rent, Some(3200));
    assert_eq!(listing.bedrooms, Some(2));
    assert_eq!(listing.bathrooms, Some(1.0));
    assert_eq!(listing.sqft, Some(850));
}

#[test]
fn missing_markup_leaves_fields_unset() {
    let listing = extract(
        CRAIGSLIST_URL,
        "<html><body><p>This posting has been deleted.</p></body></html>",
    );

    assert_eq!(listing.url, CRAIGSLIST_URL);
    assert_eq!(listing.title, None);
    assert_eq!(listing.rent, None);
    assert_eq!(listing.bedrooms, None);
    assert!(listing.photos.is_empty());
    assert!(listing.contact_info.is_none());
    assert_eq!(listing.label(), CRAIGSLIST_URL);
}

#[test]
fn garbage_input_does_not_panic() {
    let listing = extract(ZILLOW_URL, "<<<>>> $ $$ bd ba <h1 data-testid=");
    assert_eq!(listing.rent, None);
}

// ---------------------------------------------------------------------------
// URL validation
// ---------------------------------------------------------------------------

#[test]
fn only_http_urls_are_accepted() {
    assert!(validate_url("https://www.zillow.com/homedetails/1").is_ok());
    assert!(validate_url("http://localhost:8080/listing").is_ok());

    for bad in ["ftp://example.com/listing", "file:///etc/passwd", "not a url", ""] {
        assert!(
            matches!(validate_url(bad), Err(ScrapeError::InvalidUrl(_))),
            "{bad:?} should be rejected"
        );
    }
}

// ---------------------------------------------------------------------------
// PageScraper
// ---------------------------------------------------------------------------

#[tokio::test]
async fn page_scraper_dispatches_by_site() {
    let pages = FixturePages::default()
        .with(ZILLOW_URL, ZILLOW_HTML)
        .with(CRAIGSLIST_URL, CRAIGSLIST_HTML);
    let fetches = pages.fetches.clone();
    let scraper = PageScraper::new(Box::new(pages));

    let zillow = scraper.scrape(ZILLOW_URL).await.unwrap();
    let craigslist = scraper.scrape(CRAIGSLIST_URL).await.unwrap();

    assert_eq!(zillow.rent, Some(3150));
    assert_eq!(craigslist.rent, Some(3400));
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalid_url_is_rejected_before_fetching() {
    let pages = FixturePages::default();
    let fetches = pages.fetches.clone();
    let scraper = PageScraper::new(Box::new(pages));

    let err = scraper.scrape("javascript:alert(1)").await.unwrap_err();

    assert!(matches!(err, ScrapeError::InvalidUrl(_)));
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn http_source_fetches_and_extracts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/listing/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(GENERIC_HTML))
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpPageSource::new(Duration::from_secs(5)).unwrap();
    let scraper = PageScraper::new(Box::new(source));
    let url = format!("{}/listing/42", server.uri());

    let listing = scraper.scrape(&url).await.unwrap();

    assert_eq!(listing.url, url);
    assert_eq!(listing.rent, Some(3200));
    assert_eq!(listing.bedrooms, Some(2));
}

#[tokio::test]
async fn http_error_status_is_a_navigation_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let source = HttpPageSource::new(Duration::from_secs(5)).unwrap();
    let scraper = PageScraper::new(Box::new(source));

    let err = scraper
        .scrape(&format!("{}/gone", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Navigation(_)), "got {err:?}");
}
