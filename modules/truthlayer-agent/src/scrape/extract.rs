//! Field extraction from rendered listing HTML.
//!
//! Every extractor fails soft: a missing selector or unparseable value leaves
//! the field unset and never aborts extraction.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use truthlayer_common::{ContactInfo, ListingData};

static RE_PRICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\s?(\d[\d,]*)").unwrap());
static RE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,]*").unwrap());
static RE_BEDROOMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:bedrooms?|beds?|br)\b").unwrap());
static RE_BATHROOMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:bathrooms?|baths?|ba)\b").unwrap());
static RE_SQFT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d[\d,]*)\s*(?:sq\.?\s?ft|sqft|ft2|ft²)").unwrap());

/// Listing sites with dedicated extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteFamily {
    Zillow,
    Craigslist,
    ApartmentsCom,
    Generic,
}

impl SiteFamily {
    pub fn from_url(url: &str) -> Self {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
            .unwrap_or_default();

        let matches = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));
        if matches("zillow.com") {
            SiteFamily::Zillow
        } else if matches("craigslist.org") {
            SiteFamily::Craigslist
        } else if matches("apartments.com") {
            SiteFamily::ApartmentsCom
        } else {
            SiteFamily::Generic
        }
    }
}

/// Extract listing attributes from `html`, choosing the strategy by URL.
pub fn extract(url: &str, html: &str) -> ListingData {
    let document = Html::parse_document(html);
    let mut data = ListingData::new(url);

    match SiteFamily::from_url(url) {
        SiteFamily::Zillow => extract_zillow(&document, &mut data),
        SiteFamily::Craigslist => extract_craigslist(&document, &mut data),
        SiteFamily::ApartmentsCom => extract_apartments(&document, &mut data),
        SiteFamily::Generic => extract_generic(&document, &mut data),
    }

    data
}

fn extract_zillow(doc: &Html, data: &mut ListingData) {
    data.title = select_text(doc, r#"h1[data-testid="property-details-address"]"#);
    data.address = data.title.clone();
    data.rent = select_text(doc, r#"[data-testid="property-details-price"]"#)
        .and_then(|t| parse_price(&t));
    data.bedrooms = select_text(doc, r#"[data-testid="property-details-beds"]"#)
        .and_then(|t| parse_number(&t));
    data.bathrooms = select_text(doc, r#"[data-testid="property-details-baths"]"#)
        .and_then(|t| parse_decimal(&t));
    data.sqft = select_text(doc, r#"[data-testid="property-details-sqft"]"#)
        .and_then(|t| parse_number(&t));
    data.description = select_text(doc, ".property-details-description");
    data.photos = select_images(doc, r#"img[data-testid*="photo"]"#);
}

fn extract_craigslist(doc: &Html, data: &mut ListingData) {
    data.title = select_text(doc, "#titletextonly");
    data.rent = select_text(doc, ".price").and_then(|t| parse_price(&t));

    if let Some(housing) = select_text(doc, ".housing") {
        data.bedrooms = parse_bedrooms(&housing);
        data.sqft = parse_sqft(&housing);
    }

    data.description = select_text(doc, "#postingbody");
    data.photos = select_images(doc, "#thumbs img");

    let phone = selector("a[href^='tel:']").and_then(|sel| {
        doc.select(&sel)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
    });
    if let Some(phone) = phone {
        data.contact_info = Some(ContactInfo {
            phone: Some(phone),
            ..Default::default()
        });
    }
}

fn extract_apartments(doc: &Html, data: &mut ListingData) {
    data.title = select_text(doc, ".property-title h1");
    data.rent =
        select_text(doc, ".pricing-details .price-range").and_then(|t| parse_price(&t));

    if let Some(summary) = select_text(doc, ".bed-bath-sqft") {
        data.bedrooms = parse_bedrooms(&summary);
        data.bathrooms = parse_bathrooms(&summary);
        data.sqft = parse_sqft(&summary);
    }
}

fn extract_generic(doc: &Html, data: &mut ListingData) {
    data.title = select_text(doc, "title");

    let body = selector("body")
        .and_then(|sel| doc.select(&sel).next().map(element_text))
        .unwrap_or_default();

    data.rent = largest_price(&body);
    data.bedrooms = parse_bedrooms(&body);
    data.bathrooms = parse_bathrooms(&body);
    data.sqft = parse_sqft(&body);
}

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::warn!(css, error = %e, "Invalid selector");
            None
        }
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn select_text(doc: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    doc.select(&sel)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

fn select_images(doc: &Html, css: &str) -> Vec<String> {
    let Some(sel) = selector(css) else {
        return Vec::new();
    };
    doc.select(&sel)
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| !src.is_empty() && !src.starts_with("data:"))
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

fn digits(raw: &str) -> Option<u32> {
    raw.replace(',', "").parse().ok()
}

/// First `$` amount in the text.
pub fn parse_price(text: &str) -> Option<u32> {
    RE_PRICE.captures(text).and_then(|c| digits(&c[1]))
}

/// Largest `$` amount in the text. Listing pages tend to mention deposits and
/// fees alongside the rent, and the rent is usually the biggest figure.
pub fn largest_price(text: &str) -> Option<u32> {
    RE_PRICE
        .captures_iter(text)
        .filter_map(|c| digits(&c[1]))
        .max()
}

/// First integer in the text, thousands separators allowed.
pub fn parse_number(text: &str) -> Option<u32> {
    RE_NUMBER.find(text).and_then(|m| digits(m.as_str()))
}

fn parse_decimal(text: &str) -> Option<f32> {
    static RE_DECIMAL: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());
    RE_DECIMAL.find(text).and_then(|m| m.as_str().parse().ok())
}

pub fn parse_bedrooms(text: &str) -> Option<u32> {
    RE_BEDROOMS.captures(text).and_then(|c| c[1].parse().ok())
}

pub fn parse_bathrooms(text: &str) -> Option<f32> {
    RE_BATHROOMS.captures(text).and_then(|c| c[1].parse().ok())
}

pub fn parse_sqft(text: &str) -> Option<u32> {
    RE_SQFT.captures(text).and_then(|c| digits(&c[1]))
}
