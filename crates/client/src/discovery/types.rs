//! Upstream event payloads and the summaries built from them.

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stagedoor_core::Price;
use stagedoor_core::types::price;

/// Lowest and highest whole-dollar price used when upstream sends no range.
const FALLBACK_PRICE_MIN: i64 = 20;
const FALLBACK_PRICE_MAX: i64 = 40;

/// Preferred listing image: 16:9 at 205×115.
const PREFERRED_IMAGE: (&str, u32, u32) = ("16_9", 205, 115);

// ─────────────────────────────────────────────────────────────────────────────
// Upstream payload
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EventsPage {
    #[serde(default, rename = "_embedded")]
    pub embedded: Option<EmbeddedEvents>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EmbeddedEvents {
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
}

impl EventsPage {
    /// Events that decode and carry an id. Malformed entries are skipped so
    /// one bad event does not sink the page.
    pub(crate) fn into_events(self) -> Vec<RawEvent> {
        self.embedded
            .map(|embedded| embedded.events)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|value| serde_json::from_value::<RawEvent>(value).ok())
            .filter(|event| !event.id.trim().is_empty())
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub images: Vec<RawImage>,
    #[serde(default)]
    pub dates: Option<RawDates>,
    #[serde(default, rename = "_embedded")]
    pub embedded: Option<RawEventEmbedded>,
    #[serde(default)]
    pub price_ranges: Vec<RawPriceRange>,
    #[serde(default)]
    pub ticket_limit: Option<RawTicketLimit>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawImage {
    #[serde(default)]
    pub ratio: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawDates {
    #[serde(default)]
    pub start: Option<RawStart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawStart {
    #[serde(default)]
    pub local_date: Option<String>,
    #[serde(default)]
    pub local_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawEventEmbedded {
    #[serde(default)]
    pub venues: Vec<RawVenue>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawVenue {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub city: Option<RawCity>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawCity {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawPriceRange {
    #[serde(default, deserialize_with = "price::lenient")]
    pub min: Option<Price>,
    #[serde(default, deserialize_with = "price::lenient")]
    pub max: Option<Price>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawTicketLimit {
    #[serde(default)]
    pub info: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Summaries
// ─────────────────────────────────────────────────────────────────────────────

/// Ticket price range for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceRange {
    pub min: Price,
    pub max: Price,
    /// Whether the range was made up locally because upstream sent none.
    pub estimated: bool,
}

impl PriceRange {
    /// A random whole-dollar range within the fallback bounds, `min <= max`.
    #[must_use]
    pub fn estimate() -> Self {
        let mut rng = rand::rng();
        let min = rng.random_range(FALLBACK_PRICE_MIN..=FALLBACK_PRICE_MAX);
        let max = rng.random_range(min..=FALLBACK_PRICE_MAX);
        Self {
            min: Price::new(Decimal::from(min)),
            max: Price::new(Decimal::from(max)),
            estimated: true,
        }
    }
}

/// An event listing, flattened from the upstream payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub image: Option<String>,
    /// Local start date, `YYYY-MM-DD`.
    pub date: Option<String>,
    pub time: Option<String>,
    pub venue: Option<String>,
    pub city: Option<String>,
    pub price_range: PriceRange,
    pub ticket_limit: Option<String>,
}

impl EventSummary {
    /// Flatten an upstream event, using `fallback` when it has no usable price range.
    pub(crate) fn from_raw(raw: RawEvent, fallback: impl FnOnce() -> PriceRange) -> Self {
        let image = pick_image(&raw.images);

        let upstream_range = raw.price_ranges.first().and_then(|range| {
            let min = range.min.or(range.max)?;
            let max = range.max.unwrap_or(min).max(min);
            Some(PriceRange {
                min,
                max,
                estimated: false,
            })
        });

        let start = raw.dates.and_then(|d| d.start);
        let venue = raw.embedded.and_then(|e| e.venues.into_iter().next());

        Self {
            name: raw.name.unwrap_or_else(|| raw.id.clone()),
            id: raw.id,
            url: raw.url,
            image,
            date: start.as_ref().and_then(|s| s.local_date.clone()),
            time: start.and_then(|s| s.local_time),
            venue: venue.as_ref().and_then(|v| v.name.clone()),
            city: venue.and_then(|v| v.city).and_then(|c| c.name),
            price_range: upstream_range.unwrap_or_else(fallback),
            ticket_limit: raw.ticket_limit.and_then(|t| t.info),
        }
    }
}

fn pick_image(images: &[RawImage]) -> Option<String> {
    let (ratio, width, height) = PREFERRED_IMAGE;
    images
        .iter()
        .find(|img| {
            img.ratio.as_deref() == Some(ratio)
                && img.width == Some(width)
                && img.height == Some(height)
        })
        .or_else(|| images.first())
        .and_then(|img| img.url.clone())
}
