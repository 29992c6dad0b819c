//! Reply rendering: decodes a `/chat` reply and turns its product list into
//! display-ready links.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use strum::{EnumString, IntoStaticStr};
use thiserror::Error;

/// Label used when a product title cannot be cleaned up.
pub const UNKNOWN_PRODUCT: &str = "Unknown product";

const PRODUCTS_MARKER: &str = "/products/";

/// How product entries are turned into link labels.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProductStrategy {
    /// Clean up the backend's title and show it with the price; no dedup.
    Title,
    /// Derive the name from the `/products/<slug>` url; dedup by url.
    #[default]
    Url,
}

impl ProductStrategy {
    /// Config and CLI spelling, e.g. `"url"`.
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn description(self) -> &'static str {
        match self {
            ProductStrategy::Title => "cleaned-up product title with price, one entry per product",
            ProductStrategy::Url => "name derived from the product url, duplicates removed",
        }
    }
}

/// Raw product record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
}

/// Decoded reply body.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyPayload {
    pub message: String,
    pub products: Vec<ProductRef>,
}

/// Product with a name derived from its url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayProduct {
    pub url: String,
    pub display_name: String,
}

/// A product link ready to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLink {
    pub url: String,
    pub label: String,
    pub price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReply {
    pub message: String,
    pub products: Vec<ProductLink>,
}

/// A single product entry that could not be rendered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    #[error("url has no /products/ segment: {url}")]
    MissingProductsSegment { url: String },

    #[error("product title is empty: {url}")]
    EmptyTitle { url: String },

    #[error("invalid product entry: {0}")]
    Invalid(String),
}

/// The reply as a whole could not be rendered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("reply payload is not a JSON object")]
    NotAnObject,

    #[error("reply payload has no message text")]
    MissingMessage,
}

impl ReplyPayload {
    /// Decode a reply body. The text comes from `message`, falling back to
    /// `response`. Product entries that do not decode are dropped and logged.
    pub fn from_value(raw: &Value) -> Result<Self, RenderError> {
        let object = raw.as_object().ok_or(RenderError::NotAnObject)?;

        let message = object
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| object.get("response").and_then(Value::as_str))
            .ok_or(RenderError::MissingMessage)?
            .to_string();

        let products = match object.get("products") {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|entry| match ProductRef::deserialize(entry) {
                    Ok(product) => Some(product),
                    Err(e) => {
                        tracing::warn!(
                            error = %ProductError::Invalid(e.to_string()),
                            "skipping product entry"
                        );
                        None
                    }
                })
                .collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                tracing::warn!(products = %other, "products field is not a list, ignoring");
                Vec::new()
            }
        };

        Ok(Self { message, products })
    }
}

/// Insert a space at each lowercase→uppercase boundary, collapse whitespace
/// runs and trim. `"BlueRunningShoe"` becomes `"Blue Running Shoe"`.
pub fn clean_title(title: &str) -> String {
    let mut spaced = String::with_capacity(title.len() + 8);
    let mut prev: Option<char> = None;
    for ch in title.chars() {
        if let Some(p) = prev {
            if p.is_lowercase() && ch.is_uppercase() {
                spaced.push(' ');
            }
        }
        spaced.push(ch);
        prev = Some(ch);
    }

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Human-readable name from a product url:
/// `https://shop.example.com/products/blue-running-shoe?variant=7` → `Blue Running Shoe`.
pub fn display_name_from_url(url: &str) -> Result<String, ProductError> {
    let missing = || ProductError::MissingProductsSegment {
        url: url.to_string(),
    };

    let (_, rest) = url.split_once(PRODUCTS_MARKER).ok_or_else(missing)?;
    let slug = rest
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .split('/')
        .next()
        .unwrap_or_default();

    let words: Vec<String> = slug
        .split('-')
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect();

    if words.is_empty() {
        return Err(missing());
    }
    Ok(words.join(" "))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Unique products in first-occurrence order. Entries whose url yields no
/// name are skipped.
pub fn dedup_products(products: &[ProductRef]) -> Vec<DisplayProduct> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut unique = Vec::new();

    for product in products {
        if !seen.insert(product.url.as_str()) {
            continue;
        }
        match display_name_from_url(&product.url) {
            Ok(display_name) => unique.push(DisplayProduct {
                url: product.url.clone(),
                display_name,
            }),
            Err(e) => tracing::warn!(error = %e, "skipping product"),
        }
    }

    unique
}

/// Turns raw replies into [`RenderedReply`] values using one [`ProductStrategy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    strategy: ProductStrategy,
}

impl Renderer {
    pub fn new(strategy: ProductStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ProductStrategy {
        self.strategy
    }

    pub fn render(&self, raw: &Value) -> Result<RenderedReply, RenderError> {
        let payload = ReplyPayload::from_value(raw)?;
        Ok(self.render_payload(&payload))
    }

    pub fn render_payload(&self, payload: &ReplyPayload) -> RenderedReply {
        let products = match self.strategy {
            ProductStrategy::Title => payload.products.iter().map(title_link).collect(),
            ProductStrategy::Url => dedup_products(&payload.products)
                .into_iter()
                .map(|product| ProductLink {
                    label: format!("View: {}", product.display_name),
                    url: product.url,
                    price: None,
                })
                .collect(),
        };

        RenderedReply {
            message: payload.message.clone(),
            products,
        }
    }
}

fn title_link(product: &ProductRef) -> ProductLink {
    let cleaned = product.title.as_deref().map(clean_title).unwrap_or_default();
    let label = if cleaned.is_empty() {
        let e = ProductError::EmptyTitle {
            url: product.url.clone(),
        };
        tracing::warn!(error = %e, "using fallback product label");
        UNKNOWN_PRODUCT.to_string()
    } else {
        cleaned
    };

    ProductLink {
        url: product.url.clone(),
        label,
        price: product.price.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(url: &str) -> ProductRef {
        ProductRef {
            url: url.to_string(),
            title: None,
            price: None,
        }
    }

    #[test]
    fn test_clean_title_splits_camel_case() {
        assert_eq!(clean_title("BlueRunningShoe"), "Blue Running Shoe");
        assert_eq!(clean_title("CBDOilDrops"), "CBDOil Drops");
        assert_eq!(clean_title("hempSeedOil"), "hemp Seed Oil");
    }

    #[test]
    fn test_clean_title_collapses_whitespace() {
        assert_eq!(clean_title("  Hemp \t\n  Heart   Oil "), "Hemp Heart Oil");
        assert_eq!(clean_title("Pain ReliefBalm"), "Pain Relief Balm");
    }

    #[test]
    fn test_clean_title_is_idempotent() {
        for raw in ["BlueRunningShoe", "  a  bC dEf ", "ALLCAPS", "", "xYzW"] {
            let once = clean_title(raw);
            assert_eq!(clean_title(&once), once);
            assert!(!once.contains("  "));
        }
    }

    #[test]
    fn test_display_name_from_url() {
        assert_eq!(
            display_name_from_url("https://shop.example.com/products/blue-running-shoe?variant=7")
                .unwrap(),
            "Blue Running Shoe"
        );
        assert_eq!(
            display_name_from_url("https://boheco.com/products/hemp-oil/reviews#top").unwrap(),
            "Hemp Oil"
        );
    }

    #[test]
    fn test_display_name_collapses_repeated_hyphens() {
        assert_eq!(
            display_name_from_url("https://s.com/products/blue--shoe-").unwrap(),
            "Blue Shoe"
        );
    }

    #[test]
    fn test_display_name_without_products_segment() {
        let err = display_name_from_url("https://shop.example.com/collections/all").unwrap_err();
        assert!(matches!(err, ProductError::MissingProductsSegment { .. }));
        assert!(display_name_from_url("https://shop.example.com/products/?x=1").is_err());
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let products = vec![
            product("https://s.com/products/a-one"),
            product("https://s.com/products/b-two"),
            product("https://s.com/products/a-one"),
            product("https://s.com/products/c-three"),
            product("https://s.com/products/b-two"),
        ];

        let names: Vec<_> = dedup_products(&products)
            .into_iter()
            .map(|p| p.display_name)
            .collect();
        assert_eq!(names, vec!["A One", "B Two", "C Three"]);
    }

    #[test]
    fn test_dedup_skips_malformed_urls() {
        let products = vec![
            product("https://s.com/pages/about"),
            product("https://s.com/products/calm-drops"),
        ];
        let unique = dedup_products(&products);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].display_name, "Calm Drops");
    }

    #[test]
    fn test_render_url_strategy_labels() {
        let raw = json!({
            "message": "Try these",
            "products": [
                {"url": "https://s.com/products/blue-running-shoe?variant=7", "title": "x"},
                {"url": "https://s.com/products/blue-running-shoe?variant=7", "title": "y"},
                {"url": "https://s.com/about"}
            ]
        });
        let rendered = Renderer::new(ProductStrategy::Url).render(&raw).unwrap();
        assert_eq!(rendered.message, "Try these");
        assert_eq!(rendered.products.len(), 1);
        assert_eq!(rendered.products[0].label, "View: Blue Running Shoe");
    }

    #[test]
    fn test_render_title_strategy_keeps_duplicates() {
        let raw = json!({
            "message": "Options",
            "products": [
                {"url": "https://s.com/p/1", "title": "HempSeedOil", "price": "₹499"},
                {"url": "https://s.com/p/1", "title": "HempSeedOil", "price": "₹499"},
                {"url": "https://s.com/p/2", "title": "   "}
            ]
        });
        let rendered = Renderer::new(ProductStrategy::Title).render(&raw).unwrap();
        assert_eq!(rendered.products.len(), 3);
        assert_eq!(rendered.products[0].label, "Hemp Seed Oil");
        assert_eq!(rendered.products[0].price.as_deref(), Some("₹499"));
        assert_eq!(rendered.products[2].label, UNKNOWN_PRODUCT);
    }

    #[test]
    fn test_payload_accepts_response_field() {
        let payload = ReplyPayload::from_value(&json!({"response": "Hello", "products": []})).unwrap();
        assert_eq!(payload.message, "Hello");
        assert!(payload.products.is_empty());
    }

    #[test]
    fn test_payload_skips_invalid_product_entries() {
        let payload = ReplyPayload::from_value(&json!({
            "message": "Hi",
            "products": [{"title": "no url"}, 42, {"url": "https://s.com/products/ok"}]
        }))
        .unwrap();
        assert_eq!(payload.products.len(), 1);
        assert_eq!(payload.products[0].url, "https://s.com/products/ok");
    }

    #[test]
    fn test_render_errors() {
        let renderer = Renderer::default();
        assert_eq!(renderer.render(&json!([1, 2])), Err(RenderError::NotAnObject));
        assert_eq!(
            renderer.render(&json!({"products": []})),
            Err(RenderError::MissingMessage)
        );
    }

    #[test]
    fn test_strategy_parsing() {
        use std::str::FromStr;
        assert_eq!(ProductStrategy::from_str("title").unwrap(), ProductStrategy::Title);
        assert_eq!(ProductStrategy::from_str("URL").unwrap(), ProductStrategy::Url);
        assert!(ProductStrategy::from_str("price").is_err());
        assert_eq!(ProductStrategy::default(), ProductStrategy::Url);
    }
}
