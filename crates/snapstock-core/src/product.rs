//! Product domain types shared across the scan pipeline.
//!
//! Field names are the wire contract between the mobile client, the dashboard
//! and the publish path — serde renames keep the JSON keys camelCase
//! (`descriptionHtml`, `estimatedWeight`, …) while the Rust side stays
//! snake_case.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Lifecycle status of a scanned product.
///
/// `Draft` from the moment the AI analysis lands until a successful remote
/// product-create call flips it to `Published`. The transition is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Draft,
    Published,
}

impl ProductStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Draft => "DRAFT",
            ProductStatus::Published => "PUBLISHED",
        }
    }

    /// Parses the stored/wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidProductStatus`] for anything other than
    /// `DRAFT` or `PUBLISHED`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw {
            "DRAFT" => Ok(ProductStatus::Draft),
            "PUBLISHED" => Ok(ProductStatus::Published),
            other => Err(CoreError::InvalidProductStatus(other.to_string())),
        }
    }
}

/// One variant dimension: a name ("Size"), its ordered values, and an
/// optional per-value quantity list.
///
/// Value insertion order is significant — it defines variant enumeration
/// order, and the first combination coincides with the variant the platform
/// auto-creates on product creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOption {
    pub name: String,
    pub values: Vec<String>,
    /// Same length as `values` when present. Only meaningful when the option
    /// set holds exactly one option; ignored otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantities: Option<Vec<i64>>,
}

/// The full option set attached to a scanned product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOptionSet {
    pub options: Vec<VariantOption>,
}

impl VariantOptionSet {
    /// Drops options with no values, defaults empty names to `"Option"`, and
    /// discards quantity lists whose length does not match their values.
    #[must_use]
    pub fn normalized(self) -> Self {
        let options = self
            .options
            .into_iter()
            .filter(|o| !o.values.is_empty())
            .map(|mut o| {
                if o.name.trim().is_empty() {
                    o.name = "Option".to_string();
                }
                if let Some(q) = &o.quantities {
                    if q.len() != o.values.len() {
                        o.quantities = None;
                    }
                }
                o
            })
            .collect();
        Self { options }
    }

    /// `true` when at least one option carries at least one value — the
    /// condition under which the publish path declares product options.
    #[must_use]
    pub fn has_values(&self) -> bool {
        self.options.iter().any(|o| !o.values.is_empty())
    }

    /// Per-variant quantities, valid only in the single-option case with an
    /// aligned quantities list. Multi-option quantity semantics are
    /// deliberately undefined; callers fall back to a flat quantity.
    #[must_use]
    pub fn per_value_quantities(&self) -> Option<&[i64]> {
        match self.options.as_slice() {
            [only] => only
                .quantities
                .as_deref()
                .filter(|q| q.len() == only.values.len()),
            _ => None,
        }
    }
}

/// A product extracted from one scan, as edited on the dashboard and handed
/// to the publish path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedProduct {
    pub title: String,
    pub description_html: String,
    pub product_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Weight in grams. Converted to kilograms at the platform boundary.
    #[serde(default)]
    pub estimated_weight: i64,
    /// Decimal price string in the shop currency, e.g. `"24.99"`. May be
    /// empty while in draft; the publish path substitutes `"0.00"`.
    #[serde(default)]
    pub price: String,
    pub status: ProductStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_quantity: Option<i64>,
    #[serde(default)]
    pub track_inventory: bool,
    /// Ordered image list. Entries are either external URLs or inline
    /// `data:` URLs still awaiting a staged upload.
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<VariantOptionSet>,
}

impl ScannedProduct {
    /// `true` when the product carries a usable variant option set.
    #[must_use]
    pub fn has_variants(&self) -> bool {
        self.variants.as_ref().is_some_and(VariantOptionSet::has_values)
    }

    /// Price to send to the platform: the stored price, or `"0.00"` when the
    /// draft never got one.
    #[must_use]
    pub fn price_or_default(&self) -> String {
        if self.price.trim().is_empty() {
            "0.00".to_string()
        } else {
            self.price.trim().to_string()
        }
    }
}

/// Builds a SKU from a product title: uppercase, non-alphanumerics collapsed
/// to `-`, truncated to 10 chars, suffixed with the last four digits of the
/// supplied timestamp so repeated scans of the same item stay distinct.
#[must_use]
pub fn generate_sku(title: &str, now_millis: i64) -> String {
    let clean: String = title
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .take(10)
        .collect();
    let millis = now_millis.unsigned_abs().to_string();
    let suffix = &millis[millis.len().saturating_sub(4)..];
    format!("{clean}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(name: &str, values: &[&str], quantities: Option<Vec<i64>>) -> VariantOption {
        VariantOption {
            name: name.to_string(),
            values: values.iter().map(ToString::to_string).collect(),
            quantities,
        }
    }

    #[test]
    fn status_parse_roundtrip() {
        assert_eq!(ProductStatus::parse("DRAFT").unwrap(), ProductStatus::Draft);
        assert_eq!(
            ProductStatus::parse("PUBLISHED").unwrap(),
            ProductStatus::Published
        );
        assert!(ProductStatus::parse("ACTIVE").is_err());
    }

    #[test]
    fn normalized_drops_empty_options_and_defaults_name() {
        let set = VariantOptionSet {
            options: vec![
                option("", &["S", "M"], None),
                option("Color", &[], None),
            ],
        }
        .normalized();

        assert_eq!(set.options.len(), 1);
        assert_eq!(set.options[0].name, "Option");
        assert_eq!(set.options[0].values, vec!["S", "M"]);
    }

    #[test]
    fn normalized_discards_misaligned_quantities() {
        let set = VariantOptionSet {
            options: vec![option("Size", &["S", "M", "L"], Some(vec![1, 2]))],
        }
        .normalized();

        assert!(set.options[0].quantities.is_none());
    }

    #[test]
    fn per_value_quantities_single_option_only() {
        let single = VariantOptionSet {
            options: vec![option("Size", &["S", "M"], Some(vec![4, 5]))],
        };
        assert_eq!(single.per_value_quantities(), Some(&[4, 5][..]));

        let multi = VariantOptionSet {
            options: vec![
                option("Size", &["S", "M"], Some(vec![4, 5])),
                option("Color", &["Red"], Some(vec![9])),
            ],
        };
        assert_eq!(multi.per_value_quantities(), None);
    }

    #[test]
    fn scanned_product_serializes_contract_keys() {
        let product = ScannedProduct {
            title: "Blue Toaster".to_string(),
            description_html: "<p>Toasts.</p>".to_string(),
            product_type: "Electronics".to_string(),
            tags: vec!["toaster".to_string()],
            estimated_weight: 300,
            price: "29.99".to_string(),
            status: ProductStatus::Draft,
            sku: Some("BLUE-TOAST-1234".to_string()),
            inventory_quantity: Some(10),
            track_inventory: true,
            image_urls: vec!["https://cdn.example.com/1.jpg".to_string()],
            variants: None,
        };

        let json = serde_json::to_value(&product).expect("serialize");
        assert_eq!(json["descriptionHtml"], "<p>Toasts.</p>");
        assert_eq!(json["productType"], "Electronics");
        assert_eq!(json["estimatedWeight"], 300);
        assert_eq!(json["trackInventory"], true);
        assert_eq!(json["inventoryQuantity"], 10);
        assert_eq!(json["imageUrls"][0], "https://cdn.example.com/1.jpg");
        assert_eq!(json["status"], "DRAFT");
    }

    #[test]
    fn price_or_default_substitutes_zero() {
        let mut product = ScannedProduct {
            title: String::new(),
            description_html: String::new(),
            product_type: String::new(),
            tags: vec![],
            estimated_weight: 0,
            price: "  ".to_string(),
            status: ProductStatus::Draft,
            sku: None,
            inventory_quantity: None,
            track_inventory: false,
            image_urls: vec![],
            variants: None,
        };
        assert_eq!(product.price_or_default(), "0.00");
        product.price = " 12.50 ".to_string();
        assert_eq!(product.price_or_default(), "12.50");
    }

    #[test]
    fn generate_sku_cleans_and_suffixes() {
        let sku = generate_sku("Blue Toaster 2-Slot", 1_700_000_001_234);
        assert_eq!(sku, "BLUE-TOAST-1234");
    }

    #[test]
    fn generate_sku_short_title() {
        let sku = generate_sku("Mug", 9_876);
        assert_eq!(sku, "MUG-9876");
    }
}
