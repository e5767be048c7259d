//! Input and response types for the Admin GraphQL operations.
//!
//! Inputs serialize straight into GraphQL variables (camelCase keys);
//! responses mirror only the fields the publish protocol reads.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreateInput {
    pub title: String,
    pub description_html: String,
    pub product_type: String,
    pub tags: Vec<String>,
    pub status: String,
    pub metafields: Vec<MetafieldInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_options: Option<Vec<ProductOptionInput>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetafieldInput {
    pub namespace: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: String,
}

impl MetafieldInput {
    /// The fixed provenance tag attached to every published product.
    #[must_use]
    pub fn provenance() -> Self {
        Self {
            namespace: "snapstock".to_string(),
            key: "source".to_string(),
            value: "snap_to_stock".to_string(),
            value_type: "single_line_text_field".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductOptionInput {
    pub name: String,
    pub position: i32,
    pub values: Vec<OptionValueInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionValueInput {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMediaInput {
    pub original_source: String,
    pub media_content_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantBulkInput {
    /// Present only on bulk updates (targets an existing variant).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Present only on bulk creates (declares the combination).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_values: Option<Vec<VariantOptionValueInput>>,
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_item: Option<InventoryItemInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantOptionValueInput {
    pub option_name: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Omitted on the default-variant fixup, which must not disturb the
    /// tracked flag set at create time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement: Option<MeasurementInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeasurementInput {
    pub weight: WeightInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeightInput {
    pub value: f64,
    pub unit: String,
}

impl MeasurementInput {
    /// Weight measurement in kilograms, included only for positive weights.
    #[must_use]
    pub fn from_grams(grams: i64) -> Option<Self> {
        if grams <= 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let kg = grams as f64 / 1000.0;
        Some(Self {
            weight: WeightInput {
                value: kg,
                unit: "KILOGRAMS".to_string(),
            },
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedUploadInput {
    pub resource: String,
    pub filename: String,
    pub mime_type: String,
    pub file_size: String,
    pub http_method: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuantityChange {
    pub inventory_item_id: String,
    pub location_id: String,
    pub quantity: i64,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopInfo {
    pub name: String,
    pub currency_code: String,
    #[serde(default)]
    pub country_code: Option<String>,
    pub myshopify_domain: String,
}

/// A created variant paired with its inventory item, the two ids the fixup
/// and inventory steps key on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedVariant {
    pub id: String,
    pub inventory_item_id: Option<String>,
}

/// The product returned by `productCreate`, including the auto-created
/// default variant(s) in platform order.
#[derive(Debug, Clone)]
pub struct CreatedProduct {
    pub id: String,
    pub handle: String,
    pub variants: Vec<CreatedVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<serde_json::Value>,
    pub message: String,
}

/// One staged-upload target: the signed POST URL, its form parameters, and
/// the durable resource URL the media will live at.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedTarget {
    pub url: String,
    pub resource_url: String,
    #[serde(default)]
    pub parameters: Vec<StagedParameter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StagedParameter {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_create_input_serializes_camel_case() {
        let input = ProductCreateInput {
            title: "Mug".to_string(),
            description_html: "<p>Mug.</p>".to_string(),
            product_type: "Home & Garden".to_string(),
            tags: vec!["mug".to_string()],
            status: "DRAFT".to_string(),
            metafields: vec![MetafieldInput::provenance()],
            product_options: Some(vec![ProductOptionInput {
                name: "Size".to_string(),
                position: 1,
                values: vec![OptionValueInput {
                    name: "S".to_string(),
                }],
            }]),
        };
        let json = serde_json::to_value(&input).expect("serialize");

        assert_eq!(json["descriptionHtml"], "<p>Mug.</p>");
        assert_eq!(json["productType"], "Home & Garden");
        assert_eq!(json["metafields"][0]["namespace"], "snapstock");
        assert_eq!(json["metafields"][0]["type"], "single_line_text_field");
        assert_eq!(json["productOptions"][0]["values"][0]["name"], "S");
    }

    #[test]
    fn variant_bulk_input_omits_absent_fields() {
        let input = VariantBulkInput {
            id: None,
            option_values: Some(vec![VariantOptionValueInput {
                option_name: "Size".to_string(),
                name: "M".to_string(),
            }]),
            price: "9.99".to_string(),
            inventory_item: Some(InventoryItemInput {
                sku: None,
                tracked: Some(true),
                measurement: MeasurementInput::from_grams(500),
            }),
        };
        let json = serde_json::to_value(&input).expect("serialize");

        assert!(json.get("id").is_none());
        assert_eq!(json["optionValues"][0]["optionName"], "Size");
        assert!(json["inventoryItem"].get("sku").is_none());
        let weight = &json["inventoryItem"]["measurement"]["weight"];
        assert!((weight["value"].as_f64().unwrap() - 0.5).abs() < f64::EPSILON);
        assert_eq!(weight["unit"], "KILOGRAMS");
    }

    #[test]
    fn measurement_omitted_for_non_positive_weight() {
        assert!(MeasurementInput::from_grams(0).is_none());
        assert!(MeasurementInput::from_grams(-5).is_none());
    }
}
