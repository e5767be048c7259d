//! Image-to-product analysis with the fallback-on-failure policy.
//!
//! The guarantee this module provides: a scan never simply fails from the
//! user's point of view. Any post-request failure except a credentials
//! problem degrades to a synthesized minimal product the merchant can edit,
//! instead of surfacing an opaque AI error.

use std::time::Duration;

use rust_decimal::Decimal;

use snapstock_core::{ProductStatus, ScannedProduct};

use crate::client::{GenPart, GenerativeClient};
use crate::error::AiError;
use crate::ocr::VisionOcrClient;
use crate::prompts;

/// Hard deadline on the main extraction call.
pub const ANALYZE_TIMEOUT: Duration = Duration::from_secs(22);

/// Hard deadline on the brief describe-image fallback call.
pub const DESCRIBE_TIMEOUT: Duration = Duration::from_secs(8);

/// Weight substituted when the model gives none (grams).
const FALLBACK_WEIGHT_GRAMS: i64 = 200;

/// Context for one analysis request.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// ISO 4217 code used for price estimation, e.g. `"USD"`.
    pub currency: String,
    /// Country name or code for regional price context.
    pub country: String,
    /// Skip the OCR pass. The mobile path sets this — OCR can add several
    /// seconds and the proxy budget there is tight.
    pub skip_ocr: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            country: "United States".to_string(),
            skip_ocr: false,
        }
    }
}

/// The scan normalizer: one generative client plus an optional OCR client.
pub struct ScanAnalyzer {
    gen: GenerativeClient,
    ocr: Option<VisionOcrClient>,
}

impl ScanAnalyzer {
    #[must_use]
    pub fn new(gen: GenerativeClient, ocr: Option<VisionOcrClient>) -> Self {
        Self { gen, ocr }
    }

    pub(crate) fn generative(&self) -> &GenerativeClient {
        &self.gen
    }

    /// Analyzes an image (raw base64 or full `data:` URL) into a
    /// [`ScannedProduct`].
    ///
    /// # Errors
    ///
    /// Only two failures surface as `Err`:
    /// - [`AiError::InvalidImage`] — payload too small to be a real photo
    ///   (rejected locally, no request made).
    /// - [`AiError::Auth`] — broken credentials; no fallback can compensate.
    ///
    /// Every other failure (timeout, malformed reply, safety block, quota,
    /// 5xx) returns `Ok` with the fallback product.
    pub async fn analyze_image(
        &self,
        image: &str,
        mime_type: &str,
        options: &ScanOptions,
    ) -> Result<ScannedProduct, AiError> {
        let raw_b64 = strip_data_url(image);
        if raw_b64.len() < 100 {
            return Err(AiError::InvalidImage);
        }
        let mime = if mime_type.is_empty() {
            "image/jpeg"
        } else {
            mime_type
        };

        let mut ocr_text = String::new();
        if !options.skip_ocr {
            if let Some(ocr) = &self.ocr {
                ocr_text = ocr.detect_text(raw_b64).await.unwrap_or_default();
                tracing::debug!(ocr_len = ocr_text.len(), "OCR pass finished");
            }
        }

        let prompt = prompts::product_extraction(&ocr_text, &options.currency, &options.country);
        let parts = vec![
            GenPart::Text(prompt),
            GenPart::InlineImage {
                mime_type: mime.to_string(),
                data_b64: raw_b64.to_string(),
            },
        ];

        match self.extract_product(parts).await {
            Ok(product) => Ok(repair_scan_fields(product)),
            Err(err) if err.is_recoverable() => {
                tracing::warn!(error = %err, "AI analysis failed; returning fallback product");
                let phrase = self.describe_image_briefly(raw_b64, mime).await;
                Ok(repair_scan_fields(fallback_product(phrase.as_deref())))
            }
            Err(err) => Err(err),
        }
    }

    async fn extract_product(&self, parts: Vec<GenPart>) -> Result<ScannedProduct, AiError> {
        let text = self.gen.generate(parts, ANALYZE_TIMEOUT).await?;
        let stripped = strip_code_fences(&text);
        serde_json::from_str(stripped).map_err(|e| AiError::Deserialize {
            context: "product extraction reply".to_string(),
            source: e,
        })
    }

    /// Asks for one short phrase describing the image, for the fallback
    /// product's title. Best-effort: any failure or an overlong reply yields
    /// `None`.
    async fn describe_image_briefly(&self, raw_b64: &str, mime: &str) -> Option<String> {
        let parts = vec![
            GenPart::Text(prompts::brief_description()),
            GenPart::InlineImage {
                mime_type: mime.to_string(),
                data_b64: raw_b64.to_string(),
            },
        ];
        match self.gen.generate(parts, DESCRIBE_TIMEOUT).await {
            Ok(text) => {
                let phrase = text.trim().to_string();
                (!phrase.is_empty() && phrase.len() <= 120).then_some(phrase)
            }
            Err(e) => {
                tracing::debug!(error = %e, "describe-image fallback failed");
                None
            }
        }
    }
}

/// The synthesized minimal product used when analysis fails: always editable,
/// never empty.
#[must_use]
pub fn fallback_product(descriptive_title: Option<&str>) -> ScannedProduct {
    let phrase = descriptive_title
        .map(str::trim)
        .filter(|t| !t.is_empty() && t.len() <= 120);
    let title = phrase.unwrap_or("Item from photo").to_string();
    let description_html = match phrase {
        Some(p) => format!(
            "<p>{p}. Edit title and description as needed.</p>\
             <ul><li>Details from your image</li><li>Edit in dashboard before publishing</li></ul>"
        ),
        None => "<p>Item from your photo. Edit title and description as needed.</p>\
                 <ul><li>Details from your image</li><li>Edit in dashboard before publishing</li></ul>"
            .to_string(),
    };

    ScannedProduct {
        title,
        description_html,
        product_type: "General".to_string(),
        tags: vec!["scanned".to_string(), "custom".to_string()],
        estimated_weight: FALLBACK_WEIGHT_GRAMS,
        price: "0".to_string(),
        status: ProductStatus::Draft,
        sku: None,
        inventory_quantity: None,
        track_inventory: false,
        image_urls: vec![],
        variants: None,
    }
}

/// Field repair applied to every analysis result before it leaves this crate:
/// the dashboard form never sees an empty title, description, tag list,
/// weight, or a non-numeric price.
#[must_use]
pub fn repair_scan_fields(mut product: ScannedProduct) -> ScannedProduct {
    if product.title.trim().is_empty() {
        product.title = "Product".to_string();
    } else {
        product.title = product.title.trim().to_string();
    }

    if product.description_html.trim().len() <= 20 {
        product.description_html = format!(
            "<p>{}</p><ul><li>Details from packaging. Edit as needed.</li></ul>",
            product.title
        );
    }

    if product.product_type.trim().is_empty() {
        product.product_type = "General".to_string();
    }

    if product.tags.is_empty() {
        let mut tags = vec![product.product_type.to_lowercase()];
        tags.extend(
            product
                .title
                .split_whitespace()
                .filter(|w| w.len() > 2)
                .take(4)
                .map(str::to_lowercase),
        );
        product.tags = tags;
    }

    if product.estimated_weight <= 0 {
        product.estimated_weight = FALLBACK_WEIGHT_GRAMS;
    }

    let price = product.price.trim();
    product.price = match price.parse::<Decimal>() {
        Ok(_) => price.to_string(),
        Err(_) => String::new(),
    };

    product
}

/// Removes the `data:<mime>;base64,` prefix, if present.
#[must_use]
pub fn strip_data_url(image: &str) -> &str {
    match image.find(',') {
        Some(idx) if image.starts_with("data:") => &image[idx + 1..],
        _ => image,
    }
}

/// Strips markdown code-fence wrapping the models like to add around JSON.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_data_url_removes_prefix() {
        assert_eq!(strip_data_url("data:image/png;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_url("QUJD"), "QUJD");
    }

    #[test]
    fn strip_code_fences_handles_json_fence() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn fallback_product_uses_phrase_when_short_enough() {
        let product = fallback_product(Some("Blue toaster on grey surface"));
        assert_eq!(product.title, "Blue toaster on grey surface");
        assert!(product.description_html.contains("<li>"));
        assert_eq!(product.tags, vec!["scanned", "custom"]);
        assert!(product.estimated_weight > 0);
        assert_eq!(product.price, "0");
    }

    #[test]
    fn fallback_product_rejects_overlong_phrase() {
        let long = "x".repeat(200);
        let product = fallback_product(Some(&long));
        assert_eq!(product.title, "Item from photo");
    }

    #[test]
    fn repair_fills_empty_fields() {
        let product = ScannedProduct {
            title: "  ".to_string(),
            description_html: "<p>x</p>".to_string(),
            product_type: String::new(),
            tags: vec![],
            estimated_weight: 0,
            price: "abc".to_string(),
            status: ProductStatus::Draft,
            sku: None,
            inventory_quantity: None,
            track_inventory: false,
            image_urls: vec![],
            variants: None,
        };
        let repaired = repair_scan_fields(product);

        assert_eq!(repaired.title, "Product");
        assert!(repaired.description_html.contains("<li>"));
        assert_eq!(repaired.product_type, "General");
        assert!(!repaired.tags.is_empty());
        assert_eq!(repaired.estimated_weight, 200);
        assert_eq!(repaired.price, "");
    }

    #[test]
    fn repair_builds_tags_from_type_and_title() {
        let product = ScannedProduct {
            title: "Philips Series 1000 Shaver".to_string(),
            description_html: "<p>A long enough description here.</p>".to_string(),
            product_type: "Electronics".to_string(),
            tags: vec![],
            estimated_weight: 150,
            price: "24.99".to_string(),
            status: ProductStatus::Draft,
            sku: None,
            inventory_quantity: None,
            track_inventory: false,
            image_urls: vec![],
            variants: None,
        };
        let repaired = repair_scan_fields(product);

        assert_eq!(repaired.tags[0], "electronics");
        assert!(repaired.tags.contains(&"philips".to_string()));
        assert!(repaired.tags.len() <= 5);
    }

    #[test]
    fn repair_keeps_valid_price() {
        let mut product = fallback_product(None);
        product.price = " 12.99 ".to_string();
        assert_eq!(repair_scan_fields(product).price, "12.99");
    }
}
