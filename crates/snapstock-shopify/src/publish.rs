//! The publish protocol: one scanned product in, one remote product with one
//! variant per combination out.
//!
//! Steps are strictly sequential — each platform call's result feeds the
//! next payload. Product creation and variant bulk-creation abort on platform
//! user errors; the default-variant fixup and inventory leveling are
//! best-effort (the product already exists, partial success beats rollback —
//! no compensation is attempted anywhere).
//!
//! No idempotency across calls: publishing the same product twice creates
//! two remote products. The caller's DRAFT → PUBLISHED flip is the only
//! re-submission guard.

use snapstock_core::{ScannedProduct, VariantOption, VariantOptionSet};

use crate::client::AdminApi;
use crate::combinations::expand;
use crate::error::ShopifyError;
use crate::media::{parse_data_url, staged_filename};
use crate::types::{
    CreateMediaInput, CreatedVariant, InventoryItemInput, InventoryQuantityChange,
    MeasurementInput, MetafieldInput, OptionValueInput, ProductCreateInput, ProductOptionInput,
    StagedUploadInput, VariantBulkInput, VariantOptionValueInput,
};

/// Successful publish result: the remote product id and a human-facing admin
/// review URL.
#[derive(Debug, Clone)]
pub struct PublishedProduct {
    pub product_id: String,
    pub admin_url: String,
}

enum InventoryPlan {
    /// One quantity per variant, aligned with combination order.
    PerVariant(Vec<i64>),
    /// The same quantity applied to every variant.
    Flat(i64),
}

/// Drives the product/variant/inventory mutations for one publish.
pub struct ProductPublisher<A: AdminApi> {
    api: A,
    shop_domain: Option<String>,
}

impl<A: AdminApi> ProductPublisher<A> {
    /// `shop_domain` (the `*.myshopify.com` domain) may be supplied when the
    /// caller already knows it; otherwise step 1 fetches it.
    pub fn new(api: A, shop_domain: Option<String>) -> Self {
        Self { api, shop_domain }
    }

    /// Publishes `product` as a draft remote product.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::UserErrors`] — the platform rejected the product or
    ///   variant create (surfaced verbatim).
    /// - Any transport-level [`ShopifyError`] from the fatal steps.
    ///
    /// Image upload, default-variant fixup, and inventory failures are
    /// logged and swallowed.
    pub async fn publish(&self, product: &ScannedProduct) -> Result<PublishedProduct, ShopifyError> {
        // Step 1: resolve the shop context for the admin URL.
        let shop_domain = match &self.shop_domain {
            Some(domain) => domain.clone(),
            None => self.api.shop_info().await?.myshopify_domain,
        };

        let option_set: Option<&VariantOptionSet> =
            product.variants.as_ref().filter(|set| set.has_values());

        // Step 2: stage inline images; pass external URLs through.
        let media = self.stage_media(&product.image_urls).await;

        // Step 3: create the product (declaring options only when present).
        let product_options = option_set.map(|set| {
            set.options
                .iter()
                .enumerate()
                .map(|(index, option)| ProductOptionInput {
                    name: option.name.clone(),
                    position: i32::try_from(index + 1).unwrap_or(i32::MAX),
                    values: option
                        .values
                        .iter()
                        .map(|value| OptionValueInput { name: value.clone() })
                        .collect(),
                })
                .collect::<Vec<_>>()
        });

        let input = ProductCreateInput {
            title: product.title.clone(),
            description_html: product.description_html.clone(),
            product_type: product.product_type.clone(),
            tags: product.tags.clone(),
            status: "DRAFT".to_string(),
            metafields: vec![MetafieldInput::provenance()],
            product_options,
        };

        let created = self.api.product_create(&input, &media).await?;
        tracing::info!(product_id = %created.id, handle = %created.handle, "product created");

        let mut created_variants: Vec<CreatedVariant> = created.variants.clone();

        if let Some(set) = option_set {
            self.sync_variants(product, set, &created.id, &mut created_variants)
                .await?;
        } else {
            self.update_single_variant(product, &created.id, &created_variants)
                .await;
        }

        Ok(PublishedProduct {
            admin_url: admin_url(&shop_domain, &created.id),
            product_id: created.id,
        })
    }

    /// Steps 4–6 for the variant path: bulk-create combinations 1.., fix up
    /// the auto-created default variant, level inventory.
    async fn sync_variants(
        &self,
        product: &ScannedProduct,
        set: &VariantOptionSet,
        product_id: &str,
        created_variants: &mut Vec<CreatedVariant>,
    ) -> Result<(), ShopifyError> {
        let combinations = expand(&set.options);

        // Step 4: combination 0 already exists as the platform's auto-created
        // default variant; create only the rest.
        let to_create = if combinations.len() > 1 {
            &combinations[1..]
        } else {
            &[][..]
        };
        if !to_create.is_empty() {
            let inputs: Vec<VariantBulkInput> = to_create
                .iter()
                .map(|combo| variant_create_input(product, &set.options, combo))
                .collect();

            let bulk_created = self
                .api
                .variants_bulk_create(product_id, &inputs)
                .await
                .map_err(|err| match err {
                    ShopifyError::UserErrors { messages } => ShopifyError::UserErrors {
                        messages: vec![format!(
                            "Could not create all variants: {}",
                            messages.join("; ")
                        )],
                    },
                    other => other,
                })?;
            created_variants.extend(bulk_created);
        }

        // Step 5: the platform ignores price/SKU for the variant it
        // auto-creates, so set them retroactively. Non-fatal.
        if let Some(default_variant) = created_variants.first() {
            if !product.price.trim().is_empty() || product.sku.is_some() {
                let default_sku = match (&product.sku, combinations.first()) {
                    (Some(sku), Some(combo)) => Some(format!("{sku}-{}", combo.join("-"))),
                    _ => None,
                };
                let update = VariantBulkInput {
                    id: Some(default_variant.id.clone()),
                    option_values: None,
                    price: product.price_or_default(),
                    inventory_item: default_sku.map(|sku| InventoryItemInput {
                        sku: Some(sku),
                        tracked: None,
                        measurement: None,
                    }),
                };
                if let Err(err) = self.api.variants_bulk_update(product_id, &[update]).await {
                    tracing::warn!(error = %err, product_id, "failed to set default variant price/SKU");
                }
            }
        }

        // Step 6: inventory, when tracking is on or any option declares
        // per-value quantities. Non-fatal.
        let declares_quantities = set
            .options
            .iter()
            .any(|o| o.quantities.as_ref().is_some_and(|q| !q.is_empty()));
        if created_variants.is_empty() || !(product.track_inventory || declares_quantities) {
            return Ok(());
        }

        let item_ids: Vec<String> = created_variants
            .iter()
            .filter_map(|v| v.inventory_item_id.clone())
            .collect();

        let plan = match set.per_value_quantities() {
            Some(quantities) if quantities.len() == item_ids.len() => {
                Some(InventoryPlan::PerVariant(quantities.to_vec()))
            }
            _ => match (product.track_inventory, product.inventory_quantity) {
                (true, Some(quantity)) => Some(InventoryPlan::Flat(quantity)),
                _ => None,
            },
        };

        if let Some(plan) = plan {
            self.set_inventory_levels(&item_ids, &plan).await;
        }
        Ok(())
    }

    /// The no-variant path: one bulk-update on the single auto-created
    /// variant (price, SKU, tracked flag, weight), then flat inventory.
    /// Both calls are best-effort — the product already exists.
    async fn update_single_variant(
        &self,
        product: &ScannedProduct,
        product_id: &str,
        created_variants: &[CreatedVariant],
    ) {
        let Some(default_variant) = created_variants.first() else {
            tracing::warn!(product_id, "productCreate returned no default variant");
            return;
        };

        let update = VariantBulkInput {
            id: Some(default_variant.id.clone()),
            option_values: None,
            price: product.price_or_default(),
            inventory_item: Some(InventoryItemInput {
                sku: product.sku.clone(),
                tracked: Some(product.track_inventory),
                measurement: MeasurementInput::from_grams(product.estimated_weight),
            }),
        };
        if let Err(err) = self.api.variants_bulk_update(product_id, &[update]).await {
            tracing::warn!(error = %err, product_id, "failed to update default variant");
        }

        if product.track_inventory {
            if let (Some(quantity), Some(item_id)) = (
                product.inventory_quantity,
                default_variant.inventory_item_id.clone(),
            ) {
                self.set_inventory_levels(&[item_id], &InventoryPlan::Flat(quantity))
                    .await;
            }
        }
    }

    /// Uploads every inline `data:` image through the staged-upload flow and
    /// returns the media list for `productCreate`. A failed upload drops that
    /// single image — never the whole publish.
    async fn stage_media(&self, image_urls: &[String]) -> Vec<CreateMediaInput> {
        let mut media = Vec::new();
        for url in image_urls {
            if url.starts_with("data:") {
                match self.upload_inline_image(url).await {
                    Ok(resource_url) => media.push(CreateMediaInput {
                        original_source: resource_url,
                        media_content_type: "IMAGE".to_string(),
                    }),
                    Err(err) => {
                        tracing::warn!(error = %err, "inline image upload failed; dropping image");
                    }
                }
            } else {
                media.push(CreateMediaInput {
                    original_source: url.clone(),
                    media_content_type: "IMAGE".to_string(),
                });
            }
        }
        media
    }

    async fn upload_inline_image(&self, data_url: &str) -> Result<String, ShopifyError> {
        let image = parse_data_url(data_url)?;
        let filename = staged_filename(&image.bytes, &image.extension);

        let input = StagedUploadInput {
            resource: "IMAGE".to_string(),
            filename: filename.clone(),
            mime_type: image.mime_type.clone(),
            file_size: image.bytes.len().to_string(),
            http_method: "POST".to_string(),
        };
        let target = self.api.staged_uploads_create(&input).await?;
        self.api
            .upload_staged_file(&target, image.bytes, &filename, &image.mime_type)
            .await?;
        Ok(target.resource_url)
    }

    /// Resolves the first available location and applies the quantity plan.
    /// Entirely best-effort: an unstocked product is still a usable product.
    async fn set_inventory_levels(&self, item_ids: &[String], plan: &InventoryPlan) {
        let location_id = match self.api.first_location_id().await {
            Ok(Some(id)) => id,
            Ok(None) => {
                tracing::warn!("no inventory location available; skipping inventory set");
                return;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to resolve inventory location");
                return;
            }
        };

        let changes: Vec<InventoryQuantityChange> = item_ids
            .iter()
            .enumerate()
            .map(|(index, item_id)| InventoryQuantityChange {
                inventory_item_id: item_id.clone(),
                location_id: location_id.clone(),
                quantity: match plan {
                    InventoryPlan::PerVariant(quantities) => {
                        quantities.get(index).copied().unwrap_or(0)
                    }
                    InventoryPlan::Flat(quantity) => *quantity,
                },
            })
            .collect();

        if let Err(err) = self.api.inventory_set_quantities(&changes).await {
            tracing::warn!(error = %err, "failed to set inventory quantities");
        }
    }
}

fn variant_create_input(
    product: &ScannedProduct,
    options: &[VariantOption],
    combo: &[String],
) -> VariantBulkInput {
    let option_values = combo
        .iter()
        .zip(options)
        .map(|(value, option)| VariantOptionValueInput {
            option_name: option.name.clone(),
            name: value.clone(),
        })
        .collect();

    let sku = product
        .sku
        .as_ref()
        .map(|base| format!("{base}-{}", combo.join("-")));

    VariantBulkInput {
        id: None,
        option_values: Some(option_values),
        price: product.price_or_default(),
        inventory_item: Some(InventoryItemInput {
            sku,
            tracked: Some(product.track_inventory),
            measurement: MeasurementInput::from_grams(product.estimated_weight),
        }),
    }
}

/// Builds the admin review URL from the myshopify domain and the product GID
/// (`gid://shopify/Product/123` → `.../products/123`).
fn admin_url(shop_domain: &str, product_gid: &str) -> String {
    let store = shop_domain.trim_end_matches(".myshopify.com");
    let numeric_id = product_gid.rsplit('/').next().unwrap_or(product_gid);
    format!("https://admin.shopify.com/store/{store}/products/{numeric_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapstock_core::ProductStatus;
    use std::sync::Mutex;

    use crate::types::{CreatedProduct, ShopInfo, StagedTarget};

    /// Recording fake of the platform: every call is captured for assertion,
    /// responses are canned.
    #[derive(Default)]
    struct FakeAdmin {
        calls: Mutex<Vec<String>>,
        created_inputs: Mutex<Vec<serde_json::Value>>,
        bulk_create_inputs: Mutex<Vec<serde_json::Value>>,
        bulk_update_inputs: Mutex<Vec<serde_json::Value>>,
        inventory_changes: Mutex<Vec<Vec<InventoryQuantityChange>>>,
        fail_bulk_create: bool,
        no_location: bool,
    }

    impl FakeAdmin {
        fn record(&self, name: &str) {
            self.calls.lock().expect("lock").push(name.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock").clone()
        }
    }

    impl AdminApi for FakeAdmin {
        async fn shop_info(&self) -> Result<ShopInfo, ShopifyError> {
            self.record("shop_info");
            Ok(ShopInfo {
                name: "Test Shop".to_string(),
                currency_code: "USD".to_string(),
                country_code: Some("US".to_string()),
                myshopify_domain: "test-shop.myshopify.com".to_string(),
            })
        }

        async fn product_create(
            &self,
            product: &ProductCreateInput,
            media: &[CreateMediaInput],
        ) -> Result<CreatedProduct, ShopifyError> {
            self.record("product_create");
            self.created_inputs.lock().expect("lock").push(
                serde_json::json!({ "product": product, "media": media }),
            );
            Ok(CreatedProduct {
                id: "gid://shopify/Product/101".to_string(),
                handle: "test-product".to_string(),
                variants: vec![CreatedVariant {
                    id: "gid://shopify/ProductVariant/1".to_string(),
                    inventory_item_id: Some("gid://shopify/InventoryItem/1".to_string()),
                }],
            })
        }

        async fn variants_bulk_create(
            &self,
            _product_id: &str,
            variants: &[VariantBulkInput],
        ) -> Result<Vec<CreatedVariant>, ShopifyError> {
            self.record("variants_bulk_create");
            if self.fail_bulk_create {
                return Err(ShopifyError::UserErrors {
                    messages: vec!["Option value taken".to_string()],
                });
            }
            self.bulk_create_inputs
                .lock()
                .expect("lock")
                .push(serde_json::json!(variants));
            Ok((0..variants.len())
                .map(|i| CreatedVariant {
                    id: format!("gid://shopify/ProductVariant/{}", i + 2),
                    inventory_item_id: Some(format!("gid://shopify/InventoryItem/{}", i + 2)),
                })
                .collect())
        }

        async fn variants_bulk_update(
            &self,
            _product_id: &str,
            variants: &[VariantBulkInput],
        ) -> Result<(), ShopifyError> {
            self.record("variants_bulk_update");
            self.bulk_update_inputs
                .lock()
                .expect("lock")
                .push(serde_json::json!(variants));
            Ok(())
        }

        async fn staged_uploads_create(
            &self,
            _input: &StagedUploadInput,
        ) -> Result<StagedTarget, ShopifyError> {
            self.record("staged_uploads_create");
            Ok(StagedTarget {
                url: "https://upload.example.com/stage".to_string(),
                resource_url: "https://cdn.example.com/staged/capture.jpg".to_string(),
                parameters: vec![],
            })
        }

        async fn upload_staged_file(
            &self,
            _target: &StagedTarget,
            _bytes: Vec<u8>,
            _filename: &str,
            _mime_type: &str,
        ) -> Result<(), ShopifyError> {
            self.record("upload_staged_file");
            Ok(())
        }

        async fn first_location_id(&self) -> Result<Option<String>, ShopifyError> {
            self.record("first_location_id");
            if self.no_location {
                return Ok(None);
            }
            Ok(Some("gid://shopify/Location/1".to_string()))
        }

        async fn inventory_set_quantities(
            &self,
            changes: &[InventoryQuantityChange],
        ) -> Result<(), ShopifyError> {
            self.record("inventory_set_quantities");
            self.inventory_changes
                .lock()
                .expect("lock")
                .push(changes.to_vec());
            Ok(())
        }
    }

    fn base_product() -> ScannedProduct {
        ScannedProduct {
            title: "Blue Toaster".to_string(),
            description_html: "<p>Toasts.</p><ul><li>Two slots</li></ul>".to_string(),
            product_type: "Electronics".to_string(),
            tags: vec!["toaster".to_string()],
            estimated_weight: 300,
            price: "29.99".to_string(),
            status: ProductStatus::Draft,
            sku: Some("BLUE-TOAST".to_string()),
            inventory_quantity: Some(10),
            track_inventory: true,
            image_urls: vec!["https://cdn.example.com/toaster.jpg".to_string()],
            variants: None,
        }
    }

    fn size_option(values: &[&str], quantities: Option<Vec<i64>>) -> VariantOptionSet {
        VariantOptionSet {
            options: vec![VariantOption {
                name: "Size".to_string(),
                values: values.iter().map(ToString::to_string).collect(),
                quantities,
            }],
        }
    }

    #[tokio::test]
    async fn single_product_path_creates_then_updates_then_stocks() {
        let fake = FakeAdmin::default();
        let publisher = ProductPublisher::new(fake, Some("test-shop.myshopify.com".to_string()));

        let result = publisher.publish(&base_product()).await.expect("publish");

        assert_eq!(result.product_id, "gid://shopify/Product/101");
        assert_eq!(
            result.admin_url,
            "https://admin.shopify.com/store/test-shop/products/101"
        );
        assert_eq!(
            publisher.api.calls(),
            vec![
                "product_create",
                "variants_bulk_update",
                "first_location_id",
                "inventory_set_quantities",
            ]
        );

        let updates = publisher.api.bulk_update_inputs.lock().expect("lock").clone();
        assert_eq!(updates[0][0]["price"], "29.99");
        assert_eq!(updates[0][0]["inventoryItem"]["sku"], "BLUE-TOAST");
        assert_eq!(updates[0][0]["inventoryItem"]["tracked"], true);
        let weight = &updates[0][0]["inventoryItem"]["measurement"]["weight"];
        assert!((weight["value"].as_f64().unwrap() - 0.3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn variant_path_skips_combination_zero() {
        let fake = FakeAdmin::default();
        let publisher = ProductPublisher::new(fake, Some("test-shop.myshopify.com".to_string()));

        let mut product = base_product();
        product.variants = Some(size_option(&["small", "medium", "large"], Some(vec![4, 5, 7])));

        publisher.publish(&product).await.expect("publish");

        // 3 combinations − 1 default = 2 explicit creates.
        let creates = publisher.api.bulk_create_inputs.lock().expect("lock").clone();
        assert_eq!(creates.len(), 1);
        let variants = creates[0].as_array().expect("array");
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0]["optionValues"][0]["name"], "medium");
        assert_eq!(variants[1]["optionValues"][0]["name"], "large");
        assert_eq!(variants[0]["inventoryItem"]["sku"], "BLUE-TOAST-medium");

        // The fixup references combination 0's joined values.
        let updates = publisher.api.bulk_update_inputs.lock().expect("lock").clone();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0][0]["id"], "gid://shopify/ProductVariant/1");
        assert_eq!(updates[0][0]["price"], "29.99");
        assert_eq!(updates[0][0]["inventoryItem"]["sku"], "BLUE-TOAST-small");
        assert!(updates[0][0]["inventoryItem"].get("tracked").is_none());
    }

    #[tokio::test]
    async fn per_value_quantities_align_with_combination_order() {
        let fake = FakeAdmin::default();
        let publisher = ProductPublisher::new(fake, Some("test-shop.myshopify.com".to_string()));

        let mut product = base_product();
        product.variants = Some(size_option(&["small", "medium", "large"], Some(vec![4, 5, 7])));

        publisher.publish(&product).await.expect("publish");

        let changes = publisher.api.inventory_changes.lock().expect("lock").clone();
        assert_eq!(changes.len(), 1);
        let quantities: Vec<i64> = changes[0].iter().map(|c| c.quantity).collect();
        assert_eq!(quantities, vec![4, 5, 7]);
        assert_eq!(changes[0][0].inventory_item_id, "gid://shopify/InventoryItem/1");
        assert_eq!(changes[0][1].inventory_item_id, "gid://shopify/InventoryItem/2");
    }

    #[tokio::test]
    async fn three_options_create_n_minus_one_variants() {
        let fake = FakeAdmin::default();
        let publisher = ProductPublisher::new(fake, Some("test-shop.myshopify.com".to_string()));

        let mut product = base_product();
        product.variants = Some(VariantOptionSet {
            options: vec![
                VariantOption {
                    name: "Size".to_string(),
                    values: vec!["S".to_string(), "M".to_string()],
                    quantities: None,
                },
                VariantOption {
                    name: "Color".to_string(),
                    values: vec!["Red".to_string(), "Blue".to_string()],
                    quantities: None,
                },
                VariantOption {
                    name: "Material".to_string(),
                    values: vec!["Cotton".to_string()],
                    quantities: None,
                },
            ],
        });

        publisher.publish(&product).await.expect("publish");

        let creates = publisher.api.bulk_create_inputs.lock().expect("lock").clone();
        let variants = creates[0].as_array().expect("array");
        // 2 × 2 × 1 = 4 combinations, minus the default.
        assert_eq!(variants.len(), 3);
        // Multi-option quantity semantics are undefined: flat quantity applies.
        let changes = publisher.api.inventory_changes.lock().expect("lock").clone();
        let quantities: Vec<i64> = changes[0].iter().map(|c| c.quantity).collect();
        assert_eq!(quantities, vec![10, 10, 10, 10]);
    }

    #[tokio::test]
    async fn bulk_create_user_errors_abort_the_publish() {
        let fake = FakeAdmin {
            fail_bulk_create: true,
            ..FakeAdmin::default()
        };
        let publisher = ProductPublisher::new(fake, Some("test-shop.myshopify.com".to_string()));

        let mut product = base_product();
        product.variants = Some(size_option(&["S", "M"], None));

        let err = publisher.publish(&product).await.expect_err("must abort");
        let message = err.to_string();
        assert!(message.contains("Could not create all variants"));
        assert!(message.contains("Option value taken"));

        // Neither fixup nor inventory ran after the abort.
        let calls = publisher.api.calls();
        assert!(!calls.contains(&"variants_bulk_update".to_string()));
        assert!(!calls.contains(&"inventory_set_quantities".to_string()));
    }

    #[tokio::test]
    async fn inline_images_are_staged_and_external_urls_pass_through() {
        let fake = FakeAdmin::default();
        let publisher = ProductPublisher::new(fake, Some("test-shop.myshopify.com".to_string()));

        let mut product = base_product();
        product.image_urls = vec![
            format!("data:image/jpeg;base64,{}", base64_abc()),
            "https://cdn.example.com/external.jpg".to_string(),
        ];

        publisher.publish(&product).await.expect("publish");

        let calls = publisher.api.calls();
        assert_eq!(
            calls.iter().filter(|c| *c == "staged_uploads_create").count(),
            1
        );
        let created = publisher.api.created_inputs.lock().expect("lock").clone();
        let media = created[0]["media"].as_array().expect("media");
        assert_eq!(media.len(), 2);
        assert_eq!(
            media[0]["originalSource"],
            "https://cdn.example.com/staged/capture.jpg"
        );
        assert_eq!(media[1]["originalSource"], "https://cdn.example.com/external.jpg");
    }

    #[tokio::test]
    async fn unparseable_inline_image_is_dropped_not_fatal() {
        let fake = FakeAdmin::default();
        let publisher = ProductPublisher::new(fake, Some("test-shop.myshopify.com".to_string()));

        let mut product = base_product();
        product.image_urls = vec!["data:text/plain;base64,QUJD".to_string()];

        publisher.publish(&product).await.expect("publish succeeds without the image");

        let created = publisher.api.created_inputs.lock().expect("lock").clone();
        assert!(created[0]["media"].as_array().expect("media").is_empty());
    }

    #[tokio::test]
    async fn missing_location_skips_inventory_quietly() {
        let fake = FakeAdmin {
            no_location: true,
            ..FakeAdmin::default()
        };
        let publisher = ProductPublisher::new(fake, Some("test-shop.myshopify.com".to_string()));

        publisher.publish(&base_product()).await.expect("publish");

        let calls = publisher.api.calls();
        assert!(calls.contains(&"first_location_id".to_string()));
        assert!(!calls.contains(&"inventory_set_quantities".to_string()));
    }

    #[tokio::test]
    async fn shop_info_fetched_only_when_domain_unknown() {
        let fake = FakeAdmin::default();
        let publisher = ProductPublisher::new(fake, None);

        let result = publisher.publish(&base_product()).await.expect("publish");
        assert!(publisher.api.calls().contains(&"shop_info".to_string()));
        assert!(result.admin_url.contains("/store/test-shop/"));
    }

    #[tokio::test]
    async fn untracked_product_without_quantities_sets_no_inventory() {
        let fake = FakeAdmin::default();
        let publisher = ProductPublisher::new(fake, Some("test-shop.myshopify.com".to_string()));

        let mut product = base_product();
        product.track_inventory = false;
        product.variants = Some(size_option(&["S", "M"], None));

        publisher.publish(&product).await.expect("publish");

        let calls = publisher.api.calls();
        assert!(!calls.contains(&"first_location_id".to_string()));
    }

    fn base64_abc() -> String {
        // Long enough to look like a real payload.
        "QUJD".repeat(40)
    }

    #[test]
    fn admin_url_strips_gid_and_domain_suffix() {
        let url = admin_url("my-store.myshopify.com", "gid://shopify/Product/987");
        assert_eq!(url, "https://admin.shopify.com/store/my-store/products/987");
    }
}
