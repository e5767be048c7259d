//! Admin GraphQL client.
//!
//! [`AdminApi`] is the explicit seam between the publish protocol and the
//! platform: exactly the queries and mutations the protocol needs, so the
//! protocol can be exercised against a fake. [`GraphqlAdminClient`] is the
//! production implementation over the Admin GraphQL JSON endpoint.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::error::ShopifyError;
use crate::types::{
    CreateMediaInput, CreatedProduct, CreatedVariant, InventoryQuantityChange,
    ProductCreateInput, ShopInfo, StagedTarget, StagedUploadInput, UserError, VariantBulkInput,
};

const PRODUCT_CREATE: &str = "\
mutation productCreate($product: ProductCreateInput!, $media: [CreateMediaInput!]) {
  productCreate(product: $product, media: $media) {
    product {
      id
      handle
      variants(first: 250) {
        edges { node { id inventoryItem { id } } }
      }
    }
    userErrors { field message }
  }
}";

const VARIANTS_BULK_CREATE: &str = "\
mutation productVariantsBulkCreate($productId: ID!, $variants: [ProductVariantsBulkInput!]!) {
  productVariantsBulkCreate(productId: $productId, variants: $variants) {
    productVariants { id inventoryItem { id } }
    userErrors { field message }
  }
}";

const VARIANTS_BULK_UPDATE: &str = "\
mutation productVariantsBulkUpdate($productId: ID!, $variants: [ProductVariantsBulkInput!]!) {
  productVariantsBulkUpdate(productId: $productId, variants: $variants) {
    productVariants { id }
    userErrors { field message }
  }
}";

const STAGED_UPLOADS_CREATE: &str = "\
mutation stagedUploadsCreate($input: [StagedUploadInput!]!) {
  stagedUploadsCreate(input: $input) {
    stagedTargets { url resourceUrl parameters { name value } }
    userErrors { field message }
  }
}";

const FIRST_LOCATION: &str = "\
query { locations(first: 1) { edges { node { id } } } }";

const INVENTORY_SET_QUANTITIES: &str = "\
mutation inventorySetQuantities($input: InventorySetQuantitiesInput!) {
  inventorySetQuantities(input: $input) {
    userErrors { field message }
  }
}";

const SHOP_INFO: &str = "\
query { shop { name currencyCode countryCode myshopifyDomain } }";

/// The Admin API operations the publish protocol depends on.
#[allow(async_fn_in_trait)]
pub trait AdminApi {
    async fn shop_info(&self) -> Result<ShopInfo, ShopifyError>;

    async fn product_create(
        &self,
        product: &ProductCreateInput,
        media: &[CreateMediaInput],
    ) -> Result<CreatedProduct, ShopifyError>;

    async fn variants_bulk_create(
        &self,
        product_id: &str,
        variants: &[VariantBulkInput],
    ) -> Result<Vec<CreatedVariant>, ShopifyError>;

    async fn variants_bulk_update(
        &self,
        product_id: &str,
        variants: &[VariantBulkInput],
    ) -> Result<(), ShopifyError>;

    async fn staged_uploads_create(
        &self,
        input: &StagedUploadInput,
    ) -> Result<StagedTarget, ShopifyError>;

    async fn upload_staged_file(
        &self,
        target: &StagedTarget,
        bytes: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> Result<(), ShopifyError>;

    async fn first_location_id(&self) -> Result<Option<String>, ShopifyError>;

    async fn inventory_set_quantities(
        &self,
        changes: &[InventoryQuantityChange],
    ) -> Result<(), ShopifyError>;
}

/// Production [`AdminApi`] over the Admin GraphQL JSON endpoint.
pub struct GraphqlAdminClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl GraphqlAdminClient {
    /// Creates a client for `shop_domain` (e.g. `"my-store.myshopify.com"`).
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        shop_domain: &str,
        access_token: &str,
        api_version: &str,
        timeout_secs: u64,
    ) -> Result<Self, ShopifyError> {
        let endpoint = format!("https://{shop_domain}/admin/api/{api_version}/graphql.json");
        Self::with_endpoint(&endpoint, access_token, timeout_secs)
    }

    /// Creates a client with an explicit endpoint (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_endpoint(
        endpoint: &str,
        access_token: &str,
        timeout_secs: u64,
    ) -> Result<Self, ShopifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("snapstock/0.1 (product-publish)")
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
            access_token: access_token.to_owned(),
        })
    }

    /// Executes one GraphQL request and returns the `data` object.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::UnexpectedStatus`] on a non-2xx reply.
    /// - [`ShopifyError::Graphql`] when the reply carries top-level errors.
    /// - [`ShopifyError::Http`] / [`ShopifyError::Deserialize`] on
    ///   transport/body failures.
    async fn graphql(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value, ShopifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Shopify-Access-Token", &self.access_token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ShopifyError::UnexpectedStatus {
                status: status.as_u16(),
                context: self.endpoint.clone(),
            });
        }

        let body = response.text().await?;
        let parsed: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| ShopifyError::Deserialize {
                context: self.endpoint.clone(),
                source: e,
            })?;

        if let Some(errors) = parsed.get("errors").and_then(serde_json::Value::as_array) {
            if !errors.is_empty() {
                let messages = errors
                    .iter()
                    .map(|e| {
                        e.get("message")
                            .and_then(serde_json::Value::as_str)
                            .unwrap_or("unknown GraphQL error")
                            .to_string()
                    })
                    .collect();
                return Err(ShopifyError::Graphql { messages });
            }
        }

        Ok(parsed.get("data").cloned().unwrap_or(serde_json::Value::Null))
    }
}

#[derive(Debug, Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantNode {
    id: String,
    inventory_item: Option<IdObject>,
}

impl From<VariantNode> for CreatedVariant {
    fn from(node: VariantNode) -> Self {
        Self {
            id: node.id,
            inventory_item_id: node.inventory_item.map(|i| i.id),
        }
    }
}

/// Extracts a mutation payload's `userErrors` as plain messages.
fn user_error_messages(payload: &serde_json::Value) -> Vec<String> {
    payload
        .get("userErrors")
        .and_then(serde_json::Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| serde_json::from_value::<UserError>(e.clone()).ok())
                .map(|e| e.message)
                .collect()
        })
        .unwrap_or_default()
}

fn deserialize_field<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
    context: &str,
) -> Result<T, ShopifyError> {
    serde_json::from_value(value).map_err(|e| ShopifyError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

impl AdminApi for GraphqlAdminClient {
    async fn shop_info(&self) -> Result<ShopInfo, ShopifyError> {
        let data = self.graphql(SHOP_INFO, json!({})).await?;
        let shop = data.get("shop").cloned().ok_or(ShopifyError::MissingData {
            context: "shop query returned no shop".to_string(),
        })?;
        deserialize_field(shop, "shop info")
    }

    async fn product_create(
        &self,
        product: &ProductCreateInput,
        media: &[CreateMediaInput],
    ) -> Result<CreatedProduct, ShopifyError> {
        let data = self
            .graphql(
                PRODUCT_CREATE,
                json!({ "product": product, "media": media }),
            )
            .await?;
        let payload = &data["productCreate"];

        let messages = user_error_messages(payload);
        if let Some(first) = messages.into_iter().next() {
            // The first user error is the one surfaced to the merchant.
            return Err(ShopifyError::UserErrors {
                messages: vec![first],
            });
        }

        let product_value = payload.get("product").cloned().filter(|v| !v.is_null()).ok_or(
            ShopifyError::MissingData {
                context: "productCreate returned no product".to_string(),
            },
        )?;

        let id = product_value["id"]
            .as_str()
            .ok_or(ShopifyError::MissingData {
                context: "productCreate product has no id".to_string(),
            })?
            .to_string();
        let handle = product_value["handle"].as_str().unwrap_or_default().to_string();

        let variants = product_value["variants"]["edges"]
            .as_array()
            .map(|edges| {
                edges
                    .iter()
                    .filter_map(|edge| {
                        serde_json::from_value::<VariantNode>(edge["node"].clone()).ok()
                    })
                    .map(CreatedVariant::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(CreatedProduct { id, handle, variants })
    }

    async fn variants_bulk_create(
        &self,
        product_id: &str,
        variants: &[VariantBulkInput],
    ) -> Result<Vec<CreatedVariant>, ShopifyError> {
        let data = self
            .graphql(
                VARIANTS_BULK_CREATE,
                json!({ "productId": product_id, "variants": variants }),
            )
            .await?;
        let payload = &data["productVariantsBulkCreate"];

        let messages = user_error_messages(payload);
        if !messages.is_empty() {
            return Err(ShopifyError::UserErrors { messages });
        }

        let created = payload["productVariants"]
            .as_array()
            .map(|nodes| {
                nodes
                    .iter()
                    .filter_map(|node| {
                        serde_json::from_value::<VariantNode>(node.clone()).ok()
                    })
                    .map(CreatedVariant::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(created)
    }

    async fn variants_bulk_update(
        &self,
        product_id: &str,
        variants: &[VariantBulkInput],
    ) -> Result<(), ShopifyError> {
        let data = self
            .graphql(
                VARIANTS_BULK_UPDATE,
                json!({ "productId": product_id, "variants": variants }),
            )
            .await?;
        let messages = user_error_messages(&data["productVariantsBulkUpdate"]);
        if !messages.is_empty() {
            return Err(ShopifyError::UserErrors { messages });
        }
        Ok(())
    }

    async fn staged_uploads_create(
        &self,
        input: &StagedUploadInput,
    ) -> Result<StagedTarget, ShopifyError> {
        let data = self
            .graphql(STAGED_UPLOADS_CREATE, json!({ "input": [input] }))
            .await?;
        let payload = &data["stagedUploadsCreate"];

        let messages = user_error_messages(payload);
        if !messages.is_empty() {
            return Err(ShopifyError::UserErrors { messages });
        }

        let target = payload["stagedTargets"]
            .as_array()
            .and_then(|targets| targets.first().cloned())
            .ok_or(ShopifyError::MissingData {
                context: "stagedUploadsCreate returned no target".to_string(),
            })?;
        deserialize_field(target, "staged upload target")
    }

    async fn upload_staged_file(
        &self,
        target: &StagedTarget,
        bytes: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> Result<(), ShopifyError> {
        let mut form = reqwest::multipart::Form::new();
        for param in &target.parameters {
            form = form.text(param.name.clone(), param.value.clone());
        }
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_owned())
            .mime_str(mime_type)
            .map_err(ShopifyError::Http)?;
        form = form.part("file", part);

        let response = self.client.post(&target.url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ShopifyError::UnexpectedStatus {
                status: status.as_u16(),
                context: target.url.clone(),
            });
        }
        Ok(())
    }

    async fn first_location_id(&self) -> Result<Option<String>, ShopifyError> {
        let data = self.graphql(FIRST_LOCATION, json!({})).await?;
        Ok(data["locations"]["edges"]
            .as_array()
            .and_then(|edges| edges.first())
            .and_then(|edge| edge["node"]["id"].as_str())
            .map(ToString::to_string))
    }

    async fn inventory_set_quantities(
        &self,
        changes: &[InventoryQuantityChange],
    ) -> Result<(), ShopifyError> {
        let input = json!({
            "reason": "correction",
            "name": "available",
            "quantities": changes,
        });
        let data = self
            .graphql(INVENTORY_SET_QUANTITIES, json!({ "input": input }))
            .await?;
        let messages = user_error_messages(&data["inventorySetQuantities"]);
        if !messages.is_empty() {
            return Err(ShopifyError::UserErrors { messages });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_messages_extracts_all() {
        let payload = json!({
            "userErrors": [
                { "field": ["title"], "message": "Title can't be blank" },
                { "field": null, "message": "Too many variants" }
            ]
        });
        let messages = user_error_messages(&payload);
        assert_eq!(messages, vec!["Title can't be blank", "Too many variants"]);
    }

    #[test]
    fn user_error_messages_empty_when_absent() {
        assert!(user_error_messages(&json!({})).is_empty());
        assert!(user_error_messages(&json!({ "userErrors": [] })).is_empty());
    }
}
