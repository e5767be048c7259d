//! Shopify Admin API integration: the GraphQL client, the variant
//! combination expander, and the publish protocol.

pub mod client;
pub mod combinations;
pub mod error;
pub mod media;
pub mod publish;
pub mod types;

pub use client::{AdminApi, GraphqlAdminClient};
pub use combinations::expand;
pub use error::ShopifyError;
pub use publish::{ProductPublisher, PublishedProduct};
pub use types::ShopInfo;
