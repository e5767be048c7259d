//! Operational CLI: create scan sessions, parse variant text offline, and
//! publish stored drafts without going through the dashboard.

use clap::{Parser, Subcommand};

use snapstock_ai::{parse_deterministic, GenerativeClient, ScanAnalyzer};
use snapstock_shopify::{GraphqlAdminClient, ProductPublisher};

#[derive(Debug, Parser)]
#[command(name = "snapstock-cli")]
#[command(about = "snapstock command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a fresh scan session for a shop and print its id.
    Session {
        #[arg(long)]
        shop: String,
    },
    /// Parse variant text ("small 4, medium 5, large 7") and print the
    /// resulting option set. Uses the AI fallback only when the
    /// deterministic parse finds nothing and an API key is configured.
    ParseVariants { transcript: String },
    /// Publish a stored draft by its product id.
    Publish {
        #[arg(long)]
        product_id: i64,
    },
    /// Remove every stored trace of a shop (sessions, products, settings).
    /// This is the shop-redact operation the compliance webhook drives in
    /// production.
    Purge {
        #[arg(long)]
        shop: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Session { shop } => create_session(&shop).await,
        Commands::ParseVariants { transcript } => parse_variants(&transcript).await,
        Commands::Publish { product_id } => publish(product_id).await,
        Commands::Purge { shop } => purge(&shop).await,
    }
}

async fn purge(shop: &str) -> anyhow::Result<()> {
    let pool = snapstock_db::connect_pool_from_env().await?;
    snapstock_db::purge_shop_data(&pool, shop).await?;
    println!("purged all data for {shop}");
    Ok(())
}

async fn create_session(shop: &str) -> anyhow::Result<()> {
    let pool = snapstock_db::connect_pool_from_env().await?;
    let session = snapstock_db::create_session(
        &pool,
        shop,
        snapstock_core::session::dashboard_session_ttl(),
    )
    .await?;
    println!("session {} (expires {})", session.id, session.expires_at);
    Ok(())
}

async fn parse_variants(transcript: &str) -> anyhow::Result<()> {
    let options = match parse_deterministic(transcript) {
        Some(set) => set.normalized(),
        None => {
            let api_key = std::env::var("GOOGLE_GENERATIVE_AI_API_KEY")
                .map_err(|_| anyhow::anyhow!("no deterministic match and no AI key configured"))?;
            let analyzer = ScanAnalyzer::new(GenerativeClient::new(&api_key)?, None);
            analyzer.parse_variant_text(transcript).await?
        }
    };
    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(())
}

async fn publish(product_id: i64) -> anyhow::Result<()> {
    let config = snapstock_core::load_app_config()?;
    let pool = snapstock_db::connect_pool_from_env().await?;

    let row = snapstock_db::get_scanned_product(&pool, product_id).await?;
    anyhow::ensure!(row.status == "DRAFT", "product {product_id} is not a draft");

    let session = snapstock_db::get_session(&pool, row.session_id).await?;
    let settings = snapstock_db::get_or_create_shop_settings(&pool, &session.shop).await?;
    let access_token = settings
        .access_token
        .ok_or_else(|| anyhow::anyhow!("no access token stored for {}", session.shop))?;

    let client = GraphqlAdminClient::new(
        &session.shop,
        &access_token,
        &config.shopify_api_version,
        config.platform_request_timeout_secs,
    )?;
    let publisher = ProductPublisher::new(client, Some(session.shop.clone()));
    let published = publisher.publish(&row.into_product()).await?;
    snapstock_db::mark_published(&pool, product_id).await?;

    println!("published {} -> {}", published.product_id, published.admin_url);
    Ok(())
}
