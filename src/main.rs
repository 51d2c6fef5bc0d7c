//! Larder - recipe feed and portioning core
//!
//! Demo binary: connects to the document store, walks the recipe feed the
//! way the scroll sentinel would, and prints each recipe with its
//! ingredient quantities scaled to a doubled portion target.

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use larder::{
    config::Args,
    db::MongoClient,
    feed::FeedConfig,
    FeedSession, PortionScaler, Session,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("larder={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Larder - recipe feed core");
    info!("======================================");
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Database: {}", args.mongodb_db);
    info!("Collection: {}", args.recipes_collection);
    info!("Page size: {}", args.page_size);
    info!("======================================");

    // Connect to MongoDB
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => client,
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    let feed = Arc::new(FeedSession::new(
        Arc::new(mongo.store()),
        Session::anonymous(),
        FeedConfig {
            page_size: args.page_size,
            recipes_collection: args.recipes_collection.clone(),
            users_collection: args.users_collection.clone(),
        },
    ));

    feed.load_initial().await?;

    // Walk the feed like a scrolling client would
    let mut pages = 1;
    while pages < args.feed_pages && feed.has_more() {
        if !feed.sentinel_visible().await? {
            break;
        }
        pages += 1;
    }

    info!(
        "Fetched {} page(s), {} recipe(s), has_more={}",
        pages,
        feed.len(),
        feed.has_more()
    );

    for record in feed.records() {
        let mut scaler = PortionScaler::for_recipe(&record);
        scaler.set_target(record.base_portions.saturating_mul(2));

        println!(
            "{} ({} -> {} portions)",
            record.title,
            record.base_portions,
            scaler.target()
        );
        for ingredient in &record.ingredients {
            println!(
                "  {:<20} {}",
                ingredient.name,
                scaler.display_quantity(ingredient, record.base_portions)
            );
        }
    }

    Ok(())
}
