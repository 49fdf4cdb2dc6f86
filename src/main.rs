use anyhow::{Context, Result};
use clap::Parser;
use listing_search::config::Settings;
use listing_search::models::{Property, Purpose};
use listing_search::search::canonical::{format_number, to_query};
use listing_search::search::{QueryExecutor, SearchSync};
use listing_search::storage::{ObjectStorage, RestObjectStorage};
use listing_search::store::{MemoryPropertyStore, PropertyStore, RestPropertyStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Resolve a listings URL into canonical filters and print the matching page
#[derive(Parser, Debug)]
#[command(name = "listing-search", version)]
struct Args {
    /// Listings location, e.g. /aluguel/barreiras/casas/3quartos?minPrice=1500
    #[arg(default_value = "/")]
    location: String,

    /// Extra query string appended to the location's own
    #[arg(short, long)]
    query: Option<String>,

    /// Fixed purpose of the listings page (venda, aluguel, lancamento)
    #[arg(long)]
    purpose: Option<String>,

    /// Settings file, without extension
    #[arg(short, long, default_value = "listing-search")]
    config: String,

    /// Search the built-in demo listings instead of the configured store
    #[arg(long)]
    demo: bool,

    /// Print the page as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let settings = Settings::new(&args.config).context("Failed to load settings")?;

    let explicit_purpose = match args.purpose.as_deref() {
        Some(value) => Some(
            Purpose::from_value(value)
                .with_context(|| format!("Unknown purpose: {}", value))?,
        ),
        None => None,
    };

    let location = match &args.query {
        Some(query) => {
            let separator = if args.location.contains('?') { '&' } else { '?' };
            format!("{}{}{}", args.location, separator, query.trim_start_matches('?'))
        }
        None => args.location.clone(),
    };

    let store: Arc<dyn PropertyStore> = if args.demo {
        Arc::new(MemoryPropertyStore::with_demo_listings())
    } else {
        Arc::new(
            RestPropertyStore::new(&settings.store)
                .context("Failed to create property store client")?,
        )
    };
    let storage = RestObjectStorage::new(&settings.storage, &settings.store)
        .context("Failed to create storage client")?;
    let executor = QueryExecutor::new(store);

    info!("🏠 Listing Search");
    info!("==================");

    let page_size = settings.search.effective_page_size();
    let mut sync = SearchSync::with_page_size(&location, explicit_purpose, page_size);
    let canonical = to_query(sync.filters()).to_query_string();
    info!(href = %sync.href(), canonical = %canonical, "Resolved listings URL");
    for (param, label) in sync.active_filters() {
        info!("  {}: {}", param.key(), label);
    }

    sync.refresh(&executor).await;

    if let Some(message) = sync.error() {
        anyhow::bail!("Search failed: {}", message);
    }
    let results = sync.results().context("Search produced no results")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    info!(
        "\n✅ {} listings, page {} of {}\n",
        results.total, results.page, results.total_pages
    );

    let first = (results.page as usize - 1) * results.page_size as usize;
    for (i, property) in results.items.iter().enumerate() {
        println!("{}. {} ({})", first + i + 1, property.title, price_label(property));
        println!(
            "   {} · {} quartos, {} banheiros, {} vagas",
            property.property_type.label(),
            property.bedrooms,
            property.bathrooms,
            property.parking_spots
        );
        match &property.location.neighborhood {
            Some(neighborhood) => println!(
                "   {}, {} - {}",
                neighborhood, property.location.city, property.location.state
            ),
            None => println!("   {} - {}", property.location.city, property.location.state),
        }
        if let Some(photo) = property.cover_photo() {
            println!("   Photo: {}", storage.public_url(&photo.path));
        }
        println!("   Slug: {}", property.slug);
        println!();
    }

    Ok(())
}

fn price_label(property: &Property) -> String {
    match (property.purpose, property.applicable_price()) {
        (Purpose::Rental, Some(rent)) => format!("R$ {}/mês", format_number(rent)),
        (_, Some(price)) => format!("R$ {}", format_number(price)),
        (_, None) => "Preço sob consulta".to_string(),
    }
}
