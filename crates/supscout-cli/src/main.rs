use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use supscout_cache::KeyValueStore;
use supscout_core::{
    source, Config, DetailCoordinator, Favorites, FetchState, MemoryStorage, RecentSearches,
    SearchCoordinator, SearchResultPage, Storage, Supplement,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "supscout")]
#[command(version, about = "Look up dietary supplements on Open Food Facts", long_about = None)]
struct Cli {
    /// Keep favorites and recent searches in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Storage database path (overrides config)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Search for supplements
    Search {
        /// Search terms
        query: String,
        /// Result page, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Print the raw page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show supplement details
    Show {
        /// Product barcode
        barcode: String,
        #[arg(long)]
        json: bool,
    },
    /// Manage favorite supplements
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Manage recent searches
    Recent {
        #[command(subcommand)]
        action: RecentAction,
    },
}

#[derive(clap::Subcommand)]
enum FavoritesAction {
    List,
    Add { id: String },
    Remove { id: String },
    Toggle { id: String },
    Clear,
}

#[derive(clap::Subcommand)]
enum RecentAction {
    List,
    Remove { query: String },
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so --json output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "supscout=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load config")?;

    let Some(command) = cli.command else {
        println!("No command specified. Try --help");
        return Ok(());
    };

    let storage = open_storage(&config, cli.ephemeral, cli.db)?;

    match command {
        Commands::Search { query, page, json } => {
            tracing::info!("Searching for: {}", query);

            let mut recent =
                RecentSearches::with_capacity(storage, config.search.recent_searches_limit);
            recent.add(&query);

            let source = Arc::new(source::open_food_facts(&config.api));
            let mut coordinator =
                SearchCoordinator::from_config(source, config.api.page_size, &config.search);

            match coordinator.search(&query, page).await {
                FetchState::Success(results) if json => {
                    println!("{}", serde_json::to_string_pretty(results)?)
                }
                FetchState::Success(results) => print_page(results),
                FetchState::Error(message) => anyhow::bail!("{}", message),
                FetchState::Idle | FetchState::Loading => println!("Nothing to search for"),
            }
        }
        Commands::Show { barcode, json } => {
            tracing::info!("Showing supplement: {}", barcode);

            let favorites = Favorites::load(storage);
            let source = Arc::new(source::open_food_facts(&config.api));
            let mut coordinator = DetailCoordinator::new(source)
                .with_stale_policy(config.search.stale_policy());

            match coordinator.load(&barcode).await {
                FetchState::Success(item) if json => {
                    println!("{}", serde_json::to_string_pretty(item)?)
                }
                FetchState::Success(item) => print_details(item, favorites.contains(&item.id)),
                FetchState::Error(message) => anyhow::bail!("{}", message),
                FetchState::Idle | FetchState::Loading => println!("No barcode given"),
            }
        }
        Commands::Favorites { action } => {
            let mut favorites = Favorites::load(storage);
            match action {
                FavoritesAction::List => print_list("No favorites yet", favorites.items()),
                FavoritesAction::Add { id } => {
                    favorites.add(&id);
                    println!("Added {} to favorites", id);
                }
                FavoritesAction::Remove { id } => {
                    favorites.remove(&id);
                    println!("Removed {} from favorites", id);
                }
                FavoritesAction::Toggle { id } => {
                    if favorites.toggle(&id) {
                        println!("Added {} to favorites", id);
                    } else {
                        println!("Removed {} from favorites", id);
                    }
                }
                FavoritesAction::Clear => {
                    favorites.clear();
                    println!("Favorites cleared");
                }
            }
        }
        Commands::Recent { action } => {
            let mut recent =
                RecentSearches::with_capacity(storage, config.search.recent_searches_limit);
            match action {
                RecentAction::List => print_list("No recent searches", recent.items()),
                RecentAction::Remove { query } => {
                    recent.remove(&query);
                    println!("Removed \"{}\" from recent searches", query);
                }
                RecentAction::Clear => {
                    recent.clear();
                    println!("Recent searches cleared");
                }
            }
        }
    }

    Ok(())
}

fn open_storage(
    config: &Config,
    ephemeral: bool,
    db: Option<PathBuf>,
) -> anyhow::Result<Arc<dyn Storage>> {
    if ephemeral {
        tracing::debug!("Using in-memory storage");
        return Ok(Arc::new(MemoryStorage::new()));
    }

    let path = match db {
        Some(path) => path,
        None => config.storage_path()?,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let store = KeyValueStore::open(&path)
        .with_context(|| format!("Failed to open storage at {}", path.display()))?;
    Ok(Arc::new(store))
}

fn print_page(results: &SearchResultPage) {
    if results.supplements.is_empty() {
        println!("No supplements found");
        return;
    }

    println!(
        "{} results (page {} of {})\n",
        results.count,
        results.page,
        results.total_pages()
    );

    for item in &results.supplements {
        match &item.brand {
            Some(brand) => println!("  {:<16} {} ({})", item.id, item.name, brand),
            None => println!("  {:<16} {}", item.id, item.name),
        }
    }

    if results.has_next_page() {
        println!("\nMore results: --page {}", results.page + 1);
    }
}

fn print_details(item: &Supplement, favorite: bool) {
    let star = if favorite { " *" } else { "" };
    println!("{}{}", item.name, star);
    println!("Barcode: {}", item.id);

    if let Some(brand) = &item.brand {
        println!("Brand: {}", brand);
    }
    if let Some(serving) = &item.serving_size {
        println!("Serving size: {}", serving);
    }
    if let Some(description) = &item.description {
        println!("\n{}", description);
    }
    if !item.ingredients.is_empty() {
        println!("\nIngredients: {}", item.ingredients.join(", "));
    }
    if !item.categories.is_empty() {
        println!("Categories: {}", item.categories.join(", "));
    }
    if !item.allergens.is_empty() {
        println!("Allergens: {}", item.allergens.join(", "));
    }

    let labels = item.dietary_tags.labels();
    if !labels.is_empty() {
        println!("Dietary: {}", labels.join(", "));
    }

    let info = &item.nutritional_info;
    let rows = [
        ("Energy (kcal)", info.energy_kcal),
        ("Protein (g)", info.proteins),
        ("Carbohydrates (g)", info.carbohydrates),
        ("Sugars (g)", info.sugars),
        ("Fat (g)", info.fat),
        ("Saturated fat (g)", info.saturated_fat),
        ("Fiber (g)", info.fiber),
        ("Sodium (g)", info.sodium),
        ("Salt (g)", info.salt),
    ];

    let known: Vec<_> = rows
        .iter()
        .filter_map(|(label, value)| value.map(|v| (label, v)))
        .collect();
    if !known.is_empty() {
        println!("\nPer 100g:");
        for (label, value) in known {
            println!("  {:<18} {}", label, value);
        }
    }

    for (title, map) in [("Vitamins", &info.vitamins), ("Minerals", &info.minerals)] {
        if let Some(map) = map {
            println!("\n{} (mg per 100g):", title);
            for (name, amount) in map {
                println!("  {:<18} {}", name, amount);
            }
        }
    }
}

fn print_list(empty: &str, items: &[String]) {
    if items.is_empty() {
        println!("{}", empty);
        return;
    }
    for item in items {
        println!("  {}", item);
    }
}
