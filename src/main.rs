use std::path::PathBuf;

use clap::Parser;
use geonode_search::app::{self, RunOptions};
use geonode_search::environment::model::ResourceKey;
use geonode_search::environment::{Location, SearchConfig};

/// Search the catalogue of a GeoNode portal
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Location to open, e.g. "/search/?q=roads"
    #[arg(default_value = "/search/")]
    location: String,

    /// Portal base url, overrides the config file
    #[arg(short, long)]
    url: Option<String>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of result pages to load
    #[arg(short, long, default_value_t = 1)]
    pages: u32,

    /// Also fetch autocomplete suggestions for this text
    #[arg(long)]
    suggest: Option<String>,

    /// Also resolve the resource with this primary key
    #[arg(long)]
    select: Option<String>,
}

fn load_config(args: &Args) -> Result<SearchConfig, String> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::read(path)?
            .ok_or_else(|| format!("Config {} does not exist", path.display()))?,
        None => SearchConfig::default(),
    };
    if let Some(url) = &args.url {
        config.base_url = url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    app::init_logging();
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(2);
        }
    };

    let options = RunOptions {
        config,
        location: Location::parse(&args.location),
        pages: args.pages.max(1),
        suggest: args.suggest.clone(),
        select: args.select.as_deref().map(ResourceKey::from),
    };

    let output = match app::run(options).await {
        Ok(output) => output,
        Err(e) => {
            log::error!("Search failed: {e}");
            std::process::exit(1);
        }
    };

    for resource in &output.resources {
        match serde_json::to_string(resource) {
            Ok(line) => println!("{line}"),
            Err(e) => log::error!("Could not encode resource {}: {e}", resource.pk),
        }
    }
    if !output.suggestions.is_empty() {
        println!("{}", serde_json::json!({ "suggestions": output.suggestions }));
    }
    if let Some(selected) = output.selected {
        println!("{}", serde_json::json!({ "selected": selected }));
    }
}
