use clap::Parser;
use overmesh::{
    config::Config,
    constants::*,
    network::join::NoopObserver,
    node::Node,
};
use std::fs;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "OverMesh overlay-network node")]
struct Args {
    /// Optional path to config file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Content-cache size hint (opaque to the topology engine)
    cache_size: Option<usize>,

    /// IP peers use to reach this node
    host: Option<String>,

    /// Local TCP control port
    port: Option<u16>,

    /// Rendezvous server IP
    registry_host: Option<String>,

    /// Rendezvous server UDP port
    registry_port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| "config.toml".to_string());
    let mut config = match fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<Config>(&content) {
            Ok(cfg) => {
                println!("{}Loaded config from: {}", ICON_PLACEHOLDER, config_path);
                cfg
            }
            Err(err) => {
                eprintln!("❌ Failed to parse config file '{}': {}", config_path, err);
                std::process::exit(1);
            }
        },
        Err(_) => {
            if args.config.is_some() {
                eprintln!("❌ Config file '{}' not found.", config_path);
                std::process::exit(1);
            }
            Config::default()
        }
    };

    // Precedence: CLI argument > config file > library default.
    if let Some(v) = args.cache_size {
        config.cache_size = Some(v);
    }
    if let Some(v) = args.host {
        config.host = v;
    }
    if let Some(v) = args.port {
        config.port = v;
    }
    if let Some(v) = args.registry_host {
        config.registry_host = v;
    }
    if let Some(v) = args.registry_port {
        config.registry_port = v;
    }

    // Initialize events AFTER config is loaded so a custom log path applies.
    if let Some(log_cfg) = config.logging.as_ref() {
        overmesh::events::init_events_from_config(Some(log_cfg)).await;
    } else {
        overmesh::events::init_default_events().await;
    }

    let app_name = config
        .app_name
        .clone()
        .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());
    println!(
        "{}Starting {} {}: node {}:{}, cache hint={:?}, rendezvous {}:{}",
        ICON_PLACEHOLDER,
        app_name,
        full_version(),
        config.host,
        config.port,
        config.cache_size,
        config.registry_host,
        config.registry_port
    );

    let mut node = match Node::new(config, Arc::new(NoopObserver)).await {
        Ok(node) => node,
        Err(e) => {
            eprintln!("❌ Startup failed: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = node.run().await {
        eprintln!("❌ Fatal: {:#}", e);
        std::process::exit(1);
    }
}
