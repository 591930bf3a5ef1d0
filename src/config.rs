use dotenvy::dotenv;
use eyre::{eyre, Result};
use std::{env, net::IpAddr, time::Duration};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_base_url: String,     // where data/*.json snapshots are published
    pub bind_addr: IpAddr,
    pub port: u16,
    pub vault_candidates: Vec<String>, // first present key wins
    pub swap_wallet: String,
    pub transfer_limit: usize,
    pub hover_hide_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_base_url: "http://127.0.0.1:8000/".to_string(),
            bind_addr: IpAddr::from([127, 0, 0, 1]),
            port: 8080,
            vault_candidates: vec!["vault_wallet_2".to_string(), "wallet_1".to_string()],
            swap_wallet: "wallet_1".to_string(),
            transfer_limit: 12,
            hover_hide_delay: Duration::from_millis(140),
        }
    }
}

pub fn load() -> Result<Config> {
    dotenv().ok(); // Load from .env file

    let cfg = from_lookup(|key| env::var(key).ok())?;

    info!("Loaded config: {:?}", cfg);

    Ok(cfg)
}

/// Builds a config from an arbitrary variable source, falling back to the
/// defaults for anything unset or unparseable.
pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let defaults = Config::default();
    let var = |key: &str| {
        lookup(key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let data_base_url = var("DATA_BASE_URL").unwrap_or(defaults.data_base_url);

    let bind_addr = var("BIND_ADDR")
        .and_then(|s| s.parse().ok())
        .unwrap_or(defaults.bind_addr);

    let port = var("PORT")
        .and_then(|s| s.parse().ok())
        .unwrap_or(defaults.port);

    let vault_candidates = match lookup("VAULT_CANDIDATES") {
        Some(raw) => raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => defaults.vault_candidates,
    };
    if vault_candidates.is_empty() {
        return Err(eyre!("VAULT_CANDIDATES must name at least one wallet"));
    }

    let swap_wallet = var("SWAP_WALLET").unwrap_or(defaults.swap_wallet);

    let transfer_limit = var("TRANSFER_LIMIT")
        .and_then(|s| s.parse().ok())
        .unwrap_or(defaults.transfer_limit);

    let hover_hide_delay = var("HOVER_HIDE_DELAY_MS")
        .and_then(|s| s.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(defaults.hover_hide_delay);

    Ok(Config {
        data_base_url,
        bind_addr,
        port,
        vault_candidates,
        swap_wallet,
        transfer_limit,
        hover_hide_delay,
    })
}
