// src/snapshot.rs
use chrono::Utc;
use eyre::{eyre, Result};
use futures_util::future::join3;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Client, Response, Url};
use serde_json::Value;
use tracing::debug;

use crate::error::LoadError;
use crate::models::{optional_snapshot, BurnSnapshot, PriceSnapshot, StatusSnapshot};

pub const STATUS_PATH: &str = "data/status.json";
pub const BURN_PATH: &str = "data/burn.json";
pub const PRICE_PATH: &str = "data/price.json";

/// Everything one page load works from.
#[derive(Debug, Clone)]
pub struct Snapshots {
    pub status: StatusSnapshot,
    pub burn: Option<BurnSnapshot>,
    pub price: Option<PriceSnapshot>,
}

/// Fetches the published JSON snapshots relative to a base URL.
#[derive(Debug, Clone)]
pub struct SnapshotClient {
    client: Client,
    base_url: Url,
}

impl SnapshotClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| eyre!("invalid DATA_BASE_URL {:?}: {}", base_url, e))?;
        if base_url.cannot_be_a_base() {
            return Err(eyre!("DATA_BASE_URL {} cannot be a base URL", base_url));
        }
        // Url::join drops the last segment unless the path is a directory.
        if !base_url.path().ends_with('/') {
            let dir = format!("{}/", base_url.path());
            base_url.set_path(&dir);
        }

        let client = Client::builder().build()?;
        Ok(Self { client, base_url })
    }

    pub fn url_for(&self, path: &str) -> Result<Url, LoadError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| LoadError::Malformed(format!("bad snapshot path {path}: {e}")))?;
        // Cache-buster: a fresh query per load so no intermediary can answer from cache.
        url.query_pairs_mut()
            .append_pair("_", &Utc::now().timestamp_millis().to_string());
        Ok(url)
    }

    /// One no-store GET. Only transport failures are errors here; the caller
    /// decides what a non-2xx status means.
    pub async fn fetch(&self, path: &str) -> Result<Response, LoadError> {
        let url = self.url_for(path)?;
        debug!("Fetching snapshot → {}", url);

        let resp = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        debug!("Snapshot {} → HTTP {}", path, resp.status());
        Ok(resp)
    }

    /// Fetches status, burn and price concurrently. A non-2xx status document
    /// is fatal; non-2xx burn/price documents are simply absent.
    pub async fn fetch_all(&self) -> Result<Snapshots, LoadError> {
        let (status, burn, price) = join3(
            self.fetch(STATUS_PATH),
            self.fetch(BURN_PATH),
            self.fetch(PRICE_PATH),
        )
        .await;
        let (status, burn, price) = (status?, burn?, price?);

        if !status.status().is_success() {
            return Err(LoadError::Status(status.status()));
        }
        let status = StatusSnapshot::from_value(status.json::<Value>().await?)?;
        let burn = match optional_json(burn).await? {
            Some(v) => optional_snapshot(v)?,
            None => None,
        };
        let price = match optional_json(price).await? {
            Some(v) => optional_snapshot(v)?,
            None => None,
        };

        Ok(Snapshots { status, burn, price })
    }
}

async fn optional_json(resp: Response) -> Result<Option<Value>, LoadError> {
    if !resp.status().is_success() {
        return Ok(None);
    }
    Ok(Some(resp.json().await?))
}
