// src/loader.rs
use tracing::{debug, error};

use crate::config::Config;
use crate::dom::{Document, Element};
use crate::error::LoadError;
use crate::format::{format_number, format_usd, BALANCE_DIGITS, BURN_AMOUNT_DIGITS, WHOLE_TOKENS};
use crate::models::{decode_entries, BurnEvent, Transfer, WalletSnapshot};
use crate::page::{
    BURN_SUPPLY, BURN_TOTAL, BURN_TRANSFERS, LIST_REGIONS, SCALAR_REGIONS, SWAP_TRANSFERS,
    VAULT_BALANCE, VAULT_TRANSFERS, VAULT_USD,
};
use crate::render::{render_transfers, LabelMode};
use crate::snapshot::{SnapshotClient, Snapshots};

pub const UNAVAILABLE_TEXT: &str = "N/A";
pub const LOAD_ERROR_TEXT: &str = "Errore nel caricamento dei dati";

/// One page load: fetch every snapshot and write the results into `doc`.
/// Any failure degrades every region at once.
pub async fn run(cfg: &Config, client: &SnapshotClient, doc: &mut Document) {
    let result = match client.fetch_all().await {
        Ok(snapshots) => populate(cfg, &snapshots, doc),
        Err(e) => Err(e),
    };

    if let Err(err) = result {
        error!("Vault data error: {}", err);
        apply_fallback(doc);
    }
}

/// Writes all sections whose data is present. Sections with absent data
/// are left as they are.
pub fn populate(cfg: &Config, snapshots: &Snapshots, doc: &mut Document) -> Result<(), LoadError> {
    let status = &snapshots.status;

    if let Some((key, entry)) = status.resolve(&cfg.vault_candidates) {
        if [VAULT_BALANCE, VAULT_USD, VAULT_TRANSFERS].iter().all(|id| doc.contains(id)) {
            let vault = WalletSnapshot::from_value(entry)?;
            debug!("Vault resolved to {} ({} transfers)", key, vault.last_tbtc_transfers.len());

            doc.set_text(VAULT_BALANCE, format_number(vault.tbtc_balance, BALANCE_DIGITS));
            doc.set_text(VAULT_USD, format_usd(vault.tbtc_usd_value));

            // The inbound filter reads every entry, not just the first page.
            let inflows: Vec<Transfer> = decode_entries::<Transfer>(&vault.last_tbtc_transfers, "transfer")?
                .into_iter()
                .filter(Transfer::is_inbound)
                .take(cfg.transfer_limit)
                .collect();
            render_transfers(doc.element_mut(VAULT_TRANSFERS), &inflows, LabelMode::Default);
        }
    }

    if let Some(swap) = status.wallet(&cfg.swap_wallet)? {
        if doc.contains(SWAP_TRANSFERS) {
            let swaps: Vec<Transfer> =
                decode_entries(cap(&swap.last_tbtc_transfers, cfg.transfer_limit), "transfer")?;
            render_transfers(doc.element_mut(SWAP_TRANSFERS), &swaps, LabelMode::Swap);
        }
    }

    if let Some(burn) = &snapshots.burn {
        if doc.contains(BURN_TRANSFERS) {
            let burns: Vec<Transfer> = decode_entries::<BurnEvent>(cap(&burn.burns, cfg.transfer_limit), "burn")?
                .iter()
                .map(burn_transfer)
                .collect();
            render_transfers(doc.element_mut(BURN_TRANSFERS), &burns, LabelMode::Burn);
        }
    }

    if let Some(price) = &snapshots.price {
        doc.set_text(BURN_TOTAL, format_number(price.burn_total_tokens, WHOLE_TOKENS));
        doc.set_text(BURN_SUPPLY, format_number(price.total_supply_tokens, WHOLE_TOKENS));
    }

    Ok(())
}

/// Burns are shown as outgoing transfers with the token unit baked in.
pub fn burn_transfer(event: &BurnEvent) -> Transfer {
    Transfer {
        amount: Some(format!("-{} Nummus", format_number(event.amount_ui, BURN_AMOUNT_DIGITS))),
        signature: None,
        url: event.url.clone(),
    }
}

/// Degraded state: scalars read N/A, every list holds one error row.
pub fn apply_fallback(doc: &mut Document) {
    for id in SCALAR_REGIONS {
        doc.set_text(id, UNAVAILABLE_TEXT);
    }
    for id in LIST_REGIONS {
        if let Some(list) = doc.element_mut(id) {
            list.clear();
            list.append(Element::new("li").with_text(LOAD_ERROR_TEXT));
        }
    }
}

fn cap<T>(items: &[T], limit: usize) -> &[T] {
    &items[..items.len().min(limit)]
}
