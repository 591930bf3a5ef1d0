// src/render.rs
use serde::{Deserialize, Serialize};

use crate::dom::Element;
use crate::models::{is_inbound, Transfer};

pub const EXPLORER_TX_URL: &str = "https://solscan.io/tx/";
pub const OUTBOUND_CLASS: &str = "out";
const FALLBACK_HREF: &str = "#";

/// How a list labels its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelMode {
    #[default]
    Default,
    Swap,
    Burn,
}

impl LabelMode {
    pub fn label(self, inbound: bool) -> &'static str {
        match (self, inbound) {
            (LabelMode::Burn, _) => "",
            (LabelMode::Swap, true) => "Swap",
            (LabelMode::Default, true) => "Inflow",
            (_, false) => "Transfer",
        }
    }

    fn amount_text(self, raw: &str) -> String {
        match self {
            // Burn amounts arrive already formatted with their unit.
            LabelMode::Burn => raw.to_string(),
            _ => format!("{raw} tBTC"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLink {
    pub href: String,
    pub external: bool,
}

/// Explicit url first, then an explorer link from the signature, else `#`.
pub fn transfer_link(tx: &Transfer) -> TransferLink {
    let href = match (&tx.url, &tx.signature) {
        (Some(url), _) => url.clone(),
        (None, Some(sig)) => format!("{EXPLORER_TX_URL}{sig}"),
        (None, None) => FALLBACK_HREF.to_string(),
    };
    let external = href != FALLBACK_HREF;
    TransferLink { href, external }
}

/// Clears `container` and appends one `li` per transfer, in order.
/// An absent container is a no-op.
pub fn render_transfers(container: Option<&mut Element>, transfers: &[Transfer], mode: LabelMode) {
    let Some(list) = container else {
        return;
    };

    list.clear();
    for tx in transfers {
        list.append(transfer_entry(tx, mode));
    }
}

fn transfer_entry(tx: &Transfer, mode: LabelMode) -> Element {
    let raw = tx.raw_amount();
    let inbound = is_inbound(raw);

    let type_line = Element::new("div")
        .with_class("vault-transfer-type")
        .with_text(mode.label(inbound));

    let mut amount = Element::new("div")
        .with_class("vault-transfer-amount")
        .with_text(mode.amount_text(raw));
    if !inbound {
        amount.add_class(OUTBOUND_CLASS);
    }

    let link = transfer_link(tx);
    let mut anchor = Element::new("a")
        .with_class("vault-transfer-link")
        .with_attr("href", &link.href);
    if link.external {
        anchor.set_attr("target", "_blank");
        anchor.set_attr("rel", "noopener noreferrer");
    } else {
        anchor.set_attr("target", "_self");
    }
    anchor.set_text("Solscan");

    Element::new("li")
        .with_child(type_line)
        .with_child(amount)
        .with_child(anchor)
}
