// src/page.rs
use serde::Serialize;
use std::collections::BTreeMap;

use crate::dom::{Document, Element};
use crate::render::OUTBOUND_CLASS;

// Scalar regions
pub const VAULT_BALANCE: &str = "vault-balance";
pub const VAULT_USD: &str = "vault-usd";
pub const BURN_TOTAL: &str = "burn-total";
pub const BURN_SUPPLY: &str = "burn-supply";

// List regions
pub const VAULT_TRANSFERS: &str = "vault-transfers";
pub const SWAP_TRANSFERS: &str = "swap-transfers";
pub const BURN_TRANSFERS: &str = "burn-transfers";

pub const SCALAR_REGIONS: [&str; 4] = [VAULT_BALANCE, VAULT_USD, BURN_TOTAL, BURN_SUPPLY];
pub const LIST_REGIONS: [&str; 3] = [VAULT_TRANSFERS, SWAP_TRANSFERS, BURN_TRANSFERS];

pub const PLACEHOLDER_TEXT: &str = "—";
pub const LOADING_TEXT: &str = "Caricamento…";
pub const ACTIVE_CLASS: &str = "active";

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:2rem;background:#101418;color:#e8ecef}\
.card{position:relative;margin-bottom:1.5rem;padding:1rem;border:1px solid #2a3138;border-radius:8px}\
.details-trigger{cursor:pointer;background:none;border:1px solid #3b444d;color:inherit;border-radius:4px}\
.details-panel{display:none;margin-top:.75rem}\
.details-panel.active{display:block}\
.vault-transfers{list-style:none;padding:0;margin:0}\
.vault-transfers li{display:flex;gap:1rem;padding:.25rem 0}\
.vault-transfer-amount{color:#3ecf8e}\
.vault-transfer-amount.out{color:#e5534b}\
.vault-transfer-link{margin-left:auto;color:#7aa2f7}";

fn scalar(id: &str) -> Element {
    Element::new("span").with_id(id).with_text(PLACEHOLDER_TEXT)
}

fn transfer_list(id: &str) -> Element {
    Element::new("ul")
        .with_id(id)
        .with_class("vault-transfers")
        .with_child(Element::new("li").with_class("placeholder").with_text(LOADING_TEXT))
}

fn disclosure(name: &str, label: &str, list_id: &str) -> [Element; 2] {
    [
        Element::new("button")
            .with_id(&format!("{name}-details-trigger"))
            .with_class("details-trigger")
            .with_attr("type", "button")
            .with_text(label),
        Element::new("div")
            .with_id(&format!("{name}-details-panel"))
            .with_class("details-panel")
            .with_child(transfer_list(list_id)),
    ]
}

fn card(title: &str, lines: Vec<Element>, details: [Element; 2]) -> Element {
    let mut card = Element::new("section")
        .with_class("card")
        .with_child(Element::new("h2").with_text(title));
    for line in lines {
        card.append(line);
    }
    for node in details {
        card.append(node);
    }
    card
}

fn line(label: &str, value: Element) -> Element {
    Element::new("p")
        .with_child(Element::new("span").with_class("label").with_text(label))
        .with_child(value)
}

/// The page as it looks before any snapshot has been applied.
pub fn markup() -> Document {
    let head = Element::new("head")
        .with_child(Element::new("meta").with_attr("charset", "utf-8"))
        .with_child(Element::new("title").with_text("tBTC Vault"))
        .with_child(Element::new("style").with_text(STYLE));

    let body = Element::new("body")
        .with_child(card(
            "Vault",
            vec![
                line("Saldo tBTC ", scalar(VAULT_BALANCE)),
                line("Valore USD ", scalar(VAULT_USD)),
            ],
            disclosure("vault", "Dettagli", VAULT_TRANSFERS),
        ))
        .with_child(card(
            "Swap",
            Vec::new(),
            disclosure("swap", "Dettagli", SWAP_TRANSFERS),
        ))
        .with_child(card(
            "Burn",
            vec![
                line("Nummus bruciati ", scalar(BURN_TOTAL)),
                line("Supply totale ", scalar(BURN_SUPPLY)),
            ],
            disclosure("burn", "Dettagli", BURN_TRANSFERS),
        ));

    Document::new(
        Element::new("html")
            .with_attr("lang", "it")
            .with_child(head)
            .with_child(body),
    )
}

/// One rendered transfer entry, as exposed by the JSON view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    pub label: String,
    pub amount: String,
    pub outbound: bool,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionsView {
    pub scalars: BTreeMap<String, Option<String>>,
    pub lists: BTreeMap<String, Option<Vec<EntryView>>>,
}

fn entry_view(li: &Element) -> EntryView {
    let part = |class: &str| li.children.iter().find(|c| c.has_class(class));
    match (part("vault-transfer-type"), part("vault-transfer-amount")) {
        (Some(label), Some(amount)) => EntryView {
            label: label.text_content(),
            amount: amount.text_content(),
            outbound: amount.has_class(OUTBOUND_CLASS),
            href: part("vault-transfer-link").and_then(|a| a.attr("href").map(str::to_string)),
        },
        // Placeholder or error rows carry plain text only.
        _ => EntryView {
            label: String::new(),
            amount: li.text_content(),
            outbound: false,
            href: None,
        },
    }
}

/// Snapshot of what every region currently shows.
pub fn regions(doc: &Document) -> RegionsView {
    RegionsView {
        scalars: SCALAR_REGIONS
            .iter()
            .map(|id| (id.to_string(), doc.element(id).map(Element::text_content)))
            .collect(),
        lists: LIST_REGIONS
            .iter()
            .map(|id| {
                let entries = doc
                    .element(id)
                    .map(|list| list.children.iter().map(entry_view).collect());
                (id.to_string(), entries)
            })
            .collect(),
    }
}
