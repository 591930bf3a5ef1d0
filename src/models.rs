// src/models.rs
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::LoadError;
use crate::format::coerce_number;

/// A single tBTC movement as published in the status snapshot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Transfer {
    #[serde(default, deserialize_with = "scalar_text")]
    pub amount: Option<String>, // signed, e.g. "+0.25"
    #[serde(default, deserialize_with = "non_empty_string", skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Transfer {
    pub fn raw_amount(&self) -> &str {
        self.amount.as_deref().unwrap_or("")
    }

    pub fn is_inbound(&self) -> bool {
        is_inbound(self.raw_amount())
    }
}

/// Direction comes only from the sign prefix of the amount text.
pub fn is_inbound(amount: &str) -> bool {
    amount.trim().starts_with('+')
}

/// Balance and recent transfers of one tracked wallet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WalletSnapshot {
    #[serde(default, deserialize_with = "loose_number")]
    pub tbtc_balance: f64,
    #[serde(default, deserialize_with = "loose_number")]
    pub tbtc_usd_value: f64,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub last_tbtc_transfers: Vec<Value>, // decoded lazily, see `decode_entries`
}

impl WalletSnapshot {
    /// Non-object entries carry no fields, so they read as an empty wallet.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Object(_) => serde_json::from_value(value.clone()),
            _ => Ok(Self::default()),
        }
    }
}

/// Top-level mapping of `status.json`, keyed by wallet identifier.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    entries: Map<String, Value>,
}

impl StatusSnapshot {
    pub fn from_value(value: Value) -> Result<Self, LoadError> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            Value::Null => Err(LoadError::Malformed("status snapshot is null".to_string())),
            _ => Ok(Self::default()),
        }
    }

    /// First candidate whose entry is present and truthy, in candidate order.
    pub fn resolve<'a>(&'a self, candidates: &'a [String]) -> Option<(&'a str, &'a Value)> {
        candidates.iter().find_map(|key| {
            self.entries
                .get(key)
                .filter(|v| is_truthy(v))
                .map(|v| (key.as_str(), v))
        })
    }

    pub fn wallet(&self, key: &str) -> Result<Option<WalletSnapshot>, serde_json::Error> {
        match self.entries.get(key) {
            Some(v) if is_truthy(v) => WalletSnapshot::from_value(v).map(Some),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BurnEvent {
    #[serde(rename = "amountUi", default, deserialize_with = "loose_number")]
    pub amount_ui: f64,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BurnSnapshot {
    #[serde(default, deserialize_with = "list_or_empty")]
    pub burns: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PriceSnapshot {
    #[serde(rename = "burnTotalTokens", default, deserialize_with = "loose_number")]
    pub burn_total_tokens: f64,
    #[serde(rename = "totalSupplyTokens", default, deserialize_with = "loose_number")]
    pub total_supply_tokens: f64,
}

/// Optional snapshots: a falsy document counts as absent, other non-objects as empty.
pub fn optional_snapshot<T>(value: Value) -> Result<Option<T>, serde_json::Error>
where
    T: DeserializeOwned + Default,
{
    match value {
        Value::Object(_) => serde_json::from_value(value).map(Some),
        v if is_truthy(&v) => Ok(Some(T::default())),
        _ => Ok(None),
    }
}

/// Decodes raw list entries. Only a `null` entry is malformed; any other
/// non-object reads as an entry with no fields.
pub fn decode_entries<T>(entries: &[Value], what: &str) -> Result<Vec<T>, LoadError>
where
    T: DeserializeOwned + Default,
{
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| match entry {
            Value::Null => Err(LoadError::Malformed(format!("{what} entry {i} is null"))),
            Value::Object(_) => Ok(serde_json::from_value(entry.clone())?),
            _ => Ok(T::default()),
        })
        .collect()
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ---------- lenient field decoders ----------

fn string_only<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

// Falsy values read as absent; truthy scalars keep their text form.
fn scalar_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(d)?;
    if !is_truthy(&value) {
        return Ok(None);
    }
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| f.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn non_empty_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(string_only(d)?.filter(|s| !s.is_empty()))
}

fn loose_number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(coerce_number(&Value::deserialize(d)?))
}

// Entries stay raw until something reads them.
fn list_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inbound_is_decided_by_trimmed_plus_sign() {
        assert!(is_inbound("+1.5"));
        assert!(is_inbound("   +0.001"));
        assert!(is_inbound("\t+3\n"));
        assert!(!is_inbound("-2.0"));
        assert!(!is_inbound("1.0"));
        assert!(!is_inbound("  -0.5"));
        assert!(!is_inbound(""));
    }

    #[test]
    fn scalar_amounts_keep_their_text() {
        let tx: Transfer = serde_json::from_value(json!({ "amount": 5, "signature": "" })).unwrap();
        assert_eq!(tx.amount.as_deref(), Some("5"));
        assert_eq!(tx.signature, None);
        assert!(!tx.is_inbound());

        let tx: Transfer = serde_json::from_value(json!({ "amount": 0.25 })).unwrap();
        assert_eq!(tx.raw_amount(), "0.25");
        let tx: Transfer = serde_json::from_value(json!({ "amount": true })).unwrap();
        assert_eq!(tx.raw_amount(), "true");

        for falsy in [json!(0), json!(false), json!(""), Value::Null, json!({})] {
            let tx: Transfer = serde_json::from_value(json!({ "amount": falsy })).unwrap();
            assert_eq!(tx.raw_amount(), "");
        }
    }

    #[test]
    fn wallet_fields_are_coerced() {
        let wallet = WalletSnapshot::from_value(&json!({
            "tbtc_balance": "0.5",
            "last_tbtc_transfers": "not a list"
        }))
        .unwrap();
        assert_eq!(wallet.tbtc_balance, 0.5);
        assert_eq!(wallet.tbtc_usd_value, 0.0);
        assert!(wallet.last_tbtc_transfers.is_empty());
    }

    #[test]
    fn only_null_entries_are_malformed() {
        let wallet = WalletSnapshot::from_value(&json!({
            "last_tbtc_transfers": [{ "amount": "+1" }, 7, "x", null]
        }))
        .unwrap();
        assert_eq!(wallet.last_tbtc_transfers.len(), 4);

        let head: Vec<Transfer> = decode_entries(&wallet.last_tbtc_transfers[..3], "transfer").unwrap();
        assert_eq!(head[0].raw_amount(), "+1");
        assert_eq!(head[1], Transfer::default());
        assert_eq!(head[2], Transfer::default());

        let err = decode_entries::<Transfer>(&wallet.last_tbtc_transfers, "transfer").unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
        assert_eq!(err.to_string(), "malformed snapshot: transfer entry 3 is null");
    }

    #[test]
    fn resolve_takes_first_truthy_candidate_in_order() {
        let status = StatusSnapshot::from_value(json!({
            "wallet_1": { "tbtc_balance": 1 },
            "vault_wallet_2": null,
            "cold": { "tbtc_balance": 2 }
        }))
        .unwrap();

        let candidates = vec!["vault_wallet_2".to_string(), "cold".to_string(), "wallet_1".to_string()];
        let (key, _) = status.resolve(&candidates).unwrap();
        assert_eq!(key, "cold");

        let none = vec!["missing".to_string()];
        assert!(status.resolve(&none).is_none());
    }

    #[test]
    fn status_document_shapes() {
        assert!(StatusSnapshot::from_value(Value::Null).is_err());
        let empty = StatusSnapshot::from_value(json!([1, 2, 3])).unwrap();
        assert!(empty.wallet("wallet_1").unwrap().is_none());
    }

    #[test]
    fn optional_snapshots_treat_falsy_documents_as_absent() {
        assert_eq!(optional_snapshot::<PriceSnapshot>(Value::Null).unwrap(), None);
        assert_eq!(optional_snapshot::<PriceSnapshot>(json!(0)).unwrap(), None);
        assert_eq!(
            optional_snapshot::<BurnSnapshot>(json!("yes")).unwrap(),
            Some(BurnSnapshot::default())
        );

        let price: PriceSnapshot = optional_snapshot(json!({
            "burnTotalTokens": 1000,
            "totalSupplyTokens": "21000000"
        }))
        .unwrap()
        .unwrap();
        assert_eq!(price.burn_total_tokens, 1000.0);
        assert_eq!(price.total_supply_tokens, 21_000_000.0);
    }

    #[test]
    fn burns_default_to_empty() {
        let burn: BurnSnapshot = serde_json::from_value(json!({ "burns": { "x": 1 } })).unwrap();
        assert!(burn.burns.is_empty());

        let burn: BurnSnapshot = serde_json::from_value(json!({
            "burns": [{ "amountUi": 10, "url": "https://x" }, {}, 5]
        }))
        .unwrap();
        let events: Vec<BurnEvent> = decode_entries(&burn.burns, "burn").unwrap();
        assert_eq!(events[0].amount_ui, 10.0);
        assert_eq!(events[0].url.as_deref(), Some("https://x"));
        assert_eq!(events[1], BurnEvent::default());
        assert_eq!(events[2], BurnEvent::default());
    }
}
