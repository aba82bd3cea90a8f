use std::collections::HashSet;
use std::str::FromStr;

use mallfeed_core::TransactionRecord;
use rust_decimal::Decimal;

use crate::client::{PosClient, PosError};
use crate::window::DateWindow;

/// Largest page the receipts endpoint accepts.
pub const PAGE_LIMIT: u32 = 250;

impl PosClient {
    /// Every receipt of `store_id` created inside `window`, in arrival order.
    ///
    /// Follows `cursor` until a page comes back without one. Any failed page
    /// fails the whole fetch: a partial day would be reported as a wrong total.
    pub fn fetch_receipts(
        &self,
        store_id: &str,
        window: &DateWindow,
    ) -> Result<Vec<TransactionRecord>, PosError> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen: HashSet<String> = HashSet::new();
        let mut page = 0u32;

        loop {
            page += 1;
            let mut params = vec![
                ("store_id", store_id.to_string()),
                ("created_at_min", window.created_at_min()),
                ("created_at_max", window.created_at_max()),
                ("limit", PAGE_LIMIT.to_string()),
            ];
            if let Some(ref c) = cursor {
                params.push(("cursor", c.clone()));
            }

            let body = self.get_json("receipts", &params)?;

            let items = body["receipts"]
                .as_array()
                .ok_or_else(|| PosError::Parse("receipts response missing 'receipts' array".into()))?;

            tracing::debug!(store_id, page, count = items.len(), "receipts page");

            for item in items {
                records.push(parse_receipt(item)?);
            }

            let next = body["cursor"]
                .as_str()
                .filter(|c| !c.is_empty())
                .map(|c| c.to_string());

            match next {
                None => break,
                Some(next) => {
                    if !seen.insert(next.clone()) {
                        return Err(PosError::PaginationStuck(next));
                    }
                    cursor = Some(next);
                }
            }
        }

        Ok(records)
    }
}

fn parse_receipt(item: &serde_json::Value) -> Result<TransactionRecord, PosError> {
    let receipt_number = item["receipt_number"].as_str().unwrap_or("").to_string();
    let receipt_type = item["receipt_type"].as_str().unwrap_or("").to_string();
    let total_money = parse_money(&item["total_money"]).map_err(|value| {
        PosError::Parse(format!(
            "receipt {:?}: total_money {} is not a number",
            receipt_number, value
        ))
    })?;

    Ok(TransactionRecord {
        receipt_number,
        receipt_type,
        total_money,
    })
}

/// JSON number (or numeric string) → exact decimal. Missing counts as zero.
fn parse_money(value: &serde_json::Value) -> Result<Decimal, String> {
    let text = match value {
        serde_json::Value::Null => return Ok(Decimal::ZERO),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        other => return Err(other.to_string()),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| text)
}
