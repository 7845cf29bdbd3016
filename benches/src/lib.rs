//! Benchmark fixtures for mirrorpull.

use serde_json::{Value, json};

/// Builds a transactions page shaped like a mirror node response.
///
/// `seq` offsets the record timestamps so consecutive pages differ.
pub fn sample_page(records: usize, seq: usize, next: Option<&str>) -> Value {
    let transactions: Vec<Value> = (0..records)
        .map(|i| {
            let n = seq * records + i;
            json!({
                "consensus_timestamp": format!("1704067200.{n:09}"),
                "transaction_id": format!("0.0.800-1704067200-{n:09}"),
                "name": "CRYPTOTRANSFER",
                "result": "SUCCESS",
                "charged_tx_fee": 84_650,
                "transfers": [
                    { "account": "0.0.800", "amount": -1_000 - n as i64, "is_approval": false },
                    { "account": "0.0.98", "amount": 1_000 + n as i64, "is_approval": false }
                ]
            })
        })
        .collect();
    json!({ "transactions": transactions, "links": { "next": next } })
}

/// Continuation cursor for page `seq` of a benchmark chain.
pub fn cursor(seq: usize) -> String {
    format!("/api/v1/transactions?account.id=0.0.800&limit=100&order=asc&timestamp=gt:{seq}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_page_shape() {
        let page = sample_page(3, 1, Some("/next"));
        assert_eq!(page["transactions"].as_array().map(Vec::len), Some(3));
        assert_eq!(page["links"]["next"], "/next");
        assert_eq!(
            page["transactions"][0]["consensus_timestamp"],
            "1704067200.000000003"
        );
    }
}
