use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Debit => "debit",
            Direction::Credit => "credit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentRail {
    Card,
    #[serde(rename = "ACH")]
    Ach,
    Zelle,
    Wire,
    Check,
    #[serde(rename = "ATM")]
    Atm,
}

impl PaymentRail {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentRail::Card => "Card",
            PaymentRail::Ach => "ACH",
            PaymentRail::Zelle => "Zelle",
            PaymentRail::Wire => "Wire",
            PaymentRail::Check => "Check",
            PaymentRail::Atm => "ATM",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub name: String,
    pub category: String,
    pub subcategory: String,
}

/// Read-only transaction as served by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    #[serde(deserialize_with = "de_posted_at")]
    pub posted_at: DateTime<Utc>,
    pub direction: Direction,
    #[serde(deserialize_with = "de_amount")]
    pub amount: f64,
    pub merchant: Merchant,
    #[serde(default)]
    pub is_pending: bool,
    #[serde(default)]
    pub payment_rail: Option<PaymentRail>,
    #[serde(default)]
    pub card_last4: Option<String>,
}

impl Transaction {
    pub fn is_posted(&self) -> bool {
        !self.is_pending
    }

    pub fn is_debit(&self) -> bool {
        self.direction == Direction::Debit
    }

    /// Settled spend: the only rows analytics look at.
    pub fn is_posted_debit(&self) -> bool {
        self.is_posted() && self.is_debit()
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_pending {
            "PENDING"
        } else {
            "POSTED"
        }
    }
}

// RFC 3339, or a naive ISO timestamp taken as UTC.
fn de_posted_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid postedAt {raw:?}: {e}")))
}

fn de_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let amount = f64::deserialize(deserializer)?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "amount must be a non-negative number (got {amount})"
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn wire(posted_at: &str, amount: f64) -> serde_json::Value {
        json!({
            "id": "t001",
            "accountId": "A123",
            "postedAt": posted_at,
            "direction": "debit",
            "amount": amount,
            "merchant": {"name": "Netflix", "category": "Entertainment", "subcategory": "Streaming"},
            "paymentRail": "Card",
            "cardLast4": "4242"
        })
    }

    #[test]
    fn parses_tool_api_shape() {
        let tx: Transaction = serde_json::from_value(wire("2024-06-01T10:00:00Z", 15.99)).unwrap();
        assert_eq!(tx.id, "t001");
        assert_eq!(tx.posted_at, Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
        assert_eq!(tx.payment_rail, Some(PaymentRail::Card));
        assert!(!tx.is_pending);
        assert!(tx.is_posted_debit());
    }

    #[test]
    fn accepts_naive_timestamps_as_utc() {
        let tx: Transaction = serde_json::from_value(wire("2024-06-01T10:00:00", 1.0)).unwrap();
        assert_eq!(tx.posted_at, Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn rejects_negative_amounts() {
        let res = serde_json::from_value::<Transaction>(wire("2024-06-01T10:00:00Z", -3.0));
        assert!(res.is_err());
    }
}
