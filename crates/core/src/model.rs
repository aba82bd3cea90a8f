use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Receipt type the POS uses for a completed sale. Everything else subtracts.
pub const SALE_RECEIPT_TYPE: &str = "SALE";

/// A mall outlet: POS store name plus the lot code assigned by the mall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    pub name: String,
    pub lot_code: String,
}

impl Tenant {
    pub fn new(name: impl Into<String>, lot_code: impl Into<String>) -> Self {
        Self { name: name.into(), lot_code: lot_code.into() }
    }
}

/// The fields of a POS receipt that feed the daily figure.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Upstream receipt number, kept for log lines only.
    pub receipt_number: String,
    pub receipt_type: String,
    pub total_money: Decimal,
}

impl TransactionRecord {
    pub fn new(receipt_type: impl Into<String>, total_money: Decimal) -> Self {
        Self {
            receipt_number: String::new(),
            receipt_type: receipt_type.into(),
            total_money,
        }
    }

    pub fn is_sale(&self) -> bool {
        self.receipt_type == SALE_RECEIPT_TYPE
    }
}

/// Net sales of one outlet for one business date.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    pub lot_code: String,
    pub business_date: NaiveDate,
    /// Always rounded to two decimal places.
    pub net_amount: Decimal,
}

impl AggregationResult {
    /// Business date as the mall writes it (`DDMMYYYY`).
    pub fn date_ddmmyyyy(&self) -> String {
        crate::codec::encode_date(self.business_date)
    }
}

/// Name and body of the text file submitted to the mall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesFile {
    pub name: String,
    pub content: String,
}
