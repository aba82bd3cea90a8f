use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::{AggregationResult, Tenant, TransactionRecord};

/// Sign applied to a receipt: `+1` for a sale, `-1` for anything else.
///
/// Refunds are the only non-sale type seen in practice, but unknown types
/// are subtracted too rather than dropped.
pub fn money_factor(record: &TransactionRecord) -> Decimal {
    if record.is_sale() {
        Decimal::ONE
    } else {
        Decimal::NEGATIVE_ONE
    }
}

/// Signed sum of receipt totals, rounded half away from zero to 2 places.
pub fn net_sales(records: &[TransactionRecord]) -> Decimal {
    let total: Decimal = records
        .iter()
        .map(|record| record.total_money * money_factor(record))
        .sum();
    total.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Net sales for one outlet and business date.
pub fn aggregate(
    tenant: &Tenant,
    business_date: NaiveDate,
    records: &[TransactionRecord],
) -> AggregationResult {
    AggregationResult {
        lot_code: tenant.lot_code.clone(),
        business_date,
        net_amount: net_sales(records),
    }
}
