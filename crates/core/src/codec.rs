//! Sales file codec.
//!
//! The mall parses these files with its own tooling, so the layout is a
//! fixed contract:
//!
//! | Part    | Format                                   | Example               |
//! |---------|------------------------------------------|-----------------------|
//! | name    | `<lot>_<DDMMYYYY>.txt`                   | `LOT001_25122024.txt` |
//! | content | `<lot>\|<DDMMYYYY>\|<amount>`            | `LOT001\|25122024\|65.50` |
//!
//! The amount always has exactly two decimals, no thousands separator and
//! no currency symbol; it is negative when refunds exceed sales. Content is
//! a single line without a trailing newline.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::CoreError;
use crate::model::{AggregationResult, SalesFile};

pub const NAME_DELIMITER: char = '_';
pub const FIELD_DELIMITER: char = '|';
pub const FILE_EXTENSION: &str = "txt";
pub const DATE_FORMAT: &str = "%d%m%Y";

pub fn encode_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn encode_file_name(lot_code: &str, date_ddmmyyyy: &str) -> String {
    format!("{lot_code}{NAME_DELIMITER}{date_ddmmyyyy}.{FILE_EXTENSION}")
}

pub fn encode_file_content(lot_code: &str, date_ddmmyyyy: &str, amount: Decimal) -> String {
    format!(
        "{lot_code}{FIELD_DELIMITER}{date_ddmmyyyy}{FIELD_DELIMITER}{}",
        format_amount(amount)
    )
}

/// Inverse of [`encode_file_content`].
pub fn parse_file_content(content: &str) -> Result<(String, String, Decimal), CoreError> {
    let line = content.trim_end_matches(['\r', '\n']);
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    let [lot_code, date, amount] = fields.as_slice() else {
        return Err(CoreError::InvalidContent(format!(
            "expected 3 '{FIELD_DELIMITER}'-separated fields, found {}",
            fields.len()
        )));
    };

    if lot_code.is_empty() {
        return Err(CoreError::InvalidContent("empty lot code".into()));
    }
    parse_date(date)?;
    let amount = parse_amount(amount)?;

    Ok((lot_code.to_string(), date.to_string(), amount))
}

/// Parse a `DDMMYYYY` business date.
pub fn parse_date(date_ddmmyyyy: &str) -> Result<NaiveDate, CoreError> {
    let invalid = || CoreError::InvalidContent(format!("bad business date '{date_ddmmyyyy}'"));
    if date_ddmmyyyy.len() != 8 || !date_ddmmyyyy.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let day: u32 = date_ddmmyyyy[0..2].parse().map_err(|_| invalid())?;
    let month: u32 = date_ddmmyyyy[2..4].parse().map_err(|_| invalid())?;
    let year: i32 = date_ddmmyyyy[4..8].parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Render an amount with exactly two decimals.
///
/// Example: 65.5 → "65.50", -7.3 → "-7.30", 0 → "0.00" (never "-0.00")
pub fn format_amount(amount: Decimal) -> String {
    let mut fixed = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    fixed.rescale(2);
    if fixed.is_zero() {
        fixed.set_sign_positive(true);
    }
    fixed.to_string()
}

/// Parse a fixed two-decimal amount back into a `Decimal`.
///
/// Inverse of [`format_amount`]. Anything other than `-?digits.dd` is rejected.
pub fn parse_amount(s: &str) -> Result<Decimal, CoreError> {
    let invalid = || CoreError::InvalidAmount(s.to_string());
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (whole, frac) = unsigned.split_once('.').ok_or_else(invalid)?;
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || frac.len() != 2 || !digits(frac) {
        return Err(invalid());
    }
    Decimal::from_str(s).map_err(|_| invalid())
}

impl SalesFile {
    pub fn render(result: &AggregationResult) -> Self {
        let date = result.date_ddmmyyyy();
        Self {
            name: encode_file_name(&result.lot_code, &date),
            content: encode_file_content(&result.lot_code, &date, result.net_amount),
        }
    }
}
