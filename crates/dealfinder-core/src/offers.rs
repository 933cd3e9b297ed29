use std::cmp::Ordering;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Display text for an offer whose price could not be determined.
pub const CHECK_WEBSITE: &str = "Check website";

const PLACEHOLDER_IMAGE_BASE: &str = "https://placehold.co/300x200/e5e7eb/6b7280?text=";
const PLACEHOLDER_TITLE_CHARS: usize = 30;

/// A price that is either a known decimal amount or unknown.
///
/// Ordering places every `Known` value before `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceValue {
    Known(Decimal),
    Unknown,
}

impl PriceValue {
    #[must_use]
    pub fn known(&self) -> Option<Decimal> {
        match self {
            PriceValue::Known(d) => Some(*d),
            PriceValue::Unknown => None,
        }
    }
}

impl Ord for PriceValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PriceValue::Known(a), PriceValue::Known(b)) => a.cmp(b),
            (PriceValue::Known(_), PriceValue::Unknown) => Ordering::Less,
            (PriceValue::Unknown, PriceValue::Known(_)) => Ordering::Greater,
            (PriceValue::Unknown, PriceValue::Unknown) => Ordering::Equal,
        }
    }
}

impl PartialOrd for PriceValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for PriceValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.known().and_then(|d| d.to_f64()) {
            Some(v) => serializer.serialize_f64(v),
            None => serializer.serialize_none(),
        }
    }
}

/// One purchasable listing, normalized across retailers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offer {
    pub title: String,
    pub price_display: String,
    pub price_value: PriceValue,
    pub source: String,
    pub url: String,
    pub image: Option<String>,
}

impl Offer {
    /// The offer image, or a generated placeholder labelled with the title.
    #[must_use]
    pub fn display_image(&self) -> String {
        match self.image.as_deref() {
            Some(image) if !image.is_empty() => image.to_string(),
            _ => {
                let label: String = self.title.chars().take(PLACEHOLDER_TITLE_CHARS).collect();
                format!(
                    "{PLACEHOLDER_IMAGE_BASE}{}",
                    utf8_percent_encode(&label, NON_ALPHANUMERIC)
                )
            }
        }
    }
}

/// Format a decimal as US dollars with thousands separators and two decimals.
///
/// `1299.9` becomes `$1,299.90`.
#[must_use]
pub fn format_usd(value: Decimal) -> String {
    let fixed = format!("{:.2}", value.round_dp(2));
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (whole, cents) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}${grouped}.{cents}")
}
