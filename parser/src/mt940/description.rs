use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static BANK_REFERENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\S+)\s+(.*)$").unwrap());

static PAYMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)-([A-Z]{3})\s+(.+)").unwrap());

/// Структурный разбор описания `:86:` вида
/// `CODE/TYPE/INTERNAL_REF/BANK_REF 12345-IDR RECIPIENT NAME`.
///
/// Части, которые не удалось найти, остаются `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DescriptionDetails {
    pub transaction_code: Option<String>,
    pub transaction_type: Option<String>,
    pub internal_reference: Option<String>,
    pub bank_reference: Option<String>,
    pub payment_reference: Option<String>,
    pub currency: Option<String>,
    pub recipient: Option<String>,
}

impl DescriptionDetails {
    /// Возвращает `None`, если описание не делится на четыре части по `/`
    pub fn parse(description: &str) -> Option<Self> {
        let line = description.trim();
        let line = line.strip_prefix(":86:").unwrap_or(line);

        let parts: Vec<&str> = line.splitn(4, '/').collect();
        if parts.len() != 4 {
            return None;
        }

        let mut details = DescriptionDetails {
            transaction_code: Some(parts[0].trim().to_string()),
            transaction_type: Some(parts[1].trim().to_string()),
            internal_reference: Some(parts[2].trim().to_string()),
            ..DescriptionDetails::default()
        };

        let rest = parts[3].trim();
        if let Some(caps) = BANK_REFERENCE_RE.captures(rest) {
            details.bank_reference = Some(caps[1].to_string());

            if let Some(payment) = PAYMENT_RE.captures(&caps[2]) {
                details.payment_reference = Some(payment[1].to_string());
                details.currency = Some(payment[2].to_string());
                details.recipient = Some(payment[3].trim().to_string());
            }
        }

        Some(details)
    }
}
