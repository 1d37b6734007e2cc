use once_cell::sync::Lazy;
use regex::Regex;

use super::Engine;
use super::grammar::{GENERAL_GRAMMAR, Grammar, Tag61};

/// Грамматика HSBC: 4-буквенный тип операции в `:61:`, референсы через `//`,
/// многострочный `:86:` и счета с BIC-префиксом.
pub static HSBC_GRAMMAR: Lazy<Grammar> = Lazy::new(|| Grammar {
    account: Regex::new(r"(?m)^:25:([A-Za-z0-9/.\-]+)").unwrap(),
    tag_61: Regex::new(concat!(
        r"(?m)^:61:(?P<value>\d{6})(?P<entry>\d{4})?",
        r"(?P<mark>R?[A-Za-z])(?P<funds>[A-Z])?(?P<amount>\d+,\d{0,2})",
        r"(?P<code>[A-Z][A-Z0-9]{3})(?P<reference>[^/\n]*)(?://?(?P<bank_reference>[^\n]*))?$",
    ))
    .unwrap(),
    tag_86: Regex::new(r"(?ms)^:86:(.*)").unwrap(),
    account_sanitizer: sanitize_hsbc_account,
    ..(*GENERAL_GRAMMAR).clone()
});

/// Счёт HSBC: отбрасывает `BIC/` префикс, точки и дефисы, ведущие нули
pub fn sanitize_hsbc_account(raw: &str) -> String {
    let raw = raw.trim().to_uppercase();
    let account = raw.rsplit('/').next().unwrap_or("");
    let account: String = account.chars().filter(|c| *c != '.' && *c != '-').collect();

    let trimmed = account.trim_start_matches('0');
    if trimmed.is_empty() && !account.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// HSBC (Индонезия)
#[derive(Debug, Clone, Copy, Default)]
pub struct Hsbc;

impl Engine for Hsbc {
    fn bank(&self) -> &'static str {
        "HSBC"
    }

    fn is_applicable(&self, raw: &str) -> bool {
        raw.contains("HSBC") && raw.contains(":61:") && raw.contains(":86:")
    }

    fn grammar(&self) -> &Grammar {
        &HSBC_GRAMMAR
    }

    /// У HSBC счёт контрагента лежит в customer reference
    fn transaction_account(&self, line: &Tag61) -> String {
        (self.grammar().account_sanitizer)(&line.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DebitCredit;
    use crate::mt940::parse_transaction;
    use rust_decimal::Decimal;

    #[test]
    fn applicable_only_with_marker_and_both_tags() {
        assert!(Hsbc.is_applicable("{1:F01HSBCIDJAXXX}\n:20:R\n:61:x\n:86:y"));
        assert!(!Hsbc.is_applicable(":20:R\n:61:x\n:86:y"));
        assert!(!Hsbc.is_applicable("HSBC\n:20:R\n:61:x"));
    }

    #[test]
    fn hsbc_account_strips_bic_and_leading_zeros() {
        assert_eq!(sanitize_hsbc_account("HSBCIDJA/001-234.567"), "1234567");
        assert_eq!(sanitize_hsbc_account(" 000123 "), "123");
        assert_eq!(sanitize_hsbc_account("000"), "0");
        assert_eq!(sanitize_hsbc_account(""), "");
        assert_eq!(Hsbc.statement_account(":20:R\n:25:HSBCIDJA/0012345"), "12345");
    }

    #[test]
    fn hsbc_tag_61_with_references() {
        let tag = Hsbc
            .transaction_line(":61:2506300630D1500,00NTRF00778899//HSB55123\n:86:X")
            .unwrap();

        assert_eq!(tag.value_date, "250630");
        assert_eq!(tag.entry_date.as_deref(), Some("0630"));
        assert_eq!(tag.mark, "D");
        assert_eq!(tag.amount, "1500,00");
        assert_eq!(tag.code.as_deref(), Some("NTRF"));
        assert_eq!(tag.reference, "00778899");
        assert_eq!(tag.bank_reference, "HSB55123");
        assert_eq!(Hsbc.transaction_code(&tag), "NTRF");
        assert_eq!(Hsbc.transaction_account(&tag), "778899");
        assert_eq!(Hsbc.transaction_debit_credit(&tag), Ok(DebitCredit::Debit));
        assert_eq!(crate::sanitize::sanitize_amount(&tag.amount), Some(Decimal::new(150000, 2)));
    }

    #[test]
    fn hsbc_tag_61_without_bank_reference() {
        let tag = Hsbc.transaction_line(":61:250630C250,50NMSCNONREF").unwrap();

        assert_eq!(tag.reference, "NONREF");
        assert_eq!(tag.bank_reference, "");
        assert_eq!(tag.rest, "NONREF");
    }

    #[test]
    fn hsbc_code_never_eats_amount_digits() {
        let tx = parse_transaction(&Hsbc, ":61:250630D1500,55TRF\n:86:X", false);

        assert_eq!(tx.amount, Decimal::new(150055, 2));
        assert_eq!(tx.debit_credit, Some(DebitCredit::Debit));
        assert_eq!(tx.transaction_code, "TRF");
        assert!(tx.issues.is_empty());
    }

    #[test]
    fn hsbc_line_without_code_falls_back_to_general_pattern() {
        let tx = parse_transaction(&Hsbc, ":61:250630D1500,00\n:86:X", false);

        assert_eq!(tx.debit_credit, Some(DebitCredit::Debit));
        assert_eq!(tx.amount, Decimal::new(150000, 2));
        assert_eq!(tx.value_timestamp, 1_751_241_600);
        assert_eq!(tx.transaction_code, "");
        assert!(tx.issues.is_empty());
    }

    #[test]
    fn hsbc_description_joins_continuation_lines() {
        let block = ":61:250630D1,00NTRFREF//B\n:86:NOTE ONE\nNOTE TWO";
        assert_eq!(Hsbc.transaction_description(block), "NOTE ONE NOTE TWO");
        assert_eq!(Hsbc.transaction_account_name(block), "NOTE ONE");
    }
}
