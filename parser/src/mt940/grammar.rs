use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rust_decimal::Decimal;

use crate::model::DebitCredit;
use crate::sanitize::{parse_yymmdd, sanitize_account, sanitize_debit_credit, signed_amount};

/// Таблица "тег -> шаблон -> санитайзер" одного движка.
///
/// Банковские движки подменяют отдельные шаблоны (данные), а не код разбора.
/// Шаблоны `:61:` используют именованные группы: `value`, `entry`, `mark`,
/// `funds`, `amount`, `kind`, `code`, `rest`, `reference`, `bank_reference`;
/// любая из групп кроме `value`, `mark` и `amount` может отсутствовать.
#[derive(Debug, Clone)]
pub struct Grammar {
    /// `:20:`
    pub reference: Regex,
    /// `:25:`
    pub account: Regex,
    /// `:28C:`
    pub number: Regex,
    /// `:60F:` / `:60M:`
    pub opening_balance: Regex,
    /// `:62F:` / `:62M:`
    pub closing_balance: Regex,
    /// `:64:`
    pub available_balance: Regex,
    /// `:61:`
    pub tag_61: Regex,
    /// `:86:` для описания; однострочный или с продолжениями
    pub tag_86: Regex,
    /// `:86:` для имени счёта (первая строка)
    pub account_name: Regex,
    /// санитайзер счёта для `:25:` и `:61:`
    pub account_sanitizer: fn(&str) -> String,
}

fn re(pattern: &str) -> Regex {
    // шаблоны статические, ошибка здесь - ошибка в исходниках
    Regex::new(pattern).unwrap()
}

const BALANCE_BODY: &str =
    r"(?P<mark>[CD])(?P<date>\d{6})(?P<currency>[A-Z]{3})(?P<amount>[\d,\.]+)";

/// Грамматика движка по умолчанию
pub static GENERAL_GRAMMAR: Lazy<Grammar> = Lazy::new(|| Grammar {
    reference: re(r"(?m)^:20:([^\n]+)"),
    account: re(r"(?m)^:25:([0-9A-Za-z]+)"),
    number: re(r"(?m)^:28C?:([^\n]*)"),
    opening_balance: re(&format!(r"(?m)^:60[FM]:{BALANCE_BODY}")),
    closing_balance: re(&format!(r"(?m)^:62[FM]:{BALANCE_BODY}")),
    available_balance: re(&format!(r"(?m)^:64:{BALANCE_BODY}")),
    tag_61: re(concat!(
        r"(?m)^:61:(?P<value>\d{6})(?P<entry>\d{4})?",
        r"(?P<mark>R?[A-Za-z])(?P<funds>[A-Z])?(?P<amount>\d+,?\d*)",
        r"(?P<kind>[FNS])?(?P<code>[A-Z]{3})?(?P<rest>.*)$",
    )),
    tag_86: re(r"(?m)^:86:(.*)$"),
    account_name: re(r"(?m)^:86:(.*)$"),
    account_sanitizer: sanitize_account,
});

/// Первая группа захвата или пустая строка
pub fn first_capture(pattern: &Regex, block: &str) -> String {
    pattern
        .captures(block)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn named(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Строка баланса `:60F:` / `:62F:` / `:64:`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceLine {
    pub direction: DebitCredit,
    pub date: Option<NaiveDate>,
    pub currency: String,
    /// сумма уже со знаком
    pub amount: Decimal,
}

impl BalanceLine {
    pub fn capture(pattern: &Regex, block: &str) -> Option<Self> {
        let caps = pattern.captures(block)?;

        // шаблон допускает только C/D, так что ошибки здесь нет
        let direction = sanitize_debit_credit(&caps["mark"]).ok()?;
        let date = parse_yymmdd(&caps["date"]);
        let amount = signed_amount(&caps["amount"], direction).unwrap_or_else(|| {
            tracing::warn!(raw = &caps["amount"], "unparsable balance amount");
            Decimal::ZERO
        });

        Some(BalanceLine {
            direction,
            date,
            currency: caps["currency"].to_string(),
            amount,
        })
    }
}

/// Разобранная строка `:61:`, значения ещё сырые
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag61 {
    /// value date, YYMMDD
    pub value_date: String,
    /// entry date, MMDD
    pub entry_date: Option<String>,
    /// признак C/D как есть, напр. "D", "RC", "X"
    pub mark: String,
    /// funds code после признака, если есть
    pub funds_code: Option<String>,
    /// сумма как в файле, "1500,00"
    pub amount: String,
    /// буква типа операции (F, N, S)
    pub kind: Option<String>,
    /// код операции после буквы типа
    pub code: Option<String>,
    /// customer reference
    pub reference: String,
    /// bank reference (после `//`)
    pub bank_reference: String,
    /// хвост строки после кода
    pub rest: String,
}

impl Tag61 {
    pub fn capture(pattern: &Regex, block: &str) -> Option<Self> {
        let caps = pattern.captures(block)?;

        let rest = named(&caps, "rest");
        let (split_reference, split_bank_reference) = rest
            .as_deref()
            .map(split_references)
            .unwrap_or_default();

        let reference = named(&caps, "reference").unwrap_or(split_reference);
        let bank_reference = named(&caps, "bank_reference").unwrap_or(split_bank_reference);

        let rest = rest.unwrap_or_else(|| {
            if bank_reference.is_empty() {
                reference.clone()
            } else {
                format!("{reference}//{bank_reference}")
            }
        });

        Some(Tag61 {
            value_date: named(&caps, "value").unwrap_or_default(),
            entry_date: named(&caps, "entry"),
            mark: named(&caps, "mark").unwrap_or_default(),
            funds_code: named(&caps, "funds"),
            amount: named(&caps, "amount").unwrap_or_default(),
            kind: named(&caps, "kind"),
            code: named(&caps, "code"),
            reference,
            bank_reference,
            rest,
        })
    }

    /// Код операции: буква типа + код, напр. "NMSC"
    pub fn transaction_code(&self) -> String {
        format!(
            "{}{}",
            self.kind.as_deref().unwrap_or(""),
            self.code.as_deref().unwrap_or("")
        )
    }
}

/// "NONREF//REF123 extra" -> ("NONREF", "REF123")
fn split_references(rest: &str) -> (String, String) {
    match rest.split_once("//") {
        Some((customer, bank)) => {
            let bank = bank.split_whitespace().next().unwrap_or("");
            (customer.trim().to_string(), bank.to_string())
        }
        None => (rest.trim().to_string(), String::new()),
    }
}
