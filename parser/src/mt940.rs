mod description;
mod general;
mod grammar;
mod hsbc;
mod segment;
mod selector;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::ParserConfig;
use crate::error::{FieldIssue, ParseError};
use crate::model::{DebitCredit, Statement, StatementBuilder, Transaction};
use crate::sanitize::{
    parse_yymmdd, sanitize_account_name, sanitize_amount, sanitize_debit_credit,
    sanitize_description, sanitize_entry_timestamp, to_timestamp,
};

pub use description::DescriptionDetails;
pub use general::General;
pub use grammar::{BalanceLine, GENERAL_GRAMMAR, Grammar, Tag61, first_capture};
pub use hsbc::{HSBC_GRAMMAR, Hsbc, sanitize_hsbc_account};
pub use segment::{segment_statements, segment_transactions, strip_envelope};
pub use selector::{EngineKind, EngineSelector, select};

/// Стратегия разбора MT940 конкретного банка.
///
/// Общий порядок разбора (сегментация, сборка объектов) живёт в
/// [`parse_statements`] и не переопределяется. Движок отдаёт свою
/// [`Grammar`] и при необходимости переопределяет отдельные шаги.
/// Все шаги получают текущий блок явным параметром.
pub trait Engine: Send + Sync {
    /// Имя банка, попадает в [`Statement::bank`]
    fn bank(&self) -> &'static str;

    /// Подходит ли движок для этого сообщения
    fn is_applicable(&self, raw: &str) -> bool;

    /// Таблица шаблонов тегов
    fn grammar(&self) -> &Grammar;

    // ---- поля выписки ----

    fn statement_reference_number(&self, block: &str) -> String {
        first_capture(&self.grammar().reference, block)
    }

    fn statement_account(&self, block: &str) -> String {
        let raw = first_capture(&self.grammar().account, block);
        (self.grammar().account_sanitizer)(&raw)
    }

    fn statement_number(&self, block: &str) -> String {
        first_capture(&self.grammar().number, block)
    }

    fn statement_opening_balance(&self, block: &str) -> Option<BalanceLine> {
        BalanceLine::capture(&self.grammar().opening_balance, block)
    }

    fn statement_closing_balance(&self, block: &str) -> Option<BalanceLine> {
        BalanceLine::capture(&self.grammar().closing_balance, block)
    }

    fn statement_available_balance(&self, block: &str) -> Option<BalanceLine> {
        BalanceLine::capture(&self.grammar().available_balance, block)
    }

    // ---- поля проводки ----

    /// Строка `:61:` по шаблону движка. Если банковский шаблон не подошёл,
    /// пробуем номинальный, чтобы не терять остальные поля проводки.
    fn transaction_line(&self, block: &str) -> Option<Tag61> {
        Tag61::capture(&self.grammar().tag_61, block).or_else(|| {
            let line = Tag61::capture(&GENERAL_GRAMMAR.tag_61, block)?;
            tracing::debug!(bank = self.bank(), "bank :61: pattern missed, nominal one used");
            Some(line)
        })
    }

    fn transaction_account(&self, line: &Tag61) -> String {
        (self.grammar().account_sanitizer)(&line.rest)
    }

    fn transaction_account_name(&self, block: &str) -> String {
        sanitize_account_name(&first_capture(&self.grammar().account_name, block))
    }

    fn transaction_description(&self, block: &str) -> String {
        let raw = self
            .grammar()
            .tag_86
            .captures(block)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .unwrap_or("");

        sanitize_description(raw)
    }

    fn transaction_code(&self, line: &Tag61) -> String {
        line.transaction_code()
    }

    fn transaction_debit_credit(&self, line: &Tag61) -> Result<DebitCredit, FieldIssue> {
        sanitize_debit_credit(&line.mark)
    }

    fn transaction_value_date(&self, line: &Tag61) -> Option<NaiveDate> {
        parse_yymmdd(&line.value_date)
    }

    /// Дата проводки. MMDD наследует год даты валютирования,
    /// без entry date берётся сама дата валютирования.
    fn transaction_entry_timestamp(&self, line: &Tag61, value_date: Option<NaiveDate>) -> i64 {
        match line.entry_date.as_deref() {
            Some(entry) => sanitize_entry_timestamp(entry, value_date).unwrap_or_default(),
            None => value_date.map(to_timestamp).unwrap_or_default(),
        }
    }
}

/// Разбирает всё сообщение выбранным движком.
///
/// Никогда не падает: пустой вход или вход без `:20:` дают пустой вектор,
/// кривые поля получают значения по умолчанию.
pub fn parse_statements(engine: &dyn Engine, raw: &str, keep_raw_data: bool) -> Vec<Statement> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let statements: Vec<Statement> = segment_statements(raw)
        .iter()
        .map(|block| parse_statement(engine, block, keep_raw_data))
        .collect();

    tracing::debug!(
        bank = engine.bank(),
        statements = statements.len(),
        "mt940 message parsed"
    );

    statements
}

/// Разбирает один блок выписки (от `:20:` до следующего `:20:`)
pub fn parse_statement(engine: &dyn Engine, block: &str, keep_raw_data: bool) -> Statement {
    let opening = engine.statement_opening_balance(block);
    let closing = engine.statement_closing_balance(block);
    let available = engine.statement_available_balance(block);

    let currency = opening
        .as_ref()
        .or(closing.as_ref())
        .map(|b| b.currency.clone())
        .unwrap_or_default();

    let timestamp = |balance: &Option<BalanceLine>| {
        balance
            .as_ref()
            .and_then(|b| b.date)
            .map(to_timestamp)
            .unwrap_or_default()
    };

    let mut builder = StatementBuilder::new(engine.bank())
        .reference_number(engine.statement_reference_number(block))
        .account(engine.statement_account(block))
        .number(engine.statement_number(block))
        .currency(currency)
        .opening_balance(opening.as_ref().map(|b| b.amount).unwrap_or_default())
        .closing_balance(closing.as_ref().map(|b| b.amount).unwrap_or_default())
        .closing_available_balance(available.map(|b| b.amount))
        .opening_timestamp(timestamp(&opening))
        .closing_timestamp(timestamp(&closing))
        .raw_data(keep_raw_data.then(|| block.to_string()));

    for tx_block in segment_transactions(block) {
        builder.push_transaction(parse_transaction(engine, &tx_block, keep_raw_data));
    }

    let statement = builder.build();

    tracing::debug!(
        bank = statement.bank(),
        reference = statement.reference_number(),
        account = statement.account(),
        transactions = statement.transactions().len(),
        "mt940 statement parsed"
    );

    statement
}

/// Разбирает блок одной проводки (`:61:` + `:86:`).
///
/// Проводка попадает в выписку всегда, даже с невалидным признаком дебет/кредит.
pub fn parse_transaction(engine: &dyn Engine, block: &str, keep_raw_data: bool) -> Transaction {
    let mut issues: Vec<FieldIssue> = Vec::new();
    let line = engine.transaction_line(block);

    let (debit_credit, amount, value_date) = match &line {
        Some(line) => {
            let debit_credit = match engine.transaction_debit_credit(line) {
                Ok(dc) => Some(dc),
                Err(issue) => {
                    tracing::error!(bank = engine.bank(), %issue, "invalid mt940 transaction");
                    issues.push(issue);
                    None
                }
            };

            let amount = sanitize_amount(&line.amount).unwrap_or_else(|| {
                tracing::warn!(raw = %line.amount, "unparsable :61: amount");
                Decimal::ZERO
            });

            let value_date = engine.transaction_value_date(line);
            if value_date.is_none() {
                tracing::warn!(raw = %line.value_date, "unparsable :61: value date");
            }

            (debit_credit, amount, value_date)
        }
        None => {
            let first_line = block.lines().next().unwrap_or_default();
            let issue = FieldIssue::UnrecognisedLine(first_line.to_string());
            tracing::error!(bank = engine.bank(), %issue, "unrecognised :61: line");
            issues.push(issue);
            (None, Decimal::ZERO, None)
        }
    };

    let (account, transaction_code, reference, bank_reference, entry_timestamp) = match &line {
        Some(line) => (
            engine.transaction_account(line),
            engine.transaction_code(line),
            line.reference.clone(),
            line.bank_reference.clone(),
            engine.transaction_entry_timestamp(line, value_date),
        ),
        None => Default::default(),
    };

    Transaction {
        account,
        account_name: engine.transaction_account_name(block),
        amount,
        debit_credit,
        description: engine.transaction_description(block),
        transaction_code,
        reference,
        bank_reference,
        value_timestamp: value_date.map(to_timestamp).unwrap_or_default(),
        entry_timestamp,
        issues,
        raw_data: keep_raw_data.then(|| block.to_string()),
    }
}

/// Точка входа для вызывающего кода.
///
/// Пример:
/// ```rust
/// use mt940_parser::Mt940Parser;
///
/// let raw = ":20:REF\n:25:123\n:60F:C250629EUR10,00\n:61:250630D1500,00NMSCNONREF//REF123\n";
/// let statements = Mt940Parser::default().parse(raw);
/// assert_eq!(statements.len(), 1);
/// assert_eq!(statements[0].transactions().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Mt940Parser {
    config: ParserConfig,
}

impl Mt940Parser {
    pub fn new(config: ParserConfig) -> Self {
        Mt940Parser { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Движок для этого сообщения с учётом настроек
    pub fn select_engine(&self, raw: &str) -> EngineKind {
        match self.config.force_engine {
            Some(kind) => kind,
            None => self.config.selector().select(raw),
        }
    }

    /// Разбирает сообщение. Пустой результат - не ошибка.
    pub fn parse(&self, raw: &str) -> Vec<Statement> {
        let kind = self.select_engine(raw);
        parse_statements(kind.engine(), raw, self.config.keep_raw_data)
    }

    /// Как [`Mt940Parser::parse`], но непустой вход без единой выписки
    /// возвращает [`ParseError::NoStatements`].
    pub fn parse_checked(&self, raw: &str) -> Result<Vec<Statement>, ParseError> {
        let statements = self.parse(raw);

        if statements.is_empty() && !raw.trim().is_empty() {
            tracing::warn!("non-empty input produced no mt940 statements");
            return Err(ParseError::NoStatements);
        }

        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JUNE_30_2025: i64 = 1_751_241_600;

    #[test]
    fn parse_transaction_debit_line() {
        let tx = parse_transaction(
            &General,
            ":61:250630D1500,00NMSCNONREF//REF123\n:86:Payment text",
            false,
        );

        assert_eq!(tx.debit_credit, Some(DebitCredit::Debit));
        assert_eq!(tx.amount, Decimal::new(150000, 2));
        assert_eq!(tx.value_timestamp, JUNE_30_2025);
        assert_eq!(tx.entry_timestamp, JUNE_30_2025);
        assert_eq!(tx.transaction_code, "NMSC");
        assert_eq!(tx.account, "NONREF//REF123");
        assert_eq!(tx.reference, "NONREF");
        assert_eq!(tx.bank_reference, "REF123");
        assert_eq!(tx.description, "Payment text");
        assert_eq!(tx.account_name, "Payment text");
        assert!(tx.issues.is_empty());
        assert!(tx.raw_data.is_none());
    }

    #[test]
    fn parse_transaction_credit_line() {
        let tx = parse_transaction(&General, ":61:250630C250,50NTRFABC", false);

        assert_eq!(tx.debit_credit, Some(DebitCredit::Credit));
        assert_eq!(tx.amount, Decimal::new(25050, 2));
        assert_eq!(tx.description, "");
    }

    #[test]
    fn parse_transaction_flags_invalid_mark() {
        let tx = parse_transaction(&General, ":61:250630X1500,00NMSC", true);

        assert_eq!(tx.debit_credit, None);
        assert_eq!(tx.issues, vec![FieldIssue::InvalidDebitCredit("X".into())]);
        // остальные поля разбираются независимо
        assert_eq!(tx.amount, Decimal::new(150000, 2));
        assert_eq!(tx.value_timestamp, JUNE_30_2025);
        assert_eq!(tx.raw_data.as_deref(), Some(":61:250630X1500,00NMSC"));
    }

    #[test]
    fn parse_transaction_unrecognised_line_is_flagged_not_dropped() {
        let tx = parse_transaction(&General, ":61:garbage\n:86:text", false);

        assert_eq!(tx.debit_credit, None);
        assert_eq!(tx.issues, vec![FieldIssue::UnrecognisedLine(":61:garbage".into())]);
        assert_eq!(tx.amount, Decimal::ZERO);
        assert_eq!(tx.value_timestamp, 0);
        assert_eq!(tx.description, "text");
    }

    #[test]
    fn parse_transaction_lowercase_mark_is_valid() {
        let tx = parse_transaction(&General, ":61:250630d1,00NMSC", false);

        assert_eq!(tx.debit_credit, Some(DebitCredit::Debit));
        assert_eq!(tx.amount, Decimal::ONE);
        assert_eq!(tx.transaction_code, "NMSC");
        assert!(tx.issues.is_empty());
    }

    #[test]
    fn parse_transaction_entry_date_uses_value_year() {
        let tx = parse_transaction(&General, ":61:2412311231D1,00NMSC\n", false);
        assert_eq!(tx.entry_timestamp, tx.value_timestamp);

        let tx = parse_transaction(&General, ":61:2412310102D1,00NMSC\n", false);
        // 2025-01-02
        assert_eq!(tx.entry_timestamp, 1_735_776_000);
    }

    #[test]
    fn parse_statement_extracts_header_fields() {
        let block = ":20:STARTUMS\n:25:12XX3456\n:28C:00014/001\n\
                     :60F:D250629EUR1000,00\n\
                     :61:250630C250,50NTRFABC\n\
                     :62F:C250630EUR500,25\n:64:C250630EUR400,00";

        let statement = parse_statement(&General, block, false);

        assert_eq!(statement.bank(), "General");
        assert_eq!(statement.reference_number(), "STARTUMS");
        assert_eq!(statement.account(), "12XX3456");
        assert_eq!(statement.number(), "00014/001");
        assert_eq!(statement.currency(), "EUR");
        assert_eq!(statement.opening_balance(), Decimal::new(-100000, 2));
        assert_eq!(statement.closing_balance(), Decimal::new(50025, 2));
        assert_eq!(statement.closing_available_balance(), Some(Decimal::new(40000, 2)));
        assert_eq!(statement.opening_timestamp(), JUNE_30_2025 - 86_400);
        assert_eq!(statement.closing_timestamp(), JUNE_30_2025);
        assert_eq!(statement.transactions().len(), 1);
        assert!(statement.raw_data().is_none());
    }

    #[test]
    fn parse_statement_defaults_missing_fields() {
        let statement = parse_statement(&General, ":20:ONLYREF", true);

        assert_eq!(statement.reference_number(), "ONLYREF");
        assert_eq!(statement.account(), "");
        assert_eq!(statement.number(), "");
        assert_eq!(statement.currency(), "");
        assert_eq!(statement.opening_balance(), Decimal::ZERO);
        assert_eq!(statement.opening_timestamp(), 0);
        assert!(statement.transactions().is_empty());
        assert_eq!(statement.raw_data(), Some(":20:ONLYREF"));
    }

    #[test]
    fn parser_forced_engine_overrides_selection() {
        let raw = ":20:R\n:25:BICXIDJA/0042\n:61:250630D1,00NTRFA//B\n:86:X";
        let parser = Mt940Parser::new(ParserConfig::default().with_forced_engine(EngineKind::Hsbc));

        assert_eq!(parser.select_engine(raw), EngineKind::Hsbc);
        assert_eq!(parser.parse(raw)[0].account(), "42");
        assert_eq!(Mt940Parser::default().select_engine(raw), EngineKind::General);
    }

    #[test]
    fn parse_checked_reports_non_mt940_input() {
        let parser = Mt940Parser::default();

        assert!(matches!(parser.parse_checked("hello"), Err(ParseError::NoStatements)));
        assert!(parser.parse_checked("").unwrap().is_empty());
        assert_eq!(parser.parse_checked(":20:R").unwrap().len(), 1);
    }

    #[test]
    fn parse_statements_empty_input() {
        assert!(parse_statements(&General, "", false).is_empty());
        assert!(parse_statements(&General, "\n  \n", false).is_empty());
        assert!(parse_statements(&General, ":25:123\n:61:250630D1,00NMSC", false).is_empty());
    }
}
