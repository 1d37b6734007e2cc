use serde::Serialize;
use thiserror::Error;

/// Ошибки уровня одного поля.
///
/// Не прерывают разбор: сохраняются в транзакции ([`crate::Transaction::issues`]),
/// чтобы вызывающий код мог их показать или расследовать.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "raw", rename_all = "snake_case")]
pub enum FieldIssue {
    /// признак дебет/кредит не равен ни `D`, ни `C`
    #[error("wrong value for debit/credit ({0})")]
    InvalidDebitCredit(String),
    /// строка `:61:` не подошла ни под один шаблон
    #[error("unrecognised :61: line ({0})")]
    UnrecognisedLine(String),
}

/// Ошибки при работе с парсером
#[derive(Debug, Error)]
pub enum ParseError {
    /// непустой вход, из которого не удалось выделить ни одной выписки
    #[error("no mt940 statements detected in non-empty input")]
    NoStatements,
    /// неизвестное имя движка в конфигурации
    #[error("unknown mt940 engine: {0}")]
    UnknownEngine(String),
}
