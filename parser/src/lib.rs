pub mod config;
pub mod error;
pub mod model;
pub mod mt940;
pub mod sanitize;

pub use crate::config::ParserConfig;
pub use crate::error::{FieldIssue, ParseError};
pub use crate::model::{DebitCredit, Statement, StatementBuilder, Transaction};
pub use crate::mt940::{DescriptionDetails, Engine, EngineKind, EngineSelector, Mt940Parser};

/// Разбирает сообщение MT940 с настройками по умолчанию
pub fn parse(raw: &str) -> Vec<Statement> {
    Mt940Parser::default().parse(raw)
}
