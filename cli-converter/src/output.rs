use csv::WriterBuilder;
use mt940_parser::sanitize::format_timestamp;
use mt940_parser::{Statement, Transaction};
use serde::Serialize;
use std::io::Write;

use crate::CliError;

/// Строка CSV: одна проводка вместе с реквизитами выписки
#[derive(Debug, Serialize)]
struct TransactionRow<'a> {
    bank: &'a str,
    statement_reference: &'a str,
    statement_account: &'a str,
    currency: &'a str,
    value_date: String,
    entry_date: String,
    debit_credit: String,
    amount: String,
    signed_amount: String,
    transaction_code: &'a str,
    account: &'a str,
    account_name: &'a str,
    reference: &'a str,
    bank_reference: &'a str,
    recipient: String,
    description: &'a str,
    issues: String,
}

impl<'a> TransactionRow<'a> {
    fn new(statement: &'a Statement, tx: &'a Transaction) -> Self {
        let recipient = tx
            .description_details()
            .and_then(|d| d.recipient)
            .unwrap_or_default();

        let issues = tx
            .issues
            .iter()
            .map(|issue| issue.to_string())
            .collect::<Vec<_>>()
            .join("; ");

        TransactionRow {
            bank: statement.bank(),
            statement_reference: statement.reference_number(),
            statement_account: statement.account(),
            currency: statement.currency(),
            value_date: format_timestamp(tx.value_timestamp),
            entry_date: format_timestamp(tx.entry_timestamp),
            debit_credit: tx
                .debit_credit
                .map(|dc| dc.mark().to_string())
                .unwrap_or_default(),
            amount: tx.amount.to_string(),
            signed_amount: tx.signed_amount().map(|a| a.to_string()).unwrap_or_default(),
            transaction_code: &tx.transaction_code,
            account: &tx.account,
            account_name: &tx.account_name,
            reference: &tx.reference,
            bank_reference: &tx.bank_reference,
            recipient,
            description: &tx.description,
            issues,
        }
    }
}

pub(crate) fn write_json<W: Write>(writer: W, statements: &[Statement]) -> Result<(), CliError> {
    serde_json::to_writer_pretty(writer, statements)?;
    Ok(())
}

pub(crate) fn write_csv<W: Write>(writer: W, statements: &[Statement]) -> Result<(), CliError> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);

    for statement in statements {
        for tx in statement.transactions() {
            wtr.serialize(TransactionRow::new(statement, tx))?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Таблица: заголовок выписки, строки проводок (`!` - есть ошибки), закрывающий баланс
pub(crate) fn write_table<W: Write>(mut writer: W, statements: &[Statement]) -> Result<(), CliError> {
    for statement in statements {
        writeln!(
            writer,
            "[{}] {} account {} #{} {}",
            statement.bank(),
            statement.reference_number(),
            statement.account(),
            statement.number(),
            statement.currency(),
        )?;
        writeln!(
            writer,
            "  opening {:>15} on {}",
            statement.opening_balance(),
            format_timestamp(statement.opening_timestamp())
        )?;

        for tx in statement.transactions() {
            let flag = if tx.issues.is_empty() { ' ' } else { '!' };
            writeln!(writer, "{flag} {tx}")?;
        }

        writeln!(
            writer,
            "  closing {:>15} on {}",
            statement.closing_balance(),
            format_timestamp(statement.closing_timestamp())
        )?;
    }

    Ok(())
}
