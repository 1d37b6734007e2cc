use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FieldIssue;
use crate::sanitize::format_timestamp;

/// Направление транзакции (Дебет/Кредит)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DebitCredit {
    /// Дебет
    Debit,
    /// Кредит
    Credit,
}

impl DebitCredit {
    /// Однобуквенный код из MT940: `D` или `C`
    pub fn mark(self) -> char {
        match self {
            DebitCredit::Debit => 'D',
            DebitCredit::Credit => 'C',
        }
    }
}

impl fmt::Display for DebitCredit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebitCredit::Credit => write!(f, "Credit"),
            DebitCredit::Debit => write!(f, "Debit"),
        }
    }
}

/// Одна банковская выписка (блок от `:20:` до следующего `:20:`).
///
/// Собирается целиком внутри одного вызова парсера через [`StatementBuilder`],
/// после возврата вызывающему коду не изменяется: поля доступны только на чтение.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statement {
    bank: String,
    reference_number: String,
    account: String,
    number: String,
    currency: String,
    opening_balance: Decimal,
    closing_balance: Decimal,
    closing_available_balance: Option<Decimal>,
    opening_timestamp: i64,
    closing_timestamp: i64,
    transactions: Vec<Transaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_data: Option<String>,
}

impl Statement {
    /// имя движка, разобравшего выписку
    pub fn bank(&self) -> &str {
        &self.bank
    }

    /// `:20:` Transaction Reference Number, может быть пустым
    pub fn reference_number(&self) -> &str {
        &self.reference_number
    }

    /// `:25:` счёт после санитизации
    pub fn account(&self) -> &str {
        &self.account
    }

    /// `:28C:` номер выписки, как есть, например "00014/001"
    pub fn number(&self) -> &str {
        &self.number
    }

    /// код валюты из открывающего баланса
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// открывающий баланс со знаком
    pub fn opening_balance(&self) -> Decimal {
        self.opening_balance
    }

    /// закрывающий баланс со знаком
    pub fn closing_balance(&self) -> Decimal {
        self.closing_balance
    }

    /// `:64:` доступный баланс, если банк его прислал
    pub fn closing_available_balance(&self) -> Option<Decimal> {
        self.closing_available_balance
    }

    pub fn opening_timestamp(&self) -> i64 {
        self.opening_timestamp
    }

    pub fn closing_timestamp(&self) -> i64 {
        self.closing_timestamp
    }

    /// транзакции в порядке появления в тексте
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// исходный текст блока (только при `keep_raw_data`)
    pub fn raw_data(&self) -> Option<&str> {
        self.raw_data.as_deref()
    }
}

/// Сборщик [`Statement`]. Живёт только внутри одного разбора.
#[derive(Debug, Default)]
pub struct StatementBuilder {
    inner: Statement,
}

impl StatementBuilder {
    pub fn new(bank: impl Into<String>) -> Self {
        let mut builder = StatementBuilder::default();
        builder.inner.bank = bank.into();
        builder
    }

    pub fn reference_number(mut self, value: String) -> Self {
        self.inner.reference_number = value;
        self
    }

    pub fn account(mut self, value: String) -> Self {
        self.inner.account = value;
        self
    }

    pub fn number(mut self, value: String) -> Self {
        self.inner.number = value;
        self
    }

    pub fn currency(mut self, value: String) -> Self {
        self.inner.currency = value;
        self
    }

    pub fn opening_balance(mut self, value: Decimal) -> Self {
        self.inner.opening_balance = value;
        self
    }

    pub fn closing_balance(mut self, value: Decimal) -> Self {
        self.inner.closing_balance = value;
        self
    }

    pub fn closing_available_balance(mut self, value: Option<Decimal>) -> Self {
        self.inner.closing_available_balance = value;
        self
    }

    pub fn opening_timestamp(mut self, value: i64) -> Self {
        self.inner.opening_timestamp = value;
        self
    }

    pub fn closing_timestamp(mut self, value: i64) -> Self {
        self.inner.closing_timestamp = value;
        self
    }

    pub fn raw_data(mut self, value: Option<String>) -> Self {
        self.inner.raw_data = value;
        self
    }

    /// Транзакции только добавляются, порядок = порядок добавления
    pub fn push_transaction(&mut self, transaction: Transaction) {
        self.inner.transactions.push(transaction);
    }

    pub fn build(self) -> Statement {
        self.inner
    }
}

/// Одна проводка (`:61:` + связанный `:86:`).
///
/// Сумма хранится без знака, направление - отдельно в `debit_credit`.
/// `debit_credit == None` бывает только при невалидном признаке или
/// нераспознанной строке `:61:`, и тогда причина лежит в `issues`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// счёт/фрагмент из хвоста `:61:`
    pub account: String,
    /// имя счёта из `:86:`, может быть пустым
    pub account_name: String,
    /// денежная сумма, всегда неотрицательная
    pub amount: Decimal,
    /// направление транзакции
    pub debit_credit: Option<DebitCredit>,
    /// текстовое описание из `:86:`, пробелы схлопнуты
    pub description: String,
    /// код операции, формат зависит от банка
    pub transaction_code: String,
    /// customer reference - часть до `//`
    pub reference: String,
    /// bank reference - часть после `//`
    pub bank_reference: String,
    /// дата валютирования, epoch seconds
    pub value_timestamp: i64,
    /// дата проводки, epoch seconds
    pub entry_timestamp: i64,
    /// ошибки уровня полей, найденные при разборе
    pub issues: Vec<FieldIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<String>,
}

impl Transaction {
    /// Сумма со знаком: дебет - минус. `None`, если направление не распознано.
    pub fn signed_amount(&self) -> Option<Decimal> {
        self.debit_credit.map(|dc| match dc {
            DebitCredit::Credit => self.amount,
            DebitCredit::Debit => -self.amount,
        })
    }

    /// Разбор описания `:86:` на структурные части, если оно в формате с `/`
    pub fn description_details(&self) -> Option<crate::DescriptionDetails> {
        crate::DescriptionDetails::parse(&self.description)
    }
}

/// Строка таблицы: даты, признак, сумма, код, описание
impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = self.debit_credit.map(|dc| dc.mark()).unwrap_or('?');

        write!(
            f,
            "{:<10} {:<10} {} {:>15} {:<4} {}",
            format_timestamp(self.value_timestamp),
            format_timestamp(self.entry_timestamp),
            mark,
            self.amount,
            self.transaction_code,
            self.description,
        )
    }
}
