//! Приведение сырых подстрок из тегов MT940 к каноническим значениям.
//!
//! Все функции чистые. Отсутствующее или кривое значение превращается в `None`
//! (или пустую строку), решение о значении по умолчанию принимает движок.
//! Исключение - признак дебет/кредит: он возвращает [`FieldIssue`].

use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::error::FieldIssue;
use crate::model::DebitCredit;

/// Базовая санитизация счёта: trim + верхний регистр
pub fn sanitize_account(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Имя счёта: только trim
pub fn sanitize_account_name(raw: &str) -> String {
    raw.trim().to_string()
}

/// Берёт последний символ токена (`RD` -> `D`), приводит к верхнему регистру
/// и проверяет, что это `D` или `C`.
pub fn sanitize_debit_credit(raw: &str) -> Result<DebitCredit, FieldIssue> {
    let mark = raw.trim().chars().last().map(|c| c.to_ascii_uppercase());

    match mark {
        Some('D') => Ok(DebitCredit::Debit),
        Some('C') => Ok(DebitCredit::Credit),
        _ => Err(FieldIssue::InvalidDebitCredit(raw.to_string())),
    }
}

/// Схлопывает любые пробельные последовательности (включая переводы строк)
/// в один пробел
pub fn sanitize_description(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Сумма в формате MT940 ("1500,00") -> беззнаковый [`Decimal`].
///
/// Если в строке есть и точка, и запятая, точка считается разделителем тысяч.
/// На собственном каноническом выводе ("1500.00") функция даёт то же значение.
pub fn sanitize_amount(raw: &str) -> Option<Decimal> {
    let mut cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.contains(',') {
        if cleaned.contains('.') {
            cleaned = cleaned.replace('.', "");
        }
        cleaned = cleaned.replace(',', ".");
    }

    if cleaned.is_empty() || cleaned.starts_with('-') {
        return None;
    }

    // "1500," и ",50" встречаются у некоторых банков
    let cleaned = cleaned.trim_end_matches('.');
    let cleaned = if cleaned.starts_with('.') {
        format!("0{cleaned}")
    } else {
        cleaned.to_string()
    };

    if cleaned.matches('.').count() > 1 {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}

/// Сумма баланса со знаком: `D` - минус
pub fn signed_amount(raw: &str, direction: DebitCredit) -> Option<Decimal> {
    let amount = sanitize_amount(raw)?;

    Some(match direction {
        DebitCredit::Credit => amount,
        DebitCredit::Debit => -amount,
    })
}

/// YYMMDD -> дата. Годы 00-69 относятся к 2000-м, 70-99 к 1900-м.
pub fn parse_yymmdd(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let yy: i32 = s[0..2].parse().ok()?;
    let mm: u32 = s[2..4].parse().ok()?;
    let dd: u32 = s[4..6].parse().ok()?;

    let year = if yy < 70 { 2000 + yy } else { 1900 + yy };

    NaiveDate::from_ymd_opt(year, mm, dd)
}

/// MMDD -> дата с годом из `context`.
///
/// Если месяцы расходятся больше чем на полгода, значит запись перешла через
/// границу года (value date 31.12, entry date 02.01 и наоборот).
pub fn parse_mmdd_with_context(s: &str, context: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim();
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mm: u32 = s[0..2].parse().ok()?;
    let dd: u32 = s[2..4].parse().ok()?;

    let diff = mm as i32 - context.month() as i32;
    let year = if diff < -6 {
        context.year() + 1
    } else if diff > 6 {
        context.year() - 1
    } else {
        context.year()
    };

    NaiveDate::from_ymd_opt(year, mm, dd)
}

/// Полночь UTC даты в epoch seconds
pub fn to_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// epoch seconds -> `YYYY-MM-DD`, незаданная дата (0) - пустая строка
pub fn format_timestamp(timestamp: i64) -> String {
    if timestamp == 0 {
        return String::new();
    }

    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// YYMMDD -> epoch seconds
pub fn sanitize_timestamp(raw: &str) -> Option<i64> {
    parse_yymmdd(raw).map(to_timestamp)
}

/// Дата проводки из `:61:`: 6 цифр разбираются как YYMMDD,
/// 4 цифры - как MMDD с годом из `year_context`.
/// Без контекста 4-значная дата не разбирается.
pub fn sanitize_entry_timestamp(raw: &str, year_context: Option<NaiveDate>) -> Option<i64> {
    match raw.trim().len() {
        6 => sanitize_timestamp(raw),
        4 => parse_mmdd_with_context(raw, year_context?).map(to_timestamp),
        _ => None,
    }
}
