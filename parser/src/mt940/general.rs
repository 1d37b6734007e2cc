use super::Engine;
use super::grammar::{GENERAL_GRAMMAR, Grammar};

/// Движок по умолчанию: номинальная грамматика MT940.
///
/// Используется как запасной вариант, когда ни один банковский движок
/// не подошёл, поэтому применим всегда.
#[derive(Debug, Clone, Copy, Default)]
pub struct General;

impl Engine for General {
    fn bank(&self) -> &'static str {
        "General"
    }

    /// Сам по себе движок подходит, если первая непустая строка содержит `:20:`.
    /// Селектор выбирает его и без этого, как последний в списке.
    fn is_applicable(&self, raw: &str) -> bool {
        raw.lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .is_some_and(|line| line.contains(":20:"))
    }

    fn grammar(&self) -> &Grammar {
        &GENERAL_GRAMMAR
    }
}
