use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Engine, General, Hsbc};
use crate::error::ParseError;

static GENERAL: General = General;
static HSBC: Hsbc = Hsbc;

/// Известные движки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    General,
    Hsbc,
}

impl EngineKind {
    /// Порядок проверки по умолчанию: банковские движки раньше общего
    pub const DEFAULT_ORDER: [EngineKind; 2] = [EngineKind::Hsbc, EngineKind::General];

    pub fn engine(self) -> &'static dyn Engine {
        match self {
            EngineKind::General => &GENERAL,
            EngineKind::Hsbc => &HSBC,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::General => write!(f, "general"),
            EngineKind::Hsbc => write!(f, "hsbc"),
        }
    }
}

impl FromStr for EngineKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(EngineKind::General),
            "hsbc" => Ok(EngineKind::Hsbc),
            other => Err(ParseError::UnknownEngine(other.to_string())),
        }
    }
}

/// Выбор движка по тексту сообщения.
///
/// Движки проверяются в заданном порядке, побеждает первый подходящий.
/// [`EngineKind::General`] всегда стоит последним и выбирается, если не подошёл никто.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSelector {
    order: Vec<EngineKind>,
}

impl EngineSelector {
    pub fn new(order: &[EngineKind]) -> Self {
        let mut deduped: Vec<EngineKind> = Vec::with_capacity(order.len() + 1);
        for kind in order {
            if *kind != EngineKind::General && !deduped.contains(kind) {
                deduped.push(*kind);
            }
        }
        deduped.push(EngineKind::General);

        EngineSelector { order: deduped }
    }

    pub fn order(&self) -> &[EngineKind] {
        &self.order
    }

    pub fn select(&self, raw: &str) -> EngineKind {
        let selected = self
            .order
            .iter()
            .copied()
            .find(|kind| kind.engine().is_applicable(raw))
            .unwrap_or(EngineKind::General);

        tracing::debug!(engine = %selected, "mt940 engine selected");
        selected
    }
}

impl Default for EngineSelector {
    fn default() -> Self {
        EngineSelector::new(&EngineKind::DEFAULT_ORDER)
    }
}

/// Выбор движка с порядком по умолчанию
pub fn select(raw: &str) -> EngineKind {
    EngineSelector::default().select(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HSBC_TEXT: &str = "{1:F01HSBCIDJAXXX0000000000}{2:O940}{4:\n:20:R\n:61:250630D1,00NTRFA//B\n:86:X\n-}";

    #[test]
    fn bank_marker_wins_over_fallback() {
        assert_eq!(select(HSBC_TEXT), EngineKind::Hsbc);
    }

    #[test]
    fn no_marker_falls_back_to_general() {
        assert_eq!(select(":20:R\n:61:250630D1,00NMSC\n:86:X"), EngineKind::General);
        assert_eq!(select(""), EngineKind::General);
        assert_eq!(select("not an mt940 at all"), EngineKind::General);
    }

    #[test]
    fn general_is_always_last() {
        let selector = EngineSelector::new(&[EngineKind::General, EngineKind::Hsbc, EngineKind::Hsbc]);
        assert_eq!(selector.order(), &[EngineKind::Hsbc, EngineKind::General]);

        let selector = EngineSelector::new(&[]);
        assert_eq!(selector.order(), &[EngineKind::General]);
        assert_eq!(selector.select(HSBC_TEXT), EngineKind::General);
    }

    #[test]
    fn engine_kind_from_str_and_display() {
        assert_eq!("HSBC".parse::<EngineKind>().unwrap(), EngineKind::Hsbc);
        assert_eq!(" general ".parse::<EngineKind>().unwrap(), EngineKind::General);
        assert!(matches!(
            "ing".parse::<EngineKind>(),
            Err(ParseError::UnknownEngine(name)) if name == "ing"
        ));
        assert_eq!(EngineKind::Hsbc.to_string(), "hsbc");
        assert_eq!(EngineKind::Hsbc.engine().bank(), "HSBC");
    }
}
