use serde::{Deserialize, Serialize};

use crate::mt940::{EngineKind, EngineSelector};

/// Настройки парсера
///
/// ```rust
/// use mt940_parser::{EngineKind, ParserConfig};
///
/// let config = ParserConfig::default()
///     .with_forced_engine(EngineKind::Hsbc)
///     .with_raw_data(true);
/// assert!(config.keep_raw_data);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Порядок проверки движков. `general` добавляется в конец, если его нет.
    pub engines: Vec<EngineKind>,
    /// Не выбирать движок по тексту, а использовать этот
    pub force_engine: Option<EngineKind>,
    /// Сохранять исходный текст выписок и проводок
    pub keep_raw_data: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            engines: EngineKind::DEFAULT_ORDER.to_vec(),
            force_engine: None,
            keep_raw_data: false,
        }
    }
}

impl ParserConfig {
    pub fn with_engines(mut self, engines: Vec<EngineKind>) -> Self {
        self.engines = engines;
        self
    }

    pub fn with_forced_engine(mut self, engine: EngineKind) -> Self {
        self.force_engine = Some(engine);
        self
    }

    pub fn with_raw_data(mut self, keep: bool) -> Self {
        self.keep_raw_data = keep;
        self
    }

    pub fn selector(&self) -> EngineSelector {
        EngineSelector::new(&self.engines)
    }
}
