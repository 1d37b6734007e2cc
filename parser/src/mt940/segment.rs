use once_cell::sync::Lazy;
use regex::Regex;

/// Заголовки SWIFT-конверта: {1:...}{2:...}{3:{...}} и трейлер {5:...}
static ENVELOPE_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[1235]:(?:[^{}]|\{[^{}]*\})*\}").unwrap()
});

/// Начало текстового блока `{4:` / `(4:`
static TEXT_BLOCK_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*[{(]4:").unwrap());

/// Конец текстового блока `-}` / `-)` или одинокий `-` в строке
static TEXT_BLOCK_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*-[})]?[ \t]*$").unwrap());

static STATEMENT_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^:20:").unwrap());

static TAG_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^:(\d{2}[A-Z]?):").unwrap());

/// Убирает SWIFT-конверт и приводит переводы строк к `\n`
pub fn strip_envelope(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let without_headers = ENVELOPE_HEADER_RE.replace_all(&normalized, "");
    let without_start = TEXT_BLOCK_START_RE.replace_all(&without_headers, "\n");
    let without_end = TEXT_BLOCK_END_RE.replace_all(&without_start, "");

    // теги должны начинаться с начала строки
    without_end
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Делит сообщение на блоки выписок: каждый начинается с `:20:` в начале строки.
///
/// Фрагменты без `:20:` (мусор перед первой выпиской) отбрасываются,
/// порядок блоков совпадает с порядком в документе.
pub fn segment_statements(raw: &str) -> Vec<String> {
    let text = strip_envelope(raw);

    let mut starts: Vec<usize> = STATEMENT_START_RE.find_iter(&text).map(|m| m.start()).collect();
    if starts.is_empty() {
        return Vec::new();
    }
    starts.push(text.len());

    starts
        .windows(2)
        .map(|w| text[w[0]..w[1]].trim().to_string())
        .filter(|block| !block.is_empty())
        .collect()
}

/// Тег в начале строки, например `61` для `:61:...`
pub(crate) fn line_tag(line: &str) -> Option<&str> {
    TAG_LINE_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Делит блок выписки на блоки проводок.
///
/// Проводка начинается с `:61:`, к ней относятся строки-продолжения и
/// следующий сразу за ней `:86:` вместе с его продолжениями.
/// Любой другой тег закрывает проводку.
pub fn segment_transactions(statement_block: &str) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    let mut current: Option<Vec<&str>> = None;
    let mut has_86 = false;

    for line in statement_block.lines() {
        match line_tag(line.trim_start()) {
            Some("61") => {
                if let Some(lines) = current.take() {
                    blocks.push(lines.join("\n"));
                }
                current = Some(vec![line.trim()]);
                has_86 = false;
            }
            Some("86") if current.is_some() && !has_86 => {
                if let Some(lines) = current.as_mut() {
                    lines.push(line.trim());
                }
                has_86 = true;
            }
            Some(_) => {
                if let Some(lines) = current.take() {
                    blocks.push(lines.join("\n"));
                }
            }
            None => {
                // строка без тега - продолжение предыдущего поля
                if let Some(lines) = current.as_mut() {
                    lines.push(line.trim());
                }
            }
        }
    }

    // не забываем последнюю проводку
    if let Some(lines) = current.take() {
        blocks.push(lines.join("\n"));
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_envelope_removes_swift_blocks() {
        let raw = "{1:F01FOOBARBAXXX0000000000}{2:O9400000}{3:{108:ABC}}{4:\r\n:20:REF\r\n:25:123\r\n-}{5:{CHK:123}}";
        assert_eq!(strip_envelope(raw), ":20:REF\n:25:123");
    }

    #[test]
    fn strip_envelope_handles_paren_blocks_and_indentation() {
        let raw = "(4:\n    :20:REF\n    :25:123\n-)";
        assert_eq!(strip_envelope(raw), ":20:REF\n:25:123");
    }

    #[test]
    fn segment_statements_single_block() {
        let blocks = segment_statements(":20:REF\n:25:123\n:60F:C230101EUR1,00\n");
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].starts_with(":20:REF"));
    }

    #[test]
    fn segment_statements_keeps_document_order() {
        let raw = "junk before\n:20:ONE\n:25:1\n:20:TWO\n:25:2\n:20:THREE\n";
        let blocks = segment_statements(raw);

        assert_eq!(blocks, vec![":20:ONE\n:25:1", ":20:TWO\n:25:2", ":20:THREE"]);
    }

    #[test]
    fn segment_statements_ignores_20_inside_text() {
        let raw = ":20:ONE\n:86:see :20:inline\n";
        assert_eq!(segment_statements(raw).len(), 1);
    }

    #[test]
    fn segment_statements_without_20_is_empty() {
        assert!(segment_statements(":25:123\n:61:250630D1,00NMSC\n").is_empty());
        assert!(segment_statements("").is_empty());
        assert!(segment_statements("   \n\n").is_empty());
    }

    #[test]
    fn segment_transactions_attaches_86_and_continuations() {
        let block = ":20:REF\n:25:1\n:60F:C250630EUR1,00\n\
                     :61:250630D1500,00NMSCNONREF//REF123\n\
                     :86:NOTE ONE\nNOTE TWO\n\
                     :61:250630C250,50NTRFX\n\
                     :62F:C250630EUR1,00\n\
                     :86:statement level info";

        let txs = segment_transactions(block);

        assert_eq!(txs.len(), 2);
        assert_eq!(
            txs[0],
            ":61:250630D1500,00NMSCNONREF//REF123\n:86:NOTE ONE\nNOTE TWO"
        );
        assert_eq!(txs[1], ":61:250630C250,50NTRFX");
    }

    #[test]
    fn segment_transactions_skips_orphan_86() {
        let block = ":20:REF\n:86:no transaction here\n:62F:C250630EUR1,00";
        assert!(segment_transactions(block).is_empty());
    }

    #[test]
    fn segment_transactions_second_86_closes_block() {
        let block = ":61:250630D1,00NMSC\n:86:first\n:86:second";
        assert_eq!(segment_transactions(block), vec![":61:250630D1,00NMSC\n:86:first"]);
    }

    #[test]
    fn line_tag_detects_tags() {
        assert_eq!(line_tag(":61:250630"), Some("61"));
        assert_eq!(line_tag(":28C:1/1"), Some("28C"));
        assert_eq!(line_tag("NOTE"), None);
        assert_eq!(line_tag("/OCMT/EUR1,00/"), None);
    }
}
