//! Line-preserving model of `aircraft.cfg`-style files.
//!
//! The document keeps every line exactly as read, including its own line
//! terminator, so serializing an untouched document reproduces the input
//! byte for byte. Edits replace or insert whole lines; inserted lines use the
//! document's dominant line ending.

use std::sync::LazyLock;

use regex::Regex;

static FLTSIM_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[{1,2}\s*fltsim\.[0-9]+\s*\]{1,2}").expect("valid fltsim regex")
});

/// One physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Line content without its terminator.
    pub text: String,
    /// The terminator as read: `"\r\n"`, `"\n"`, or empty for a final line.
    pub ending: String,
}

impl Line {
    pub fn new(text: impl Into<String>, ending: &str) -> Self {
        Self {
            text: text.into(),
            ending: ending.to_string(),
        }
    }

    /// Content with surrounding whitespace and any byte-order mark removed.
    pub fn trimmed(&self) -> &str {
        self.text.trim().trim_start_matches('\u{feff}').trim_start()
    }

    /// Leading whitespace, reused when the line is rewritten.
    pub fn indent(&self) -> &str {
        let text = self.text.trim_start_matches('\u{feff}');
        let content = text.trim_start();
        &text[..text.len() - content.len()]
    }

    pub fn is_blank(&self) -> bool {
        self.trimmed().is_empty()
    }

    fn is_comment(&self) -> bool {
        let t = self.trimmed();
        t.starts_with(';') || t.starts_with("//") || t.starts_with('#')
    }

    /// Lowercased key of a `key = value` line.
    pub fn key(&self) -> Option<String> {
        if self.is_comment() {
            return None;
        }
        let (key, _) = self.trimmed().split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key.to_ascii_lowercase())
        }
    }

    /// Value of a `key = value` line with quotes and trailing comments removed.
    pub fn value(&self) -> Option<String> {
        if self.is_comment() {
            return None;
        }
        let (_, raw) = self.trimmed().split_once('=')?;
        let raw = raw.trim();
        let value = if let Some(quoted) = raw.strip_prefix('"') {
            quoted.split('"').next().unwrap_or_default()
        } else {
            raw.split(" ;").next().unwrap_or(raw).trim()
        };
        Some(value.to_string())
    }

    /// Replace the content while keeping indentation and terminator.
    ///
    /// Returns whether the line changed.
    pub fn set_content(&mut self, content: &str) -> bool {
        if self.trimmed() == content {
            return false;
        }
        let bom = if self.text.starts_with('\u{feff}') {
            "\u{feff}"
        } else {
            ""
        };
        self.text = format!("{}{}{}", bom, self.indent(), content);
        true
    }
}

/// A `[name]` header and the lines up to the next header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub header: Line,
    pub lines: Vec<Line>,
}

impl Section {
    /// Section name without brackets, as written.
    pub fn name(&self) -> &str {
        self.header
            .trimmed()
            .trim_start_matches('[')
            .split(']')
            .next()
            .unwrap_or_default()
            .trim()
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }

    /// Whether this is a `[fltsim.N]` sim-object section.
    pub fn is_fltsim(&self) -> bool {
        FLTSIM_HEADER.is_match(self.header.trimmed())
    }

    /// First value stored under `key` (case-insensitive).
    pub fn value(&self, key: &str) -> Option<String> {
        self.lines
            .iter()
            .find(|l| l.key().as_deref() == Some(key))
            .and_then(Line::value)
    }

    /// Index just past the last non-blank line; new keys go here.
    pub fn content_end(&self) -> usize {
        self.lines
            .iter()
            .rposition(|l| !l.is_blank())
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    fn ends_with_blank(&self) -> bool {
        self.lines.last().map(Line::is_blank).unwrap_or(false)
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfgDocument {
    /// Lines before the first header.
    pub preamble: Vec<Line>,
    pub sections: Vec<Section>,
    eol: &'static str,
}

impl CfgDocument {
    /// Parse text into lines and sections.
    pub fn parse(text: &str) -> Self {
        let eol = if text.contains("\r\n") { "\r\n" } else { "\n" };
        let mut preamble = Vec::new();
        let mut sections: Vec<Section> = Vec::new();

        for raw in text.split_inclusive('\n') {
            let line = if let Some(body) = raw.strip_suffix("\r\n") {
                Line::new(body, "\r\n")
            } else if let Some(body) = raw.strip_suffix('\n') {
                Line::new(body, "\n")
            } else {
                Line::new(raw, "")
            };

            let t = line.trimmed();
            if t.starts_with('[') && t.contains(']') {
                sections.push(Section {
                    header: line,
                    lines: Vec::new(),
                });
            } else if let Some(section) = sections.last_mut() {
                section.lines.push(line);
            } else {
                preamble.push(line);
            }
        }

        Self {
            preamble,
            sections,
            eol,
        }
    }

    /// Line ending used for inserted lines.
    pub fn eol(&self) -> &'static str {
        self.eol
    }

    /// A new line terminated with the document's line ending.
    pub fn new_line(&self, text: impl Into<String>) -> Line {
        Line::new(text, self.eol)
    }

    /// Index of the first section with the given name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.is_named(name))
    }

    /// Index of the first `[fltsim.N]` section.
    pub fn fltsim_position(&self) -> Option<usize> {
        self.sections.iter().position(Section::is_fltsim)
    }

    /// Insert a section at `index`, keeping a blank line on either side.
    pub fn insert_section(&mut self, index: usize, mut section: Section) {
        let index = index.min(self.sections.len());
        let blank = self.new_line("");

        if index > 0 {
            let prev = &mut self.sections[index - 1];
            if !prev.ends_with_blank() {
                prev.lines.push(blank.clone());
            }
        } else if self.preamble.last().map(|l| !l.is_blank()).unwrap_or(false) {
            self.preamble.push(blank.clone());
        }

        if index < self.sections.len() && !section.ends_with_blank() {
            section.lines.push(blank);
        }
        self.sections.insert(index, section);
    }

    /// Build a section from a header and key lines.
    pub fn build_section(&self, header: &str, lines: &[&str]) -> Section {
        Section {
            header: self.new_line(header),
            lines: lines.iter().map(|l| self.new_line(*l)).collect(),
        }
    }

    fn all_lines(&self) -> impl Iterator<Item = &Line> {
        self.preamble.iter().chain(
            self.sections
                .iter()
                .flat_map(|s| std::iter::once(&s.header).chain(s.lines.iter())),
        )
    }

    /// Render the document back to text.
    pub fn serialize(&self) -> String {
        let lines: Vec<&Line> = self.all_lines().collect();
        let mut out = String::new();
        for (i, line) in lines.iter().enumerate() {
            out.push_str(&line.text);
            if line.ending.is_empty() && i + 1 < lines.len() {
                out.push_str(self.eol);
            } else {
                out.push_str(&line.ending);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\u{feff}; header comment\r\n[VERSION]\r\nmajor=1\r\n\r\n[FLTSIM.1]\r\n  title = \"A\" ; note\r\natc_id=N1\r\n[variation]\r\nbase_container=\"..\\x\"";

    #[test]
    fn test_round_trip_is_exact() {
        for text in [SAMPLE, "", "a\n", "[x]\nb=1\n\n\n", "no newline at end", "mixed\r\nends\n"] {
            assert_eq!(CfgDocument::parse(text).serialize(), text);
        }
    }

    #[test]
    fn test_sections_and_values() {
        let doc = CfgDocument::parse(SAMPLE);
        assert_eq!(doc.eol(), "\r\n");
        assert_eq!(doc.preamble.len(), 1);
        assert_eq!(doc.sections.len(), 3);
        assert!(doc.sections[1].is_fltsim());
        assert_eq!(doc.sections[1].name(), "FLTSIM.1");
        assert_eq!(doc.sections[1].value("title").unwrap(), "A");
        assert_eq!(doc.sections[1].value("atc_id").unwrap(), "N1");
        assert_eq!(doc.position("Variation"), Some(2));
        assert_eq!(doc.fltsim_position(), Some(1));
    }

    #[test]
    fn test_line_set_content_keeps_indent() {
        let mut line = Line::new("\ttitle=\"old\"", "\n");
        assert!(line.set_content("title = \"new\""));
        assert_eq!(line.text, "\ttitle = \"new\"");
        assert!(!line.set_content("title = \"new\""));
    }

    #[test]
    fn test_key_ignores_comments() {
        assert_eq!(Line::new("; title=x", "").key(), None);
        assert_eq!(Line::new("  TTitle = x", "").key().unwrap(), "ttitle");
        assert_eq!(Line::new("texture=GE ; engine", "").value().unwrap(), "GE");
    }

    #[test]
    fn test_insert_section_adds_separators() {
        let mut doc = CfgDocument::parse("[VERSION]\nmajor=1\n[fltsim.0]\ntitle=\"x\"\n");
        let section = doc.build_section("[VARIATION]", &["    base_container = \"..\\y\""]);
        doc.insert_section(1, section);
        assert_eq!(
            doc.serialize(),
            "[VERSION]\nmajor=1\n\n[VARIATION]\n    base_container = \"..\\y\"\n\n[fltsim.0]\ntitle=\"x\"\n"
        );
    }

    #[test]
    fn test_serialize_terminates_unterminated_line_before_appended_content() {
        let mut doc = CfgDocument::parse("[fltsim.0]\ntitle=\"x\"");
        let section = doc.build_section("[VARIATION]", &["base_container=\"y\""]);
        doc.insert_section(1, section);
        assert_eq!(
            doc.serialize(),
            "[fltsim.0]\ntitle=\"x\"\n\n[VARIATION]\nbase_container=\"y\"\n"
        );
    }
}
