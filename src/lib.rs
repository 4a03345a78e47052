#![forbid(unsafe_code)]
//! Folio assembles Markdown chapters into a styled HTML book and renders a
//! print-ready PDF.
//!
//! # Example
//!
//! ```no_run
//! let yaml = "title: Demo\nchapters:\n  - file: one.md\n    title: One\n";
//! let config = folio::parse_config(yaml)?;
//! let html = folio::build_document(&config, "book")?;
//! let pdf = folio::render_pdf(&html)?;
//! # Ok::<(), folio::FolioError>(())
//! ```

use html_escape::encode_text;
use jsonschema::validator_for;
use printpdf::{GeneratePdfOptions, PdfDocument};
use regex::Regex;
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};
use yaml_rust2::{Yaml, YamlLoader, yaml::Hash};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

pub const BUILTIN_SCHEMA: &str = include_str!("../data/book_schema.yml");

const STYLESHEET: &str = include_str!("../data/book.css");

const SECTION_BREAK: &str = "<div class=\"section-break\">&#8226; &#8226; &#8226;</div>";

/// One configured chapter or extra: its source file, optional display
/// number, and display title. The title is rendered from here, never from
/// the chapter body.
#[derive(Debug, Clone)]
pub struct ChapterRef {
    pub file: String,
    pub number: Option<String>,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct BookConfig {
    pub title: String,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub edition: Option<String>,
    pub epigraph: Option<String>,
    pub source_dir: String,
    pub output_dir: String,
    pub html_file: String,
    pub pdf_file: String,
    pub chapters: Vec<ChapterRef>,
    pub extras: Vec<ChapterRef>,
}

#[derive(Debug)]
pub enum FolioError {
    Config(String),
    Schema(String),
    Source(String),
    Render(String),
}

impl fmt::Display for FolioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolioError::Config(msg) => write!(f, "config error: {msg}"),
            FolioError::Schema(msg) => write!(f, "schema validation error: {msg}"),
            FolioError::Source(msg) => write!(f, "chapter read error: {msg}"),
            FolioError::Render(msg) => write!(f, "pdf render error: {msg}"),
        }
    }
}

impl Error for FolioError {}

pub type Result<T> = std::result::Result<T, FolioError>;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(\w*)\n(.*?)```").expect("code fence pattern"));
static SECTION_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n---\n").expect("section rule pattern"));
static END_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n\*End of (Chapter \d+|Epilogue|Book One|Author's Note)\*\s*$")
        .expect("end marker pattern")
});
static LIST_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.|[-*])\s").expect("list prefix pattern"));
static TRIPLE_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\*(.*?)\*\*\*").expect("triple emphasis pattern"));
static DOUBLE_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("double emphasis pattern"));
static SINGLE_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+?)\*").expect("single emphasis pattern"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+?)`").expect("inline code pattern"));

/// Applies inline emphasis and typographic substitutions to one block of
/// text. Order is fixed: longest emphasis markers first, then inline code,
/// then quotes, apostrophes, and em dashes. Must be applied exactly once
/// per string; running it over its own output is undefined.
pub fn format_inline(text: &str) -> String {
    let text = TRIPLE_EMPHASIS.replace_all(text, "<strong><em>$1</em></strong>");
    let text = DOUBLE_EMPHASIS.replace_all(&text, "<strong>$1</strong>");
    let text = SINGLE_EMPHASIS.replace_all(&text, "<em>$1</em>");
    let text = INLINE_CODE.replace_all(&text, "<code class=\"inline-code\">$1</code>");
    let text = text.replace(" \"", " \u{201c}").replace("\" ", "\u{201d} ");
    let text = text.replace('\'', "\u{2019}");
    text.replace(" -- ", " \u{2014} ").replace("--", "\u{2014}")
}

/// Replaces every fenced code region with a single escaped pre-formatted
/// fragment. The language tag is ignored. An unterminated fence is left in
/// the text untouched.
pub fn extract_code_fences(text: &str) -> String {
    CODE_FENCE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let code = caps[2].trim();
            format!("<div class=\"terminal\">{}</div>", encode_text(code))
        })
        .into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    Paragraph,
    Quote,
    Raw,
}

/// Single forward line scan over a section. At most one block is open at a
/// time; any blank line or block-type change flushes it before the next
/// block starts, so fragment order always matches line order.
#[derive(Debug)]
struct BlockScanner {
    state: ScanState,
    paragraph: Vec<String>,
    quote: Vec<String>,
    raw: Vec<String>,
    first_paragraph: bool,
    fragments: Vec<String>,
}

impl BlockScanner {
    fn new() -> Self {
        Self {
            state: ScanState::Idle,
            paragraph: Vec::new(),
            quote: Vec::new(),
            raw: Vec::new(),
            first_paragraph: true,
            fragments: Vec::new(),
        }
    }

    fn push_line(&mut self, line: &str) {
        if self.state == ScanState::Raw {
            self.raw.push(line.to_string());
            if line.contains("</div>") {
                self.flush_raw();
            }
            return;
        }

        if line.starts_with('>') {
            if self.state == ScanState::Paragraph {
                self.flush_paragraph();
            }
            self.state = ScanState::Quote;
            let content = line.trim_start_matches(['>', ' ']).trim();
            if content.is_empty() {
                self.quote.push("<br>".to_string());
            } else {
                self.quote.push(content.to_string());
            }
            return;
        }
        if self.state == ScanState::Quote {
            self.flush_quote();
        }

        let stripped = line.trim();

        // Fragments produced by fence extraction, and raw HTML in the
        // source, pass through unchanged. A multi-line fragment must stay
        // one fragment: accumulate until its closing tag.
        if stripped.starts_with("<div")
            || stripped.starts_with("<blockquote")
            || stripped.starts_with("</")
        {
            self.flush_paragraph();
            if stripped.starts_with("<div") && !line.contains("</div>") {
                self.state = ScanState::Raw;
                self.raw.push(line.to_string());
            } else {
                self.fragments.push(line.to_string());
            }
            return;
        }

        // Short lines fully wrapped in ** are standalone labels, not
        // paragraph text.
        if stripped.starts_with("**") && stripped.ends_with("**") && stripped.chars().count() < 100
        {
            self.flush_paragraph();
            let label = stripped.trim_matches('*');
            self.fragments.push(format!(
                "<p class=\"no-indent\"><strong>{}</strong></p>",
                encode_text(label)
            ));
            return;
        }

        if LIST_PREFIX.is_match(stripped) {
            self.flush_paragraph();
            let item = format_inline(&encode_text(stripped));
            self.fragments.push(format!("<p class=\"no-indent\">{item}</p>"));
            return;
        }

        if stripped.is_empty() {
            self.flush_paragraph();
            return;
        }

        if let Some(heading) = stripped.strip_prefix("## ") {
            self.flush_paragraph();
            let heading = heading.trim_start_matches(['#', ' ']).trim_end();
            self.fragments.push(format!(
                "<h3 class=\"section-heading\">{}</h3>",
                encode_text(heading)
            ));
            return;
        }

        self.state = ScanState::Paragraph;
        self.paragraph.push(stripped.to_string());
    }

    fn flush_paragraph(&mut self) {
        if !self.paragraph.is_empty() {
            let text = format_inline(&self.paragraph.join(" "));
            let class = if self.first_paragraph { " class=\"first\"" } else { "" };
            self.fragments.push(format!("<p{class}>{text}</p>"));
            self.paragraph.clear();
            self.first_paragraph = false;
        }
        if self.state == ScanState::Paragraph {
            self.state = ScanState::Idle;
        }
    }

    fn flush_quote(&mut self) {
        if !self.quote.is_empty() {
            let text = format_inline(&self.quote.join(" "));
            self.fragments.push(format!("<blockquote>{text}</blockquote>"));
            self.quote.clear();
        }
        if self.state == ScanState::Quote {
            self.state = ScanState::Idle;
        }
    }

    fn flush_raw(&mut self) {
        if !self.raw.is_empty() {
            let fragment = std::mem::take(&mut self.raw).join("\n");
            self.fragments.push(fragment);
        }
        if self.state == ScanState::Raw {
            self.state = ScanState::Idle;
        }
    }

    fn finish(mut self) -> String {
        self.flush_raw();
        self.flush_quote();
        self.flush_paragraph();
        self.fragments.join("\n")
    }
}

/// Renders one section: code fences first, then a single block scan over
/// the remaining lines.
pub fn render_section(text: &str) -> String {
    let text = extract_code_fences(text);
    let mut scanner = BlockScanner::new();
    for line in text.lines() {
        scanner.push_line(line);
    }
    scanner.finish()
}

fn strip_chapter_header(text: &str) -> String {
    let mut body = Vec::new();
    let mut in_header = true;
    for line in text.lines() {
        if in_header {
            let stripped = line.trim();
            if stripped.starts_with("# ") || stripped.is_empty() {
                continue;
            }
            in_header = false;
            if stripped == "---" {
                continue;
            }
        }
        body.push(line);
    }
    body.join("\n")
}

fn strip_end_marker(text: &str) -> String {
    END_MARKER.replace(text.trim(), "").into_owned()
}

fn split_sections(text: &str) -> Vec<String> {
    SECTION_RULE
        .split(text)
        .map(str::trim)
        .filter(|section| !section.is_empty())
        .map(str::to_string)
        .collect()
}

/// Renders a chapter body: strips the title heading, leading divider, and
/// trailing end marker, splits on horizontal rules, and renders each
/// section in order with a visual break between sections.
pub fn render_chapter_body(markdown: &str) -> String {
    let body = strip_chapter_header(markdown);
    let body = strip_end_marker(&body);
    let mut parts = Vec::new();
    for (idx, section) in split_sections(&body).iter().enumerate() {
        if idx > 0 {
            parts.push(SECTION_BREAK.to_string());
        }
        parts.push(render_section(section));
    }
    parts.join("\n")
}

pub fn render_chapter(entry: &ChapterRef, markdown: &str) -> String {
    let body = render_chapter_body(markdown);
    let header = match &entry.number {
        Some(number) => format!(
            "<div class=\"chapter-header\">\n  <div class=\"chapter-num\">Chapter {}</div>\n  <h2>{}</h2>\n</div>",
            encode_text(number),
            encode_text(&entry.title)
        ),
        None => format!(
            "<div class=\"chapter-header\">\n  <h2>{}</h2>\n</div>",
            encode_text(&entry.title)
        ),
    };
    format!(
        "<div class=\"chapter\">\n{header}\n<div class=\"chapter-body\">\n{body}\n</div>\n</div>"
    )
}

fn break_lines(text: &str) -> String {
    text.trim().replace('\n', "<br>\n")
}

fn render_title_page(config: &BookConfig) -> String {
    let mut out = String::new();
    out.push_str("<div class=\"title-page\">\n");
    out.push_str(&format!("  <h1>{}</h1>\n", encode_text(&config.title)));
    if let Some(subtitle) = &config.subtitle {
        out.push_str(&format!(
            "  <div class=\"subtitle\">{}</div>\n",
            break_lines(&encode_text(subtitle))
        ));
    }
    if let Some(author) = &config.author {
        out.push_str(&format!("  <div class=\"author\">{}</div>\n", encode_text(author)));
    }
    if let Some(edition) = &config.edition {
        out.push_str(&format!("  <div class=\"edition\">{}</div>\n", encode_text(edition)));
    }
    out.push_str("</div>");
    out
}

fn render_epigraph(text: &str) -> String {
    format!(
        "<div class=\"epigraph-page\">\n  <p>{}</p>\n</div>",
        break_lines(&format_inline(text))
    )
}

fn render_toc(config: &BookConfig) -> String {
    let mut items = String::new();
    for entry in &config.chapters {
        match &entry.number {
            Some(number) => items.push_str(&format!(
                "    <li><span class=\"num\">{}</span> {}</li>\n",
                encode_text(number),
                encode_text(&entry.title)
            )),
            None => items.push_str(&format!(
                "    <li class=\"unnumbered\">{}</li>\n",
                encode_text(&entry.title)
            )),
        }
    }
    for entry in &config.extras {
        items.push_str(&format!(
            "    <li class=\"unnumbered\">{}</li>\n",
            encode_text(&entry.title)
        ));
    }
    format!("<div class=\"toc\">\n  <h2>Contents</h2>\n  <ul>\n{items}  </ul>\n</div>")
}

/// Assembles the complete HTML document: title page, optional epigraph,
/// table of contents, then every chapter and extra in configured order.
/// `bodies` must hold one raw chapter text per configured entry, chapters
/// first, extras after.
pub fn render_document(config: &BookConfig, bodies: &[String]) -> Result<String> {
    let expected = config.chapters.len() + config.extras.len();
    if bodies.len() != expected {
        return Err(FolioError::Config(format!(
            "expected {expected} chapter bodies, got {}",
            bodies.len()
        )));
    }

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", encode_text(&config.title)));
    out.push_str(&format!("<style>\n{STYLESHEET}</style>\n</head>\n<body>\n"));
    out.push_str(&render_title_page(config));
    out.push('\n');
    if let Some(epigraph) = &config.epigraph {
        out.push_str(&render_epigraph(epigraph));
        out.push('\n');
    }
    out.push_str(&render_toc(config));
    out.push('\n');
    for (entry, body) in config.chapters.iter().chain(config.extras.iter()).zip(bodies) {
        out.push_str(&render_chapter(entry, body));
        out.push('\n');
    }
    out.push_str("</body>\n</html>\n");
    Ok(out)
}

/// Reads every configured chapter file from `source_dir` and assembles the
/// document. A missing or unreadable file fails the build.
pub fn build_document<P: AsRef<Path>>(config: &BookConfig, source_dir: P) -> Result<String> {
    let source_dir = source_dir.as_ref();
    let mut bodies = Vec::new();
    for entry in config.chapters.iter().chain(config.extras.iter()) {
        let path = source_dir.join(&entry.file);
        let text = fs::read_to_string(&path)
            .map_err(|err| FolioError::Source(format!("{}: {err}", path.display())))?;
        bodies.push(text);
    }
    render_document(config, &bodies)
}

/// Hands the document to the PDF renderer once, synchronously, and returns
/// the paginated bytes. Renderer failures propagate; there is no retry.
pub fn render_pdf(html: &str) -> Result<Vec<u8>> {
    let mut warnings = Vec::new();
    let document = PdfDocument::from_html(
        html,
        &BTreeMap::new(),
        &BTreeMap::new(),
        &GeneratePdfOptions::default(),
        &mut warnings,
    )
    .map_err(|err| FolioError::Render(err.to_string()))?;
    document
        .save(&Default::default())
        .map_err(|err| FolioError::Render(err.to_string()))
}

pub fn parse_config(yaml: &str) -> Result<BookConfig> {
    let docs =
        YamlLoader::load_from_str(yaml).map_err(|err| FolioError::Config(err.to_string()))?;
    let root = docs
        .first()
        .ok_or_else(|| FolioError::Config("empty configuration document".to_string()))?;
    let root = ensure_mapping(root, "book root")?;

    let title = map_get_string(root, "title")?
        .ok_or_else(|| FolioError::Config("missing required key 'title'".to_string()))?;
    let chapters = parse_chapter_list(root, "chapters")?;
    if chapters.is_empty() {
        return Err(FolioError::Config(
            "'chapters' must list at least one chapter".to_string(),
        ));
    }
    let extras = parse_chapter_list(root, "extras")?;

    Ok(BookConfig {
        title,
        subtitle: map_get_string(root, "subtitle")?,
        author: map_get_string(root, "author")?,
        edition: map_get_string(root, "edition")?,
        epigraph: map_get_string(root, "epigraph")?,
        source_dir: map_get_string(root, "source_dir")?.unwrap_or_else(|| ".".to_string()),
        output_dir: map_get_string(root, "output_dir")?.unwrap_or_else(|| "out".to_string()),
        html_file: map_get_string(root, "html_file")?.unwrap_or_else(|| "book.html".to_string()),
        pdf_file: map_get_string(root, "pdf_file")?.unwrap_or_else(|| "book.pdf".to_string()),
        chapters,
        extras,
    })
}

fn parse_chapter_list(map: &Hash, key: &str) -> Result<Vec<ChapterRef>> {
    let Some(entries) = map_get_sequence(map, key)? else {
        return Ok(Vec::new());
    };
    let mut chapters = Vec::new();
    for entry in entries {
        let entry = ensure_mapping(entry, &format!("{key} item"))?;
        let file = map_get_string(entry, "file")?
            .ok_or_else(|| FolioError::Config(format!("{key} entry missing 'file'")))?;
        let title = map_get_string(entry, "title")?
            .ok_or_else(|| FolioError::Config(format!("{key} entry missing 'title'")))?;
        chapters.push(ChapterRef {
            file,
            number: map_get_string(entry, "number")?,
            title,
        });
    }
    Ok(chapters)
}

pub fn validate_config_with_schema<P: AsRef<Path>>(yaml: &str, schema_path: P) -> Result<()> {
    let schema_source = fs::read_to_string(schema_path.as_ref())
        .map_err(|err| FolioError::Schema(err.to_string()))?;
    validate_config_with_schema_str(yaml, &schema_source)
}

pub fn validate_config_with_schema_str(yaml: &str, schema_source: &str) -> Result<()> {
    let docs =
        YamlLoader::load_from_str(yaml).map_err(|err| FolioError::Config(err.to_string()))?;
    let document = docs
        .first()
        .ok_or_else(|| FolioError::Config("empty configuration document".to_string()))?;
    let schema_docs = YamlLoader::load_from_str(schema_source)
        .map_err(|err| FolioError::Schema(err.to_string()))?;
    let schema_yaml = schema_docs
        .first()
        .ok_or_else(|| FolioError::Schema("empty schema document".to_string()))?;
    let schema_json = yaml_to_json(schema_yaml);
    let instance_json = yaml_to_json(document);
    let validator =
        validator_for(&schema_json).map_err(|err| FolioError::Schema(err.to_string()))?;
    if let Err(error) = validator.validate(&instance_json) {
        return Err(FolioError::Schema(error.to_string()));
    }
    Ok(())
}

fn ensure_mapping<'a>(value: &'a Yaml, context: &str) -> Result<&'a Hash> {
    value
        .as_hash()
        .ok_or_else(|| FolioError::Config(format!("expected mapping for {context}")))
}

fn map_get_string(map: &Hash, key: &str) -> Result<Option<String>> {
    match map.get(&Yaml::String(key.to_string())) {
        None | Some(Yaml::Null) => Ok(None),
        Some(Yaml::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(FolioError::Config(format!(
            "expected string for key '{key}', found {}",
            yaml_type_name(other)
        ))),
    }
}

fn map_get_sequence<'a>(map: &'a Hash, key: &str) -> Result<Option<&'a [Yaml]>> {
    match map.get(&Yaml::String(key.to_string())) {
        None | Some(Yaml::Null) => Ok(None),
        Some(Yaml::Array(values)) => Ok(Some(values)),
        Some(other) => Err(FolioError::Config(format!(
            "expected sequence for key '{key}', found {}",
            yaml_type_name(other)
        ))),
    }
}

fn yaml_value_to_string(value: &Yaml) -> String {
    match value {
        Yaml::Null => "null".to_string(),
        Yaml::Boolean(value) => value.to_string(),
        Yaml::Integer(value) => value.to_string(),
        Yaml::Real(value) => value.clone(),
        Yaml::String(value) => value.clone(),
        Yaml::Array(values) => {
            let items = values.iter().map(yaml_value_to_string).collect::<Vec<_>>();
            format!("[{}]", items.join(", "))
        }
        Yaml::Hash(map) => {
            let mut pairs = Vec::new();
            for (key, value) in map.iter() {
                pairs.push(format!(
                    "{}: {}",
                    yaml_value_to_string(key),
                    yaml_value_to_string(value)
                ));
            }
            format!("{{{}}}", pairs.join(", "))
        }
        Yaml::Alias(alias) => format!("*{alias}"),
        Yaml::BadValue => "!!badvalue".to_string(),
    }
}

fn yaml_type_name(value: &Yaml) -> &'static str {
    match value {
        Yaml::Null => "null",
        Yaml::Boolean(_) => "bool",
        Yaml::Integer(_) => "int",
        Yaml::Real(_) => "float",
        Yaml::String(_) => "string",
        Yaml::Array(_) => "sequence",
        Yaml::Hash(_) => "mapping",
        Yaml::Alias(_) => "alias",
        Yaml::BadValue => "bad",
    }
}

fn yaml_to_json(value: &Yaml) -> JsonValue {
    match value {
        Yaml::Null => JsonValue::Null,
        Yaml::Boolean(value) => JsonValue::Bool(*value),
        Yaml::Integer(value) => JsonValue::Number(JsonNumber::from(*value)),
        Yaml::Real(value) => value
            .parse::<f64>()
            .ok()
            .and_then(JsonNumber::from_f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(value.clone())),
        Yaml::String(value) => JsonValue::String(value.clone()),
        Yaml::Array(values) => {
            JsonValue::Array(values.iter().map(yaml_to_json).collect::<Vec<_>>())
        }
        Yaml::Hash(map) => {
            let mut out = JsonMap::new();
            for (key, value) in map.iter() {
                let key = match key {
                    Yaml::String(value) => value.clone(),
                    _ => yaml_value_to_string(key),
                };
                out.insert(key, yaml_to_json(value));
            }
            JsonValue::Object(out)
        }
        Yaml::Alias(alias) => JsonValue::String(format!("*{alias}")),
        Yaml::BadValue => JsonValue::String("!!badvalue".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_emphasis_is_applied_once() {
        let html = format_inline("**bold** and *italic*");
        assert_eq!(html, "<strong>bold</strong> and <em>italic</em>");
    }

    #[test]
    fn inline_triple_emphasis_nests_bold_and_italic() {
        assert_eq!(format_inline("***both***"), "<strong><em>both</em></strong>");
    }

    #[test]
    fn inline_code_span_is_styled() {
        let html = format_inline("run `cargo build` now");
        assert_eq!(html, "run <code class=\"inline-code\">cargo build</code> now");
    }

    #[test]
    fn smart_quotes_follow_spacing() {
        let html = format_inline("he said \"hello\" loudly");
        assert_eq!(html, "he said \u{201c}hello\u{201d} loudly");
    }

    #[test]
    fn apostrophes_and_dashes_become_typographic() {
        assert_eq!(format_inline("it's here -- now"), "it\u{2019}s here \u{2014} now");
        assert_eq!(format_inline("wait--what"), "wait\u{2014}what");
    }

    #[test]
    fn fence_extraction_escapes_content() {
        let text = "```bash\n$ ls <dir>\n\ntotal 4\n```";
        let html = extract_code_fences(text);
        assert_eq!(html, "<div class=\"terminal\">$ ls &lt;dir&gt;\n\ntotal 4</div>");
    }

    #[test]
    fn unterminated_fence_is_left_alone() {
        let text = "```\nno closing fence\n";
        assert_eq!(extract_code_fences(text), text);
    }

    #[test]
    fn section_marks_only_first_paragraph() {
        let html = render_section("One.\n\nTwo.");
        assert_eq!(html, "<p class=\"first\">One.</p>\n<p>Two.</p>");
    }

    #[test]
    fn paragraph_lines_join_with_spaces() {
        let html = render_section("line one\nline two");
        assert_eq!(html, "<p class=\"first\">line one line two</p>");
    }

    #[test]
    fn bold_label_line_is_a_standalone_fragment() {
        let html = render_section("**Night One: The Registry**\n\nBody text.");
        assert!(
            html.contains("<p class=\"no-indent\"><strong>Night One: The Registry</strong></p>")
        );
        assert!(html.contains("<p class=\"first\">Body text.</p>"));
    }

    #[test]
    fn long_bold_line_stays_a_paragraph() {
        let line = format!("**{}**", "x".repeat(120));
        let html = render_section(&line);
        assert!(html.starts_with("<p class=\"first\"><strong>"));
    }

    #[test]
    fn heading_line_is_centered_and_escaped() {
        let html = render_section("## Q&A");
        assert_eq!(html, "<h3 class=\"section-heading\">Q&amp;A</h3>");
    }

    #[test]
    fn quote_interrupts_and_resumes_paragraphs_in_order() {
        let html = render_section("before\n> quoted\nafter");
        let before = html.find("before").expect("before rendered");
        let quote = html.find("<blockquote>").expect("quote rendered");
        let after = html.find("after").expect("after rendered");
        assert!(before < quote && quote < after);
        assert!(html.contains("<p class=\"first\">before</p>"));
        assert!(html.contains("<p>after</p>"));
    }

    #[test]
    fn contiguous_quote_lines_merge() {
        let html = render_section("> line one\n> line two");
        assert_eq!(html, "<blockquote>line one line two</blockquote>");
    }

    #[test]
    fn blank_quoted_line_becomes_forced_break() {
        let html = render_section("> first\n>\n> second");
        assert_eq!(html, "<blockquote>first <br> second</blockquote>");
    }

    #[test]
    fn fenced_block_stays_one_fragment() {
        let html = render_section("```sh\n$ make\n\n$ make install\n```\nafter");
        assert!(html.contains("<div class=\"terminal\">$ make\n\n$ make install</div>"));
        assert!(html.ends_with("<p class=\"first\">after</p>"));
    }

    #[test]
    fn chapter_header_and_end_marker_are_stripped() {
        let markdown = "# Nine\n---\nBody.\n\n*End of Chapter 9*\n";
        assert_eq!(render_chapter_body(markdown), "<p class=\"first\">Body.</p>");
    }

    #[test]
    fn sections_split_on_rules_and_drop_empties() {
        let html = render_chapter_body("# T\n---\nA\n\n---\n\nB\n");
        assert_eq!(
            html,
            "<p class=\"first\">A</p>\n<div class=\"section-break\">&#8226; &#8226; &#8226;</div>\n<p class=\"first\">B</p>"
        );
    }

    #[test]
    fn chapter_without_number_omits_the_chapter_num_line() {
        let entry = ChapterRef {
            file: "epilogue.md".to_string(),
            number: None,
            title: "Epilogue".to_string(),
        };
        let html = render_chapter(&entry, "Closing words.");
        assert!(!html.contains("chapter-num"));
        assert!(html.contains("<h2>Epilogue</h2>"));
    }

    #[test]
    fn parse_config_reads_chapters_in_order() {
        let yaml = "title: Demo\nchapters:\n  - file: one.md\n    number: \"1\"\n    title: One\n  - file: two.md\n    title: Two\n";
        let config = parse_config(yaml).expect("parse config");
        assert_eq!(config.title, "Demo");
        assert_eq!(config.chapters.len(), 2);
        assert_eq!(config.chapters[0].file, "one.md");
        assert_eq!(config.chapters[0].number.as_deref(), Some("1"));
        assert!(config.chapters[1].number.is_none());
        assert_eq!(config.source_dir, ".");
        assert_eq!(config.html_file, "book.html");
    }

    #[test]
    fn parse_config_requires_title() {
        let err =
            parse_config("chapters:\n  - file: a.md\n    title: A\n").expect_err("expected error");
        match err {
            FolioError::Config(msg) => assert!(msg.contains("title")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_config_requires_chapters() {
        let err = parse_config("title: Demo\n").expect_err("expected error");
        match err {
            FolioError::Config(msg) => assert!(msg.contains("chapters")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_config_rejects_non_mapping_root() {
        let err = parse_config("[]").expect_err("expected error");
        match err {
            FolioError::Config(msg) => assert!(msg.contains("mapping")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn map_get_string_errors_on_non_string() {
        let mut map = Hash::new();
        map.insert(Yaml::String("title".to_string()), Yaml::Integer(5));
        let err = map_get_string(&map, "title").expect_err("expected error");
        match err {
            FolioError::Config(msg) => assert!(msg.contains("expected string")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn render_document_rejects_body_count_mismatch() {
        let config = parse_config("title: Demo\nchapters:\n  - file: a.md\n    title: A\n")
            .expect("parse config");
        let err = render_document(&config, &[]).expect_err("expected error");
        match err {
            FolioError::Config(msg) => assert!(msg.contains("bodies")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn yaml_to_json_preserves_shapes() {
        let docs = YamlLoader::load_from_str("a: 1\nb: [x, true]\nc: 1.5\n").expect("parse yaml");
        let json = yaml_to_json(&docs[0]);
        assert_eq!(json, serde_json::json!({"a": 1, "b": ["x", true], "c": 1.5}));
    }
}
