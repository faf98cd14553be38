//! Post-processing: turn raw page text into Markdown.
//!
//! Text pulled from a PDF text layer or printed by an OCR engine is plain
//! text with stray structure: CRLF line endings, form feeds between pages,
//! invisible Unicode, Setext-style underlined titles, the odd HTML fragment.
//! These deterministic rules normalise each page to Markdown with ATX
//! (`#`-prefixed) headings without touching the words themselves.
//!
//! ## Page layout
//!
//! Blank lines inside a page are dropped and pages are joined with exactly
//! one blank line, so every page becomes one paragraph block and the block
//! count of the output equals the page count.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so every later rule can split on `\n`.
//! HTML and Setext headings are rewritten before blank lines are dropped,
//! because Setext detection needs to see the underline on its own line.

use once_cell::sync::Lazy;
use regex::Regex;

/// Join normalised pages into one Markdown document.
///
/// Pages are separated by one blank line; the result ends with exactly one
/// newline.
pub fn assemble_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let body = pages
        .iter()
        .map(|p| normalise_page(p.as_ref()))
        .collect::<Vec<_>>()
        .join("\n\n");
    ensure_final_newline(&body)
}

/// Apply every per-page rule to the raw text of one page.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF, CR and form feed → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 3. Convert HTML fragments (tags, entities) to Markdown
/// 4. Rewrite Setext headings (`Title` over `===`/`---`) to ATX
/// 5. Trim trailing whitespace per line
/// 6. Drop blank lines and surrounding whitespace
pub fn normalise_page(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = convert_html(&s);
    let s = convert_setext_headings(&s);
    let s = trim_trailing_whitespace(&s);
    drop_blank_lines(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input
        .replace("\r\n", "\n")
        .replace(['\r', '\u{000C}'], "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: HTML fragments ───────────────────────────────────────────────────

/// An opening, closing or self-closing tag, or a named/numeric entity.
static RE_HTML_MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?[a-z][a-z0-9]*(\s[^<>]*)?/?>|&(#[0-9]+|#x[0-9a-f]+|[a-z][a-z0-9]*);").unwrap()
});

/// Pages carrying markup go through html2md; plain text is left as is so
/// its line breaks survive and nothing gets Markdown-escaped.
fn convert_html(input: &str) -> String {
    if !RE_HTML_MARKUP.is_match(input) {
        return input.to_string();
    }
    html2md::parse_html(input)
}

// ── Rule 4: Setext headings → ATX ────────────────────────────────────────────

static RE_SETEXT_H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}={2,}\s*$").unwrap());
static RE_SETEXT_H2: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}-{2,}\s*$").unwrap());

fn convert_setext_headings(input: &str) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let mut result: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let next = lines.get(i + 1).copied().unwrap_or("");
        let is_title = !line.trim().is_empty() && !line.trim_start().starts_with('#');

        if is_title && RE_SETEXT_H1.is_match(next) {
            result.push(format!("# {}", line.trim()));
            i += 2;
            continue;
        }
        if is_title && RE_SETEXT_H2.is_match(next) {
            result.push(format!("## {}", line.trim()));
            i += 2;
            continue;
        }

        result.push(line.to_string());
        i += 1;
    }

    result.join("\n")
}

// ── Rule 5: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 6: Drop blank lines ─────────────────────────────────────────────────

fn drop_blank_lines(input: &str) -> String {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(md: &str) -> Vec<&str> {
        md.split("\n\n").filter(|b| !b.trim().is_empty()).collect()
    }

    #[test]
    fn two_pages_become_two_blocks() {
        let md = assemble_pages(&["Hello", "World"]);
        assert_eq!(md, "Hello\n\nWorld\n");
    }

    #[test]
    fn block_count_equals_page_count() {
        let pages = [
            "Title\r\n\r\nFirst paragraph\r\n\r\n\r\nSecond",
            "\u{000C}Page two\n\n\nmore\n",
            "three",
        ];
        let md = assemble_pages(&pages);
        assert_eq!(blocks(&md).len(), 3, "got: {md:?}");
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc\u{000C}"), "a\nb\nc\n");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "hello\u{200B}world\u{FEFF}foo\u{00AD}bar";
        assert_eq!(remove_invisible_chars(input), "helloworldfoobar");
    }

    #[test]
    fn setext_headings_become_atx() {
        let input = "Annual Report\n=============\nIntro\nResults\n-------\nBody";
        assert_eq!(
            convert_setext_headings(input),
            "# Annual Report\nIntro\n## Results\nBody"
        );
    }

    #[test]
    fn lone_rule_is_not_a_heading() {
        let input = "\n-----\ntext";
        assert_eq!(convert_setext_headings(input), input);
    }

    #[test]
    fn html_headings_become_atx() {
        let md = normalise_page("<h2>Scope</h2><p>Plain <b>bold</b> text</p>");
        assert_eq!(md.lines().next(), Some("## Scope"), "got: {md:?}");
        assert!(md.contains("Plain **bold** text"), "got: {md:?}");
    }

    #[test]
    fn html_breaks_split_lines() {
        assert_eq!(normalise_page("one<br>two<br/>three"), "one\ntwo\nthree");
    }

    #[test]
    fn html_list_becomes_bullets() {
        let md = normalise_page("<ul><li>alpha</li><li>beta</li></ul>");
        for item in ["alpha", "beta"] {
            assert!(
                md.lines().any(|l| {
                    let l = l.trim_start();
                    (l.starts_with("* ") || l.starts_with("- ")) && l.ends_with(item)
                }),
                "no bullet for {item} in {md:?}"
            );
        }
    }

    #[test]
    fn html_link_becomes_inline_link() {
        let md = normalise_page(r#"see <a href="https://x.org">the site</a>"#);
        assert!(md.contains("[the site](https://x.org)"), "got: {md:?}");
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(normalise_page("a &amp; b"), "a & b");
    }

    #[test]
    fn plain_text_keeps_line_breaks() {
        assert_eq!(normalise_page("first line\nsecond_line *x*"), "first line\nsecond_line *x*");
    }

    #[test]
    fn plain_comparisons_are_not_html() {
        assert_eq!(normalise_page("a < b and c > d"), "a < b and c > d");
    }

    #[test]
    fn empty_document_is_single_newline() {
        assert_eq!(assemble_pages::<&str>(&[]), "\n");
        assert_eq!(assemble_pages(&["   \n\n"]), "\n");
    }
}
