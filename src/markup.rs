//! Inline style markup for text and heading blocks.
//!
//! Styled text is stored in block content as a small Markdown subset:
//! `**bold**` and `*italic*`. Literal punctuation is backslash-escaped and
//! whitespace that Markdown would swallow (line indentation, trailing
//! spaces, blank lines) is written as character references, so the whole
//! content always parses as a single paragraph. Decoding gives back the
//! encoded runs in their normal form (see [`normalize_runs`]).
use pulldown_cmark::{Event, Parser, Tag, TagEnd};

/// A span of text sharing one style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl StyledRun {
    pub fn plain(text: impl Into<String>) -> Self {
        StyledRun {
            text: text.into(),
            bold: false,
            italic: false,
        }
    }

    pub fn styled(text: impl Into<String>, bold: bool, italic: bool) -> Self {
        StyledRun {
            text: text.into(),
            bold,
            italic,
        }
    }

    fn same_style(&self, bold: bool, italic: bool) -> bool {
        self.bold == bold && self.italic == italic
    }
}

// ASCII punctuation that can start or close Markdown syntax.
const ESCAPED: &[char] = &[
    '\\', '*', '_', '`', '[', ']', '<', '>', '#', '!', '~', '|', '&', '+', '-', '=', '.', ')',
];

// Empty inline HTML, emitted between an emphasis marker and a neighbour that
// would otherwise stop the marker from opening or closing.
const SEPARATOR: &str = "<!-- -->";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\r' => out.push_str("&#13;"),
            c if ESCAPED.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

fn whitespace_reference(c: char) -> &'static str {
    if c == '\t' {
        "&#9;"
    } else {
        "&#32;"
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Rewrites whitespace that Markdown strips or reinterprets.
///
/// Leading and trailing spaces of every line become references, and any
/// newline that would produce an empty line becomes `&#10;`.
fn protect_whitespace(encoded: &str) -> String {
    let lines: Vec<&str> = encoded.split('\n').collect();
    let last = lines.len() - 1;
    let mut out = String::with_capacity(encoded.len());

    for (i, line) in lines.iter().enumerate() {
        let rest = line.trim_start_matches(is_blank);
        let body = rest.trim_end_matches(is_blank);
        line[..line.len() - rest.len()]
            .chars()
            .for_each(|c| out.push_str(whitespace_reference(c)));
        out.push_str(body);
        rest[body.len()..]
            .chars()
            .for_each(|c| out.push_str(whitespace_reference(c)));

        if i < last {
            let makes_empty_line = line.is_empty() || (i + 1 == last && lines[last].is_empty());
            out.push_str(if makes_empty_line { "&#10;" } else { "\n" });
        }
    }
    out
}

/// Drops empty runs, clears style on whitespace-only runs and merges
/// neighbours of equal style. This is the form [`decode_markup`] returns.
pub fn normalize_runs(runs: &[StyledRun]) -> Vec<StyledRun> {
    let mut out: Vec<StyledRun> = Vec::new();
    for run in runs {
        if run.text.is_empty() {
            continue;
        }
        let (bold, italic) = if run.text.trim().is_empty() {
            (false, false)
        } else {
            (run.bold, run.italic)
        };
        match out.last_mut() {
            Some(last) if last.same_style(bold, italic) => last.text.push_str(&run.text),
            _ => out.push(StyledRun::styled(run.text.clone(), bold, italic)),
        }
    }
    out
}

/// Appends `chunk`, separating it from a just-closed marker when needed.
///
/// `closed` holds the last character inside that marker.
fn push_after_marker(out: &mut String, chunk: &str, closed: &mut Option<char>) {
    let Some(next) = chunk.chars().next() else {
        return;
    };
    if let Some(last) = closed.take() {
        if !next.is_whitespace() && (next == '*' || !last.is_alphanumeric()) {
            out.push_str(SEPARATOR);
        }
    }
    out.push_str(chunk);
}

/// Encodes styled runs into block content
pub fn encode_markup(runs: &[StyledRun]) -> String {
    let mut out = String::new();
    let mut closed: Option<char> = None;

    for run in normalize_runs(runs) {
        let marker = match (run.bold, run.italic) {
            (true, true) => "***",
            (true, false) => "**",
            (false, true) => "*",
            (false, false) => "",
        };
        if marker.is_empty() {
            push_after_marker(&mut out, &escape(&run.text), &mut closed);
            continue;
        }

        // Emphasis markers must hug non-whitespace, so edge spaces go outside.
        let trimmed = run.text.trim();
        let start = run.text.len() - run.text.trim_start().len();
        let end = start + trimmed.len();
        push_after_marker(&mut out, &escape(&run.text[..start]), &mut closed);

        let first = trimmed.chars().next().unwrap_or(' ');
        let needs_separator = closed.take().is_some()
            || out.chars().last().is_some_and(|prev| {
                !prev.is_whitespace() && (prev == '*' || !first.is_alphanumeric())
            });
        if needs_separator {
            out.push_str(SEPARATOR);
        }

        out.push_str(marker);
        out.push_str(&escape(trimmed));
        out.push_str(marker);
        closed = trimmed.chars().last();
        push_after_marker(&mut out, &escape(&run.text[end..]), &mut closed);
    }
    protect_whitespace(&out)
}

/// Decodes block content into styled runs, merging adjacent runs of equal style
pub fn decode_markup(content: &str) -> Vec<StyledRun> {
    let mut runs: Vec<StyledRun> = Vec::new();
    let mut bold = 0usize;
    let mut italic = 0usize;
    let mut pending_break = false;

    let push = |runs: &mut Vec<StyledRun>, text: &str, bold: bool, italic: bool| {
        if let Some(last) = runs.last_mut() {
            if last.same_style(bold, italic) {
                last.text.push_str(text);
                return;
            }
        }
        runs.push(StyledRun::styled(text, bold, italic));
    };

    for event in Parser::new(content) {
        match event {
            Event::Start(Tag::Strong) => bold += 1,
            Event::End(TagEnd::Strong) => bold = bold.saturating_sub(1),
            Event::Start(Tag::Emphasis) => italic += 1,
            Event::End(TagEnd::Emphasis) => italic = italic.saturating_sub(1),
            Event::End(TagEnd::Paragraph) | Event::End(TagEnd::Heading(_)) => {
                pending_break = true;
            }
            Event::Text(text) | Event::Code(text) => {
                if pending_break {
                    push(&mut runs, "\n\n", false, false);
                    pending_break = false;
                }
                push(&mut runs, &text, bold > 0, italic > 0);
            }
            Event::SoftBreak | Event::HardBreak => push(&mut runs, "\n", bold > 0, italic > 0),
            _ => {}
        }
    }
    runs
}

/// Block content with all style markup removed
pub fn markup_to_plain_text(content: &str) -> String {
    let runs = decode_markup(content);
    if runs.is_empty() && !content.trim().is_empty() {
        // Nothing parseable; show the raw text rather than nothing.
        return content.to_string();
    }
    runs.into_iter().map(|run| run.text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bold_and_italic() {
        let runs = decode_markup("Hello **bold** and *italic*");
        assert_eq!(
            runs,
            vec![
                StyledRun::plain("Hello "),
                StyledRun::styled("bold", true, false),
                StyledRun::plain(" and "),
                StyledRun::styled("italic", false, true),
            ]
        );
    }

    #[test]
    fn test_encode_then_decode_keeps_runs() {
        let runs = vec![
            StyledRun::plain("Lab "),
            StyledRun::styled("results", true, false),
            StyledRun::plain(": "),
            StyledRun::styled("2 * 3 = 6", false, true),
        ];
        let encoded = encode_markup(&runs);
        assert_eq!(decode_markup(&encoded), runs);
    }

    #[test]
    fn test_literal_punctuation_survives() {
        let runs = vec![StyledRun::plain("a*b_c #tag [x]")];
        let encoded = encode_markup(&runs);
        assert_eq!(markup_to_plain_text(&encoded), "a*b_c #tag [x]");
    }

    #[test]
    fn test_edge_whitespace_moves_outside_markers() {
        let encoded = encode_markup(&[
            StyledRun::plain("say"),
            StyledRun::styled(" hi ", true, false),
            StyledRun::plain("now"),
        ]);
        assert_eq!(encoded, "say **hi** now");
    }

    fn assert_reversible(runs: Vec<StyledRun>) {
        let encoded = encode_markup(&runs);
        assert_eq!(
            decode_markup(&encoded),
            normalize_runs(&runs),
            "encoded as {:?}",
            encoded
        );
    }

    #[test]
    fn test_indentation_survives() {
        assert_reversible(vec![StyledRun::plain("    indented line")]);
        assert_reversible(vec![StyledRun::plain("first\n  second\n\tthird")]);
        assert_reversible(vec![
            StyledRun::plain("  "),
            StyledRun::styled("lead", true, false),
        ]);
    }

    #[test]
    fn test_styled_run_spanning_blank_line() {
        let runs = vec![StyledRun::styled("para one\n\npara two", true, false)];
        assert_reversible(runs.clone());
        assert_eq!(decode_markup(&encode_markup(&runs)), runs);
    }

    #[test]
    fn test_blank_lines_and_edge_newlines_survive() {
        assert_reversible(vec![StyledRun::plain("a\n\n\nb\n")]);
        assert_reversible(vec![StyledRun::plain("\nstarts low")]);
        assert_reversible(vec![StyledRun::plain("trailing  \nspaces \t")]);
        assert_reversible(vec![StyledRun::plain("carriage\r\nreturn")]);
    }

    #[test]
    fn test_whitespace_only_runs_survive() {
        assert_reversible(vec![StyledRun::plain("   ")]);
        assert_reversible(vec![
            StyledRun::styled("a", true, false),
            StyledRun::plain(" "),
            StyledRun::styled("b", false, true),
        ]);

        let decoded = decode_markup(&encode_markup(&[StyledRun::styled("  ", true, false)]));
        assert_eq!(decoded, vec![StyledRun::plain("  ")]);
    }

    #[test]
    fn test_adjacent_and_punctuated_runs() {
        assert_reversible(vec![
            StyledRun::styled("a", false, true),
            StyledRun::styled("b", true, false),
            StyledRun::styled("c", true, true),
        ]);
        assert_reversible(vec![
            StyledRun::plain("x"),
            StyledRun::styled("(y)", true, false),
            StyledRun::plain("z"),
        ]);
        assert_reversible(vec![
            StyledRun::plain("ends with *"),
            StyledRun::styled("*starts with", false, true),
            StyledRun::plain("."),
        ]);
        assert_reversible(vec![StyledRun::styled("🧪", true, false), StyledRun::plain("lab")]);
    }

    #[test]
    fn test_normalize_runs_merges_and_drops() {
        let runs = vec![
            StyledRun::plain("a"),
            StyledRun::plain(""),
            StyledRun::styled(" ", false, true),
            StyledRun::plain("b"),
            StyledRun::styled("c", true, false),
        ];
        assert_eq!(
            normalize_runs(&runs),
            vec![StyledRun::plain("a b"), StyledRun::styled("c", true, false)]
        );
    }

    #[test]
    fn test_plain_text_strips_markup() {
        assert_eq!(markup_to_plain_text("***both*** plain"), "both plain");
        assert_eq!(markup_to_plain_text("line one\nline two"), "line one\nline two");
        assert_eq!(markup_to_plain_text(""), "");
    }
}
