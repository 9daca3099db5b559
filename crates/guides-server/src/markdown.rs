/// Markdown body compiler.
///
/// Transforms, in order: GFM extensions (tables, strikethrough, task lists), fenced code
/// highlighting with class-based spans, and heading anchor ids. Output is an HTML string.
use std::collections::HashMap;
use std::ops::Range;
use std::sync::OnceLock;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::slug::slugify_title;

const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("unterminated code fence opened at line {line}")]
    UnterminatedFence { line: usize },

    #[error("failed to highlight {language} code block: {message}")]
    Highlight { language: String, message: String },
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

pub(crate) fn options() -> Options {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);
    opts
}

/// Compile a markdown body to HTML.
pub fn compile(body: &str) -> Result<String, CompileError> {
    let events: Vec<(Event<'_>, Range<usize>)> =
        Parser::new_ext(body, options()).into_offset_iter().collect();
    check_fences(body, &events)?;

    let events = highlight_code_blocks(events.into_iter().map(|(event, _)| event).collect())?;
    let events = inject_heading_ids(events);

    let mut out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    Ok(out)
}

/// "<n> min read" at 200 words per minute, never less than one minute.
pub fn reading_time(body: &str) -> String {
    let words = body.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{minutes} min read")
}

/// Reject a fenced code block that is never closed. CommonMark would silently run it to
/// the end of the document, swallowing the rest of the guide. Blocks closed implicitly by
/// their list item or blockquote ending are fine.
fn check_fences(body: &str, events: &[(Event<'_>, Range<usize>)]) -> Result<(), CompileError> {
    for (event, range) in events {
        let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) = event else {
            continue;
        };
        if !body[range.end..].trim().is_empty() {
            continue;
        }
        if !has_closing_fence(&body[range.clone()]) {
            let line = body[..range.start].matches('\n').count() + 1;
            return Err(CompileError::UnterminatedFence { line });
        }
    }
    Ok(())
}

/// Whether the last line of a fenced block's source closes the fence it opens with.
fn has_closing_fence(block: &str) -> bool {
    let mut lines = block.trim_end().lines();
    let Some(opening) = lines
        .next()
        .map(|line| line.trim_start_matches(|c: char| c != '`' && c != '~'))
    else {
        return false;
    };
    let Some(closing) = lines.last().map(strip_container) else {
        return false;
    };
    let Some(marker) = opening.chars().next() else {
        return false;
    };
    let open_run = opening.chars().take_while(|c| *c == marker).count();
    let close_run = closing.chars().take_while(|c| *c == marker).count();
    close_run >= open_run && closing[close_run..].trim().is_empty()
}

/// Drop indentation and blockquote markers in front of a fence.
fn strip_container(line: &str) -> &str {
    line.trim_start_matches(|c: char| c == ' ' || c == '\t' || c == '>')
}

fn highlight_code_blocks(events: Vec<Event<'_>>) -> Result<Vec<Event<'_>>, CompileError> {
    let mut out = Vec::with_capacity(events.len());
    let mut block: Option<(String, String)> = None;

    for event in events {
        if let Some((language, code)) = block.as_mut() {
            match event {
                Event::Text(text) => code.push_str(&text),
                Event::End(TagEnd::CodeBlock) => {
                    let html = highlight(language, code)?;
                    out.push(Event::Html(CowStr::from(html)));
                    block = None;
                }
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or_default().to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                block = Some((language, String::new()));
            }
            event => out.push(event),
        }
    }

    Ok(out)
}

fn highlight(language: &str, code: &str) -> Result<String, CompileError> {
    let ss = syntax_set();
    let syntax = if language.is_empty() {
        ss.find_syntax_plain_text()
    } else {
        ss.find_syntax_by_token(language)
            .unwrap_or_else(|| ss.find_syntax_plain_text())
    };

    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, ss, ClassStyle::SpacedPrefixed { prefix: "hl-" });
    for line in LinesWithEndings::from(code) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|e| CompileError::Highlight {
                language: language.to_string(),
                message: e.to_string(),
            })?;
    }

    let class = if language.is_empty() {
        String::new()
    } else {
        format!(" class=\"language-{}\"", escape_attr(language))
    };
    Ok(format!("<pre><code{class}>{}</code></pre>\n", generator.finalize()))
}

/// Give every heading without an explicit id one derived from its text. Repeated ids get
/// `-1`, `-2`, ... suffixes in document order.
fn inject_heading_ids(mut events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    for start in 0..events.len() {
        let Event::Start(Tag::Heading { id: None, .. }) = &events[start] else {
            continue;
        };

        let mut text = String::new();
        for event in &events[start + 1..] {
            match event {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                _ => {}
            }
        }

        let base = slugify_title(&text);
        let base = if base.is_empty() { "section".to_string() } else { base };
        let count = seen.entry(base.clone()).or_insert(0);
        let anchor = if *count == 0 {
            base
        } else {
            format!("{base}-{count}")
        };
        *count += 1;

        if let Event::Start(Tag::Heading { id, .. }) = &mut events[start] {
            *id = Some(CowStr::from(anchor));
        }
    }

    events
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
