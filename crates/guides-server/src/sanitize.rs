/// Strip active content from guide bodies before they are stored or previewed.
///
/// Markdown passes through untouched, and so do inline code spans and code blocks. Outside
/// code, `script`, `style`, `iframe`, `object` and `embed` elements are removed with their
/// content, and tags lose `on*` event handlers and `javascript:` URLs in `href`/`src`.
use std::ops::Range;
use std::sync::OnceLock;

use pulldown_cmark::{Event, Parser, Tag};
use regex::{Captures, Regex};

use crate::markdown;

const BLOCKED_ELEMENTS: [&str; 5] = ["script", "style", "iframe", "object", "embed"];

fn paired_elements() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        BLOCKED_ELEMENTS
            .iter()
            .map(|tag| {
                Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).expect("valid regex")
            })
            .collect()
    })
}

/// Self-closing forms, and any opening or closing tag left over without a partner.
fn stray_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)</?(?:{})\b[^>]*>", BLOCKED_ELEMENTS.join("|")))
            .expect("valid regex")
    })
}

fn html_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<[A-Za-z][A-Za-z0-9-]*(?:"[^"]*"|'[^']*'|[^'">])*>"#).expect("valid regex")
    })
}

fn event_handlers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).expect("valid regex")
    })
}

fn javascript_urls() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\b(href|src)\s*=\s*(["']?)\s*javascript:[^"'\s>]*(["']?)"#)
            .expect("valid regex")
    })
}

pub fn sanitize(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for range in code_ranges(content) {
        if range.start < cursor {
            continue;
        }
        out.push_str(&clean_markup(&content[cursor..range.start]));
        out.push_str(&content[range.clone()]);
        cursor = range.end;
    }
    out.push_str(&clean_markup(&content[cursor..]));
    out
}

/// Byte ranges of code blocks and inline code spans, in document order.
fn code_ranges(content: &str) -> Vec<Range<usize>> {
    Parser::new_ext(content, markdown::options())
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::CodeBlock(_)) | Event::Code(_) => Some(range),
            _ => None,
        })
        .collect()
}

fn clean_markup(segment: &str) -> String {
    let mut out = segment.to_string();
    for re in paired_elements() {
        out = re.replace_all(&out, "").into_owned();
    }
    out = stray_tags().replace_all(&out, "").into_owned();
    html_tags()
        .replace_all(&out, |caps: &Captures| {
            let tag = event_handlers().replace_all(&caps[0], "");
            javascript_urls().replace_all(&tag, "$1=$2#$3").into_owned()
        })
        .into_owned()
}
