//! A small, forgiving HTML fragment tokenizer and serializer.
//!
//! Good enough for server-rendered fragments: tags, attributes (quoted, unquoted and
//! boolean), void and raw-text elements, comments and common character references.
//! Unknown end tags are dropped and unclosed elements close at the end of input.

/// A node produced by [`parse_fragment`], before it is adopted by a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Parsed {
    Element { tag: String, attrs: Vec<(String, String)>, children: Vec<Self> },
    Text(String),
    Comment(String),
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Open elements past this depth are closed immediately; their content becomes siblings.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Elements that implicitly close an open sibling of the same name.
const SELF_NESTING_CLOSERS: &[&str] = &["li", "option", "tr", "td", "th", "dt", "dd"];

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Escapes nothing inside these when serializing.
fn is_unescaped_text(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

struct Open {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Parsed>,
}

struct Builder {
    roots: Vec<Parsed>,
    stack: Vec<Open>,
}

impl Builder {
    fn push(&mut self, node: Parsed) {
        match self.stack.last_mut() {
            Some(open) => open.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn close_top(&mut self) {
        if let Some(open) = self.stack.pop() {
            self.push(Parsed::Element { tag: open.tag, attrs: open.attrs, children: open.children });
        }
    }

    fn close_until(&mut self, tag: &str) {
        if !self.stack.iter().any(|open| open.tag == tag) {
            return;
        }
        while let Some(open) = self.stack.last() {
            let done = open.tag == tag;
            self.close_top();
            if done {
                break;
            }
        }
    }

    fn finish(mut self) -> Vec<Parsed> {
        while !self.stack.is_empty() {
            self.close_top();
        }
        self.roots
    }
}

/// Parses an HTML fragment into a forest of nodes.
pub(crate) fn parse_fragment(input: &str) -> Vec<Parsed> {
    let mut builder = Builder { roots: Vec::new(), stack: Vec::new() };
    let mut rest = input;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            push_text(&mut builder, rest);
            break;
        };
        if lt > 0 {
            push_text(&mut builder, &rest[..lt]);
            rest = &rest[lt..];
        }

        if let Some(body) = rest.strip_prefix("<!--") {
            let (comment, after) = body.split_once("-->").unwrap_or((body, ""));
            builder.push(Parsed::Comment(comment.to_owned()));
            rest = after;
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            rest = rest.find('>').map_or("", |end| &rest[end + 1..]);
        } else if let Some(body) = rest.strip_prefix("</") {
            let end = body.find('>').unwrap_or(body.len());
            let name = body[..end].trim().to_ascii_lowercase();
            builder.close_until(&name);
            rest = body.get(end + 1..).unwrap_or("");
        } else if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            rest = parse_start_tag(&mut builder, &rest[1..]);
        } else {
            push_text(&mut builder, "<");
            rest = &rest[1..];
        }
    }

    builder.finish()
}

fn push_text(builder: &mut Builder, raw: &str) {
    if !raw.is_empty() {
        builder.push(Parsed::Text(decode_entities(raw)));
    }
}

/// Parses `tag attrs...>` (the leading `<` already consumed) and returns the remaining input.
fn parse_start_tag<'a>(builder: &mut Builder, input: &'a str) -> &'a str {
    let name_end =
        input.find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>').unwrap_or(input.len());
    let tag = input[..name_end].to_ascii_lowercase();
    let mut rest = &input[name_end..];
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        if let Some(after) = rest.strip_prefix("/>") {
            self_closing = true;
            rest = after;
            break;
        }
        if let Some(after) = rest.strip_prefix('>') {
            rest = after;
            break;
        }
        if let Some(after) = rest.strip_prefix('/') {
            rest = after;
            continue;
        }

        let name_end = rest
            .find(|c: char| c.is_ascii_whitespace() || matches!(c, '=' | '>' | '/'))
            .unwrap_or(rest.len());
        let name = rest[..name_end].to_ascii_lowercase();
        rest = rest[name_end..].trim_start();

        let value = if let Some(after) = rest.strip_prefix('=') {
            let after = after.trim_start();
            let (raw, remaining) = match after.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &after[1..];
                    match body.find(quote) {
                        Some(end) => (&body[..end], &body[end + 1..]),
                        None => (body, ""),
                    }
                },
                _ => {
                    let end = after
                        .find(|c: char| c.is_ascii_whitespace() || c == '>')
                        .unwrap_or(after.len());
                    (&after[..end], &after[end..])
                },
            };
            rest = remaining;
            decode_entities(raw)
        } else {
            String::new()
        };

        if !name.is_empty() && !attrs.iter().any(|(existing, _)| *existing == name) {
            attrs.push((name, value));
        }
    }

    if SELF_NESTING_CLOSERS.contains(&tag.as_str())
        && builder.stack.last().is_some_and(|open| open.tag == tag)
    {
        builder.close_top();
    }

    if is_void(&tag) || self_closing || builder.stack.len() >= MAX_NESTING_DEPTH {
        builder.push(Parsed::Element { tag, attrs, children: Vec::new() });
        return rest;
    }

    if is_raw_text(&tag) {
        let (text, after) = split_raw_text(rest, &tag);
        let children = if text.is_empty() {
            Vec::new()
        } else if is_unescaped_text(&tag) {
            vec![Parsed::Text(text.to_owned())]
        } else {
            vec![Parsed::Text(decode_entities(text))]
        };
        builder.push(Parsed::Element { tag, attrs, children });
        return after;
    }

    builder.stack.push(Open { tag, attrs, children: Vec::new() });
    rest
}

/// Splits raw text content at the matching `</tag>` (case-insensitive).
fn split_raw_text<'a>(input: &'a str, tag: &str) -> (&'a str, &'a str) {
    let needle = format!("</{tag}");
    let lowered = input.to_ascii_lowercase();
    match lowered.find(&needle) {
        Some(start) => {
            let after_name = &input[start + needle.len()..];
            let after = after_name.find('>').map_or("", |end| &after_name[end + 1..]);
            (&input[..start], after)
        },
        None => (input, ""),
    }
}

pub(crate) fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_owned();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match rest.find(';').filter(|end| *end <= 10).and_then(|end| {
            decode_reference(&rest[1..end]).map(|decoded| (decoded, end))
        }) {
            Some((decoded, end)) => {
                out.push(decoded);
                rest = &rest[end + 1..];
            },
            None => {
                out.push('&');
                rest = &rest[1..];
            },
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "times" => '\u{d7}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        _ => return None,
    })
}

pub(crate) fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

pub(crate) fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

/// Escapes `text` so it is safe both as element content and inside a quoted attribute.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

pub(crate) fn keeps_raw_text(tag: &str) -> bool {
    is_unescaped_text(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_for_templates() {
        assert_eq!(escape(r#"<b title="x">Tom & Jerry</b>"#), "&lt;b title=&quot;x&quot;&gt;Tom &amp; Jerry&lt;/b&gt;");
    }

    fn element(tag: &str, attrs: &[(&str, &str)], children: Vec<Parsed>) -> Parsed {
        Parsed::Element {
            tag: tag.to_owned(),
            attrs: attrs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect(),
            children,
        }
    }

    fn text(s: &str) -> Parsed {
        Parsed::Text(s.to_owned())
    }

    #[test]
    fn test_parse_nested_elements_and_attributes() {
        let parsed = parse_fragment(
            r#"<div id="main" class='a b' data-ln-ajax hidden=yes><a href="/docs">Docs</a></div>"#,
        );
        assert_eq!(
            parsed,
            vec![element(
                "div",
                &[("id", "main"), ("class", "a b"), ("data-ln-ajax", ""), ("hidden", "yes")],
                vec![element("a", &[("href", "/docs")], vec![text("Docs")])],
            )]
        );
    }

    #[test]
    fn test_void_and_self_closing() {
        let parsed = parse_fragment(r#"<input name=q><br/><span/>tail"#);
        assert_eq!(
            parsed,
            vec![
                element("input", &[("name", "q")], vec![]),
                element("br", &[], vec![]),
                element("span", &[], vec![]),
                text("tail"),
            ]
        );
    }

    #[test]
    fn test_unknown_end_tags_are_ignored_and_unclosed_tags_close() {
        let parsed = parse_fragment("<ul><li>one<li>two</section></ul><p>open");
        assert_eq!(
            parsed,
            vec![
                element(
                    "ul",
                    &[],
                    vec![element("li", &[], vec![text("one")]), element("li", &[], vec![text("two")])],
                ),
                element("p", &[], vec![text("open")]),
            ]
        );
    }

    #[test]
    fn test_raw_text_keeps_markup() {
        let parsed = parse_fragment("<script>if (a < b) { x = '<p>'; }</SCRIPT><b>x</b>");
        assert_eq!(
            parsed,
            vec![
                element("script", &[], vec![text("if (a < b) { x = '<p>'; }")]),
                element("b", &[], vec![text("x")]),
            ]
        );
    }

    #[test]
    fn test_comments_and_doctype() {
        let parsed = parse_fragment("<!DOCTYPE html><!-- note --><p>x</p>");
        assert_eq!(parsed, vec![Parsed::Comment(" note ".to_owned()), element("p", &[], vec![text("x")])]);
    }

    #[test]
    fn test_nesting_is_capped() {
        let parsed = parse_fragment(&"<div>".repeat(MAX_NESTING_DEPTH + 10));
        let mut depth = 0;
        let mut level = &parsed;
        while let Some(Parsed::Element { children, .. }) = level.first() {
            depth += 1;
            level = children;
        }
        assert_eq!(depth, MAX_NESTING_DEPTH + 1);
    }

    #[test]
    fn test_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;3 &#39;q&#x27; &times; &bogus; & done"), "a & b <3 'q' \u{d7} &bogus; & done");
        assert_eq!(parse_fragment("1 < 2"), vec![text("1 "), text("<"), text(" 2")]);
    }
}
