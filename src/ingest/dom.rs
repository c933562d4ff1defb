//! A small, tolerant element tree for the HTML step report.
//!
//! The report is not well-formed XML (void elements, `&nbsp;`, inline
//! scripts), so the tree builder skips `<script>`/`<style>` bodies, never
//! pushes void elements onto the open-element stack, closes any elements left
//! open when an outer end tag arrives, and drops stray end tags.

use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use thiserror::Error;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Error)]
#[error("malformed markup near byte {position}: {message}")]
pub struct DomError {
    pub position: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lower-cased tag name. The synthetic root is named `#document`.
    pub name: String,
    pub children: Vec<Node>,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// First descendant (depth-first, document order) with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements()
            .find_map(|el| if el.is(name) { Some(el) } else { el.find(name) })
    }

    /// The element's visible text: all descendant text with whitespace runs
    /// collapsed to single spaces and the ends trimmed.
    pub fn text(&self) -> String {
        let mut raw = String::new();
        self.collect_text(&mut raw);
        collapse_whitespace(&raw)
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => {
                    // Cell and block boundaries separate words.
                    out.push(' ');
                    el.collect_text(out);
                    out.push(' ');
                }
            }
        }
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses `html` into a tree rooted at a synthetic `#document` element.
pub fn parse_document(html: &str) -> Result<Element, DomError> {
    let source = strip_raw_text_elements(html);
    let mut reader = Reader::from_str(&source);
    reader.check_end_names(false);

    let mut stack = vec![Element::new("#document".to_string())];

    loop {
        let event = reader.read_event().map_err(|e| DomError {
            position: reader.buffer_position(),
            message: e.to_string(),
        })?;
        match event {
            Event::Start(start) => {
                let name = tag_name(start.name().as_ref());
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    append(&mut stack, Node::Element(Element::new(name)));
                } else {
                    stack.push(Element::new(name));
                }
            }
            Event::Empty(empty) => {
                let name = tag_name(empty.name().as_ref());
                append(&mut stack, Node::Element(Element::new(name)));
            }
            Event::End(end) => {
                let name = tag_name(end.name().as_ref());
                if let Some(open_at) = stack.iter().rposition(|el| el.name == name) {
                    close_down_to(&mut stack, open_at.max(1));
                }
            }
            Event::Text(text) => {
                let text = decode_text(&text);
                if !text.is_empty() {
                    append(&mut stack, Node::Text(text.into_owned()));
                }
            }
            Event::CData(cdata) => {
                let text = String::from_utf8_lossy(&cdata).into_owned();
                append(&mut stack, Node::Text(text));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    close_down_to(&mut stack, 1);
    Ok(stack.pop().unwrap_or_else(|| Element::new("#document".to_string())))
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn append(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

/// Pops every element at index `depth` and above, attaching each to its parent.
fn close_down_to(stack: &mut Vec<Element>, depth: usize) {
    while stack.len() > depth {
        if let Some(el) = stack.pop() {
            append(stack, Node::Element(el));
        }
    }
}

fn decode_text<'a>(text: &'a BytesText<'a>) -> Cow<'a, str> {
    text.unescape_with(html_entity)
        .unwrap_or_else(|_| Cow::Owned(decode_leniently(&String::from_utf8_lossy(text))))
}

/// Resolves references one at a time, leaving a bare `&` or an unknown
/// reference as written.
fn decode_leniently(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let resolved = rest
            .find(';')
            .filter(|&semi| semi > 1)
            .and_then(|semi| resolve_reference(&rest[1..semi]).map(|text| (text, semi)));
        match resolved {
            Some((text, semi)) => {
                out.push_str(&text);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_reference(name: &str) -> Option<Cow<'static, str>> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).map(|c| Cow::Owned(c.to_string()));
    }
    let text = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        other => html_entity(other)?,
    };
    Some(Cow::Borrowed(text))
}

fn html_entity(name: &str) -> Option<&'static str> {
    match name {
        "nbsp" | "ensp" | "emsp" | "thinsp" => Some(" "),
        "ndash" => Some("\u{2013}"),
        "mdash" => Some("\u{2014}"),
        "hellip" => Some("\u{2026}"),
        "laquo" => Some("\u{ab}"),
        "raquo" => Some("\u{bb}"),
        "copy" => Some("\u{a9}"),
        _ => None,
    }
}

/// Removes the bodies of `<script>` and `<style>` elements, which may contain
/// unescaped `<` that would derail the tokenizer.
fn strip_raw_text_elements(html: &str) -> Cow<'_, str> {
    let lower = html.to_ascii_lowercase();
    if !RAW_TEXT_ELEMENTS
        .iter()
        .any(|tag| lower.contains(&format!("<{tag}")))
    {
        return Cow::Borrowed(html);
    }

    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;
    while cursor < html.len() {
        let next = RAW_TEXT_ELEMENTS
            .iter()
            .filter_map(|tag| lower[cursor..].find(&format!("<{tag}")).map(|at| (cursor + at, *tag)))
            .min_by_key(|(at, _)| *at);
        let Some((start, tag)) = next else {
            break;
        };
        out.push_str(&html[cursor..start]);
        let close = format!("</{tag}");
        cursor = match lower[start..].find(&close) {
            Some(at) => {
                let close_start = start + at;
                match lower[close_start..].find('>') {
                    Some(gt) => close_start + gt + 1,
                    None => html.len(),
                }
            }
            None => html.len(),
        };
    }
    if cursor < html.len() {
        out.push_str(&html[cursor..]);
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_tree_from_loose_html() {
        let doc = parse_document(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>r</title></head>\
             <body><table><tr><td>a&nbsp;b<br>c</td></tr></table></body></html>",
        )
        .unwrap();
        let td = doc.find("td").unwrap();
        assert_eq!(td.text(), "a b c");
        assert!(doc.find("meta").unwrap().children.is_empty());
    }

    #[test]
    fn unclosed_cells_are_closed_by_outer_end_tag() {
        let doc = parse_document("<table><tr><td>one<td>two</tr><tr><td>three</tr></table>").unwrap();
        let table = doc.find("table").unwrap();
        let rows: Vec<_> = table.elements().filter(|el| el.is("tr")).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].text(), "three");
    }

    #[test]
    fn script_bodies_are_ignored() {
        let doc = parse_document(
            "<html><script>if (a < b && c > d) { x(); }</script><p>visible</p><style>p{}</style></html>",
        )
        .unwrap();
        assert_eq!(doc.text(), "visible");
        assert!(doc.find("script").is_none());
    }

    #[test]
    fn stray_end_tags_are_dropped() {
        let doc = parse_document("<div>x</span></div><p>y</p>").unwrap();
        assert_eq!(doc.find("div").unwrap().text(), "x");
        assert_eq!(doc.find("p").unwrap().text(), "y");
    }

    #[test]
    fn bare_ampersand_keeps_other_entities_decoded() {
        let doc = parse_document("<table><tr><td>Tom & Jerry&nbsp;&amp;&#33; &bogus; x</td></tr></table>")
            .unwrap();
        assert_eq!(doc.find("td").unwrap().text(), "Tom & Jerry &! &bogus; x");
    }
}
