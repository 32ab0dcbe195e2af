//! Minimal tag/attribute scanner for the feed and timed-text formats.
//!
//! This is not a general XML parser. It finds elements by exact name, hands
//! back their raw inner text, and never fails: anything it cannot make sense
//! of is skipped so one malformed entry does not sink the whole document.

use std::sync::LazyLock;

use quick_xml::events::BytesStart;
use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

static NUMERIC_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#[0-9]+;").expect("valid numeric reference regex"));

/// One element found by [`elements`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    head: &'a str,
    name_len: usize,
    inner: &'a str,
}

impl<'a> Element<'a> {
    /// Raw content between the start and end tags (empty when self-closing).
    pub fn inner(&self) -> &'a str {
        self.inner
    }

    /// Inner content with markup stripped, entities decoded and whitespace trimmed.
    pub fn text(&self) -> String {
        decode_entities(&strip_tags(self.inner)).trim().to_string()
    }

    /// Decoded value of attribute `name`, if present and well-formed.
    pub fn attr(&self, name: &str) -> Option<String> {
        let start = BytesStart::from_content(self.head, self.name_len);
        start
            .attributes()
            .flatten()
            .find(|a| a.key.as_ref() == name.as_bytes())
            .map(|a| decode_entities(&String::from_utf8_lossy(&a.value)))
    }
}

/// Iterator over elements with an exact tag name, in document order.
pub struct Elements<'a> {
    rest: &'a str,
    name_len: usize,
    open: String,
    close: String,
}

/// Scan `xml` for `<name ...>...</name>` and `<name .../>` elements.
///
/// Same-name nesting is not tracked: the first closing tag ends the element.
pub fn elements<'a>(xml: &'a str, name: &str) -> Elements<'a> {
    Elements {
        rest: xml,
        name_len: name.len(),
        open: format!("<{name}"),
        close: format!("</{name}>"),
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Element<'a>> {
        let rest = self.rest;
        let Some(at) = find_open(rest, &self.open) else {
            self.rest = "";
            return None;
        };
        let head_start = at + 1;
        let Some(end) = start_tag_end(&rest[head_start..]) else {
            self.rest = "";
            return None;
        };
        let head = &rest[head_start..head_start + end];
        let body_start = head_start + end + 1;

        if let Some(head) = head.strip_suffix('/') {
            self.rest = &rest[body_start..];
            return Some(Element {
                head,
                name_len: self.name_len,
                inner: "",
            });
        }

        let Some(close_at) = rest[body_start..].find(&self.close) else {
            self.rest = "";
            return None;
        };
        let inner = &rest[body_start..body_start + close_at];
        self.rest = &rest[body_start + close_at + self.close.len()..];
        Some(Element {
            head,
            name_len: self.name_len,
            inner,
        })
    }
}

/// Position of the next `<name` whose name is not just a prefix of a longer one.
fn find_open(hay: &str, open: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(i) = hay[from..].find(open) {
        let at = from + i;
        match hay[at + open.len()..].chars().next() {
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => return Some(at),
            None => return None,
            _ => from = at + open.len(),
        }
    }
    None
}

/// Offset of the `>` closing a start tag, ignoring any inside quoted values.
fn start_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return Some(i),
            None => {}
        }
    }
    None
}

/// First `name` element in `xml`.
pub fn first<'a>(xml: &'a str, name: &str) -> Option<Element<'a>> {
    elements(xml, name).next()
}

/// Trimmed raw inner text of the first `name` element.
pub fn child_text<'a>(xml: &'a str, name: &str) -> Option<&'a str> {
    first(xml, name).map(|e| e.inner().trim())
}

/// Trimmed raw inner text of `child` inside the first `parent` element.
pub fn nested_text<'a>(xml: &'a str, parent: &str, child: &str) -> Option<&'a str> {
    child_text(first(xml, parent)?.inner(), child)
}

/// Attribute `attr` of the first `name` element.
pub fn child_attr(xml: &str, name: &str, attr: &str) -> Option<String> {
    first(xml, name)?.attr(attr)
}

pub fn strip_tags(s: &str) -> String {
    TAG_RE.replace_all(s, "").into_owned()
}

/// Decode named entities and numeric character references. Unknown entities pass through.
///
/// Decimal references are decoded once more after `&amp;`, so the
/// double-escaped `&amp;#39;` that caption tracks carry comes out as `'`.
pub fn decode_entities(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    NUMERIC_REF_RE
        .replace_all(&decoded, |caps: &regex::Captures<'_>| {
            html_escape::decode_html_entities(&caps[0]).into_owned()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_named_entities() {
        assert_eq!(decode_entities("A &amp; B"), "A & B");
        assert_eq!(decode_entities("&lt;b&gt;"), "<b>");
        assert_eq!(decode_entities("&quot;hi&quot;"), "\"hi\"");
        assert_eq!(decode_entities("it&#39;s"), "it's");
        assert_eq!(decode_entities("&apos;"), "'");
    }

    #[test]
    fn test_decode_numeric_references() {
        assert_eq!(decode_entities("&#39;s"), "'s");
        assert_eq!(decode_entities("caf&#233;"), "café");
        assert_eq!(decode_entities("&#x41;"), "A");
    }

    #[test]
    fn test_decode_double_escaped_numeric_reference() {
        assert_eq!(decode_entities("it&amp;#39;s"), "it's");
        assert_eq!(decode_entities("&amp;#233;"), "é");
        // named entities are not decoded twice
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_entities("&amp;#x41;"), "&#x41;");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<s>Hello</s><s t=\"40\"> world</s>"), "Hello world");
    }

    #[test]
    fn test_elements_in_order() {
        let xml = r#"<a x="1">one</a><b>skip</b><a x="2">two</a>"#;
        let found: Vec<_> = elements(xml, "a").map(|e| (e.attr("x"), e.text())).collect();
        assert_eq!(
            found,
            vec![
                (Some("1".to_string()), "one".to_string()),
                (Some("2".to_string()), "two".to_string()),
            ]
        );
    }

    #[test]
    fn test_name_prefix_is_not_a_match() {
        let xml = "<param>no</param><p>yes</p>";
        let texts: Vec<_> = elements(xml, "p").map(|e| e.text()).collect();
        assert_eq!(texts, vec!["yes"]);
    }

    #[test]
    fn test_self_closing_element() {
        let xml = r#"<media:thumbnail url="https://i.ytimg.com/vi/x/hqdefault.jpg" width="480"/>"#;
        assert_eq!(
            child_attr(xml, "media:thumbnail", "url").as_deref(),
            Some("https://i.ytimg.com/vi/x/hqdefault.jpg")
        );
        assert_eq!(first(xml, "media:thumbnail").map(|e| e.inner()), Some(""));
    }

    #[test]
    fn test_quoted_angle_bracket_in_attribute() {
        let xml = r#"<p title="a > b">body</p>"#;
        let el = first(xml, "p").unwrap();
        assert_eq!(el.attr("title").as_deref(), Some("a > b"));
        assert_eq!(el.inner(), "body");
    }

    #[test]
    fn test_unterminated_element_ends_scan() {
        let xml = "<entry>complete</entry><entry>truncated";
        assert_eq!(elements(xml, "entry").count(), 1);
    }

    #[test]
    fn test_nested_text() {
        let xml = "<author><name>Rick</name><uri>x</uri></author><name>other</name>";
        assert_eq!(nested_text(xml, "author", "name"), Some("Rick"));
        assert_eq!(nested_text(xml, "missing", "name"), None);
    }

    #[test]
    fn test_attribute_entities_decoded() {
        let xml = r#"<t v="a &amp; b"/>"#;
        assert_eq!(child_attr(xml, "t", "v").as_deref(), Some("a & b"));
    }
}
