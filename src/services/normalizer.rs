//! 内容规范化 - 业务能力层
//!
//! 去掉 `<p>` 上的 class，重新序列化，再把所有空白折叠成一个空格。
//! 结果可以直接入库；对同一段内容重复规范化结果不变。

use phf::phf_set;
use scraper::{ElementRef, Html, Node};

static VOID_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
};

/// 内容按原样输出、不做转义的元素
static RAW_TEXT_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "script", "style", "xmp", "iframe", "noembed", "noframes", "noscript", "plaintext",
};

/// 规范化一段 HTML 片段
pub fn normalize(fragment: &str) -> String {
    if fragment.is_empty() {
        return String::new();
    }

    let html = Html::parse_fragment(fragment);
    let mut out = String::with_capacity(fragment.len());
    serialize_children(html.root_element(), false, &mut out);

    collapse_whitespace(&out)
}

/// 所有空白（含换行）折叠为单个空格，去掉首尾空白
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn serialize_children(element: ElementRef<'_>, raw_text: bool, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                if raw_text {
                    out.push_str(text);
                } else {
                    escape_into(text, false, out);
                }
            }
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    serialize_element(child, out);
                }
            }
            _ => {}
        }
    }
}

fn serialize_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        if name == "p" && attr == "class" {
            continue;
        }
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        escape_into(value, true, out);
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(name) {
        return;
    }
    serialize_children(element, RAW_TEXT_ELEMENTS.contains(name), out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn escape_into(text: &str, attr_mode: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attr_mode => out.push_str("&quot;"),
            '<' if !attr_mode => out.push_str("&lt;"),
            '>' if !attr_mode => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
