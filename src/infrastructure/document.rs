//! 文档模型 - 基础设施层
//!
//! 把原始 HTML 解析成可查询的树，只暴露只读的查询能力。
//! 选择器写错或没有匹配都返回空序列，调用方把"没找到"当作跳过条件。

use scraper::{ElementRef, Html, Node, Selector};
use tracing::warn;

/// 解析后的 HTML 文档
pub struct Document {
    html: Html,
}

impl Document {
    /// 解析完整页面
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// 解析 HTML 片段（题干、答案等）
    pub fn parse_fragment(markup: &str) -> Self {
        Self {
            html: Html::parse_fragment(markup),
        }
    }

    /// 根元素（片段模式下是包裹片段的 `<html>`）
    pub fn root(&self) -> Element<'_> {
        Element {
            inner: self.html.root_element(),
        }
    }

    /// 按 CSS 选择器查询，保持文档顺序
    pub fn select(&self, css: &str) -> Vec<Element<'_>> {
        self.root().select(css)
    }

    /// 第一个匹配的元素
    pub fn first(&self, css: &str) -> Option<Element<'_>> {
        self.root().first(css)
    }
}

/// 子节点：元素或文本
#[derive(Debug, Clone, Copy)]
pub enum ChildNode<'a> {
    Element(Element<'a>),
    Text(&'a str),
    /// 注释等其他节点
    Other,
}

/// 文档中的一个元素
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    inner: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// 在后代中按 CSS 选择器查询
    pub fn select(&self, css: &str) -> Vec<Element<'a>> {
        match parse_selector(css) {
            Some(selector) => self
                .inner
                .select(&selector)
                .map(|inner| Element { inner })
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn first(&self, css: &str) -> Option<Element<'a>> {
        let selector = parse_selector(css)?;
        self.inner.select(&selector).next().map(|inner| Element { inner })
    }

    /// 标签名（小写）
    pub fn name(&self) -> &'a str {
        self.inner.value().name()
    }

    /// 属性值
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.inner.value().attr(name)
    }

    pub fn class_list(&self) -> Vec<&'a str> {
        self.inner.value().classes().collect()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.inner.value().classes().any(|c| c == class)
    }

    /// 所有文本，空白折叠为单个空格并去掉首尾空白
    pub fn text(&self) -> String {
        let raw: String = self.inner.text().collect();
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// 内部 HTML
    pub fn inner_markup(&self) -> String {
        self.inner.inner_html()
    }

    /// 直接子元素
    pub fn children(&self) -> Vec<Element<'a>> {
        self.inner
            .children()
            .filter_map(ElementRef::wrap)
            .map(|inner| Element { inner })
            .collect()
    }

    /// 直接子节点（包括文本节点）
    pub fn child_nodes(&self) -> Vec<ChildNode<'a>> {
        self.inner
            .children()
            .map(|node| match node.value() {
                Node::Text(text) => ChildNode::Text(&**text),
                Node::Element(_) => ElementRef::wrap(node)
                    .map(|inner| ChildNode::Element(Element { inner }))
                    .unwrap_or(ChildNode::Other),
                _ => ChildNode::Other,
            })
            .collect()
    }

    /// 是否有匹配选择器的后代
    pub fn contains(&self, css: &str) -> bool {
        self.first(css).is_some()
    }

    /// 在 `boundary` 以内（不含 `boundary` 本身及其外层）是否有匹配选择器的祖先元素
    pub fn has_ancestor_within(&self, css: &str, boundary: &Element<'a>) -> bool {
        let Some(selector) = parse_selector(css) else {
            return false;
        };
        let stop = boundary.inner.id();
        self.inner
            .ancestors()
            .take_while(|node| node.id() != stop)
            .filter_map(ElementRef::wrap)
            .any(|ancestor| selector.matches(&ancestor))
    }
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!("无效的选择器 '{}': {:?}", css, e);
            None
        }
    }
}
