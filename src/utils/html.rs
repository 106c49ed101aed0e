//! Small DOM helpers on top of `scraper` used by the page parsers.

use scraper::{ElementRef, Html, Node};

/// A direct child of an element, as seen by the page walkers.
pub enum Child<'a> {
    Text(&'a str),
    Element(ElementRef<'a>),
    /// Comments, doctype and processing instructions
    Other,
}

/// Direct children of `el` in document order.
pub fn children<'a>(el: ElementRef<'a>) -> impl Iterator<Item = Child<'a>> + 'a {
    el.children().map(|node| match node.value() {
        Node::Text(text) => Child::Text(&**text),
        Node::Element(_) => ElementRef::wrap(node).map_or(Child::Other, Child::Element),
        _ => Child::Other,
    })
}

/// First `<tag class="...">` element in document order carrying `class`.
pub fn find_by_class<'a>(doc: &'a Html, tag: &str, class: &str) -> Option<ElementRef<'a>> {
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| is_tag_with_class(el, tag, class))
}

/// All `<tag class="...">` elements carrying `class`, in document order.
pub fn find_all_by_class<'a>(doc: &'a Html, tag: &str, class: &str) -> Vec<ElementRef<'a>> {
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| is_tag_with_class(el, tag, class))
        .collect()
}

/// First descendant element named `tag`, excluding `el` itself.
pub fn find_descendant<'a>(el: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    el.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == tag)
}

/// `el` itself when it is an `<a>`, otherwise its first descendant anchor.
pub fn find_anchor(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if el.value().name() == "a" {
        return Some(el);
    }
    find_descendant(el, "a")
}

/// The single string carried by an element.
///
/// An element yields a string only when it has exactly one child (comments
/// ignored) that is either text or an element carrying a string itself, so
/// `<h3><a>1. Song</a></h3>` carries `"1. Song"` while `<p>a<br>b</p>` carries nothing.
pub fn own_string(el: ElementRef<'_>) -> Option<String> {
    let mut children = el
        .children()
        .filter(|child| !matches!(child.value(), Node::Comment(_)));
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }

    match only.value() {
        Node::Text(text) => Some(text.to_string()),
        Node::Element(_) => ElementRef::wrap(only).and_then(own_string),
        _ => None,
    }
}

fn is_tag_with_class(el: &ElementRef<'_>, tag: &str, class: &str) -> bool {
    el.value().name() == tag && el.value().classes().any(|c| c == class)
}
