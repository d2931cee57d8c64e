#![forbid(unsafe_code)]

//! Minimal CSS selector matcher for the in-memory document.
//!
//! Supports what page configurations actually use: selector lists (`,`),
//! the descendant and child (`>`) combinators, type selectors, `#id`, `.class`, `[attr]`,
//! `[attr="v"]`, `[attr^="v"]`, and `:not(<compound>)`. Anything else is a
//! [`SelectorError`], which the fake document treats as "matches nothing",
//! the same outcome a browser host reports after logging the exception.

use sitewire_core::{Document, ElementId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected `{found}` at byte {at} in `{selector}`")]
    Unexpected {
        selector: String,
        found: char,
        at: usize,
    },
    #[error("unterminated selector `{0}`")]
    Unterminated(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSel {
    name: String,
    op: AttrOp,
}

/// How a compound relates to the one before it in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Link {
    combinator: Combinator,
    compound: Compound,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSel>,
    negations: Vec<Compound>,
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    // Each entry is a chain of compounds, outermost first. The first link's
    // combinator is unused.
    alternatives: Vec<Vec<Link>>,
}

impl SelectorList {
    /// Parse a selector list.
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        let mut parser = Parser {
            src: selector,
            pos: 0,
        };
        let mut alternatives = Vec::new();
        loop {
            let chain = parser.chain()?;
            if chain.is_empty() {
                return Err(SelectorError::Empty);
            }
            alternatives.push(chain);
            match parser.peek() {
                Some(',') => parser.pos += 1,
                None => break,
                Some(c) => return Err(parser.unexpected(c)),
            }
        }
        Ok(Self { alternatives })
    }

    /// Whether `element` matches any alternative.
    pub fn matches(&self, doc: &dyn Document, element: ElementId) -> bool {
        self.alternatives
            .iter()
            .any(|chain| matches_chain(doc, chain, element))
    }
}

fn matches_chain(doc: &dyn Document, chain: &[Link], element: ElementId) -> bool {
    let Some((last, outer)) = chain.split_last() else {
        return false;
    };
    if !matches_compound(doc, &last.compound, element) {
        return false;
    }
    if outer.is_empty() {
        return true;
    }
    match last.combinator {
        Combinator::Child => doc
            .parent(element)
            .is_some_and(|parent| matches_chain(doc, outer, parent)),
        Combinator::Descendant => {
            // Any ancestor may anchor the rest of the chain; a nearer one
            // failing under a child link does not rule out a farther one.
            let mut cursor = doc.parent(element);
            while let Some(candidate) = cursor {
                if matches_chain(doc, outer, candidate) {
                    return true;
                }
                cursor = doc.parent(candidate);
            }
            false
        }
    }
}

fn matches_compound(doc: &dyn Document, compound: &Compound, element: ElementId) -> bool {
    if let Some(tag) = &compound.tag
        && tag != "*"
        && doc.tag_name(element) != *tag
    {
        return false;
    }
    if !compound
        .ids
        .iter()
        .all(|id| doc.attribute(element, "id").as_deref() == Some(id.as_str()))
    {
        return false;
    }
    if !compound.classes.iter().all(|c| doc.has_class(element, c)) {
        return false;
    }
    let attrs_ok = compound.attrs.iter().all(|sel| {
        match (doc.attribute(element, &sel.name), &sel.op) {
            (None, _) => false,
            (Some(_), AttrOp::Exists) => true,
            (Some(v), AttrOp::Equals(want)) => v == *want,
            (Some(v), AttrOp::Prefix(want)) => !want.is_empty() && v.starts_with(want.as_str()),
        }
    });
    attrs_ok
        && !compound
            .negations
            .iter()
            .any(|neg| matches_compound(doc, neg, element))
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// CSS whitespace only; U+00A0 and friends are not separators.
    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(char::is_ascii_whitespace) {
            self.pos += c.len_utf8();
        }
    }

    fn unexpected(&self, found: char) -> SelectorError {
        SelectorError::Unexpected {
            selector: self.src.to_owned(),
            found,
            at: self.pos,
        }
    }

    fn eat(&mut self, expected: char) -> Result<(), SelectorError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(c) => Err(self.unexpected(c)),
            None => Err(SelectorError::Unterminated(self.src.to_owned())),
        }
    }

    fn chain(&mut self) -> Result<Vec<Link>, SelectorError> {
        let mut chain = Vec::new();
        let mut combinator = Combinator::Descendant;
        self.skip_ws();
        while let Some(c) = self.peek() {
            match c {
                ',' => break,
                '>' if !chain.is_empty() && combinator == Combinator::Descendant => {
                    self.pos += 1;
                    combinator = Combinator::Child;
                }
                '>' => return Err(self.unexpected(c)),
                _ => {
                    let compound = self.compound()?;
                    chain.push(Link {
                        combinator,
                        compound,
                    });
                    combinator = Combinator::Descendant;
                }
            }
            self.skip_ws();
        }
        if combinator == Combinator::Child {
            return Err(match self.peek() {
                Some(c) => self.unexpected(c),
                None => SelectorError::Unterminated(self.src.to_owned()),
            });
        }
        Ok(chain)
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            self.pos += self.peek().map_or(1, char::len_utf8);
        }
        if self.pos == start {
            return match self.peek() {
                Some(c) => Err(self.unexpected(c)),
                None => Err(SelectorError::Unterminated(self.src.to_owned())),
            };
        }
        Ok(self.src[start..self.pos].to_owned())
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                compound.tag = Some("*".into());
            }
            Some(c) if c.is_alphabetic() => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attr()?);
                }
                Some(':') => {
                    self.pos += 1;
                    let name = self.ident()?;
                    if name != "not" {
                        return Err(SelectorError::Unexpected {
                            selector: self.src.to_owned(),
                            found: ':',
                            at: self.pos - name.len() - 1,
                        });
                    }
                    self.eat('(')?;
                    self.skip_ws();
                    compound.negations.push(self.compound()?);
                    self.skip_ws();
                    self.eat(')')?;
                }
                _ => break,
            }
        }

        if compound == Compound::default() {
            return match self.peek() {
                Some(c) => Err(self.unexpected(c)),
                None => Err(SelectorError::Unterminated(self.src.to_owned())),
            };
        }
        Ok(compound)
    }

    fn attr(&mut self) -> Result<AttrSel, SelectorError> {
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();
        let op = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok(AttrSel {
                    name,
                    op: AttrOp::Exists,
                });
            }
            Some('=') => {
                self.pos += 1;
                AttrOp::Equals(self.value()?)
            }
            Some('^') => {
                self.pos += 1;
                self.eat('=')?;
                AttrOp::Prefix(self.value()?)
            }
            Some(c) => return Err(self.unexpected(c)),
            None => return Err(SelectorError::Unterminated(self.src.to_owned())),
        };
        self.skip_ws();
        self.eat(']')?;
        Ok(AttrSel { name, op })
    }

    fn value(&mut self) -> Result<String, SelectorError> {
        self.skip_ws();
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some(_) => {}
                        None => return Err(SelectorError::Unterminated(self.src.to_owned())),
                    }
                }
                Ok(self.src[start..self.pos - 1].to_owned())
            }
            _ => self.ident(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FakeDocument;
    use proptest::prelude::*;

    #[test]
    fn parses_stock_selectors() {
        for sel in [
            ".site-header",
            "main .stripe[id]",
            ".site-nav a[href^=\"#\"]",
            ".open-modal[data-modal-target]",
            "[tabindex]:not([tabindex=\"-1\"])",
            "a[href], button:not([disabled]), textarea",
            "*",
            ".site-nav > a",
            "main>section.stripe",
            "\tmain\n.stripe ",
        ] {
            assert!(SelectorList::parse(sel).is_ok(), "{sel}");
        }
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(SelectorList::parse(""), Err(SelectorError::Empty));
        assert!(SelectorList::parse("a >").is_err());
        assert!(SelectorList::parse("> a").is_err());
        assert!(SelectorList::parse("a > > b").is_err());
        assert!(SelectorList::parse("a >, b").is_err());
        assert!(SelectorList::parse("[href").is_err());
        assert!(SelectorList::parse(":hover").is_err());
        assert!(SelectorList::parse("a,").is_err());
        assert!(SelectorList::parse("[x=\"open").is_err());
    }

    #[test]
    fn descendant_and_attributes() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let nav = doc.create(body, "nav").class("site-nav").done();
        let inside = doc.create(nav, "a").attr("href", "#about").done();
        let external = doc.create(nav, "a").attr("href", "/blog").done();
        let outside = doc.create(body, "a").attr("href", "#about").done();

        let sel = SelectorList::parse(".site-nav a[href^=\"#\"]").unwrap();
        assert!(sel.matches(&doc, inside));
        assert!(!sel.matches(&doc, external));
        assert!(!sel.matches(&doc, outside));
    }

    #[test]
    fn negation() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let a = doc.create(body, "div").attr("tabindex", "0").done();
        let b = doc.create(body, "div").attr("tabindex", "-1").done();
        let sel = SelectorList::parse("[tabindex]:not([tabindex='-1'])").unwrap();
        assert!(sel.matches(&doc, a));
        assert!(!sel.matches(&doc, b));
    }

    #[test]
    fn deep_descendant_chain() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let main = doc.create(body, "main").done();
        let wrap = doc.create(main, "div").class("wrap").done();
        let section = doc.create(wrap, "section").class("stripe").html_id("a").done();
        let sel = SelectorList::parse("main .stripe[id]").unwrap();
        assert!(sel.matches(&doc, section));
        assert!(!sel.matches(&doc, wrap));
    }

    #[test]
    fn child_combinator_requires_the_direct_parent() {
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let nav = doc.create(body, "nav").class("site-nav").done();
        let direct = doc.create(nav, "a").done();
        let item = doc.create(nav, "li").done();
        let nested = doc.create(item, "a").done();

        let sel = SelectorList::parse(".site-nav > a").unwrap();
        assert!(sel.matches(&doc, direct));
        assert!(!sel.matches(&doc, nested));
        assert_eq!(doc.query_selector_all(".site-nav>a"), vec![direct]);
    }

    #[test]
    fn descendant_link_tries_every_ancestor() {
        // The nearest `.wrap` sits under another `.wrap`, not under `.outer`.
        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        let outer = doc.create(body, "div").class("outer").done();
        let far = doc.create(outer, "div").class("wrap").done();
        let near = doc.create(far, "div").class("wrap").done();
        let para = doc.create(near, "p").done();
        let aside = doc.create(body, "div").class("wrap").done();
        let stray = doc.create(aside, "p").done();

        let sel = SelectorList::parse(".outer > .wrap p").unwrap();
        assert!(sel.matches(&doc, para));
        assert!(!sel.matches(&doc, stray));
    }

    #[test]
    fn non_ascii_whitespace_is_rejected_without_panicking() {
        let err = SelectorList::parse("\u{3000}div").unwrap_err();
        assert!(matches!(err, SelectorError::Unexpected { found: '\u{3000}', at: 0, .. }));
        let err = SelectorList::parse("main\u{00A0}.stripe").unwrap_err();
        assert!(matches!(err, SelectorError::Unexpected { at: 4, .. }));

        let mut doc = FakeDocument::new();
        let body = doc.body_id();
        doc.create(body, "div").done();
        assert!(doc.query_selector_all("\u{3000}div").is_empty());
        assert_eq!(doc.query_selector("div\u{2003}"), None);
    }

    proptest! {
        #[test]
        fn parsing_arbitrary_text_never_panics(text in "\\PC{0,24}") {
            let _ = SelectorList::parse(&text);
        }

        #[test]
        fn child_match_implies_descendant_match(
            path in prop::collection::vec(0u8..4, 1..8),
            outer in 0u8..4,
            inner in 0u8..4,
        ) {
            let mut doc = FakeDocument::new();
            let mut parent = doc.body_id();
            for class in &path {
                parent = doc.create(parent, "div").class(&format!("c{class}")).done();
            }
            let leaf = parent;

            let child = SelectorList::parse(&format!(".c{outer} > .c{inner}")).unwrap();
            let descendant = SelectorList::parse(&format!(".c{outer} .c{inner}")).unwrap();
            if child.matches(&doc, leaf) {
                prop_assert!(descendant.matches(&doc, leaf));
            }
            let direct = path.len() >= 2
                && path[path.len() - 1] == inner
                && path[path.len() - 2] == outer;
            prop_assert_eq!(child.matches(&doc, leaf), direct);
        }
    }
}
