use super::element::ElementId;
use super::tree::Scene;
use crate::error::SelectorError;
use itertools::Itertools;
use std::fmt;
use std::str::FromStr;

/// A single attribute condition: `[name]` or `[name="value"]`.
#[derive(Debug, Clone, PartialEq)]
struct AttributeMatcher {
    name: String,
    value: Option<String>,
}

/// One compound selector such as `g.node.step[data-id="A"]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound {
    tag: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatcher>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn has_attr(mut self, name: &str) -> Self {
        self.attributes.push(AttributeMatcher {
            name: name.to_string(),
            value: None,
        });
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push(AttributeMatcher {
            name: name.to_string(),
            value: Some(value.to_string()),
        });
        self
    }

    fn matches(&self, scene: &Scene, id: ElementId) -> bool {
        let Some(el) = scene.get(id) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if el.tag() != tag {
                return false;
            }
        }
        self.classes.iter().all(|c| el.has_class(c))
            && self.attributes.iter().all(|m| match (&m.value, el.attribute(&m.name)) {
                (_, None) => false,
                (None, Some(_)) => true,
                (Some(expected), Some(actual)) => expected == actual,
            })
    }

    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.classes.is_empty() && self.attributes.is_empty()
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}", tag)?,
            None if self.classes.is_empty() && self.attributes.is_empty() => write!(f, "*")?,
            None => {}
        }
        for class in &self.classes {
            write!(f, ".{}", class)?;
        }
        for attr in &self.attributes {
            match &attr.value {
                Some(v) => write!(f, "[{}=\"{}\"]", attr.name, v)?,
                None => write!(f, "[{}]", attr.name)?,
            }
        }
        Ok(())
    }
}

/// A chain of compound selectors joined by the descendant combinator.
///
/// Only the subset of CSS the engine and its plugins rely on is supported:
/// type, class and attribute selectors plus descendant nesting. Like
/// `Element.querySelectorAll`, ancestor compounds may match outside the query scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    chain: Vec<Compound>,
}

impl Selector {
    pub fn new(subject: Compound) -> Self {
        Self {
            chain: vec![subject],
        }
    }

    /// Shorthand for `.class`.
    pub fn class(class: &str) -> Self {
        Self::new(Compound::new().class(class))
    }

    /// Adds a descendant step: `self descendant`.
    pub fn descendant(mut self, compound: Compound) -> Self {
        self.chain.push(compound);
        self
    }

    pub fn matches(&self, scene: &Scene, id: ElementId) -> bool {
        let Some((subject, ancestors)) = self.chain.split_last() else {
            return false;
        };
        if !subject.matches(scene, id) {
            return false;
        }

        // Greedy right-to-left match over the ancestor chain is enough for descendant-only selectors.
        let mut pending = ancestors.len();
        for ancestor in scene.ancestors(id) {
            if pending == 0 {
                break;
            }
            if ancestors[pending - 1].matches(scene, ancestor) {
                pending -= 1;
            }
        }
        pending == 0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.chain.iter().join(" "))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        SelectorParser::new(input).parse()
    }
}

struct SelectorParser<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    index: usize,
}

impl<'a> SelectorParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            index: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).map(|(_, c)| *c)
    }

    fn position(&self) -> usize {
        self.chars
            .get(self.index)
            .map(|(p, _)| *p)
            .unwrap_or(self.source.len())
    }

    fn error(&self, message: &'static str) -> SelectorError {
        SelectorError::Invalid {
            selector: self.source.to_string(),
            position: self.position(),
            message,
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.index;
        while self.peek().is_some_and(char::is_whitespace) {
            self.index += 1;
        }
        self.index != start
    }

    fn identifier(&mut self) -> Result<String, SelectorError> {
        let start = self.index;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            self.index += 1;
        }
        if start == self.index {
            return Err(self.error("expected an identifier"));
        }
        Ok(self.chars[start..self.index].iter().map(|(_, c)| c).collect())
    }

    fn parse(mut self) -> Result<Selector, SelectorError> {
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(SelectorError::Empty);
        }

        let mut chain = Vec::new();
        while self.peek().is_some() {
            let compound = self.compound()?;
            if compound.is_empty() && self.peek().is_some() {
                return Err(self.error("unexpected character"));
            }
            chain.push(compound);
            self.skip_whitespace();
        }
        Ok(Selector { chain })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::new();
        match self.peek() {
            Some('*') => {
                self.index += 1;
            }
            Some(c) if c.is_alphabetic() => {
                compound.tag = Some(self.identifier()?);
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('.') => {
                    self.index += 1;
                    let class = self.identifier()?;
                    compound.classes.push(class);
                }
                Some('[') => {
                    self.index += 1;
                    compound.attributes.push(self.attribute()?);
                }
                Some(c) if c.is_whitespace() => break,
                None => break,
                Some(_) => return Err(self.error("unexpected character")),
            }
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<AttributeMatcher, SelectorError> {
        self.skip_whitespace();
        let name = self.identifier()?;
        self.skip_whitespace();
        match self.peek() {
            Some(']') => {
                self.index += 1;
                Ok(AttributeMatcher { name, value: None })
            }
            Some('=') => {
                self.index += 1;
                self.skip_whitespace();
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.index += 1;
                        let start = self.index;
                        while self.peek().is_some_and(|c| c != quote) {
                            self.index += 1;
                        }
                        if self.peek().is_none() {
                            return Err(self.error("unterminated attribute value"));
                        }
                        let value = self.chars[start..self.index].iter().map(|(_, c)| c).collect();
                        self.index += 1;
                        value
                    }
                    _ => self.identifier()?,
                };
                self.skip_whitespace();
                if self.peek() != Some(']') {
                    return Err(self.error("expected ']'"));
                }
                self.index += 1;
                Ok(AttributeMatcher {
                    name,
                    value: Some(value),
                })
            }
            _ => Err(self.error("expected '=' or ']'")),
        }
    }
}
