use super::element::ElementId;
use super::markup::unescape;
use super::tree::Scene;
use crate::error::TemplateError;
use crate::geometry::Matrix;

/// Instantiates markup into detached scene elements.
///
/// This is the single way renderers turn their templates into fragments, so the
/// grammar is deliberately small: elements, quoted attributes, text, comments and
/// entities. A `transform` attribute is lifted into the element's typed matrix.
pub struct TemplateParser;

impl TemplateParser {
    /// Parses `markup` and returns its first top-level element, detached.
    ///
    /// Any further top-level elements are discarded. Whitespace-only markup yields `None`.
    pub fn parse(scene: &mut Scene, markup: &str) -> Result<Option<ElementId>, TemplateError> {
        let mut roots = Self::parse_all(scene, markup)?;
        if roots.is_empty() {
            return Ok(None);
        }
        let first = roots.remove(0);
        for extra in roots {
            scene.remove(extra);
        }
        Ok(Some(first))
    }

    /// Parses `markup` and returns every top-level element in order, all detached.
    pub fn parse_all(scene: &mut Scene, markup: &str) -> Result<Vec<ElementId>, TemplateError> {
        let mut roots = Vec::new();
        let result = MarkupReader::new(markup).read(scene, &mut roots);
        if let Err(e) = result {
            // Free whatever was built before the failure.
            for root in roots {
                scene.remove(root);
            }
            return Err(e);
        }
        Ok(roots)
    }
}

struct MarkupReader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> MarkupReader<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eof(&self) -> TemplateError {
        TemplateError::UnexpectedEof { position: self.pos }
    }

    fn unexpected(&self, expected: &'static str) -> TemplateError {
        match self.peek() {
            Some(found) => TemplateError::UnexpectedChar {
                position: self.pos,
                found,
                expected,
            },
            None => self.eof(),
        }
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn expect(&mut self, c: char, expected: &'static str) -> Result<(), TemplateError> {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn name(&mut self) -> Result<&'a str, TemplateError> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.unexpected("a name"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn read(&mut self, scene: &mut Scene, roots: &mut Vec<ElementId>) -> Result<(), TemplateError> {
        let mut stack: Vec<(ElementId, &'a str)> = Vec::new();

        while self.pos < self.src.len() {
            let text_len = self.rest().find('<').unwrap_or(self.rest().len());
            if text_len > 0 {
                let raw = &self.rest()[..text_len];
                self.pos += text_len;
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    if let Some((parent, _)) = stack.last() {
                        let text = unescape(trimmed)?;
                        let merged = match scene.text(*parent) {
                            Some(existing) => format!("{}{}", existing, text),
                            None => text,
                        };
                        scene.set_text(*parent, &merged);
                    }
                }
                continue;
            }

            if self.rest().starts_with("<!--") {
                let end = self.rest().find("-->").ok_or_else(|| self.eof())?;
                self.pos += end + 3;
                continue;
            }

            if self.rest().starts_with("</") {
                self.pos += 2;
                let name = self.name()?;
                self.skip_whitespace();
                self.expect('>', "'>'")?;
                match stack.pop() {
                    Some((_, open)) if open == name => {}
                    Some((_, open)) => {
                        return Err(TemplateError::MismatchedClosingTag {
                            expected: open.to_string(),
                            found: name.to_string(),
                        });
                    }
                    None => return Err(TemplateError::UnopenedClosingTag(name.to_string())),
                }
                continue;
            }

            self.expect('<', "'<'")?;
            let tag = self.name()?;
            let element = scene.create_element(tag);
            match stack.last() {
                Some((parent, _)) => {
                    scene.append_child(*parent, element);
                }
                None => roots.push(element),
            }

            let self_closing = self.attributes(scene, element)?;
            if !self_closing {
                stack.push((element, tag));
            }
        }

        match stack.last() {
            Some(_) => Err(self.eof()),
            None => Ok(()),
        }
    }

    /// Reads attributes up to the end of a start tag. Returns true for `/>`.
    fn attributes(&mut self, scene: &mut Scene, element: ElementId) -> Result<bool, TemplateError> {
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(self.eof()),
                Some('>') => {
                    self.pos += 1;
                    return Ok(false);
                }
                Some('/') => {
                    self.pos += 1;
                    self.expect('>', "'>' after '/'")?;
                    return Ok(true);
                }
                Some(_) => {}
            }

            let name = self.name()?;
            self.skip_whitespace();
            let value = if self.peek() == Some('=') {
                self.pos += 1;
                self.skip_whitespace();
                let quote = match self.peek() {
                    Some(q @ ('"' | '\'')) => q,
                    _ => return Err(self.unexpected("a quoted attribute value")),
                };
                self.pos += 1;
                let len = self.rest().find(quote).ok_or_else(|| self.eof())?;
                let raw = &self.rest()[..len];
                self.pos += len + 1;
                unescape(raw)?
            } else {
                String::new()
            };

            if name == "transform" {
                let matrix = Matrix::parse_transform_attr(&value)
                    .ok_or_else(|| TemplateError::InvalidTransform(value.clone()))?;
                scene.set_transform(element, matrix);
            } else {
                scene.set_attribute(element, name, &value);
            }
        }
    }
}
