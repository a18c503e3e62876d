use super::element::ElementId;
use super::tree::Scene;
use crate::error::TemplateError;
use itertools::Itertools;

impl Scene {
    /// Serializes `id` and its subtree to SVG markup.
    pub fn to_markup(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    /// Serializes every child of `id`, without `id` itself.
    pub fn inner_markup(&self, id: ElementId) -> String {
        self.children(id)
            .iter()
            .map(|child| self.to_markup(*child))
            .join("")
    }

    fn write_markup(&self, id: ElementId, out: &mut String) {
        let Some(el) = self.get(id) else {
            return;
        };

        out.push('<');
        out.push_str(el.tag());
        if !el.classes().is_empty() {
            out.push_str(&format!(
                " class=\"{}\"",
                escape_attribute(&el.classes().join(" "))
            ));
        }
        for (name, value) in el.attributes() {
            out.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
        }
        if let Some(transform) = el.transform() {
            out.push_str(&format!(" transform=\"{}\"", transform));
        }

        if el.children().is_empty() && el.text().is_none() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        if let Some(text) = el.text() {
            out.push_str(&escape_text(text));
        }
        for child in el.children() {
            self.write_markup(*child, out);
        }
        out.push_str("</");
        out.push_str(el.tag());
        out.push('>');
    }
}

/// Escapes text content for inclusion in markup.
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes a double-quoted attribute value.
pub fn escape_attribute(input: &str) -> String {
    escape_text(input).replace('"', "&quot;").replace('\'', "&#39;")
}

/// Decodes the predefined XML entities and numeric character references.
pub fn unescape(input: &str) -> Result<String, TemplateError> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find(';')
            .ok_or_else(|| TemplateError::UnknownEntity(after.chars().take(8).collect()))?;
        let entity = &after[..end];
        let decoded = match entity {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => decode_numeric(entity)
                .ok_or_else(|| TemplateError::UnknownEntity(entity.to_string()))?,
        };
        out.push(decoded);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn decode_numeric(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}
