//! Raw SQL templates with `{n}` substitutes.

use super::field::Field;
use crate::error::{RenderError, Result};
use crate::render::{Inherit, QueryPart, RenderContext};

/// Raw SQL text in which `{0}`, `{1}`, ... are replaced by rendered fields.
///
/// Each substitute is rendered once, in a context detached from the
/// surrounding statement that inherits its data map, and the result is
/// spliced in at every occurrence. A `{` that does not start a `{n}`
/// reference is copied unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSql {
    template: String,
    substitutes: Vec<Field>,
    verbatim: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Substitute(usize),
}

fn parse(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && after.as_bytes().get(digits) == Some(&b'}') {
            if let Ok(index) = after[..digits].parse() {
                segments.push(Segment::Text(&rest[..start]));
                segments.push(Segment::Substitute(index));
                rest = &after[digits + 1..];
                continue;
            }
        }
        segments.push(Segment::Text(&rest[..=start]));
        rest = after;
    }
    segments.push(Segment::Text(rest));
    segments.retain(|segment| *segment != Segment::Text(""));
    segments
}

impl RawSql {
    /// Creates a template.
    #[must_use]
    pub fn new(template: &str, substitutes: impl IntoIterator<Item = Field>) -> Self {
        Self {
            template: String::from(template),
            substitutes: substitutes.into_iter().collect(),
            verbatim: false,
        }
    }

    /// Creates raw text that is emitted exactly as given, braces included.
    #[must_use]
    pub fn verbatim(text: &str) -> Self {
        Self {
            template: String::from(text),
            substitutes: Vec::new(),
            verbatim: true,
        }
    }

    /// The template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The substitutes, by index.
    #[must_use]
    pub fn substitutes(&self) -> &[Field] {
        &self.substitutes
    }

    /// Rebuilds the template over new substitutes.
    #[must_use]
    pub fn with_substitutes(&self, substitutes: impl IntoIterator<Item = Field>) -> Self {
        Self {
            template: self.template.clone(),
            substitutes: substitutes.into_iter().collect(),
            verbatim: self.verbatim,
        }
    }
}

impl QueryPart for RawSql {
    fn accept(&self, ctx: &mut RenderContext) -> Result<()> {
        if self.verbatim {
            ctx.sql(&self.template);
            return Ok(());
        }
        let mut rendered: Vec<Option<RenderContext>> =
            self.substitutes.iter().map(|_| None).collect();
        for segment in parse(&self.template) {
            match segment {
                Segment::Text(text) => {
                    ctx.sql(text);
                }
                Segment::Substitute(index) => {
                    let slot = rendered.get_mut(index).ok_or(RenderError::TemplateIndex {
                        index,
                        available: self.substitutes.len(),
                    })?;
                    if slot.is_none() {
                        let mut child = ctx.detached(Inherit::Data);
                        child.visit(&self.substitutes[index])?;
                        *slot = Some(child);
                    }
                    if let Some(child) = slot {
                        ctx.absorb(child);
                    }
                }
            }
        }
        Ok(())
    }
}
