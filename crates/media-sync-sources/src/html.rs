//! Selector utility over the `scraper` crate.
//!
//! A selector matches elements by tag plus either a class substring or an
//! exact id. `Html` is not `Send`, so callers parse and extract in one
//! synchronous step and only carry owned strings across an await.

use crate::error::SourceError;
use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlSelector {
    pub tag: Option<String>,
    /// Substring of the `class` attribute, matched against the whole attribute value
    pub class_names: Option<String>,
    pub id: Option<String>,
    /// Return every match instead of the first one
    pub multiple: bool,
}

impl HtmlSelector {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class_names: impl Into<String>) -> Self {
        self.class_names = Some(class_names.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// CSS equivalent. Class and id conditions are alternatives.
    pub fn to_css(&self) -> String {
        let tag = self.tag.as_deref().unwrap_or("");
        let mut alternatives = Vec::new();
        if let Some(class_names) = &self.class_names {
            alternatives.push(format!("{}[class*=\"{}\"]", tag, escape(class_names)));
        }
        if let Some(id) = &self.id {
            alternatives.push(format!("{}[id=\"{}\"]", tag, escape(id)));
        }
        if alternatives.is_empty() {
            return if tag.is_empty() { "*".to_string() } else { tag.to_string() };
        }
        alternatives.join(", ")
    }

    fn compile(&self) -> Result<Selector, SourceError> {
        let css = self.to_css();
        let parsed = match Selector::parse(&css) {
            Ok(selector) => Ok(selector),
            Err(e) => Err(SourceError::Selector {
                reason: e.to_string(),
                css: css.clone(),
            }),
        };
        parsed
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Matching elements in document order
pub fn select<'a>(document: &'a Html, selector: &HtmlSelector) -> Result<Vec<ElementRef<'a>>, SourceError> {
    let compiled = selector.compile()?;
    let mut matches = document.select(&compiled);
    if selector.multiple {
        Ok(matches.collect())
    } else {
        Ok(matches.next().into_iter().collect())
    }
}

pub fn select_first<'a>(document: &'a Html, selector: &HtmlSelector) -> Result<Option<ElementRef<'a>>, SourceError> {
    let compiled = selector.compile()?;
    let first = document.select(&compiled).next();
    Ok(first)
}

pub fn attribute<'a>(element: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name)
}
