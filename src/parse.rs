use std::collections::HashMap;

use anyhow::{Result, anyhow};
use scraper::{ElementRef, Selector};

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow!("invalid selector `{css}`: {err}"))
}

/// Whitespace-trimmed text of every node matched by `sel` under `el`, concatenated.
pub fn child_text(el: ElementRef<'_>, sel: &Selector) -> String {
    let mut out = String::new();
    for matched in el.select(sel) {
        out.extend(matched.text());
    }
    out.trim().to_string()
}

pub fn child_attr(el: ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    el.select(sel)
        .next()
        .and_then(|matched| matched.value().attr(attr))
        .map(|v| v.trim().to_string())
}

pub fn parse_int(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

pub fn parse_float(raw: &str) -> Option<f64> {
    let value = raw.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Logical field name -> compiled selector, applied to one element at a time.
#[derive(Debug)]
pub struct FieldMap {
    fields: Vec<(&'static str, Selector)>,
}

impl FieldMap {
    pub fn compile(entries: &[(&'static str, &str)]) -> Result<Self> {
        let fields = entries
            .iter()
            .map(|(name, css)| -> Result<(&'static str, Selector)> {
                Ok((*name, selector(css)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }

    pub fn extract(&self, el: ElementRef<'_>) -> Fields {
        let values = self
            .fields
            .iter()
            .map(|(name, sel)| (*name, child_text(el, sel)))
            .collect();
        Fields { values }
    }
}

/// Extracted text per logical field. Typed accessors fall back to zero when a
/// cell is blank or not numeric, so one bad cell never drops the row.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    values: HashMap<&'static str, String>,
}

impl Fields {
    pub fn text(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn int(&self, name: &str) -> i32 {
        parse_int(self.text(name)).unwrap_or_default()
    }

    pub fn float(&self, name: &str) -> f64 {
        parse_float(self.text(name)).unwrap_or_default()
    }
}
