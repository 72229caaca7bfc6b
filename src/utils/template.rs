// src/utils/template.rs
use regex::Regex;
use std::{collections::HashMap, fs, io, path::Path, sync::OnceLock};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum TemplateError {
    #[error("no value for placeholder ${0}")]
    MissingKey(String),
    #[error("invalid placeholder at line {line}, column {column}")]
    InvalidPlaceholder { line: usize, column: usize },
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"\$(?:(?P<escaped>\$)|(?P<named>[_A-Za-z][_A-Za-z0-9]*)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*)\}|(?P<invalid>))",
        )
        .expect("placeholder pattern is valid")
    })
}

/// Text with `$name` / `${name}` placeholders; `$$` renders a literal `$`.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn from_file(path: &Path) -> io::Result<Self> {
        Ok(Self::new(fs::read_to_string(path)?))
    }

    pub fn substitute(&self, values: &HashMap<&str, String>) -> Result<String, TemplateError> {
        let mut rendered = String::with_capacity(self.source.len());
        let mut last = 0;

        for caps in placeholder_pattern().captures_iter(&self.source) {
            let Some(whole) = caps.get(0) else { continue };
            rendered.push_str(&self.source[last..whole.start()]);

            if caps.name("escaped").is_some() {
                rendered.push('$');
            } else if let Some(name) = caps.name("named").or_else(|| caps.name("braced")) {
                let value = values
                    .get(name.as_str())
                    .ok_or_else(|| TemplateError::MissingKey(name.as_str().to_string()))?;
                rendered.push_str(value);
            } else {
                return Err(self.invalid_at(whole.start()));
            }

            last = whole.end();
        }

        rendered.push_str(&self.source[last..]);
        Ok(rendered)
    }

    fn invalid_at(&self, offset: usize) -> TemplateError {
        let before = &self.source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        TemplateError::InvalidPlaceholder {
            line,
            column: offset - line_start + 1,
        }
    }
}
