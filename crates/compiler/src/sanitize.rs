//! Template-injection stripping for author-controlled text.
//!
//! Every delimiter the template engine recognises is removed outright, not
//! escaped, and the pass repeats until none remain so that overlapping
//! sequences such as `{{{%%}}}` cannot reassemble into a directive.

use std::borrow::Cow;

/// Expression, statement, and comment delimiters.
pub const TEMPLATE_DELIMITERS: [&str; 6] = ["{{", "}}", "{%", "%}", "{#", "#}"];

fn contains_delimiter(text: &str) -> bool {
    TEMPLATE_DELIMITERS.iter().any(|d| text.contains(d))
}

/// Removes every template delimiter from `input`.
///
/// Borrows when there is nothing to strip.
pub fn strip_template_delimiters(input: &str) -> Cow<'_, str> {
    if !contains_delimiter(input) {
        return Cow::Borrowed(input);
    }
    let mut out = input.to_string();
    // Each pass removes at least two bytes, so this terminates.
    while contains_delimiter(&out) {
        for delimiter in TEMPLATE_DELIMITERS {
            out = out.replace(delimiter, "");
        }
    }
    Cow::Owned(out)
}

/// Sanitizes the fields of one compile unit and remembers which ones changed.
#[derive(Debug)]
pub struct Sanitizer<'a> {
    owner: &'a str,
    touched: Vec<String>,
}

impl<'a> Sanitizer<'a> {
    pub fn new(owner: &'a str) -> Self {
        Self {
            owner,
            touched: Vec::new(),
        }
    }

    /// Strips `value`, logging a warning naming `field` if anything was removed.
    pub fn field(&mut self, field: &str, value: &str) -> String {
        match strip_template_delimiters(value) {
            Cow::Borrowed(clean) => clean.to_string(),
            Cow::Owned(clean) => {
                tracing::warn!(
                    target: "skillforge::sanitize",
                    owner = %self.owner,
                    field,
                    "removed template delimiters from '{}'",
                    field
                );
                self.touched.push(field.to_string());
                clean
            }
        }
    }

    pub fn optional(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        value.map(|v| self.field(field, v))
    }

    pub fn list(&mut self, field: &str, values: &[String]) -> Vec<String> {
        values.iter().map(|v| self.field(field, v)).collect()
    }

    /// Names of the fields that had delimiters removed, in the order seen.
    pub fn touched(&self) -> &[String] {
        &self.touched
    }
}
