pub mod associate;
pub mod flash;
pub mod manager;

use std::path::Path;
use crate::errors::{AppError, AppResult};

pub use flash::Flash;

/// Reads `templates/<name>` and substitutes each `{{key}}` placeholder.
/// Values are inserted verbatim; callers escape user content.
pub fn render(templates_dir: &str, name: &str, vars: &[(&str, String)]) -> AppResult<String> {
    let path = Path::new(templates_dir).join(name);
    let template = std::fs::read_to_string(&path).map_err(|e| {
        tracing::error!("Failed to read template {}: {}", path.display(), e);
        AppError::File(e)
    })?;
    Ok(substitute(&template, vars))
}

/// Single pass over the template: inserted values are never scanned again,
/// so a value that itself contains `{{key}}` stays as typed. Unknown
/// placeholders are left in place.
fn substitute(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match vars.iter().find(|(name, _)| *name == key) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `2.0` renders as `2`, `2.5` as `2.5`.
pub fn format_hours(hours: f64) -> String {
    let text = format!("{:.2}", hours);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
