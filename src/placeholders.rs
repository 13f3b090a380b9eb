//! Counting and binding of `?` parameter placeholders.

use memchr::memchr_iter;

use crate::error::Error;
use crate::Result;

/// Number of literal `?` placeholder markers in `sql`.
pub fn count_placeholders(sql: &str) -> usize {
    memchr_iter(b'?', sql.as_bytes()).count()
}

/// Substitute `values` for the `?` markers in `template`, left to right.
///
/// The arity must match exactly; a surplus or deficit is reported with its
/// direction and size. Values are spliced in verbatim, so the caller is
/// responsible for any quoting the engine requires.
pub fn bind_placeholders(template: &str, values: &[String]) -> Result<String> {
    let expected = count_placeholders(template);
    if values.len() != expected {
        return Err(Error::PlaceholderCountMismatch {
            expected,
            supplied: values.len(),
        });
    }

    let mut out = String::with_capacity(template.len());
    let mut values = values.iter();
    for c in template.chars() {
        if c == '?' {
            // arity was checked above
            out.push_str(values.next().map(String::as_str).unwrap_or_default());
        } else {
            out.push(c);
        }
    }
    Ok(out)
}
