//! Lexical cleanup applied to statement text before decomposition.
//!
//! Nothing in here understands SQL structure; it only strips comment spans,
//! collapses whitespace and rewrites custom statement delimiters so the
//! decomposer can work on a single-line, comment-free statement.

use memchr::memchr;

/// Quote characters that open a literal region; comment markers inside one
/// are plain text.
const QUOTE_CHARS: &[char] = &['\'', '"', '`'];

/// Escape-character handling inside quoted literals. Present but disabled:
/// enabling it changes how escaped quotes parse and has never been switched
/// on, so flipping this needs a compatibility review first.
const HANDLE_ESCAPES: bool = false;

/// Strip `/* */`, `--` and `#` comment spans from `src`.
///
/// All non-comment bytes pass through unchanged, including commas and
/// keywords embedded in string literals. Applying this to already-stripped
/// text is a no-op.
pub fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();

    // the quote char we are currently inside, if any
    let mut context: Option<char> = None;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if let Some(open) = context {
            if HANDLE_ESCAPES && c == '\\' {
                escaped = !escaped;
            } else if c == open && !escaped {
                context = None;
            } else {
                escaped = false;
            }
            out.push(c);
            continue;
        }

        if QUOTE_CHARS.contains(&c) {
            context = Some(c);
            out.push(c);
            continue;
        }

        match c {
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                // consume through the closing */
                let mut prev = '\0';
                for c2 in chars.by_ref() {
                    if prev == '*' && c2 == '/' {
                        break;
                    }
                    prev = c2;
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                consume_to_eol(&mut chars, &mut out);
            }
            '#' => {
                consume_to_eol(&mut chars, &mut out);
            }
            _ => out.push(c),
        }
    }

    out.trim().to_owned()
}

/// Slurp up everything until the newline; the newline itself is kept.
fn consume_to_eol(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, out: &mut String) {
    for c in chars.by_ref() {
        if c == '\n' || c == '\r' {
            out.push(c);
            break;
        }
    }
}

/// Collapse every run of whitespace (newlines, tabs, spaces) to a single
/// space and trim the ends.
pub fn collapse_whitespace(src: &str) -> String {
    src.split_whitespace().collect::<Vec<_>>().join(" ")
}

const DELIMITER_KEYWORD: &str = "DELIMITER";

/// Rewrite custom statement delimiters back to the standard `;`.
///
/// Stored-routine scripts commonly declare a custom delimiter so the routine
/// body can contain literal semicolons. The remote transport does not accept
/// the `DELIMITER` keyword, so we learn the declared token, substitute `;`
/// for every occurrence, drop the declarations themselves and remove any
/// statements the rewrite left empty.
pub fn rewrite_delimiters(sql: &str) -> String {
    let Some(first) = find_keyword(sql, DELIMITER_KEYWORD) else {
        return sql.to_owned();
    };

    // the token follows the first DELIMITER keyword
    let after = skip_keyword(&sql[first..]);
    let token: String = after
        .trim_start()
        .chars()
        .take_while(|&c| c != ';' && c != '\n' && c != '\r' && c != ' ')
        .collect();

    if token.is_empty() {
        return sql.to_owned();
    }

    let mut clean = sql.replace(&token, ";");

    // remove every DELIMITER keyword (plus its trailing whitespace)
    while let Some(at) = find_keyword(&clean, DELIMITER_KEYWORD) {
        let rest = skip_keyword(&clean[at..]);
        let tail_start = clean.len() - rest.len();
        let mut next = String::with_capacity(clean.len());
        next.push_str(&clean[..at]);
        next.push_str(clean[tail_start..].trim_start());
        clean = next;
    }

    // drop statements the rewrite emptied out
    let mut result = String::with_capacity(clean.len());
    for stmt in clean.split(';') {
        if !stmt.trim().is_empty() {
            result.push_str(stmt);
            result.push(';');
        }
    }
    result
}

/// Does `sql` contain stored-routine DDL (or a delimiter declaration)?
///
/// Routine scripts must bypass the metadata pipeline entirely; the transport
/// handles them with dedicated processing.
pub fn is_routine(sql: &str) -> bool {
    if find_keyword(sql, DELIMITER_KEYWORD).is_some() {
        return true;
    }
    for verb in ["CREATE", "DROP"] {
        if let Some(at) = find_keyword(sql, verb) {
            let rest = skip_keyword(&sql[at..]).trim_start();
            if starts_with_keyword(rest, "FUNCTION") || starts_with_keyword(rest, "PROCEDURE") {
                return true;
            }
        }
    }
    false
}

/// Does `sql` contain a result-producing (SELECT) statement?
pub fn is_result_producing(sql: &str) -> bool {
    find_keyword(sql, "SELECT").is_some()
}

/// Byte offset of the first occurrence of `keyword` followed by whitespace,
/// case-insensitive, not preceded by an identifier character.
pub(crate) fn find_keyword(haystack: &str, keyword: &str) -> Option<usize> {
    // ASCII fold keeps byte offsets valid for the caller's slice
    let upper = haystack.to_ascii_uppercase();
    let mut from = 0;
    while let Some(rel) = upper[from..].find(keyword) {
        let at = from + rel;
        let end = at + keyword.len();
        let boundary_before = at == 0
            || !upper[..at]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
        let ws_after = upper[end..].chars().next().is_some_and(char::is_whitespace);
        if boundary_before && ws_after {
            return Some(at);
        }
        from = end;
    }
    None
}

fn starts_with_keyword(haystack: &str, keyword: &str) -> bool {
    find_keyword(haystack, keyword) == Some(0)
}

/// Skip over a leading keyword (up to its first whitespace) and return the
/// remainder.
fn skip_keyword(s: &str) -> &str {
    match memchr(b' ', s.as_bytes()) {
        Some(i) => &s[i..],
        None => match s.find(char::is_whitespace) {
            Some(i) => &s[i..],
            None => "",
        },
    }
}
