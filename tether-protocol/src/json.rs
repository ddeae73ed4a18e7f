//! Frame object accessor
//!
//! Minimal single-pass reader for the JSON-like object text the companion
//! sends. The engine only ever asks for a handful of known keys and must
//! tolerate anything missing, so this is an accessor over the raw frame
//! bytes rather than a tree parser: no allocation, values stay borrowed
//! from the frame buffer.
//!
//! Accepts single- or double-quoted strings with backslash escapes, bare
//! scalars (numbers, booleans, `null`), and nested objects/arrays, which
//! are skipped structurally and retrievable as raw slices for
//! peripheral-specific reinterpretation.

/// Validate a completed frame and wrap it for key lookup
///
/// Returns `None` unless the frame is one structurally well-formed
/// object. The empty object `{}` (the keep-alive probe) is well-formed.
pub fn parse(frame: &[u8]) -> Option<ObjectView<'_>> {
    let text = core::str::from_utf8(frame).ok()?;
    let text = text.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0');
    let inner = text.strip_prefix('{')?.strip_suffix('}')?;
    let view = ObjectView { src: inner };
    view.well_formed().then_some(view)
}

/// Borrowed view of one object's key/value pairs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectView<'a> {
    src: &'a str,
}

/// A value as found in the frame text
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    /// Quoted text, escapes still in place
    Text(&'a str),
    /// Unquoted scalar (number, boolean, `null`)
    Scalar(&'a str),
    /// Nested object
    Object(ObjectView<'a>),
    /// Nested array, raw text including the brackets
    Array(&'a str),
}

impl<'a> ObjectView<'a> {
    /// Look up a top-level key
    pub fn get(&self, key: &str) -> Option<ValueRef<'a>> {
        let mut rest = self.src.trim_start();
        while !rest.is_empty() {
            let (found, after) = take_string(rest)?;
            let after = after.trim_start().strip_prefix(':')?;
            let (value, after) = take_value(after.trim_start())?;
            if found == key {
                return Some(value);
            }
            rest = after.trim_start().strip_prefix(',')?.trim_start();
        }
        None
    }

    /// Text value for `key`, escapes still in place
    pub fn text(&self, key: &str) -> Option<&'a str> {
        match self.get(key)? {
            ValueRef::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Integer value for `key` (quoted numbers are accepted)
    pub fn int(&self, key: &str) -> Option<i32> {
        self.scalar(key)?.parse().ok()
    }

    /// Wide integer value for `key`
    pub fn long(&self, key: &str) -> Option<i64> {
        self.scalar(key)?.parse().ok()
    }

    /// Floating-point value for `key`
    pub fn number(&self, key: &str) -> Option<f64> {
        self.scalar(key)?.parse().ok()
    }

    /// Nested object under `key`
    pub fn object(&self, key: &str) -> Option<ObjectView<'a>> {
        match self.get(key)? {
            ValueRef::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Raw array text under `key`, including the brackets
    pub fn array(&self, key: &str) -> Option<&'a str> {
        match self.get(key)? {
            ValueRef::Array(raw) => Some(raw),
            _ => None,
        }
    }

    fn scalar(&self, key: &str) -> Option<&'a str> {
        match self.get(key)? {
            ValueRef::Scalar(raw) | ValueRef::Text(raw) => Some(raw),
            _ => None,
        }
    }

    /// Walk every pair once; false on any structural error
    fn well_formed(&self) -> bool {
        let mut rest = self.src.trim_start();
        if rest.is_empty() {
            return true;
        }
        loop {
            let Some((_, after)) = take_string(rest) else {
                return false;
            };
            let Some(after) = after.trim_start().strip_prefix(':') else {
                return false;
            };
            let Some((_, after)) = take_value(after.trim_start()) else {
                return false;
            };
            let after = after.trim_start();
            if after.is_empty() {
                return true;
            }
            let Some(more) = after.strip_prefix(',') else {
                return false;
            };
            rest = more.trim_start();
        }
    }
}

/// Iterate the characters of a quoted-string payload with backslash
/// escapes resolved
pub fn unescape_chars(raw: &str) -> impl Iterator<Item = char> + '_ {
    let mut escaped = false;
    raw.chars().filter(move |&c| {
        if escaped {
            escaped = false;
            true
        } else if c == '\\' {
            escaped = true;
            false
        } else {
            true
        }
    })
}

/// Iterate the bytes of a quoted-string payload with backslash escapes
/// resolved
pub fn unescape_bytes(raw: &str) -> impl Iterator<Item = u8> + '_ {
    let mut escaped = false;
    raw.bytes().filter(move |&b| {
        if escaped {
            escaped = false;
            true
        } else if b == b'\\' {
            escaped = true;
            false
        } else {
            true
        }
    })
}

/// Copy a quoted-string payload into a bounded string, resolving escapes
///
/// Truncates at capacity; an oversized value never fails to decode.
pub fn unescape_into<const M: usize>(raw: &str) -> heapless::String<M> {
    let mut out = heapless::String::new();
    for c in unescape_chars(raw) {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Split off a leading quoted string, returning its raw payload and the
/// rest after the closing quote
fn take_string(s: &str) -> Option<(&str, &str)> {
    let mut chars = s.char_indices();
    let (_, quote) = chars.next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    let mut escaped = false;
    for (i, c) in chars {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Some((&s[1..i], &s[i + c.len_utf8()..]));
        }
    }
    None
}

/// Split off a leading value of any shape
fn take_value(s: &str) -> Option<(ValueRef<'_>, &str)> {
    match s.chars().next()? {
        '\'' | '"' => take_string(s).map(|(text, rest)| (ValueRef::Text(text), rest)),
        '{' => take_balanced(s, '{', '}').map(|(raw, rest)| {
            let inner = &raw[1..raw.len() - 1];
            (ValueRef::Object(ObjectView { src: inner }), rest)
        }),
        '[' => take_balanced(s, '[', ']').map(|(raw, rest)| (ValueRef::Array(raw), rest)),
        _ => {
            let end = s.find(',').unwrap_or(s.len());
            let (raw, rest) = s.split_at(end);
            let raw = raw.trim();
            if raw.is_empty() {
                None
            } else {
                Some((ValueRef::Scalar(raw), rest))
            }
        }
    }
}

/// Split off a leading `open`...`close` run, quote-aware
fn take_balanced(s: &str, open: char, close: char) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        if c == '\'' || c == '"' {
            in_string = Some(c);
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some((&s[..=i], &s[i + 1..]));
            }
        }
    }
    None
}
