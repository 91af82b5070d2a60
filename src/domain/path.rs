//! # Path Algebra
//!
//! Pure functions over slash-delimited entry paths. An entry is stored under a
//! directory-like `path` and addressed by `concat(path, key)`; templates refer
//! to entries by address and group them by prefix.
//!
//! None of these functions fail or panic, whatever the input.

/// Path separator used by entry addresses.
pub const SEPARATOR: char = '/';

/// Returns everything before the last separator, or `""` when there is none.
///
/// ```rust
/// use nbox::domain::path::prefix_of;
///
/// assert_eq!(prefix_of("widget-x/development/key"), "widget-x/development");
/// assert_eq!(prefix_of("private-domain"), "");
/// ```
pub fn prefix_of(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(index) => &path[..index],
        None => "",
    }
}

/// Joins a prefix and a key with exactly one separator.
///
/// A prefix that trims to empty is the root namespace and yields the bare key.
/// A literal `"/"` prefix is a distinct namespace and yields `"/key"`.
pub fn concat(prefix: &str, key: &str) -> String {
    if prefix.trim().is_empty() {
        return key.to_string();
    }

    let prefix = prefix.trim_end_matches(SEPARATOR);
    let key = key.trim_start_matches(SEPARATOR);
    let mut address = String::with_capacity(prefix.len() + key.len() + 1);
    address.push_str(prefix);
    address.push(SEPARATOR);
    address.push_str(key);
    address
}

/// Trims whitespace, collapses repeated separators and drops a trailing one.
///
/// A leading separator is preserved so that `/a` and `a` stay distinct.
pub fn normalize(path: &str) -> String {
    let trimmed = path.trim();
    let mut normalized = String::with_capacity(trimmed.len());
    let mut previous_was_separator = false;

    for c in trimmed.chars() {
        if c == SEPARATOR {
            if previous_was_separator {
                continue;
            }
            previous_was_separator = true;
        } else {
            previous_was_separator = false;
        }
        normalized.push(c);
    }

    if normalized.len() > 1 && normalized.ends_with(SEPARATOR) {
        normalized.pop();
    }
    normalized
}

/// Splits an address into `(prefix, key)`, the inverse of [`concat`].
///
/// A key directly under a leading separator keeps `"/"` as its prefix, so
/// `/key` does not collapse into the root namespace.
pub fn split(address: &str) -> (&str, &str) {
    match address.rfind(SEPARATOR) {
        Some(0) => (&address[..1], &address[1..]),
        Some(index) => (&address[..index], &address[index + 1..]),
        None => ("", address),
    }
}

/// The address an entry is stored under: `concat` of its own `split`.
pub fn canonical(address: &str) -> String {
    let (prefix, key) = split(address);
    concat(prefix, key)
}
