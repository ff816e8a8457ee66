//! Identifier handling shared by every schema object
//!
//! Names are compared case-insensitively and without their quotes, so
//! `"Users"`, `` `users` `` and `[USERS]` all normalize to `users`.

/// Removes one layer of identifier quoting (`"x"`, `` `x` `` or `[x]`).
pub fn unquote(name: &str) -> &str {
    let trimmed = name.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next_back()) {
        (Some('"'), Some('"')) | (Some('`'), Some('`')) | (Some('['), Some(']'))
            if trimmed.len() >= 2 =>
        {
            &trimmed[1..trimmed.len() - 1]
        }
        _ => trimmed,
    }
}

/// Normalizes a single identifier: unquoted and lowercased.
pub fn normalize(name: &str) -> String {
    unquote(name).to_lowercase()
}

/// Normalizes a possibly qualified name part by part (`"App".Users` -> `app.users`).
pub fn normalize_qualified(name: &str) -> String {
    match split_qualified(name) {
        (Some(namespace), local) => format!("{}.{}", normalize(namespace), normalize(local)),
        (None, local) => normalize(local),
    }
}

/// Splits `namespace.name` into its parts. Dots inside quotes are not separators.
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
    let mut quote: Option<char> = None;
    let mut split_at = None;
    for (i, c) in name.char_indices() {
        match (quote, c) {
            (None, '"' | '`') => quote = Some(c),
            (None, '[') => quote = Some(']'),
            (Some(q), c) if c == q => quote = None,
            (None, '.') => split_at = Some(i),
            _ => {}
        }
    }
    match split_at {
        Some(i) => (Some(&name[..i]), &name[i + 1..]),
        None => (None, name),
    }
}

/// Returns the unqualified part of a name, normalized.
pub fn short_name(name: &str) -> String {
    normalize(split_qualified(name).1)
}

/// Normalized name relative to a default namespace: the namespace is dropped
/// when it equals the default.
pub fn shortest_name(name: &str, default_namespace: Option<&str>) -> String {
    match (split_qualified(name), default_namespace) {
        ((Some(namespace), local), Some(default)) if normalize(namespace) == normalize(default) => {
            normalize(local)
        }
        _ => normalize_qualified(name),
    }
}

/// Qualifies an unqualified name with the default namespace (normalized).
pub fn qualify(name: &str, default_namespace: Option<&str>) -> String {
    match (split_qualified(name), default_namespace) {
        ((None, local), Some(default)) => format!("{}.{}", normalize(default), normalize(local)),
        _ => normalize_qualified(name),
    }
}

/// Case- and quote-insensitive comparison of two identifier lists, position by position.
pub fn same_identifiers<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| normalize(x.as_ref()) == normalize(y.as_ref()))
}
