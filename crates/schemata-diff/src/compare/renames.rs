//! Pairing removed and added entities into renames

use std::collections::HashMap;

use indexmap::IndexMap;

/// Added, removed and renamed entities after rename resolution.
///
/// `renamed` is keyed by the removed (old) key and holds the added entity.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Renames<T> {
    pub added: IndexMap<String, T>,
    pub removed: IndexMap<String, T>,
    pub renamed: IndexMap<String, T>,
}

impl<T> Renames<T> {
    fn unchanged(added: IndexMap<String, T>, removed: IndexMap<String, T>) -> Self {
        Self {
            added,
            removed,
            renamed: IndexMap::new(),
        }
    }
}

/// Pairs removed entities with added ones that are equivalent to them.
///
/// A pair is only promoted when the added entity has exactly one equivalent
/// removed entity, and that removed entity is not the sole candidate of any
/// other added entity. Everything else stays as it was.
pub(crate) fn resolve_renames<T, E>(
    kind: &str,
    added: IndexMap<String, T>,
    removed: IndexMap<String, T>,
    mut equivalent: impl FnMut(&T, &T) -> Result<bool, E>,
) -> Result<Renames<T>, E> {
    if added.is_empty() || removed.is_empty() {
        return Ok(Renames::unchanged(added, removed));
    }

    let mut candidates: Vec<(String, String)> = Vec::new();
    for (added_key, added_item) in &added {
        let mut matches = Vec::new();
        for (removed_key, removed_item) in &removed {
            if equivalent(removed_item, added_item)? {
                matches.push(removed_key);
            }
        }
        match matches.as_slice() {
            [removed_key] => candidates.push(((*removed_key).clone(), added_key.clone())),
            [] => {}
            _ => tracing::debug!(
                "{} '{}' matches {} removed candidates, not treated as a rename",
                kind,
                added_key,
                matches.len()
            ),
        }
    }

    let mut claims: HashMap<&str, usize> = HashMap::new();
    for (removed_key, _) in &candidates {
        *claims.entry(removed_key.as_str()).or_default() += 1;
    }
    let pairs: Vec<(String, String)> = candidates
        .iter()
        .filter(|(removed_key, added_key)| {
            let unique = claims.get(removed_key.as_str()) == Some(&1);
            if !unique {
                tracing::debug!(
                    "{} '{}' is claimed by several added entities, '{}' not treated as a rename",
                    kind,
                    removed_key,
                    added_key
                );
            }
            unique
        })
        .cloned()
        .collect();

    let mut added = added;
    let mut removed = removed;
    let mut renamed = IndexMap::new();
    for (removed_key, added_key) in pairs {
        if let Some(item) = added.shift_remove(&added_key)
            && removed.shift_remove(&removed_key).is_some()
        {
            tracing::debug!("{} '{}' renamed to '{}'", kind, removed_key, added_key);
            renamed.insert(removed_key, item);
        }
    }

    Ok(Renames {
        added,
        removed,
        renamed,
    })
}
