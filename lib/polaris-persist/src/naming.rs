//! Table and collection name derivation.

use crate::PersistError;

/// Derive a table name from a model type name and an optional namespace.
///
/// Removes `*`, turns `.` and `::` path separators into `_`, lower-cases the
/// result and, when `namespace` is non-empty, prefixes it with `namespace_`.
///
/// ```
/// use polaris_persist::derive_name;
///
/// assert_eq!(derive_name("*pkg.User", "shop"), "shop_pkg_user");
/// assert_eq!(derive_name("User", ""), "user");
/// ```
pub fn derive_name(type_name: &str, namespace: &str) -> String {
    let base = type_name
        .replace('*', "")
        .replace("::", "_")
        .replace('.', "_")
        .to_lowercase();
    namespaced(namespace, &base)
}

/// Join a namespace and a name with `_`. An empty namespace leaves the name unchanged.
pub fn namespaced(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}_{}", namespace, name)
    }
}

/// Quote an identifier for DDL, doubling any embedded `"`. Callers validate it first.
///
/// Quoting lets names that collide with keywords, such as `user`, be used as tables.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Check that a name is safe to splice into DDL: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(name: &str) -> Result<(), PersistError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(PersistError::InvalidIdentifier(name.to_string()))
    }
}
