use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use vm16::Word;

/// Fully-qualified label (`<namespace>.<name>`) to address.
pub type SymbolTable = HashMap<String, Word>;

/// Fully-qualified alias name to its textual replacement.
pub type AliasTable = HashMap<String, String>;

/// The namespace of a source file is its basename without the extension.
pub fn namespace(file: &str) -> &str {
    Path::new(file)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file)
}

/// Qualifies an identifier against the list of included namespaces.
///
/// A bare `foo` becomes `foo.start` when `foo` names an included file,
/// otherwise `<namespace>.foo`. A dotted `a.b` is kept as written iff `a`
/// names an included file. Anything else does not qualify.
pub fn expand_ident(namespaces: &[String], namespace: &str, ident: &str) -> Option<String> {
    let pieces: Vec<&str> = ident.split('.').collect();
    match pieces.len() {
        1 => {
            if namespaces.iter().any(|n| n == ident) {
                Some(format!("{}.start", ident))
            } else {
                Some(format!("{}.{}", namespace, ident))
            }
        }
        2 if namespaces.iter().any(|n| n == pieces[0]) => Some(ident.to_string()),
        _ => None,
    }
}

/// Applies one level of alias substitution to an operand. A leading `#` is
/// preserved and the alias is looked up for the rest; operands that resolve
/// to no alias pass through unchanged.
pub fn substitute_alias<'a>(
    aliases: &AliasTable,
    namespaces: &[String],
    namespace: &str,
    operand: &'a str,
) -> Cow<'a, str> {
    if operand.starts_with('#') {
        if let Some(ident) = expand_ident(namespaces, namespace, &operand[1..]) {
            if let Some(replacement) = aliases.get(&ident) {
                return Cow::Owned(format!("#{}", replacement));
            }
        }
    } else if let Some(ident) = expand_ident(namespaces, namespace, operand) {
        if let Some(replacement) = aliases.get(&ident) {
            return Cow::Owned(replacement.clone());
        }
    }
    Cow::Borrowed(operand)
}

#[cfg(test)]
mod test {
    use super::*;

    fn spaces() -> Vec<String> {
        vec!["main".to_string(), "lib".to_string()]
    }

    #[test]
    fn bare_identifiers_take_the_current_namespace() {
        assert_eq!(
            expand_ident(&spaces(), "main", "loop"),
            Some("main.loop".to_string())
        );
    }

    #[test]
    fn namespace_identifiers_resolve_to_start() {
        assert_eq!(
            expand_ident(&spaces(), "main", "lib"),
            Some("lib.start".to_string())
        );
    }

    #[test]
    fn dotted_identifiers_need_a_known_namespace() {
        assert_eq!(
            expand_ident(&spaces(), "main", "lib.exit"),
            Some("lib.exit".to_string())
        );
        assert_eq!(expand_ident(&spaces(), "main", "other.exit"), None);
        assert_eq!(expand_ident(&spaces(), "main", "a.b.c"), None);
    }

    #[test]
    fn alias_substitution_keeps_the_immediate_prefix() {
        let mut aliases = AliasTable::new();
        aliases.insert("main.ten".to_string(), "10".to_string());
        assert_eq!(
            substitute_alias(&aliases, &spaces(), "main", "#ten"),
            "#10"
        );
        assert_eq!(substitute_alias(&aliases, &spaces(), "main", "ten"), "10");
        assert_eq!(
            substitute_alias(&aliases, &spaces(), "main", "eleven"),
            "eleven"
        );
    }
}
