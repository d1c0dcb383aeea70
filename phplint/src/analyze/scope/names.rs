//! Namespace and `use` alias resolution.

use std::collections::HashMap;

/// What kind of symbol a name refers to; each has its own alias table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Class,
    Function,
    Constant,
}

impl SymbolKind {
    /// Kind named by a `use function` / `use const` modifier
    pub fn from_use_modifier(text: Option<&str>) -> SymbolKind {
        match text {
            Some("function") => SymbolKind::Function,
            Some("const") => SymbolKind::Constant,
            _ => SymbolKind::Class,
        }
    }
}

/// Per-file name resolution state: the active namespace and import aliases.
///
/// Resolution order for a referenced name:
/// 1. a leading `\` means it is already fully qualified
/// 2. a first segment matching an import alias is substituted
/// 3. inside a namespace, the namespace is prepended
/// 4. otherwise the name is global
///
/// Aliases take precedence over the ambient namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameResolver {
    namespace: Option<String>,
    class_aliases: HashMap<String, String>,
    function_aliases: HashMap<String, String>,
    const_aliases: HashMap<String, String>,
}

impl NameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Enter a namespace; imports from the previous namespace are dropped
    pub fn set_namespace(&mut self, namespace: Option<&str>) {
        self.namespace = namespace
            .map(|ns| ns.trim_matches('\\').to_string())
            .filter(|ns| !ns.is_empty());
        self.class_aliases.clear();
        self.function_aliases.clear();
        self.const_aliases.clear();
    }

    /// Register `use Foo\Bar [as Baz]`
    pub fn add_alias(&mut self, kind: SymbolKind, qualified: &str, alias: Option<&str>) {
        let qualified = qualified.trim_start_matches('\\').to_string();
        let alias = match alias {
            Some(alias) => alias.to_string(),
            None => qualified
                .rsplit('\\')
                .next()
                .unwrap_or(&qualified)
                .to_string(),
        };
        let table = match kind {
            SymbolKind::Class => &mut self.class_aliases,
            SymbolKind::Function => &mut self.function_aliases,
            SymbolKind::Constant => &mut self.const_aliases,
        };
        // Class and function aliases are case-insensitive, constants are not
        let key = match kind {
            SymbolKind::Constant => alias,
            _ => alias.to_ascii_lowercase(),
        };
        table.insert(key, qualified);
    }

    /// Qualified name (without leading `\`) of a class reference
    pub fn resolve_class(&self, name: &str) -> String {
        if let Some(qualified) = name.strip_prefix('\\') {
            return qualified.to_string();
        }
        if let Some(qualified) = name.strip_prefix("namespace\\") {
            return self.prefixed(qualified);
        }
        let (first, rest) = match name.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (name, None),
        };
        if let Some(target) = self.class_aliases.get(&first.to_ascii_lowercase()) {
            return match rest {
                Some(rest) => format!("{}\\{}", target, rest),
                None => target.clone(),
            };
        }
        self.prefixed(name)
    }

    /// Candidate qualified names for a function call, most specific first.
    ///
    /// Unqualified functions fall back to the global namespace.
    pub fn resolve_function(&self, name: &str) -> Vec<String> {
        self.resolve_with_fallback(name, &self.function_aliases, true)
    }

    /// Candidate qualified names for a constant, most specific first
    pub fn resolve_constant(&self, name: &str) -> Vec<String> {
        self.resolve_with_fallback(name, &self.const_aliases, false)
    }

    fn resolve_with_fallback(
        &self,
        name: &str,
        aliases: &HashMap<String, String>,
        ignore_case: bool,
    ) -> Vec<String> {
        if let Some(qualified) = name.strip_prefix('\\') {
            return vec![qualified.to_string()];
        }
        if name.contains('\\') {
            // Qualified names go through the class-style alias table
            return vec![self.resolve_class(name)];
        }
        let key = if ignore_case {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        };
        if let Some(target) = aliases.get(&key) {
            return vec![target.clone()];
        }
        match &self.namespace {
            Some(_) => vec![self.prefixed(name), name.to_string()],
            None => vec![name.to_string()],
        }
    }

    /// `name` qualified against the current namespace
    pub fn prefixed(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{}\\{}", ns, name),
            None => name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_namespace(ns: &str) -> NameResolver {
        let mut names = NameResolver::new();
        names.set_namespace(Some(ns));
        names
    }

    #[test]
    fn test_fully_qualified_is_kept() {
        let names = in_namespace("App");
        assert_eq!(names.resolve_class("\\Other\\Thing"), "Other\\Thing");
    }

    #[test]
    fn test_alias_beats_namespace() {
        let mut names = in_namespace("App");
        names.add_alias(SymbolKind::Class, "Vendor\\Lib\\Client", None);
        names.add_alias(SymbolKind::Class, "Vendor\\Models", Some("M"));
        assert_eq!(names.resolve_class("Client"), "Vendor\\Lib\\Client");
        assert_eq!(names.resolve_class("client"), "Vendor\\Lib\\Client");
        assert_eq!(names.resolve_class("M\\User"), "Vendor\\Models\\User");
        assert_eq!(names.resolve_class("Local"), "App\\Local");
        assert_eq!(names.resolve_class("Sub\\Local"), "App\\Sub\\Local");
    }

    #[test]
    fn test_global_without_namespace() {
        let names = NameResolver::new();
        assert_eq!(names.resolve_class("Foo"), "Foo");
        assert_eq!(names.resolve_function("strlen"), vec!["strlen".to_string()]);
    }

    #[test]
    fn test_function_falls_back_to_global() {
        let mut names = in_namespace("App");
        assert_eq!(
            names.resolve_function("strlen"),
            vec!["App\\strlen".to_string(), "strlen".to_string()]
        );
        names.add_alias(SymbolKind::Function, "Util\\helper", None);
        assert_eq!(names.resolve_function("HELPER"), vec!["Util\\helper".to_string()]);
    }

    #[test]
    fn test_constant_aliases_are_case_sensitive() {
        let mut names = NameResolver::new();
        names.add_alias(SymbolKind::Constant, "Config\\DEBUG", None);
        assert_eq!(names.resolve_constant("DEBUG"), vec!["Config\\DEBUG".to_string()]);
        assert_eq!(names.resolve_constant("debug"), vec!["debug".to_string()]);
    }

    #[test]
    fn test_namespace_keyword_and_reset() {
        let mut names = in_namespace("App\\Http");
        names.add_alias(SymbolKind::Class, "X\\Y", None);
        assert_eq!(names.resolve_class("namespace\\Kernel"), "App\\Http\\Kernel");
        names.set_namespace(None);
        assert_eq!(names.resolve_class("Y"), "Y");
        assert_eq!(names.namespace(), None);
    }
}
