//! Doc comment tags and type strings.
//!
//! Only the tags that carry types are extracted: `@param`, `@return`,
//! `@var`, `@property` (with `-read`/`-write`) and `@template`. Type strings
//! are parsed into a small [`DocType`] tree which [`TypeResolver`] turns
//! into lattice types; the same resolver handles native type hints.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyze::lattice::{Type, TypeUnion};
use crate::analyze::scope::{ClassContext, NameResolver};

static TAG: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^@(param|return|var|property-read|property-write|property|template)\b\s*(.*)$")
        .ok()
});

/// A parsed type string.
#[derive(Debug, Clone, PartialEq)]
pub enum DocType {
    /// `int`, `\Foo\Bar`, `array<int, string>`, `list<Foo>`
    Named { name: String, args: Vec<DocType> },
    /// `'foo'`, `42`
    Literal(String),
    Union(Vec<DocType>),
    Intersection(Vec<DocType>),
    /// `?T`
    Nullable(Box<DocType>),
    /// `T[]`
    ArrayOf(Box<DocType>),
}

impl DocType {
    /// Parse a complete type string; `None` if it is malformed
    pub fn parse(text: &str) -> Option<DocType> {
        let mut parser = TypeParser {
            chars: text.trim().chars().collect(),
            pos: 0,
        };
        let ty = parser.union()?;
        parser.skip_ws();
        (parser.pos == parser.chars.len()).then_some(ty)
    }
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocType::Named { name, args } if args.is_empty() => write!(f, "{}", name),
            DocType::Named { name, args } => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{}<{}>", name, args.join(", "))
            }
            DocType::Literal(text) => write!(f, "{}", text),
            DocType::Union(members) => {
                let parts: Vec<String> = members.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join("|"))
            }
            DocType::Intersection(members) => {
                let parts: Vec<String> = members.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join("&"))
            }
            DocType::Nullable(inner) => write!(f, "?{}", inner),
            DocType::ArrayOf(inner) => write!(f, "{}[]", inner),
        }
    }
}

struct TypeParser {
    chars: Vec<char>,
    pos: usize,
}

impl TypeParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn union(&mut self) -> Option<DocType> {
        let mut members = vec![self.intersection()?];
        while self.eat('|') {
            members.push(self.intersection()?);
        }
        Some(if members.len() == 1 {
            members.remove(0)
        } else {
            DocType::Union(members)
        })
    }

    fn intersection(&mut self) -> Option<DocType> {
        let mut members = vec![self.postfix()?];
        while self.eat('&') {
            members.push(self.postfix()?);
        }
        Some(if members.len() == 1 {
            members.remove(0)
        } else {
            DocType::Intersection(members)
        })
    }

    fn postfix(&mut self) -> Option<DocType> {
        let mut ty = self.atom()?;
        loop {
            self.skip_ws();
            if self.chars.get(self.pos..self.pos + 2) == Some(&['[', ']'][..]) {
                self.pos += 2;
                ty = DocType::ArrayOf(Box::new(ty));
            } else {
                return Some(ty);
            }
        }
    }

    fn atom(&mut self) -> Option<DocType> {
        self.skip_ws();
        match self.peek()? {
            '?' => {
                self.pos += 1;
                Some(DocType::Nullable(Box::new(self.postfix()?)))
            }
            '(' => {
                self.pos += 1;
                let inner = self.union()?;
                self.eat(')').then_some(inner)
            }
            quote @ ('\'' | '"') => {
                let start = self.pos;
                self.pos += 1;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                self.pos += 1;
                let text: String = self.chars.get(start..self.pos)?.iter().collect();
                Some(DocType::Literal(text))
            }
            c if c.is_ascii_digit() || c == '-' => {
                let start = self.pos;
                self.pos += 1;
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_digit() || c == '.' || c == '_')
                {
                    self.pos += 1;
                }
                let text: String = self.chars[start..self.pos].iter().collect();
                Some(DocType::Literal(text))
            }
            _ => self.named(),
        }
    }

    fn named(&mut self) -> Option<DocType> {
        let start = self.pos;
        if self.peek() == Some('$') {
            self.pos += 1;
        }
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '\\' | '-'))
        {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        // `Foo::BAR` constant references collapse to the class
        if self.chars.get(self.pos..self.pos + 2) == Some(&[':', ':'][..]) {
            self.pos += 2;
            while self
                .peek()
                .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '*'))
            {
                self.pos += 1;
            }
        }

        let mut args = Vec::new();
        match self.peek() {
            Some('<') => {
                self.pos += 1;
                loop {
                    args.push(self.union()?);
                    if self.eat(',') {
                        continue;
                    }
                    if self.eat('>') {
                        break;
                    }
                    return None;
                }
            }
            // Array shapes and callable signatures are not modeled
            Some(open @ ('{' | '(')) => self.skip_balanced(open)?,
            _ => {}
        }
        Some(DocType::Named { name, args })
    }

    fn skip_balanced(&mut self, open: char) -> Option<()> {
        let close = if open == '{' { '}' } else { ')' };
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    // `callable(int): string` carries a return type
                    if close == ')' && self.eat(':') {
                        self.postfix()?;
                    }
                    return Some(());
                }
            }
        }
        None
    }
}

/// Split `text` into a leading type string and the remainder.
///
/// The type ends at the first whitespace outside brackets, so
/// `array<int, string> $map the map` yields `array<int, string>`.
fn split_type(text: &str) -> (&str, &str) {
    let mut depth = 0i32;
    let mut after_colon = false;
    for (i, c) in text.char_indices() {
        match c {
            '<' | '(' | '{' | '[' => depth += 1,
            '>' | ')' | '}' | ']' => depth -= 1,
            ':' if depth == 0 => after_colon = true,
            '|' | '&' if depth == 0 => after_colon = false,
            c if c.is_whitespace() && depth <= 0 => {
                if after_colon {
                    after_colon = false;
                    continue;
                }
                // `int | string` with spaces around the separator
                let rest = text[i..].trim_start();
                let prev = text[..i].trim_end();
                if rest.starts_with(['|', '&']) || prev.ends_with(['|', '&', ',']) {
                    continue;
                }
                return (&text[..i], rest);
            }
            _ => {}
        }
    }
    (text, "")
}

/// Leading `$name` of `text`, without the sigil
fn leading_variable(text: &str) -> Option<String> {
    let text = text.trim_start().trim_start_matches('&').trim_start_matches("...");
    let name = text.strip_prefix('$')?;
    let end = name
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(name.len());
    (end > 0).then(|| name[..end].to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamTag {
    pub name: String,
    pub ty: DocType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarTag {
    pub name: Option<String>,
    pub ty: DocType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyTag {
    pub name: String,
    pub ty: DocType,
}

/// Typed tags of one doc comment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocBlock {
    pub params: Vec<ParamTag>,
    pub returns: Option<DocType>,
    pub vars: Vec<VarTag>,
    pub properties: Vec<PropertyTag>,
    pub templates: Vec<String>,
}

impl DocBlock {
    /// Extract tags from a raw `/** ... */` comment
    pub fn parse(comment: &str) -> DocBlock {
        let body = comment
            .trim()
            .trim_start_matches("/**")
            .trim_end_matches("*/");
        let mut doc = DocBlock::default();
        for line in body.lines() {
            let line = line.trim().trim_start_matches('*').trim();
            let Some(caps) = TAG.as_ref().and_then(|re| re.captures(line)) else {
                continue;
            };
            let tag = caps.get(1).map_or("", |m| m.as_str());
            let rest = caps.get(2).map_or("", |m| m.as_str()).trim();
            doc.add_tag(tag, rest);
        }
        doc
    }

    fn add_tag(&mut self, tag: &str, rest: &str) {
        if tag == "template" {
            if let Some(name) = rest.split_whitespace().next() {
                self.templates.push(name.to_string());
            }
            return;
        }
        // `@var $x Foo` puts the name first
        if tag == "var" {
            if let Some(name) = leading_variable(rest) {
                let after = rest.trim_start().trim_start_matches('$');
                let after = after.trim_start_matches(name.as_str()).trim();
                let (ty_text, _) = split_type(after);
                if let Some(ty) = DocType::parse(ty_text) {
                    self.vars.push(VarTag {
                        name: Some(name),
                        ty,
                    });
                }
                return;
            }
        }
        let (ty_text, rest) = split_type(rest);
        let Some(ty) = DocType::parse(ty_text) else {
            return;
        };
        let name = leading_variable(rest);
        match tag {
            "param" => {
                if let Some(name) = name {
                    self.params.push(ParamTag { name, ty });
                }
            }
            "return" => self.returns = Some(ty),
            "var" => self.vars.push(VarTag { name, ty }),
            _ => {
                if let Some(name) = name {
                    self.properties.push(PropertyTag { name, ty });
                }
            }
        }
    }

    pub fn param(&self, name: &str) -> Option<&DocType> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.ty)
    }

    /// The `@var` type applying to `name`; an unnamed tag applies to any
    pub fn var(&self, name: Option<&str>) -> Option<&DocType> {
        self.vars
            .iter()
            .find(|v| v.name.is_some() && v.name.as_deref() == name)
            .or_else(|| self.vars.iter().find(|v| v.name.is_none()))
            .map(|v| &v.ty)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
            && self.returns.is_none()
            && self.vars.is_empty()
            && self.properties.is_empty()
    }
}

/// Resolves native hints and doc types into lattice types.
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    pub names: &'a NameResolver,
    pub class: Option<&'a ClassContext>,
    pub templates: &'a [String],
}

impl<'a> TypeResolver<'a> {
    pub fn new(names: &'a NameResolver, class: Option<&'a ClassContext>) -> Self {
        Self {
            names,
            class,
            templates: &[],
        }
    }

    pub fn with_templates(self, templates: &'a [String]) -> Self {
        Self { templates, ..self }
    }

    /// Resolve a type string (native hint or doc type); `None` if malformed
    pub fn resolve_text(&self, text: &str) -> Option<TypeUnion> {
        DocType::parse(text).map(|ty| self.resolve(&ty))
    }

    pub fn resolve(&self, ty: &DocType) -> TypeUnion {
        match ty {
            DocType::Named { name, args } => self.resolve_named(name, args),
            DocType::Literal(text) => TypeUnion::of(literal(text)),
            DocType::Union(members) => {
                let mut union = TypeUnion::empty();
                for member in members {
                    union.add_types_from(&self.resolve(member));
                }
                union
            }
            // Only the first part of an intersection is tracked
            DocType::Intersection(members) => members
                .first()
                .map(|m| self.resolve(m))
                .unwrap_or_else(TypeUnion::mixed),
            DocType::Nullable(inner) => {
                let mut union = self.resolve(inner);
                union.add_type(Type::Null);
                union
            }
            DocType::ArrayOf(inner) => TypeUnion::of(Type::indexed(self.resolve(inner))),
        }
    }

    fn arg(&self, args: &[DocType], index: usize) -> TypeUnion {
        args.get(index)
            .map(|a| self.resolve(a))
            .unwrap_or_default()
    }

    fn resolve_named(&self, name: &str, args: &[DocType]) -> TypeUnion {
        let lower = name.to_ascii_lowercase();
        let ty = match lower.as_str() {
            "int" | "integer" => Type::int(),
            "float" | "double" => Type::float(),
            "string" => Type::string(),
            "bool" | "boolean" => Type::bool(),
            "true" => Type::Bool(Some(true)),
            "false" => Type::Bool(Some(false)),
            "null" => Type::Null,
            "void" | "never" | "never-return" | "never-returns" | "no-return" | "noreturn" => {
                return TypeUnion::empty()
            }
            "mixed" | "object" => Type::Mixed,
            "resource" | "closed-resource" | "open-resource" => Type::Resource,
            "callable" | "pure-callable" => Type::callable(),
            "array" | "non-empty-array" | "associative-array" => match args.len() {
                0 => Type::array(),
                1 => Type::associative(self.arg(args, 0)),
                _ => Type::associative(self.arg(args, 1)),
            },
            "list" | "non-empty-list" => Type::indexed(self.arg(args, 0)),
            "iterable" => {
                let member = self.arg(args, args.len().saturating_sub(1));
                return TypeUnion::from_types([
                    Type::associative(member),
                    Type::instance("Traversable"),
                ]);
            }
            "scalar" => {
                return TypeUnion::from_types([Type::int(), Type::float(), Type::string(), Type::bool()])
            }
            "numeric" => return TypeUnion::from_types([Type::int(), Type::float(), Type::string()]),
            "array-key" => return TypeUnion::from_types([Type::int(), Type::string()]),
            "self" | "static" | "$this" => self.current_class(),
            "parent" => match self.class.and_then(|c| c.parent.as_ref()) {
                Some(parent) => Type::instance(parent.clone()),
                None => Type::Mixed,
            },
            s if s.ends_with("-string") => Type::string(),
            s if s.ends_with("-int") || s.starts_with("int-") => Type::int(),
            s if s.ends_with("-float") => Type::float(),
            s if s.ends_with("-bool") => Type::bool(),
            _ if self.templates.iter().any(|t| t == name) => Type::Mixed,
            _ => Type::instance(self.names.resolve_class(name)),
        };
        TypeUnion::of(ty)
    }

    fn current_class(&self) -> Type {
        match self.class {
            Some(class) if !class.is_trait => Type::instance(class.name.clone()),
            _ => Type::Mixed,
        }
    }
}

fn literal(text: &str) -> Type {
    if let Some(inner) = text
        .strip_prefix(['\'', '"'])
        .and_then(|t| t.strip_suffix(['\'', '"']))
    {
        return Type::string_value(inner);
    }
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    if let Ok(i) = digits.parse::<i64>() {
        return Type::Int(Some(i));
    }
    match digits.parse::<f64>() {
        Ok(f) => Type::Float(Some(f)),
        Err(_) => Type::Mixed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::lattice::Sentinel;

    fn resolve(text: &str) -> TypeUnion {
        let names = NameResolver::new();
        TypeResolver::new(&names, None).resolve_text(text).unwrap()
    }

    #[test]
    fn test_parse_type_strings() {
        assert_eq!(
            DocType::parse("?int").unwrap().to_string(),
            "?int"
        );
        assert_eq!(
            DocType::parse("array<int, string|null>").unwrap().to_string(),
            "array<int, string|null>"
        );
        assert_eq!(DocType::parse("Foo[][]").unwrap().to_string(), "Foo[][]");
        assert_eq!(
            DocType::parse("(A&B)|null").unwrap(),
            DocType::Union(vec![
                DocType::Intersection(vec![
                    DocType::Named { name: "A".into(), args: vec![] },
                    DocType::Named { name: "B".into(), args: vec![] },
                ]),
                DocType::Named { name: "null".into(), args: vec![] },
            ])
        );
        assert!(DocType::parse("array<int").is_none());
        assert!(DocType::parse("array{a: int, b?: string}").is_some());
        assert!(DocType::parse("callable(int): string").is_some());
    }

    #[test]
    fn test_resolve_scalars_and_optionals() {
        assert_eq!(resolve("int"), TypeUnion::of(Type::int()));
        assert_eq!(
            resolve("string|false"),
            TypeUnion::of(Type::optional(Type::string(), Sentinel::False))
        );
        assert_eq!(
            resolve("?Foo"),
            TypeUnion::of(Type::optional(Type::instance("Foo"), Sentinel::Null))
        );
        assert!(resolve("void").is_empty());
        assert!(resolve("mixed").is_mixed());
        assert_eq!(resolve("non-empty-string"), TypeUnion::of(Type::string()));
        assert_eq!(resolve("positive-int"), TypeUnion::of(Type::int()));
    }

    #[test]
    fn test_resolve_arrays() {
        assert_eq!(
            resolve("int[]"),
            TypeUnion::of(Type::indexed(TypeUnion::of(Type::int())))
        );
        assert_eq!(
            resolve("list<string>"),
            TypeUnion::of(Type::indexed(TypeUnion::of(Type::string())))
        );
        assert_eq!(
            resolve("array<string, Foo>"),
            TypeUnion::of(Type::associative(TypeUnion::of(Type::instance("Foo"))))
        );
        assert_eq!(resolve("array{id: int}"), TypeUnion::of(Type::array()));
    }

    #[test]
    fn test_resolve_names_against_context() {
        let mut names = NameResolver::new();
        names.set_namespace(Some("App"));
        let class = ClassContext {
            name: "App\\Model".into(),
            parent: Some("App\\Base".into()),
            is_trait: false,
        };
        let templates = vec!["T".to_string()];
        let resolver = TypeResolver::new(&names, Some(&class)).with_templates(&templates);
        assert_eq!(
            resolver.resolve_text("static").unwrap(),
            TypeUnion::of(Type::instance("App\\Model"))
        );
        assert_eq!(
            resolver.resolve_text("parent").unwrap(),
            TypeUnion::of(Type::instance("App\\Base"))
        );
        assert_eq!(
            resolver.resolve_text("User").unwrap(),
            TypeUnion::of(Type::instance("App\\User"))
        );
        assert_eq!(
            resolver.resolve_text("\\DateTime").unwrap(),
            TypeUnion::of(Type::instance("DateTime"))
        );
        assert!(resolver.resolve_text("T").unwrap().is_mixed());
    }

    #[test]
    fn test_doc_block_tags() {
        let doc = DocBlock::parse(
            "/**\n * Summary line.\n *\n * @template T\n * @param int|null $count how many\n * @param array<string, int> $map\n * @return string|false\n * @property-read Foo $foo\n */",
        );
        assert_eq!(doc.params.len(), 2);
        assert_eq!(doc.param("count").unwrap().to_string(), "int|null");
        assert_eq!(doc.param("map").unwrap().to_string(), "array<string, int>");
        assert_eq!(doc.returns.as_ref().unwrap().to_string(), "string|false");
        assert_eq!(doc.properties[0].name, "foo");
        assert_eq!(doc.templates, vec!["T".to_string()]);
    }

    #[test]
    fn test_var_tags() {
        let named = DocBlock::parse("/** @var Foo $foo */");
        assert_eq!(named.var(Some("foo")).unwrap().to_string(), "Foo");
        assert!(named.var(Some("bar")).is_none());

        let reversed = DocBlock::parse("/** @var $foo Foo */");
        assert_eq!(reversed.var(Some("foo")).unwrap().to_string(), "Foo");

        let unnamed = DocBlock::parse("/** @var int */");
        assert_eq!(unnamed.var(Some("anything")).unwrap().to_string(), "int");
    }

    #[test]
    fn test_split_type_respects_brackets() {
        assert_eq!(
            split_type("array<int, string> $map rest"),
            ("array<int, string>", "$map rest")
        );
        assert_eq!(split_type("int | string $x"), ("int | string", "$x"));
        assert_eq!(split_type("string"), ("string", ""));
    }
}
