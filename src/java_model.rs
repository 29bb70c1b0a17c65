//! A small code model for the generated Java declarations.
//!
//! Only the subset needed by the generators is supported; there are no
//! `protected` members, for instance. The usual flow is to build one or
//! more `Class` values, add `Field`s and `Method`s, and render them through
//! the writer. `Field` doubles as a method parameter.
//!
//! Constructors are never added explicitly: a class derives one from its
//! fields, chaining to `super` with the inherited fields. A field with an
//! initialisation value counts as optional, and a method (or constructor)
//! with k trailing optional parameters renders as k+1 overloads that
//! forward to the full form.

use std::collections::BTreeSet;

use crate::errors::{GenError, Result};

/// Java keywords plus a few names that commonly appear unqualified.
const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "continue", "for", "new", "switch",
    "assert", "default", "goto", "package", "synchronized",
    "boolean", "do", "if", "private", "this",
    "break", "double", "implements", "protected", "throw",
    "byte", "else", "import", "public", "throws",
    "case", "enum", "instanceof", "return", "transient",
    "catch", "extends", "int", "short", "try",
    "char", "final", "interface", "static", "void",
    "class", "finally", "long", "strictfp", "volatile",
    "const", "float", "native", "super", "while",
    "List", "Set", "Map",
];

/// Methods inherited from `Object`; these get an `@Override` annotation.
const JAVA_DEFAULT_METHODS: &[&str] = &["equals", "hashCode", "toString"];

const JAVA_MODIFIER_ORDER: &[&str] = &[
    "public", "protected", "private", "abstract", "static", "final", "strictfp",
];

pub fn is_java_keyword(name: &str) -> bool {
    JAVA_KEYWORDS.contains(&name)
}

/// The default initialisation value for a Java type; `null` unless it is a
/// primitive.
pub fn default_value_for_j_type(j_type: &str) -> &'static str {
    match j_type {
        "boolean" => "false",
        "byte" | "int" | "short" => "0",
        "char" => "'\\u0000'",
        "double" => "0.0d",
        "float" => "0.0f",
        "long" => "0L",
        _ => "null",
    }
}

/// The boxed counterpart of a primitive type; other types map to
/// themselves.
pub fn boxed_type(j_type: &str) -> String {
    match j_type {
        "boolean" => "Boolean",
        "byte" => "Byte",
        "char" => "Character",
        "double" => "Double",
        "int" => "Integer",
        "long" => "Long",
        "short" => "Short",
        other => other,
    }
    .to_string()
}

/// Translates a snake case identifier to camel case.
///
/// `start_with_upper` optionally forces the case of the first letter
/// (after the optional prefix). If the result would be a reserved word, an
/// underscore is appended.
pub fn to_java_name_with(
    name: &str,
    prefix: Option<&str>,
    start_with_upper: Option<bool>,
    suffix: Option<&str>,
) -> String {
    let mut segments: Vec<String> = Vec::new();
    if let Some(prefix) = prefix {
        segments.push(prefix.to_string());
    }
    let mut first = true;
    for s in name.split('_') {
        let mut s = s.to_string();
        if let Some(c) = s.chars().next() {
            let rest = s[c.len_utf8()..].to_string();
            if first && start_with_upper.is_some() {
                if start_with_upper == Some(true) && c.is_lowercase() {
                    s = format!("{}{}", c.to_uppercase(), rest);
                } else if start_with_upper == Some(false) && c.is_uppercase() {
                    s = format!("{}{}", c.to_lowercase(), rest);
                }
            } else if c.is_lowercase() {
                s = format!("{}{}", c.to_uppercase(), rest);
            }
        }
        segments.push(s);
        first = false;
    }
    if let Some(suffix) = suffix {
        segments.push(suffix.to_string());
    }
    let name = segments.concat();
    if is_java_keyword(&name) {
        format!("{}_", name)
    } else {
        name
    }
}

pub fn to_java_name(name: &str) -> String {
    to_java_name_with(name, None, None, None)
}

/// Renders an optional comment for a class-level member.
fn member_comment(comment: &Option<String>) -> String {
    match comment {
        Some(comment) => {
            let comment = comment.trim();
            if comment.starts_with('/') {
                format!("  {}\n", comment)
            } else if comment.contains('\n') {
                format!("  /* {}\n   */\n", comment.replace('\n', "\n   * "))
            } else {
                format!("  // {}\n", comment)
            }
        }
        None => String::new(),
    }
}

fn type_comment(comment: &Option<String>) -> String {
    match comment {
        Some(comment) => {
            let comment = comment.trim();
            if comment.starts_with('/') {
                format!("{}\n", comment)
            } else if comment.contains('\n') {
                format!("/* {}\n */\n", comment.replace('\n', "\n * "))
            } else {
                format!("// {}\n", comment)
            }
        }
        None => String::new(),
    }
}

fn modifier_prefix(modifiers: &BTreeSet<String>) -> String {
    if modifiers.is_empty() {
        return String::new();
    }
    let ordered: Vec<&str> = JAVA_MODIFIER_ORDER
        .iter()
        .copied()
        .filter(|m| modifiers.contains(*m))
        .collect();
    format!("{} ", ordered.join(" "))
}

fn generics_prefix(generics: &[String]) -> String {
    if generics.is_empty() {
        String::new()
    } else {
        format!("<{}> ", generics.join(","))
    }
}

/// A named, typed entity: a class field or a method parameter.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub j_type: String,
    pub init_value: Option<String>,
    pub comment: Option<String>,
    pub is_final: bool,
    pub is_static: bool,
    pub is_private: bool,
    pub is_exposed: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, j_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            j_type: j_type.into(),
            init_value: None,
            comment: None,
            is_final: false,
            is_static: false,
            is_private: false,
            is_exposed: false,
        }
    }

    pub fn with_init(mut self, init_value: impl Into<String>) -> Self {
        self.init_value = Some(init_value.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// An optional field does not need an argument; it falls back to its
    /// initialisation value (the type's default unless set explicitly).
    pub fn optional(mut self) -> Self {
        if self.init_value.is_none() {
            self.init_value = Some(default_value_for_j_type(&self.j_type).to_string());
        }
        self
    }

    pub fn is_optional(&self) -> bool {
        self.init_value.is_some()
    }

    pub fn forced_init_value(&self) -> String {
        match &self.init_value {
            Some(v) => v.clone(),
            None => default_value_for_j_type(&self.j_type).to_string(),
        }
    }

    /// The usable Java name; keywords get a trailing underscore.
    pub fn j_name(&self) -> String {
        if is_java_keyword(&self.name) {
            format!("{}_", self.name)
        } else {
            self.name.clone()
        }
    }

    /// The name with a capital first letter, for getters and setters.
    pub fn title_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut at_start = true;
        for ch in self.name.chars() {
            if ch == '_' {
                at_start = true;
            } else if at_start {
                out.extend(ch.to_uppercase());
                at_start = false;
            } else {
                out.extend(ch.to_lowercase());
            }
        }
        out
    }

    pub fn param_decl(&self) -> String {
        format!("{} {}", self.j_type, self.j_name())
    }

    pub fn declaration(&self) -> String {
        let s = if self.is_static { " static" } else { "" };
        let f = if self.is_final { " final" } else { "" };
        let p = if self.is_exposed { "public" } else { "private" };
        let init = match &self.init_value {
            Some(init) => format!(" = {}", init),
            None => String::new(),
        };
        format!(
            "{}  {}{}{} {} {}{};",
            member_comment(&self.comment),
            p,
            s,
            f,
            self.j_type,
            self.j_name(),
            init
        )
    }

    pub fn getter(&self) -> String {
        let s = if self.is_static { " static" } else { "" };
        format!(
            "  public{} {} get{}() {{\n    return this.{};\n  }}",
            s,
            self.j_type,
            self.title_name(),
            self.j_name()
        )
    }

    pub fn setter(&self) -> String {
        let s = if self.is_static { " static" } else { "" };
        let n = self.j_name();
        format!(
            "  public{} void set{}({} {}) {{\n    this.{} = {};\n  }}",
            s,
            self.title_name(),
            self.j_type,
            n,
            n,
            n
        )
    }

    /// Getter (and setter for writable fields) signatures for interfaces;
    /// static and private fields have none.
    pub fn interface_declarations(&self) -> Option<String> {
        if self.is_static || self.is_private {
            return None;
        }
        let mut decls = format!("  {} get{}();\n", self.j_type, self.title_name());
        if !self.is_final {
            decls.push_str(&format!(
                "\n  void set{}({} {});\n",
                self.title_name(),
                self.j_type,
                self.j_name()
            ));
        }
        Some(decls)
    }
}

/// The memoization variants a method can take.
///
/// A memoized method wraps the real implementation and caches non-null
/// results in a map keyed by a hash argument. The parser variant keys on
/// the input position (`mark`), restores it on a cache hit, and emits trace
/// logging into the generated code.
#[derive(Debug, Clone)]
pub enum MethodFlavor {
    Plain,
    Memoized {
        hash_arg: Option<String>,
        hash_j_type: Option<String>,
    },
    MemoizedParser {
        is_non_empty_loop: bool,
    },
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub return_j_type: String,
    pub args: Vec<Field>,
    pub body: Option<Vec<String>>,
    pub comment: Option<String>,
    pub generics: Vec<String>,
    pub is_static: bool,
    pub is_public: bool,
    pub is_override: bool,
    pub flavor: MethodFlavor,
}

impl Method {
    pub fn new(name: impl Into<String>, return_j_type: impl Into<String>) -> Self {
        let name = name.into();
        let is_override = JAVA_DEFAULT_METHODS.contains(&name.as_str());
        Self {
            name,
            return_j_type: return_j_type.into(),
            args: Vec::new(),
            body: None,
            comment: None,
            generics: Vec::new(),
            is_static: false,
            is_public: true,
            is_override,
            flavor: MethodFlavor::Plain,
        }
    }

    pub fn with_arg(mut self, arg: Field) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_args(mut self, args: Vec<Field>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn with_body(mut self, lines: Vec<String>) -> Self {
        self.body = Some(lines);
        self
    }

    pub fn with_body_line(mut self, line: impl Into<String>) -> Self {
        self.body.get_or_insert_with(Vec::new).push(line.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn overriding(mut self) -> Self {
        self.is_override = true;
        self
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn memoized(mut self, hash_arg: Option<String>, hash_j_type: Option<String>) -> Self {
        self.flavor = MethodFlavor::Memoized { hash_arg, hash_j_type };
        self
    }

    pub fn memoized_parser(mut self, is_non_empty_loop: bool) -> Self {
        self.flavor = MethodFlavor::MemoizedParser { is_non_empty_loop };
        self
    }

    pub fn add_body_line(&mut self, line: impl Into<String>) {
        self.body.get_or_insert_with(Vec::new).push(line.into());
    }

    fn args_decl(&self, n: Option<usize>) -> String {
        let args = match n {
            Some(n) if n <= self.args.len() => &self.args[..n],
            _ => &self.args[..],
        };
        args.iter()
            .map(|a| a.param_decl())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn body_code(&self) -> String {
        match &self.body {
            Some(lines) => format!("    {}", lines.join("\n    ")),
            None => String::new(),
        }
    }

    fn head(&self) -> String {
        let p = if self.is_public { "public " } else { "private " };
        let s = if self.is_static { "static " } else { "" };
        format!(
            "{}{}{}{} {}({})",
            p,
            s,
            generics_prefix(&self.generics),
            self.return_j_type,
            self.name,
            self.args_decl(None)
        )
    }

    fn iface_head(&self, n: usize) -> String {
        format!(
            "{}{} {}({});",
            generics_prefix(&self.generics),
            self.return_j_type,
            self.name,
            self.args_decl(Some(n))
        )
    }

    /// The full declaration, including the cache field and the private
    /// implementation for memoized flavors.
    pub fn declaration(&self) -> Result<String> {
        match &self.flavor {
            MethodFlavor::Plain => {
                let o = if self.is_override { "@Override\n  " } else { "" };
                Ok(format!(
                    "{}  {}{} {{\n{}\n  }}",
                    member_comment(&self.comment),
                    o,
                    self.head(),
                    self.body_code()
                ))
            }
            MethodFlavor::Memoized { .. } | MethodFlavor::MemoizedParser { .. } => {
                self.memoized_declaration()
            }
        }
    }

    fn hash_parts(&self) -> Result<(String, String, String)> {
        // Returns (hash expression, hash type, local declaration code).
        let (hash_arg, hash_j_type) = match &self.flavor {
            MethodFlavor::Memoized { hash_arg, hash_j_type } => {
                (hash_arg.clone(), hash_j_type.clone())
            }
            MethodFlavor::MemoizedParser { .. } => {
                (Some("m = this.mark()".to_string()), Some("int".to_string()))
            }
            MethodFlavor::Plain => (None, None),
        };
        let hash_j_type = match hash_j_type {
            Some(t) => t,
            None => match self.args.first() {
                Some(arg) => arg.j_type.clone(),
                None => {
                    return Err(GenError::code_gen(format!(
                        "missing argument for memoization of '{}'",
                        self.name
                    )))
                }
            },
        };
        match hash_arg {
            Some(arg) if arg.contains('=') => {
                let name = arg[..arg.find('=').unwrap_or(0)].trim().to_string();
                let local = format!("{} {};\n    ", hash_j_type, arg);
                Ok((name, hash_j_type, local))
            }
            Some(arg) => Ok((arg, hash_j_type, String::new())),
            None => match self.args.first() {
                Some(a) => Ok((a.name.clone(), hash_j_type, String::new())),
                None => Err(GenError::code_gen(format!(
                    "missing argument for memoization of '{}'",
                    self.name
                ))),
            },
        }
    }

    fn memoized_declaration(&self) -> Result<String> {
        let s = if self.is_static { "static " } else { "" };
        let o = if self.is_override { "@Override\n  " } else { "" };
        let (_, hash_j_type, _) = self.hash_parts()?;
        let ret_type = boxed_type(&self.return_j_type);
        let private_head = format!(
            "private {}{} _{}({})",
            s,
            self.return_j_type,
            self.name,
            self.args_decl(None)
        );
        Ok(format!(
            "\n  private {}final Map<{}, Memo<{}>> {}_cache = new HashMap<>();\n  {}{} {{\n{}\n  }}\n  {} {{\n{}\n  }}",
            s,
            hash_j_type,
            ret_type,
            self.name,
            o,
            self.head(),
            self.memoization_body()?,
            private_head,
            self.body_code()
        ))
    }

    fn memoization_body(&self) -> Result<String> {
        let args: Vec<String> = self.args.iter().map(|a| a.name.clone()).collect();
        let args = args.join(", ");
        let (hash, _, local) = self.hash_parts()?;
        let ret_type = boxed_type(&self.return_j_type);
        let is_boxed = ret_type != self.return_j_type;

        match &self.flavor {
            MethodFlavor::Memoized { .. } => {
                let mut code = format!(
                    "    {}Memo<{}> info = {}_cache.get({});\n    if (info != null) {{\n      return info.item;\n    }}\n    {} result = _{}({});\n",
                    local, ret_type, self.name, hash, self.return_j_type, self.name, args
                );
                if is_boxed {
                    code.push_str(&format!(
                        "    {}_cache.put({}, new Memo<>(result));\n    return result;",
                        self.name, hash
                    ));
                } else {
                    code.push_str(&format!(
                        "    if (result != null) {{\n      {}_cache.put({}, new Memo<>(result));\n    }}\n    return result;",
                        self.name, hash
                    ));
                }
                Ok(code)
            }
            MethodFlavor::MemoizedParser { is_non_empty_loop } => {
                let mut code = format!(
                    "    {}Memo<{}> info = {}_cache.get({});\n    if (info != null) {{\n      log(\"{}() [cached]-> \" + info.toString());\n      this.reset(info.end_mark);\n      return info.item;\n    }}\n    logl(\"{}() ...\");\n    this._level += 1;\n    {} result = _{}({});\n    this._level -= 1;\n    log(\"{}() [fresh]-> \", result);\n",
                    local,
                    ret_type,
                    self.name,
                    hash,
                    self.name,
                    self.name,
                    self.return_j_type,
                    self.name,
                    args,
                    self.name
                );
                if is_boxed {
                    code.push_str(&format!(
                        "    {}_cache.put({}, new Memo<>(result, this.mark()));\n    return result;",
                        self.name, hash
                    ));
                } else if *is_non_empty_loop {
                    // An empty repetition result counts as a miss.
                    code.push_str(&format!(
                        "    if (result.length > 0) {{\n      {}_cache.put({}, new Memo<>(result, this.mark()));\n      return result;\n    }}\n    return null;",
                        self.name, hash
                    ));
                } else {
                    code.push_str(&format!(
                        "    if (result != null)\n      {}_cache.put({}, new Memo<>(result, this.mark()));\n    return result;",
                        self.name, hash
                    ));
                }
                Ok(code)
            }
            MethodFlavor::Plain => Err(GenError::internal("memoization body for plain method")),
        }
    }

    /// The declaration plus one forwarding overload per optional argument.
    pub fn all_declarations(&self) -> Result<String> {
        let n_opt = self.args.iter().filter(|a| a.is_optional()).count();
        if n_opt == 0 {
            return self.declaration();
        }
        let o = if self.is_override { "@Override\n  " } else { "" };
        let p = if self.is_public { "public " } else { "private " };
        let s = if self.is_static { "static " } else { "" };
        let head = format!(
            "{}{}{}{}{} {}",
            o,
            p,
            s,
            generics_prefix(&self.generics),
            self.return_j_type,
            self.name
        );
        let ret = if self.return_j_type != "void" {
            format!("return {}", self.name)
        } else {
            self.name.clone()
        };
        let mut decls = vec![self.declaration()?];
        decls.extend(overload_forms(&head, &ret, &self.args));
        Ok(decls.join("\n\n"))
    }

    /// All overloaded signatures without body, for interfaces. Private,
    /// static and memoized methods are skipped.
    pub fn interface_declarations(&self) -> Option<String> {
        if !self.is_public || self.is_static {
            return None;
        }
        let mandatory = self.args.iter().filter(|a| !a.is_optional()).count();
        let mut decls = Vec::new();
        let mut n = self.args.len();
        loop {
            decls.push(self.iface_head(n));
            if n == mandatory {
                break;
            }
            n -= 1;
        }
        Some(format!("  {}\n", decls.join("\n  ")))
    }
}

/// The forwarding overloads for a method or constructor with optional
/// trailing arguments; overload i keeps the first i optional arguments and
/// substitutes initialisation values for the rest.
fn overload_forms(head: &str, ret: &str, all_args: &[Field]) -> Vec<String> {
    let n_opt = all_args.iter().filter(|a| a.is_optional()).count();
    let mut decls = Vec::with_capacity(n_opt);
    for i in 0..n_opt {
        let mut params = Vec::new();
        let mut args = Vec::new();
        let mut j = i as i64;
        for a in all_args {
            if a.is_optional() {
                j -= 1;
                if j < 0 {
                    args.push(a.forced_init_value());
                    continue;
                }
            }
            params.push(a.param_decl());
            args.push(a.j_name());
        }
        decls.push(format!(
            "  {}({}) {{\n    {}({});\n  }}",
            head,
            params.join(", "),
            ret,
            args.join(", ")
        ));
    }
    decls
}

#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    base_name: Option<String>,
    base_fields: Vec<Field>,
    pub package: Option<String>,
    pub comment: Option<String>,
    pub generics: Vec<String>,
    pub modifiers: BTreeSet<String>,
    pub fields: Vec<Field>,
    pub interfaces: Vec<String>,
    pub methods: Vec<Method>,
    pub imports: BTreeSet<String>,
    nested: Vec<Class>,
    values: Vec<(String, Vec<String>)>,
    is_pseudo_enum: bool,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_name: None,
            base_fields: Vec::new(),
            package: None,
            comment: None,
            generics: Vec::new(),
            modifiers: BTreeSet::new(),
            fields: Vec::new(),
            interfaces: Vec::new(),
            methods: Vec::new(),
            imports: BTreeSet::new(),
            nested: Vec::new(),
            values: Vec::new(),
            is_pseudo_enum: false,
        }
    }

    /// Not really an enum: a class of named singletons, which leaves us
    /// free to give it an arbitrary base class.
    pub fn pseudo_enum(name: impl Into<String>) -> Result<Self> {
        let mut cls = Self::new(name);
        let mut name_field = Field::new("name", "String");
        name_field.is_final = true;
        name_field.is_private = true;
        cls.add_field(name_field)?;
        cls.methods
            .push(Method::new("toString", "String").with_body_line("return this.name;"));
        cls.is_pseudo_enum = true;
        Ok(cls)
    }

    pub fn set_base_name(&mut self, name: impl Into<String>) {
        self.base_name = Some(name.into());
    }

    /// Makes `base` the base class; its fields feed the derived
    /// constructor's `super` call.
    pub fn set_base(&mut self, base: &Class) {
        self.base_name = Some(base.name.clone());
        self.base_fields = base.all_fields();
    }

    pub fn has_base_class(&self) -> bool {
        self.base_name.is_some()
    }

    pub fn base_class_name(&self) -> Option<&str> {
        self.base_name.as_deref()
    }

    pub fn add_field(&mut self, field: Field) -> Result<()> {
        if self.fields.iter().any(|f| f.name == field.name) {
            return Err(GenError::code_gen(format!(
                "field '{}' already defined in class '{}'",
                field.name, self.name
            )));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Adds a method; memoized flavors pull in the nested `Memo` class and
    /// the map imports.
    pub fn add_method(&mut self, method: Method) {
        match &method.flavor {
            MethodFlavor::Plain => {}
            MethodFlavor::Memoized { .. } => self.ensure_memo_class(false),
            MethodFlavor::MemoizedParser { .. } => self.ensure_memo_class(true),
        }
        self.methods.push(method);
    }

    fn ensure_memo_class(&mut self, with_end_mark: bool) {
        self.imports.insert("java.util.HashMap".to_string());
        self.imports.insert("java.util.Map".to_string());
        let mut memo = Class::new("Memo");
        memo.modifiers.insert("private".to_string());
        memo.modifiers.insert("static".to_string());
        memo.generics.push("U".to_string());
        let mut item = Field::new("item", "U");
        item.is_final = true;
        item.is_exposed = true;
        // Fields were just created, duplicates are impossible here.
        let _ = memo.add_field(item);
        if with_end_mark {
            let mut end_mark = Field::new("end_mark", "int");
            end_mark.is_final = true;
            end_mark.is_exposed = true;
            let _ = memo.add_field(end_mark);
            memo.methods.push(Method::new("toString", "String").with_body(vec![
                "if (item != null)".to_string(),
                "  return item.toString() + \":~\" + end_mark;".to_string(),
                "else".to_string(),
                "  return \"<null>:~\" + end_mark;".to_string(),
            ]));
        }
        self.add_nested(memo);
    }

    pub fn add_nested(&mut self, cls: Class) {
        if let Some(existing) = self.nested.iter_mut().find(|c| c.name == cls.name) {
            *existing = cls;
        } else {
            self.nested.push(cls);
        }
    }

    pub fn add_interface_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.interfaces.contains(&name) {
            self.interfaces.push(name);
        }
    }

    /// Registers a pseudo-enum value; re-adding a name replaces its
    /// constructor arguments.
    pub fn add_value(&mut self, value: impl Into<String>, args: Vec<String>) {
        let value = value.into();
        if let Some(existing) = self.values.iter_mut().find(|(n, _)| *n == value) {
            existing.1 = args;
        } else {
            self.values.push((value, args));
        }
    }

    /// All fields including the inherited ones (own first).
    pub fn all_fields(&self) -> Vec<Field> {
        let mut fields = self.fields.clone();
        fields.extend(self.base_fields.iter().cloned());
        fields
    }

    pub fn base_fields(&self) -> &[Field] {
        &self.base_fields
    }

    fn constructor_declarations(&self) -> String {
        let all_args = self.all_fields();
        let params: Vec<String> = all_args.iter().map(|a| a.param_decl()).collect();
        let mut body = Vec::new();
        if self.has_base_class() {
            let super_args: Vec<String> =
                self.base_fields.iter().map(|a| a.j_name()).collect();
            body.push(format!("super({});", super_args.join(", ")));
        }
        for a in &self.fields {
            body.push(format!("this.{} = {};", a.j_name(), a.j_name()));
        }
        let full = format!(
            "  public {}({}) {{\n    {}\n  }}",
            self.name,
            params.join(", "),
            body.join("\n    ")
        );
        let head = format!("public {}", self.name);
        let mut decls = vec![full];
        decls.extend(overload_forms(&head, "this", &all_args));
        decls.join("\n\n")
    }

    fn pseudo_enum_values(&self) -> String {
        let mut code = Vec::with_capacity(self.values.len());
        for (value, args) in &self.values {
            let mut ctor_args = vec![format!("\"{}\"", value)];
            ctor_args.extend(args.iter().cloned());
            code.push(format!(
                "  public static final {} {} = new {}({});",
                self.name,
                value,
                self.name,
                ctor_args.join(", ")
            ));
        }
        code.join("\n")
    }

    fn value_of_method(&self) -> Method {
        let mut body = Vec::new();
        for (value, _) in &self.values {
            body.push(format!("if (s.equals(\"{}\"))", value));
            body.push(format!("  return {};", value));
        }
        body.push("throw new IllegalArgumentException(s);".to_string());
        Method::new("valueOf", self.name.clone())
            .with_arg(Field::new("s", "String"))
            .with_body(body)
    }

    pub fn declaration(&self) -> Result<String> {
        let base = match &self.base_name {
            Some(base) => format!(" extends {}", base),
            None => String::new(),
        };
        let interfaces = if self.interfaces.is_empty() {
            String::new()
        } else {
            format!(" implements {}", self.interfaces.join(", "))
        };
        let mut lines: Vec<String> = Vec::new();
        if let Some(package) = &self.package {
            lines.push(format!("package {};\n", package));
        }
        if !self.imports.is_empty() {
            for import in &self.imports {
                lines.push(format!("import {};", import));
            }
            lines.push(String::new());
        }
        let generics = if self.generics.is_empty() {
            String::new()
        } else {
            format!("<{}>", self.generics.join(", "))
        };
        lines.push(format!(
            "{}{}class {}{}{}{} {{",
            type_comment(&self.comment),
            modifier_prefix(&self.modifiers),
            self.name,
            generics,
            base,
            interfaces
        ));
        for field in &self.fields {
            lines.push(field.declaration());
        }
        lines.push(String::new());
        if self.is_pseudo_enum && !self.values.is_empty() {
            lines.push(self.pseudo_enum_values());
            lines.push(String::new());
        }
        if !self.nested.is_empty() {
            lines.push(String::new());
            for cls in &self.nested {
                lines.push(format!("  {}", cls.declaration()?.replace('\n', "\n  ")));
                lines.push(String::new());
            }
        }
        if !self.all_fields().is_empty() {
            lines.push(self.constructor_declarations());
            lines.push(String::new());
        }
        for field in &self.fields {
            if !field.is_private && !field.is_exposed {
                lines.push(field.getter());
                if !field.is_final {
                    lines.push(field.setter());
                }
            }
        }
        for method in &self.methods {
            lines.push(method.all_declarations()?);
        }
        if self.is_pseudo_enum {
            lines.push(self.value_of_method().declaration()?);
        }
        lines.push("}".to_string());
        Ok(lines.join("\n"))
    }
}

#[derive(Debug, Clone)]
pub struct Interface {
    pub name: String,
    pub package: Option<String>,
    pub comment: Option<String>,
    pub generics: Vec<String>,
    pub modifiers: BTreeSet<String>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub imports: BTreeSet<String>,
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: None,
            comment: None,
            generics: Vec::new(),
            modifiers: BTreeSet::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            imports: BTreeSet::new(),
        }
    }

    /// Pulls every field and method of a class in. Fields become getter
    /// and setter signatures; private, static and constructor members are
    /// silently dropped, so a whole class can be mirrored without
    /// worrying which members are actually public.
    pub fn add_all(&mut self, cls: &Class) {
        self.fields.extend(cls.fields.iter().cloned());
        self.methods.extend(cls.methods.iter().cloned());
    }

    pub fn declaration(&self) -> String {
        let mut code: Vec<String> = Vec::new();
        if let Some(package) = &self.package {
            code.push(format!("package {};\n", package));
        }
        if !self.imports.is_empty() {
            for import in &self.imports {
                code.push(format!("import {};", import));
            }
            code.push(String::new());
        }
        let generics = if self.generics.is_empty() {
            String::new()
        } else {
            format!("<{}>", self.generics.join(","))
        };
        code.push(format!(
            "{}{}interface {}{} {{\n",
            type_comment(&self.comment),
            modifier_prefix(&self.modifiers),
            self.name,
            generics
        ));
        for field in &self.fields {
            if let Some(decls) = field.interface_declarations() {
                code.push(decls);
            }
        }
        for method in &self.methods {
            if let Some(decls) = method.interface_declarations() {
                code.push(decls);
            }
        }
        code.push("}".to_string());
        code.join("\n")
    }
}

/// A visitor interface: registering a class adds a `visit` overload here
/// and an `accept` method to the class.
#[derive(Debug, Clone)]
pub struct VisitorInterface {
    pub iface: Interface,
}

impl VisitorInterface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            iface: Interface::new(name),
        }
    }

    pub fn add_visit_method(&mut self, item: &mut Class) {
        self.iface.methods.push(
            Method::new("visit", "void").with_arg(Field::new("node", item.name.clone())),
        );
        item.methods.push(
            Method::new("accept", "void")
                .with_arg(Field::new("visitor", self.iface.name.clone()))
                .with_body_line("visitor.visit(this);"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("some_type", "SomeType"; "snake to camel")]
    #[test_case("already", "Already"; "single segment")]
    #[test_case("_private", "Private"; "leading underscore")]
    #[test_case("new", "New"; "capitalisation dodges the keyword")]
    fn java_names(input: &str, expected: &str) {
        assert_eq!(to_java_name(input), expected);
    }

    #[test]
    fn keyword_result_gets_underscore() {
        // Keeping the lower case start leaves the reserved word intact.
        assert_eq!(to_java_name_with("new", None, Some(false), None), "new_");
        assert_eq!(to_java_name("list"), "List_");
    }

    #[test]
    fn java_name_options() {
        assert_eq!(
            to_java_name_with("expr_context", None, Some(true), None),
            "ExprContext"
        );
        assert_eq!(
            to_java_name_with("Expr_context", None, Some(false), None),
            "exprContext"
        );
        assert_eq!(
            to_java_name_with("visit", Some("pre_"), None, Some("_hook")),
            "pre_Visit_hook"
        );
    }

    #[test_case("int", "0")]
    #[test_case("boolean", "false")]
    #[test_case("long", "0L")]
    #[test_case("String", "null")]
    #[test_case("ASTExpr", "null")]
    fn default_values(j_type: &str, expected: &str) {
        assert_eq!(default_value_for_j_type(j_type), expected);
    }

    #[test]
    fn field_declaration_and_accessors() {
        let mut field = Field::new("caption", "String");
        field.is_final = true;
        assert_eq!(field.declaration(), "  private final String caption;");
        assert_eq!(
            field.getter(),
            "  public String getCaption() {\n    return this.caption;\n  }"
        );
        let field = Field::new("case", "int");
        assert_eq!(field.param_decl(), "int case_");
    }

    #[test]
    fn constructor_with_base_class_chains_super() {
        let mut base = Class::new("Ancestor");
        base.add_field(Field::new("lineno", "int")).unwrap();
        let mut cls = Class::new("Test");
        cls.set_base(&base);
        cls.add_field(Field::new("caption", "String")).unwrap();
        let decl = cls.declaration().unwrap();
        assert!(decl.contains("class Test extends Ancestor {"));
        assert!(decl.contains("public Test(String caption, int lineno) {"));
        assert!(decl.contains("super(lineno);"));
        assert!(decl.contains("this.caption = caption;"));
    }

    #[test]
    fn optional_fields_produce_one_extra_constructor_each() {
        let mut cls = Class::new("Point");
        cls.add_field(Field::new("caption", "String")).unwrap();
        cls.add_field(Field::new("posX", "int").optional()).unwrap();
        cls.add_field(Field::new("posY", "int").optional()).unwrap();
        let decl = cls.declaration().unwrap();
        // Full form plus one overload per optional field.
        assert_eq!(decl.matches("public Point(").count(), 3);
        assert!(decl.contains("public Point(String caption) {\n    this(caption, 0, 0);\n  }"));
        assert!(decl.contains("public Point(String caption, int posX) {\n    this(caption, posX, 0);\n  }"));
    }

    #[test]
    fn method_overloads_forward_to_full_form() {
        let method = Method::new("locate", "int")
            .with_arg(Field::new("name", "String"))
            .with_arg(Field::new("start", "int").optional())
            .with_body_line("return find(name, start);");
        let decls = method.all_declarations().unwrap();
        assert!(decls.contains("public int locate(String name, int start) {"));
        assert!(decls.contains("public int locate(String name) {\n    return locate(name, 0);\n  }"));
    }

    #[test]
    fn getter_only_for_final_fields() {
        let mut cls = Class::new("Pair");
        let mut first = Field::new("first", "Object");
        first.is_final = true;
        cls.add_field(first).unwrap();
        let decl = cls.declaration().unwrap();
        assert!(decl.contains("getFirst"));
        assert!(!decl.contains("setFirst"));
    }

    #[test]
    fn memoized_method_shape() {
        let mut cls = Class::new("Evaluator");
        cls.add_method(
            Method::new("eval", "int")
                .with_arg(Field::new("code", "String"))
                .with_body_line("return Integer.parseInt(code);")
                .memoized(Some("code".to_string()), Some("String".to_string())),
        );
        let decl = cls.declaration().unwrap();
        assert!(decl.contains("private final Map<String, Memo<Integer>> eval_cache = new HashMap<>();"));
        assert!(decl.contains("public int eval(String code) {"));
        assert!(decl.contains("private int _eval(String code) {"));
        assert!(decl.contains("Memo<Integer> info = eval_cache.get(code);"));
        // The nested cache entry class and its imports come along.
        assert!(decl.contains("private static class Memo<U>"));
        assert!(decl.contains("import java.util.HashMap;"));
    }

    #[test]
    fn memoized_parser_method_resets_and_logs() {
        let mut cls = Class::new("GeneratedParser");
        cls.add_method(
            Method::new("atom", "ASTExpr")
                .with_body_line("return null;")
                .memoized_parser(false),
        );
        let decl = cls.declaration().unwrap();
        assert!(decl.contains("int m = this.mark();"));
        assert!(decl.contains("this.reset(info.end_mark);"));
        assert!(decl.contains("log(\"atom() [cached]-> \" + info.toString());"));
        assert!(decl.contains("if (result != null)\n      atom_cache.put(m, new Memo<>(result, this.mark()));"));
    }

    #[test]
    fn non_empty_loop_treats_empty_result_as_miss() {
        let mut cls = Class::new("GeneratedParser");
        cls.add_method(
            Method::new("items", "ASTExpr[]")
                .with_body_line("return collect();")
                .memoized_parser(true),
        );
        let decl = cls.declaration().unwrap();
        assert!(decl.contains("if (result.length > 0) {"));
        assert!(decl.contains("return null;"));
    }

    #[test]
    fn pseudo_enum_declaration() {
        let mut en = Class::pseudo_enum("BinOp").unwrap();
        for v in ["Add", "Sub", "Mul"] {
            en.add_value(v, vec![]);
        }
        let decl = en.declaration().unwrap();
        assert!(decl.contains("public static final BinOp Add = new BinOp(\"Add\");"));
        assert!(decl.contains("public static final BinOp Mul = new BinOp(\"Mul\");"));
        assert!(decl.contains("public BinOp valueOf(String s) {"));
        assert!(decl.contains("throw new IllegalArgumentException(s);"));
        assert!(decl.contains("@Override\n  public String toString() {"));
    }

    #[test]
    fn interface_mirrors_public_members() {
        let mut cls = Class::new("Test");
        cls.add_field(Field::new("caption", "String")).unwrap();
        let mut hidden = Field::new("secret", "int");
        hidden.is_private = true;
        cls.add_field(hidden).unwrap();
        cls.add_method(
            Method::new("show", "void")
                .with_arg(Field::new("force", "boolean").optional())
                .with_body_line("this.visible = true;"),
        );
        let mut iface = Interface::new("TestI");
        iface.add_all(&cls);
        let decl = iface.declaration();
        assert!(decl.contains("interface TestI {"));
        assert!(decl.contains("String getCaption();"));
        assert!(decl.contains("void setCaption(String caption);"));
        assert!(!decl.contains("secret"));
        // Overloaded variants, from all args down to the mandatory ones.
        assert!(decl.contains("void show(boolean force);"));
        assert!(decl.contains("void show();"));
    }

    #[test]
    fn visitor_interface_wires_accept_methods() {
        let mut visitor = VisitorInterface::new("StmtVisitor");
        let mut cls = Class::new("AssignStmt");
        visitor.add_visit_method(&mut cls);
        let iface_decl = visitor.iface.declaration();
        assert!(iface_decl.contains("void visit(AssignStmt node);"));
        let cls_decl = cls.declaration().unwrap();
        assert!(cls_decl.contains("public void accept(StmtVisitor visitor) {\n    visitor.visit(this);\n  }"));
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let mut cls = Class::new("Test");
        cls.add_field(Field::new("x", "int")).unwrap();
        assert!(cls.add_field(Field::new("x", "long")).is_err());
    }
}
