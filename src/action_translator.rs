//! Translates grammar action snippets from C to Java.
//!
//! The translator first reads the reference C sources (`pegen.h`,
//! `pegen.c`, `action_helpers.c`). Enum typedefs and the small pair
//! structs become generated Java classes right away; helper functions are
//! registered in the type and method maps so that later action snippets
//! can be rewritten call by call. Allocation helpers that merely fill in a
//! struct are folded into plain Java constructor calls.
//!
//! `translate_action` then re-parses one action snippet with the shared
//! parser context and renders it through a visitor that overrides the
//! name, call, attribute, cast and conditional hooks.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::c_ast::{CType, CodeGen, Expr, Param, Stmt};
use crate::context::GeneratorContext;
use crate::errors::{GenError, Result};
use crate::java_model::{Class, Field, Method};
use crate::java_writer::JavaWriter;
use crate::parser::ParserContext;
use crate::type_translator::{title_case, TypeTranslator};

/// Seed mapping from C names to Java expressions.
const INITIAL_TYPE_MAP: &[(&str, &str)] = &[
    ("Py_Ellipsis", "PyPegen.Ellipsis"),
    ("Py_False", "PyPegen.False"),
    ("Py_None", "PyPegen.None"),
    ("Py_True", "PyPegen.True"),
    ("asdl", "AST"),
    ("Py_ssize_t", "int"),
    ("int", "int"),
    ("int_ty", "int"),
    ("asdl_arg", "Arg"),
    ("Augoperator", "AugOperator"),
    ("const char*", "String"),
    ("PyExc_SyntaxError", "PyExc.SyntaxError"),
    ("PyExc_IndentationError", "PyExc.IndentationError"),
    ("identifier_ty", "String"),
];

/// C struct fields that are accessor methods on the Java side.
const INITIAL_ATTR_MAP: &[(&str, &str)] = &[
    ("lineno", "getLineno()"),
    ("col_offset", "getColOffset()"),
    ("end_lineno", "getEndLineno()"),
    ("end_col_offset", "getEndColOffset()"),
    ("kind", "getKind()"),
    ("feature_version", "getFeatureVersion()"),
    ("id", "getId()"),
    ("args", "getArgs()"),
    ("keywords", "getKeywords()"),
    ("key", "getKey()"),
    ("value", "getValue()"),
];

/// Calls expanded inline; `#n` marks the n-th argument.
const XMACROS: &[(&str, usize, &str)] = &[
    ("seq_LEN", 1, "#1.length"),
    ("seq_GET", 2, "#1[#2]"),
];

/// Struct typedefs that become value-holder classes even without the
/// `Pair` naming convention.
const SPECIAL_STRUCTS: &[&str] = &["SlashWithDefault", "StarEtc", "AugOperator"];

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `true` when every cased character is uppercase, as in `CHECK_VERSION`.
fn is_all_upper(name: &str) -> bool {
    name.chars().any(|c| c.is_alphabetic())
        && name.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_uppercase())
}

/// The static-method name a helper function gets on the runtime support
/// class: `_PyPegen_seq_count_dots` becomes `PyPegen.seqCountDots`.
fn pypegen_name(c_name: &str) -> String {
    format!("PyPegen.{}", lower_first(&title_case(c_name)))
}

/// State for a series of action translations.
///
/// Holds the mapping information derived from the reference C sources,
/// the shared parser context, and the paths and package names needed to
/// create generated files.
pub struct ActionTranslator {
    context: GeneratorContext,
    pub types: TypeTranslator,
    attr_map: BTreeMap<String, String>,
    methods: BTreeMap<String, Vec<String>>,
    parser: ParserContext,
}

impl ActionTranslator {
    /// Builds the translator from the reference sources named by the
    /// context: `pegen.h` declares the helper API, `pegen.c` only grows
    /// the known-type set, and `action_helpers.c` supplies the foldable
    /// allocation helpers.
    pub fn new(context: GeneratorContext) -> Result<Self> {
        let mut translator = Self::with_initial_maps(context)?;
        translator.types.set_cache_path(&translator.context.type_map)?;

        let header = translator
            .parser
            .parse_file(&translator.context.reference_file("pegen.h"))?;
        translator
            .parser
            .parse_file(&translator.context.reference_file("pegen.c"))?;
        let helpers = translator
            .parser
            .parse_file(&translator.context.reference_file("action_helpers.c"))?;

        translator.scan_declarations(&header)?;
        translator.fold_constructors(&helpers);

        translator.parser.define_macro(
            "INVALID_VERSION_CHECK(p, version, msg, node)",
            "((this.feature_version >= version) ? node : \
             RAISE_SYNTAX_ERROR(\"%s only supported in Python 3.%i and greater\", msg, version))",
        )?;
        translator.seed_parser_types();
        Ok(translator)
    }

    fn with_initial_maps(context: GeneratorContext) -> Result<Self> {
        let mut types = TypeTranslator::new();
        for (c, j) in INITIAL_TYPE_MAP {
            types.add_type(*c, *j);
        }
        let attr_map = INITIAL_ATTR_MAP
            .iter()
            .map(|(c, j)| (c.to_string(), j.to_string()))
            .collect();
        let mut parser = ParserContext::new();
        parser.define_macro("Py_LOCAL_INLINE(t)", "t")?;
        parser.add_types(&["PyTypeObject", "PyObject", "Token"]);
        Ok(Self {
            context,
            types,
            attr_map,
            methods: BTreeMap::new(),
            parser,
        })
    }

    /// Registers every declaration of the reference header: enum typedefs
    /// and pair-like structs are turned into generated classes, helper
    /// functions into call rewrites.
    pub fn scan_declarations(&mut self, decls: &[Stmt]) -> Result<()> {
        for item in decls {
            match item.undecorated() {
                Stmt::TypeDecl { ty: CType::Enum(fields), name } => {
                    self.create_enum_type(name, fields)?;
                }
                Stmt::TypeDecl { ty: CType::Struct { fields, .. }, name }
                    if name.ends_with("Pair") || SPECIAL_STRUCTS.contains(&name.as_str()) =>
                {
                    self.create_value_holder(name, fields)?;
                }
                Stmt::FunctionDecl { name, params, .. } => {
                    self.register_function(name.clone(), params.clone());
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// An enum typedef becomes a class of named singletons extending the
    /// AST base; each enumerator maps to its singleton.
    fn create_enum_type(&mut self, name: &str, fields: &[String]) -> Result<()> {
        let class_name = format!("_{}", name);
        let mut cls = Class::pseudo_enum(&class_name)?;
        cls.modifiers.insert("public".to_string());
        cls.modifiers.insert("final".to_string());
        cls.set_base_name("AST");
        for field in fields {
            cls.add_value(field, vec![]);
            self.types.add_type(field, format!("{}.{}", class_name, field));
        }
        self.types.add_type(name, class_name.clone());
        debug!("generated enum holder {}", class_name);
        JavaWriter::new(&self.context).write_ast_class(&mut cls)?;
        Ok(())
    }

    /// A pair-like struct becomes a small class with final fields, one
    /// constructor and per-field getters. Two-field `*Pair` structs extend
    /// `ASTPair` and override its accessors.
    fn create_value_holder(&mut self, name: &str, fields: &[Stmt]) -> Result<()> {
        let mut members: Vec<(String, String)> = Vec::new();
        for stmt in fields {
            if let Stmt::Var(decl) = stmt.undecorated() {
                if let Some(f_name) = decl.names.first().map(|(n, _)| n.clone()) {
                    members.push((self.types.translate(&decl.ty.key()), f_name));
                }
            }
        }
        let is_pair = members.len() == 2 && name.ends_with("Pair");

        let mut cls = Class::new(name);
        cls.modifiers.insert("public".to_string());
        if is_pair {
            let params: Vec<&str> = members.iter().map(|(t, _)| t.as_str()).collect();
            cls.set_base_name(format!("ASTPair<{}>", params.join(", ")));
        } else {
            cls.set_base_name("AST");
        }
        for (j_type, f_name) in &members {
            let mut field = Field::new(f_name.clone(), j_type.clone());
            field.is_final = true;
            cls.add_field(field)?;
        }
        if is_pair {
            for ((j_type, f_name), accessor) in members.iter().zip(["First", "Second"]) {
                cls.add_method(
                    Method::new(format!("get{}", accessor), j_type.clone())
                        .overriding()
                        .with_body_line(format!("return this.{};", f_name)),
                );
            }
        }
        self.types.add_type(name, name);
        debug!("generated value holder {}", name);
        JavaWriter::new(&self.context).write_ast_class(&mut cls)?;
        Ok(())
    }

    /// Helper functions get a Java name (`PyPegen.x` for the `_PyPegen_`
    /// and all-caps families); functions taking the parser state as their
    /// first parameter have their remaining parameter types recorded so
    /// calls can drop the state argument.
    fn register_function(&mut self, name: String, params: Vec<Param>) {
        let j_name = if let Some(rest) = name
            .strip_prefix("_PyPegen_")
            .or_else(|| name.strip_prefix("_Pypegen_"))
        {
            let j = pypegen_name(rest);
            self.types.add_type(name, format!("{}()", j));
            j
        } else if is_all_upper(&name) {
            let j = pypegen_name(&name);
            self.types.add_type(name, format!("{}()", j));
            j
        } else {
            name
        };
        if first_param_is_parser(&params) {
            let arg_types = self.param_types(&params[1..]);
            self.methods.insert(j_name, arg_types);
        }
    }

    /// Replaces allocate-and-fill helper functions with plain constructor
    /// calls. One shape cannot become a single Java constructor and keeps
    /// a factory instead.
    pub fn fold_constructors(&mut self, decls: &[Stmt]) {
        for item in decls {
            let Some((name, ty, params)) = constructor_pattern(item) else {
                continue;
            };
            if ty.key() == "KeywordOrStarred*" {
                self.types.add_type(name, "PyPegen.keywordOrStarred()");
                let arg_types = self.param_types(&params[1..]);
                self.methods
                    .insert("PyPegen.keywordOrStarred".to_string(), arg_types);
            } else {
                let j_name = format!("new {}", self.types.translate(&ty.key()));
                self.types.add_type(name, format!("{}()", j_name));
                if first_param_is_parser(params) {
                    let arg_types = self.param_types(&params[1..]);
                    self.methods.insert(j_name.clone(), arg_types);
                }
                debug!("folded {} into {}", name, j_name);
            }
        }
    }

    fn param_types(&mut self, params: &[Param]) -> Vec<String> {
        params
            .iter()
            .map(|p| match p.ty() {
                Some(ty) => self.types.translate(&ty.key()),
                None => "...".to_string(),
            })
            .collect()
    }

    /// Makes every mapped `*_ty` name a known type of the shared parser,
    /// so later action snippets parse their casts correctly.
    fn seed_parser_types(&mut self) {
        let names: Vec<String> = self
            .types
            .type_entries()
            .filter(|(c, _)| !c.contains('.') && c.ends_with("_ty"))
            .map(|(c, _)| c.to_string())
            .collect();
        for name in &names {
            self.parser.add_type(name);
        }
    }

    /// Translates one action snippet; returns the Java expression and the
    /// unqualified names it references (candidates for imports).
    pub fn translate_action(&mut self, action: &str) -> Result<(String, BTreeSet<String>)> {
        let ast = self.parser.parse_expr(action)?;
        let mut visitor = ActionVisitor {
            types: &mut self.types,
            attr_map: &self.attr_map,
            methods: &self.methods,
            names: BTreeSet::new(),
        };
        let result = visitor.render_expr(&ast)?;
        Ok((result, visitor.names))
    }

    /// Writes the learned type mapping back to its cache file.
    pub fn flush(&self) -> Result<()> {
        self.types.flush()
    }
}

fn first_param_is_parser(params: &[Param]) -> bool {
    params
        .first()
        .and_then(Param::ty)
        .map(|t| t.key() == "Parser*")
        .unwrap_or(false)
}

/// Recognises the allocate / null-check / fill / return shape:
///
/// ```c
/// T *a = _PyArena_Malloc(...);
/// if (!a) { return NULL; }
/// a->x = x; ...
/// return a;
/// ```
fn constructor_pattern(item: &Stmt) -> Option<(&str, &CType, &[Param])> {
    let Stmt::FunctionDecl { ty, name, params, body: Some(body) } = item.undecorated() else {
        return None;
    };
    let Stmt::Body(stmts) = body.as_ref() else {
        return None;
    };
    if stmts.len() < 3 {
        return None;
    }

    let Stmt::Var(decl) = &stmts[0] else {
        return None;
    };
    let var_name = decl.name()?;
    if decl.ty != *ty || decl.init_value()?.func_name() != Some("_PyArena_Malloc") {
        return None;
    }

    let Stmt::If { test, body: if_body, orelse: _ } = &stmts[1] else {
        return None;
    };
    let Expr::UnaryOp { op, value } = test else {
        return None;
    };
    if op != "!" || *value.as_ref() != Expr::Name(var_name.to_string()) {
        return None;
    }
    let early_return = match if_body.as_ref() {
        Stmt::Return(expr) => expr,
        Stmt::Body(inner) if inner.len() == 1 => match &inner[0] {
            Stmt::Return(expr) => expr,
            _ => return None,
        },
        _ => return None,
    };
    if !matches!(early_return, Some(Expr::Const(v)) if v == "NULL") {
        return None;
    }

    match stmts.last()? {
        Stmt::Return(Some(Expr::Name(ret_name))) if ret_name == var_name => {}
        _ => return None,
    }

    for stmt in &stmts[2..stmts.len() - 1] {
        let Stmt::Expression(Expr::Assignment { target, source }) = stmt else {
            return None;
        };
        let Expr::Attribute { value, .. } = target.as_ref() else {
            return None;
        };
        if *value.as_ref() != Expr::Name(var_name.to_string())
            || !matches!(source.as_ref(), Expr::Name(_))
        {
            return None;
        }
    }
    Some((name, ty, params))
}

/// Rendering walker for one action snippet.
struct ActionVisitor<'t> {
    types: &'t mut TypeTranslator,
    attr_map: &'t BTreeMap<String, String>,
    methods: &'t BTreeMap<String, Vec<String>>,
    names: BTreeSet<String>,
}

impl ActionVisitor<'_> {
    fn xmacro(&self, func: &str, args: &[String]) -> Option<String> {
        let (_, n, template) = XMACROS.iter().find(|(name, _, _)| *name == func)?;
        if *n != args.len() {
            return None;
        }
        let mut text = template.to_string();
        for (i, arg) in args.iter().enumerate() {
            text = text.replace(&format!("#{}", i + 1), arg);
        }
        Some(text)
    }
}

impl CodeGen for ActionVisitor<'_> {
    fn render_name(&mut self, value: &str) -> Result<String> {
        let mut name = value.strip_prefix("asdl_").unwrap_or(value);
        if let Some(mapped) = self.types.lookup(name) {
            name = mapped;
            if let Some(idx) = name.find('(') {
                name = &name[..idx];
            }
        }
        let name = name.to_string();
        if !name.contains('.') {
            self.names.insert(name.clone());
        }
        Ok(name)
    }

    fn render_const(&mut self, value: &str) -> Result<String> {
        if value == "NULL" {
            Ok("null".to_string())
        } else {
            Ok(value.to_string())
        }
    }

    fn render_attribute(&mut self, value: &Expr, name: &str) -> Result<String> {
        // The tagged-union idiom `x->v.Kind.attr` is really a type cast.
        if self.types.lookup(&format!("_PyAST_{}", name)).is_some() {
            if let Expr::Attribute { value: base, name: v } = value {
                if v == "v" {
                    let mut base = base.as_ref();
                    if let Expr::TypeCast { value, .. } = base {
                        base = value;
                    }
                    let base = self.render_expr(base)?;
                    return Ok(format!("(({}) {})", name, base));
                }
            }
        }
        let value = self.render_expr(value)?;
        let name = self
            .attr_map
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string());
        Ok(format!("{}.{}", value, name))
    }

    fn render_if_expr(&mut self, test: &Expr, body: &Expr, orelse: &Expr) -> Result<String> {
        let mut test_code = self.render_expr(test)?;
        if matches!(test, Expr::Name(_)) {
            test_code = format!("({} != null)", test_code);
        }
        let body = self.render_expr(body)?;
        let orelse = self.render_expr(orelse)?;
        Ok(format!("({} ? {} : {})", test_code, body, orelse))
    }

    fn render_type_cast(&mut self, ty: &CType, value: &Expr) -> Result<String> {
        // A checked call keeps only the checked expression; the cast
        // disappears with the check.
        if let Expr::Call { func, args } = value {
            if let Expr::Name(func) = func.as_ref() {
                if (func == "CHECK_CALL" || func == "CHECK_CALL_NULL_ALLOWED") && args.len() > 1 {
                    return self.render_expr(&args[1]);
                }
            }
        }
        let j_type = self.types.translate(&ty.key());
        let value = self.render_expr(value)?;
        Ok(format!("({}){}", j_type, value))
    }

    fn render_call(&mut self, func: &Expr, args: &[Expr]) -> Result<String> {
        // Registered call rewrites act on the raw C name and see all
        // arguments, already rendered.
        if let Expr::Name(c_name) = func {
            if self.types.has_function(c_name) {
                let rendered = self.render_args(args)?;
                if let Some(text) = self.types.translate_call(c_name, &rendered)? {
                    return Ok(text);
                }
            }
        }

        let func_code = self.render_expr(func)?;
        let (func_code, mut call_args) = if let Some(method) = func_code.strip_prefix("#.") {
            let receiver = args.first().ok_or_else(|| {
                GenError::translate(format!("method template '{}' without a receiver", method))
            })?;
            let receiver = self.render_expr(receiver)?;
            (format!("{}.{}", receiver, method), self.render_args(&args[1..])?)
        } else if let Some(params) = self.methods.get(&func_code).cloned() {
            if func_code == "PyPegen.newTypeComment" && params.len() == 1 {
                if let Some(arg) = args.get(1) {
                    return self.render_expr(arg);
                }
            }
            // The first argument is the parser state; a trailing arena
            // parameter takes its argument with it.
            let start = usize::min(1, args.len());
            let end = if params.last().map(|p| p == "PyArena").unwrap_or(false)
                && args.len() > start
            {
                args.len() - 1
            } else {
                args.len()
            };
            (func_code, self.render_args(&args[start..end])?)
        } else {
            (func_code, self.render_args(args)?)
        };

        if call_args
            .last()
            .map(|a| a.ends_with(".arena"))
            .unwrap_or(false)
        {
            call_args.pop();
        }
        if let Some(text) = self.xmacro(&func_code, &call_args) {
            return Ok(text);
        }
        Ok(format!("{}({})", func_code, call_args.join(", ")))
    }
}
