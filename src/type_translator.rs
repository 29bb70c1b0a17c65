//! Conversion of C types and calls to their Java counterparts.
//!
//! Primitive types look obvious but are not: a C `int` may well be a Java
//! `boolean`, and C pointers collapse to plain references. Trailing stars
//! are therefore discarded, `_seq` linked lists become arrays, the `asdl_`
//! prefix and `_ty` suffix disappear, and snake case is normalised to
//! camel case as a last resort.
//!
//! The learned mapping is persisted to a line-oriented cache file with
//! entries of the form `c_abc->JAbc` for types and
//! `f(c params)->g(j params)` for call rewrites. Loading the cache is best
//! effort: a malformed line aborts loading and the built-in defaults stand.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::errors::{GenError, Result};

/// The fallback Java type when nothing else fits.
pub const DEFAULT_JAVA_OBJECT: &str = "Object";

const BUILTIN_TYPES: &[(&str, &str)] = &[
    ("char", "char"),
    // `String` is a better correspondence than `Character` here.
    ("char*", "String"),
    ("const char", "String"),
    ("const char*", "String"),
    ("double", "double"),
    ("double*", "Double"),
    ("float", "float"),
    ("float*", "Float"),
    ("int", "int"),
    ("int*", "Integer"),
    ("long", "int"),
    ("long*", "Integer"),
    ("long long", "long"),
    ("long long*", "Long"),
    ("size_t", "int"),
    ("void*", "Object"),
    ("Py_ssize_t", "int"),
    // These come from the schema language rather than from C.
    ("constant", "Object"),
    ("identifier", "String"),
    ("string", "String"),
];

/// How one C function call is rewritten.
///
/// The target is an arbitrary Java expression, not necessarily a name, so a
/// call `_make_foo(...)` can become `new Foo(...)`. An absent target makes
/// the call disappear: its sole surviving argument (if any) stands alone.
#[derive(Debug, Clone)]
pub struct CallRewrite {
    pub target: Option<String>,
    pub c_args: Vec<String>,
    pub j_args: Vec<String>,
    resolved: Option<Correspondence>,
}

/// The resolved parameter correspondence, computed once per rewrite.
#[derive(Debug, Clone)]
struct Correspondence {
    c_names: Vec<String>,
    j_names: Vec<String>,
    int_to_bools: BTreeSet<String>,
}

impl CallRewrite {
    pub fn new(target: Option<String>, c_args: Vec<String>, j_args: Vec<String>) -> Self {
        let target = target.filter(|t| !t.is_empty());
        Self {
            target,
            c_args,
            j_args,
            resolved: None,
        }
    }
}

/// Splits a parameter declaration like `expr_ty target` or `Parser *p`
/// into name and type.
fn split_decl(decl: &str) -> (String, String) {
    let i = decl
        .rfind(' ')
        .into_iter()
        .chain(decl.rfind('*'))
        .max()
        .map(|i| i + 1)
        .unwrap_or(0);
    let name = decl[i..].to_string();
    let ty = decl[..i].trim().to_string();
    (name, ty)
}

fn no_underscores(s: &str) -> String {
    s.to_lowercase().replace('_', "")
}

/// Snake case to title case: `some_type` becomes `SomeType`.
pub(crate) fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if ch.is_alphanumeric() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            if ch != '_' {
                out.push(ch);
            }
            at_word_start = true;
        }
    }
    out
}

pub struct TypeTranslator {
    type_map: BTreeMap<String, String>,
    functions: BTreeMap<String, CallRewrite>,
    unknown_types: BTreeSet<String>,
    cache_path: Option<PathBuf>,
}

impl Default for TypeTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTranslator {
    pub fn new() -> Self {
        Self {
            type_map: BUILTIN_TYPES
                .iter()
                .map(|(c, j)| (c.to_string(), j.to_string()))
                .collect(),
            functions: BTreeMap::new(),
            unknown_types: BTreeSet::new(),
            cache_path: None,
        }
    }

    /// Creates a translator backed by a cache file. A missing file is
    /// normal (it will be written on `flush`); a corrupt file is logged
    /// and partially ignored.
    pub fn with_cache(path: impl Into<PathBuf>) -> Result<Self> {
        let mut translator = Self::new();
        translator.set_cache_path(path)?;
        Ok(translator)
    }

    pub fn set_cache_path(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    GenError::io(format!("cannot create {}", parent.display()), e)
                })?;
            }
        }
        self.load_cache(&path);
        self.cache_path = Some(path);
        Ok(())
    }

    fn load_cache(&mut self, path: &Path) {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => {
                debug!("no type cache at {}, starting from defaults", path.display());
                return;
            }
        };
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            let Some((c_t, j_t)) = line.split_once("->") else {
                warn!(
                    "malformed line in type cache {}: '{}'; ignoring the rest",
                    path.display(),
                    line
                );
                return;
            };
            let c_idx = c_t.find('(');
            let j_idx = j_t.find('(');
            match (c_idx, j_idx) {
                (Some(ci), Some(ji)) if c_t.ends_with(')') && j_t.ends_with(')') => {
                    let c_func = c_t[..ci].to_string();
                    let j_func = j_t[..ji].to_string();
                    let c_args = split_args(&c_t[ci + 1..c_t.len() - 1]);
                    let j_args = split_args(&j_t[ji + 1..j_t.len() - 1]);
                    self.functions
                        .insert(c_func, CallRewrite::new(Some(j_func), c_args, j_args));
                }
                _ => {
                    self.type_map.insert(c_t.to_string(), j_t.to_string());
                }
            }
        }
        debug!("loaded type cache from {}", path.display());
    }

    /// Writes the current mapping back to the cache file. Call this once
    /// at clean exit; nothing is written when no cache path is set.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.cache_path else {
            return Ok(());
        };
        let mut out = String::new();
        for (c_type, j_type) in &self.type_map {
            out.push_str(&format!("{}->{}\n", c_type, j_type));
        }
        for (c_func, rewrite) in &self.functions {
            out.push_str(&format!(
                "{}({})->{}({})\n",
                c_func,
                rewrite.c_args.join(","),
                rewrite.target.as_deref().unwrap_or(""),
                rewrite.j_args.join(","),
            ));
        }
        fs::write(path, out)
            .map_err(|e| GenError::io(format!("cannot write {}", path.display()), e))
    }

    pub fn add_type(&mut self, c_type: impl Into<String>, j_type: impl Into<String>) {
        self.type_map.insert(c_type.into(), j_type.into());
    }

    pub fn add_function(
        &mut self,
        c_func: impl Into<String>,
        c_args: Vec<String>,
        target: Option<String>,
        j_args: Vec<String>,
    ) {
        self.functions
            .insert(c_func.into(), CallRewrite::new(target, c_args, j_args));
    }

    pub fn lookup(&self, c_type: &str) -> Option<&str> {
        self.type_map.get(c_type).map(|s| s.as_str())
    }

    pub fn type_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.type_map.iter().map(|(c, j)| (c.as_str(), j.as_str()))
    }

    pub fn has_function(&self, c_func: &str) -> bool {
        self.functions.contains_key(c_func)
    }

    /// The set of types that could not be translated so far; useful for
    /// spotting missing entries in the mapping.
    pub fn unknown_types(&self) -> &BTreeSet<String> {
        &self.unknown_types
    }

    /// Best guess whether a type (C or Java) denotes an array. Strings do
    /// not count.
    pub fn is_array(tp: &str) -> bool {
        tp.ends_with("[]") || tp.ends_with("_seq*")
    }

    /// The core operation: returns the Java type for a C type.
    pub fn translate(&mut self, c_type: &str) -> String {
        if let Some(j_type) = self.type_map.get(c_type) {
            return j_type.clone();
        }
        if c_type.is_empty() {
            return DEFAULT_JAVA_OBJECT.to_string();
        }
        if let Some(base) = c_type.strip_suffix("_seq*") {
            return self.translate(base) + "[]";
        }
        if let Some(base) = c_type.strip_suffix("[]") {
            // Not a real C type; appending empty brackets turns any type
            // into an array.
            return self.translate(base) + "[]";
        }
        if let Some(base) = c_type.strip_prefix("asdl_") {
            return self.translate(base);
        }
        if let Some(base) = c_type.strip_suffix("_ty") {
            return self.translate(base);
        }
        if let Some(base) = c_type.strip_suffix('*') {
            return self.translate(base);
        }
        if c_type.starts_with("signed ") || c_type.starts_with("unsigned ") {
            let base = &c_type[c_type.find(' ').unwrap_or(0) + 1..];
            let result = self.translate(base);
            if !matches!(
                result.to_lowercase().as_str(),
                "int" | "long" | "integer" | "short" | "byte"
            ) {
                self.unknown_types.insert(c_type.to_string());
            }
            return result;
        }
        if let (Some(idx_1), Some(idx_2)) = (c_type.find('('), c_type.find(')')) {
            return self.translate_compound(c_type, idx_1, idx_2);
        }
        // Names that already look like Java classes pass through, but they
        // still count as unmapped for the end-of-run report.
        if c_type.starts_with(|c: char| c.is_uppercase()) && !c_type.contains('_') {
            self.unknown_types.insert(c_type.to_string());
            return c_type.to_string();
        }
        self.unknown_types.insert(c_type.to_string());
        title_case(c_type)
    }

    pub fn translate_seq(&mut self, c_type: &str, is_seq: bool) -> String {
        if is_seq {
            self.translate(c_type) + "[]"
        } else {
            self.translate(c_type)
        }
    }

    /// Function pointers and types in parentheses: `(t)`, `t(u,v)` and
    /// `(t)(u,v)`.
    fn translate_compound(&mut self, c_type: &str, idx_1: usize, idx_2: usize) -> String {
        let last = c_type.len() - 1;
        if idx_1 == 0 && idx_2 == last {
            return self.translate(&c_type[1..last]);
        }
        if idx_1 > 0 && idx_2 == last {
            let func = self.translate(&c_type[..idx_1]);
            let args = self.translate_list(&c_type[idx_1 + 1..last]);
            return format!("{}({})", func, args.join(", "));
        }
        if idx_1 == 0
            && c_type[idx_2 + 1..].starts_with('(')
            && c_type.ends_with(')')
            && c_type[idx_2 + 1..c_type.len() - 1].find(')').is_none()
        {
            let func = self.translate(&c_type[1..idx_2]);
            let args = self.translate_list(&c_type[idx_2 + 2..last]);
            return format!("{}({})", func, args.join(", "));
        }
        self.unknown_types.insert(c_type.to_string());
        DEFAULT_JAVA_OBJECT.to_string()
    }

    fn translate_list(&mut self, args: &str) -> Vec<String> {
        args.split(',')
            .map(|t| self.translate(t.trim()))
            .collect()
    }

    /// Translates a C call to its Java form. The arguments must already be
    /// Java expressions. Returns `Ok(None)` when no rewrite is registered
    /// for the function, or when a targetless rewrite keeps more than one
    /// argument; either way the caller falls back to its own handling.
    pub fn translate_call(&mut self, c_func: &str, args: &[String]) -> Result<Option<String>> {
        if !self.functions.contains_key(c_func) {
            return Ok(None);
        }
        if self.functions[c_func].resolved.is_none() {
            let resolved = self.resolve_correspondence(c_func)?;
            if let Some(rewrite) = self.functions.get_mut(c_func) {
                rewrite.resolved = Some(resolved);
            }
        }
        let rewrite = &self.functions[c_func];
        let resolved = rewrite
            .resolved
            .as_ref()
            .ok_or_else(|| GenError::internal(format!("unresolved rewrite for '{}'", c_func)))?;

        let arg_map: HashMap<&str, &str> = resolved
            .c_names
            .iter()
            .map(|n| n.as_str())
            .zip(args.iter().map(|a| a.as_str()))
            .collect();
        let mut new_args = Vec::with_capacity(resolved.j_names.len());
        for name in &resolved.j_names {
            let value = *arg_map.get(name.as_str()).ok_or_else(|| {
                GenError::translate(format!(
                    "missing argument '{}' in call to '{}'",
                    name, c_func
                ))
            })?;
            new_args.push(int_to_bool(value, name, &resolved.int_to_bools));
        }
        match &rewrite.target {
            Some(target) => Ok(Some(format!("{}({})", target, new_args.join(", ")))),
            None => match new_args.len() {
                0 => Ok(Some(String::new())),
                1 => Ok(Some(new_args.remove(0))),
                n => {
                    // Cannot collapse to a single expression; let the
                    // caller render the call its own way.
                    warn!(
                        "targetless rewrite of '{}' keeps {} arguments, skipping",
                        c_func, n
                    );
                    Ok(None)
                }
            },
        }
    }

    /// Establishes which C parameter corresponds to which Java parameter.
    ///
    /// Names do not always match exactly, so this works in two tiers: first
    /// a comparison that ignores case and underscores, then a substring
    /// match where the C name must make up at least half of the Java name
    /// (intended for pairs like `simple` and `isSimple`). Anything left
    /// unmatched is a hard error naming the call and the parameter.
    fn resolve_correspondence(&self, c_func: &str) -> Result<Correspondence> {
        let rewrite = &self.functions[c_func];
        let c_decls: Vec<(String, String)> =
            rewrite.c_args.iter().map(|a| split_decl(a)).collect();
        let j_decls: Vec<(String, String)> =
            rewrite.j_args.iter().map(|a| split_decl(a)).collect();

        let mut c_names: Vec<String> = c_decls.iter().map(|(n, _)| n.clone()).collect();
        let mut c_types: HashMap<String, String> = c_decls.iter().cloned().collect();
        let j_names: Vec<String> = j_decls.iter().map(|(n, _)| n.clone()).collect();

        for j_name in &j_names {
            if c_names.contains(j_name) {
                continue;
            }
            let exact = c_names
                .iter()
                .position(|c_name| no_underscores(c_name) == j_name.to_lowercase());
            let found = exact.or_else(|| {
                c_names.iter().position(|c_name| {
                    c_name.len() * 2 >= j_name.len()
                        && (j_name.to_lowercase().contains(&c_name.to_lowercase())
                            || j_name.to_lowercase().contains(&no_underscores(c_name)))
                })
            });
            match found {
                Some(i) => {
                    let ty = c_types.get(&c_names[i]).cloned().unwrap_or_default();
                    c_types.insert(j_name.clone(), ty);
                    c_names[i] = j_name.clone();
                }
                None => {
                    let c = format!("{}({})", c_func, c_names.join(", "));
                    let j = format!("{}({})", c_func, j_names.join(", "));
                    return Err(GenError::translate(format!(
                        "cannot translate {}->{} because of missing argument ('{}' in '{}->{}')",
                        c_func,
                        rewrite.target.as_deref().unwrap_or(""),
                        j_name,
                        c,
                        j
                    )));
                }
            }
        }

        // A C `int` becomes a Java `boolean` where the declared Java type
        // says so; deduced here, applied per argument on every call.
        let mut int_to_bools = BTreeSet::new();
        for (name, j_ty) in &j_decls {
            if j_ty.to_lowercase() == "boolean"
                && c_types.get(name).map(|t| t == "int").unwrap_or(false)
            {
                int_to_bools.insert(name.clone());
            }
        }

        Ok(Correspondence {
            c_names,
            j_names,
            int_to_bools,
        })
    }
}

fn int_to_bool(value: &str, name: &str, int_to_bools: &BTreeSet<String>) -> String {
    if int_to_bools.contains(name) {
        match value {
            "0" => "false".to_string(),
            "1" => "true".to_string(),
            _ => format!("{} != 0", value),
        }
    } else {
        value.to_string()
    }
}

fn split_args(args: &str) -> Vec<String> {
    if args.trim().is_empty() {
        Vec::new()
    } else {
        args.split(',').map(|a| a.trim().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test_case("int", "int")]
    #[test_case("char*", "String")]
    #[test_case("const char*", "String")]
    #[test_case("void*", "Object")]
    #[test_case("Py_ssize_t", "int")]
    #[test_case("identifier", "String")]
    fn builtin_types(c_type: &str, expected: &str) {
        assert_eq!(TypeTranslator::new().translate(c_type), expected);
    }

    #[test_case("stmt_ty", "Stmt")]
    #[test_case("asdl_expr_seq*", "Expr[]")]
    #[test_case("int_seq*", "int[]")]
    #[test_case("expr_ty[]", "Expr[]")]
    #[test_case("unsigned int", "int")]
    #[test_case("keyword_ty*", "Keyword")]
    #[test_case("(void*)", "Object")]
    #[test_case("(long long*)(long, long)", "Long(int, int)")]
    #[test_case("PyObject*", "PyObject")]
    #[test_case("KeyValuePair", "KeyValuePair")]
    fn heuristic_strips(c_type: &str, expected: &str) {
        assert_eq!(TypeTranslator::new().translate(c_type), expected);
    }

    #[test_case("int"; "primitive")]
    #[test_case("String"; "string")]
    #[test_case("Expr"; "class name")]
    #[test_case("Expr[]"; "array")]
    #[test_case("Object"; "object fallback")]
    fn translation_is_a_fixed_point(ty: &str) {
        let mut tr = TypeTranslator::new();
        let once = tr.translate(ty);
        let twice = tr.translate(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_types_are_recorded() {
        let mut tr = TypeTranslator::new();
        assert_eq!(tr.translate("some_odd_type"), "SomeOddType");
        assert!(tr.unknown_types().contains("some_odd_type"));
        assert_eq!(tr.translate("unsigned wobble"), "Wobble");
        assert!(tr.unknown_types().contains("unsigned wobble"));
        // Pass-through names are reported too, even though they keep
        // their spelling.
        assert_eq!(tr.translate("PyObject*"), "PyObject");
        assert!(tr.unknown_types().contains("PyObject"));
    }

    #[test]
    fn registered_types_win_over_heuristics() {
        let mut tr = TypeTranslator::new();
        // Registration is exact-key; the strip chain ends at the bare
        // name, so both forms are registered (as the schema generator does).
        tr.add_type("expr", "ASTExpr");
        tr.add_type("expr_ty", "ASTExpr");
        assert_eq!(tr.translate("expr_ty"), "ASTExpr");
        assert_eq!(tr.translate("asdl_expr_seq*"), "ASTExpr[]");
        // Without the bare name the heuristics take over.
        let mut tr = TypeTranslator::new();
        tr.add_type("stmt_ty", "ASTStmt");
        assert_eq!(tr.translate("asdl_stmt_seq*"), "Stmt[]");
    }

    #[test]
    fn is_array_guess() {
        assert!(TypeTranslator::is_array("int[]"));
        assert!(TypeTranslator::is_array("asdl_expr_seq*"));
        assert!(!TypeTranslator::is_array("String"));
    }

    #[test]
    fn call_with_renamed_and_coerced_arguments() {
        let mut tr = TypeTranslator::new();
        tr.add_function(
            "_PyAST_AnnAssign",
            strings(&[
                "expr_ty target",
                "expr_ty annotation",
                "expr_ty value",
                "int simple",
                "int lineno",
                "int col_offset",
                "int end_lineno",
                "int end_col_offset",
                "PyArena *arena",
            ]),
            Some("new AnnAssign".to_string()),
            strings(&[
                "ASTExpr target",
                "ASTExpr annotation",
                "ASTExpr value",
                "boolean is_simple",
                "int lineno",
                "int col_offset",
                "int end_lineno",
                "int end_col_offset",
            ]),
        );
        let args = strings(&[
            "Name(\"x\")",
            "null",
            "Constant(123)",
            "1",
            "1",
            "0",
            "1",
            "10",
            "null",
        ]);
        let result = tr.translate_call("_PyAST_AnnAssign", &args).unwrap();
        assert_eq!(
            result.as_deref(),
            Some("new AnnAssign(Name(\"x\"), null, Constant(123), true, 1, 0, 1, 10)")
        );
        // The correspondence is memoized; a second call must agree.
        let again = tr.translate_call("_PyAST_AnnAssign", &args).unwrap();
        assert_eq!(result, again);
    }

    #[test]
    fn int_to_bool_uses_declared_java_type() {
        let mut tr = TypeTranslator::new();
        tr.add_function(
            "mark",
            strings(&["int flag"]),
            Some("mark".to_string()),
            strings(&["boolean flag"]),
        );
        assert_eq!(
            tr.translate_call("mark", &strings(&["0"])).unwrap().as_deref(),
            Some("mark(false)")
        );
        assert_eq!(
            tr.translate_call("mark", &strings(&["n"])).unwrap().as_deref(),
            Some("mark(n != 0)")
        );
    }

    #[test]
    fn check_style_call_collapses_to_surviving_argument() {
        let mut tr = TypeTranslator::new();
        tr.add_function(
            "CHECK",
            strings(&["Parser *p", "void *result"]),
            None,
            strings(&["Object result"]),
        );
        let result = tr
            .translate_call("CHECK", &strings(&["p", "make(1, 2)"]))
            .unwrap();
        assert_eq!(result.as_deref(), Some("make(1, 2)"));
    }

    #[test]
    fn pure_check_call_disappears() {
        let mut tr = TypeTranslator::new();
        tr.add_function(
            "CHECK_VERSION",
            strings(&["Parser *p", "int version"]),
            None,
            strings(&[]),
        );
        let result = tr
            .translate_call("CHECK_VERSION", &strings(&["p", "9"]))
            .unwrap();
        assert_eq!(result.as_deref(), Some(""));
    }

    #[test]
    fn targetless_call_with_several_survivors_falls_back() {
        let mut tr = TypeTranslator::new();
        tr.add_function(
            "CHECK_BOTH",
            strings(&["void *first", "void *second"]),
            None,
            strings(&["Object first", "Object second"]),
        );
        let result = tr
            .translate_call("CHECK_BOTH", &strings(&["a", "b"]))
            .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn unknown_function_returns_none() {
        let mut tr = TypeTranslator::new();
        assert_eq!(tr.translate_call("nope", &strings(&["x"])).unwrap(), None);
    }

    #[test]
    fn unmatched_parameter_is_a_hard_error() {
        let mut tr = TypeTranslator::new();
        tr.add_function(
            "f",
            strings(&["int alpha"]),
            Some("f".to_string()),
            strings(&["int omega"]),
        );
        let err = tr.translate_call("f", &strings(&["1"])).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("omega"), "error must name the parameter: {}", text);
        assert!(text.contains('f'), "error must name the call: {}", text);
    }

    #[test]
    fn cache_round_trip() {
        let dir = std::env::temp_dir().join(format!("typecache-{}", std::process::id()));
        let path = dir.join("map.txt");
        {
            let mut tr = TypeTranslator::with_cache(&path).unwrap();
            tr.add_type("expr_ty", "ASTExpr");
            tr.add_function(
                "CHECK",
                strings(&["Parser *p", "void *result"]),
                None,
                strings(&["Object result"]),
            );
            tr.flush().unwrap();
        }
        let mut tr = TypeTranslator::with_cache(&path).unwrap();
        assert_eq!(tr.translate("expr_ty"), "ASTExpr");
        let result = tr.translate_call("CHECK", &strings(&["p", "x"])).unwrap();
        assert_eq!(result.as_deref(), Some("x"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn malformed_cache_line_aborts_loading() {
        let dir = std::env::temp_dir().join(format!("typecache-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("map.txt");
        std::fs::write(&path, "alpha_ty->Alpha\ngarbage line\nbeta_ty->Beta\n").unwrap();
        let mut tr = TypeTranslator::with_cache(&path).unwrap();
        // Entries before the bad line are kept, the rest is ignored and the
        // defaults still stand.
        assert_eq!(tr.translate("alpha_ty"), "Alpha");
        assert_eq!(tr.lookup("beta_ty"), None);
        assert_eq!(tr.translate("int"), "int");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn split_decl_handles_pointers_and_plain_names() {
        assert_eq!(
            split_decl("Parser *p"),
            ("p".to_string(), "Parser *".to_string())
        );
        assert_eq!(
            split_decl("expr_ty target"),
            ("target".to_string(), "expr_ty".to_string())
        );
    }
}
