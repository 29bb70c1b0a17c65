//! AST for the C dialect used by the reference sources.
//!
//! Only the constructs that actually occur in the parsed headers, helper
//! implementations and grammar actions are represented. The node set is
//! deliberately closed: walkers match exhaustively and route unhandled
//! variants through a default arm.

use std::fmt;

use crate::errors::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum CType {
    Array { elem: Box<CType>, dimension: String },
    Base(String),
    Const(Box<CType>),
    Enum(Vec<String>),
    Func { return_type: Box<CType>, params: Vec<CType> },
    Pointer(Box<CType>),
    Struct { name: Option<String>, fields: Vec<Stmt> },
}

impl CType {
    pub fn base(name: impl Into<String>) -> Self {
        CType::Base(name.into())
    }

    pub fn pointer(base: CType) -> Self {
        CType::Pointer(Box::new(base))
    }

    /// The textual form used as a lookup key in the type maps.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CType::Array { elem, dimension } => write!(f, "{}[{}]", elem, dimension),
            CType::Base(name) => write!(f, "{}", name),
            CType::Const(inner) => write!(f, "const {}", inner),
            CType::Enum(_) => write!(f, "enum"),
            CType::Func { return_type, params } => {
                let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                write!(f, "{}({})", return_type, params.join(", "))
            }
            CType::Pointer(base) => write!(f, "{}*", base),
            CType::Struct { name, .. } => match name {
                Some(name) => write!(f, "struct {}", name),
                None => write!(f, "struct"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    AddressOf(Box<Expr>),
    Assignment { target: Box<Expr>, source: Box<Expr> },
    Attribute { value: Box<Expr>, name: String },
    AugAssignment { target: Box<Expr>, op: String, source: Box<Expr> },
    BinOp { left: Box<Expr>, op: String, right: Box<Expr> },
    Call { func: Box<Expr>, args: Vec<Expr> },
    Comparison { left: Box<Expr>, op: String, right: Box<Expr> },
    Const(String),
    ConstArray(Vec<Expr>),
    Deref(Box<Expr>),
    IfExpr { test: Box<Expr>, body: Box<Expr>, orelse: Box<Expr> },
    Name(String),
    SizeOfExpr(Box<Expr>),
    SizeOfType(CType),
    Subscript { value: Box<Expr>, index: Box<Expr> },
    TypeCast { ty: CType, value: Box<Expr> },
    UnaryOp { op: String, value: Box<Expr> },
    UnarySuffixOp { op: String, value: Box<Expr> },
}

impl Expr {
    pub fn name(value: impl Into<String>) -> Self {
        Expr::Name(value.into())
    }

    /// For a call on a plain name, that name.
    pub fn func_name(&self) -> Option<&str> {
        if let Expr::Call { func, .. } = self {
            if let Expr::Name(name) = func.as_ref() {
                return Some(name);
            }
        }
        None
    }
}

/// One declarator of a variable declaration: name and optional initializer.
pub type Declarator = (String, Option<Expr>);

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub ty: CType,
    pub names: Vec<Declarator>,
}

impl VarDecl {
    pub fn new(ty: CType, names: Vec<Declarator>) -> Self {
        Self { ty, names }
    }

    pub fn single(ty: CType, name: impl Into<String>) -> Self {
        Self {
            ty,
            names: vec![(name.into(), None)],
        }
    }

    /// The declared name, when there is exactly one declarator.
    pub fn name(&self) -> Option<&str> {
        match self.names.as_slice() {
            [(name, _)] => Some(name),
            _ => None,
        }
    }

    pub fn init_value(&self) -> Option<&Expr> {
        match self.names.as_slice() {
            [(_, init)] => init.as_ref(),
            _ => None,
        }
    }
}

/// A formal parameter of a function declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Ellipsis,
    Decl { ty: CType, name: Option<String> },
}

impl Param {
    pub fn name(&self) -> Option<&str> {
        match self {
            Param::Ellipsis => Some("..."),
            Param::Decl { name, .. } => name.as_deref(),
        }
    }

    pub fn ty(&self) -> Option<&CType> {
        match self {
            Param::Ellipsis => None,
            Param::Decl { ty, .. } => Some(ty),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub label: Option<Expr>,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Body(Vec<Stmt>),
    Break,
    Continue,
    Decorated { decor: String, decl: Box<Stmt> },
    DoWhile { test: Expr, body: Box<Stmt> },
    Empty,
    Expression(Expr),
    For {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        incr: Option<Box<Stmt>>,
        body: Box<Stmt>,
    },
    FunctionDecl {
        ty: CType,
        name: String,
        params: Vec<Param>,
        body: Option<Box<Stmt>>,
    },
    Goto(String),
    If {
        test: Expr,
        body: Box<Stmt>,
        orelse: Option<Box<Stmt>>,
    },
    Label(String),
    Return(Option<Expr>),
    Switch { subject: Expr, cases: Vec<Case> },
    TypeDecl { ty: CType, name: String },
    Var(VarDecl),
    While { test: Expr, body: Box<Stmt> },
}

impl Stmt {
    /// Unwraps `static`/`inline` decoration.
    pub fn undecorated(&self) -> &Stmt {
        match self {
            Stmt::Decorated { decl, .. } => decl.undecorated(),
            other => other,
        }
    }
}

fn indent_block(body: &str) -> String {
    if body.starts_with('{') {
        format!(" {}", body)
    } else {
        format!("\n  {}", body)
    }
}

/// Code-generating tree walker.
///
/// The default methods reproduce the input as C-like source; translators
/// override the hooks they care about (names, calls, attributes, casts) and
/// inherit the rest. All hooks receive the walker mutably so overriding
/// implementations can accumulate state while rendering.
pub trait CodeGen {
    fn render_expr(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::AddressOf(value) => self.render_address_of(value),
            Expr::Assignment { target, source } => self.render_assignment(target, source),
            Expr::Attribute { value, name } => self.render_attribute(value, name),
            Expr::AugAssignment { target, op, source } => {
                self.render_aug_assignment(target, op, source)
            }
            Expr::BinOp { left, op, right } => self.render_bin_op(left, op, right),
            Expr::Call { func, args } => self.render_call(func, args),
            Expr::Comparison { left, op, right } => self.render_comparison(left, op, right),
            Expr::Const(value) => self.render_const(value),
            Expr::ConstArray(values) => self.render_const_array(values),
            Expr::Deref(value) => self.render_deref(value),
            Expr::IfExpr { test, body, orelse } => self.render_if_expr(test, body, orelse),
            Expr::Name(value) => self.render_name(value),
            Expr::SizeOfExpr(value) => {
                let value = self.render_expr(value)?;
                Ok(format!("sizeof({})", value))
            }
            Expr::SizeOfType(ty) => {
                let ty = self.render_type(ty)?;
                Ok(format!("sizeof({})", ty))
            }
            Expr::Subscript { value, index } => self.render_subscript(value, index),
            Expr::TypeCast { ty, value } => self.render_type_cast(ty, value),
            Expr::UnaryOp { op, value } => self.render_unary_op(op, value),
            Expr::UnarySuffixOp { op, value } => {
                let value = self.render_expr(value)?;
                Ok(format!("{}{}", value, op))
            }
        }
    }

    fn render_type(&mut self, ty: &CType) -> Result<String> {
        Ok(ty.to_string())
    }

    fn render_address_of(&mut self, value: &Expr) -> Result<String> {
        let value = self.render_expr(value)?;
        Ok(format!("&{}", value))
    }

    fn render_assignment(&mut self, target: &Expr, source: &Expr) -> Result<String> {
        let target = self.render_expr(target)?;
        let source = self.render_expr(source)?;
        Ok(format!("{} = {}", target, source))
    }

    fn render_attribute(&mut self, value: &Expr, name: &str) -> Result<String> {
        let value = self.render_expr(value)?;
        Ok(format!("{}.{}", value, name))
    }

    fn render_aug_assignment(&mut self, target: &Expr, op: &str, source: &Expr) -> Result<String> {
        let target = self.render_expr(target)?;
        let source = self.render_expr(source)?;
        Ok(format!("{} {}= {}", target, op, source))
    }

    fn render_bin_op(&mut self, left: &Expr, op: &str, right: &Expr) -> Result<String> {
        let left = self.render_expr(left)?;
        let right = self.render_expr(right)?;
        Ok(format!("({} {} {})", left, op, right))
    }

    fn render_call(&mut self, func: &Expr, args: &[Expr]) -> Result<String> {
        let func = self.render_expr(func)?;
        let args = self.render_args(args)?;
        Ok(format!("{}({})", func, args.join(", ")))
    }

    fn render_args(&mut self, args: &[Expr]) -> Result<Vec<String>> {
        args.iter().map(|a| self.render_expr(a)).collect()
    }

    fn render_comparison(&mut self, left: &Expr, op: &str, right: &Expr) -> Result<String> {
        let left = self.render_expr(left)?;
        let right = self.render_expr(right)?;
        Ok(format!("({} {} {})", left, op, right))
    }

    fn render_const(&mut self, value: &str) -> Result<String> {
        Ok(value.to_string())
    }

    fn render_const_array(&mut self, values: &[Expr]) -> Result<String> {
        let values = self.render_args(values)?;
        Ok(format!("{{{}}}", values.join(", ")))
    }

    fn render_deref(&mut self, value: &Expr) -> Result<String> {
        let value = self.render_expr(value)?;
        Ok(format!("*{}", value))
    }

    fn render_if_expr(&mut self, test: &Expr, body: &Expr, orelse: &Expr) -> Result<String> {
        let test = self.render_expr(test)?;
        let body = self.render_expr(body)?;
        let orelse = self.render_expr(orelse)?;
        Ok(format!("({} ? {} : {})", test, body, orelse))
    }

    fn render_name(&mut self, value: &str) -> Result<String> {
        Ok(value.to_string())
    }

    fn render_subscript(&mut self, value: &Expr, index: &Expr) -> Result<String> {
        let value = self.render_expr(value)?;
        let index = self.render_expr(index)?;
        Ok(format!("{}[{}]", value, index))
    }

    fn render_type_cast(&mut self, ty: &CType, value: &Expr) -> Result<String> {
        let ty = self.render_type(ty)?;
        let value = self.render_expr(value)?;
        Ok(format!("({}){}", ty, value))
    }

    fn render_unary_op(&mut self, op: &str, value: &Expr) -> Result<String> {
        let value = self.render_expr(value)?;
        Ok(format!("{}{}", op, value))
    }

    fn render_stmt(&mut self, stmt: &Stmt) -> Result<String> {
        match stmt {
            Stmt::Body(stmts) => {
                let mut code = Vec::with_capacity(stmts.len());
                for stmt in stmts {
                    code.push(self.render_stmt(stmt)?.replace('\n', "\n  "));
                }
                Ok(format!("{{\n  {}\n}}", code.join("\n  ")))
            }
            Stmt::Break => Ok("break;".to_string()),
            Stmt::Continue => Ok("continue;".to_string()),
            Stmt::Decorated { decor, decl } => {
                let decl = self.render_stmt(decl)?;
                Ok(format!("{} {}", decor, decl))
            }
            Stmt::DoWhile { test, body } => {
                let test = self.render_expr(test)?;
                let body = self.render_stmt(body)?;
                Ok(format!("do {} while ({});", body, test))
            }
            Stmt::Empty => Ok(";".to_string()),
            Stmt::Expression(expr) => {
                let expr = self.render_expr(expr)?;
                Ok(format!("{};", expr))
            }
            Stmt::For { init, test, incr, body } => {
                let init = match init {
                    Some(init) => self.render_stmt(init)?.trim_end_matches(';').to_string(),
                    None => String::new(),
                };
                let test = match test {
                    Some(test) => self.render_expr(test)?,
                    None => String::new(),
                };
                let incr = match incr {
                    Some(incr) => self.render_stmt(incr)?.trim_end_matches(';').to_string(),
                    None => String::new(),
                };
                let body = self.render_stmt(body)?;
                Ok(format!("for ({}; {}; {}){}", init, test, incr, indent_block(&body)))
            }
            Stmt::FunctionDecl { ty, name, params, body } => {
                let ty = self.render_type(ty)?;
                let params: Vec<String> = params
                    .iter()
                    .map(|p| match p {
                        Param::Ellipsis => Ok("...".to_string()),
                        Param::Decl { ty, name } => {
                            let ty = self.render_type(ty)?;
                            Ok(match name {
                                Some(name) => format!("{} {}", ty, name),
                                None => ty,
                            })
                        }
                    })
                    .collect::<Result<_>>()?;
                let head = format!("{} {}({})", ty, name, params.join(", "));
                match body {
                    Some(body) => {
                        let body = self.render_stmt(body)?;
                        Ok(format!("{}{}", head, indent_block(&body)))
                    }
                    None => Ok(format!("{};", head)),
                }
            }
            Stmt::Goto(target) => Ok(format!("goto {};", target)),
            Stmt::If { test, body, orelse } => {
                let test = self.render_expr(test)?;
                let body = self.render_stmt(body)?;
                let mut result = format!("if ({}){}", test, indent_block(&body));
                if let Some(orelse) = orelse {
                    let orelse = self.render_stmt(orelse)?;
                    result.push_str(&format!("\nelse{}", indent_block(&orelse)));
                }
                Ok(result)
            }
            Stmt::Label(name) => Ok(format!("{}:", name)),
            Stmt::Return(expr) => match expr {
                Some(expr) => {
                    let expr = self.render_expr(expr)?;
                    Ok(format!("return {};", expr))
                }
                None => Ok("return;".to_string()),
            },
            Stmt::Switch { subject, cases } => {
                let subject = self.render_expr(subject)?;
                let mut out = format!("switch ({}) {{", subject);
                for case in cases {
                    match &case.label {
                        Some(label) => {
                            let label = self.render_expr(label)?;
                            out.push_str(&format!("\ncase {}:", label));
                        }
                        None => out.push_str("\ndefault:"),
                    }
                    for stmt in &case.stmts {
                        let stmt = self.render_stmt(stmt)?.replace('\n', "\n  ");
                        out.push_str(&format!("\n  {}", stmt));
                    }
                }
                out.push_str("\n}");
                Ok(out)
            }
            Stmt::TypeDecl { ty, name } => {
                let ty = self.render_type(ty)?;
                Ok(format!("typedef {} {};", ty, name))
            }
            Stmt::Var(decl) => {
                let ty = self.render_type(&decl.ty)?;
                let mut names = Vec::with_capacity(decl.names.len());
                for (name, init) in &decl.names {
                    match init {
                        Some(init) => {
                            let init = self.render_expr(init)?;
                            names.push(format!("{} = {}", name, init));
                        }
                        None => names.push(name.clone()),
                    }
                }
                Ok(format!("{} {};", ty, names.join(", ")))
            }
            Stmt::While { test, body } => {
                let test = self.render_expr(test)?;
                let body = self.render_stmt(body)?;
                Ok(format!("while ({}){}", test, indent_block(&body)))
            }
        }
    }
}

/// Plain renderer with no overrides; prints the tree as C-like source.
pub struct CRenderer;

impl CodeGen for CRenderer {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(expr: &Expr) -> String {
        CRenderer.render_expr(expr).expect("render failed")
    }

    #[test]
    fn type_display_forms() {
        let t = CType::pointer(CType::Const(Box::new(CType::base("char"))));
        assert_eq!(t.to_string(), "const char*");
        let a = CType::Array {
            elem: Box::new(CType::base("int")),
            dimension: "10".to_string(),
        };
        assert_eq!(a.to_string(), "int[10]");
        let f = CType::Func {
            return_type: Box::new(CType::base("int")),
            params: vec![CType::base("int"), CType::pointer(CType::base("void"))],
        };
        assert_eq!(f.to_string(), "int(int, void*)");
    }

    #[test]
    fn default_expr_rendering() {
        let expr = Expr::BinOp {
            left: Box::new(Expr::name("a")),
            op: "+".to_string(),
            right: Box::new(Expr::Call {
                func: Box::new(Expr::name("f")),
                args: vec![Expr::Const("1".to_string()), Expr::name("b")],
            }),
        };
        assert_eq!(render(&expr), "(a + f(1, b))");
    }

    #[test]
    fn attribute_and_subscript_rendering() {
        let expr = Expr::Attribute {
            value: Box::new(Expr::Subscript {
                value: Box::new(Expr::name("xs")),
                index: Box::new(Expr::Const("0".to_string())),
            }),
            name: "kind".to_string(),
        };
        assert_eq!(render(&expr), "xs[0].kind");
    }

    #[test]
    fn func_name_only_for_plain_names() {
        let call = Expr::Call {
            func: Box::new(Expr::name("f")),
            args: vec![],
        };
        assert_eq!(call.func_name(), Some("f"));
        let method = Expr::Call {
            func: Box::new(Expr::Attribute {
                value: Box::new(Expr::name("x")),
                name: "f".to_string(),
            }),
            args: vec![],
        };
        assert_eq!(method.func_name(), None);
    }

    #[test]
    fn statement_rendering() {
        let stmt = Stmt::If {
            test: Expr::Comparison {
                left: Box::new(Expr::name("x")),
                op: "==".to_string(),
                right: Box::new(Expr::Const("NULL".to_string())),
            },
            body: Box::new(Stmt::Return(Some(Expr::Const("NULL".to_string())))),
            orelse: None,
        };
        assert_eq!(
            CRenderer.render_stmt(&stmt).unwrap(),
            "if ((x == NULL))\n  return NULL;"
        );
    }
}
