//! Generates AST node classes from an interface schema.
//!
//! The schema is a sum-of-products tree parsed elsewhere; it arrives here
//! as a serde data model (JSON on the command line). A simple sum, one
//! whose variants carry no fields, becomes a pseudo enum of singletons;
//! any other sum becomes a base class holding the shared attributes with
//! one subclass per constructor, plus a visitor interface covering the
//! subclasses. Products become plain classes. Every generated name is
//! registered with the type translator so the action translator sees the
//! same mapping.

use std::path::PathBuf;

use log::{debug, info};
use serde::Deserialize;

use crate::context::GeneratorContext;
use crate::errors::{GenError, Result, SourceLocation};
use crate::java_model::{to_java_name_with, Class, Field, VisitorInterface};
use crate::java_writer::JavaWriter;
use crate::type_translator::TypeTranslator;

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaModule {
    pub name: String,
    pub defs: Vec<SchemaDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDef {
    pub name: String,
    #[serde(flatten)]
    pub value: SchemaType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum SchemaType {
    Sum {
        #[serde(default)]
        constructors: Vec<SchemaConstructor>,
        #[serde(default)]
        attributes: Vec<SchemaField>,
    },
    Product {
        #[serde(default)]
        fields: Vec<SchemaField>,
        #[serde(default)]
        attributes: Vec<SchemaField>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConstructor {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub seq: bool,
    #[serde(default)]
    pub opt: bool,
}

impl SchemaModule {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| {
            GenError::parse(format!("invalid schema: {}", e), SourceLocation::unknown())
        })
    }
}

/// A sum is simple when no variant has fields and the sum itself has no
/// attributes; its values act like singletons.
fn is_simple(constructors: &[SchemaConstructor], attributes: &[SchemaField]) -> bool {
    attributes.is_empty() && constructors.iter().all(|c| c.fields.is_empty())
}

/// Turns schema definitions into Java classes and visitor interfaces.
pub struct SchemaGenerator<'c, 't> {
    context: &'c GeneratorContext,
    types: &'t mut TypeTranslator,
    base_type: String,
    classes: Vec<Class>,
    visitors: Vec<VisitorInterface>,
}

impl<'c, 't> SchemaGenerator<'c, 't> {
    pub fn new(context: &'c GeneratorContext, types: &'t mut TypeTranslator) -> Self {
        Self {
            context,
            types,
            base_type: "AST".to_string(),
            classes: Vec::new(),
            visitors: Vec::new(),
        }
    }

    pub fn with_base_type(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = base_type.into();
        self
    }

    /// Generates classes for every definition and writes them out.
    pub fn generate(&mut self, module: &SchemaModule) -> Result<Vec<PathBuf>> {
        info!("generating AST classes for schema module '{}'", module.name);
        for def in &module.defs {
            self.generate_def(def)?;
        }
        let writer = JavaWriter::new(self.context);
        let mut paths = Vec::with_capacity(self.classes.len() + self.visitors.len());
        for cls in &mut self.classes {
            paths.push(writer.write_ast_class(cls)?);
        }
        for visitor in &mut self.visitors {
            paths.push(writer.write_ast_interface(&mut visitor.iface)?);
        }
        Ok(paths)
    }

    fn generate_def(&mut self, def: &SchemaDef) -> Result<()> {
        match &def.value {
            SchemaType::Sum { constructors, attributes }
                if is_simple(constructors, attributes) =>
            {
                self.simple_sum(&def.name, constructors)
            }
            SchemaType::Sum { constructors, attributes } => {
                self.sum_with_constructors(&def.name, constructors, attributes)
            }
            SchemaType::Product { fields, attributes } => {
                self.product(&def.name, fields, attributes)
            }
        }
    }

    fn simple_sum(&mut self, raw_name: &str, constructors: &[SchemaConstructor]) -> Result<()> {
        let name = to_java_name_with(raw_name, None, Some(true), None);
        let mut cls = Class::pseudo_enum(&name)?;
        cls.modifiers.insert("public".to_string());
        for cons in constructors {
            cls.add_value(&cons.name, vec![]);
        }
        self.types.add_type(raw_name, name.clone());
        self.types.add_type(format!("{}_ty", raw_name), name.clone());
        debug!("simple sum {} -> pseudo enum {}", raw_name, name);
        self.classes.push(cls);
        Ok(())
    }

    /// A sum with fields becomes a base class carrying the shared
    /// attributes (optional, with type defaults), one subclass per
    /// constructor, and one visitor interface over the subclasses.
    fn sum_with_constructors(
        &mut self,
        raw_name: &str,
        constructors: &[SchemaConstructor],
        attributes: &[SchemaField],
    ) -> Result<()> {
        let name = format!("AST{}", to_java_name_with(raw_name, None, Some(true), None));
        self.types.add_type(raw_name, name.clone());
        self.types.add_type(format!("{}_ty", raw_name), name.clone());

        let mut base = Class::new(&name);
        base.modifiers.insert("public".to_string());
        base.set_base_name(self.base_type.clone());
        for attr in attributes {
            let field = self.java_field(attr).optional();
            base.add_field(field)?;
        }

        let mut visitor = VisitorInterface::new(format!("{}Visitor", name));
        visitor.iface.modifiers.insert("public".to_string());

        let mut subclasses = Vec::with_capacity(constructors.len());
        for cons in constructors {
            let mut sub = Class::new(&cons.name);
            sub.modifiers.insert("public".to_string());
            sub.set_base(&base);
            self.types.add_type(&cons.name, cons.name.clone());
            self.types.add_type(format!("{}_ty", cons.name), cons.name.clone());
            for field in &cons.fields {
                let field = self.java_field(field);
                sub.add_field(field)?;
            }
            visitor.add_visit_method(&mut sub);
            subclasses.push(sub);
        }
        debug!("sum {} -> {} with {} constructors", raw_name, name, subclasses.len());
        self.classes.push(base);
        self.classes.extend(subclasses);
        self.visitors.push(visitor);
        Ok(())
    }

    fn product(
        &mut self,
        raw_name: &str,
        fields: &[SchemaField],
        attributes: &[SchemaField],
    ) -> Result<()> {
        let name = to_java_name_with(raw_name, None, Some(true), None);
        let mut cls = Class::new(&name);
        cls.modifiers.insert("public".to_string());
        cls.set_base_name(self.base_type.clone());
        for field in fields {
            let field = self.java_field(field);
            cls.add_field(field)?;
        }
        for attr in attributes {
            let field = self.java_field(attr);
            cls.add_field(field)?;
        }
        self.types.add_type(raw_name, name.clone());
        self.types.add_type(format!("{}_ty", raw_name), name.clone());
        self.classes.push(cls);
        Ok(())
    }

    fn java_field(&mut self, field: &SchemaField) -> Field {
        // Flags are C ints; the Java side wants real booleans.
        let j_type = if field.ty == "int" && field.name.starts_with("is_") {
            "boolean".to_string()
        } else {
            self.types.translate_seq(&field.ty, field.seq)
        };
        let f = Field::new(&field.name, j_type);
        if field.opt {
            f.optional()
        } else {
            f
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_context(tag: &str) -> GeneratorContext {
        let mut ctx = GeneratorContext::default();
        ctx.dest_path =
            std::env::temp_dir().join(format!("schematest-{}-{}", tag, std::process::id()));
        ctx
    }

    const SCHEMA: &str = r#"{
        "name": "Python",
        "defs": [
            {
                "name": "unaryop",
                "kind": "sum",
                "constructors": [
                    {"name": "Invert"}, {"name": "Not"},
                    {"name": "UAdd"}, {"name": "USub"}
                ]
            },
            {
                "name": "expr",
                "kind": "sum",
                "constructors": [
                    {
                        "name": "BinOp",
                        "fields": [
                            {"name": "left", "type": "expr"},
                            {"name": "right", "type": "expr"}
                        ]
                    },
                    {
                        "name": "Compare",
                        "fields": [
                            {"name": "ops", "type": "cmpop", "seq": true},
                            {"name": "is_strict", "type": "int"}
                        ]
                    }
                ],
                "attributes": [
                    {"name": "lineno", "type": "int"},
                    {"name": "col_offset", "type": "int"}
                ]
            },
            {
                "name": "arguments",
                "kind": "product",
                "fields": [
                    {"name": "args", "type": "arg", "seq": true},
                    {"name": "defaults", "type": "expr", "seq": true, "opt": true}
                ]
            }
        ]
    }"#;

    #[test]
    fn schema_round_trips_through_serde() {
        let module = SchemaModule::from_json(SCHEMA).unwrap();
        assert_eq!(module.name, "Python");
        assert_eq!(module.defs.len(), 3);
        match &module.defs[0].value {
            SchemaType::Sum { constructors, attributes } => {
                assert_eq!(constructors.len(), 4);
                assert!(is_simple(constructors, attributes));
            }
            _ => panic!("expected a sum"),
        }
        match &module.defs[1].value {
            SchemaType::Sum { constructors, attributes } => {
                assert!(!is_simple(constructors, attributes));
            }
            _ => panic!("expected a sum"),
        }
    }

    #[test]
    fn malformed_schema_is_a_parse_error() {
        let err = SchemaModule::from_json("{\"name\": 1}").unwrap_err();
        assert!(err.to_string().contains("invalid schema"));
    }

    #[test]
    fn simple_sum_becomes_pseudo_enum() {
        let ctx = test_context("enum");
        let mut types = TypeTranslator::new();
        let module = SchemaModule::from_json(SCHEMA).unwrap();
        let mut gen = SchemaGenerator::new(&ctx, &mut types);
        gen.generate(&module).unwrap();

        let text =
            std::fs::read_to_string(ctx.ast_source_path("Unaryop").unwrap()).unwrap();
        assert!(text.contains("public class Unaryop {"));
        assert!(text.contains("public static final Unaryop Invert = new Unaryop(\"Invert\");"));
        assert!(text.contains("public Unaryop valueOf(String s) {"));
        assert_eq!(types.translate("unaryop"), "Unaryop");
        std::fs::remove_dir_all(&ctx.dest_path).unwrap();
    }

    #[test]
    fn sum_with_constructors_builds_base_subclasses_and_visitor() {
        let ctx = test_context("sum");
        let mut types = TypeTranslator::new();
        let module = SchemaModule::from_json(SCHEMA).unwrap();
        SchemaGenerator::new(&ctx, &mut types).generate(&module).unwrap();

        let base = std::fs::read_to_string(ctx.ast_source_path("ASTExpr").unwrap()).unwrap();
        assert!(base.contains("public class ASTExpr extends AST {"));
        // Attributes are optional fields with type defaults.
        assert!(base.contains("private int lineno = 0;"));
        assert!(base.contains("public ASTExpr() {"));

        let sub = std::fs::read_to_string(ctx.ast_source_path("BinOp").unwrap()).unwrap();
        assert!(sub.contains("public class BinOp extends ASTExpr {"));
        // Subclass constructor takes own fields then the inherited ones.
        assert!(sub.contains("public BinOp(ASTExpr left, ASTExpr right, int lineno, int col_offset) {"));
        assert!(sub.contains("super(lineno, col_offset);"));
        assert!(sub.contains("public void accept(ASTExprVisitor visitor) {"));

        let visitor =
            std::fs::read_to_string(ctx.ast_source_path("ASTExprVisitor").unwrap()).unwrap();
        assert!(visitor.contains("public interface ASTExprVisitor {"));
        assert!(visitor.contains("void visit(BinOp node);"));
        assert!(visitor.contains("void visit(Compare node);"));

        // Registered names feed the action translator.
        assert_eq!(types.translate("expr_ty"), "ASTExpr");
        assert_eq!(types.translate("asdl_expr_seq*"), "ASTExpr[]");
        std::fs::remove_dir_all(&ctx.dest_path).unwrap();
    }

    #[test]
    fn int_flag_fields_become_booleans() {
        let ctx = test_context("flags");
        let mut types = TypeTranslator::new();
        let module = SchemaModule::from_json(SCHEMA).unwrap();
        SchemaGenerator::new(&ctx, &mut types).generate(&module).unwrap();

        let sub = std::fs::read_to_string(ctx.ast_source_path("Compare").unwrap()).unwrap();
        assert!(sub.contains("boolean is_strict"));
        assert!(sub.contains("Cmpop[] ops"));
        std::fs::remove_dir_all(&ctx.dest_path).unwrap();
    }

    #[test]
    fn product_becomes_plain_class() {
        let ctx = test_context("product");
        let mut types = TypeTranslator::new();
        let module = SchemaModule::from_json(SCHEMA).unwrap();
        SchemaGenerator::new(&ctx, &mut types).generate(&module).unwrap();

        let text =
            std::fs::read_to_string(ctx.ast_source_path("Arguments").unwrap()).unwrap();
        assert!(text.contains("public class Arguments extends AST {"));
        // The optional trailing field yields a second constructor.
        assert!(text.contains("public Arguments(Arg[] args, ASTExpr[] defaults) {"));
        assert!(text.contains("public Arguments(Arg[] args) {"));
        std::fs::remove_dir_all(&ctx.dest_path).unwrap();
    }
}
