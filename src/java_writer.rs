//! Writes rendered Java declarations to their source files.

use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::context::GeneratorContext;
use crate::errors::Result;
use crate::java_model::{Class, Interface};

/// Places one `.java` file per top-level class or interface under the
/// package directory derived from the destination root.
pub struct JavaWriter<'c> {
    context: &'c GeneratorContext,
}

impl<'c> JavaWriter<'c> {
    pub fn new(context: &'c GeneratorContext) -> Self {
        Self { context }
    }

    /// Writes a class into the given package; sets the package on the
    /// class so the declaration carries the matching `package` line.
    pub fn write_class(&self, cls: &mut Class, package: &str) -> Result<PathBuf> {
        cls.package = Some(package.to_string());
        let path = self
            .context
            .package_dir(package)?
            .join(format!("{}.java", cls.name));
        let mut text = self.context.autogen_comment();
        text.push('\n');
        text.push_str(&cls.declaration()?);
        text.push('\n');
        fs::write(&path, text)?;
        debug!("wrote {}", path.display());
        Ok(path)
    }

    pub fn write_interface(&self, iface: &mut Interface, package: &str) -> Result<PathBuf> {
        iface.package = Some(package.to_string());
        let path = self
            .context
            .package_dir(package)?
            .join(format!("{}.java", iface.name));
        let mut text = self.context.autogen_comment();
        text.push('\n');
        text.push_str(&iface.declaration());
        text.push('\n');
        fs::write(&path, text)?;
        debug!("wrote {}", path.display());
        Ok(path)
    }

    pub fn write_ast_class(&self, cls: &mut Class) -> Result<PathBuf> {
        let package = self.context.ast_package.clone();
        self.write_class(cls, &package)
    }

    pub fn write_ast_interface(&self, iface: &mut Interface) -> Result<PathBuf> {
        let package = self.context.ast_package.clone();
        self.write_interface(iface, &package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java_model::Field;
    use pretty_assertions::assert_eq;

    fn test_context(tag: &str) -> GeneratorContext {
        let mut ctx = GeneratorContext::default();
        ctx.dest_path =
            std::env::temp_dir().join(format!("jwtest-{}-{}", tag, std::process::id()));
        ctx
    }

    #[test]
    fn class_file_lands_in_package_directory() {
        let ctx = test_context("cls");
        let writer = JavaWriter::new(&ctx);
        let mut cls = Class::new("Alias");
        cls.modifiers.insert("public".to_string());
        cls.add_field(Field::new("name", "String")).unwrap();
        let path = writer.write_ast_class(&mut cls).unwrap();
        assert!(path.ends_with("org/python/ast/Alias.java"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("// File automatically generated by"));
        assert!(text.contains("package org.python.ast;"));
        assert!(text.contains("public class Alias {"));
        std::fs::remove_dir_all(&ctx.dest_path).unwrap();
    }

    #[test]
    fn interface_file_round_trip() {
        let ctx = test_context("iface");
        let writer = JavaWriter::new(&ctx);
        let mut iface = Interface::new("ExprVisitor");
        iface.modifiers.insert("public".to_string());
        let path = writer.write_ast_interface(&mut iface).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(iface.package.as_deref(), Some("org.python.ast"));
        assert!(text.contains("public interface ExprVisitor {"));
        std::fs::remove_dir_all(&ctx.dest_path).unwrap();
    }
}
