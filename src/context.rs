//! Shared configuration for a code generation run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::Result;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun",
    "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Gregorian date for a day count since 1970-01-01.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z % 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);
    (year, month, day)
}

/// UTC timestamp in the `01 Jan 1970 00:00` form of the generated-file
/// header.
fn format_timestamp(secs: u64) -> String {
    let (year, month, day) = civil_from_days(secs / 86_400);
    let rem = secs % 86_400;
    format!(
        "{:02} {} {} {:02}:{:02}",
        day,
        MONTHS[(month - 1) as usize],
        year,
        rem / 3_600,
        (rem % 3_600) / 60
    )
}

/// Holds the root paths for the reference C sources and the generated Java
/// files, plus the package names needed to create those files. One instance
/// is threaded through all generators of a run.
#[derive(Debug, Clone)]
pub struct GeneratorContext {
    /// Directory with the reference C sources (.c and .h).
    pub c_files: PathBuf,
    /// Root of the generated code tree; files land at `dest_path/package`.
    pub dest_path: PathBuf,
    /// Package of the runtime core classes.
    pub core_package: String,
    /// Package of the generated AST classes.
    pub ast_package: String,
    /// Package of the generated parser.
    pub parser_package: String,
    /// Class name of the generated parser.
    pub parser_name: String,
    /// Location of the persisted C-to-Java type map.
    pub type_map: PathBuf,
    generator: String,
}

impl GeneratorContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        c_files: impl Into<PathBuf>,
        dest_path: impl Into<PathBuf>,
        core_package: impl Into<String>,
        ast_package: impl Into<String>,
        parser_package: impl Into<String>,
        parser_name: impl Into<String>,
        type_map: impl Into<PathBuf>,
        generator: impl Into<String>,
    ) -> Self {
        Self {
            c_files: c_files.into(),
            dest_path: dest_path.into(),
            core_package: core_package.into(),
            ast_package: ast_package.into(),
            parser_package: parser_package.into(),
            parser_name: parser_name.into(),
            type_map: type_map.into(),
            generator: generator.into(),
        }
    }

    /// The comment placed at the top of every generated file, naming the
    /// tool and the generation time.
    pub fn autogen_comment(&self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        format!(
            "// File automatically generated by '{}' on {}.\n",
            self.generator,
            format_timestamp(now)
        )
    }

    /// The directory for a dotted package name, created on demand.
    pub fn package_dir(&self, package: &str) -> Result<PathBuf> {
        let mut dir = self.dest_path.clone();
        for part in package.split('.') {
            dir.push(part);
        }
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// The path of an AST source file with the given class name.
    pub fn ast_source_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.package_dir(&self.ast_package)?.join(format!("{}.java", name)))
    }

    /// The path of the generated parser source file.
    pub fn parser_source_path(&self) -> Result<PathBuf> {
        let dir = self.package_dir(&self.parser_package)?;
        Ok(dir.join(format!("{}.java", self.parser_name)))
    }

    pub fn reference_file(&self, name: &str) -> PathBuf {
        self.c_files.join(name)
    }

    pub fn generator_name(&self) -> &str {
        &self.generator
    }
}

impl Default for GeneratorContext {
    fn default() -> Self {
        Self::new(
            Path::new("cfiles"),
            Path::new("generated"),
            "org.python.objects",
            "org.python.ast",
            "org.python.parser",
            "GeneratedParser",
            Path::new("generated/.c_java_type_cache"),
            env!("CARGO_PKG_NAME"),
        )
    }
}
