//! Command line driver for the C-to-Java generator.
//!
//! Builds the translation state from the reference C sources, optionally
//! generates the AST class hierarchy from a schema file, and translates
//! semantic actions given one per line.

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;

use console::style;
use indicatif::ProgressBar;
use log::{debug, error, info};
use structopt::StructOpt;

use c2java::{ActionTranslator, GeneratorContext, Result, SchemaGenerator, SchemaModule};

#[derive(Debug, StructOpt)]
#[structopt(name = "c2java", about = "Derives Java AST classes and parser actions from a reference C implementation")]
struct Opt {
    /// Directory where the generated Java tree is placed
    #[structopt(parse(from_os_str), default_value = "generated")]
    output_dir: PathBuf,

    /// Directory with the reference C sources
    #[structopt(short = "C", long, parse(from_os_str), default_value = "cfiles")]
    c_files: PathBuf,

    /// Package of the runtime core classes
    #[structopt(short = "c", long, default_value = "org.python.objects")]
    core_package: String,

    /// Package of the generated AST classes
    #[structopt(short = "a", long, default_value = "org.python.ast")]
    ast_package: String,

    /// Package of the generated parser
    #[structopt(short = "p", long, default_value = "org.python.parser")]
    parser_package: String,

    /// Class name of the generated parser
    #[structopt(short = "n", long = "name", default_value = "GeneratedParser")]
    parser_name: String,

    /// Location of the persisted type map [default: OUTPUT_DIR/.c_java_type_cache]
    #[structopt(short = "t", long, parse(from_os_str))]
    type_map: Option<PathBuf>,

    /// JSON file with the AST schema
    #[structopt(short = "s", long, parse(from_os_str))]
    schema: Option<PathBuf>,

    /// File with C actions to translate, one per line
    #[structopt(long, parse(from_os_str))]
    actions: Option<PathBuf>,
}

/// The translatable lines of an actions file; blank lines and `//`
/// comments do not count.
fn collect_actions(text: &str) -> Vec<&str> {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .collect()
}

fn run(opt: Opt) -> Result<()> {
    let type_map = opt
        .type_map
        .unwrap_or_else(|| opt.output_dir.join(".c_java_type_cache"));
    let context = GeneratorContext::new(
        opt.c_files,
        opt.output_dir,
        opt.core_package,
        opt.ast_package,
        opt.parser_package,
        opt.parser_name,
        type_map,
        c2java::NAME,
    );

    println!("{}", style("Reference sources").bold());
    let mut translator = ActionTranslator::new(context.clone())?;
    info!("translation state built from {}", context.c_files.display());

    if let Some(schema) = &opt.schema {
        println!("{}", style("AST classes").bold());
        let text = fs::read_to_string(schema)?;
        let module = SchemaModule::from_json(&text)?;
        let paths =
            SchemaGenerator::new(&context, &mut translator.types).generate(&module)?;
        info!("wrote {} AST files under {}", paths.len(), context.dest_path.display());
    }

    if let Some(actions) = &opt.actions {
        println!("{}", style("Actions").bold());
        let text = fs::read_to_string(actions)?;
        let lines = collect_actions(&text);
        let bar = ProgressBar::new(lines.len() as u64);
        for line in lines {
            let (translated, names) = translator.translate_action(line)?;
            debug!("free names in '{}': {:?}", line, names);
            bar.println(format!("{} -> {}", line, translated));
            bar.inc(1);
        }
        bar.finish_and_clear();
    }

    let unknown = translator.types.unknown_types();
    if !unknown.is_empty() {
        println!(
            "{} {}",
            style("Types without a mapping:").yellow(),
            unknown.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }
    translator.flush()?;
    Ok(())
}

fn main() {
    // Initialize logging with reasonable defaults
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    info!("c2java v{}", c2java::VERSION);

    let opt = Opt::from_args();
    if let Err(e) = run(opt) {
        error!("Generation error: {}", e);
        if let Some(source) = e.source() {
            error!("Caused by: {}", source);
        }
        process::exit(1);
    }
}
