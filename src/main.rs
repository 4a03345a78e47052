#![forbid(unsafe_code)]

use clap::Parser;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "folio", version)]
struct Cli {
    #[arg(short = 'c', long = "config", value_name = "PATH", default_value = "book.yml")]
    config: PathBuf,

    #[arg(short = 'd', long = "book-dir", value_name = "DIR")]
    book_dir: Option<PathBuf>,

    #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
    out_dir: Option<PathBuf>,

    #[arg(long = "html-only")]
    html_only: bool,

    #[arg(long = "validate")]
    validate: bool,

    #[arg(long = "schema", value_name = "PATH")]
    schema: Option<PathBuf>,
}

// Relative source/output directories resolve against the config file's
// directory, so a book builds the same from any working directory.
fn resolve_dir(base: &Path, configured: &str, override_dir: Option<PathBuf>) -> PathBuf {
    match override_dir {
        Some(dir) => dir,
        None => base.join(configured),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let yaml = fs::read_to_string(&cli.config)?;

    if cli.validate {
        match &cli.schema {
            Some(path) => folio::validate_config_with_schema(&yaml, path)?,
            None => folio::validate_config_with_schema_str(&yaml, folio::BUILTIN_SCHEMA)?,
        }
    }

    let config = folio::parse_config(&yaml)?;
    let base_dir = cli.config.parent().map(Path::to_path_buf).unwrap_or_default();
    let source_dir = resolve_dir(&base_dir, &config.source_dir, cli.book_dir);
    let out_dir = resolve_dir(&base_dir, &config.output_dir, cli.out_dir);

    let html = folio::build_document(&config, &source_dir)?;

    fs::create_dir_all(&out_dir)?;
    let html_path = out_dir.join(&config.html_file);
    fs::write(&html_path, &html)?;
    println!("wrote {}", html_path.display());

    if !cli.html_only {
        let pdf = folio::render_pdf(&html)?;
        let pdf_path = out_dir.join(&config.pdf_file);
        fs::write(&pdf_path, pdf)?;
        println!("wrote {}", pdf_path.display());
    }

    Ok(())
}
