use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

#[derive(Parser)]
#[command(name = "vellum")]
#[command(about = "Translates CloudFormation templates into typed Go source", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a CloudFormation template and emit typed Go source files
    Import {
        /// Path to the template (JSON or YAML)
        template_path: PathBuf,

        /// Directory to write the generated files into
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Override the inferred Go package name
        #[arg(long)]
        package: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Import {
            template_path,
            out,
            package,
        } => run_import(&template_path, &out, package.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_import(template_path: &Path, out: &Path, package: Option<&str>) -> Result<(), String> {
    let bytes = fs::read(template_path)
        .map_err(|e| format!("failed to read {}: {}", template_path.display(), e))?;

    let source_name = template_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| template_path.display().to_string());

    let template = vellum_core::parser::parse(&bytes, &source_name).map_err(|e| e.to_string())?;

    let package_name = package
        .map(str::to_string)
        .unwrap_or_else(|| vellum_core::codegen::naming::package_name(&source_name));

    let (files, diagnostics) = vellum_core::codegen::generate_code(&template, &package_name);

    for (relative_path, source) in &files {
        let target = out.join(relative_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create {}: {}", parent.display(), e))?;
        }
        fs::write(&target, source)
            .map_err(|e| format!("failed to write {}: {}", target.display(), e))?;
        println!("  {} {}", "wrote".green(), target.display());
    }

    if !diagnostics.is_empty() {
        eprintln!();
        for diag in &diagnostics {
            eprintln!("  {} {}", "warning:".yellow().bold(), diag);
        }
    }

    println!(
        "\n{}",
        format!("Generated {} file(s) in {}.", files.len(), out.display())
            .green()
            .bold()
    );

    Ok(())
}
