use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tomltree")]
#[command(about = "Print a TOML file as a tree, or re-serialized")]
struct Args {
    /// Path to the `.toml` file
    file: PathBuf,

    /// Print the document as TOML instead of a tree
    #[arg(long)]
    toml: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match tomlctx::load(&args.file) {
        Ok(parsed) if args.toml => {
            print!("{}", parsed.to_toml());
            ExitCode::SUCCESS
        }
        Ok(parsed) => {
            println!("{parsed}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}: {err}", args.file.display());
            ExitCode::FAILURE
        }
    }
}
