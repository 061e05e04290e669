//! `hati`: rewrite annotated handler sources and update the deployment
//! descriptor.

use clap::Parser;
use std::path::PathBuf;
use std::process;

use hati_transpiler::{run, TranspileError, TranspileOptions, DEFAULT_DESCRIPTOR, DEFAULT_OUT_DIR};

#[derive(Parser)]
#[command(name = "hati", version, about = "Annotation-driven transpiler for serverless handlers")]
struct Cli {
    /// Source files or directories to transpile
    #[arg(value_name = "INPUTS", required = true)]
    inputs: Vec<PathBuf>,

    /// Directory the rewritten sources are written to
    #[arg(short, long, env = "HATI_OUT_DIR", default_value = DEFAULT_OUT_DIR)]
    out_dir: PathBuf,

    /// Deployment descriptor to merge the function registry into
    #[arg(short, long, env = "HATI_CONFIG", default_value = DEFAULT_DESCRIPTOR)]
    config: PathBuf,

    /// Write the merged descriptor here instead of printing it
    #[arg(long = "write-config", value_name = "PATH")]
    write_config: Option<PathBuf>,

    /// Transform and merge without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(err) = try_main(cli) {
        match err.downcast_ref::<TranspileError>() {
            Some(TranspileError::Directive(directive)) => eprintln!("{}", directive),
            _ => eprintln!("error: {:#}", err),
        }
        process::exit(1);
    }
}

fn try_main(cli: Cli) -> anyhow::Result<()> {
    let options = TranspileOptions {
        inputs: cli.inputs,
        out_dir: cli.out_dir,
        descriptor: cli.config,
        write_descriptor: cli.write_config,
        dry_run: cli.dry_run,
    };

    let report = run(&options, |diagnostic| println!("{}", diagnostic))?;

    if options.write_descriptor.is_none() || options.dry_run {
        print!("{}", report.descriptor);
    }

    let skipped = report.files.iter().filter(|f| f.output.is_none()).count();
    if skipped > 0 {
        log::warn!("{} file(s) skipped because of syntax errors", skipped);
    }
    Ok(())
}
