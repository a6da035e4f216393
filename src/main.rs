use anyhow::Result;
use chunk_dispatch::cli;
use clap::Parser;
use tracing::error;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    match cli::dispatch(args) {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(err) => {
            error!("{:#}", err);
            eprintln!("error: {:#}", err);
            std::process::exit(1);
        }
    }
}
