//! The `folio` binary.

use clap::Parser;
use folio_cli::{CliArgs, FolioCli};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let result = match FolioCli::from_args(&args) {
        Ok(cli) => cli.run(args).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
