//! `yarn-deps` — print each distinct `name@version` resolved in a yarn lockfile.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use dash_licenses_wrapper::lockfile::{read_yarn_lock, unique_identifiers};

#[derive(Parser, Debug)]
#[command(
    name = "yarn-deps",
    about = "List the distinct name@version identifiers resolved in a yarn lockfile",
    version
)]
struct Cli {
    /// Lockfile to read
    #[arg(default_value = "yarn.lock")]
    lockfile: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let packages = read_yarn_lock(&cli.lockfile)?;
    for id in unique_identifiers(&packages) {
        println!("{}", id);
    }

    Ok(())
}
