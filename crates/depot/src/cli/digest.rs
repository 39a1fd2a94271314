use std::path::PathBuf;

use anyhow::Result;
use depot_verify::digest_file;

#[derive(Debug, clap::Args)]
pub struct DigestArg {
    /// Files to hash.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run(arg: &DigestArg) -> Result<()> {
    for file in &arg.files {
        let digest = digest_file(file)?;
        println!("{}  {}", digest, file.display());
    }
    Ok(())
}
