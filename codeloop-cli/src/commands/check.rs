//! Check command - Clean a Python source and look for a function

use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use codeloop_core::code::{clean_code, function_names, has_function};

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Python file to check, or `-` for stdin
    #[arg(required = true)]
    pub file: PathBuf,

    /// Function that must be defined
    #[arg(long)]
    pub func_name: String,

    /// Print the cleaned source
    #[arg(long)]
    pub print: bool,
}

impl CheckArgs {
    /// Execute the check command
    pub fn execute(&self, verbose: bool) -> anyhow::Result<()> {
        let raw = if self.file.as_os_str() == "-" {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            std::fs::read_to_string(&self.file)?
        };

        let code = clean_code(&raw);
        if verbose {
            tracing::info!(
                file = %self.file.display(),
                raw_len = raw.len(),
                cleaned_len = code.len(),
                "Cleaned source"
            );
        }

        if self.print {
            println!("{}", code);
            println!();
        }

        match function_names(&code) {
            Some(names) if names.is_empty() => println!("Functions: (none)"),
            Some(names) => println!("Functions: {}", names.join(", ")),
            None => println!("Functions: (source does not parse)"),
        }

        if !has_function(&code, &self.func_name) {
            anyhow::bail!("{} is not defined", self.func_name);
        }

        println!("{} is defined", self.func_name);
        Ok(())
    }
}
