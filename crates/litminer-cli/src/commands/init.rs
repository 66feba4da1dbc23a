//! Init command implementation.

use crate::cli::InitArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Write a starter configuration file.
pub fn execute_init(args: InitArgs, path: &Path, formatter: &Formatter) -> Result<()> {
    if path.exists() && !args.force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    Config::template().save(path)?;
    println!("{}", formatter.success(&format!("Wrote {}", path.display())));
    println!("{}", formatter.info("Add an api_key under the provider you want to use."));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let formatter = Formatter::new(false);

        execute_init(InitArgs { force: false }, &path, &formatter).unwrap();
        assert!(path.exists());

        let again = execute_init(InitArgs { force: false }, &path, &formatter);
        assert!(matches!(again, Err(CliError::Config(_))));

        execute_init(InitArgs { force: true }, &path, &formatter).unwrap();
        assert!(Config::load(Some(path.as_path())).is_ok());
    }
}
