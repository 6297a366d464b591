//! Show or write configuration command.

use std::path::Path;

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{ConfigOutput, OutputFormat, Render};

/// Execute the config command.
pub fn config(config: CliConfig, path: &Path, write: bool, format: OutputFormat) -> CliResult<String> {
    if write {
        config.save(path)?;
    }
    let output = ConfigOutput {
        path: path.display().to_string(),
        written: write,
        config,
    };
    Ok(output.render(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        config(CliConfig::default(), &path, true, OutputFormat::Human).unwrap();
        assert_eq!(CliConfig::load(&path).unwrap(), CliConfig::default());
    }

    #[test]
    fn test_show_does_not_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        config(CliConfig::default(), &path, false, OutputFormat::Json).unwrap();
        assert!(!path.exists());
    }
}
