//! Init-config command - write a default configuration file.

use std::path::PathBuf;

use rigcache::ConfigFile;

use crate::error::CliError;

/// Run the init-config command.
///
/// An existing file at the target is left as it is.
pub fn run(path: Option<PathBuf>) -> Result<(), CliError> {
    let path = path.unwrap_or_else(rigcache::config::config_file_path);

    if path.exists() {
        println!("Configuration file already exists: {}", path.display());
        return Ok(());
    }

    ConfigFile::default().save_to(&path)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Set overlays.packs_dir to the folder holding your resource packs.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_loadable_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        run(Some(path.clone())).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, ConfigFile::default());
    }

    #[test]
    fn test_existing_file_is_kept() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[logging]\nlevel = warn\n").unwrap();

        run(Some(path.clone())).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded.logging.level, "warn");
    }
}
