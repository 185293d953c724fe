//! # Config Command
//!
//! Prints the effective configuration (file, then environment, then flags)
//! as TOML, optionally writing it back to the config file.

use std::path::PathBuf;

use fieldscan_capture::AppConfig;

use crate::error::CliResult;

pub fn run(config: &AppConfig, config_path: Option<PathBuf>, save: bool) -> CliResult<String> {
    let mut text = toml::to_string_pretty(config)?;

    if save {
        config.save(config_path.clone())?;
        if let Some(path) = config_path.or_else(AppConfig::default_config_path) {
            text.push_str(&format!("\n# saved to {}\n", path.display()));
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prints_toml() {
        let text = run(&AppConfig::default(), None, false).unwrap();
        assert!(text.contains("[scanner]"));
        assert!(text.contains("[enrichment]"));

        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(
            parsed.scanner.max_multi_scan_count,
            AppConfig::default().scanner.max_multi_scan_count
        );
    }

    #[test]
    fn test_save_writes_file() {
        let dir = std::env::temp_dir().join(format!("fieldscan-cli-{}", uuid::Uuid::new_v4()));
        let path = dir.join("fieldscan.toml");

        let mut config = AppConfig::default();
        config.context.store_id = Some("S9".into());
        let text = run(&config, Some(path.clone()), true).unwrap();
        assert!(text.contains("saved to"));

        let loaded = AppConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.context.store_id.as_deref(), Some("S9"));

        let _ = std::fs::remove_dir_all(dir);
    }
}
