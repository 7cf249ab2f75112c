use crate::settings::BufferSettings;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "transcript-sidecar",
    about = "PingLearn transcript display buffer over stdin/stdout JSON"
)]
pub struct CliArgs {
    /// JSON settings file (max_capacity, dedup_window_ms)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the maximum number of items kept per session
    #[arg(long)]
    pub max_capacity: Option<usize>,

    /// Override the duplicate suppression window in milliseconds
    #[arg(long)]
    pub dedup_window_ms: Option<u64>,

    /// Enable debug mode with verbose logging
    #[arg(long)]
    pub debug: bool,
}

impl CliArgs {
    /// Settings from the config file (or defaults) with flag overrides applied.
    pub fn resolve_settings(&self) -> Result<BufferSettings> {
        let mut settings = match &self.config {
            Some(path) => BufferSettings::load(path)?,
            None => BufferSettings::default(),
        };

        if let Some(max_capacity) = self.max_capacity {
            settings.max_capacity = max_capacity;
        }
        if let Some(dedup_window_ms) = self.dedup_window_ms {
            settings.dedup_window_ms = dedup_window_ms;
        }

        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_capacity": 50, "dedup_window_ms": 2000 }}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = CliArgs::parse_from([
            "transcript-sidecar",
            "--config",
            path.as_str(),
            "--dedup-window-ms",
            "300",
        ]);
        let settings = args.resolve_settings().unwrap();
        assert_eq!(settings.max_capacity, 50);
        assert_eq!(settings.dedup_window_ms, 300);
    }

    #[test]
    fn test_defaults_without_flags() {
        let args = CliArgs::parse_from(["transcript-sidecar"]);
        assert!(!args.debug);
        assert_eq!(args.resolve_settings().unwrap(), BufferSettings::default());
    }

    #[test]
    fn test_zero_capacity_flag_rejected() {
        let args = CliArgs::parse_from(["transcript-sidecar", "--max-capacity", "0"]);
        assert!(args.resolve_settings().is_err());
    }
}
