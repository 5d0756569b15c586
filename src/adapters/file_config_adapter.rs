//! INI file configuration adapter.

use crate::domain::error::VolgateError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, VolgateError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| VolgateError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, VolgateError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| VolgateError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    /// Blank values count as absent.
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::config_port::parse_value;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_CONFIG: &str = r#"
[backtest]
start_date = 2012-01-03
end_date = 2024-06-28
vol_symbol = ^VIX
asset_symbol = UPRO
vol_threshold = 17.5
ma_window = 10
trade_cost_rate = 0.0005
resample = weekly

[data]
source = sqlite

[sqlite]
path = /var/lib/volgate/prices.db
pool_size = 2

[report]
typst_output = out/report.typ
tail_rows = 5
"#;

    #[test]
    fn from_string_reads_all_sections() {
        let adapter = FileConfigAdapter::from_string(FULL_CONFIG).unwrap();

        assert_eq!(
            adapter.get_string("backtest", "vol_symbol"),
            Some("^VIX".to_string())
        );
        assert_eq!(
            adapter.get_string("backtest", "resample"),
            Some("weekly".to_string())
        );
        assert_eq!(
            parse_value(&adapter, "backtest", "vol_threshold", 15.0).unwrap(),
            17.5
        );
        assert_eq!(parse_value(&adapter, "backtest", "ma_window", 5usize).unwrap(), 10);
        assert_eq!(
            parse_value(&adapter, "backtest", "trade_cost_rate", 0.0).unwrap(),
            0.0005
        );
        assert_eq!(
            adapter.get_string("data", "source"),
            Some("sqlite".to_string())
        );
        assert_eq!(parse_value(&adapter, "sqlite", "pool_size", 4u32).unwrap(), 2);
        assert_eq!(parse_value(&adapter, "report", "tail_rows", 10usize).unwrap(), 5);
    }

    #[test]
    fn get_string_missing_or_blank_is_none() {
        let adapter =
            FileConfigAdapter::from_string("[report]\ncsv_output =\n").unwrap();
        assert_eq!(adapter.get_string("report", "csv_output"), None);
        assert_eq!(adapter.get_string("report", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn parse_value_defaults_only_when_absent() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nma_window = abc\nvol_threshold = x\n")
                .unwrap();
        assert_eq!(parse_value(&adapter, "backtest", "missing", 42i64).unwrap(), 42);
        match parse_value(&adapter, "backtest", "ma_window", 5usize) {
            Err(VolgateError::ConfigInvalid { section, key, .. }) => {
                assert_eq!(section, "backtest");
                assert_eq!(key, "ma_window");
            }
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
        assert!(parse_value(&adapter, "backtest", "vol_threshold", 15.0).is_err());
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[csv]\ndir = /srv/prices\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("csv", "dir"),
            Some("/srv/prices".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/volgate.ini");
        match result {
            Err(VolgateError::ConfigParse { file, .. }) => {
                assert!(file.ends_with("volgate.ini"));
            }
            _ => panic!("expected ConfigParse error"),
        }
    }
}
