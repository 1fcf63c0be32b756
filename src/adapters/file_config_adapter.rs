//! INI file configuration adapter.

use crate::domain::error::PortwatchError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PortwatchError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| PortwatchError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[data]
dir = ./prices
tickers = AAPL, MSFT

[metrics]
risk_free_rate = 0.02
annualization_factor = 252

[alerts]
portfolio_floor_value = 90000
"#;

    #[test]
    fn reads_strings_and_numbers() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("data", "dir"), Some("./prices".into()));
        assert_eq!(
            adapter.get_string("data", "tickers"),
            Some("AAPL, MSFT".into())
        );
        assert_eq!(adapter.get_double("metrics", "risk_free_rate", 0.0), 0.02);
        assert_eq!(adapter.get_int("metrics", "annualization_factor", 0), 252);
    }

    #[test]
    fn missing_keys_fall_back() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("nosection", "dir"), None);
        assert_eq!(adapter.get_int("metrics", "missing", 7), 7);
        assert_eq!(adapter.get_double("metrics", "missing", 1.5), 1.5);
    }

    #[test]
    fn non_numeric_falls_back_to_default() {
        let adapter =
            FileConfigAdapter::from_string("[metrics]\nannualization_factor = daily\n").unwrap();
        assert_eq!(adapter.get_int("metrics", "annualization_factor", 252), 252);
        assert_eq!(adapter.get_double("metrics", "annualization_factor", 1.0), 1.0);
    }

    #[test]
    fn optional_double_distinguishes_unset() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_optional_double("alerts", "portfolio_floor_value"),
            Some(90000.0)
        );
        assert_eq!(
            adapter.get_optional_double("alerts", "portfolio_drop_threshold"),
            None
        );
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[report]\noutput = out/report.typ\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("report", "output"),
            Some("out/report.typ".into())
        );
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/portwatch.ini");
        assert!(matches!(result, Err(PortwatchError::ConfigParse { .. })));
    }
}
