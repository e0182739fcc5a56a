use config::Config;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct ClientConfig {
    pub connect_timeout_ms: u64,
    /// Total deadline for one exchange callout, body included
    pub timeout_ms: u64,
    pub max_idle_per_host: usize,
    /// Accept gzip/deflate encoded responses
    pub gzip: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 1_000,
            timeout_ms: 1_000,
            max_idle_per_host: 128,
            gzip: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Builder)]
pub struct AdapterConfig {
    /// The exchange endpoint every outbound request is posted to
    pub endpoint: String,
    #[serde(default)]
    #[builder(default)]
    pub client: ClientConfig,
    #[serde(default)]
    #[builder(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRotation {
    Daily,
    Hourly,
    Never,
}

impl Default for FileRotation {
    fn default() -> Self {
        FileRotation::Daily
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSink {
    #[serde(flatten)]
    pub dest: LogType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogType {
    Stdout {
        #[serde(default = "default_true")]
        color: bool,
        #[serde(default)]
        json: bool,
        #[serde(default)]
        spans: bool,
    },
    File {
        path: PathBuf,
        #[serde(default)]
        json: bool,
        #[serde(default)]
        rotation: FileRotation,
        #[serde(default)]
        max_files: usize,
        #[serde(default)]
        spans: bool,
    },
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Fraction of callout batches traced with a root span
    #[serde(default = "default_sample_rate")]
    pub span_sample_rate: f32,
    #[serde(default)]
    pub sinks: Vec<LogSink>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_sample_rate() -> f32 {
    0.01
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            span_sample_rate: default_sample_rate(),
            sinks: vec![LogSink {
                dest: LogType::Stdout {
                    color: true,
                    json: false,
                    spans: false,
                },
            }],
        }
    }
}

impl LoggingConfig {
    /// Validates the logging configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.sinks.is_empty() {
            anyhow::bail!("At least one logging sink must be configured");
        }

        self.level.parse::<tracing::Level>().map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: trace, debug, info, warn, error",
                self.level
            )
        })?;

        if !(0.0..=1.0).contains(&self.span_sample_rate) {
            anyhow::bail!(
                "span_sample_rate must be between 0.0 and 1.0, got {}",
                self.span_sample_rate
            );
        }

        Ok(())
    }
}

impl AdapterConfig {
    pub fn load(path: &PathBuf) -> Result<AdapterConfig, anyhow::Error> {
        let cfg = Config::builder()
            .add_source(config::File::from(path.to_path_buf()))
            .build()?;

        let adapter_config: AdapterConfig = cfg.try_deserialize()?;
        adapter_config.validate()?;

        Ok(adapter_config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        Url::parse(&self.endpoint)
            .map_err(|e| anyhow::anyhow!("Invalid endpoint '{}': {}", self.endpoint, e))?;

        if self.client.timeout_ms == 0 {
            anyhow::bail!("client.timeout_ms must be greater than zero");
        }

        self.logging.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "{}-{}-{}.yaml",
            env!("CARGO_PKG_NAME"),
            name,
            std::process::id()
        ));

        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();

        path
    }

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let path = write_config("minimal", "endpoint: https://apex.go.sonobi.com/prebid\n");

        let cfg = AdapterConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(cfg.endpoint, "https://apex.go.sonobi.com/prebid");
        assert_eq!(cfg.client.timeout_ms, 1_000);
        assert!(cfg.client.gzip);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.span_sample_rate, 0.01);
        assert_eq!(cfg.logging.sinks.len(), 1);
    }

    #[test]
    fn test_logging_section_without_sample_rate_uses_default() {
        let path = write_config(
            "no-sample-rate",
            r#"
endpoint: https://apex.go.sonobi.com/prebid
logging:
  level: warn
  sinks:
    - type: stdout
"#,
        );

        let cfg = AdapterConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(cfg.logging.level, "warn");
        assert_eq!(cfg.logging.span_sample_rate, 0.01);
        assert_eq!(
            cfg.logging.span_sample_rate,
            LoggingConfig::default().span_sample_rate
        );
    }

    #[test]
    fn test_load_full_config() {
        let path = write_config(
            "full",
            r#"
endpoint: https://apex.go.sonobi.com/prebid?partnerid=abc
client:
  connect_timeout_ms: 200
  timeout_ms: 350
  gzip: false
logging:
  level: debug
  span_sample_rate: 0.5
  sinks:
    - type: stdout
      json: true
    - type: file
      path: logs/adapter.log
      rotation: hourly
      max_files: 4
"#,
        );

        let cfg = AdapterConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(cfg.client.connect_timeout_ms, 200);
        assert_eq!(cfg.client.timeout_ms, 350);
        assert_eq!(cfg.client.max_idle_per_host, 128);
        assert!(!cfg.client.gzip);
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.sinks.len(), 2);
        assert!(matches!(
            cfg.logging.sinks[0].dest,
            LogType::Stdout { json: true, color: true, .. }
        ));
        assert!(matches!(
            cfg.logging.sinks[1].dest,
            LogType::File { rotation: FileRotation::Hourly, max_files: 4, .. }
        ));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let path = write_config("bad-endpoint", "endpoint: not a url\n");

        let result = AdapterConfig::load(&path);
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }

    #[test]
    fn test_logging_validation() {
        let mut logging = LoggingConfig::default();
        assert!(logging.validate().is_ok());

        logging.level = "loud".to_string();
        assert!(logging.validate().is_err());

        logging.level = "warn".to_string();
        logging.span_sample_rate = 1.5;
        assert!(logging.validate().is_err());

        logging.span_sample_rate = 0.0;
        logging.sinks.clear();
        assert!(logging.validate().is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let cfg = AdapterConfigBuilder::default()
            .endpoint("http://localhost:8080/prebid".to_string())
            .build()
            .unwrap();

        assert!(cfg.validate().is_ok());
    }
}
