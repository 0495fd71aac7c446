use token_series::SeriesConfig;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub lmdb_path: String,
    /// Default row count for `series.history`
    pub history_limit: usize,
    pub series: SeriesConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7880,
            lmdb_path: "./data/token-snapshots".to_string(),
            history_limit: 100,
            series: SeriesConfig::default(),
        }
    }
}
