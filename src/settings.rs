use config::Config;
use serde::Deserialize;

/// Process-wide settings, overridable from the environment with an `IFI_`
/// prefix (e.g. `IFI_DATA_DIR=/tmp/ifi`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        let cfg = Config::builder()
            .set_default("data_dir", "./data")?
            .set_default("timeout_secs", 30)?
            .set_default("user_agent", "ifi-scraper/0.1 (research data collection)")?
            .add_source(config::Environment::with_prefix("IFI"))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}
