use crate::{
    error::Error,
    types::NotificationTarget,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dispatch: Dispatch,
    #[serde(default)]
    pub store: Store,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub analysis: Analysis,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.dispatch.max_chunk_size < 1 {
            return Err(Error::invalid_argument(format!(
                "dispatch.max_chunk_size must be at least 1, got {}",
                self.dispatch.max_chunk_size
            )));
        }
        if self.dispatch.queue_target.trim().is_empty() {
            return Err(Error::invalid_argument("dispatch.queue_target is empty"));
        }
        if self.dispatch.notification_target.topic.trim().is_empty() {
            return Err(Error::invalid_argument(
                "dispatch.notification_target.topic is empty",
            ));
        }
        Ok(())
    }
}

/// Options the orchestrator is constructed with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispatch {
    pub max_chunk_size: u32,
    pub queue_target: String,
    #[serde(default)]
    pub notification_target: NotificationTarget,
}
impl Default for Dispatch {
    fn default() -> Self {
        Self {
            max_chunk_size: 100,
            queue_target: "out/dispatch-queue.jsonl".into(),
            notification_target: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub root: String,
}
impl Default for Store {
    fn default() -> Self {
        Self {
            root: "documents".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    pub work_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            work_dir: ".chunk-dispatch-work".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub timeout_seconds: u64,
    pub feature_types: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}
impl Default for Analysis {
    fn default() -> Self {
        Self {
            program: "".into(),
            args: Vec::new(),
            timeout_seconds: 60,
            feature_types: vec!["TABLES".into(), "FORMS".into()],
            env: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
