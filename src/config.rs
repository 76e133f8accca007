//! 应用配置：启动时构建一次，显式传给各组件

use std::path::Path;

use serde::Deserialize;

use crate::model::data_core::AppError;
use crate::model::notifications::DEFAULT_NOTIFICATION_DURATION_MS;
use crate::model::typing::TypingConfig;
use crate::service::openai::OpenAiConfig;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_API_BASE: &str = "OPENAI_API_BASE";
pub const ENV_CONFIG_FILE: &str = "JSON_EXTRACT_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub typing: TypingConfig,
    pub notification_duration_ms: u64,
    pub openai: OpenAiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            typing: TypingConfig::default(),
            notification_duration_ms: DEFAULT_NOTIFICATION_DURATION_MS,
            openai: OpenAiConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从JSON配置文件加载；缺省字段取默认值
    pub fn from_file(p: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(p)?;
        serde_json::from_str(&text)
            .map_err(|e| AppError::Config(format!("{}: {}", p.display(), e)))
    }

    /// 配置文件（可选）+ 环境变量覆盖
    pub fn from_env() -> Self {
        let base = match std::env::var(ENV_CONFIG_FILE) {
            Ok(path) => Self::from_file(Path::new(&path)).unwrap_or_else(|e| {
                tracing::warn!("配置文件加载失败，使用默认配置: {}", e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        base.with_overrides(
            std::env::var(ENV_API_KEY).ok(),
            std::env::var(ENV_API_BASE).ok(),
        )
    }

    /// 应用环境变量覆盖；空字符串视为未设置
    pub fn with_overrides(mut self, api_key: Option<String>, api_base: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.openai.api_key = Some(key);
        }
        if let Some(base) = api_base.filter(|b| !b.trim().is_empty()) {
            self.openai.endpoint = base;
        }
        self
    }
}
