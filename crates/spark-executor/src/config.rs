use serde::Deserialize;
use thiserror::Error;

const CONFIG_PARSE_CODE: &str = "spark.config.parse_failed";

/// 执行上下文配置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorSettings {
    /// 派发队列的初始容量。
    pub initial_queue_capacity: usize,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            initial_queue_capacity: 64,
        }
    }
}

impl ExecutorSettings {
    pub fn from_toml_str(raw: &str) -> Result<Self, ExecutorConfigError> {
        Ok(toml::from_str(raw)?)
    }
}

/// 执行上下文配置解析失败。
#[derive(Debug, Error)]
pub enum ExecutorConfigError {
    #[error("failed to parse executor configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ExecutorConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => CONFIG_PARSE_CODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_capacity_is_configurable() {
        let settings =
            ExecutorSettings::from_toml_str("initial_queue_capacity = 8").expect("配置应解析成功");
        assert_eq!(settings.initial_queue_capacity, 8);
        assert_eq!(
            ExecutorSettings::from_toml_str("").expect("空文档取默认值"),
            ExecutorSettings::default()
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let error = ExecutorSettings::from_toml_str("queue = 1").expect_err("未知字段必须报错");
        assert_eq!(error.code(), "spark.config.parse_failed");
    }
}
