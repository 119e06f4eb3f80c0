//! 会话池与参考会话的配置结构。
//!
//! # 教案级说明
//! - **意图 (Why)**：工厂容量与会话参数需要随部署环境调整，统一以 TOML 文本描述，
//!   通过 `serde` 映射为强类型结构后再做取值校验，避免非法配置流入热路径。
//! - **契约 (What)**：所有结构均 `#[serde(default, deny_unknown_fields)]`：缺省字段取默认值，
//!   拼写错误的字段直接报错而不是被静默忽略。
//! - **设计权衡 (Trade-offs)**：解析与校验分两步；`from_toml_str` 总是在返回前调用 `validate`，
//!   手工构造的结构则由调用方自行决定是否校验。

use serde::Deserialize;

use crate::error::ConfigError;

/// 默认的空闲会话上限。
pub const DEFAULT_MAX_RECYCLED: usize = 64;

/// 会话工厂配置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactorySettings {
    /// 池中最多保留的空闲会话数；`0` 表示不做复用。
    pub max_recycled: usize,
}

impl Default for FactorySettings {
    fn default() -> Self {
        Self {
            max_recycled: DEFAULT_MAX_RECYCLED,
        }
    }
}

/// 参考回显会话的配置快照。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EchoSessionConfig {
    /// 会话读写缓冲的字节数。
    pub buffer_size: usize,
    /// 单次传输的上限，不得超过 `buffer_size`。
    pub max_transfer_size: usize,
    /// 是否关闭 Nagle 算法；`None` 表示沿用系统默认。
    pub no_delay: Option<bool>,
    /// 空闲超时（毫秒）；`None` 表示不超时。
    pub inactivity_timeout_ms: Option<u64>,
}

impl Default for EchoSessionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 4096,
            max_transfer_size: 4096,
            no_delay: None,
            inactivity_timeout_ms: None,
        }
    }
}

impl EchoSessionConfig {
    /// 校验字段之间的约束。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid {
                field: "buffer_size",
                reason: "must be greater than zero",
            });
        }
        if self.max_transfer_size == 0 {
            return Err(ConfigError::Invalid {
                field: "max_transfer_size",
                reason: "must be greater than zero",
            });
        }
        if self.max_transfer_size > self.buffer_size {
            return Err(ConfigError::Invalid {
                field: "max_transfer_size",
                reason: "must not exceed buffer_size",
            });
        }
        Ok(())
    }
}

/// 回显服务的完整配置：`[factory]` 与 `[session]` 两张表。
///
/// ```rust
/// use spark_session::EchoServerSettings;
///
/// let settings = EchoServerSettings::from_toml_str(
///     r#"
///     [factory]
///     max_recycled = 8
///
///     [session]
///     buffer_size = 1024
///     max_transfer_size = 512
///     no_delay = true
///     "#,
/// )
/// .expect("合法配置应解析成功");
/// assert_eq!(settings.factory.max_recycled, 8);
/// assert_eq!(settings.session.no_delay, Some(true));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EchoServerSettings {
    pub factory: FactorySettings,
    pub session: EchoSessionConfig,
}

impl EchoServerSettings {
    /// 解析并校验 TOML 文本。
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(raw)?;
        settings.session.validate()?;
        Ok(settings)
    }
}
