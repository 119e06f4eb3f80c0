use thiserror::Error;

const NOT_ENOUGH_MEMORY_CODE: &str = "spark.session.not_enough_memory";
const CONFIG_PARSE_CODE: &str = "spark.config.parse_failed";
const CONFIG_INVALID_CODE: &str = "spark.config.invalid";

/// 会话构造或重置时无法取得所需内存。
///
/// 由 [`Session`](crate::Session) 实现返回，`requested` 为失败的那次申请的字节数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("failed to reserve {requested} bytes for session state")]
pub struct AllocationFailure {
    pub requested: usize,
}

impl AllocationFailure {
    pub fn new(requested: usize) -> Self {
        Self { requested }
    }
}

/// 会话工厂错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：池化工厂的全部操作中只有 `create` 可能失败，且唯一的失败原因是内存不足；
///   以单一变体枚举表达，调用方的 `match` 在未来新增变体时会得到编译期提醒。
/// - **契约 (What)**：错误同步返回给 `create` 的调用方，工厂不做重试；构造失败时池保持不变。
/// - **执行逻辑 (How)**：[`AllocationFailure`] 通过 `#[from]` 自动转换，会话实现内部可直接 `?` 传播。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// 新建会话或重置复用会话时内存不足。
    #[error("not enough memory to provide a session: {0}")]
    NotEnoughMemory(#[from] AllocationFailure),
}

impl SessionError {
    /// 稳定错误码，用于日志与告警聚合。
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotEnoughMemory(_) => NOT_ENOUGH_MEMORY_CODE,
        }
    }
}

/// 配置加载错误。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML 文本无法映射到配置结构（语法错误、字段类型不符或出现未知字段）。
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// 字段取值违反约束。
    #[error("invalid configuration field `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => CONFIG_PARSE_CODE,
            Self::Invalid { .. } => CONFIG_INVALID_CODE,
        }
    }
}
