use crate::{
    config::EchoSessionConfig,
    error::AllocationFailure,
    session::Session,
};

/// 参考会话：把收到的字节按配置的传输上限回显。
///
/// # 教案级说明
/// - **意图 (Why)**：给工厂一个真实持有堆缓冲的会话实现，复用与重置的收益可以被直接观测，
///   同时充当测试与基准的载体。
/// - **逻辑 (How)**：缓冲通过 `Vec::try_reserve_exact` 预留，容量申请失败时返回
///   [`AllocationFailure`] 而不是中止进程；重置时只在新配置需要更大缓冲时扩容。
/// - **契约 (What)**：[`echo`](Self::echo) 每次最多处理 `max_transfer_size` 字节；
///   `C` 为执行上下文句柄，构造时克隆一份保存。
#[derive(Debug)]
pub struct EchoSession<C> {
    context: C,
    config: EchoSessionConfig,
    buffer: Vec<u8>,
    resets: u64,
}

impl<C> EchoSession<C> {
    pub fn context(&self) -> &C {
        &self.context
    }

    /// 当前生效的配置快照。
    pub fn config(&self) -> &EchoSessionConfig {
        &self.config
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// 被工厂重置（复用）的次数。
    pub fn resets(&self) -> u64 {
        self.resets
    }

    /// 回显 `input` 的前 `max_transfer_size` 字节。
    pub fn echo(&mut self, input: &[u8]) -> &[u8] {
        let take = input.len().min(self.config.max_transfer_size);
        self.buffer.clear();
        self.buffer.extend_from_slice(&input[..take]);
        &self.buffer
    }
}

fn reserve_buffer(buffer: &mut Vec<u8>, size: usize) -> Result<(), AllocationFailure> {
    let additional = size.saturating_sub(buffer.len());
    buffer
        .try_reserve_exact(additional)
        .map_err(|_| AllocationFailure::new(size))
}

impl<C> Session for EchoSession<C>
where
    C: Clone,
{
    type Context = C;
    type Config = EchoSessionConfig;

    fn construct(context: &C, config: &EchoSessionConfig) -> Result<Self, AllocationFailure> {
        let mut buffer = Vec::new();
        reserve_buffer(&mut buffer, config.buffer_size)?;
        Ok(Self {
            context: context.clone(),
            config: config.clone(),
            buffer,
            resets: 0,
        })
    }

    fn reset(&mut self, config: &EchoSessionConfig) -> Result<(), AllocationFailure> {
        self.buffer.clear();
        if self.buffer.capacity() < config.buffer_size {
            reserve_buffer(&mut self.buffer, config.buffer_size)?;
        }
        self.config = config.clone();
        self.resets += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_respects_transfer_limit() {
        let config = EchoSessionConfig {
            buffer_size: 16,
            max_transfer_size: 4,
            ..EchoSessionConfig::default()
        };
        let mut session = EchoSession::construct(&(), &config).expect("构造应成功");
        assert!(session.buffer_capacity() >= 16);
        assert_eq!(session.echo(b"hello"), b"hell");
    }

    #[test]
    fn oversized_buffer_reports_allocation_failure() {
        let config = EchoSessionConfig {
            buffer_size: usize::MAX,
            max_transfer_size: 1,
            ..EchoSessionConfig::default()
        };
        let failure = EchoSession::construct(&(), &config).expect_err("超大缓冲必须失败");
        assert_eq!(failure.requested, usize::MAX);
    }

    #[test]
    fn reset_grows_buffer_only_when_needed() {
        let small = EchoSessionConfig {
            buffer_size: 8,
            max_transfer_size: 8,
            ..EchoSessionConfig::default()
        };
        let large = EchoSessionConfig {
            buffer_size: 256,
            max_transfer_size: 128,
            ..EchoSessionConfig::default()
        };
        let mut session = EchoSession::construct(&(), &small).expect("构造应成功");
        session.reset(&large).expect("扩容应成功");
        assert!(session.buffer_capacity() >= 256);
        assert_eq!(session.config().max_transfer_size, 128);
        assert_eq!(session.resets(), 1);

        session.reset(&small).expect("缩小配置无需扩容");
        assert!(session.buffer_capacity() >= 256, "已有容量应保留");
    }
}
