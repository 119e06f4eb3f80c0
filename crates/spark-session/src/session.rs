use core::{
    fmt,
    ops::{Deref, DerefMut},
};

use crate::error::AllocationFailure;

/// `Session` 描述可被工厂池化的连接会话。
///
/// # 设计背景（Why）
/// - 会话绑定在某个执行上下文上，承载每连接的状态（缓冲、计时器、协议状态机）；
///   构造代价较高，接入路径上反复创建/销毁会带来明显的堆抖动。
/// - 工厂只需要两种能力：以上下文与配置构造，以及在复用前按新配置重置。
///
/// # 契约说明（What）
/// - [`construct`](Self::construct)：内存不足时返回 [`AllocationFailure`]，不得 panic；
/// - [`reset`](Self::reset)：把复用会话恢复为“刚以 `config` 构造”的可观测状态；
///   失败时会话将被工厂丢弃，实现无需保证失败后的状态可用；
/// - 会话的 I/O 与协议处理不在工厂职责内。
pub trait Session: Sized {
    /// 会话所属的执行上下文。
    type Context;
    /// 会话配置快照。
    type Config;

    fn construct(context: &Self::Context, config: &Self::Config) -> Result<Self, AllocationFailure>;

    fn reset(&mut self, config: &Self::Config) -> Result<(), AllocationFailure>;
}

/// 会话在工厂内的稳定编号，构造时分配，复用期间保持不变。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// 工厂交给调用方的独占会话句柄。
///
/// 句柄以值持有会话：被调用方持有期间它不在池中；[`release`](crate::SessionFactory::release)
/// 以移动语义交还，调用方此后无法再访问。
#[derive(Debug)]
pub struct SessionHandle<S> {
    id: SessionId,
    session: S,
}

impl<S> SessionHandle<S> {
    pub(crate) fn new(id: SessionId, session: S) -> Self {
        Self { id, session }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// 脱离工厂管理，取回会话本身。
    pub fn into_inner(self) -> S {
        self.session
    }
}

impl<S> Deref for SessionHandle<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S> DerefMut for SessionHandle<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}
