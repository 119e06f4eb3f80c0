use spark_handler::{Dispatched, Handler, PendingCompletion};
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::trace;

/// `TokioExecutor` 把完成回调投递到 Tokio 运行时，每个回调在独立任务中按钩子协议派发。
///
/// # 契约说明（What）
/// - 暂存内存在投递线程上预留（`post` 返回前），归还与调用发生在运行时的工作线程上；
/// - 返回的 [`JoinHandle`] 报告回调是被直接运行还是被调用钩子接管；
/// - 回调间的顺序不做保证；需要串行时以 [`Strand`](crate::Strand) 包装回调。
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// 绑定当前所在的 Tokio 运行时；不在运行时上下文中时返回 `None`。
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// 投递一个零参完成回调。
    pub fn post<H>(&self, handler: H) -> JoinHandle<Dispatched<()>>
    where
        H: Handler<(), Output = ()> + Send + 'static,
    {
        let pending = PendingCompletion::new(handler);
        trace!(scratch = pending.scratch_size(), "completion posted to tokio");
        self.handle.spawn(async move { pending.dispatch() })
    }
}
