use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
};

use spark_handler::{BoxedCompletion, Handler, PendingCompletion};
use tracing::trace;

use crate::config::ExecutorSettings;

/// 派发循环的运行期计数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutorStats {
    /// 已投递的完成回调数。
    pub posted: u64,
    /// 由上下文直接运行的回调数。
    pub completed: u64,
    /// 由回调的调用钩子接管的回调数。
    pub delegated: u64,
}

/// `LocalExecutor` 是单线程 FIFO 派发循环，按钩子协议派发投递的完成回调。
///
/// # 设计背景（Why）
/// - 组合层的保证只能通过一个真正查询钩子的执行上下文来观测；本类型是最小的这样一个上下文，
///   适合测试与嵌入式事件循环；
/// - 回调可以借用生命周期为 `'a` 的数据，无需 `Send` 或 `'static`。
///
/// # 逻辑解析（How）
/// - `post` 立即构造 [`PendingCompletion`]：暂存内存在投递时预留，与回调挂起期间一致；
/// - `run_one` 先出队再派发，出队时释放队列借用，回调内部的 panic 不会破坏剩余队列。
///
/// # 契约说明（What）
/// - 回调 panic 会从 [`run`](Self::run) 传播出去，剩余回调仍在队列中，可继续运行；
/// - 执行上下文被丢弃时，未派发回调随之丢弃，其暂存块按协议归还。
pub struct LocalExecutor<'a> {
    queue: RefCell<VecDeque<BoxedCompletion<'a>>>,
    stats: Cell<ExecutorStats>,
}

impl Default for LocalExecutor<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LocalExecutor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalExecutor")
            .field("pending", &self.pending())
            .field("stats", &self.stats.get())
            .finish()
    }
}

impl<'a> LocalExecutor<'a> {
    pub fn new() -> Self {
        Self::with_settings(&ExecutorSettings::default())
    }

    pub fn with_settings(settings: &ExecutorSettings) -> Self {
        Self {
            queue: RefCell::new(VecDeque::with_capacity(settings.initial_queue_capacity)),
            stats: Cell::new(ExecutorStats::default()),
        }
    }

    /// 投递一个零参完成回调。
    pub fn post<H>(&self, handler: H)
    where
        H: Handler<(), Output = ()> + 'a,
    {
        let pending = PendingCompletion::new(handler);
        trace!(
            scratch = pending.scratch_size(),
            hooked = pending.uses_handler_allocation(),
            "completion posted"
        );
        self.queue.borrow_mut().push_back(Box::new(pending));
        self.update(|stats| stats.posted += 1);
    }

    /// 派发队首回调；队列为空时返回 `false`。
    pub fn run_one(&self) -> bool {
        let Some(next) = self.queue.borrow_mut().pop_front() else {
            return false;
        };
        if next.dispatch_erased().is_delegated() {
            self.update(|stats| stats.delegated += 1);
        } else {
            self.update(|stats| stats.completed += 1);
        }
        true
    }

    /// 运行直至队列为空，返回派发数。
    pub fn run(&self) -> usize {
        let mut dispatched = 0;
        while self.run_one() {
            dispatched += 1;
        }
        trace!(dispatched, "local executor drained");
        dispatched
    }

    /// 尚未派发的回调数。
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn statistics(&self) -> ExecutorStats {
        self.stats.get()
    }

    fn update(&self, apply: impl FnOnce(&mut ExecutorStats)) {
        let mut stats = self.stats.get();
        apply(&mut stats);
        self.stats.set(stats);
    }
}
