use std::{
    collections::VecDeque,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use parking_lot::Mutex;
use spark_handler::{Handler, Invocation, ScratchBlock};
use tracing::warn;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct StrandState {
    queue: VecDeque<Job>,
    running: bool,
}

/// `Strand` 是串行化调用器：经由同一 strand 派发的调用体互不并发，并按提交顺序执行。
///
/// # 设计背景（Why）
/// - 连接上的读、写、定时回调可能由多线程运行时的不同工作线程完成；若它们共享连接状态，
///   要么加锁，要么把它们排进同一条串行序列。strand 提供后者，且不占用专门的线程。
/// - 串行策略挂在回调的调用钩子上（见 [`Stranded`]），经 `bind` 组合后依旧生效。
///
/// # 逻辑解析（How）
/// - 队列与 `running` 标志由同一把 `parking_lot::Mutex` 保护；
/// - [`dispatch`](Self::dispatch) 入队后，若 strand 空闲则由当前线程接手排空队列；
///   否则直接返回，由正在排空的线程负责执行；
/// - 排空时每次只在锁内取出一个调用体，锁外执行；发现队列为空时在同一临界区内清除 `running`，
///   不会遗漏并发入队的调用体。
///
/// # 契约说明（What）
/// - 调用体内再次向同一 strand 派发不会递归执行，而是排到队尾；
/// - 调用体 panic 不会中断排空：panic 被暂存，队列照常排空至空、`running` 复位后，首个 panic
///   再向调用方传播；已被接受的调用体因此都会执行恰好一次。
#[derive(Clone)]
pub struct Strand {
    state: Arc<Mutex<StrandState>>,
}

impl Default for Strand {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Strand")
            .field("queued", &state.queue.len())
            .field("running", &state.running)
            .finish()
    }
}

impl Strand {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StrandState {
                queue: VecDeque::new(),
                running: false,
            })),
        }
    }

    /// 提交调用体；strand 空闲时在当前线程立即执行。
    pub fn dispatch<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut state = self.state.lock();
            state.queue.push_back(Box::new(job));
            if state.running {
                return;
            }
            state.running = true;
        }

        let mut first_panic = None;
        loop {
            let next = {
                let mut state = self.state.lock();
                match state.queue.pop_front() {
                    Some(job) => job,
                    None => {
                        state.running = false;
                        break;
                    }
                }
            };
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(next)) {
                if first_panic.is_some() {
                    warn!("strand job panicked while an earlier panic is pending");
                } else {
                    first_panic = Some(payload);
                }
            }
        }
        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
    }

    /// 尚未执行的调用体数。
    pub fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// 是否有线程正在排空队列。
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// 将回调的最终调用路由到本 strand。
    pub fn wrap<H>(&self, handler: H) -> Stranded<H> {
        Stranded {
            strand: self.clone(),
            handler,
        }
    }
}

/// 经 [`Strand::wrap`] 包装的回调：调用钩子把真实调用排入 strand，分配钩子转发给内层回调。
///
/// 内层回调自身的调用钩子仍然生效：strand 中执行的是“交给内层钩子，被拒绝再直接运行”。
/// 经 strand 执行时回调的返回值被丢弃。
#[derive(Debug, Clone)]
pub struct Stranded<H> {
    strand: Strand,
    handler: H,
}

impl<H> Stranded<H> {
    pub fn strand(&self) -> &Strand {
        &self.strand
    }

    pub fn into_inner(self) -> H {
        self.handler
    }
}

impl<H, A> Handler<A> for Stranded<H>
where
    H: Handler<A> + Send + 'static,
    A: Send + 'static,
{
    type Output = H::Output;

    fn call(self, args: A) -> Self::Output {
        self.handler.call(args)
    }

    fn allocate(&self, size: usize) -> Option<ScratchBlock> {
        self.handler.allocate(size)
    }

    fn deallocate(&self, block: ScratchBlock, size: usize) {
        self.handler.deallocate(block, size);
    }

    fn invoke(invocation: Invocation<Self, A>) -> Result<(), Invocation<Self, A>> {
        let (Stranded { strand, handler }, args) = invocation.into_parts();
        strand.dispatch(move || {
            if let Err(rejected) = H::invoke(Invocation::new(handler, args)) {
                drop(rejected.run());
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn nested_dispatch_is_queued_not_recursive() {
        let strand = Strand::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner_strand = strand.clone();
        let inner_log = Arc::clone(&log);
        strand.dispatch(move || {
            inner_log.lock().push("outer:start");
            let nested_log = Arc::clone(&inner_log);
            inner_strand.dispatch(move || nested_log.lock().push("nested"));
            inner_log.lock().push("outer:end");
        });

        assert_eq!(*log.lock(), vec!["outer:start", "outer:end", "nested"]);
        assert!(!strand.is_running());
        assert_eq!(strand.queued(), 0);
    }

    #[test]
    fn panic_resets_running_flag() {
        let strand = Strand::new();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            strand.dispatch(|| panic!("调用体失败"));
        }));
        assert!(outcome.is_err());
        assert!(!strand.is_running(), "panic 后 strand 必须可继续使用");

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        strand.dispatch(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn work_queued_behind_a_panicking_job_still_runs() {
        let strand = Strand::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let inner_strand = strand.clone();
        let counter = Arc::clone(&hits);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            strand.dispatch(move || {
                let wrapped = inner_strand.wrap(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
                let accepted =
                    <Stranded<_> as Handler<()>>::invoke(Invocation::new(wrapped, ())).is_ok();
                assert!(accepted);
                panic!("调用体失败");
            });
        }));

        assert!(outcome.is_err(), "panic 仍须传播给排空线程的调用方");
        assert_eq!(hits.load(Ordering::SeqCst), 1, "已接受的调用体必须执行");
        assert_eq!(strand.queued(), 0);
        assert!(!strand.is_running());
    }

    #[test]
    fn only_the_first_panic_propagates() {
        let strand = Strand::new();
        let inner_strand = strand.clone();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            strand.dispatch(move || {
                inner_strand.dispatch(|| panic!("second"));
                panic!("first");
            });
        }));

        let payload = outcome.expect_err("排空线程应观测到 panic");
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"first"));
        assert!(!strand.is_running());
        assert_eq!(strand.queued(), 0);
    }

    #[test]
    fn stranded_handler_routes_through_strand() {
        let strand = Strand::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let wrapped = strand.wrap(move |step: usize| {
            counter.fetch_add(step, Ordering::SeqCst);
        });

        let outcome = <Stranded<_> as Handler<(usize,)>>::invoke(Invocation::new(wrapped, (5,)));
        assert!(outcome.is_ok(), "Stranded 总是接管调用");
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }
}
