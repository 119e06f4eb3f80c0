use core::mem;

use crate::{
    block::ScratchBlock,
    handler::{Handler, Invocation},
};

/// 单次派发的结果。
#[derive(Debug, PartialEq, Eq)]
pub enum Dispatched<O> {
    /// 回调的调用钩子接管了派发，最终调用由钩子负责完成。
    Delegated,
    /// 上下文直接运行了回调，携带其返回值。
    Completed(O),
}

impl<O> Dispatched<O> {
    /// 是否由调用钩子接管。
    pub fn is_delegated(&self) -> bool {
        matches!(self, Self::Delegated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScratchOrigin {
    /// 经由回调的分配钩子取得，必须经由同一回调的归还钩子释放。
    Handler,
    /// 回调未声明分配钩子，由上下文从堆上取得。
    Context,
}

#[derive(Debug)]
struct Scratch {
    block: ScratchBlock,
    size: usize,
    origin: ScratchOrigin,
}

/// `PendingCompletion` 是执行上下文侧的派发协议：为一个零参回调预留暂存内存、
/// 在派发前归还、再按回调的调用钩子决定由谁执行。
///
/// # 设计背景（Why）
/// - 组合层的价值只有在“上下文真的会查询钩子”时才能被观测；本类型即这一查询流程的
///   唯一实现，各执行上下文（单线程队列、Tokio 运行时）都复用它，确保分配与归还的配对
///   规则只写一次。
///
/// # 逻辑解析（How）
/// 1. 构造：请求大小为回调挂起状态的字节数（至少 1）；先问分配钩子，未声明则堆分配；
/// 2. 派发：先归还暂存块，再把 [`Invocation`] 交给调用钩子；钩子拒绝时直接运行；
/// 3. 丢弃：未派发即被丢弃（取消、上下文关闭或派发途中 panic）时，剩余暂存块在 `Drop`
///    中按来源归还，仍然满足“每次分配恰好一次归还”。
///
/// # 契约说明（What）
/// - 归还钩子收到的 `size` 与分配时一致；上下文自行分配的块绝不会交给归还钩子；
/// - 回调的返回值经 [`Dispatched::Completed`] 原样交还，错误不会被吞掉。
///
/// # 风险提示（Trade-offs）
/// - 先归还后调用，意味着回调运行期间暂存块已可被复用；这与“回调可能在调用中再次发起
///   异步操作并重新申请同一块内存”的常见模式相匹配。
#[derive(Debug)]
pub struct PendingCompletion<H>
where
    H: Handler<()>,
{
    handler: Option<H>,
    scratch: Option<Scratch>,
}

impl<H> PendingCompletion<H>
where
    H: Handler<()>,
{
    /// 以回调构造挂起项，并立即完成暂存内存的预留。
    pub fn new(handler: H) -> Self {
        let size = mem::size_of::<H>().max(1);
        let scratch = match handler.allocate(size) {
            Some(block) => Scratch {
                block,
                size,
                origin: ScratchOrigin::Handler,
            },
            None => Scratch {
                block: ScratchBlock::with_size(size),
                size,
                origin: ScratchOrigin::Context,
            },
        };
        Self {
            handler: Some(handler),
            scratch: Some(scratch),
        }
    }

    /// 暂存块是否来自回调的分配钩子。
    pub fn uses_handler_allocation(&self) -> bool {
        self.scratch
            .as_ref()
            .is_some_and(|scratch| scratch.origin == ScratchOrigin::Handler)
    }

    /// 已预留的暂存字节数。
    pub fn scratch_size(&self) -> usize {
        self.scratch.as_ref().map_or(0, |scratch| scratch.size)
    }

    /// 派发回调。
    pub fn dispatch(mut self) -> Dispatched<H::Output> {
        let Some(handler) = self.handler.take() else {
            unreachable!("PendingCompletion 仅在 dispatch 中取出回调，构造时已保证存在");
        };
        if let Some(scratch) = self.scratch.take() {
            release(&handler, scratch);
        }
        match H::invoke(Invocation::new(handler, ())) {
            Ok(()) => Dispatched::Delegated,
            Err(invocation) => Dispatched::Completed(invocation.run()),
        }
    }
}

impl<H> Drop for PendingCompletion<H>
where
    H: Handler<()>,
{
    fn drop(&mut self) {
        let Some(scratch) = self.scratch.take() else {
            return;
        };
        match self.handler.as_ref() {
            Some(handler) => release(handler, scratch),
            None => drop(scratch.block),
        }
    }
}

fn release<H>(handler: &H, scratch: Scratch)
where
    H: Handler<()>,
{
    match scratch.origin {
        ScratchOrigin::Handler => handler.deallocate(scratch.block, scratch.size),
        ScratchOrigin::Context => drop(scratch.block),
    }
}

/// 类型擦除后的挂起项，供执行上下文以同构队列保存不同回调。
pub trait ErasedCompletion {
    /// 派发并报告是否由调用钩子接管。
    fn dispatch_erased(self: Box<Self>) -> Dispatched<()>;
}

impl<H> ErasedCompletion for PendingCompletion<H>
where
    H: Handler<(), Output = ()>,
{
    fn dispatch_erased(self: Box<Self>) -> Dispatched<()> {
        (*self).dispatch()
    }
}

/// 执行上下文队列中的挂起项。
pub type BoxedCompletion<'a> = Box<dyn ErasedCompletion + 'a>;
