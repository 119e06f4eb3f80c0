use crate::block::ScratchBlock;

/// `Handler` 描述一个可被执行上下文派发的完成回调，以及它可选声明的三类定制钩子。
///
/// # 设计背景（Why）
/// - 执行上下文在热路径上需要为挂起的回调准备暂存内存，并决定最终调用在哪个调度序列上发生；
///   这些策略（池化分配、按连接串行执行等）由回调本身携带，而不是由上下文统一规定。
/// - 回调一旦被二次包装（例如绑定额外参数），包装体是一个全新的类型；若包装体不重新暴露钩子，
///   上下文只能看到默认行为，策略随之失效。因此钩子必须是显式、可转发的契约方法。
///
/// # 契约说明（What）
/// - `Args`：回调接收的参数列表，统一以元组表达（零参为 `()`），因此元数没有人为上限；
/// - [`call`](Self::call)：消耗自身执行回调，恰好一次；
/// - [`allocate`](Self::allocate)：分配钩子，返回 `None` 表示未声明钩子，上下文应使用默认分配策略；
/// - [`deallocate`](Self::deallocate)：归还钩子，上下文必须对每一次成功的 `allocate` 恰好调用一次，
///   且 `size` 与分配时一致；未经 `allocate` 得到的块绝不会交给它；
/// - [`invoke`](Self::invoke)：调用钩子，返回 `Ok(())` 表示钩子接管了派发并负责恰好运行一次
///   [`Invocation::run`]；返回 `Err(invocation)` 表示未声明钩子，上下文应直接运行。
///
/// # 风险提示（Trade-offs）
/// - 钩子以默认方法提供，闭包天然“无钩子”；自定义类型只需覆写关心的钩子。
/// - `invoke` 为关联函数而非 `&self` 方法：调用会消耗回调本身，只有把回调连同参数整体交给钩子，
///   才能在不借用冲突的前提下让钩子决定何时、在哪里执行。
pub trait Handler<Args>: Sized {
    /// 回调的返回值；上下文直接运行时原样交还给调用方。
    type Output;

    /// 以 `args` 执行回调。
    fn call(self, args: Args) -> Self::Output;

    /// 分配与回调挂起状态关联的暂存块。
    fn allocate(&self, size: usize) -> Option<ScratchBlock> {
        let _ = size;
        None
    }

    /// 归还 [`allocate`](Self::allocate) 分配出的暂存块。
    fn deallocate(&self, block: ScratchBlock, size: usize) {
        let _ = size;
        drop(block);
    }

    /// 尝试接管最终调用的调度。
    fn invoke(invocation: Invocation<Self, Args>) -> Result<(), Invocation<Self, Args>> {
        Err(invocation)
    }
}

/// `Invocation` 是交给调用钩子的“真实调用体”：回调连同其参数。
///
/// # 契约说明（What）
/// - [`run`](Self::run) 执行且仅执行一次 `handler(args)`；
/// - 钩子可以通过 [`handler`](Self::handler) 只读访问回调以读取其策略状态，
///   或通过 [`into_parts`](Self::into_parts) 拆开后改写为内层回调的调用（组合器转发时使用）。
#[derive(Debug)]
#[must_use = "Invocation 必须被运行或交还给执行上下文，否则回调会被静默丢弃"]
pub struct Invocation<H, A> {
    handler: H,
    args: A,
}

impl<H, A> Invocation<H, A> {
    /// 由回调与参数组装调用体。
    pub fn new(handler: H, args: A) -> Self {
        Self { handler, args }
    }

    /// 只读访问待执行的回调。
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// 只读访问待传入的参数。
    pub fn args(&self) -> &A {
        &self.args
    }

    /// 拆分为回调与参数。
    pub fn into_parts(self) -> (H, A) {
        (self.handler, self.args)
    }

    /// 执行 `handler(args)`。
    pub fn run(self) -> H::Output
    where
        H: Handler<A>,
    {
        self.handler.call(self.args)
    }
}

/// 为 `FnOnce` 闭包按元数生成 [`Handler`] 实现。
///
/// 闭包不声明任何钩子；需要钩子的回调应实现为具名类型。
macro_rules! impl_handler_for_fn {
    ($($arg:ident),*) => {
        impl<Func, Out, $($arg,)*> Handler<($($arg,)*)> for Func
        where
            Func: FnOnce($($arg),*) -> Out,
        {
            type Output = Out;

            #[allow(non_snake_case, clippy::unused_unit)]
            fn call(self, ($($arg,)*): ($($arg,)*)) -> Out {
                self($($arg),*)
            }
        }
    };
}

impl_handler_for_fn!();
impl_handler_for_fn!(A1);
impl_handler_for_fn!(A1, A2);
impl_handler_for_fn!(A1, A2, A3);
impl_handler_for_fn!(A1, A2, A3, A4);
impl_handler_for_fn!(A1, A2, A3, A4, A5);
impl_handler_for_fn!(A1, A2, A3, A4, A5, A6);
impl_handler_for_fn!(A1, A2, A3, A4, A5, A6, A7);
impl_handler_for_fn!(A1, A2, A3, A4, A5, A6, A7, A8);
impl_handler_for_fn!(A1, A2, A3, A4, A5, A6, A7, A8, A9);
impl_handler_for_fn!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10);
impl_handler_for_fn!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11);
impl_handler_for_fn!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12);
