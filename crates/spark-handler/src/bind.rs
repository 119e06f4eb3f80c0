use crate::{
    block::ScratchBlock,
    handler::{Handler, Invocation},
};

/// `BoundHandler` 将回调 `H` 与参数列表 `A` 绑定为一个零参回调，并原样转发 `H` 的全部钩子。
///
/// # 设计背景（Why）
/// - 朴素地用闭包捕获回调与参数，会得到一个没有任何钩子的新类型：执行上下文查询不到
///   池化分配或串行调度策略，热路径性能与顺序保证都会悄然丢失；
/// - `BoundHandler` 的全部价值在于“重建钩子面”：分配/归还转发给 `H`，调用钩子则把
///   真实调用体改写为 `H(A1..An)` 后交给 `H` 的调用钩子。
///
/// # 契约说明（What）
/// - 调用 `BoundHandler` 会恰好调用一次 `H(A1..An)`；
/// - 参数按给定的值移入；需要引用语义（多个槽位别名同一对象）时绑定 `&T` 或 `Arc<T>`，
///   每个槽位仍是独立的一个实参；
/// - `H` 未声明的钩子，`BoundHandler` 同样不声明：分配钩子返回 `None`，调用钩子拒绝接管。
///
/// # 风险提示（Trade-offs）
/// - 单次使用：调用即消耗；
/// - 组合层自身不分配、不捕获错误，`H` 的 panic 或错误返回值原样传播。
#[derive(Clone, Debug)]
pub struct BoundHandler<H, A> {
    handler: H,
    args: A,
}

/// 将参数列表 `args` 绑定到 `handler`。
///
/// 参数列表以元组给出，元数没有上限；逐个列出参数时可使用 [`bind!`](crate::bind!) 宏。
pub fn bind<H, A>(handler: H, args: A) -> BoundHandler<H, A>
where
    H: Handler<A>,
{
    BoundHandler { handler, args }
}

/// 以可变参数形式调用 [`bind`](fn@crate::bind)：`bind!(handler, a, b, c)` 等价于
/// `bind(handler, (a, b, c))`。
#[macro_export]
macro_rules! bind {
    ($handler:expr $(, $arg:expr)+ $(,)?) => {
        $crate::bind($handler, ($($arg,)+))
    };
}

impl<H, A> BoundHandler<H, A> {
    /// 被包装的回调。
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// 已绑定的参数列表。
    pub fn args(&self) -> &A {
        &self.args
    }

    /// 拆分为回调与参数列表。
    pub fn into_parts(self) -> (H, A) {
        (self.handler, self.args)
    }
}

impl<H, A> Handler<()> for BoundHandler<H, A>
where
    H: Handler<A>,
{
    type Output = H::Output;

    fn call(self, (): ()) -> Self::Output {
        self.handler.call(self.args)
    }

    fn allocate(&self, size: usize) -> Option<ScratchBlock> {
        self.handler.allocate(size)
    }

    fn deallocate(&self, block: ScratchBlock, size: usize) {
        self.handler.deallocate(block, size);
    }

    /// 把“调用 BoundHandler”改写为“以绑定参数调用 H”，交给 `H` 的调用钩子；
    /// `H` 拒绝时还原为原调用体交还上下文。
    fn invoke(invocation: Invocation<Self, ()>) -> Result<(), Invocation<Self, ()>> {
        let (bound, ()) = invocation.into_parts();
        <H as Handler<A>>::invoke(Invocation::new(bound.handler, bound.args)).map_err(|rejected| {
            let (handler, args) = rejected.into_parts();
            Invocation::new(BoundHandler { handler, args }, ())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn bump(counter: &Cell<usize>) {
        counter.set(counter.get() + 1);
    }

    #[test]
    fn aliased_slots_each_count_once() {
        let counter = Cell::new(0usize);

        bind(|a: &Cell<usize>| bump(a), (&counter,)).call(());
        assert_eq!(counter.get(), 1);

        bind(
            |a: &Cell<usize>, b: &Cell<usize>| {
                bump(a);
                bump(b);
            },
            (&counter, &counter),
        )
        .call(());
        assert_eq!(counter.get(), 3);

        crate::bind!(
            |a: &Cell<usize>, b: &Cell<usize>, c: &Cell<usize>| {
                bump(a);
                bump(b);
                bump(c);
            },
            &counter,
            &counter,
            &counter,
        )
        .call(());
        assert_eq!(counter.get(), 6, "三个槽位别名同一计数器，应累计三次");
    }

    #[test]
    fn output_is_returned_unmodified() {
        let bound = bind(|a: u32, b: u32| -> Result<u32, &'static str> { Err(if a > b { "gt" } else { "le" }) }, (3, 1));
        assert_eq!(bound.call(()), Err("gt"));
    }

    /// 记录钩子调用次数的回调，调用钩子会先计数再运行真实调用体。
    struct Hooked<'a> {
        allocations: &'a Cell<usize>,
        invocations: &'a Cell<usize>,
    }

    impl<'a> Handler<(&'a Cell<usize>,)> for Hooked<'a> {
        type Output = ();

        fn call(self, (counter,): (&'a Cell<usize>,)) {
            bump(counter);
        }

        fn allocate(&self, size: usize) -> Option<ScratchBlock> {
            bump(self.allocations);
            Some(ScratchBlock::with_size(size))
        }

        fn invoke(
            invocation: Invocation<Self, (&'a Cell<usize>,)>,
        ) -> Result<(), Invocation<Self, (&'a Cell<usize>,)>> {
            bump(invocation.handler().invocations);
            invocation.run();
            Ok(())
        }
    }

    #[test]
    fn hooks_are_forwarded_to_inner_handler() {
        let allocations = Cell::new(0);
        let invocations = Cell::new(0);
        let calls = Cell::new(0);
        let bound = bind(
            Hooked {
                allocations: &allocations,
                invocations: &invocations,
            },
            (&calls,),
        );

        let block = bound.allocate(32).expect("内层回调声明了分配钩子");
        assert_eq!(block.len(), 32);
        bound.deallocate(block, 32);
        assert_eq!(allocations.get(), 1);

        let outcome = <BoundHandler<_, _> as Handler<()>>::invoke(Invocation::new(bound, ()));
        assert!(outcome.is_ok(), "内层调用钩子应接管派发");
        assert_eq!(invocations.get(), 1);
        assert_eq!(calls.get(), 1, "钩子运行的调用体必须恰好执行一次 H(A1..An)");
    }

    #[test]
    fn missing_hooks_stay_missing() {
        let calls = Cell::new(0);
        let bound = bind(|a: &Cell<usize>| bump(a), (&calls,));
        assert!(bound.allocate(8).is_none());

        let rejected = match <BoundHandler<_, _> as Handler<()>>::invoke(Invocation::new(bound, ())) {
            Ok(()) => panic!("闭包没有调用钩子，组合体也不应声明"),
            Err(rejected) => rejected,
        };
        assert_eq!(calls.get(), 0, "拒绝接管时不得提前执行回调");
        rejected.run();
        assert_eq!(calls.get(), 1);
    }
}
