//! 钩子配对性质验证
//!
//! # 教案级注释概览
//!
//! - **核心目标 (Why)**：执行上下文可能派发一部分回调后被丢弃。无论回调是闭包、带钩子的类型，还是挂在
//!   原地分配器上的包装，分配钩子与归还钩子的次数都必须相等，复用区域最终必须回到空闲状态。
//! - **设计手法 (How)**：随机生成回调种类序列与派发前缀长度，投递到 `LocalExecutor`，只运行前缀，
//!   随后丢弃上下文，再核对计数。

use std::cell::Cell;

use proptest::prelude::*;
use spark_executor::LocalExecutor;
use spark_handler::{Handler, InPlaceAllocator, ScratchBlock, bind, with_allocator};

#[derive(Debug, Clone, Copy)]
enum Kind {
    Plain,
    Hooked,
    Pooled,
}

struct Hooked<'a> {
    allocations: &'a Cell<usize>,
    deallocations: &'a Cell<usize>,
}

impl<'a> Handler<(&'a Cell<usize>,)> for Hooked<'a> {
    type Output = ();

    fn call(self, (runs,): (&'a Cell<usize>,)) {
        runs.set(runs.get() + 1);
    }

    fn allocate(&self, size: usize) -> Option<ScratchBlock> {
        self.allocations.set(self.allocations.get() + 1);
        Some(ScratchBlock::with_size(size))
    }

    fn deallocate(&self, _block: ScratchBlock, _size: usize) {
        self.deallocations.set(self.deallocations.get() + 1);
    }
}

fn bump(runs: &Cell<usize>) {
    runs.set(runs.get() + 1);
}

fn kinds() -> impl Strategy<Value = Vec<Kind>> {
    proptest::collection::vec(
        prop_oneof![Just(Kind::Plain), Just(Kind::Hooked), Just(Kind::Pooled)],
        0..24,
    )
}

proptest! {
    #[test]
    fn prop_hooks_pair_even_when_dropped(plan in kinds(), prefix in 0usize..32) {
        let allocator = InPlaceAllocator::new(512);
        let allocations = Cell::new(0usize);
        let deallocations = Cell::new(0usize);
        let runs = Cell::new(0usize);

        let dispatched = {
            let executor = LocalExecutor::new();
            for kind in plan.iter().copied() {
                match kind {
                    Kind::Plain => executor.post(bind(bump as fn(&Cell<usize>), (&runs,))),
                    Kind::Hooked => executor.post(bind(
                        Hooked {
                            allocations: &allocations,
                            deallocations: &deallocations,
                        },
                        (&runs,),
                    )),
                    Kind::Pooled => executor.post(bind(
                        with_allocator(&allocator, bump as fn(&Cell<usize>)),
                        (&runs,),
                    )),
                }
            }
            let mut dispatched = 0usize;
            while dispatched < prefix && executor.run_one() {
                dispatched += 1;
            }
            dispatched
        };

        prop_assert_eq!(runs.get(), dispatched);
        prop_assert_eq!(allocations.get(), deallocations.get());
        prop_assert_eq!(
            allocations.get(),
            plan.iter().filter(|kind| matches!(kind, Kind::Hooked)).count()
        );
        prop_assert!(allocator.is_available(), "丢弃上下文后复用区域必须归还");
    }
}
