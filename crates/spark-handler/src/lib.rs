#![deny(unsafe_code)]
#![doc = "spark-handler: 完成回调（Completion Handler）组合层。"]
#![doc = ""]
#![doc = "== 定位 =="]
#![doc = "执行上下文在派发完成回调时，会向回调查询三类定制钩子：暂存内存的分配、归还，以及最终调用的调度方式。"]
#![doc = "本 crate 定义这组钩子契约（[`Handler`]），并提供在绑定额外参数后仍然透传钩子的组合器（[`bind`]），"]
#![doc = "使池化分配、串行化执行等挂在回调上的策略不会因为组合而丢失。"]
#![doc = ""]
#![doc = "== 模块划分 =="]
#![doc = "- `handler`：钩子契约与 [`Invocation`]；"]
#![doc = "- `bind`：N 元参数绑定；"]
#![doc = "- `block`：钩子分配出的暂存块；"]
#![doc = "- `dispatch`：执行上下文侧的派发协议 [`PendingCompletion`]；"]
#![doc = "- `allocator`：原地复用的暂存分配器与配套包装器。"]

//! # 使用示例
//!
//! ```rust
//! use std::cell::Cell;
//! use spark_handler::{Dispatched, PendingCompletion, bind};
//!
//! let hits = Cell::new(0usize);
//! let bound = bind(
//!     |a: &Cell<usize>, b: &Cell<usize>| {
//!         a.set(a.get() + 1);
//!         b.set(b.get() + 1);
//!     },
//!     (&hits, &hits),
//! );
//! let pending = PendingCompletion::new(bound);
//! assert!(matches!(pending.dispatch(), Dispatched::Completed(())));
//! assert_eq!(hits.get(), 2, "同一计数器绑定两次，应观测到两次递增");
//! ```

mod allocator;
mod bind;
mod block;
mod dispatch;
mod handler;

pub use allocator::{AllocHandler, AllocatorStats, InPlaceAllocator, with_allocator};
pub use bind::{BoundHandler, bind};
pub use block::ScratchBlock;
pub use dispatch::{BoxedCompletion, Dispatched, ErasedCompletion, PendingCompletion};
pub use handler::{Handler, Invocation};
