use core::sync::atomic::{AtomicU64, Ordering};

use bytes::BytesMut;
use spin::Mutex;

use crate::{
    block::ScratchBlock,
    handler::{Handler, Invocation},
};

/// `InPlaceAllocator` 持有一块固定容量的暂存区，供同一时刻至多一个挂起回调借用。
///
/// # 设计背景（Why）
/// - 连接上的读写回调通常串行发生：上一次完成回调运行前，下一次异步操作尚未发起。
///   为每次挂起都走一次堆分配毫无必要，复用一块固定区域即可覆盖稳态流量。
/// - 分配器本身无需感知回调类型，由 [`AllocHandler`] 把它挂到任意回调的分配钩子上。
///
/// # 逻辑解析（How）
/// - 空闲区域存放在 `spin::Mutex<Option<BytesMut>>` 中：借出即 `take`，归还即放回；
/// - 借出时截断到请求大小，归还时恢复到完整容量，`BytesMut` 的容量不会因截断而丢失；
/// - 区域已被借出或请求超过容量时拒绝分配，调用方随即回落到上下文的默认分配。
///
/// # 契约说明（What）
/// - [`statistics`](Self::statistics) 报告命中与回落次数，便于观察复用是否生效；
/// - 容量不足的外来块在归还时直接丢弃，不会污染复用区域。
#[derive(Debug)]
pub struct InPlaceAllocator {
    slot: Mutex<Option<BytesMut>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// [`InPlaceAllocator`] 的运行期计数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocatorStats {
    /// 由复用区域满足的分配次数。
    pub hits: u64,
    /// 被拒绝、回落到默认分配的次数。
    pub misses: u64,
}

impl InPlaceAllocator {
    /// 预留 `capacity` 字节的复用区域。
    pub fn new(capacity: usize) -> Self {
        Self {
            slot: Mutex::new(Some(BytesMut::zeroed(capacity))),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 复用区域当前是否空闲。
    pub fn is_available(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// 尝试借出 `size` 字节。
    pub fn try_allocate(&self, size: usize) -> Option<ScratchBlock> {
        if size > self.capacity {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        let taken = self.slot.lock().take();
        match taken {
            Some(mut storage) => {
                storage.truncate(size);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(ScratchBlock::from_storage(storage))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// 归还借出的区域。
    pub fn deallocate(&self, block: ScratchBlock, size: usize) {
        debug_assert_eq!(block.len(), size, "归还大小必须与借出时一致");
        let mut storage = block.into_storage();
        if storage.capacity() < self.capacity {
            return;
        }
        storage.resize(self.capacity, 0);
        let mut slot = self.slot.lock();
        if slot.is_none() {
            *slot = Some(storage);
        }
    }

    pub fn statistics(&self) -> AllocatorStats {
        AllocatorStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// 将 [`InPlaceAllocator`] 挂到回调分配钩子上的包装器；调用与调用钩子原样转发给内层回调。
#[derive(Debug)]
pub struct AllocHandler<'a, H> {
    allocator: &'a InPlaceAllocator,
    handler: H,
}

/// 以 `allocator` 为 `handler` 提供暂存内存。
pub fn with_allocator<H>(allocator: &InPlaceAllocator, handler: H) -> AllocHandler<'_, H> {
    AllocHandler { allocator, handler }
}

impl<'a, H> AllocHandler<'a, H> {
    pub fn allocator(&self) -> &'a InPlaceAllocator {
        self.allocator
    }

    pub fn into_inner(self) -> H {
        self.handler
    }
}

impl<H, A> Handler<A> for AllocHandler<'_, H>
where
    H: Handler<A>,
{
    type Output = H::Output;

    fn call(self, args: A) -> Self::Output {
        self.handler.call(args)
    }

    fn allocate(&self, size: usize) -> Option<ScratchBlock> {
        self.allocator.try_allocate(size)
    }

    fn deallocate(&self, block: ScratchBlock, size: usize) {
        self.allocator.deallocate(block, size);
    }

    fn invoke(invocation: Invocation<Self, A>) -> Result<(), Invocation<Self, A>> {
        let (wrapper, args) = invocation.into_parts();
        let allocator = wrapper.allocator;
        <H as Handler<A>>::invoke(Invocation::new(wrapper.handler, args)).map_err(|rejected| {
            let (handler, args) = rejected.into_parts();
            Invocation::new(AllocHandler { allocator, handler }, args)
        })
    }
}
