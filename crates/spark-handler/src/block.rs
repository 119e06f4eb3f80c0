use bytes::BytesMut;

/// 与一次挂起回调关联的暂存块。
///
/// # 设计背景（Why）
/// - 执行上下文为每个挂起回调预留一段与其挂起状态等大的暂存内存；回调可通过分配钩子
///   提供这段内存（例如复用固定区域），否则由上下文从堆上取得。
/// - 以拥有所有权的安全类型表达内存块，钩子之间的“借出/归还”即所有权的移动，
///   不需要裸指针，也就不存在重复归还或悬垂访问。
///
/// # 契约说明（What）
/// - `len()` 等于分配时请求的字节数；
/// - 底层存储为 [`BytesMut`]，归还后可被分配器原样复用，容量不会因截断而丢失。
#[derive(Debug)]
pub struct ScratchBlock {
    storage: BytesMut,
}

impl ScratchBlock {
    /// 从堆上分配 `size` 字节的零初始化暂存块（执行上下文的默认策略）。
    pub fn with_size(size: usize) -> Self {
        Self {
            storage: BytesMut::zeroed(size),
        }
    }

    /// 以既有存储构造暂存块，供复用型分配器使用。
    pub fn from_storage(storage: BytesMut) -> Self {
        Self { storage }
    }

    /// 可用字节数。
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// 底层存储容量，不小于 [`len`](Self::len)。
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[..]
    }

    /// 取回底层存储。
    pub fn into_storage(self) -> BytesMut {
        self.storage
    }
}
