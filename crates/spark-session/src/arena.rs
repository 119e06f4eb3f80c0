//! 基于槽位数组的侵入式双向链表。
//!
//! # 教案级说明
//! - **意图 (Why)**：会话池要求“头部 O(1) 插入”与“按身份 O(1) 摘除任意条目”。以 `Vec` 槽位
//!   承载节点、用下标代替指针串起链表，既保留侵入式链表的复杂度，又完全处于安全 Rust 之内。
//! - **逻辑 (How)**：
//!   - 占用槽位通过 `prev`/`next` 串成双向链表，`head` 为最近插入端，`tail` 为最冷端；
//!   - 空闲槽位通过 `next_free` 串成自由链表，新插入优先复用空闲槽位；
//!   - 每个槽位带 `generation`，腾空时自增；[`ListKey`] 同时记录下标与代数，
//!     槽位被复用后旧键自然失效，不会误删新条目。
//! - **契约 (What)**：除 [`iter`](RecycleList::iter) 与 [`clear`](RecycleList::clear) 外的操作均为 O(1)。
//! - **设计权衡 (Trade-offs)**：槽位数组只增不减（腾空的槽位进入自由链表），峰值之后的内存由
//!   [`shrink_to_fit`](RecycleList::shrink_to_fit) 在链表为空时归还。

use core::mem;

/// 条目键：槽位下标加代数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListKey {
    index: usize,
    generation: u64,
}

#[derive(Debug)]
enum Entry<T> {
    Occupied {
        value: T,
        prev: Option<usize>,
        next: Option<usize>,
    },
    Vacant {
        next_free: Option<usize>,
    },
}

#[derive(Debug)]
struct Slot<T> {
    generation: u64,
    entry: Entry<T>,
}

/// 槽位数组承载的双向链表，头部为最近插入的条目。
#[derive(Debug)]
pub struct RecycleList<T> {
    slots: Vec<Slot<T>>,
    head: Option<usize>,
    tail: Option<usize>,
    free: Option<usize>,
    len: usize,
    generation_floor: u64,
}

impl<T> Default for RecycleList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecycleList<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: None,
            tail: None,
            free: None,
            len: 0,
            generation_floor: 0,
        }
    }

    /// 预留 `capacity` 个槽位。
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 在头部插入，返回条目键。
    pub fn push_front(&mut self, value: T) -> ListKey {
        let old_head = self.head;
        let entry = Entry::Occupied {
            value,
            prev: None,
            next: old_head,
        };
        let index = match self.free {
            Some(index) => {
                let slot = &mut self.slots[index];
                let Entry::Vacant { next_free } = slot.entry else {
                    unreachable!("自由链表只串联空闲槽位");
                };
                self.free = next_free;
                slot.entry = entry;
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: self.generation_floor,
                    entry,
                });
                self.slots.len() - 1
            }
        };

        match old_head {
            Some(head) => self.set_prev(head, Some(index)),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
        self.len += 1;

        ListKey {
            index,
            generation: self.slots[index].generation,
        }
    }

    /// 摘除头部（最近插入的）条目。
    pub fn pop_front(&mut self) -> Option<T> {
        let index = self.head?;
        Some(self.unlink(index))
    }

    /// 摘除尾部（最早插入的）条目。
    pub fn pop_back(&mut self) -> Option<T> {
        let index = self.tail?;
        Some(self.unlink(index))
    }

    /// 按键摘除任意位置的条目；键已失效时返回 `None`。
    pub fn remove(&mut self, key: ListKey) -> Option<T> {
        if !self.contains(key) {
            return None;
        }
        Some(self.unlink(key.index))
    }

    pub fn contains(&self, key: ListKey) -> bool {
        self.slots.get(key.index).is_some_and(|slot| {
            slot.generation == key.generation && matches!(slot.entry, Entry::Occupied { .. })
        })
    }

    pub fn get(&self, key: ListKey) -> Option<&T> {
        if !self.contains(key) {
            return None;
        }
        self.value_at(key.index)
    }

    pub fn front(&self) -> Option<&T> {
        self.value_at(self.head?)
    }

    pub fn back(&self) -> Option<&T> {
        self.value_at(self.tail?)
    }

    /// 由头至尾遍历。
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// 清空链表；逐个摘除以保证旧键全部失效。
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    /// 链表为空时释放槽位数组；非空时无操作。
    pub fn shrink_to_fit(&mut self) {
        if !self.is_empty() {
            return;
        }
        // 新槽位从历史最大代数起步，旧键不会与之撞号。
        let highest = self.slots.iter().map(|slot| slot.generation).max();
        if let Some(highest) = highest {
            self.generation_floor = self.generation_floor.max(highest);
        }
        self.slots = Vec::new();
        self.free = None;
    }

    fn value_at(&self, index: usize) -> Option<&T> {
        match &self.slots.get(index)?.entry {
            Entry::Occupied { value, .. } => Some(value),
            Entry::Vacant { .. } => None,
        }
    }

    fn set_prev(&mut self, index: usize, prev: Option<usize>) {
        if let Entry::Occupied { prev: slot_prev, .. } = &mut self.slots[index].entry {
            *slot_prev = prev;
        }
    }

    fn set_next(&mut self, index: usize, next: Option<usize>) {
        if let Entry::Occupied { next: slot_next, .. } = &mut self.slots[index].entry {
            *slot_next = next;
        }
    }

    /// 摘除占用槽位并挂回自由链表，调用方已确认槽位处于占用状态。
    fn unlink(&mut self, index: usize) -> T {
        let vacant = Entry::Vacant {
            next_free: self.free,
        };
        let slot = &mut self.slots[index];
        let Entry::Occupied { value, prev, next } = mem::replace(&mut slot.entry, vacant) else {
            unreachable!("unlink 仅作用于占用槽位，调用方已保证状态");
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free = Some(index);

        match prev {
            Some(prev) => self.set_next(prev, next),
            None => self.head = next,
        }
        match next {
            Some(next) => self.set_prev(next, prev),
            None => self.tail = prev,
        }
        self.len -= 1;
        value
    }
}

/// [`RecycleList::iter`] 返回的迭代器。
#[derive(Debug)]
pub struct Iter<'a, T> {
    list: &'a RecycleList<T>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let index = self.cursor?;
        let list = self.list;
        match &list.slots[index].entry {
            Entry::Occupied { value, next, .. } => {
                self.cursor = *next;
                self.remaining -= 1;
                Some(value)
            }
            Entry::Vacant { .. } => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a RecycleList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
