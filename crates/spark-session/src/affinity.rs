#[cfg(debug_assertions)]
use std::thread::{self, ThreadId};

/// 记录并校验工厂的所属线程。
///
/// # 设计背景（Why）
/// - 会话工厂没有内部锁，`&mut self` 已在编译期排除并发调用；但工厂仍可能被 `Send`
///   到另一个执行上下文后继续使用，这会让会话与其执行上下文错位。
/// - 调试构建下在每次操作时断言调用线程，尽早暴露错位；发布构建不保留任何状态。
///
/// # 契约说明（What）
/// - 构造时记录当前线程；[`check`](Self::check) 在调试构建下于线程不符时 panic；
/// - 确需迁移时调用 [`rebind`](Self::rebind) 显式改换所属线程。
#[derive(Debug, Clone)]
pub struct ThreadAffinity {
    #[cfg(debug_assertions)]
    owner: ThreadId,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

impl ThreadAffinity {
    /// 以调用线程为所属线程。
    pub fn current() -> Self {
        Self {
            #[cfg(debug_assertions)]
            owner: thread::current().id(),
        }
    }

    /// 断言调用线程为所属线程，`operation` 用于 panic 信息。
    #[track_caller]
    pub fn check(&self, operation: &'static str) {
        #[cfg(debug_assertions)]
        {
            let caller = thread::current().id();
            assert!(
                caller == self.owner,
                "{operation} called from {caller:?}, but the factory is owned by {:?}",
                self.owner
            );
        }
        #[cfg(not(debug_assertions))]
        let _ = operation;
    }

    /// 调用线程是否为所属线程；发布构建恒为 `true`。
    pub fn is_owner(&self) -> bool {
        #[cfg(debug_assertions)]
        {
            thread::current().id() == self.owner
        }
        #[cfg(not(debug_assertions))]
        {
            true
        }
    }

    /// 改以调用线程为所属线程。
    pub fn rebind(&mut self) {
        #[cfg(debug_assertions)]
        {
            self.owner = thread::current().id();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_thread_passes() {
        let affinity = ThreadAffinity::current();
        affinity.check("create");
        assert!(affinity.is_owner());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn foreign_thread_is_detected_and_rebind_rehomes() {
        let affinity = ThreadAffinity::current();
        let outcome = std::thread::spawn(move || {
            assert!(!affinity.is_owner());
            let mut moved = affinity;
            moved.rebind();
            moved.check("release");
            moved.is_owner()
        })
        .join()
        .expect("子线程不应 panic");
        assert!(outcome);
    }
}
