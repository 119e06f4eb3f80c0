use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::{
    affinity::ThreadAffinity,
    arena::{ListKey, RecycleList},
    config::FactorySettings,
    error::SessionError,
    session::{Session, SessionHandle, SessionId},
};

/// `SessionFactory` 约定会话的获取与交还。
///
/// # 契约说明（What）
/// - [`create`](Self::create)：返回一个独占会话，失败时只可能是内存不足；
/// - [`release`](Self::release)：交还会话，永不失败；工厂自行决定保留或销毁；
/// - 两者都以 `&mut self` 调用：工厂属于单一逻辑所有者，不做内部加锁。
pub trait SessionFactory {
    type Session: Session;

    fn create(
        &mut self,
        config: &<Self::Session as Session>::Config,
    ) -> Result<SessionHandle<Self::Session>, SessionError>;

    fn release(&mut self, handle: SessionHandle<Self::Session>);
}

/// 会话工厂的运行期快照。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FactoryStats {
    /// 当前空闲上限。
    pub max_recycled: usize,
    /// 池中空闲会话数。
    pub idle: usize,
    /// 新构造的会话数。
    pub constructed: u64,
    /// 由池复用的会话数。
    pub reused: u64,
    /// 交还后保留入池的次数。
    pub recycled: u64,
    /// 交还、收缩或重置失败时销毁的会话数。
    pub discarded: u64,
    /// `create` 因内存不足失败的次数。
    pub allocation_failures: u64,
}

/// `RecyclingSessionFactory` 以 LIFO 空闲池复用会话，池大小受 `max_recycled` 约束。
///
/// # 设计背景（Why）
/// - 连接接入路径上，会话的构造与销毁频繁发生；保留少量最近交还的会话可以显著降低堆抖动；
/// - 选择 LIFO：最近交还的会话其内存最可能仍在缓存中，而池尾的冷会话在收缩时最先被淘汰。
///
/// # 逻辑解析（How）
/// - 空闲会话存放于 [`RecycleList`]，头部插入、头部取出；收缩从尾部淘汰；
/// - `release` 记下入池返回的 [`ListKey`]，[`evict`](Self::evict) 据此按编号 O(1) 摘除任意空闲会话；
/// - `create` 优先弹出头部会话并按新配置 [`reset`](Session::reset)，池空时才调用
///   [`construct`](Session::construct)；
/// - `release` 仅在池未满时入池，否则直接销毁；容量只在 `release` 时检查。
///
/// # 契约说明（What）
/// - 任一会话要么在池中，要么被恰好一个调用方持有；
/// - 构造失败时池保持不变，复用会话重置失败时该会话被销毁，二者都返回
///   [`SessionError::NotEnoughMemory`]；
/// - 工厂不校验交还的句柄是否源自自身；
/// - 调试构建下，每次操作都会断言调用线程为工厂所属线程（见 [`ThreadAffinity`]）。
///
/// # 风险提示（Trade-offs）
/// - 统计计数为普通整数：工厂本身单线程使用，无需原子开销。
#[derive(Debug)]
pub struct RecyclingSessionFactory<S>
where
    S: Session,
{
    context: S::Context,
    recycled: RecycleList<SessionHandle<S>>,
    idle_index: HashMap<SessionId, ListKey>,
    max_recycled: usize,
    affinity: ThreadAffinity,
    next_id: u64,
    stats: FactoryStats,
}

impl<S> RecyclingSessionFactory<S>
where
    S: Session,
{
    /// 以执行上下文与空闲上限构造工厂。
    pub fn new(context: S::Context, max_recycled: usize) -> Self {
        Self {
            context,
            recycled: RecycleList::with_capacity(max_recycled.min(1024)),
            idle_index: HashMap::new(),
            max_recycled,
            affinity: ThreadAffinity::current(),
            next_id: 0,
            stats: FactoryStats::default(),
        }
    }

    pub fn from_settings(context: S::Context, settings: &FactorySettings) -> Self {
        Self::new(context, settings.max_recycled)
    }

    /// 会话所属的执行上下文。
    pub fn context(&self) -> &S::Context {
        &self.context
    }

    pub fn max_recycled(&self) -> usize {
        self.max_recycled
    }

    /// 池中空闲会话数。
    pub fn idle_count(&self) -> usize {
        self.recycled.len()
    }

    /// 由最近到最早列出空闲会话的编号。
    pub fn idle_ids(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.recycled.iter().map(SessionHandle::id)
    }

    /// 调整空闲上限；调低时从最冷端淘汰直至满足新上限，返回淘汰数。
    pub fn set_max_recycled(&mut self, max_recycled: usize) -> usize {
        self.affinity.check("set_max_recycled");
        self.max_recycled = max_recycled;
        let mut evicted = 0;
        while self.recycled.len() > max_recycled {
            if let Some(handle) = self.recycled.pop_back() {
                self.idle_index.remove(&handle.id());
                trace!(session_id = handle.id().get(), "evicting cold idle session");
                drop(handle);
                evicted += 1;
            }
        }
        self.stats.discarded += evicted as u64;
        if evicted > 0 {
            debug!(evicted, max_recycled, "idle sessions trimmed to new ceiling");
        }
        evicted
    }

    /// 销毁全部空闲会话并释放池的簿记内存，返回销毁数。
    pub fn shrink_to_fit(&mut self) -> usize {
        self.affinity.check("shrink_to_fit");
        let released = self.recycled.len();
        self.recycled.clear();
        self.recycled.shrink_to_fit();
        self.idle_index = HashMap::new();
        self.stats.discarded += released as u64;
        debug!(released, "idle session pool drained");
        released
    }

    /// 销毁指定编号的空闲会话；会话不在池中时返回 `false`。
    pub fn evict(&mut self, id: SessionId) -> bool {
        self.affinity.check("evict");
        let Some(key) = self.idle_index.remove(&id) else {
            return false;
        };
        match self.recycled.remove(key) {
            Some(handle) => {
                drop(handle);
                self.stats.discarded += 1;
                trace!(session_id = id.get(), "idle session evicted");
                true
            }
            None => false,
        }
    }

    pub fn statistics(&self) -> FactoryStats {
        FactoryStats {
            max_recycled: self.max_recycled,
            idle: self.recycled.len(),
            ..self.stats
        }
    }

    /// 将工厂迁移到调用线程。
    pub fn rebind_affinity(&mut self) {
        self.affinity.rebind();
    }

    fn allocate_id(&mut self) -> SessionId {
        let id = SessionId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }
}

impl<S> SessionFactory for RecyclingSessionFactory<S>
where
    S: Session,
{
    type Session = S;

    fn create(&mut self, config: &S::Config) -> Result<SessionHandle<S>, SessionError> {
        self.affinity.check("create");

        if let Some(mut handle) = self.recycled.pop_front() {
            let id = handle.id();
            self.idle_index.remove(&id);
            return match handle.reset(config) {
                Ok(()) => {
                    self.stats.reused += 1;
                    trace!(
                        session_id = id.get(),
                        idle = self.recycled.len(),
                        "reusing recycled session"
                    );
                    Ok(handle)
                }
                Err(failure) => {
                    drop(handle);
                    self.stats.discarded += 1;
                    self.stats.allocation_failures += 1;
                    warn!(
                        session_id = id.get(),
                        requested = failure.requested,
                        "recycled session could not be reconfigured; discarded"
                    );
                    Err(SessionError::from(failure))
                }
            };
        }

        match S::construct(&self.context, config) {
            Ok(session) => {
                let id = self.allocate_id();
                self.stats.constructed += 1;
                debug!(session_id = id.get(), "constructed new session");
                Ok(SessionHandle::new(id, session))
            }
            Err(failure) => {
                self.stats.allocation_failures += 1;
                warn!(
                    requested = failure.requested,
                    "session construction failed: not enough memory"
                );
                Err(SessionError::from(failure))
            }
        }
    }

    fn release(&mut self, handle: SessionHandle<S>) {
        self.affinity.check("release");

        if self.recycled.len() < self.max_recycled {
            let id = handle.id();
            trace!(session_id = id.get(), "session recycled");
            let key = self.recycled.push_front(handle);
            self.idle_index.insert(id, key);
            self.stats.recycled += 1;
        } else {
            debug!(
                session_id = handle.id().get(),
                max_recycled = self.max_recycled,
                "idle pool full; session discarded"
            );
            drop(handle);
            self.stats.discarded += 1;
        }
    }
}
