#![deny(unsafe_code)]
#![doc = "spark-session: 连接会话的池化工厂。"]
#![doc = ""]
#![doc = "== 定位 =="]
#![doc = "接入路径上的会话构造代价较高，工厂以有界 LIFO 空闲池复用最近交还的会话，"]
#![doc = "并保证任一会话要么在池中、要么被恰好一个调用方独占持有。"]
#![doc = ""]
#![doc = "== 模块划分 =="]
#![doc = "- `session`：会话能力契约 [`Session`] 与独占句柄 [`SessionHandle`]；"]
#![doc = "- `factory`：[`SessionFactory`] 契约及其池化实现 [`RecyclingSessionFactory`]；"]
#![doc = "- `arena`：承载空闲池的槽位链表 [`RecycleList`]；"]
#![doc = "- `affinity`：调试构建下的所属线程校验；"]
#![doc = "- `config` / `error`：TOML 配置与稳定错误码；"]
#![doc = "- `echo`：参考会话实现。"]

//! # 使用示例
//!
//! ```rust
//! use spark_session::{
//!     EchoSession, EchoSessionConfig, RecyclingSessionFactory, SessionFactory,
//! };
//!
//! let mut factory = RecyclingSessionFactory::<EchoSession<()>>::new((), 2);
//! let config = EchoSessionConfig::default();
//!
//! let first = factory.create(&config).expect("构造应成功");
//! let id = first.id();
//! factory.release(first);
//!
//! let again = factory.create(&config).expect("复用应成功");
//! assert_eq!(again.id(), id, "池非空时复用最近交还的会话");
//! ```

mod affinity;
mod arena;
mod config;
mod echo;
mod error;
mod factory;
mod session;

pub use affinity::ThreadAffinity;
pub use arena::{Iter, ListKey, RecycleList};
pub use config::{DEFAULT_MAX_RECYCLED, EchoServerSettings, EchoSessionConfig, FactorySettings};
pub use echo::EchoSession;
pub use error::{AllocationFailure, ConfigError, SessionError};
pub use factory::{FactoryStats, RecyclingSessionFactory, SessionFactory};
pub use session::{Session, SessionHandle, SessionId};
