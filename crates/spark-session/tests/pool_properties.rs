//! 会话池性质验证
//!
//! # 教案级注释概览
//!
//! - **核心目标 (Why)**：随机交错 `create`/`release`，验证池大小永不超过 `max_recycled`，
//!   并以影子模型（按 LIFO 维护的编号栈）核对每次复用取回的会话。
//! - **设计手法 (How)**：`Op::Create` 对应一次获取，`Op::Release(i)` 交还当前持有列表中的第 `i % len` 个句柄；
//!   模型在交还时仅于未满时压栈，获取时弹栈，二者必须与工厂的可观测行为逐步一致。

use proptest::prelude::*;
use spark_session::{
    EchoSession, EchoSessionConfig, RecyclingSessionFactory, SessionFactory, SessionHandle,
    SessionId,
};

#[derive(Debug, Clone)]
enum Op {
    Create,
    Release(usize),
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(
        prop_oneof![Just(Op::Create), any::<usize>().prop_map(Op::Release)],
        0..64,
    )
}

proptest! {
    #[test]
    fn prop_pool_respects_capacity_and_lifo(max_recycled in 0usize..6, plan in ops()) {
        let config = EchoSessionConfig {
            buffer_size: 16,
            max_transfer_size: 16,
            ..EchoSessionConfig::default()
        };
        let mut factory = RecyclingSessionFactory::<EchoSession<()>>::new((), max_recycled);
        let mut held: Vec<SessionHandle<EchoSession<()>>> = Vec::new();
        let mut model: Vec<SessionId> = Vec::new();

        for op in plan {
            match op {
                Op::Create => {
                    let handle = factory.create(&config).expect("小缓冲构造不应失败");
                    if let Some(expected) = model.pop() {
                        prop_assert_eq!(handle.id(), expected);
                    }
                    held.push(handle);
                }
                Op::Release(pick) => {
                    if held.is_empty() {
                        continue;
                    }
                    let handle = held.swap_remove(pick % held.len());
                    if model.len() < max_recycled {
                        model.push(handle.id());
                    }
                    factory.release(handle);
                    prop_assert!(factory.idle_count() <= max_recycled);
                }
            }
            prop_assert_eq!(factory.idle_count(), model.len());
        }

        let idle: Vec<_> = factory.idle_ids().collect();
        let expected: Vec<_> = model.iter().rev().copied().collect();
        prop_assert_eq!(idle, expected);
    }
}
