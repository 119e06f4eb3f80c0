#![deny(unsafe_code)]
#![doc = "spark-executor: 遵循完成回调钩子协议的参考执行上下文。"]
#![doc = ""]
#![doc = "== 定位 =="]
#![doc = "执行上下文本身不属于组合层的职责，但组合层的保证只能经由一个真正查询钩子的上下文观测。"]
#![doc = "本 crate 提供两种宿主：单线程派发循环 [`LocalExecutor`] 与 Tokio 适配 `TokioExecutor`，"]
#![doc = "二者都通过 [`spark_handler::PendingCompletion`] 执行同一套分配、归还、调用协议；"]
#![doc = "另提供串行化调用器 [`Strand`]，演示挂在调用钩子上的调度策略如何穿透组合。"]
#![doc = ""]
#![doc = "== 特性开关 =="]
#![doc = "- `runtime-tokio`（默认启用）：提供 `TokioExecutor`。"]

mod config;
mod local;
mod strand;
#[cfg(feature = "runtime-tokio")]
mod tokio_executor;

pub use config::{ExecutorConfigError, ExecutorSettings};
pub use local::{ExecutorStats, LocalExecutor};
pub use strand::{Strand, Stranded};
#[cfg(feature = "runtime-tokio")]
pub use tokio_executor::TokioExecutor;
