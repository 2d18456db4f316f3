//! 通知处理管道
//!
//! 五个阶段：提取（extract）→ 关联（mapper/matcher）→ 合并
//! （combine）→ 组装（assembler）→ 派发（dispatch），由 pipeline
//! 编排成实时与汇总两条运行路径。

pub mod assembler;
pub mod combine;
pub mod dispatch;
pub mod extract;
pub mod mapper;
pub mod matcher;
pub mod pipeline;

pub use assembler::assemble;
pub use combine::{combine_all, Combinable, CombineOutcome};
pub use dispatch::DispatchGateway;
pub use extract::DetailExtractor;
pub use mapper::{JobAssociation, JobNotificationMapper, MappingResult};
pub use matcher::JobFilterMatcher;
pub use pipeline::{JobLockRegistry, NotificationPipeline};
