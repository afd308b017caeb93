//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量页面处理器
//! - 管理应用生命周期（初始化、运行）
//! - 拆分源 PDF（Vec<PageArtifact>）
//! - 控制并发数量（Semaphore）
//! - 逐页落盘，全部完成后写汇总
//! - 输出全局统计信息
//!
//! ### `single_processor` - 单文档处理器
//! - 不拆分，整份文档一次调用
//! - 直接返回结果，不写输出目录
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<PageArtifact>)     single_processor (处理一个文档)
//!     ↓                                          ↓
//! services (能力层：page_processor / result_writer)
//!     ↓
//! clients (文档 AI) / infrastructure (PdfSplitter)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管批量，single_processor 管单个
//! 2. **故障隔离**：单页失败是数据，不是异常
//! 3. **向下依赖**：编排层 → services → clients / infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不解析抽取结果

pub mod batch_processor;
pub mod single_processor;

// 重新导出主要类型
pub use batch_processor::{run_batch, App};
pub use single_processor::process_single;
