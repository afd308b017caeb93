//! # Catalog OCR
//!
//! 把多页 PDF 商品目录逐页交给文档 AI 服务，抽取结构化商品数据
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只暴露能力
//! - `PdfSplitter` - 把多页 PDF 拆成单页，每页一个临时文件
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - 与外部系统交互
//! - `DocumentAiClient` - 上传单页 PDF 和 schema，取回结构化结果
//! - `DocumentExtractor` - 抽取能力的抽象，测试时可替换
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个页面
//! - `PageProcessor` - 处理一页，所有失败都转成数据
//! - `ResultWriter` - 写输出目录
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，管理并发和汇总
//! - `orchestrator/single_processor` - 单文档处理器，一次调用一个结果
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use clients::{DocumentAiClient, DocumentExtractor, ExtractError};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::PdfSplitter;
pub use models::{BatchRun, ErrorKind, PageArtifact, PageResult, PageStatus, SourceDocument};
pub use orchestrator::{process_single, run_batch, App};
pub use services::{PageProcessor, ResultWriter, RetryPolicy};
