//! 基础设施层
//!
//! 只暴露能力，不关心批次和结果

pub mod pdf_splitter;

pub use pdf_splitter::PdfSplitter;
