pub mod page_processor;
pub mod result_writer;

pub use page_processor::{PageProcessor, RetryPolicy};
pub use result_writer::ResultWriter;
