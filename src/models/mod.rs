pub mod batch;
pub mod page;
pub mod schema;

pub use batch::BatchRun;
pub use page::{ErrorKind, PageArtifact, PageError, PageResult, PageStatus, SourceDocument};
