mod bucket_tree;
pub use bucket_tree::*;

mod queries;
pub use queries::*;

mod task;
pub use task::*;
