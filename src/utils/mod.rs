mod multi_index;
pub use multi_index::*;
