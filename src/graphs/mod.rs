mod adjacency;
pub use adjacency::*;
