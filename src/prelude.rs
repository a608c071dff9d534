/// Re-export decompositions.
pub use crate::decompositions::*;
/// Re-export errors.
pub use crate::error::*;
/// Re-export graphs.
pub use crate::graphs::*;
/// Re-export inference.
pub use crate::inference::*;
/// Re-export ordering.
pub use crate::ordering::*;
/// Re-export semirings.
pub use crate::semirings::*;
/// Re-export tables.
pub use crate::tables::*;
/// Re-export types.
pub use crate::types::*;
/// Re-export utils.
pub use crate::utils::*;
