pub mod ids;
pub mod json;
pub mod rjafroc;
pub mod summary;

pub use ids::IdInterner;
pub use json::write_json;
pub use rjafroc::{FpRow, LesionRow, RaterRow, RjafrocReport, TpRow, TruthRow};
pub use summary::{RaterSummary, Summary};

/// Version of the JSON report layout.
pub const SCHEMA_VERSION: u32 = 1;
