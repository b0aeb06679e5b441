mod bad_triangles;
mod handles;
mod hint_generator;
mod insertion;
mod refinement;
mod store;
pub(crate) mod store_operations;

pub(crate) mod math;

pub use store::{TriangleStore, VertexKind};
pub(crate) use store::RegionEntry;

pub use hint_generator::LastUsedTriangleHintGenerator;
pub use insertion::{InsertionOutcome, PointLocation};

pub use refinement::{AngleLimit, RefinementParameters, RefinementResult, SteinerLimit};

pub use handles::*;
