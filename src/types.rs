pub mod feedback;
pub mod function;
pub mod indexes;

pub use feedback::EventFeedback;
pub use function::{Cache, FunctionConfiguration, FunctionInfo};
pub use indexes::{Document, Filter, FilterOp, FilterValue, Index, RetrievalResponse, Scalar};
