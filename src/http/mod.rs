pub mod orderedheaders;
pub mod requestbody;
pub mod streamfactory;
pub mod transaction;

// Re-exports for convenience
pub use orderedheaders::OrderedHeaderMap;
pub use requestbody::RequestBody;
pub use streamfactory::{HttpStream, HttpStreamFactory, Transport};
pub use transaction::{HttpNetworkTransaction, TransactionDelegate};
