pub mod json_path;
pub mod memory;
pub mod payload;
pub mod qdrant;
pub mod store;

pub use json_path::{parse_json_path, JsonPathItem};
pub use memory::InMemoryDocumentStore;
pub use payload::set_value_by_key;
pub use qdrant::QdrantDocumentStore;
pub use store::{Condition, DocumentStore, DuplicatePolicy, MetadataFilter};
