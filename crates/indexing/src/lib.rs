pub mod chunker;
pub mod cleaner;
pub mod display_name;
pub mod embedder;
pub mod mdl;
pub mod pipeline;
pub mod watcher;
pub mod writer;

pub use cleaner::DocumentCleaner;
pub use display_name::clean_display_name;
pub use embedder::{embedder_from_config, DocumentEmbedder, Embedder, FastEmbedder, OllamaEmbedder};
pub use mdl::{validate_mdl, Mdl};
pub use pipeline::{IndexingOptions, IndexingOptionsBuilder, IndexingPipeline, IndexingReport};
pub use watcher::{MdlEvent, MdlWatcher};
pub use writer::{AsyncDocumentWriter, WriteReport};
