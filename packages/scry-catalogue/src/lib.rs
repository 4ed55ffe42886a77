//! On-disk catalogue loading and the in-memory vector store.

mod error;
mod item;
mod loader;
mod store;

pub use error::{Error, Result};
pub use item::CatalogueItem;
pub use loader::{CATALOGUE_FILE, embeddings_file, load_catalogue, load_embeddings, load_store};
pub use store::{ItemStore, VectorIndex, cmp_f32_desc};
