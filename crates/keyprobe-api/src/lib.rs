// ABOUTME: Directory service client for keyprobe
// ABOUTME: KeyDirectory trait with HTTP and in-memory implementations

pub mod directory;
pub mod error;
pub mod http;
pub mod memory;
pub mod model;

pub use directory::KeyDirectory;
pub use error::{ApiError, Result};
pub use http::{HttpDirectory, DEFAULT_API_URL, DEFAULT_PAGE_SIZE};
pub use memory::MemoryDirectory;
pub use model::{KeyCreateRequest, KeyId, KeyRecord};
