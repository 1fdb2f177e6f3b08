#![forbid(unsafe_code)]

pub mod auth;
pub mod http;
pub mod memory;
pub mod repository;

pub use auth::{SessionProvider, StaticSession};
pub use http::{ApiConfig, ConfigError, HttpBackend, HttpInitError};
pub use memory::InMemoryBackend;
pub use repository::{
    Backend, LessonRepository, ModuleRecord, ProgressRepository, RoadmapContentRecord,
    RoadmapRecord, RoadmapRepository, StorageError,
};
