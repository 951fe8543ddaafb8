// Infrastructure - store boundary, identity verification and request context
pub mod batch;               // Chunked fan-out over bounded store calls
pub mod database;            // Document store interface and query model
pub mod identity;            // Token gate and identity verifiers
pub mod memory_database;     // In-process store
pub mod middleware;          // Viewer context middleware and extractor
pub mod sqlite_database;     // SQLite store
pub mod viewer;              // Principal and request-scoped viewer context

pub use database::{Direction, DocumentStore, Filter, Query, StoredDocument};
pub use identity::{IdentityVerifier, JwtVerifier, TokenGate, VerifiedIdentity};
pub use memory_database::MemoryStore;
pub use middleware::Vc;
pub use sqlite_database::SqliteStore;
pub use viewer::{Principal, ViewerContext};
