pub mod connection_pool;
pub mod document_store;
mod queries;

pub use connection_pool::ConnectionPool;
pub use document_store::SqliteDocumentStore;
