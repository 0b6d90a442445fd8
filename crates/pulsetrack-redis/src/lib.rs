//! `TtlStore` implementations: the Redis-backed production store and an
//! in-process store for tests and single-node fallback.

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;
