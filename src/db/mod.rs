pub mod file;
pub mod redis;
pub mod session;
pub mod store;

pub use file::FileStore;
pub use self::redis::{create_redis_client, RedisStore};
pub use session::SessionStore;
pub use store::{CacheKey, CacheStore};
