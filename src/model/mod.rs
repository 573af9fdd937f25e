//! 实体模型模块
//!
//! 索引键构造与实体模型。实体模型只通过 [`crate::conn::CachedConn`] 的四个原语
//! 读写，不直接访问缓存。

pub mod keys;
pub mod traits;

#[cfg(feature = "sqlite-support")]
pub mod student;
#[cfg(feature = "sqlite-support")]
pub mod user;

pub use keys::{CACHE_KEY_NAMESPACE, IndexKeySet, KeyPrefix};
pub use traits::IndexedRecord;

#[cfg(feature = "sqlite-support")]
pub use student::{Student, StudentModel};
#[cfg(feature = "sqlite-support")]
pub use user::{User, UserModel};
