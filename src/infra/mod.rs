//! 基础设施层 - 选项持久化

pub mod store;

pub use store::{ensure_defaults, ConfigStore, FileConfigStore, MemoryConfigStore};
