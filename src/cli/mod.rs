//! CLI command handling

pub mod options;
pub mod output;
pub mod run;
pub mod tokens;

pub use options::*;
pub use output::*;
pub use run::*;
pub use tokens::*;

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::infra::store::{ensure_defaults, FileConfigStore};

/// 选项文件位置
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// 选项文件路径 (默认: ~/.config/weechatrn-push/options.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

impl StoreArgs {
    /// 打开选项存储并写入缺省值
    pub fn open(&self) -> Result<FileConfigStore> {
        let path = self
            .config
            .clone()
            .unwrap_or_else(FileConfigStore::default_path);
        let mut store = FileConfigStore::open(path)?;
        ensure_defaults(&mut store)?;
        Ok(store)
    }
}
