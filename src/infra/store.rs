//! 选项存储 - 宿主配置的持久化接口
//!
//! 文件实现把所有选项保存为一个 JSON 对象（选项名 → 字符串值），
//! 写入时持有独占锁，在锁内重新读取文件，只合并本次修改的选项，
//! 然后通过临时文件原子替换。多个进程（桥接循环和 CLI）可以共用同一个文件。

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::options::OPTION_DEFAULTS;

/// 选项持久化接口
pub trait ConfigStore {
    /// 读取选项，未设置时返回 None
    fn get(&self, option: &str) -> Option<String>;

    /// 写入选项
    fn set(&mut self, option: &str, value: &str) -> Result<()>;

    /// 基于最新存储值的读-改-写
    ///
    /// `f` 收到当前值，返回 `None` 表示不写入。返回操作后的值。
    /// 文件实现在独占锁内完成整个过程。
    fn update(
        &mut self,
        option: &str,
        f: &mut dyn FnMut(Option<&str>) -> Option<String>,
    ) -> Result<Option<String>> {
        let current = self.get(option);
        match f(current.as_deref()) {
            Some(value) => {
                self.set(option, &value)?;
                Ok(Some(value))
            }
            None => Ok(current),
        }
    }

    /// 从底层存储重新读取，内存实现无需处理
    fn reload(&mut self) -> Result<()> {
        Ok(())
    }

    /// 选项是否已设置
    fn is_set(&self, option: &str) -> bool {
        self.get(option).is_some()
    }
}

/// 为未设置的选项写入默认值
pub fn ensure_defaults(store: &mut dyn ConfigStore) -> Result<()> {
    for option in OPTION_DEFAULTS {
        if !store.is_set(option.name) {
            debug!(option = option.name, default = option.default, "Writing default option");
            store.set(option.name, option.default)?;
        }
    }
    Ok(())
}

/// 选项文件内容
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct OptionsFile {
    #[serde(default)]
    options: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// 基于 JSON 文件的选项存储
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    cache: BTreeMap<String, String>,
}

impl FileConfigStore {
    /// 默认路径：~/.config/weechatrn-push/options.json
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("weechatrn-push")
            .join("options.json")
    }

    /// 打开存储，文件不存在时视为空
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = read_options(&path)?;
        Ok(Self { path, cache })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 在独占锁内读取最新文件、修改单个选项并写回
    fn locked_update(
        &mut self,
        option: &str,
        f: &mut dyn FnMut(Option<&str>) -> Option<String>,
    ) -> Result<Option<String>> {
        use fs2::FileExt;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_path = self.path.with_extension("lock");
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        lock.lock_exclusive()?;

        let result = self.update_under_lock(option, f);

        lock.unlock()?;
        result
    }

    fn update_under_lock(
        &mut self,
        option: &str,
        f: &mut dyn FnMut(Option<&str>) -> Option<String>,
    ) -> Result<Option<String>> {
        // 其他进程可能在我们打开之后写过文件
        let mut options = read_options(&self.path)?;
        let current = options.get(option).cloned();

        let value = match f(current.as_deref()) {
            Some(value) => value,
            None => {
                self.cache = options;
                return Ok(current);
            }
        };

        options.insert(option.to_string(), value.clone());
        let file = OptionsFile {
            options,
            updated_at: Some(Utc::now()),
        };

        let temp_path = self.path.with_extension("tmp");
        {
            let temp_file = File::create(&temp_path)?;
            serde_json::to_writer_pretty(temp_file, &file)?;
        }
        fs::rename(&temp_path, &self.path)?;

        self.cache = file.options;
        Ok(Some(value))
    }
}

/// 读取选项文件，不存在或为空时返回空表
fn read_options(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read options file {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let file: OptionsFile = serde_json::from_str(&content)
        .with_context(|| format!("Invalid options file {}", path.display()))?;
    Ok(file.options)
}

impl ConfigStore for FileConfigStore {
    fn get(&self, option: &str) -> Option<String> {
        self.cache.get(option).cloned()
    }

    fn set(&mut self, option: &str, value: &str) -> Result<()> {
        self.update(option, &mut |_| Some(value.to_string()))?;
        Ok(())
    }

    fn update(
        &mut self,
        option: &str,
        f: &mut dyn FnMut(Option<&str>) -> Option<String>,
    ) -> Result<Option<String>> {
        self.locked_update(option, f)
            .with_context(|| format!("Failed to write options file {}", self.path.display()))
    }

    fn reload(&mut self) -> Result<()> {
        self.cache = read_options(&self.path)?;
        Ok(())
    }
}

/// 内存存储，clone 后共享同一份数据
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    inner: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用初始选项创建
    pub fn with_option(self, option: &str, value: &str) -> Self {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(option.to_string(), value.to_string());
        }
        self
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, option: &str) -> Option<String> {
        self.inner.lock().ok()?.get(option).cloned()
    }

    fn set(&mut self, option: &str, value: &str) -> Result<()> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        map.insert(option.to_string(), value.to_string());
        Ok(())
    }

    fn update(
        &mut self,
        option: &str,
        f: &mut dyn FnMut(Option<&str>) -> Option<String>,
    ) -> Result<Option<String>> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        let current = map.get(option).cloned();
        match f(current.as_deref()) {
            Some(value) => {
                map.insert(option.to_string(), value.clone());
                Ok(Some(value))
            }
            None => Ok(current),
        }
    }
}
