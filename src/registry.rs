//! Token 注册表 - 维护可接收推送的设备列表
//!
//! 每次修改都在存储的最新值上进行并立即写回完整序列，没有单独的 dirty 标记，
//! 同一个选项文件可以被桥接进程和 CLI 同时修改。
//! 发送请求时使用 [`TokenSnapshot`]，响应回来后按同一快照解释，
//! 不依赖可能已经变化的实时序列。

use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::infra::store::ConfigStore;
use crate::options::{join_tokens, split_tokens, PUSH_TOKENS, TOKEN_DELIMITER};

/// 设备 push token
pub type Token = String;

/// 某一时刻 token 序列的不可变副本
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenSnapshot(Arc<[Token]>);

impl TokenSnapshot {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self(tokens.into())
    }

    pub fn tokens(&self) -> &[Token] {
        &self.0
    }
}

impl Deref for TokenSnapshot {
    type Target = [Token];

    fn deref(&self) -> &[Token] {
        &self.0
    }
}

impl From<Vec<Token>> for TokenSnapshot {
    fn from(tokens: Vec<Token>) -> Self {
        Self::new(tokens)
    }
}

/// Token 注册表
pub struct TokenRegistry {
    tokens: Vec<Token>,
    store: Box<dyn ConfigStore>,
}

impl TokenRegistry {
    /// 从存储中加载 token 序列
    pub fn load(store: Box<dyn ConfigStore>) -> Self {
        let tokens = store
            .get(PUSH_TOKENS)
            .map(|raw| split_tokens(&raw))
            .unwrap_or_default();
        debug!(count = tokens.len(), "Loaded push tokens");
        Self { tokens, store }
    }

    /// 追加 token（已存在则忽略）
    ///
    /// 包含分隔符的 token 会被拒绝，否则持久化后会被拆成两个无效 token。
    pub fn add(&mut self, token: &str) -> bool {
        let token = token.trim();
        if token.is_empty() {
            return false;
        }
        if token.contains(TOKEN_DELIMITER) {
            warn!(token = %token, "Rejecting push token containing delimiter");
            return false;
        }

        let added = self.mutate(|tokens| {
            if tokens.iter().any(|t| t == token) {
                return false;
            }
            tokens.push(token.to_string());
            true
        });

        if added {
            info!(token = %token, count = self.tokens.len(), "Registered push token");
        } else {
            debug!(token = %token, "Push token already registered");
        }
        added
    }

    /// 整体替换 token 序列
    pub fn replace_all(&mut self, tokens: Vec<Token>) {
        self.mutate(|current| {
            *current = tokens.clone();
            true
        });
    }

    /// 当前序列的快照
    pub fn snapshot(&self) -> TokenSnapshot {
        TokenSnapshot::new(self.tokens.clone())
    }

    /// 删除快照中 `index` 位置的 token
    ///
    /// 按值在实时序列中查找，越界或已不存在时为 no-op。
    pub fn remove_at(&mut self, snapshot: &TokenSnapshot, index: usize) -> bool {
        match snapshot.get(index) {
            Some(token) => self.remove(token),
            None => false,
        }
    }

    /// 按值删除 token
    pub fn remove(&mut self, token: &str) -> bool {
        let removed = self.remove_all(&[token.to_string()]);
        removed > 0
    }

    /// 一次写入中按值删除多个 token，返回删除的条目数
    ///
    /// 基于存储中的最新序列计算，其他进程在此期间追加的 token 会保留。
    pub fn remove_all(&mut self, flagged: &[Token]) -> usize {
        let mut removed = 0;
        self.mutate(|tokens| {
            let before = tokens.len();
            tokens.retain(|t| !flagged.contains(t));
            removed = before - tokens.len();
            removed > 0
        });
        if removed > 0 {
            info!(removed, count = self.tokens.len(), "Removed push tokens");
        }
        removed
    }

    /// 从存储重新读取序列，发送前调用以包含其他进程注册的 token
    pub fn refresh(&mut self) {
        if let Err(e) = self.store.reload() {
            warn!(error = %e, "Failed to reload push tokens");
            return;
        }
        self.tokens = self
            .store
            .get(PUSH_TOKENS)
            .map(|raw| split_tokens(&raw))
            .unwrap_or_default();
    }

    /// 底层选项存储
    pub fn store_mut(&mut self) -> &mut dyn ConfigStore {
        self.store.as_mut()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// 在存储的最新序列上执行修改，有变化时写回
    ///
    /// 存储不可用时退回到内存序列，保证当前进程内的行为一致。
    fn mutate(&mut self, mut f: impl FnMut(&mut Vec<Token>) -> bool) -> bool {
        let mut changed = false;
        let result = self.store.update(PUSH_TOKENS, &mut |current| {
            let mut tokens = current.map(split_tokens).unwrap_or_default();
            changed = f(&mut tokens);
            changed.then(|| join_tokens(&tokens))
        });

        match result {
            Ok(value) => {
                self.tokens = value.as_deref().map(split_tokens).unwrap_or_default();
                changed
            }
            Err(e) => {
                warn!(error = %e, "Failed to persist push tokens");
                f(&mut self.tokens)
            }
        }
    }
}

impl std::fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRegistry")
            .field("tokens", &self.tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::store::MemoryConfigStore;

    fn registry_with(raw: &str) -> (TokenRegistry, MemoryConfigStore) {
        let store = MemoryConfigStore::new().with_option(PUSH_TOKENS, raw);
        let registry = TokenRegistry::load(Box::new(store.clone()));
        (registry, store)
    }

    #[test]
    fn test_load_from_store() {
        let (registry, _) = registry_with("t1,t2,t3");
        assert_eq!(registry.tokens(), &["t1", "t2", "t3"]);

        let (empty, _) = registry_with("");
        assert!(empty.is_empty());

        let unset = TokenRegistry::load(Box::new(MemoryConfigStore::new()));
        assert!(unset.is_empty());
    }

    #[test]
    fn test_add_is_idempotent() {
        let (mut registry, store) = registry_with("");

        assert!(registry.add("ExponentPushToken[abc]"));
        assert!(!registry.add("ExponentPushToken[abc]"));

        assert_eq!(registry.tokens(), &["ExponentPushToken[abc]"]);
        assert_eq!(store.get(PUSH_TOKENS), Some("ExponentPushToken[abc]".to_string()));
    }

    #[test]
    fn test_add_appends_and_persists() {
        let (mut registry, store) = registry_with("t1");
        registry.add("  t2 ");
        assert_eq!(registry.tokens(), &["t1", "t2"]);
        assert_eq!(store.get(PUSH_TOKENS), Some("t1,t2".to_string()));
    }

    #[test]
    fn test_add_ignores_empty_and_delimited() {
        let (mut registry, store) = registry_with("t1");
        assert!(!registry.add("   "));
        assert!(!registry.add("a,b"));
        assert_eq!(registry.tokens(), &["t1"]);
        // 没有修改就不写回
        assert_eq!(store.get(PUSH_TOKENS), Some("t1".to_string()));
    }

    #[test]
    fn test_replace_all_persists() {
        let (mut registry, store) = registry_with("t1,t2");
        registry.replace_all(vec!["t3".to_string()]);
        assert_eq!(registry.tokens(), &["t3"]);
        assert_eq!(store.get(PUSH_TOKENS), Some("t3".to_string()));
    }

    #[test]
    fn test_snapshot_is_stable() {
        let (mut registry, _) = registry_with("t1,t2");
        let snapshot = registry.snapshot();
        registry.add("t3");
        assert_eq!(snapshot.tokens(), &["t1", "t2"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_remove_at_uses_snapshot_value() {
        let (mut registry, store) = registry_with("t1,t2,t3");
        let snapshot = registry.snapshot();

        // 快照之后实时序列发生变化，索引已经漂移
        registry.replace_all(vec!["t0".into(), "t1".into(), "t2".into(), "t3".into()]);

        assert!(registry.remove_at(&snapshot, 1));
        assert_eq!(registry.tokens(), &["t0", "t1", "t3"]);
        assert_eq!(store.get(PUSH_TOKENS), Some("t0,t1,t3".to_string()));
    }

    #[test]
    fn test_remove_at_missing_is_noop() {
        let (mut registry, _) = registry_with("t1,t2");
        let snapshot = registry.snapshot();
        registry.remove("t2");

        assert!(!registry.remove_at(&snapshot, 1));
        assert!(!registry.remove_at(&snapshot, 7));
        assert_eq!(registry.tokens(), &["t1"]);
    }

    #[test]
    fn test_remove_all_single_write() {
        let (mut registry, store) = registry_with("t1,t2,t1,t3");
        assert_eq!(registry.remove_all(&["t1".to_string(), "t9".to_string()]), 2);
        assert_eq!(registry.tokens(), &["t2", "t3"]);
        assert_eq!(store.get(PUSH_TOKENS), Some("t2,t3".to_string()));

        assert_eq!(registry.remove_all(&["t9".to_string()]), 0);
    }

    #[test]
    fn test_mutations_start_from_stored_value() {
        let (mut registry, store) = registry_with("t1,t2");

        // 另一个写入者在 registry 加载之后追加了 t3
        let mut other = store.clone();
        other.set(PUSH_TOKENS, "t1,t2,t3").unwrap();

        assert!(registry.remove("t1"));
        assert_eq!(registry.tokens(), &["t2", "t3"]);
        assert_eq!(store.get(PUSH_TOKENS), Some("t2,t3".to_string()));

        // 已由其他写入者注册的 token 不会重复追加
        other.set(PUSH_TOKENS, "t2,t3,t4").unwrap();
        assert!(!registry.add("t4"));
        assert_eq!(registry.tokens(), &["t2", "t3", "t4"]);
    }

    #[test]
    fn test_refresh_picks_up_external_tokens() {
        let (mut registry, store) = registry_with("t1");
        store.clone().set(PUSH_TOKENS, "t1,t2").unwrap();

        assert_eq!(registry.tokens(), &["t1"]);
        registry.refresh();
        assert_eq!(registry.tokens(), &["t1", "t2"]);
    }
}
