//! Token 管理命令
//!
//! 不需要让中继客户端拥有 `/set` 权限，也能管理 push token。

use anyhow::Result;
use clap::Args;

use super::output::format_tokens;
use super::StoreArgs;
use crate::registry::TokenRegistry;

/// add-token 命令参数
#[derive(Args, Debug)]
pub struct AddTokenArgs {
    /// Expo push token
    pub token: String,
}

/// remove-token 命令参数
#[derive(Args, Debug)]
pub struct RemoveTokenArgs {
    /// 要删除的 push token
    pub token: String,
}

/// tokens 命令参数
#[derive(Args, Debug)]
pub struct TokensArgs {
    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 追加 token（已存在则不变）
pub fn handle_add_token(store: &StoreArgs, args: AddTokenArgs) -> Result<()> {
    let mut registry = TokenRegistry::load(Box::new(store.open()?));
    if registry.add(&args.token) {
        println!("Registered push token ({} total)", registry.len());
    } else {
        println!("Push token not added ({} total)", registry.len());
    }
    Ok(())
}

pub fn handle_remove_token(store: &StoreArgs, args: RemoveTokenArgs) -> Result<()> {
    let mut registry = TokenRegistry::load(Box::new(store.open()?));
    if registry.remove(args.token.trim()) {
        println!("Removed push token ({} left)", registry.len());
    } else {
        eprintln!("Push token not found");
    }
    Ok(())
}

pub fn handle_tokens(store: &StoreArgs, args: TokensArgs) -> Result<()> {
    let registry = TokenRegistry::load(Box::new(store.open()?));
    println!("{}", format_tokens(registry.tokens(), args.json));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::store::{ConfigStore, FileConfigStore};
    use crate::options::PUSH_TOKENS;
    use tempfile::tempdir;

    #[test]
    fn test_add_and_remove_token_commands() {
        let temp = tempdir().unwrap();
        let store = StoreArgs {
            config: Some(temp.path().join("options.json")),
        };

        handle_add_token(&store, AddTokenArgs { token: "t1".into() }).unwrap();
        handle_add_token(&store, AddTokenArgs { token: "t2".into() }).unwrap();
        handle_add_token(&store, AddTokenArgs { token: "t1".into() }).unwrap();
        handle_remove_token(&store, RemoveTokenArgs { token: "t1".into() }).unwrap();

        let file = FileConfigStore::open(temp.path().join("options.json")).unwrap();
        assert_eq!(file.get(PUSH_TOKENS), Some("t2".to_string()));
        assert_eq!(file.get("notify_current_buffer"), Some("on".to_string()));
    }
}
