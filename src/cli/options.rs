//! 选项查看与修改命令

use anyhow::{bail, Result};
use clap::Args;

use super::output::{format_options, option_rows};
use super::StoreArgs;
use crate::infra::store::ConfigStore;
use crate::options::normalize_option_name;

/// set 命令参数
#[derive(Args, Debug)]
pub struct SetArgs {
    /// 选项名 (push_tokens / notify_current_buffer)
    pub option: String,
    /// 新值
    pub value: String,
}

/// options 命令参数
#[derive(Args, Debug)]
pub struct OptionsArgs {
    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

pub fn handle_set(store: &StoreArgs, args: SetArgs) -> Result<()> {
    let Some(name) = normalize_option_name(&args.option) else {
        bail!("Unknown option: {}", args.option);
    };
    let mut store = store.open()?;
    store.set(name, &args.value)?;
    println!("{} = \"{}\"", name, args.value);
    Ok(())
}

pub fn handle_options(store: &StoreArgs, args: OptionsArgs) -> Result<()> {
    let store = store.open()?;
    let rows = option_rows(|name| store.get(name));
    println!("{}", format_options(&rows, args.json));
    Ok(())
}
