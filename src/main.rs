//! WeechatRN push bridge CLI
//!
//! 把 WeeChat 中的高亮和私聊转发为 Expo 推送通知

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use weechatrn_push::cli::{
    handle_add_token, handle_options, handle_remove_token, handle_run, handle_set,
    handle_test_push, handle_tokens, AddTokenArgs, OptionsArgs, RemoveTokenArgs, RunArgs, SetArgs,
    StoreArgs, TestPushArgs, TokensArgs,
};

#[derive(Parser)]
#[command(name = "weechatrn-push")]
#[command(about = "WeechatRN push notification bridge - 高亮和私聊推送到移动设备")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 从 stdin 读取宿主事件并发送推送
    Run(RunArgs),
    /// 追加 push token (等同 /weechatrn <token>)
    AddToken(AddTokenArgs),
    /// 删除 push token
    RemoveToken(RemoveTokenArgs),
    /// 列出已注册的 push token
    Tokens(TokensArgs),
    /// 修改插件选项
    Set(SetArgs),
    /// 查看插件选项
    Options(OptionsArgs),
    /// 向所有 token 发送测试通知
    TestPush(TestPushArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("weechatrn_push=info,weechatrn-push=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => handle_run(&cli.store, args).await?,
        Commands::AddToken(args) => handle_add_token(&cli.store, args)?,
        Commands::RemoveToken(args) => handle_remove_token(&cli.store, args)?,
        Commands::Tokens(args) => handle_tokens(&cli.store, args)?,
        Commands::Set(args) => handle_set(&cli.store, args)?,
        Commands::Options(args) => handle_options(&cli.store, args)?,
        Commands::TestPush(args) => handle_test_push(&cli.store, args).await?,
    }

    Ok(())
}
