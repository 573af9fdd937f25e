//! rat_cacheaside 基础用法演示
//!
//! 加载配置、初始化日志、插入一个用户，然后按主键读取两次：
//! 第一次回源并写入缓存，第二次直接命中缓存。
//!
//! 运行：`cargo run --example basic_usage -- -f etc/practice.toml`

use chrono::Utc;
use rat_cacheaside::{AppConfig, ServiceContext, User, init_logging};
use rat_logger::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_file = parse_config_flag().unwrap_or_else(|| "etc/practice.toml".to_string());

    let config = AppConfig::from_file(&config_file)?;
    init_logging(&config.logging)?;
    println!("🚀 {}", rat_cacheaside::get_info());
    info!("配置: {:?}", config);

    let ctx = ServiceContext::new(config).await?;
    let users = ctx.user_model();
    users.ensure_table().await?;

    let mut user = User {
        id: 0,
        user: "aaa2".to_string(),
        name: Some("yfaaa2".to_string()),
        password: "123456".to_string(),
        mobile: "13243204942".to_string(),
        gender: "男".to_string(),
        nickname: "yf".to_string(),
        tp: 2,
        create_time: None,
        update_time: Utc::now(),
    };
    match users.insert(&mut user).await {
        Ok(()) => println!("✅ 插入用户成功: id={}", user.id),
        // 重复运行时唯一约束冲突，继续读取已有记录
        Err(e) => error!("插入用户失败: {}", e),
    }

    let first = users.find_one(1).await?;
    println!("📖 第一次读取: {:?}", first);
    let second = users.find_one(1).await?;
    println!("📖 第二次读取: {:?}", second);

    let stats = ctx.conn().cache().stats();
    println!(
        "📊 缓存统计: 命中={}, 未命中={}, 写入={}, 命中率={:.2}",
        stats.hits, stats.misses, stats.writes, stats.hit_rate
    );
    Ok(())
}

/// 解析 `-f <path>` 参数
fn parse_config_flag() -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "-f" {
            return args.next();
        }
    }
    None
}
