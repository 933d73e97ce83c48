use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose {
        "mahalla_nav=debug,info"
    } else {
        "mahalla_nav=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// JSON 格式日誌，方便交給集中式日誌系統
pub fn init_json_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}

/// 根據配置中的 log_level 初始化（若有）
pub fn init_with_level(level: Option<&str>, verbose: bool, json: bool) {
    if let Some(level) = level {
        if std::env::var("RUST_LOG").is_err() {
            std::env::set_var("RUST_LOG", format!("mahalla_nav={}", level));
        }
    }

    if json {
        init_json_logger(verbose);
    } else {
        init_cli_logger(verbose);
    }
}
