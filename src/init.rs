use env_logger::Env;

/// 初始化日誌；`RUST_LOG` 優先，否則預設只顯示警告，`--verbose` 時顯示除錯訊息
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}
