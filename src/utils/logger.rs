use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日誌輸出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 終端機用的精簡格式
    Compact,
    /// CI 收集用，一行一個 JSON 事件
    Json,
}

/// `RUST_LOG` 未設定時使用的過濾規則；verbose 只放寬本 crate 的層級
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "mlens_protoc=debug,info"
    } else {
        "mlens_protoc=info,warn"
    }
}

fn build_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

/// 兩種格式共用同一套過濾規則，`--verbose` 與 `--log-json` 可以同時使用
pub fn init_logger(verbose: bool, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(build_filter(verbose));

    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .without_time()
                    .compact(),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_span_list(false),
            )
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_enables_debug_for_this_crate() {
        assert!(default_directives(true).contains("mlens_protoc=debug"));
        assert!(default_directives(false).contains("mlens_protoc=info"));
        assert!(!default_directives(false).contains("debug"));
    }

    #[test]
    fn test_default_directives_parse() {
        for verbose in [true, false] {
            assert!(EnvFilter::try_new(default_directives(verbose)).is_ok());
        }
    }
}
