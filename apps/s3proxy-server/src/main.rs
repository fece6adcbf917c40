//! s3proxy server - serves GET requests straight from an S3 bucket.
//!
//! Requests are mapped to object keys under the configured root. Objects that
//! are found are streamed back with their metadata; everything else is
//! answered `404 Not Found`.
//!
//! # Usage
//!
//! ```text
//! S3PROXY_BUCKET=my-site GATEWAY_LISTEN=0.0.0.0:8080 s3proxy-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `S3PROXY_CONFIG` | *(unset)* | JSON configuration file, replaces the variables below |
//! | `S3PROXY_BUCKET` | *(required)* | Bucket to serve from |
//! | `S3PROXY_ROOT` | `{http.vars.root}` | Root path template |
//! | `S3PROXY_REGION` | *(SDK default)* | Bucket region |
//! | `S3PROXY_ENDPOINT` | *(SDK default)* | Custom S3 endpoint |
//! | `S3PROXY_USE_ACCELERATE` | `false` | Use S3 Transfer Acceleration |
//! | `S3PROXY_INDEX_DOCUMENT` | `index.html` | Document for directory keys |
//! | `S3PROXY_VAR_<NAME>` | *(unset)* | Value of `{http.vars.<name>}` |
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use s3proxy_aws::AwsObjectStore;
use s3proxy_core::ProxyConfig;
use s3proxy_http::next::NotFoundHandler;
use s3proxy_http::service::S3ProxyService;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming a JSON configuration file.
const CONFIG_FILE_VAR: &str = "S3PROXY_CONFIG";

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Load and provision the configuration, from `config_file` when given,
/// otherwise from the environment.
fn load_config(config_file: Option<&str>) -> Result<ProxyConfig> {
    let config = match config_file {
        Some(path) => ProxyConfig::from_json_file(path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => ProxyConfig::from_env(),
    };
    config.provision().context("invalid configuration")
}

type ProxyService = S3ProxyService<AwsObjectStore, NotFoundHandler>;

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: ProxyService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_file = std::env::var(CONFIG_FILE_VAR).ok();
    let config = load_config(config_file.as_deref())?;

    init_tracing(&config.log_level)?;

    info!(
        gateway_listen = %config.gateway_listen,
        bucket = %config.bucket,
        root = %config.root,
        index_document = %config.index_document,
        version = VERSION,
        "starting s3proxy server",
    );

    let store = AwsObjectStore::provision(&config).await;

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let service = S3ProxyService::new(store, NotFoundHandler, config);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, document: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("s3proxy-{}-{name}.json", std::process::id()));
        std::fs::write(&path, document).expect("write config file");
        path
    }

    #[test]
    fn test_should_load_config_from_json_file() {
        let path = write_config(
            "valid",
            r#"{"bucket": "my-site", "root": "", "vars": {"root": "/www"}}"#,
        );
        let config = load_config(path.to_str()).expect("valid config");
        std::fs::remove_file(&path).ok();

        assert_eq!(config.bucket, "my-site");
        assert_eq!(config.root, "{http.vars.root}");
        assert_eq!(config.vars.get("root").map(String::as_str), Some("/www"));
        assert_eq!(config.gateway_listen, "0.0.0.0:8080");
    }

    #[test]
    fn test_should_reject_config_without_bucket() {
        let path = write_config("nobucket", r#"{"root": "/www"}"#);
        let result = load_config(path.to_str());
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }

    #[test]
    fn test_should_report_missing_config_file() {
        let err = load_config(Some("/nonexistent/s3proxy.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/s3proxy.json"));
    }
}
