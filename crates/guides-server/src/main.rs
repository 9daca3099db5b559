mod admin;
mod auth;
mod cache;
mod config;
mod error;
mod frontmatter;
mod http;
mod markdown;
mod mcp;
mod model;
mod rate_limit;
mod related;
mod repository;
mod sanitize;
mod search;
mod sitemap;
mod slug;
mod stats;
mod store;
mod validation;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use guides_common::redis::RedisCache;

use admin::AdminService;
use auth::{SessionResolver, StaticUserDirectory};
use cache::HtmlCache;
use config::{Config, Transport};
use http::AppState;
use mcp::GuidesMcpServer;
use rate_limit::{RateLimiter, RedisCounterStore};
use repository::GuideRepository;
use store::FsContentStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting guides-server");

    let config = Config::from_env()?;
    info!(
        content_root = %config.content_root.display(),
        locale = %config.locale,
        transport = ?config.transport,
        "config loaded"
    );

    let redis = RedisCache::new(config.redis_url.as_deref());
    if redis.is_available().await {
        info!("redis connected");
    } else {
        info!("redis unavailable, running without shared cache and counters");
    }

    let store = FsContentStore::new(&config.content_root, &config.locale);
    let repo = Arc::new(GuideRepository::new(
        Arc::new(store),
        HtmlCache::new(redis.clone()),
    ));
    let guide_count = repo.list_slugs().await?.len();
    info!(guide_count, "content store ready");

    match config.transport {
        Transport::Stdio => serve_mcp(repo).await,
        Transport::Http => serve_http(config, repo, redis).await,
    }
}

async fn serve_mcp(repo: Arc<GuideRepository>) -> anyhow::Result<()> {
    info!("MCP server ready, serving on stdio");
    let service = GuidesMcpServer::new(repo)
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;

    service.waiting().await?;
    info!("MCP server shut down");
    Ok(())
}

async fn serve_http(
    config: Config,
    repo: Arc<GuideRepository>,
    redis: RedisCache,
) -> anyhow::Result<()> {
    let limiter = if redis.is_configured() {
        RateLimiter::new(Arc::new(RedisCounterStore::new(redis)))
    } else {
        RateLimiter::in_memory()
    };

    let state = AppState {
        admin: AdminService::new(repo.clone(), limiter),
        repo,
        sessions: SessionResolver::new(config.sessions),
        users: Arc::new(StaticUserDirectory::new(config.admins, config.users)),
        site_url: config.site_url,
    };

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "HTTP server listening");
    axum::serve(listener, http::router(Arc::new(state)))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    info!("HTTP server shut down");
    Ok(())
}
