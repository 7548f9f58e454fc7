//! Demo backend in the shape a WebView host would embed.
//!
//! Registers the sample routes, starts the server on a loopback ephemeral
//! port, logs the root URL a host would hand to its WebView, and stops with
//! a bounded grace period on Ctrl-C.

use std::fmt::Write as _;
use std::path::PathBuf;

use async_trait::async_trait;
use clap::Parser;
use http::header::HeaderValue;
use http::Method;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webhost::config::ServerConfig;
use webhost::router::{RouteError, Router};
use webhost::server::{ContextHandler, Request, RequestScope, ResponseWriter, Server};

#[derive(Parser, Debug)]
#[command(name = "webhost", about = "Demo HTML5 app backend", version)]
struct Args {
    /// Optional TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bind address from the config.
    #[arg(long)]
    bind: Option<String>,

    /// Override the shutdown grace period, in milliseconds.
    #[arg(long)]
    grace_ms: Option<u64>,
}

/// Landing page linking into the greeting route.
struct Index;

#[async_trait]
impl ContextHandler for Index {
    async fn handle(&self, _scope: RequestScope, _req: Request, w: &mut ResponseWriter) {
        w.set_content_type(HeaderValue::from_static("text/html; charset=utf-8"));
        w.write(
            b"<html><body>\
              <div><a href='/Namaste/Alice'>Alice</a></div>\
              <div><a href='/Hello/Bob'>Bob</a></div>\
              </body></html>",
        );
    }
}

fn sample_routes() -> Result<Router, RouteError> {
    let mut router = Router::new();
    router.handle(Method::GET, "/", Index)?;
    router.handle_fn(
        Method::GET,
        "/:hellostring/:name",
        |scope, _req, mut w| async move {
            let greeting = scope.param("hellostring").unwrap_or_default();
            let name = scope.param("name").unwrap_or_default();
            w.set_content_type(HeaderValue::from_static("text/html; charset=utf-8"));
            let _ = write!(
                w,
                "<html><body><div>{greeting} {name}!</div>\
                 <div><a href='/'>Back</a></div></body></html>"
            );
            w
        },
    )?;
    Ok(router)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webhost=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(grace_ms) = args.grace_ms {
        config.shutdown_timeout_ms = grace_ms;
    }
    config.validate()?;

    let grace = config.shutdown_timeout();
    let server = Server::new(sample_routes()?, config);
    let root_url = server.start().await?;
    tracing::info!(%root_url, "backend ready; Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    server.stop(grace).await?;
    Ok(())
}
