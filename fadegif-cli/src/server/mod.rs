use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use chrono::{TimeDelta, Utc};
use clap::Parser;
use http_body_util::{BodyExt as _, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;

use self::auth::TokenTable;
use self::handler::{ApiError, AppState, Body, RequestLimits};
use self::rate_limit::RateLimiter;

mod auth;
mod handler;
mod rate_limit;

#[derive(Parser, Debug)]
pub(crate) struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "FADEGIF_BIND", default_value = "127.0.0.1:8080")]
    pub(crate) bind: SocketAddr,

    /// JSON file mapping bearer tokens to user ids.
    #[arg(long, env = "FADEGIF_TOKENS")]
    pub(crate) tokens: PathBuf,

    /// Days a user must wait between generations (0 disables the limit).
    #[arg(long, env = "FADEGIF_RATE_LIMIT_DAYS", default_value_t = 7)]
    pub(crate) rate_limit_days: u32,

    /// Maximum images per request.
    #[arg(long, env = "FADEGIF_MAX_IMAGES", default_value_t = 3)]
    pub(crate) max_images: usize,

    /// Maximum fade frames per transition.
    #[arg(long, default_value_t = 60)]
    pub(crate) max_fade_frames: u32,

    /// Maximum request body size in bytes.
    #[arg(long, default_value_t = 32 * 1024 * 1024)]
    pub(crate) max_body_bytes: usize,

    /// Maximum canvas area in pixels for one request.
    #[arg(
        long,
        env = "FADEGIF_MAX_CANVAS_PIXELS",
        default_value_t = 4 * 1024 * 1024
    )]
    pub(crate) max_canvas_pixels: u64,

    /// Downscale request images to fit WIDTHxHEIGHT before centering.
    #[arg(
        long,
        value_name = "WIDTHxHEIGHT",
        value_parser = crate::make::parse_fit
    )]
    pub(crate) fit: Option<fadegif::ResizePolicy>,

    /// Seconds to wait for in-flight requests after Ctrl-C.
    #[arg(long, default_value_t = 30)]
    pub(crate) shutdown_timeout_secs: u64,
}

/// Everything the accept loop needs besides the listener.
#[derive(Debug)]
pub(crate) struct Server {
    state: Arc<AppState>,
    max_body_bytes: usize,
    drain_timeout: Duration,
}

impl Server {
    pub(crate) fn new(state: AppState, max_body_bytes: usize) -> Self {
        Self {
            state: Arc::new(state),
            max_body_bytes,
            drain_timeout: Duration::from_secs(30),
        }
    }

    pub(crate) fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    fn from_args(args: &ServeArgs) -> anyhow::Result<Self> {
        if args.max_images < 2 {
            anyhow::bail!("--max-images must be at least 2");
        }
        let tokens = TokenTable::from_path(&args.tokens)?;
        if tokens.is_empty() {
            tracing::warn!(
                path = %args.tokens.display(),
                "tokens file is empty; every request will be rejected"
            );
        }
        let state = AppState {
            tokens,
            limiter: RateLimiter::new(TimeDelta::days(i64::from(args.rate_limit_days))),
            limits: RequestLimits {
                max_images: args.max_images,
                max_fade_frames: args.max_fade_frames,
                max_canvas_pixels: args.max_canvas_pixels,
                resize: args.fit.unwrap_or_default(),
            },
        };
        Ok(Self::new(state, args.max_body_bytes)
            .with_drain_timeout(Duration::from_secs(args.shutdown_timeout_secs)))
    }

    /// Accept connections until `shutdown` resolves, then let open connections finish their
    /// current request for up to the drain timeout.
    pub(crate) async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> anyhow::Result<()> {
        let drain_timeout = self.drain_timeout;
        let this = Arc::new(self);
        let service = service_fn(move |req| {
            let this = this.clone();
            async move { Ok::<_, Infallible>(this.handle(req).await) }
        });
        let graceful = GracefulShutdown::new();

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                r = listener.accept() => {
                    let (socket, addr) = r.context("accept connection")?;
                    tracing::debug!("Accepted connection from {}", addr);

                    let conn = http1::Builder::new()
                        .serve_connection(TokioIo::new(socket), service.clone());
                    let conn = graceful.watch(conn);
                    tokio::spawn(async move {
                        if let Err(e) = conn.await {
                            tracing::debug!(%addr, error = %e, "connection closed with error");
                        }
                    });
                },
            }
        }

        drop(listener);
        tracing::info!("shutting down, draining open connections");
        match tokio::time::timeout(drain_timeout, graceful.shutdown()).await {
            Ok(()) => tracing::info!("all connections closed"),
            Err(_) => tracing::warn!(
                timeout_secs = drain_timeout.as_secs(),
                "drain timeout elapsed, dropping remaining connections"
            ),
        }
        Ok(())
    }

    async fn handle(&self, req: Request<Incoming>) -> Response<Body> {
        let started = Instant::now();
        let (parts, body) = req.into_parts();

        let resp = match Limited::new(body, self.max_body_bytes).collect().await {
            Ok(collected) => {
                let body = collected.to_bytes();
                let state = self.state.clone();
                let method = parts.method.clone();
                let headers = parts.headers.clone();
                tokio::task::spawn_blocking(move || {
                    handler::respond(&state, &method, &headers, &body, Utc::now())
                })
                .await
                .unwrap_or_else(|e| {
                    ApiError::Internal(anyhow::anyhow!("request task failed: {e}")).into_response()
                })
            }
            Err(e) if e.downcast_ref::<http_body_util::LengthLimitError>().is_some() => {
                ApiError::PayloadTooLarge.into_response()
            }
            Err(e) => {
                ApiError::BadRequest(format!("failed to read request body: {e}")).into_response()
            }
        };

        tracing::info!(
            method = %parts.method,
            path = parts.uri.path(),
            status = resp.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request"
        );
        resp
    }
}

pub(crate) fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let server = Server::from_args(&args)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;

    runtime.block_on(async move {
        let listener = TcpListener::bind(args.bind)
            .await
            .with_context(|| format!("bind {}", args.bind))?;
        tracing::info!("Listening on {}", listener.local_addr()?);
        server
            .serve(listener, async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
    })
}

#[cfg(test)]
#[path = "../../tests/unit/server/serve.rs"]
mod tests;
