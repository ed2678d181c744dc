//! Startup orchestration and mode dispatch.
//!
//! # Responsibilities
//! - Select the deployment mode once, from the validated config
//! - Resolve the backend and compile access rules for that mode
//! - Reject configurations the selected mode cannot honour
//! - Prepare: meet the provider preconditions (listener bound, or certified
//!   domain found and forward spec built)
//! - Run: serve requests (active proxy) or hand off the forward spec
//!   (declarative forward)
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Everything fallible happens in `IngressPlan::from_config`, before the
//!   provider is touched
//! - Listeners start last (traffic only when ready)

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, IngressConfig, ModeChoice};
use crate::forward::{DeclarativeForwardSpec, ForwardError};
use crate::http::server::{HttpServer, ProxyContext};
use crate::lifecycle::shutdown::Shutdown;
use crate::net::{IngressListener, NetworkProvider, ProviderError, Reachability};
use crate::routing::MountPath;
use crate::security::{AccessError, AccessFilter};
use crate::upstream::transport::TransportError;
use crate::upstream::{resolve, resolve_strict, ResolvedTarget, TargetError, UpstreamTransport};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid backend: {0}")]
    Target(#[from] TargetError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unsupported configuration: {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Forward(#[from] ForwardError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// How requests reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngressMode {
    /// This process terminates connections and forwards requests.
    ActiveProxy,
    /// The provider's serving runtime forwards on our behalf.
    DeclarativeForward,
}

impl IngressMode {
    /// Explicit `mode` wins; otherwise funnel selects the active proxy.
    pub fn select(config: &IngressConfig) -> Self {
        match config.mode {
            Some(ModeChoice::Active) => IngressMode::ActiveProxy,
            Some(ModeChoice::Declarative) => IngressMode::DeclarativeForward,
            None if config.funnel => IngressMode::ActiveProxy,
            None => IngressMode::DeclarativeForward,
        }
    }
}

impl fmt::Display for IngressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngressMode::ActiveProxy => f.write_str("active-proxy"),
            IngressMode::DeclarativeForward => f.write_str("declarative-forward"),
        }
    }
}

/// Fully resolved startup plan for one mode.
pub enum IngressPlan {
    ActiveProxy {
        ctx: ProxyContext,
        listen_port: u16,
        reachability: Reachability,
    },
    DeclarativeForward {
        target: ResolvedTarget,
        mount: MountPath,
        listen_port: u16,
    },
}

impl IngressPlan {
    /// Resolve and compile everything the selected mode needs.
    pub fn from_config(config: &IngressConfig) -> Result<Self, StartupError> {
        match IngressMode::select(config) {
            IngressMode::ActiveProxy => {
                let target = Arc::new(resolve(&config.backend)?);
                let filter = AccessFilter::compile(config.allowed_paths.as_deref(), config.denied_paths.as_deref())?;
                let transport = UpstreamTransport::for_target(&target)?;
                let reachability = if config.funnel {
                    Reachability::Funnel
                } else {
                    Reachability::Private
                };

                Ok(IngressPlan::ActiveProxy {
                    ctx: ProxyContext {
                        target,
                        mount: config.mount_path.clone(),
                        filter: Arc::new(filter),
                        transport,
                    },
                    listen_port: config.listen_port,
                    reachability,
                })
            }
            IngressMode::DeclarativeForward => {
                if config.funnel {
                    return Err(StartupError::Unsupported(
                        "funnel requires active proxy mode",
                    ));
                }
                if config.allowed_paths.is_some() || config.denied_paths.is_some() {
                    return Err(StartupError::Unsupported(
                        "allowed-paths and denied-paths are only enforced in active proxy mode",
                    ));
                }

                Ok(IngressPlan::DeclarativeForward {
                    target: resolve_strict(&config.backend)?,
                    mount: config.mount_path.clone(),
                    listen_port: config.listen_port,
                })
            }
        }
    }

    pub fn mode(&self) -> IngressMode {
        match self {
            IngressPlan::ActiveProxy { .. } => IngressMode::ActiveProxy,
            IngressPlan::DeclarativeForward { .. } => IngressMode::DeclarativeForward,
        }
    }

    pub fn target(&self) -> &ResolvedTarget {
        match self {
            IngressPlan::ActiveProxy { ctx, .. } => &ctx.target,
            IngressPlan::DeclarativeForward { target, .. } => target,
        }
    }

    /// Meet the provider preconditions: bind the listener, or fetch the
    /// certified domains and build the forward spec. Nothing is served or
    /// applied yet.
    pub async fn prepare<P>(self, provider: &P) -> Result<PreparedIngress, StartupError>
    where
        P: NetworkProvider + ?Sized,
    {
        match self {
            IngressPlan::ActiveProxy {
                ctx,
                listen_port,
                reachability,
            } => {
                tracing::info!(
                    upstream = %ctx.target,
                    mount_path = %ctx.mount,
                    insecure_skip_verify = ctx.transport.insecure_skip_verify(),
                    "Proxying traffic"
                );
                let listener = provider.listen(listen_port, reachability).await?;
                let server = HttpServer::new(ctx, listener.forwarded_proto());
                Ok(PreparedIngress::ActiveProxy { server, listener })
            }
            IngressPlan::DeclarativeForward {
                target,
                mount,
                listen_port,
            } => {
                let domains = provider.cert_domains().await?;
                let spec = DeclarativeForwardSpec::for_domains(&target, &mount, &domains, listen_port)?;
                tracing::info!(
                    upstream = %target,
                    mount_path = %mount,
                    domain = %domains[0],
                    listen_port,
                    "Forwarding traffic via serving runtime"
                );
                Ok(PreparedIngress::DeclarativeForward { spec })
            }
        }
    }

    /// Prepare and run until shutdown.
    pub async fn launch<P>(self, provider: &P, shutdown: &Shutdown) -> Result<(), StartupError>
    where
        P: NetworkProvider + ?Sized,
    {
        self.prepare(provider).await?.run(provider, shutdown).await
    }
}

/// A plan whose provider preconditions hold.
pub enum PreparedIngress {
    ActiveProxy {
        server: HttpServer,
        listener: IngressListener,
    },
    DeclarativeForward {
        spec: DeclarativeForwardSpec,
    },
}

impl PreparedIngress {
    pub fn mode(&self) -> IngressMode {
        match self {
            PreparedIngress::ActiveProxy { .. } => IngressMode::ActiveProxy,
            PreparedIngress::DeclarativeForward { .. } => IngressMode::DeclarativeForward,
        }
    }

    /// Serve, or apply the forward spec and wait, until shutdown.
    pub async fn run<P>(self, provider: &P, shutdown: &Shutdown) -> Result<(), StartupError>
    where
        P: NetworkProvider + ?Sized,
    {
        let mut shutdown_rx = shutdown.subscribe();
        match self {
            PreparedIngress::ActiveProxy { server, listener } => {
                server.run(listener, shutdown_rx).await?;
                Ok(())
            }
            PreparedIngress::DeclarativeForward { spec } => {
                provider.apply_forward_spec(&spec).await?;
                shutdown_rx.recv().await;
                tracing::info!("Shutdown signal received");
                Ok(())
            }
        }
    }
}
