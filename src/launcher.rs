//! Multi-server launcher.
//!
//! Resolves behavior names against a registry, binds one listener per
//! behavior on consecutive ports, and supervises the accept loops until
//! stopped. Each accepted connection runs its behavior on its own task, so a
//! stalled connection never blocks other connections or other listeners.

use crate::behavior::{Behavior, Options};
use crate::registry::Registry;
use crate::stream::Connection;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// One behavior slated for launch.
struct ServerSpec {
    behavior: Arc<dyn Behavior>,
    options: Options,
}

/// One launched listener: its port and the accept-loop task driving it.
struct RunningServer {
    name: String,
    port: u16,
    handle: tokio::task::JoinHandle<()>,
}

/// Binds a set of behaviors to sequential ports and supervises them.
pub struct Launcher {
    host: String,
    base_port: u16,
    servers: Vec<ServerSpec>,
    shutdown: CancellationToken,
}

impl Launcher {
    /// Resolve `names` against `registry`. An empty list resolves to every
    /// registered behavior. Fails fast on an unknown name, before anything
    /// is bound.
    pub fn new(
        base_port: u16,
        names: &[String],
        registry: &Registry,
    ) -> Result<Self, LaunchError> {
        let behaviors = if names.is_empty() {
            registry.all()
        } else {
            names
                .iter()
                .map(|name| {
                    registry
                        .get(name)
                        .ok_or_else(|| LaunchError::UnknownBehavior(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let count = behaviors.len();
        if base_port as usize + count > u16::MAX as usize + 1 {
            return Err(LaunchError::PortRange { base_port, count });
        }

        let servers = behaviors
            .into_iter()
            .map(|behavior| ServerSpec {
                behavior,
                options: Options::new(),
            })
            .collect();

        Ok(Launcher {
            host: "127.0.0.1".to_string(),
            base_port,
            servers,
            shutdown: CancellationToken::new(),
        })
    }

    /// Address to bind listeners on. Default: 127.0.0.1
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// Attach per-behavior options, keyed by behavior name. Behaviors
    /// without an entry keep their defaults.
    pub fn with_behavior_options(mut self, mut options: BTreeMap<String, Options>) -> Self {
        for server in &mut self.servers {
            if let Some(opts) = options.remove(server.behavior.name()) {
                server.options = opts;
            }
        }
        self
    }

    /// The ports this launcher will bind, in behavior order.
    pub fn ports(&self) -> Vec<u16> {
        (0..self.servers.len())
            .map(|index| self.base_port + index as u16)
            .collect()
    }

    /// The behavior names this launcher will run, in port order.
    pub fn behavior_names(&self) -> Vec<&str> {
        self.servers.iter().map(|s| s.behavior.name()).collect()
    }

    /// A clonable handle for stopping this launcher from another task.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Signal every accept loop to stop. Idempotent; in-flight connections
    /// drain on their own tasks.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Bind every listener, then accept connections until [`stop`] is
    /// called.
    ///
    /// All listeners are bound before any accept loop starts, so a port
    /// collision surfaces as a startup error with nothing left accepting.
    /// Blocks until every accept loop has exited.
    ///
    /// [`stop`]: Launcher::stop
    pub async fn start(&self) -> Result<(), LaunchError> {
        let mut bound = Vec::with_capacity(self.servers.len());
        for (index, server) in self.servers.iter().enumerate() {
            let port = self.base_port + index as u16;
            let listener = TcpListener::bind((self.host.as_str(), port))
                .await
                .map_err(|source| LaunchError::Bind { port, source })?;

            info!(behavior = %server.behavior.name(), port, "Listener bound");
            bound.push((listener, port, server));
        }

        let mut running = Vec::with_capacity(bound.len());
        for (listener, port, server) in bound {
            let behavior = Arc::clone(&server.behavior);
            let options = server.options.clone();
            let shutdown = self.shutdown.clone();

            running.push(RunningServer {
                name: behavior.name().to_string(),
                port,
                handle: tokio::spawn(accept_loop(listener, behavior, options, shutdown)),
            });
        }

        for server in running {
            if let Err(e) = server.handle.await {
                error!(
                    behavior = %server.name,
                    port = server.port,
                    error = %e,
                    "Accept loop panicked"
                );
            }
        }
        Ok(())
    }
}

/// Accept connections and dispatch each to its own task until cancelled.
async fn accept_loop(
    listener: TcpListener,
    behavior: Arc<dyn Behavior>,
    options: Options,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!(behavior = %behavior.name(), "Listener stopping");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    debug!(peer = %addr, behavior = %behavior.name(), "New connection");

                    let behavior = Arc::clone(&behavior);
                    let options = options.clone();

                    tokio::spawn(async move {
                        let mut conn = Connection::new(stream);
                        if let Err(e) = behavior.handle(&mut conn, &options).await {
                            debug!(
                                behavior = %behavior.name(),
                                error = %e,
                                "Connection error"
                            );
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

/// Launcher construction and startup errors.
#[derive(Debug)]
pub enum LaunchError {
    /// A requested behavior name is not in the registry.
    UnknownBehavior(String),
    /// A listener port could not be bound.
    Bind { port: u16, source: std::io::Error },
    /// The behaviors would not fit between the base port and the maximum
    /// port number.
    PortRange { base_port: u16, count: usize },
}

impl std::fmt::Display for LaunchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchError::UnknownBehavior(name) => {
                write!(f, "Unknown behavior: {name}")
            }
            LaunchError::Bind { port, source } => {
                write!(f, "Failed to bind port {port}: {source}")
            }
            LaunchError::PortRange { base_port, count } => {
                write!(
                    f,
                    "{count} behaviors starting at port {base_port} would exceed the maximum port"
                )
            }
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaunchError::Bind { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Find a block of `count` consecutive free ports.
    fn free_port_block(count: u16) -> u16 {
        loop {
            let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            let base = probe.local_addr().unwrap().port();

            let rest: Vec<_> = (1..count)
                .map(|i| std::net::TcpListener::bind(("127.0.0.1", base + i)))
                .collect();
            if rest.iter().all(|l| l.is_ok()) {
                return base;
            }
        }
    }

    async fn connect(port: u16) -> std::io::Result<tokio::net::TcpStream> {
        tokio::net::TcpStream::connect(("127.0.0.1", port)).await
    }

    /// Retry until the listeners come up.
    async fn wait_for_listener(port: u16) {
        for _ in 0..100 {
            if connect(port).await.is_ok() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("listener on port {port} never came up");
    }

    #[test]
    fn test_unknown_behavior_fails_at_construction() {
        let registry = Registry::builtin();
        let result = Launcher::new(10_000, &names(&["NoSuchBehavior"]), &registry);

        match result {
            Err(LaunchError::UnknownBehavior(name)) => assert_eq!(name, "NoSuchBehavior"),
            _ => panic!("expected UnknownBehavior"),
        }
    }

    #[test]
    fn test_empty_names_resolve_to_full_registry() {
        let registry = Registry::builtin();
        let launcher = Launcher::new(10_000, &[], &registry).unwrap();
        assert_eq!(launcher.behavior_names().len(), registry.len());
    }

    #[test]
    fn test_ports_are_sequential_from_base() {
        let registry = Registry::builtin();
        let launcher = Launcher::new(
            10_000,
            &names(&["CloseImmediately", "FixedResponse", "NeverRespond"]),
            &registry,
        )
        .unwrap();
        assert_eq!(launcher.ports(), vec![10_000, 10_001, 10_002]);
    }

    #[test]
    fn test_port_range_overflow_is_rejected() {
        let registry = Registry::builtin();
        let result = Launcher::new(u16::MAX, &names(&["CloseImmediately", "FixedResponse"]), &registry);
        assert!(matches!(result, Err(LaunchError::PortRange { .. })));
    }

    #[tokio::test]
    async fn test_start_binds_all_ports_and_stop_halts_them() {
        let registry = Registry::builtin();
        let base = free_port_block(3);

        let launcher = Arc::new(
            Launcher::new(
                base,
                &names(&["CloseImmediately", "FixedResponse", "NeverRespond"]),
                &registry,
            )
            .unwrap(),
        );

        let running = tokio::spawn({
            let launcher = Arc::clone(&launcher);
            async move { launcher.start().await }
        });

        for port in launcher.ports() {
            wait_for_listener(port).await;
        }

        launcher.stop();
        running.await.unwrap().unwrap();

        // Accept loops are gone; new connections are refused.
        for port in launcher.ports() {
            assert!(connect(port).await.is_err());
        }
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let registry = Registry::builtin();
        let base = free_port_block(1);

        let launcher = Launcher::new(base, &names(&["CloseImmediately"]), &registry).unwrap();
        launcher.stop();
        launcher.stop();

        // A launcher stopped before start binds, observes the cancellation,
        // and returns without accepting.
        launcher.start().await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_conflict_is_a_startup_error() {
        let registry = Registry::builtin();
        let base = free_port_block(1);
        let holder = std::net::TcpListener::bind(("127.0.0.1", base)).unwrap();

        let launcher = Launcher::new(base, &names(&["CloseImmediately"]), &registry).unwrap();
        let result = launcher.start().await;

        match result {
            Err(LaunchError::Bind { port, .. }) => assert_eq!(port, base),
            _ => panic!("expected Bind error"),
        }
        drop(holder);
    }

    #[tokio::test]
    async fn test_launched_behavior_serves_connections() {
        let registry = Registry::builtin();
        let base = free_port_block(1);

        let launcher = Arc::new(
            Launcher::new(base, &names(&["FixedResponse"]), &registry).unwrap(),
        );

        let running = tokio::spawn({
            let launcher = Arc::clone(&launcher);
            async move { launcher.start().await }
        });

        wait_for_listener(base).await;

        let mut stream = connect(base).await.unwrap();
        let mut response = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut response)
            .await
            .unwrap();
        assert_eq!(response, "Hello, world!");

        launcher.stop();
        running.await.unwrap().unwrap();
    }
}
