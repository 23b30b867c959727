// src/environment.rs

//! API and resource base URL derivation from runtime environment signals.
//!
//! Signals are read through a [`HostProbe`] on every call, so a host whose
//! hostname changes during local development gets fresh bases without any
//! cache to invalidate.

use std::env;
use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::models::ApiConfig;
use crate::utils::url::strip_api_suffix;

/// Which host the client was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTarget {
    /// Browser; hostname and port are observable
    Web,
    /// Sandboxed mini-program; no network introspection
    MiniProgram,
}

impl BuildTarget {
    /// Parse a target name as used by build tooling (`h5`, `weapp`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "web" | "h5" | "browser" => Some(BuildTarget::Web),
            "weapp" | "mini" | "miniprogram" | "mini-program" => Some(BuildTarget::MiniProgram),
            _ => None,
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildTarget::Web => f.write_str("web"),
            BuildTarget::MiniProgram => f.write_str("mini-program"),
        }
    }
}

/// Hostname and port the web host is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLocation {
    pub hostname: String,
    pub port: Option<u16>,
}

impl HostLocation {
    pub fn new(hostname: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }

    /// Parse an origin such as `http://localhost:10086`.
    pub fn from_origin(origin: &str) -> Option<Self> {
        let url = Url::parse(origin).ok()?;
        Some(Self {
            hostname: url.host_str()?.to_string(),
            port: url.port(),
        })
    }
}

/// Source of environment signals.
pub trait HostProbe: Send + Sync {
    fn target(&self) -> BuildTarget;

    /// Current location, `None` when it cannot be observed.
    fn location(&self) -> Option<HostLocation>;
}

/// Reads signals from process environment variables.
///
/// - `TRAVELOG_TARGET`: `web` (default) or `weapp`
/// - `TRAVELOG_ORIGIN`: e.g. `http://localhost:10086`, or
/// - `TRAVELOG_HOSTNAME` / `TRAVELOG_PORT`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvProbe;

impl HostProbe for ProcessEnvProbe {
    fn target(&self) -> BuildTarget {
        match env::var("TRAVELOG_TARGET") {
            Ok(raw) => BuildTarget::parse(&raw).unwrap_or_else(|| {
                log::warn!("Unknown TRAVELOG_TARGET '{}', assuming web", raw);
                BuildTarget::Web
            }),
            Err(_) => BuildTarget::Web,
        }
    }

    fn location(&self) -> Option<HostLocation> {
        if let Ok(origin) = env::var("TRAVELOG_ORIGIN") {
            return HostLocation::from_origin(&origin);
        }
        let hostname = env::var("TRAVELOG_HOSTNAME").ok()?;
        let port = env::var("TRAVELOG_PORT")
            .ok()
            .and_then(|p| p.trim().parse().ok());
        Some(HostLocation::new(hostname, port))
    }
}

/// Fixed signals, for embedding and tests.
#[derive(Debug, Clone)]
pub struct StaticProbe {
    pub target: BuildTarget,
    pub location: Option<HostLocation>,
}

impl StaticProbe {
    pub fn web(hostname: &str, port: Option<u16>) -> Self {
        Self {
            target: BuildTarget::Web,
            location: Some(HostLocation::new(hostname, port)),
        }
    }

    pub fn mini_program() -> Self {
        Self {
            target: BuildTarget::MiniProgram,
            location: None,
        }
    }
}

impl HostProbe for StaticProbe {
    fn target(&self) -> BuildTarget {
        self.target
    }

    fn location(&self) -> Option<HostLocation> {
        self.location.clone()
    }
}

/// Derives the API base and the static-resource base.
#[derive(Clone)]
pub struct EnvironmentResolver {
    api: ApiConfig,
    probe: Arc<dyn HostProbe>,
}

impl EnvironmentResolver {
    pub fn new(api: ApiConfig, probe: Arc<dyn HostProbe>) -> Self {
        Self { api, probe }
    }

    /// Resolver over process environment variables.
    pub fn from_env(api: ApiConfig) -> Self {
        Self::new(api, Arc::new(ProcessEnvProbe))
    }

    pub fn api_prefix(&self) -> &str {
        &self.api.api_prefix
    }

    pub fn target(&self) -> BuildTarget {
        self.probe.target()
    }

    /// API base URL: relative `/api` behind a dev-server proxy, the backend
    /// port on the current hostname otherwise, and a fixed URL inside a
    /// mini-program.
    pub fn resolve_api_base(&self) -> String {
        match self.probe.target() {
            BuildTarget::MiniProgram => self.api.mini_program_base_url.clone(),
            BuildTarget::Web => match self.probe.location() {
                Some(loc) if loc.port.is_some_and(|p| self.api.dev_server_ports.contains(&p)) => {
                    self.api.api_prefix.clone()
                }
                Some(loc) => format!(
                    "http://{}:{}{}",
                    loc.hostname, self.api.backend_port, self.api.api_prefix
                ),
                None => format!(
                    "http://localhost:{}{}",
                    self.api.backend_port, self.api.api_prefix
                ),
            },
        }
    }

    /// Origin the web host is served from, used to anchor relative bases.
    pub fn origin(&self) -> Option<String> {
        if self.probe.target() != BuildTarget::Web {
            return None;
        }
        let loc = self.probe.location()?;
        Some(match loc.port {
            Some(port) => format!("http://{}:{}", loc.hostname, port),
            None => format!("http://{}", loc.hostname),
        })
    }

    /// Resource base URL: the API base without its prefix, or empty when
    /// the API base is relative.
    pub fn resolve_resource_base(&self) -> String {
        let api_base = self.resolve_api_base();
        if !api_base.contains("://") {
            return String::new();
        }
        strip_api_suffix(&api_base, &self.api.api_prefix)
    }
}
