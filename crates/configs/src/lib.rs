use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Optional separate listener for `/healthz` + `/metrics`.
    #[serde(default)]
    pub admin_addr: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4), admin_addr: None }
    }
}

/// Limits for the in-memory entity stores.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_max_bulk")]
    pub max_bulk: usize,
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,
    #[serde(default)]
    pub seed_demo_data: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_bulk: default_max_bulk(),
            audit_capacity: default_audit_capacity(),
            seed_demo_data: false,
        }
    }
}

fn default_max_bulk() -> usize { 100 }
fn default_audit_capacity() -> usize { 1000 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to env vars only when
    /// the file is absent, then normalize and validate.
    pub fn load_and_validate() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_and_validate_from(&path)
    }

    /// Same as [`load_and_validate`](Self::load_and_validate) for an explicit path.
    /// A file that exists but does not parse is an error, not a fallback.
    pub fn load_and_validate_from(path: &str) -> Result<Self> {
        let mut cfg = match load_from_file(path) {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => Self::from_env(),
            Err(e) => return Err(anyhow!("cannot load config {path}: {e}")),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by `SERVER_HOST`, `SERVER_PORT`, `TOKIO_WORKER_THREADS`,
    /// `ADMIN_ADDR`, `MAX_BULK`, `AUDIT_CAPACITY` and `SEED_DEMO_DATA`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = env_parse::<u16>("SERVER_PORT") {
            cfg.server.port = port;
        }
        if let Some(w) = env_parse::<usize>("TOKIO_WORKER_THREADS") {
            cfg.server.worker_threads = Some(w);
        }
        if let Ok(addr) = std::env::var("ADMIN_ADDR") {
            cfg.server.admin_addr = Some(addr);
        }
        if let Some(n) = env_parse::<usize>("MAX_BULK") {
            cfg.store.max_bulk = n;
        }
        if let Some(n) = env_parse::<usize>("AUDIT_CAPACITY") {
            cfg.store.audit_capacity = n;
        }
        if let Some(b) = env_parse::<bool>("SEED_DEMO_DATA") {
            cfg.store.seed_demo_data = b;
        }
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        self.store.validate()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        if let Some(addr) = &self.admin_addr {
            if addr.trim().is_empty() {
                self.admin_addr = None;
            }
        }
        Ok(())
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_bulk == 0 {
            return Err(anyhow!("store.max_bulk must be >= 1"));
        }
        if self.audit_capacity == 0 {
            return Err(anyhow!("store.audit_capacity must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 3000
            worker_threads = 2

            [store]
            max_bulk = 50
            audit_capacity = 10
            seed_demo_data = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.server.worker_threads, Some(2));
        assert_eq!(cfg.store.max_bulk, 50);
        assert!(cfg.store.seed_demo_data);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn store_section_defaults_when_missing() {
        let cfg = parse("[server]\nhost = \"127.0.0.1\"\nport = 8080\n").unwrap();
        assert_eq!(cfg.store.max_bulk, 100);
        assert_eq!(cfg.store.audit_capacity, 1000);
        assert!(!cfg.store.seed_demo_data);
    }

    #[test]
    fn normalize_fills_host_and_threads() {
        let mut cfg = parse("[server]\nhost = \" \"\nport = 9000\nworker_threads = 0\n").unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.worker_threads, Some(4));
    }

    #[test]
    fn rejects_zero_port_and_zero_limits() {
        let mut cfg = parse("[server]\nhost = \"h\"\nport = 0\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = parse("[server]\nhost = \"h\"\nport = 1\n[store]\nmax_bulk = 0\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn malformed_file_is_an_error_but_missing_file_falls_back() {
        let dir = std::env::temp_dir().join(format!("configs-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let bad = dir.join("bad.toml");
        std::fs::write(&bad, "[server]\nhost = \"h\"\nport = \"not-a-number\"\n").unwrap();
        assert!(AppConfig::load_and_validate_from(bad.to_str().unwrap()).is_err());

        let missing = dir.join("absent.toml");
        assert!(AppConfig::load_and_validate_from(missing.to_str().unwrap()).is_ok());
        std::fs::remove_dir_all(&dir).ok();
    }
}
