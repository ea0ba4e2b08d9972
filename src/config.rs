use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Clinica";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default listen port, overridable via `CLINICA_PORT`.
pub const DEFAULT_PORT: u16 = 2022;

/// Development token secret used when `CLINICA_TOKEN_SECRET` is unset.
const DEV_TOKEN_SECRET: &str = "clinica-dev-secret-do-not-use-in-production";

/// Get the application data directory
/// ~/Clinica/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Clinica")
}

/// Database file path: `CLINICA_DB` if set, else ~/Clinica/clinica.db
pub fn database_path() -> PathBuf {
    match std::env::var("CLINICA_DB") {
        Ok(path) => PathBuf::from(path),
        Err(_) => app_data_dir().join("clinica.db"),
    }
}

/// Socket address the API server binds: `CLINICA_BIND` host (default
/// 127.0.0.1) and `CLINICA_PORT` (default 2022).
pub fn bind_addr() -> SocketAddr {
    let host: IpAddr = std::env::var("CLINICA_BIND")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    let port: u16 = std::env::var("CLINICA_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    SocketAddr::new(host, port)
}

/// Secret used to sign bearer tokens (HS256).
pub fn token_secret() -> String {
    match std::env::var("CLINICA_TOKEN_SECRET") {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            tracing::warn!("CLINICA_TOKEN_SECRET not set, using development secret");
            DEV_TOKEN_SECRET.to_string()
        }
    }
}

pub fn default_log_filter() -> &'static str {
    "info,clinica=debug"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Clinica"));
    }

    #[test]
    fn app_name_is_clinica() {
        assert_eq!(APP_NAME, "Clinica");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_bind_is_loopback() {
        // Only meaningful when the env overrides are absent
        if std::env::var("CLINICA_BIND").is_err() && std::env::var("CLINICA_PORT").is_err() {
            let addr = bind_addr();
            assert!(addr.ip().is_loopback());
            assert_eq!(addr.port(), DEFAULT_PORT);
        }
    }
}
