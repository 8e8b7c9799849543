//! Centralized configuration for Dripfeed.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase. Everything is
//! read-only after process start; handlers share the config via `Arc`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Central configuration for all Dripfeed components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub files: FileServingConfig,
    pub upload: UploadConfig,
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address the server binds to
    pub bind_address: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

/// Paced file delivery configuration for the `/files` endpoint.
///
/// The delay table maps a filename to the target total streaming duration
/// for that file; files not listed stream unpaced.
#[derive(Debug, Clone)]
pub struct FileServingConfig {
    /// Directory the `/files/{filename}` endpoint serves from
    pub root_dir: PathBuf,
    /// Fixed transfer chunk size
    pub chunk_size: u64,
    /// Filename → target total streaming duration
    pub delays: HashMap<String, Duration>,
}

impl Default for FileServingConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("files"),
            chunk_size: 65536, // 64 KiB
            delays: default_delay_table(),
        }
    }
}

impl FileServingConfig {
    /// Target streaming duration for `filename`, zero when unlisted.
    pub fn delay_for(&self, filename: &str) -> Duration {
        self.delays.get(filename).copied().unwrap_or(Duration::ZERO)
    }
}

fn default_delay_table() -> HashMap<String, Duration> {
    HashMap::from([
        ("5MB-test.ZIP".to_string(), Duration::from_secs_f64(1.0)),
        ("57MB-test.ZIP".to_string(), Duration::from_secs_f64(10.0)),
        ("1MB-test.bin".to_string(), Duration::from_secs_f64(0.5)),
    ])
}

/// Slow-upload simulation parameters for `/upload_binary`.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Window size the request body is consumed in
    pub chunk_size: usize,
    /// Sleep inserted after consuming each window
    pub chunk_delay: Duration,
    /// Bodies shorter than this are echoed back verbatim; longer bodies
    /// are reduced to their decimal byte length
    pub inline_body_limit: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_delay: Duration::from_millis(50),
            inline_body_limit: 100,
        }
    }
}

impl ServerConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(bind) = std::env::var("DRIPFEED_BIND") {
            if let Ok(address) = bind.parse::<SocketAddr>() {
                config.http.bind_address = address;
            }
        }

        if let Ok(dir) = std::env::var("DRIPFEED_FILES_DIR") {
            config.files.root_dir = PathBuf::from(dir);
        }

        if let Ok(chunk_size) = std::env::var("DRIPFEED_CHUNK_SIZE") {
            if let Ok(bytes) = chunk_size.parse::<u64>() {
                if bytes > 0 {
                    config.files.chunk_size = bytes;
                }
            }
        }

        config
    }

    /// Creates a configuration optimized for testing.
    ///
    /// Binds to an ephemeral port and starts with an empty delay table so
    /// tests opt in to pacing explicitly.
    pub fn for_testing() -> Self {
        let mut config = Self::default();
        config.http.bind_address = SocketAddr::from(([127, 0, 0, 1], 0));
        config.files.delays = HashMap::new();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = ServerConfig::default();

        assert_eq!(
            config.http.bind_address,
            SocketAddr::from(([127, 0, 0, 1], 8080))
        );
        assert_eq!(config.files.root_dir, PathBuf::from("files"));
        assert_eq!(config.files.chunk_size, 65536);
        assert_eq!(config.upload.chunk_size, 1024);
        assert_eq!(config.upload.chunk_delay, Duration::from_millis(50));
        assert_eq!(config.upload.inline_body_limit, 100);
    }

    #[test]
    fn test_default_delay_table_entries() {
        let config = ServerConfig::default();

        assert_eq!(
            config.files.delay_for("5MB-test.ZIP"),
            Duration::from_secs_f64(1.0)
        );
        assert_eq!(
            config.files.delay_for("57MB-test.ZIP"),
            Duration::from_secs_f64(10.0)
        );
        assert_eq!(
            config.files.delay_for("1MB-test.bin"),
            Duration::from_secs_f64(0.5)
        );
        assert_eq!(config.files.delay_for("unlisted.bin"), Duration::ZERO);
    }

    #[test]
    fn test_testing_preset() {
        let config = ServerConfig::for_testing();

        assert_eq!(config.http.bind_address.port(), 0);
        assert!(config.files.delays.is_empty());
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("DRIPFEED_BIND", "127.0.0.1:9099");
            std::env::set_var("DRIPFEED_FILES_DIR", "/tmp/dripfeed-files");
            std::env::set_var("DRIPFEED_CHUNK_SIZE", "4096");
        }

        let config = ServerConfig::from_env();

        assert_eq!(config.http.bind_address.port(), 9099);
        assert_eq!(config.files.root_dir, PathBuf::from("/tmp/dripfeed-files"));
        assert_eq!(config.files.chunk_size, 4096);

        // A zero chunk size would break pacing; the override is ignored.
        unsafe {
            std::env::set_var("DRIPFEED_CHUNK_SIZE", "0");
        }
        let config = ServerConfig::from_env();
        assert_eq!(config.files.chunk_size, 65536);

        // Cleanup
        unsafe {
            std::env::remove_var("DRIPFEED_BIND");
            std::env::remove_var("DRIPFEED_FILES_DIR");
            std::env::remove_var("DRIPFEED_CHUNK_SIZE");
        }
    }
}
