//! Shared server harness for integration tests

use std::net::SocketAddr;
use std::path::PathBuf;

use dripfeed_core::ServerConfig;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A dripfeed server bound to an ephemeral port, with a scratch files root.
///
/// The server task runs until dropped, shut down, or the test ends.
pub struct TestServer {
    pub addr: SocketAddr,
    pub files_dir: PathBuf,
    pub task: JoinHandle<std::io::Result<()>>,
    _files_root: TempDir,
}

impl TestServer {
    /// Starts a server with the default testing config (empty delay table).
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Starts a server after letting the caller adjust the config
    /// (delay-table entries, chunk sizes).
    pub async fn start_with(customize: impl FnOnce(&mut ServerConfig)) -> Self {
        let files_root = TempDir::new().expect("create temp files dir");
        let mut config = ServerConfig::for_testing();
        config.files.root_dir = files_root.path().to_path_buf();
        customize(&mut config);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("listener address");
        let files_dir = config.files.root_dir.clone();
        let task = tokio::spawn(dripfeed_web::serve_with_listener(listener, config));

        TestServer {
            addr,
            files_dir,
            task,
            _files_root: files_root,
        }
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Places a file into the served directory.
    pub fn write_file(&self, name: &str, contents: &[u8]) {
        std::fs::write(self.files_dir.join(name), contents).expect("write test file");
    }
}

/// Deterministic pseudo-random payload for round-trip comparisons.
pub fn patterned_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
