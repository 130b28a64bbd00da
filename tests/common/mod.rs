#![allow(dead_code)]

use std::net::TcpListener;

use magnetcraft_admin::{ClientConfig, HttpReportClient};
use tempfile::TempDir;
use wiremock::MockServer;

/// Mock backend plus a client pointed at it, saving downloads into a
/// throwaway directory.
pub struct TestBackend {
    pub server: MockServer,
    pub client: HttpReportClient,
    pub downloads: TempDir,
}

impl TestBackend {
    pub async fn start() -> Self {
        Self::build(None).await
    }

    pub async fn start_with_cookie(cookie: &str) -> Self {
        Self::build(Some(cookie.to_string())).await
    }

    async fn build(session_cookie: Option<String>) -> Self {
        let server = MockServer::start().await;
        let downloads = tempfile::tempdir().expect("temp download dir");

        let mut config = ClientConfig::new(server.uri());
        config.download_dir = downloads.path().to_path_buf();
        config.session_cookie = session_cookie;
        config.request_timeout_secs = 5;

        let client = HttpReportClient::new(&config).expect("client builds");
        Self {
            server,
            client,
            downloads,
        }
    }

    /// Names of the files present in the download directory, sorted.
    pub fn downloaded_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.downloads.path())
            .expect("read download dir")
            .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Client aimed at a local port nothing listens on.
pub fn unreachable_client() -> (HttpReportClient, TempDir) {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        listener.local_addr().expect("local addr").port()
    };
    let downloads = tempfile::tempdir().expect("temp download dir");

    let mut config = ClientConfig::new(format!("http://127.0.0.1:{}", port));
    config.download_dir = downloads.path().to_path_buf();
    config.request_timeout_secs = 2;

    let client = HttpReportClient::new(&config).expect("client builds");
    (client, downloads)
}
