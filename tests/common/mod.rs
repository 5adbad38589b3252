#![allow(dead_code)]

use pathmock::client::HttpRequest;
use pathmock::config::HttpConfig;
use pathmock::mock::{MockDriver, MockResponse};
use serde_json::json;

/// Route handlers shared by the integration tests.
pub mod handlers {
    use super::*;

    pub async fn get_item(req: HttpRequest, res: MockResponse) -> anyhow::Result<()> {
        let id: u64 = req.param("id").unwrap_or_default().parse()?;
        res.json(&json!({ "id": id }))?;
        Ok(())
    }

    pub async fn create_item(req: HttpRequest, res: MockResponse) -> anyhow::Result<()> {
        res.set_status(201);
        res.json(&json!({ "created": req.payload }))?;
        Ok(())
    }

    pub async fn failing(_req: HttpRequest, res: MockResponse) -> anyhow::Result<()> {
        res.set_status(202).write("partial output");
        anyhow::bail!("database unavailable")
    }

    pub async fn conflict(_req: HttpRequest, res: MockResponse) -> anyhow::Result<()> {
        res.set_status(409);
        res.json(&json!({ "error": "already exists" }))?;
        Ok(())
    }

    pub async fn plain_text(_req: HttpRequest, res: MockResponse) -> anyhow::Result<()> {
        res.header("Content-Type", "text/plain").write("hello ").write("world");
        Ok(())
    }

    pub async fn broken_json(_req: HttpRequest, res: MockResponse) -> anyhow::Result<()> {
        res.header("Content-Type", "application/json; charset=utf-8")
            .set_body("{not json");
        Ok(())
    }
}

/// Driver with the `/items` routes registered and no latency.
pub fn items_driver(config: &HttpConfig) -> MockDriver {
    let driver = MockDriver::new(config);
    driver.get("/items/:id", handlers::get_item).unwrap();
    driver.post("/items", handlers::create_item).unwrap();
    driver
}

/// Installs a per-test subscriber that writes through the test harness.
pub struct TestTracing {
    _guard: tracing::subscriber::DefaultGuard,
}

impl TestTracing {
    pub fn init() -> Self {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        Self {
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }
}
