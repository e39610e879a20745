use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use quizbot_core::QuizPipeline;
use quizbot_llm::QuestionGenerator;
use tokio::sync::watch;

use crate::error::GatewayError;
use crate::router::build_router;

const DEFAULT_MAX_BODY_SIZE: usize = 52_428_800;

pub(crate) struct AppState<G> {
    pub pipeline: Arc<QuizPipeline<G>>,
    pub started_at: Instant,
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            started_at: self.started_at,
        }
    }
}

pub struct GatewayServer<G> {
    addr: SocketAddr,
    rate_limit: u32,
    max_body_size: usize,
    pipeline: Arc<QuizPipeline<G>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<G: QuestionGenerator + 'static> GatewayServer<G> {
    #[must_use]
    pub fn new(
        bind: &str,
        port: u16,
        pipeline: Arc<QuizPipeline<G>>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        if bind == "0.0.0.0" {
            tracing::warn!("quiz API binding to 0.0.0.0, it will be reachable from other hosts");
        }

        Self {
            addr,
            rate_limit: 60,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            pipeline,
            shutdown_rx,
        }
    }

    #[must_use]
    pub fn with_rate_limit(mut self, limit: u32) -> Self {
        self.rate_limit = limit;
        self
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve the quiz API until the shutdown channel flips to `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let state = AppState {
            pipeline: self.pipeline,
            started_at: Instant::now(),
        };

        let router = build_router(state, self.rate_limit, self.max_body_size);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind(self.addr.to_string(), e))?;
        tracing::info!("quiz API listening on {}", self.addr);

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            while !*shutdown_rx.borrow_and_update() {
                if shutdown_rx.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
            tracing::info!("quiz API shutting down");
        })
        .await
        .map_err(|e| GatewayError::Server(format!("{e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use quizbot_core::QuizSettings;
    use quizbot_llm::mock::MockGenerator;

    use super::*;

    fn pipeline() -> Arc<QuizPipeline<MockGenerator>> {
        Arc::new(QuizPipeline::new(
            MockGenerator::default(),
            QuizSettings::default(),
        ))
    }

    #[test]
    fn server_builder_chain() {
        let (_stx, srx) = watch::channel(false);
        let server = GatewayServer::new("127.0.0.1", 8090, pipeline(), srx)
            .with_rate_limit(10)
            .with_max_body_size(512);

        assert_eq!(server.rate_limit, 10);
        assert_eq!(server.max_body_size, 512);
        assert_eq!(server.addr().port(), 8090);
    }

    #[test]
    fn server_invalid_bind_fallback() {
        let (_stx, srx) = watch::channel(false);
        let server = GatewayServer::new("not_an_ip", 9999, pipeline(), srx);
        assert_eq!(server.addr(), SocketAddr::from(([127, 0, 0, 1], 9999)));
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let (_stx, srx) = watch::channel(false);
        let err = GatewayServer::new("127.0.0.1", port, pipeline(), srx)
            .serve()
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Bind(..)));
    }

    #[tokio::test]
    async fn stops_on_shutdown_signal() {
        let (stx, srx) = watch::channel(false);
        let server = GatewayServer::new("127.0.0.1", 0, pipeline(), srx);
        let handle = tokio::spawn(server.serve());
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        stx.send(true).unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
