//! Redis counter store
//!
//! Each cycle key is a Redis hash and each target a field inside it. Both
//! batches are sent as `MULTI`/`EXEC` pipelines, so Redis applies them
//! without interleaving other clients' commands.

use super::{CounterKey, CounterOp, CounterStore};
use ::redis::{aio::MultiplexedConnection, Client, RedisError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use trafficsplit_common::{Result, TrafficError};

/// Redis-backed implementation of [`CounterStore`]
pub struct RedisCounterStore {
    /// Redis client
    client: Client,
    /// Shared multiplexed connection, re-established lazily
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    /// Optional prefix prepended to every hash key
    prefix: Option<String>,
}

impl RedisCounterStore {
    /// Connect to Redis, failing if the server is not reachable
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let store = Self::open(redis_url)?;
        let connection = store.client.get_multiplexed_async_connection().await.map_err(|e| {
            TrafficError::StoreUnavailable(format!("Failed to connect to Redis: {}", e))
        })?;
        *store.connection.write().await = Some(connection);
        Ok(store)
    }

    /// Create a store without connecting; the first batch connects
    pub fn open(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| TrafficError::Config(format!("Invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            prefix: None,
        })
    }

    /// Namespace every hash key as `<prefix>:<cycle key>`
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    fn redis_key(&self, namespace: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, namespace),
            None => namespace.to_string(),
        }
    }

    /// Get the shared connection, connecting if needed
    async fn get_connection(&self) -> std::result::Result<MultiplexedConnection, RedisError> {
        let guard = self.connection.read().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }
        drop(guard);

        let mut guard = self.connection.write().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let connection = self.client.get_multiplexed_async_connection().await?;
        *guard = Some(connection.clone());
        Ok(connection)
    }

    /// Run an atomic pipeline under a deadline, mapping failures onto
    /// store errors
    async fn execute<T>(
        &self,
        operation: &'static str,
        pipe: &::redis::Pipeline,
        deadline: Duration,
    ) -> Result<T>
    where
        T: ::redis::FromRedisValue,
    {
        let run = async {
            let mut conn = self.get_connection().await?;
            pipe.query_async::<_, T>(&mut conn).await
        };

        match tokio::time::timeout(deadline, run).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) if e.is_timeout() => {
                warn!(operation, error = %e, "Redis batch timed out");
                Err(TrafficError::StoreTimeout {
                    operation,
                    limit_ms: deadline.as_millis() as u64,
                })
            }
            Ok(Err(e)) => {
                if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
                    // Force a reconnect on the next batch
                    *self.connection.write().await = None;
                }
                warn!(operation, error = %e, "Redis batch failed");
                Err(TrafficError::StoreUnavailable(format!(
                    "Redis {} failed: {}",
                    operation, e
                )))
            }
            Err(_) => {
                warn!(operation, limit_ms = deadline.as_millis() as u64, "Redis batch deadline elapsed");
                Err(TrafficError::StoreTimeout {
                    operation,
                    limit_ms: deadline.as_millis() as u64,
                })
            }
        }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    #[instrument(skip(self, keys), fields(keys = keys.len()))]
    async fn batch_increment(&self, keys: &[CounterKey], deadline: Duration) -> Result<Vec<i64>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = ::redis::pipe();
        pipe.atomic();
        for key in keys {
            pipe.hincr(self.redis_key(&key.namespace), &key.field, 1i64);
        }

        let values: Vec<i64> = self.execute("probe", &pipe, deadline).await?;
        if values.len() != keys.len() {
            return Err(TrafficError::StoreUnavailable(format!(
                "Redis probe returned {} replies for {} keys",
                values.len(),
                keys.len()
            )));
        }

        debug!(?values, "Probe batch applied");
        Ok(values)
    }

    #[instrument(skip(self, ops), fields(ops = ops.len()))]
    async fn batch_apply(&self, ops: &[CounterOp], deadline: Duration) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }

        let mut pipe = ::redis::pipe();
        pipe.atomic();
        for op in ops {
            match op {
                CounterOp::Reset(key) => {
                    pipe.hset(self.redis_key(&key.namespace), &key.field, 0i64)
                        .ignore();
                }
                CounterOp::Decrement(key) => {
                    pipe.hincr(self.redis_key(&key.namespace), &key.field, -1i64)
                        .ignore();
                }
            }
        }

        self.execute::<()>("compensation", &pipe, deadline).await?;
        debug!("Compensation batch applied");
        Ok(())
    }
}
