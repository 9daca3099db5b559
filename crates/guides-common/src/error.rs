/// Failures of shared infrastructure. Callers degrade around these rather than failing
/// requests.
#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("redis is not configured")]
    RedisUnavailable,
}
