use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string
    pub redis_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// When false, outbound email tasks are logged instead of enqueued
    pub send_email: bool,

    /// Public base URL of the dashboard, always with a trailing slash
    pub site_url: String,

    /// Base URL of the external task-queue broker
    pub taskqueue_url: String,

    /// Redis list key that delivery workers consume
    pub outbound_email_queue: String,

    /// Mailing list that receives review comments posted to intent threads
    pub review_comment_mailing_list: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            send_email: std::env::var("SEND_EMAIL")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            site_url: ensure_trailing_slash(
                std::env::var("SITE_URL")
                    .unwrap_or_else(|_| "https://herald.example.com/".to_string()),
            ),
            taskqueue_url: std::env::var("TASKQUEUE_URL")
                .unwrap_or_else(|_| "http://localhost:8070".to_string()),
            outbound_email_queue: std::env::var("OUTBOUND_EMAIL_QUEUE")
                .unwrap_or_else(|_| "herald:outbound-email".to_string()),
            review_comment_mailing_list: std::env::var("REVIEW_COMMENT_MAILING_LIST")
                .unwrap_or_else(|_| "intents@herald.dev".to_string()),
        })
    }
}

/// Links in email bodies are built as `{site_url}feature/{id}`, so the
/// configured URL must end with a slash.
fn ensure_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_added() {
        assert_eq!(
            ensure_trailing_slash("https://x.test".to_string()),
            "https://x.test/"
        );
    }

    #[test]
    fn test_trailing_slash_preserved() {
        assert_eq!(
            ensure_trailing_slash("https://x.test/".to_string()),
            "https://x.test/"
        );
    }
}
