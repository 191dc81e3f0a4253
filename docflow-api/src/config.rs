use serde::Deserialize;

/// Plain, `serde`-deserializable mirror of every configuration key this
/// workspace's services recognize. Loading it from a file, environment, or
/// secrets manager is the deployer's job, not this crate's — these structs
/// only describe the shape.
#[derive(Debug, Clone, Deserialize)]
pub struct DocFlowConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub object_store: ObjectStoreConfig,
    pub indexer: IndexerConfig,
    pub auth: AuthConfig,
    pub antivirus: AntivirusConfig,
    pub queue: QueueConfig,
    pub event_broker: EventBrokerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub tls_enabled: bool,
    #[serde(default)]
    pub tls_cert_path: Option<String>,
    #[serde(default)]
    pub tls_key_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub sslmode: String,
    pub min_pool_size: u32,
    pub max_pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreConfig {
    pub region: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub temp_bucket: String,
    pub permanent_bucket: String,
    pub quarantine_bucket: String,
    pub sse_key_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexerConfig {
    pub addresses: Vec<String>,
    #[serde(default)]
    pub credentials: Option<String>,
    pub index_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub private_key_path: String,
    pub public_key_path: String,
    pub issuer: String,
    pub token_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AntivirusConfig {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    pub region: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub processing_queue_url: String,
    pub scanning_queue_url: String,
    pub indexing_queue_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventBrokerConfig {
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub document_topic_arn: String,
    pub folder_topic_arn: String,
    pub audit_topic_arn: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_complete_config_document() {
        let raw = r#"
        {
            "server": {"host": "0.0.0.0", "port": 8080, "read_timeout_secs": 30, "write_timeout_secs": 30, "idle_timeout_secs": 60, "tls_enabled": false},
            "database": {"host": "db", "port": 5432, "user": "docflow", "password": "secret", "dbname": "docflow", "sslmode": "require", "min_pool_size": 2, "max_pool_size": 20},
            "object_store": {"region": "us-east-1", "endpoint": "https://s3.example.com", "access_key": "ak", "secret_key": "sk", "temp_bucket": "docflow-temp", "permanent_bucket": "docflow-permanent", "quarantine_bucket": "docflow-quarantine", "sse_key_id": "key-1"},
            "indexer": {"addresses": ["http://search:9200"], "index_prefix": "docflow"},
            "auth": {"private_key_path": "/keys/priv.pem", "public_key_path": "/keys/pub.pem", "issuer": "docflow-auth", "token_ttl_secs": 900, "refresh_ttl_secs": 86400},
            "antivirus": {"host": "clamav", "port": 3310, "timeout_secs": 10},
            "queue": {"region": "us-east-1", "endpoint": "https://sqs.example.com", "access_key": "ak", "secret_key": "sk", "processing_queue_url": "q/processing", "scanning_queue_url": "q/scanning", "indexing_queue_url": "q/indexing"},
            "event_broker": {"region": "us-east-1", "access_key": "ak", "secret_key": "sk", "document_topic_arn": "arn:topic:doc", "folder_topic_arn": "arn:topic:folder", "audit_topic_arn": "arn:topic:audit"}
        }
        "#;

        let config: DocFlowConfig = serde_json::from_str(raw).expect("valid config document");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.object_store.temp_bucket, "docflow-temp");
        assert_eq!(config.queue.processing_queue_url, "q/processing");
    }

    #[test]
    fn rejects_a_config_missing_a_required_key() {
        let raw = r#"{"server": {"host": "0.0.0.0"}}"#;
        let result: Result<DocFlowConfig, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }
}
