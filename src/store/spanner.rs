use anyhow::{Context, Result};
use async_trait::async_trait;
use gcloud_gax::grpc::Code;
use gcloud_googleapis::spanner::admin::database::v1::{
    CreateDatabaseRequest, GetDatabaseDdlRequest, GetDatabaseRequest, UpdateDatabaseDdlRequest,
};
use gcloud_googleapis::spanner::admin::instance::v1::{
    CreateInstanceRequest, GetInstanceRequest, Instance,
};
use gcloud_spanner::admin::client::Client as AdminClient;
use gcloud_spanner::admin::AdminClientConfig;
use gcloud_spanner::client::{Client, ClientConfig};
use gcloud_spanner::mutation::insert_or_update;
use gcloud_spanner::statement::Statement;
use gcloud_spanner::value::CommitTimestamp;
use std::sync::Arc;

use super::{KvStore, Record};
use crate::config::SpannerConfig;

/// Key-value records stored in a Cloud Spanner table
///
/// Cheap to clone; all clones share one session pool.
#[derive(Clone)]
pub struct SpannerStore {
    inner: Arc<Client>,
    table: Arc<str>,
}

impl SpannerStore {
    /// Connect to Spanner, provisioning the instance, database and table first
    ///
    /// The gcloud-spanner library picks up SPANNER_EMULATOR_HOST from the
    /// environment and talks to the emulator when it is set.
    ///
    /// `table` is interpolated into SQL and must already be a validated
    /// identifier (see `Config::from_lookup`).
    pub async fn from_config(config: &SpannerConfig, table: &str) -> Result<Self> {
        auto_provision(config, table).await?;

        let database_path = format!(
            "projects/{}/instances/{}/databases/{}",
            config.project, config.instance, config.database
        );

        match &config.emulator_host {
            Some(host) => tracing::info!("Connecting to Spanner emulator at: {}", host),
            None => tracing::info!("Connecting to production Spanner"),
        }

        let client = Client::new(&database_path, ClientConfig::default())
            .await
            .context("Failed to create Spanner client")?;

        tracing::info!(
            "Successfully connected to Spanner database: {}",
            database_path
        );

        Ok(Self {
            inner: Arc::new(client),
            table: Arc::from(table),
        })
    }
}

#[async_trait]
impl KvStore for SpannerStore {
    async fn upsert(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();

        let mutation = insert_or_update(
            self.table.as_ref(),
            &["id", "value", "updated_at"],
            &[&key, &value, &CommitTimestamp::new()],
        );

        self.inner
            .apply(vec![mutation])
            .await
            .context("Failed to upsert record to Spanner")?;

        tracing::debug!("Upserted record with key: {}", key);
        Ok(())
    }

    async fn find_one(&self, key: &str) -> Result<Option<String>> {
        let mut statement =
            Statement::new(&format!("SELECT value FROM {} WHERE id = @id", self.table));
        statement.add_param("id", &key.to_string());

        let mut tx = self
            .inner
            .single()
            .await
            .context("Failed to create read transaction")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to query record from Spanner")?;

        match result_set.next().await.context("Failed to read result row")? {
            Some(row) => {
                let value: String = row
                    .column_by_name("value")
                    .context("Failed to decode value column")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Record>> {
        let statement = Statement::new(&format!("SELECT id, value FROM {}", self.table));

        let mut tx = self
            .inner
            .single()
            .await
            .context("Failed to create read transaction for list")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to execute list query")?;

        let mut records = Vec::new();
        while let Some(row) = result_set.next().await.context("Failed to read result row")? {
            let key: String = row
                .column_by_name("id")
                .context("Failed to decode id column")?;
            let value: String = row
                .column_by_name("value")
                .context("Failed to decode value column")?;
            records.push(Record { key, value });
        }

        tracing::debug!("Listed {} records from {}", records.len(), self.table);
        Ok(records)
    }

    /// Runs `SELECT 1` to prove the session is alive
    async fn health_check(&self) -> Result<()> {
        let statement = Statement::new("SELECT 1");

        let mut tx = self
            .inner
            .single()
            .await
            .context("Failed to create health check transaction")?;

        let mut result_set = tx
            .query(statement)
            .await
            .context("Failed to execute health check query")?;

        if result_set
            .next()
            .await
            .context("Failed to read health check row")?
            .is_some()
        {
            tracing::debug!("Health check query succeeded");
            Ok(())
        } else {
            Err(anyhow::anyhow!("Health check query returned no results"))
        }
    }
}

/// Create the instance, database and table when they don't exist yet
async fn auto_provision(config: &SpannerConfig, table: &str) -> Result<()> {
    tracing::info!("Starting auto-provisioning checks...");

    let admin_client = AdminClient::new(AdminClientConfig::default())
        .await
        .context("Failed to create Spanner admin client")?;

    let project_path = format!("projects/{}", config.project);
    let instance_path = format!("{}/instances/{}", project_path, config.instance);
    let database_path = format!("{}/databases/{}", instance_path, config.database);

    ensure_instance_exists(&admin_client, config, &project_path, &instance_path).await?;
    ensure_database_exists(&admin_client, &instance_path, &database_path).await?;
    ensure_table_exists(&admin_client, &database_path, table).await?;

    tracing::info!("Auto-provisioning complete");
    Ok(())
}

async fn ensure_instance_exists(
    admin_client: &AdminClient,
    config: &SpannerConfig,
    project_path: &str,
    instance_path: &str,
) -> Result<()> {
    let get_request = GetInstanceRequest {
        name: instance_path.to_string(),
        field_mask: None,
    };

    match admin_client.instance().get_instance(get_request, None).await {
        Ok(_) => {
            tracing::info!("Instance already exists: {}", instance_path);
            Ok(())
        }
        Err(status) if status.code() == Code::NotFound => {
            tracing::info!("Instance not found, creating: {}", instance_path);

            let instance_config = if config.emulator_host.is_some() {
                format!("{}/instanceConfigs/emulator-config", project_path)
            } else {
                format!("{}/instanceConfigs/regional-us-central1", project_path)
            };

            let create_request = CreateInstanceRequest {
                parent: project_path.to_string(),
                instance_id: config.instance.clone(),
                instance: Some(Instance {
                    name: instance_path.to_string(),
                    config: instance_config,
                    display_name: format!("{} instance", config.instance),
                    node_count: 1,
                    ..Default::default()
                }),
            };

            let mut operation = admin_client
                .instance()
                .create_instance(create_request, None)
                .await
                .context("Failed to start instance creation")?;

            operation
                .wait(None)
                .await
                .context("Failed to create instance")?;

            tracing::info!("Instance created successfully: {}", instance_path);
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!(
            "Failed to check instance existence: {}",
            e.message()
        )),
    }
}

async fn ensure_database_exists(
    admin_client: &AdminClient,
    instance_path: &str,
    database_path: &str,
) -> Result<()> {
    let get_request = GetDatabaseRequest {
        name: database_path.to_string(),
    };

    match admin_client
        .database()
        .get_database(get_request, None)
        .await
    {
        Ok(_) => {
            tracing::info!("Database already exists: {}", database_path);
            Ok(())
        }
        Err(status) if status.code() == Code::NotFound => {
            tracing::info!("Database not found, creating: {}", database_path);

            let database_id = database_path
                .split('/')
                .next_back()
                .context("Invalid database path")?;

            let create_request = CreateDatabaseRequest {
                parent: instance_path.to_string(),
                create_statement: format!("CREATE DATABASE `{}`", database_id),
                extra_statements: vec![],
                encryption_config: None,
                database_dialect: 1, // Google Standard SQL
                proto_descriptors: vec![],
            };

            let mut operation = admin_client
                .database()
                .create_database(create_request, None)
                .await
                .context("Failed to start database creation")?;

            operation
                .wait(None)
                .await
                .context("Failed to create database")?;

            tracing::info!("Database created successfully: {}", database_path);
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!(
            "Failed to check database existence: {}",
            e.message()
        )),
    }
}

fn create_table_ddl(table: &str) -> String {
    format!(
        r#"CREATE TABLE {} (
    id STRING(MAX) NOT NULL,
    value STRING(MAX) NOT NULL,
    updated_at TIMESTAMP NOT NULL OPTIONS (allow_commit_timestamp=true),
) PRIMARY KEY (id)"#,
        table
    )
}

fn ddl_defines_table(statements: &[String], table: &str) -> bool {
    let plain = format!("CREATE TABLE {} ", table);
    let quoted = format!("CREATE TABLE `{}`", table);
    statements
        .iter()
        .any(|stmt| stmt.starts_with(&plain) || stmt.starts_with(&quoted))
}

async fn ensure_table_exists(
    admin_client: &AdminClient,
    database_path: &str,
    table: &str,
) -> Result<()> {
    let get_ddl_request = GetDatabaseDdlRequest {
        database: database_path.to_string(),
    };

    let ddl_response = admin_client
        .database()
        .get_database_ddl(get_ddl_request, None)
        .await
        .context("Failed to get database DDL")?;

    if ddl_defines_table(&ddl_response.into_inner().statements, table) {
        tracing::info!("Table '{}' already exists", table);
        return Ok(());
    }

    tracing::info!("Table '{}' not found, creating...", table);

    let update_request = UpdateDatabaseDdlRequest {
        database: database_path.to_string(),
        statements: vec![create_table_ddl(table)],
        operation_id: String::new(),
        proto_descriptors: vec![],
        throughput_mode: false,
    };

    let mut operation = admin_client
        .database()
        .update_database_ddl(update_request, None)
        .await
        .context("Failed to start table creation")?;

    operation
        .wait(None)
        .await
        .context("Failed to create table")?;

    tracing::info!("Table '{}' created successfully", table);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emulator_config(instance: &str) -> SpannerConfig {
        unsafe {
            std::env::set_var("SPANNER_EMULATOR_HOST", "localhost:9010");
        }

        SpannerConfig {
            emulator_host: Some("localhost:9010".to_string()),
            project: "test-project".to_string(),
            instance: instance.to_string(),
            database: format!("{}-db", instance),
        }
    }

    #[test]
    fn test_store_is_clonable_and_send_sync() {
        fn assert_traits<T: Clone + Send + Sync>() {}
        assert_traits::<SpannerStore>();
    }

    #[test]
    fn test_create_table_ddl_uses_table_name() {
        let ddl = create_table_ddl("records");
        assert!(ddl.starts_with("CREATE TABLE records ("));
        assert!(ddl.contains("id STRING(MAX) NOT NULL"));
        assert!(ddl.ends_with("PRIMARY KEY (id)"));
    }

    #[test]
    fn test_ddl_defines_table_matches_exact_name() {
        let statements = vec![create_table_ddl("kv_store_archive")];

        assert!(!ddl_defines_table(&statements, "kv_store"));
        assert!(ddl_defines_table(&statements, "kv_store_archive"));
        assert!(ddl_defines_table(
            &["CREATE TABLE `kv_store` (id STRING(MAX))".to_string()],
            "kv_store"
        ));
    }

    #[tokio::test]
    #[ignore = "requires the Spanner emulator on localhost:9010"]
    async fn test_auto_provisioning_idempotent() {
        let config = emulator_config("idempotent-test-instance");

        SpannerStore::from_config(&config, "kv_store")
            .await
            .expect("first provisioning should succeed");
        SpannerStore::from_config(&config, "kv_store")
            .await
            .expect("second provisioning should succeed");
    }

    #[tokio::test]
    #[ignore = "requires the Spanner emulator on localhost:9010"]
    async fn test_upsert_find_and_replace() {
        let config = emulator_config("crud-test-instance");
        let store = SpannerStore::from_config(&config, "kv_store").await.unwrap();
        let key = format!("key-{}", uuid::Uuid::new_v4());

        store.upsert(&key, "first").await.unwrap();
        assert_eq!(store.find_one(&key).await.unwrap(), Some("first".to_string()));

        store.upsert(&key, "second").await.unwrap();
        assert_eq!(store.find_one(&key).await.unwrap(), Some("second".to_string()));

        let missing = format!("missing-{}", uuid::Uuid::new_v4());
        assert_eq!(store.find_one(&missing).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires the Spanner emulator on localhost:9010"]
    async fn test_find_all_contains_written_records() {
        let config = emulator_config("list-test-instance");
        let store = SpannerStore::from_config(&config, "kv_store").await.unwrap();
        let keys: Vec<String> = (0..3).map(|i| format!("list-{}-{}", i, uuid::Uuid::new_v4())).collect();

        for key in &keys {
            store.upsert(key, "v").await.unwrap();
        }

        let records = store.find_all().await.unwrap();
        for key in &keys {
            assert!(records.iter().any(|record| &record.key == key));
        }
    }

    #[tokio::test]
    #[ignore = "requires the Spanner emulator on localhost:9010"]
    async fn test_health_check() {
        let config = emulator_config("health-test-instance");
        let store = SpannerStore::from_config(&config, "kv_store").await.unwrap();

        store.health_check().await.unwrap();
    }
}
