/// PostgreSQLを使ったエクスポート/インポートの統合テスト
///
/// testcontainersでPostgreSQLを起動し、あるデータベースからエクスポートした
/// スクリプトを空のデータベースに適用して同じ構造になることを確認します。
///
/// 注意: このテストはDockerが必要です。通常のテスト実行ではスキップされます。

#[cfg(test)]
mod postgres_round_trip_tests {
    use schemaport::adapters::connector::{PostgresConnector, SchemaConnector};
    use schemaport::core::config::{DatabaseConfig, Dialect};
    use schemaport::core::schema::{ColumnType, Schema};
    use schemaport::services::schema_reader::SchemaReader;
    use schemaport::services::schema_transfer::{SchemaExporter, SchemaImporter};
    use schemaport::services::statement_splitter::StatementDelimiter;
    use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
    use testcontainers_modules::postgres::Postgres;

    async fn start_postgres(
    ) -> Result<(ContainerAsync<Postgres>, DatabaseConfig), Box<dyn std::error::Error>> {
        let container = Postgres::default().with_tag("16-alpine").start().await?;
        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(5432).await?;

        let config = DatabaseConfig {
            dialect: Dialect::PostgreSQL,
            host: host.to_string(),
            port: Some(port),
            database: "postgres".to_string(),
            user: Some("postgres".to_string()),
            password: Some("postgres".to_string()),
            timeout: Some(30),
        };

        Ok((container, config))
    }

    fn without_constraint_names(mut schema: Schema) -> Schema {
        for table in schema.tables.values_mut() {
            for fk in &mut table.foreign_keys {
                fk.name.clear();
            }
        }
        schema
    }

    #[tokio::test]
    #[ignore] // Docker必須のため、通常のテスト実行ではスキップ
    async fn test_postgres_round_trip() {
        let (_container, config) = start_postgres().await.unwrap();
        let source = PostgresConnector::connect(&config).await.unwrap();

        for sql in [
            "CREATE TABLE sections (
                id SERIAL PRIMARY KEY,
                category_id INTEGER NOT NULL,
                title VARCHAR(80) DEFAULT 'untitled'
            )",
            "CREATE TABLE categories (id SERIAL PRIMARY KEY, name VARCHAR(50) NOT NULL)",
            "ALTER TABLE sections ADD CONSTRAINT fk_sections_categories
                FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE",
            "CREATE DATABASE schema_copy",
        ] {
            source.execute_statement(sql).await.unwrap();
        }

        let script = SchemaExporter::new()
            .render(&source, Dialect::PostgreSQL)
            .await
            .unwrap();
        assert!(script.find("\"categories\"").unwrap() < script.find("\"sections\"").unwrap());
        assert!(script.contains("\"id\" SERIAL NOT NULL"));

        let mut copy_config = config.clone();
        copy_config.database = "schema_copy".to_string();
        let target = PostgresConnector::connect(&copy_config).await.unwrap();
        let applied = SchemaImporter::new(StatementDelimiter::Semicolon)
            .import_script(&target, &script)
            .await
            .unwrap();
        assert_eq!(applied, 2);

        let reader = SchemaReader::new();
        let original = reader.read_schema(&source).await.unwrap();
        let copy = reader.read_schema(&target).await.unwrap();
        source.close().await;
        target.close().await;

        let sections = original.get_table("sections").unwrap();
        assert_eq!(
            sections.get_column("id").unwrap().column_type,
            ColumnType::AutoNumber
        );
        assert_eq!(
            sections.get_column("title").unwrap().default_value.as_deref(),
            Some("'untitled'")
        );
        assert_eq!(
            without_constraint_names(copy),
            without_constraint_names(original)
        );
    }
}
