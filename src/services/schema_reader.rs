// スキーマ読み取りサービス
//
// コネクターから取得した生のメタデータ行をプロバイダー非依存の
// スキーマスナップショット（Schema / Table / Column / ForeignKey）に変換します。
// プロバイダーが対応していないメタデータ集合は読み飛ばし、
// それ以外のエラーは呼び出し元に伝播します。

use crate::adapters::connector::{RawColumnRow, RawForeignKeyRow, SchemaConnector};
use crate::adapters::type_classifier::classify;
use crate::core::error::{ConnectorError, SchemaError};
use crate::core::naming::is_internal_table;
use crate::core::schema::{Column, ConstraintAction, Relationship, Schema, Table};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// スキーマ読み取りサービス
#[derive(Debug, Clone)]
pub struct SchemaReader {}

impl SchemaReader {
    /// 新しいSchemaReaderを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 接続先データベースのスキーマスナップショットを読み取る
    ///
    /// # Arguments
    ///
    /// * `connector` - 接続済みのデータベースコネクター
    ///
    /// # Returns
    ///
    /// 内部テーブルを除いた全テーブルのスナップショット
    ///
    /// # Errors
    ///
    /// Unsupported 以外のコネクターエラーはそのまま返します。
    pub async fn read_schema(
        &self,
        connector: &dyn SchemaConnector,
    ) -> Result<Schema, SchemaError> {
        let mut schema = Schema::new();
        let mut relationships = Vec::new();

        for table_name in connector.get_table_names().await? {
            if is_internal_table(&table_name) {
                debug!(table = %table_name, "Skipping internal table");
                continue;
            }

            let table = self.read_table(connector, &table_name).await?;

            let rows = recover_unsupported(
                connector.get_foreign_keys(&table_name).await,
                &table_name,
            )?;
            relationships.extend(
                single_column_constraints(rows, &table_name)
                    .into_iter()
                    .map(to_relationship),
            );

            schema.add_table(table);
        }

        // 全テーブルを読み終えてから外部キーを所有テーブルに紐付ける
        for relationship in relationships {
            match schema.get_table_mut(&relationship.child_table) {
                Some(table) => table.add_foreign_key(relationship.into_foreign_key()),
                None => debug!(
                    constraint = %relationship.name,
                    table = %relationship.child_table,
                    "Owning table is not part of the snapshot, dropping relationship"
                ),
            }
        }

        info!(
            dialect = %connector.dialect(),
            tables = schema.table_count(),
            "Read schema snapshot"
        );

        Ok(schema)
    }

    /// 1テーブル分のカラムと主キーを読み取る
    async fn read_table(
        &self,
        connector: &dyn SchemaConnector,
        table_name: &str,
    ) -> Result<Table, SchemaError> {
        let mut table = Table::new(table_name);

        for row in connector.get_columns(table_name).await? {
            table.add_column(to_column(row));
        }

        let primary_keys =
            recover_unsupported(connector.get_primary_keys(table_name).await, table_name)?;
        if let Some(first) = primary_keys.first() {
            if primary_keys.len() > 1 {
                debug!(
                    table = table_name,
                    columns = primary_keys.len(),
                    "Composite primary key, keeping the first column only"
                );
            }
            table.set_primary_key(first);
        }

        debug!(
            table = table_name,
            columns = table.columns.len(),
            primary_key = ?table.primary_key,
            "Read table"
        );

        Ok(table)
    }
}

impl Default for SchemaReader {
    fn default() -> Self {
        Self::new()
    }
}

/// 未対応のメタデータ集合を空の結果として扱う
fn recover_unsupported<T>(
    result: Result<Vec<T>, ConnectorError>,
    table_name: &str,
) -> Result<Vec<T>, ConnectorError> {
    match result {
        Err(ConnectorError::Unsupported { collection }) => {
            warn!(
                table = table_name,
                collection = %collection,
                "Schema collection is not supported by this provider, continuing without it"
            );
            Ok(Vec::new())
        }
        other => other,
    }
}

fn to_column(row: RawColumnRow) -> Column {
    let column_type = classify(&row.type_name, row.flags, row.length);

    let mut column = Column::new(row.name, column_type, row.nullable).with_position(row.position);

    if column_type.is_character() && row.length > 0 {
        column = column.with_length(u32::try_from(row.length).unwrap_or(u32::MAX));
    }

    if row.has_default {
        if let Some(default_value) = row.default_value {
            column = column.with_default(default_value);
        }
    }

    if row.primary_key == Some(true) {
        column = column.primary();
    }

    if row.unique == Some(true) {
        column = column.unique();
    }

    column
}

/// 複数カラムにまたがる外部キー制約を取り除く
///
/// 1つの制約名に複数の行が対応する場合、その制約は丸ごと読み飛ばし、
/// 制約ごとに1回だけ warn! を出します。
fn single_column_constraints(
    rows: Vec<RawForeignKeyRow>,
    table_name: &str,
) -> Vec<RawForeignKeyRow> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in &rows {
        *counts.entry(row.constraint_name.clone()).or_default() += 1;
    }

    let mut reported = HashSet::new();
    rows.into_iter()
        .filter(|row| {
            let columns = counts.get(&row.constraint_name).copied().unwrap_or(0);
            if columns <= 1 {
                return true;
            }
            if reported.insert(row.constraint_name.clone()) {
                warn!(
                    table = table_name,
                    constraint = %row.constraint_name,
                    columns,
                    "Multi-column foreign key is not supported, skipping constraint"
                );
            }
            false
        })
        .collect()
}

fn to_relationship(row: RawForeignKeyRow) -> Relationship {
    Relationship {
        name: row.constraint_name,
        child_table: row.child_table,
        child_column: row.child_column,
        parent_table: row.parent_table,
        parent_column: row.parent_column,
        on_delete: ConstraintAction::from_rule(&row.delete_rule),
        on_update: ConstraintAction::from_rule(&row.update_rule),
    }
}
