// 依存順ソートサービス
//
// 外部キーの参照関係からテーブルの作成順を決定します。
// 参照先（親）テーブルが参照元（子）テーブルより先に並ぶよう、
// 深さ優先探索の帰りがけ順でトポロジカルソートを行います。

use crate::core::schema::{Schema, Table};
use std::collections::HashSet;
use tracing::{debug, warn};

/// 依存順ソートサービス
///
/// 循環参照はエラーにせず、循環を閉じる辺を無視して並べます。
/// その場合、循環の一方向だけは順序保証が破れます。
#[derive(Debug, Clone)]
pub struct DependencySorter {}

impl DependencySorter {
    /// 新しいDependencySorterを作成
    pub fn new() -> Self {
        Self {}
    }

    /// テーブル名を作成順に並べる
    ///
    /// テーブルは名前順に、依存先は宣言順に探索するため、結果は決定的です。
    /// 依存のないテーブルが先頭にまとまるとは限りません。
    ///
    /// # Arguments
    ///
    /// * `schema` - スキーマスナップショット
    ///
    /// # Returns
    ///
    /// すべてのテーブル名（各テーブルちょうど1回）
    pub fn order(&self, schema: &Schema) -> Vec<String> {
        struct SortState<'a> {
            schema: &'a Schema,
            visiting: HashSet<&'a str>,
            visited: HashSet<&'a str>,
            order: Vec<String>,
        }

        fn visit<'a>(table: &'a Table, state: &mut SortState<'a>) {
            if state.visited.contains(table.name.as_str()) {
                return;
            }
            let schema = state.schema;
            state.visiting.insert(table.name.as_str());

            for parent_name in table.referenced_tables() {
                if parent_name == table.name {
                    // 自己参照は順序に影響しない
                    continue;
                }

                let Some(parent) = schema.get_table(parent_name) else {
                    debug!(
                        table = %table.name,
                        parent = parent_name,
                        "Referenced table is not part of the snapshot, skipping"
                    );
                    continue;
                };

                if state.visiting.contains(parent.name.as_str()) {
                    warn!(
                        table = %table.name,
                        parent = %parent.name,
                        "Circular foreign key reference, ordering for this edge is not guaranteed"
                    );
                    continue;
                }

                visit(parent, state);
            }

            state.visiting.remove(table.name.as_str());
            state.visited.insert(table.name.as_str());
            state.order.push(table.name.clone());
        }

        let mut state = SortState {
            schema,
            visiting: HashSet::new(),
            visited: HashSet::new(),
            order: Vec::with_capacity(schema.table_count()),
        };

        for table in schema.tables.values() {
            visit(table, &mut state);
        }

        state.order
    }

    /// テーブル定義を作成順に並べる
    pub fn sort_tables<'a>(&self, schema: &'a Schema) -> Vec<&'a Table> {
        let order = self.order(schema);
        schema.tables_in_order(&order)
    }
}

impl Default for DependencySorter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{Column, ColumnType, ForeignKey};

    fn table(name: &str, parents: &[&str]) -> Table {
        let mut table = Table::new(name);
        table.add_column(
            Column::new("id", ColumnType::AutoNumber, false)
                .with_position(1)
                .primary(),
        );
        for (i, parent) in parents.iter().enumerate() {
            let column = format!("{}_id", parent.to_lowercase());
            table.add_column(
                Column::new(column.clone(), ColumnType::Integer, true).with_position(i as u32 + 2),
            );
            table.add_foreign_key(ForeignKey::new(
                format!("FK_{}_{}", name, parent),
                name,
                column,
                *parent,
                "id",
            ));
        }
        table
    }

    fn schema(tables: Vec<Table>) -> Schema {
        let mut schema = Schema::new();
        for table in tables {
            schema.add_table(table);
        }
        schema
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_two_table_export_order() {
        let schema = schema(vec![
            table("Sections", &["Categories"]),
            table("Categories", &[]),
        ]);

        let order = DependencySorter::new().order(&schema);
        assert_eq!(order, vec!["Categories".to_string(), "Sections".to_string()]);
    }

    #[test]
    fn test_child_sorted_before_parent_by_name() {
        let schema = schema(vec![table("Alpha", &["Zulu"]), table("Zulu", &[])]);

        let order = DependencySorter::new().order(&schema);
        assert_eq!(order, vec!["Zulu".to_string(), "Alpha".to_string()]);
    }

    #[test]
    fn test_five_table_chain() {
        let schema = schema(vec![
            table("Categories", &[]),
            table("Makers", &[]),
            table("Series", &["Makers"]),
            table("Sections", &["Categories", "Makers"]),
            table("ImportProducts", &["Sections", "Series", "Makers"]),
        ]);

        let order = DependencySorter::new().order(&schema);
        assert_eq!(order.len(), 5);
        assert_eq!(order.last().map(String::as_str), Some("ImportProducts"));

        for child in ["Sections", "Series"] {
            assert!(position(&order, child) < position(&order, "ImportProducts"));
        }
        assert!(position(&order, "Categories") < position(&order, "Sections"));
        assert!(position(&order, "Makers") < position(&order, "Sections"));
        assert!(position(&order, "Makers") < position(&order, "Series"));
    }

    #[test]
    fn test_every_table_appears_once() {
        let schema = schema(vec![
            table("A", &["B", "C"]),
            table("B", &["C"]),
            table("C", &[]),
            table("D", &[]),
        ]);

        let mut order = DependencySorter::new().order(&schema);
        assert_eq!(order.len(), 4);
        order.sort();
        order.dedup();
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn test_cycle_does_not_fail() {
        let schema = schema(vec![table("A", &["B"]), table("B", &["A"])]);

        let order = DependencySorter::new().order(&schema);
        // A から探索し、B→A の辺は循環として無視される
        assert_eq!(order, vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn test_self_reference_is_ignored() {
        let schema = schema(vec![table("Employees", &["Employees"])]);

        let order = DependencySorter::new().order(&schema);
        assert_eq!(order, vec!["Employees".to_string()]);
    }

    #[test]
    fn test_missing_parent_is_skipped() {
        let schema = schema(vec![table("Orders", &["Customers"])]);

        let order = DependencySorter::new().order(&schema);
        assert_eq!(order, vec!["Orders".to_string()]);
    }

    #[test]
    fn test_sort_tables_returns_definitions() {
        let schema = schema(vec![
            table("Sections", &["Categories"]),
            table("Categories", &[]),
        ]);

        let tables = DependencySorter::new().sort_tables(&schema);
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Categories", "Sections"]);
    }
}
