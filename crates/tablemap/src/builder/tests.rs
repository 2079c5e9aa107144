use super::*;
use crate::clause::{JoinType, LogicalOp};
use crate::config::SqlConfig;
use crate::error::MapError;
use crate::expr::{Expr, col};
use crate::fixtures::{
    Department, Employee, OrderLine, STATUS, Staff, StaffView, Status, employee, staff,
};
use crate::hint::TableHint;
use crate::value::{EnumMode, EnumValue, SqlValue};

use chrono::NaiveDate;

fn order_line(notes: Option<serde_json::Value>) -> OrderLine {
    OrderLine {
        order_id: 1,
        line_no: 2,
        sku: "X".to_string(),
        qty: 3,
        notes,
        created_at: NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap(),
    }
}

// ==================== SELECT ====================

#[test]
fn test_select_with_where() {
    let sql = QueryBuilder::from::<Employee>()
        .select_all::<Employee>()
        .where_expr::<Employee>(col::<Employee>("Id").eq(5))
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT t0.[Id],t0.[Name] FROM [dbo].[Employee] [t0] WHERE (t0.[Id] = 5);"
    );
}

#[test]
fn test_select_every_does_not_duplicate() {
    let qb = QueryBuilder::from::<Employee>()
        .select_every()
        .select_all::<Employee>()
        .select_every();
    assert_eq!(
        qb.build().unwrap(),
        "SELECT t0.[Id],t0.[Name] FROM [dbo].[Employee] [t0];"
    );
}

#[test]
fn test_select_without_columns_uses_star() {
    let sql = QueryBuilder::from::<Employee>().top_percent(5).build().unwrap();
    assert_eq!(sql, "SELECT TOP 5 PERCENT * FROM [dbo].[Employee] [t0];");
}

#[test]
fn test_select_with_join() {
    let sql = QueryBuilder::from::<Staff>()
        .inner_join::<Staff, Department>(col::<Staff>("DeptId").eq(col::<Department>("Id")))
        .select::<Staff>([col::<Staff>("Name")])
        .select::<Department>([col::<Department>("Title")])
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT t0.[Name],t1.[Title] FROM [dbo].[Staff] [t0] \
         INNER JOIN [dbo].[Department] [t1] WITH (NOLOCK) ON (t0.[DeptId] = t1.[Id]);"
    );
}

#[test]
fn test_join_without_hint() {
    let sql = QueryBuilder::from_with::<Staff>(SqlConfig::new().join_hint(None))
        .join::<Staff, Department>(
            col::<Staff>("DeptId").eq(col::<Department>("Id")),
            JoinType::Left,
        )
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM [dbo].[Staff] [t0] LEFT JOIN [dbo].[Department] [t1] ON (t0.[DeptId] = t1.[Id]);"
    );
}

#[test]
fn test_select_distinct_top_hints_order() {
    let sql = QueryBuilder::from::<Employee>()
        .distinct()
        .top(10)
        .with_hints([TableHint::NoLock])
        .select_all::<Employee>()
        .order_by::<Employee>(col::<Employee>("Name"), Direction::Desc)
        .order_by::<Employee>(col::<Employee>("Id"), Direction::Asc)
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT DISTINCT TOP 10 t0.[Id],t0.[Name] FROM [dbo].[Employee] [t0] WITH (NOLOCK) \
         ORDER BY t0.[Name] DESC,t0.[Id] ASC;"
    );
}

#[test]
fn test_select_projection_skips_identity() {
    let sql = QueryBuilder::from::<Employee>()
        .select::<Employee>([
            Expr::param::<Employee>(),
            Expr::project([("Key", col::<Employee>("Id"))]),
        ])
        .build()
        .unwrap();
    assert_eq!(sql, "SELECT t0.[Id] AS [Key] FROM [dbo].[Employee] [t0];");
}

#[test]
fn test_where_or_keeps_order() {
    let sql = QueryBuilder::from::<Employee>()
        .select_all::<Employee>()
        .where_expr::<Employee>(col::<Employee>("Id").eq(1))
        .or_where::<Employee>(col::<Employee>("Name").is_null())
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT t0.[Id],t0.[Name] FROM [dbo].[Employee] [t0] WHERE (t0.[Id] = 1) OR (t0.[Name] IS NULL);"
    );
}

#[test]
fn test_group_by_with_having() {
    let sql = QueryBuilder::from::<Staff>()
        .select::<Staff>([Expr::project([
            ("DeptId", col::<Staff>("DeptId")),
            ("Headcount", col::<Staff>("Id").count()),
        ])])
        .group_by::<Staff>(
            Grouping::Standard(vec![col::<Staff>("DeptId")]),
            Some(col::<Staff>("Id").count().gt(5)),
        )
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT t0.[DeptId] AS [DeptId],COUNT(t0.[Id]) AS [Headcount] FROM [dbo].[Staff] [t0] \
         GROUP BY t0.[DeptId] HAVING (COUNT(t0.[Id]) > 5);"
    );
}

#[test]
fn test_group_by_variants() {
    let rollup = QueryBuilder::from::<Staff>()
        .group_by::<Staff>(
            Grouping::Rollup(vec![col::<Staff>("DeptId"), col::<Staff>("Status")]),
            None,
        )
        .build()
        .unwrap();
    assert!(rollup.ends_with("GROUP BY ROLLUP (t0.[DeptId],t0.[Status]);"));

    let cube = QueryBuilder::from::<Staff>()
        .group_by::<Staff>(Grouping::Cube(vec![col::<Staff>("DeptId")]), None)
        .build()
        .unwrap();
    assert!(cube.ends_with("GROUP BY CUBE (t0.[DeptId]);"));

    let sets = QueryBuilder::from::<Staff>()
        .group_by::<Staff>(
            Grouping::GroupingSets(vec![vec![col::<Staff>("DeptId")], vec![]]),
            None,
        )
        .build()
        .unwrap();
    assert!(sets.ends_with("GROUP BY GROUPING SETS ((t0.[DeptId]),());"));

    let empty = QueryBuilder::from::<Staff>()
        .group_by::<Staff>(Grouping::Empty, None)
        .build()
        .unwrap();
    assert!(empty.ends_with("GROUP BY ();"));
}

#[test]
fn test_group_by_twice_fails() {
    let err = QueryBuilder::from::<Staff>()
        .group_by::<Staff>(Grouping::Standard(vec![col::<Staff>("DeptId")]), None)
        .group_by::<Staff>(Grouping::Standard(vec![col::<Staff>("Name")]), None)
        .build()
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_select_into_table() {
    let sql = QueryBuilder::from::<Employee>()
        .select_all::<Employee>()
        .into_table("archive.Employee")
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT t0.[Id],t0.[Name] INTO [archive].[Employee] FROM [dbo].[Employee] [t0];"
    );
}

#[test]
fn test_select_without_primary_fails() {
    let err = QueryBuilder::new(SqlConfig::default()).build().unwrap_err();
    assert_eq!(err, MapError::NoPrimaryTable);
}

#[test]
fn test_first_error_wins() {
    let err = QueryBuilder::from::<Employee>()
        .where_expr::<Employee>(col::<Employee>("Salary").eq(1))
        .join::<Department, Staff>(col::<Staff>("Id").eq(1), JoinType::Inner)
        .build()
        .unwrap_err();
    assert!(matches!(err, MapError::UnknownMember { .. }));
}

#[test]
fn test_build_is_repeatable() {
    let qb = QueryBuilder::from::<Staff>()
        .select_all::<Staff>()
        .where_expr::<Staff>(col::<Staff>("Status").eq(Expr::enum_const(Status::Active)));
    assert_eq!(qb.build().unwrap(), qb.build().unwrap());
}

// ==================== INSERT ====================

#[test]
fn test_insert_rows() {
    let sql = InsertBuilder::into::<Employee>()
        .values(&employee(1, "Ann"))
        .values(&employee(2, "O'Neil"))
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO [dbo].[Employee] ([Id],[Name]) VALUES (1,'Ann'),(2,'O''Neil');"
    );
}

#[test]
fn test_insert_skips_excluded_members_and_applies_enum_mode() {
    let sql = InsertBuilder::into::<Staff>()
        .values(&staff(1, "Bo", Status::Active))
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO [dbo].[Staff] ([Name],[DeptId],[Status],[ManagerId]) VALUES ('Bo',10,'Active',NULL);"
    );
}

#[test]
fn test_insert_json_column_and_default_schema() {
    let line = order_line(Some(serde_json::json!({"gift": true})));
    let sql = InsertBuilder::into_with::<OrderLine>(SqlConfig::new().default_schema("sales"))
        .values(&line)
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO [sales].[OrderLine] ([OrderId],[LineNo],[Sku],[Qty],[Notes],[CreatedAt]) \
         VALUES (1,2,'X',3,'{\"gift\":true}','2024-01-02 03:04:05.000');"
    );
}

#[test]
fn test_insert_values_map_uses_column_policy() {
    let sql = InsertBuilder::into::<Staff>()
        .values_map([("Name", SqlValue::from("Cy")), ("Status", SqlValue::Int(3))])
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO [dbo].[Staff] ([Name],[Status]) VALUES ('Cy','Retired');"
    );
}

#[test]
fn test_insert_column_count_mismatch() {
    let err = InsertBuilder::into::<Employee>()
        .columns(["A", "B"])
        .values_map([("A", 1), ("B", 2), ("C", 3)])
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        MapError::ColumnMismatch {
            row: 0,
            expected: 2,
            found: 3
        }
    );
}

#[test]
fn test_insert_heterogeneous_rows_fail() {
    let err = InsertBuilder::into::<Employee>()
        .values_map([("Id", 1), ("Name", 2)])
        .values_map([("Id", 1), ("Title", 2)])
        .build()
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_insert_default_values() {
    let sql = InsertBuilder::into::<Employee>().default_values().build().unwrap();
    assert_eq!(sql, "INSERT INTO [dbo].[Employee] DEFAULT VALUES;");

    let err = InsertBuilder::into::<Employee>()
        .values(&employee(1, "Ann"))
        .default_values()
        .build()
        .unwrap_err();
    assert!(err.is_configuration());

    let err = InsertBuilder::into::<Employee>()
        .default_values()
        .values(&employee(1, "Ann"))
        .build()
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_insert_from_query() {
    let source = QueryBuilder::from::<Employee>().select_all::<Employee>();
    let sql = InsertBuilder::new(SqlConfig::default())
        .into_table("dbo.EmployeeArchive")
        .columns(["Id", "Name"])
        .from_query(&source)
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO [dbo].[EmployeeArchive] ([Id],[Name]) SELECT t0.[Id],t0.[Name] FROM [dbo].[Employee] [t0];"
    );
}

#[test]
fn test_insert_without_values_fails() {
    let err = InsertBuilder::into::<Employee>().build().unwrap_err();
    assert!(err.is_configuration());

    let err = InsertBuilder::new(SqlConfig::default())
        .values(&employee(1, "Ann"))
        .build()
        .unwrap_err();
    assert_eq!(err, MapError::NoPrimaryTable);
}

// ==================== UPDATE ====================

#[test]
fn test_update_keyed_on_search_keys() {
    let sql = UpdateBuilder::for_type::<Employee>()
        .values(&employee(5, "Ann"))
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "UPDATE [t0] SET [Name]='Ann' FROM [dbo].[Employee] [t0] WHERE ([Id]=5);"
    );
}

#[test]
fn test_update_one_statement_per_row() {
    let rows = vec![employee(1, "A"), employee(2, "B")];
    let sql = UpdateBuilder::for_type::<Employee>()
        .values_many(&rows)
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "UPDATE [t0] SET [Name]='A' FROM [dbo].[Employee] [t0] WHERE ([Id]=1);\n\
         UPDATE [t0] SET [Name]='B' FROM [dbo].[Employee] [t0] WHERE ([Id]=2);"
    );
}

#[test]
fn test_update_composite_key_and_skipped_columns() {
    let sql = UpdateBuilder::for_type::<OrderLine>()
        .values(&order_line(None))
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "UPDATE [t0] SET [Sku]='X',[Qty]=3,[Notes]=NULL FROM [dbo].[OrderLine] [t0] \
         WHERE ([OrderId]=1 AND [LineNo]=2);"
    );
}

#[test]
fn test_update_explicit_where_top_and_hints() {
    let sql = UpdateBuilder::for_type::<Employee>()
        .set("Name", "Z")
        .where_expr::<Employee>(col::<Employee>("Id").gt(10))
        .top(5)
        .with_hints([TableHint::RowLock])
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "UPDATE TOP (5) [t0] SET [Name]='Z' FROM [dbo].[Employee] [t0] WITH (ROWLOCK) WHERE (t0.[Id] > 10);"
    );
}

#[test]
fn test_update_named_table() {
    let sql = UpdateBuilder::for_table("dbo.Counters")
        .set("Hits", 3)
        .where_raw("[Page] = 'home'", LogicalOp::And)
        .build()
        .unwrap();
    assert_eq!(sql, "UPDATE [dbo].[Counters] SET [Hits]=3 WHERE ([Page] = 'home');");
}

#[test]
fn test_update_named_table_with_config() {
    let update = UpdateBuilder::for_table_with(
        "Jobs",
        SqlConfig::new().enum_mode(EnumMode::AsString).default_schema("ops"),
    );
    assert_eq!(update.config().default_schema, "ops");

    let sql = update
        .set("State", EnumValue::new(&STATUS, 2))
        .where_raw("[JobId] = 4", LogicalOp::And)
        .build()
        .unwrap();
    assert_eq!(sql, "UPDATE [Jobs] SET [State]='Suspended' WHERE ([JobId] = 4);");
}

#[test]
fn test_update_named_table_rejects_typed_where() {
    let err = UpdateBuilder::for_table("dbo.Employee")
        .set("Name", "Z")
        .where_expr::<Employee>(col::<Employee>("Id").eq(5))
        .build()
        .unwrap_err();
    assert!(err.is_configuration(), "{err:?}");
}

#[test]
fn test_update_failures() {
    let err = UpdateBuilder::for_type::<Employee>().build().unwrap_err();
    assert!(err.is_configuration());

    let err = UpdateBuilder::for_type::<Employee>()
        .set("Name", "x")
        .build()
        .unwrap_err();
    assert!(matches!(err, MapError::MissingValue(_)));

    let err = UpdateBuilder::for_type::<Employee>()
        .values_map([("Id", 1)])
        .build()
        .unwrap_err();
    assert!(err.is_configuration());

    let err = UpdateBuilder::for_table("Counters")
        .set("Hits", 1)
        .build()
        .unwrap_err();
    assert!(err.is_configuration());
}

// ==================== DELETE ====================

#[test]
fn test_delete_by_keys() {
    let sql = DeleteBuilder::from::<Employee>()
        .where_keys(&employee(5, "ignored"), LogicalOp::And)
        .build()
        .unwrap();
    assert_eq!(sql, "DELETE FROM [dbo].[Employee] [t0] WHERE ([Id]=5);");
}

#[test]
fn test_delete_requires_where() {
    let err = DeleteBuilder::from::<Employee>().build().unwrap_err();
    assert!(err.is_configuration());

    let sql = DeleteBuilder::from::<Employee>()
        .allow_delete_all()
        .build()
        .unwrap();
    assert_eq!(sql, "DELETE FROM [dbo].[Employee] [t0];");
}

#[test]
fn test_delete_top_hints_and_expr() {
    let sql = DeleteBuilder::from::<Staff>()
        .top(100)
        .with_hints([TableHint::ReadPast, TableHint::RowLock])
        .where_expr::<Staff>(col::<Staff>("Status").eq(Expr::enum_const(Status::Retired)))
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "DELETE TOP (100) FROM [dbo].[Staff] [t0] WITH (ROWLOCK,READPAST) WHERE (t0.[Status] = 'Retired');"
    );
}

#[test]
fn test_delete_named_table() {
    let sql = DeleteBuilder::from_table("Log")
        .where_raw("[Age] > 30", LogicalOp::And)
        .build()
        .unwrap();
    assert_eq!(sql, "DELETE FROM [Log] WHERE ([Age] > 30);");
}

#[test]
fn test_delete_named_table_with_config() {
    let delete = DeleteBuilder::from_table_with("Log", SqlConfig::new().no_logging())
        .where_raw("[Age] > 30", LogicalOp::And);
    assert!(!delete.config().log_statements);
    assert_eq!(delete.build().unwrap(), "DELETE FROM [Log] WHERE ([Age] > 30);");
}

#[test]
fn test_delete_named_table_rejects_typed_where() {
    let err = DeleteBuilder::from_table("dbo.Employee")
        .where_expr::<Employee>(col::<Employee>("Id").eq(5))
        .build()
        .unwrap_err();
    assert!(err.is_configuration(), "{err:?}");
}

#[test]
fn test_delete_by_keys_without_search_keys_fails() {
    let err = DeleteBuilder::from::<StaffView>()
        .where_keys(&StaffView { id: 1 }, LogicalOp::And)
        .build()
        .unwrap_err();
    assert!(err.is_configuration());
}

// ==================== MERGE ====================

#[test]
fn test_merge_upsert_from_source() {
    let sql = MergeBuilder::table::<Employee>()
        .using(
            "SELECT 1 AS [Id], 'Ann' AS [Name]",
            "s",
            Some("t0.[Id] = s.[Id]"),
        )
        .when_matched(None, MergeAction::update_from_source::<Employee>("s"))
        .when_not_matched(
            Some("BY TARGET"),
            MergeAction::insert_from_source::<Employee>("s"),
        )
        .when_not_matched(Some("BY SOURCE"), MergeAction::Delete)
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "MERGE [dbo].[Employee] AS [t0] USING (SELECT 1 AS [Id], 'Ann' AS [Name]) AS [s] \
         ON (t0.[Id] = s.[Id]) \
         WHEN MATCHED THEN UPDATE SET [Name]=[s].[Name] \
         WHEN NOT MATCHED BY TARGET THEN INSERT ([Id],[Name]) VALUES ([s].[Id],[s].[Name]) \
         WHEN NOT MATCHED BY SOURCE THEN DELETE;"
    );
}

#[test]
fn test_merge_conditions_and_record_actions() {
    let ann = employee(1, "Ann");
    let sql = MergeBuilder::table::<Employee>()
        .using_query(
            &QueryBuilder::from::<Department>().select::<Department>([Expr::project([
                ("Id", col::<Department>("Id")),
                ("Name", col::<Department>("Title")),
            ])]),
            "s",
            Some("(t0.[Id] = s.[Id])"),
        )
        .when_matched(
            Some("t0.[Name] <> s.[Name]"),
            MergeAction::update_from(&ann).unwrap(),
        )
        .when_not_matched(None, MergeAction::insert_from(&ann).unwrap())
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "MERGE [dbo].[Employee] AS [t0] \
         USING (SELECT t0.[Id] AS [Id],t0.[Title] AS [Name] FROM [dbo].[Department] [t0]) AS [s] \
         ON (t0.[Id] = s.[Id]) \
         WHEN MATCHED AND (t0.[Name] <> s.[Name]) THEN UPDATE SET [Name]='Ann' \
         WHEN NOT MATCHED THEN INSERT ([Id],[Name]) VALUES (1,'Ann');"
    );
}

#[test]
fn test_merge_named_target() {
    let sql = MergeBuilder::table_named("dbo.Stock", "tgt")
        .top(10)
        .with_hints([TableHint::HoldLock])
        .using("SELECT * FROM [dbo].[Incoming]", "src", Some("tgt.[Sku] = src.[Sku]"))
        .when_matched(None, MergeAction::update([("Qty", 0)]))
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "MERGE TOP (10) [dbo].[Stock] WITH (HOLDLOCK) AS [tgt] USING (SELECT * FROM [dbo].[Incoming]) AS [src] \
         ON (tgt.[Sku] = src.[Sku]) WHEN MATCHED THEN UPDATE SET [Qty]=0;"
    );
}

#[test]
fn test_merge_named_target_with_config() {
    let merge = MergeBuilder::table_named_with("Stock", "tgt", SqlConfig::new().default_schema("inv"))
        .using("SELECT 1 AS [Sku]", "src", Some("tgt.[Sku] = src.[Sku]"))
        .when_matched(None, MergeAction::Delete);
    assert_eq!(merge.config().default_schema, "inv");
    assert_eq!(
        merge.build().unwrap(),
        "MERGE [Stock] AS [tgt] USING (SELECT 1 AS [Sku]) AS [src] \
         ON (tgt.[Sku] = src.[Sku]) WHEN MATCHED THEN DELETE;"
    );
}

#[test]
fn test_merge_failures() {
    let err = MergeBuilder::table::<Employee>()
        .when_matched(None, MergeAction::Delete)
        .build()
        .unwrap_err();
    assert!(err.is_configuration());

    let err = MergeBuilder::table::<Employee>()
        .using("SELECT 1", "s", None)
        .build()
        .unwrap_err();
    assert!(err.is_configuration());

    let err = MergeBuilder::table::<Employee>()
        .using("SELECT 1", "s", None)
        .when_matched(None, MergeAction::Update(Vec::new()))
        .build()
        .unwrap_err();
    assert!(err.is_configuration());

    let err = MergeBuilder::new(SqlConfig::default())
        .using("SELECT 1", "s", None)
        .when_matched(None, MergeAction::Raw("DELETE".to_string()))
        .build()
        .unwrap_err();
    assert_eq!(err, MapError::NoPrimaryTable);
}
