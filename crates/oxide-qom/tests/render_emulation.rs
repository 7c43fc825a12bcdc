//! Integration tests for dialect emulation.
//!
//! Output that targets SQLite (or that SQLite can evaluate) is executed
//! against an in-memory database so that the emulated form is checked for
//! semantics, not only for shape.

mod common;

use common::{bind_all, pairs_table, render, render_inlined, sqlite_pool};
use oxide_qom::qom::{
    bit_nand_agg, col, coalesce, count_star, greatest, inline, least, val, JsonEntry, JsonObject,
    JsonValue, Select, SortField, Table,
};
use oxide_qom::{Condition, Dialect, Field, RenderError, Renderer, SqlValue};
use sqlx::Row;

async fn evaluate_per_pair(pool: &sqlx::SqlitePool, expression: &str) -> Vec<Option<i64>> {
    let sql = format!("SELECT {expression} FROM pairs ORDER BY id");
    sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .unwrap_or_else(|e| panic!("query {sql} failed: {e}"))
        .iter()
        .map(|row| row.get::<Option<i64>, _>(0))
        .collect()
}

// ============================================================================
// GREATEST / LEAST
// ============================================================================

#[tokio::test]
async fn test_derby_greatest_case_emulation_is_null_propagating() {
    let pool = sqlite_pool().await;
    pairs_table(&pool, &[(Some(3), Some(5)), (Some(5), Some(3)), (None, Some(5))]).await;

    let field = greatest([col("a"), col("b")]);
    let emulated = render_inlined(Dialect::Derby, &field);
    assert!(emulated.starts_with("CASE WHEN a IS NULL OR b IS NULL THEN NULL"));

    let native = render_inlined(Dialect::Sqlite, &field);
    assert_eq!(native, "MAX(a, b)");

    let expected = vec![Some(5), Some(5), None];
    assert_eq!(evaluate_per_pair(&pool, &emulated).await, expected);
    assert_eq!(evaluate_per_pair(&pool, &native).await, expected);
}

#[tokio::test]
async fn test_derby_greatest_first_argument_wins_ties() {
    let pool = sqlite_pool().await;
    pairs_table(&pool, &[(Some(4), Some(4)), (Some(-1), Some(-2))]).await;

    let emulated = render_inlined(Dialect::Derby, &greatest([col("a"), col("b")]));
    assert!(emulated.contains("WHEN a >= b THEN a ELSE b END"));
    assert_eq!(evaluate_per_pair(&pool, &emulated).await, vec![Some(4), Some(-1)]);
}

#[tokio::test]
async fn test_derby_least_of_three_matches_sqlite_min() {
    let pool = sqlite_pool().await;
    pairs_table(
        &pool,
        &[
            (Some(3), Some(5)),
            (Some(9), Some(1)),
            (Some(2), None),
            (Some(7), Some(7)),
        ],
    )
    .await;

    let field = least([col("a"), col("b"), col("id")]);
    let emulated = render_inlined(Dialect::Derby, &field);
    let native = render_inlined(Dialect::Sqlite, &field);
    assert_eq!(native, "MIN(a, b, id)");

    let expected = evaluate_per_pair(&pool, &native).await;
    assert_eq!(expected, vec![Some(1), Some(1), None, Some(4)]);
    assert_eq!(evaluate_per_pair(&pool, &emulated).await, expected);
}

#[test]
fn test_firebird_uses_maxvalue() {
    let field = greatest([col("a"), val(10)]);
    let rendered = render(Dialect::Firebird4, &field);
    assert_eq!(rendered.sql, "MAXVALUE(a, ?)");
    assert_eq!(rendered.binds, vec![SqlValue::Int(10)]);
}

// ============================================================================
// Degenerate arity
// ============================================================================

#[test]
fn test_zero_argument_variadics_render_a_single_null() {
    let empty: [Field; 0] = [];
    for dialect in Dialect::ALL {
        for field in [greatest(empty.clone()), least(empty.clone()), coalesce(empty.clone())] {
            let rendered = render(dialect, &field);
            assert_eq!(rendered.sql, "NULL", "dialect {dialect}");
            assert!(rendered.binds.is_empty());
        }
    }
}

#[test]
fn test_one_argument_variadics_render_their_argument() {
    let argument = col("price") * val(2);
    for dialect in Dialect::ALL {
        let alone = render(dialect, &argument);
        for field in [
            greatest([argument.clone()]),
            least([argument.clone()]),
            coalesce([argument.clone()]),
        ] {
            assert_eq!(render(dialect, &field), alone, "dialect {dialect}");
        }
    }
}

// ============================================================================
// Subquery IS [NOT] NULL
// ============================================================================

#[test]
fn test_single_column_subquery_keeps_standard_null_test() {
    let condition =
        Field::subquery(Select::new([col("a")]).from(Table::named("x"))).is_not_null();
    for dialect in [Dialect::Postgres16, Dialect::Sqlite, Dialect::Derby] {
        assert_eq!(
            render(dialect, &condition).sql,
            "(SELECT a FROM x) IS NOT NULL",
            "dialect {dialect}"
        );
    }
}

#[test]
fn test_two_column_subquery_is_rewritten_where_row_tests_are_missing() {
    let condition =
        Field::subquery(Select::new([col("a"), col("b")]).from(Table::named("x"))).is_not_null();

    assert_eq!(
        render(Dialect::H2, &condition).sql,
        "(SELECT a, b FROM x) IS NOT NULL"
    );
    assert_eq!(
        render(Dialect::Postgres16, &condition).sql,
        "1 = (SELECT COUNT(*) FROM (SELECT a AS v1, b AS v2 FROM x) AS t \
         WHERE t.v1 IS NOT NULL AND t.v2 IS NOT NULL)"
    );
}

#[test]
fn test_rewrite_alias_avoids_visible_names() {
    let condition =
        Field::subquery(Select::new([col("a"), col("b")]).from(Table::named("x"))).is_null();
    let select = Select::new([col("id")])
        .from(Table::named("t"))
        .where_clause(condition);
    let sql = render(Dialect::Postgres16, &select).sql;
    assert!(sql.contains("AS t1 WHERE t1.v1 IS NULL AND t1.v2 IS NULL"), "{sql}");
}

#[test]
fn test_rewrite_alias_inside_raw_sql_avoids_visible_names() {
    let null_test =
        Field::subquery(Select::new([col("a"), col("b")]).from(Table::named("x"))).is_null();
    let select = Select::new([col("id")])
        .from(Table::named("t"))
        .where_clause(Condition::raw("NOT ({0})", [Field::from(null_test)]));
    let sql = render(Dialect::Postgres16, &select).sql;
    assert!(sql.contains("AS t1 WHERE t1.v1 IS NULL AND t1.v2 IS NULL))"), "{sql}");
}

#[tokio::test]
async fn test_count_rewrite_evaluates_row_null_semantics_on_sqlite() {
    let pool = sqlite_pool().await;
    sqlx::query("CREATE TABLE x (a INTEGER, b INTEGER)")
        .execute(&pool)
        .await
        .unwrap();

    let condition =
        Field::subquery(Select::new([col("a"), col("b")]).from(Table::named("x"))).is_not_null();
    let sql = render_inlined(Dialect::Sqlite, &Select::new([Field::from(condition)]));

    for (a, b, expected) in [
        (Some(1), Some(2), true),
        (Some(1), None, false),
        (None, None, false),
    ] {
        sqlx::query("DELETE FROM x").execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO x (a, b) VALUES (?, ?)")
            .bind(a)
            .bind(b)
            .execute(&pool)
            .await
            .unwrap();
        let row = sqlx::query(&sql).fetch_one(&pool).await.unwrap();
        assert_eq!(row.get::<i64, _>(0), i64::from(expected), "a = {a:?}, b = {b:?}");
    }
}

#[tokio::test]
async fn test_count_rewrite_keeps_subquery_order_on_sqlite() {
    let pool = sqlite_pool().await;
    pairs_table(&pool, &[(None, None), (Some(2), Some(5))]).await;

    for (sort, expected) in [
        (SortField::asc(col("x")), 1),
        (SortField::desc(col("x")), 0),
    ] {
        let first = Select::new([col("a").alias("x"), col("b")])
            .from(Table::named("pairs"))
            .order_by([sort])
            .limit(1);
        let condition = Field::subquery(first).is_null();
        let sql = render_inlined(Dialect::Sqlite, &Select::new([Field::from(condition)]));
        assert!(sql.contains("FROM (SELECT q.x AS v1, q.b AS v2 FROM (SELECT a AS x, b"), "{sql}");

        let row = sqlx::query(&sql).fetch_one(&pool).await.unwrap();
        assert_eq!(row.get::<i64, _>(0), expected, "{sql}");
    }
}

// ============================================================================
// Derived column lists
// ============================================================================

#[tokio::test]
async fn test_derived_column_list_keeps_ordered_select_on_sqlite() {
    let pool = sqlite_pool().await;
    pairs_table(&pool, &[(Some(1), Some(10)), (Some(3), Some(30)), (Some(2), Some(20))]).await;

    let top = Select::new([col("a").alias("x")])
        .from(Table::named("pairs"))
        .order_by([SortField::desc(col("x"))])
        .limit(2);
    let select = Select::new([col("c")])
        .from(Table::derived(top, "d").with_columns(&["c"]))
        .order_by([col("c").into()]);
    let sql = render_inlined(Dialect::Sqlite, &select);
    assert_eq!(
        sql,
        "SELECT c FROM (SELECT q.x AS c FROM \
         (SELECT a AS x FROM pairs ORDER BY x DESC LIMIT 2) AS q) AS d ORDER BY c"
    );

    let values: Vec<i64> = sqlx::query(&sql)
        .fetch_all(&pool)
        .await
        .unwrap()
        .iter()
        .map(|row| row.get(0))
        .collect();
    assert_eq!(values, vec![2, 3]);
}

#[tokio::test]
async fn test_derived_column_list_keeps_grouped_select_on_sqlite() {
    let pool = sqlite_pool().await;
    pairs_table(&pool, &[(Some(1), Some(10)), (Some(1), Some(20)), (Some(2), Some(30))]).await;

    let grouped = Select::new([col("a").alias("k"), count_star().alias("n")])
        .from(Table::named("pairs"))
        .group_by([col("k")])
        .having(col("n").gt(inline(1)));
    let select = Select::new([col("grp"), col("cnt")])
        .from(Table::derived(grouped, "d").with_columns(&["grp", "cnt"]));
    let sql = render_inlined(Dialect::Sqlite, &select);
    assert!(sql.contains("GROUP BY k HAVING n > 1) AS q) AS d"), "{sql}");

    let rows: Vec<(i64, i64)> = sqlx::query(&sql)
        .fetch_all(&pool)
        .await
        .unwrap()
        .iter()
        .map(|row| (row.get(0), row.get(1)))
        .collect();
    assert_eq!(rows, vec![(1, 2)]);
}

// ============================================================================
// Aggregates
// ============================================================================

#[test]
fn test_bit_nand_agg_per_dialect() {
    let field = bit_nand_agg(col("flags"));
    assert_eq!(render(Dialect::H2, &field).sql, "BIT_NAND_AGG(flags)");
    assert_eq!(render(Dialect::Postgres16, &field).sql, "~BIT_AND(flags)");
    assert_eq!(
        render(Dialect::Trino, &field).sql,
        "bitwise_not(bitwise_and_agg(flags))"
    );
    assert_eq!(
        Renderer::new(Dialect::Sqlite).render(&field),
        Err(RenderError::unsupported("BIT_AND_AGG", Dialect::Sqlite))
    );
    assert_eq!(
        Renderer::new(Dialect::Derby).render(&field),
        Err(RenderError::unsupported("bitwise NOT", Dialect::Derby))
    );
}

// ============================================================================
// Binds and placeholders
// ============================================================================

#[test]
fn test_postgres_placeholders_follow_bind_order() {
    let select = Select::new([col("a"), greatest([col("b"), val(3)]).alias("g")])
        .from(Table::named("t"))
        .where_clause(col("a").eq(val("x")).and(col("c").in_list([val(1), val(2)])));

    let rendered = render(Dialect::Postgres16, &select);
    assert_eq!(
        rendered.sql,
        "SELECT a, GREATEST(b, $1) AS g FROM t WHERE a = $2 AND c IN ($3, $4)"
    );
    assert_eq!(
        rendered.binds,
        vec![
            SqlValue::Int(3),
            SqlValue::Text(String::from("x")),
            SqlValue::Int(1),
            SqlValue::Int(2),
        ]
    );

    let question = render(Dialect::MySql8, &select);
    assert_eq!(question.binds, rendered.binds);
    assert_eq!(question.sql.matches('?').count(), 4);
}

#[tokio::test]
async fn test_sqlite_binds_execute_in_order() {
    let pool = sqlite_pool().await;
    pairs_table(&pool, &[(Some(1), Some(10)), (Some(2), Some(20)), (Some(3), None)]).await;

    let select = Select::new([coalesce([col("b"), val(-1)]).alias("b")])
        .from(Table::named("pairs"))
        .where_clause(col("a").gt_eq(val(2)).and(col("a").lt_eq(val(3))));
    let rendered = render(Dialect::Sqlite, &select);

    let rows = bind_all(sqlx::query(&rendered.sql), &rendered.binds)
        .fetch_all(&pool)
        .await
        .unwrap();
    let values: Vec<i64> = rows.iter().map(|row| row.get::<i64, _>("b")).collect();
    assert_eq!(values, vec![20, -1]);
}

// ============================================================================
// JSON
// ============================================================================

#[tokio::test]
async fn test_sqlite_json_forms_execute() {
    let pool = sqlite_pool().await;
    pairs_table(&pool, &[(Some(7), None)]).await;

    let object = Field::JsonObject(JsonObject::new([
        JsonEntry::new("a", col("a")),
        JsonEntry::new("b", col("b")),
    ]));
    let extracted = Field::JsonValue(JsonValue::new(object.clone(), "$.a"));
    let select = Select::new([object.alias("doc"), extracted.alias("a")])
        .from(Table::named("pairs"));
    let sql = render_inlined(Dialect::Sqlite, &select);
    assert_eq!(
        sql,
        "SELECT JSON_OBJECT('a', a, 'b', b) AS doc, \
         json_extract(JSON_OBJECT('a', a, 'b', b), '$.a') AS a FROM pairs"
    );

    let row = sqlx::query(&sql).fetch_one(&pool).await.unwrap();
    assert_eq!(row.get::<String, _>("doc"), r#"{"a":7,"b":null}"#);
    assert_eq!(row.get::<i64, _>("a"), 7);
}
