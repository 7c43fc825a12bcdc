//! Integration tests for reading SQLite table definitions.

mod common;

use std::time::Duration;

use common::{database, reader};
use oxide_qom::qom::{val, DataType};
use oxide_qom::{Dialect, Field, Renderer};
use oxide_qom_meta::{
    GenerationOption, MetaError, ReadOptions, SqliteCatalog, SqliteTableReader,
};

const ORDERS: &str = "CREATE TABLE orders (\
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    total DECIMAL(10, 2) NOT NULL DEFAULT 0, \
    customer VARCHAR(40), \
    note)";

#[tokio::test]
async fn test_autoincrement_key_of_empty_table_is_identity() {
    let pool = database(&[ORDERS]).await;
    let orders = reader(&pool).table("orders").await.unwrap();

    let names: Vec<&str> = orders.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["id", "total", "customer", "note"]);
    let positions: Vec<usize> = orders.columns().iter().map(|c| c.position).collect();
    assert_eq!(positions, [1, 2, 3, 4]);
    assert_eq!(orders.identity().map(|c| c.name.as_str()), Some("id"));
}

#[tokio::test]
async fn test_sequence_entry_marks_identity() {
    let pool = database(&[ORDERS, "INSERT INTO orders (total) VALUES (12.5)"]).await;
    let orders = reader(&pool).table("orders").await.unwrap();
    assert!(orders.column("id").unwrap().identity);
    assert!(!orders.column("total").unwrap().identity);
}

#[tokio::test]
async fn test_rowid_alias_without_autoincrement_is_not_identity() {
    let pool = database(&[
        "CREATE TABLE tags (id INTEGER PRIMARY KEY, label TEXT)",
        "INSERT INTO tags (label) VALUES ('a')",
    ])
    .await;
    let tags = reader(&pool).table("tags").await.unwrap();
    assert_eq!(tags.identity(), None);
}

#[tokio::test]
async fn test_without_rowid_table_has_no_identity() {
    let pool = database(&[
        ORDERS,
        "CREATE TABLE kv (k TEXT PRIMARY KEY, v) WITHOUT ROWID",
    ])
    .await;
    let kv = reader(&pool).table("kv").await.unwrap();
    assert_eq!(kv.identity(), None);
    assert_eq!(kv.column("v").unwrap().data_type.data_type(), DataType::Other);
}

#[tokio::test]
async fn test_declared_types_precision_and_constraints() {
    let pool = database(&[ORDERS]).await;
    let orders = reader(&pool).table("orders").await.unwrap();

    let total = &orders.column("total").unwrap().data_type;
    assert_eq!(total.type_name, "DECIMAL");
    assert_eq!((total.precision, total.scale), (Some(10), Some(2)));
    assert!(!total.nullable);
    assert_eq!(total.default_value.as_deref(), Some("0"));
    assert_eq!(
        total.data_type(),
        DataType::Decimal {
            precision: Some(10),
            scale: Some(2)
        }
    );

    let customer = &orders.column("CUSTOMER").unwrap().data_type;
    assert_eq!(customer.data_type(), DataType::Varchar(Some(40)));
    assert!(customer.nullable);

    let note = &orders.column("note").unwrap().data_type;
    assert_eq!(note.type_name, "");
    assert_eq!(note.data_type(), DataType::Other);
}

#[tokio::test]
async fn test_generated_columns() {
    let pool = database(&["CREATE TABLE boxes (\
        w INTEGER, \
        h INTEGER, \
        area INTEGER GENERATED ALWAYS AS (w * h) VIRTUAL, \
        perimeter INTEGER GENERATED ALWAYS AS (2 * (w + h)) STORED)"])
    .await;
    let boxes = reader(&pool).table("boxes").await.unwrap();

    assert_eq!(boxes.columns().len(), 4);
    assert_eq!(boxes.column("w").unwrap().data_type.generation, None);

    let area = &boxes.column("area").unwrap().data_type;
    assert_eq!(area.generation, Some(GenerationOption::Virtual));
    assert_eq!(area.type_name, "INTEGER");

    let perimeter = &boxes.column("perimeter").unwrap().data_type;
    assert_eq!(perimeter.generation, Some(GenerationOption::Stored));
    assert_eq!(perimeter.data_type(), DataType::Integer);
    assert!(perimeter.is_generated());
}

#[tokio::test]
async fn test_view_columns_are_typed() {
    let pool = database(&[
        ORDERS,
        "CREATE VIEW big_orders AS \
         SELECT id, CAST(total AS DECIMAL(12, 2)) AS amount FROM orders WHERE total > 100",
        "CREATE VIEW all_orders AS SELECT * FROM orders",
    ])
    .await;
    let reader = reader(&pool);

    let big = reader.table("big_orders").await.unwrap();
    let names: Vec<&str> = big.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["id", "amount"]);
    assert_eq!(big.column("id").unwrap().data_type.data_type(), DataType::Integer);
    assert!(big.column("amount").unwrap().data_type.data_type().is_known());
    assert_eq!(big.identity(), None);

    let all = reader.table("all_orders").await.unwrap();
    assert_eq!(all.columns().len(), 4);
    assert_eq!(
        all.column("customer").unwrap().data_type.data_type(),
        DataType::Varchar(Some(40))
    );
}

#[tokio::test]
async fn test_unknown_table() {
    let pool = database(&[ORDERS]).await;
    let err = reader(&pool).columns("missing").await.unwrap_err();
    assert!(matches!(err, MetaError::TableNotFound(ref name) if name == "missing"));
}

#[tokio::test]
async fn test_read_times_out_while_connection_is_busy() {
    let pool = database(&[ORDERS]).await;
    let reader = SqliteTableReader::new(
        SqliteCatalog::new(pool.clone()),
        ReadOptions::default().with_timeout(Duration::from_millis(50)),
    );

    let held = pool.acquire().await.unwrap();
    let err = reader.columns("orders").await.unwrap_err();
    drop(held);

    match err {
        MetaError::Timeout { table, timeout } => {
            assert_eq!(table, "orders");
            assert_eq!(timeout, Duration::from_millis(50));
        }
        other => panic!("expected a timeout, got {other}"),
    }
    assert_eq!(reader.columns("orders").await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_catalog_lists_tables_and_views() {
    let pool = database(&[
        ORDERS,
        "CREATE VIEW all_orders AS SELECT * FROM orders",
    ])
    .await;
    let tables = SqliteCatalog::new(pool).tables().await.unwrap();
    assert_eq!(tables, ["all_orders", "orders"]);
}

#[tokio::test]
async fn test_fields_render_for_other_dialects() {
    let pool = database(&[ORDERS]).await;
    let orders = reader(&pool).table("orders").await.unwrap();

    let Some(Field::Column(total)) = orders.field("total") else {
        panic!("expected a column field");
    };
    assert_eq!(
        total.data_type(),
        &DataType::Decimal {
            precision: Some(10),
            scale: Some(2)
        }
    );

    let select = orders
        .select_all()
        .where_clause(orders.field("total").unwrap().gt(val(100)));
    let rendered = Renderer::new(Dialect::Postgres16).render(&select).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT id, total, customer, note FROM orders WHERE total > $1"
    );
}
