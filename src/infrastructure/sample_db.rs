//! 本地示例数据库
//!
//! 使用 SQLite 保存 users / products / orders 示例数据。
//! 查询始终交给远程工具服务器执行，这里只负责初始化数据和提供结构信息。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::info;

use crate::domain::{ColumnInfo, DatabaseInfo, TableSummary};
use crate::errors::{AgentError, Result};

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT UNIQUE,
        age INTEGER,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        price REAL NOT NULL,
        category TEXT,
        stock INTEGER DEFAULT 0,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER,
        product_id INTEGER,
        quantity INTEGER,
        total_price REAL,
        order_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (user_id) REFERENCES users (id),
        FOREIGN KEY (product_id) REFERENCES products (id)
    );
";

const SAMPLE_USERS: &[(&str, &str, i64)] = &[
    ("張小明", "zhang@example.com", 25),
    ("李小華", "li@example.com", 30),
    ("王小美", "wang@example.com", 28),
    ("陳小強", "chen@example.com", 35),
];

const SAMPLE_PRODUCTS: &[(&str, f64, &str, i64)] = &[
    ("iPhone 15", 29999.0, "手機", 50),
    ("MacBook Pro", 59999.0, "筆電", 20),
    ("AirPods Pro", 6999.0, "耳機", 100),
    ("iPad Air", 19999.0, "平板", 30),
    ("Apple Watch", 12999.0, "手錶", 40),
];

/// (user_id, product_id, quantity, total_price)
const SAMPLE_ORDERS: &[(i64, i64, i64, f64)] = &[
    (1, 1, 2, 59998.0),
    (2, 3, 1, 6999.0),
    (3, 2, 1, 59999.0),
    (1, 4, 1, 19999.0),
    (4, 5, 1, 12999.0),
];

/// SQLite 示例数据库
pub struct SampleDatabase {
    path: String,
    conn: Arc<Mutex<Connection>>,
}

impl SampleDatabase {
    /// 打开（必要时创建）数据库并写入示例数据
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path: PathBuf = db_path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        let db = Self {
            path: path.display().to_string(),
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init()?;
        Ok(db)
    }

    /// 创建内存数据库（用于测试）
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            path: ":memory:".to_string(),
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init()?;
        Ok(db)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn init(&self) -> Result<()> {
        let mut conn = self.lock()?;
        conn.execute_batch(SCHEMA_SQL)?;
        seed(&mut conn)?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| AgentError::Database(format!("Failed to acquire database lock: {}", e)))
    }

    /// 在阻塞线程池中执行数据库操作
    async fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| AgentError::Database(format!("Failed to acquire database lock: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| AgentError::Database(format!("Task failed: {}", e)))?
    }

    /// 表结构摘要
    pub async fn tables(&self) -> Result<Vec<TableSummary>> {
        self.execute(|conn| read_tables(conn)).await
    }

    /// 供提示词使用的文本结构
    pub async fn schema_description(&self) -> Result<String> {
        let tables = self.tables().await?;
        Ok(describe(&tables))
    }

    pub async fn database_info(&self) -> Result<DatabaseInfo> {
        let tables = self.tables().await?;
        let schema = describe(&tables);
        Ok(DatabaseInfo {
            database_path: self.path.clone(),
            tables: tables.into_iter().map(|t| (t.name.clone(), t)).collect::<BTreeMap<_, _>>(),
            schema,
        })
    }
}

/// 仅在 users 为空时写入示例数据
fn seed(conn: &mut Connection) -> Result<()> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    if existing > 0 {
        return Ok(());
    }

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare("INSERT INTO users (name, email, age) VALUES (?1, ?2, ?3)")?;
        for (name, email, age) in SAMPLE_USERS {
            stmt.execute(rusqlite::params![name, email, age])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO products (name, price, category, stock) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (name, price, category, stock) in SAMPLE_PRODUCTS {
            stmt.execute(rusqlite::params![name, price, category, stock])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO orders (user_id, product_id, quantity, total_price) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (user_id, product_id, quantity, total_price) in SAMPLE_ORDERS {
            stmt.execute(rusqlite::params![user_id, product_id, quantity, total_price])?;
        }
    }
    tx.commit()?;

    info!(
        users = SAMPLE_USERS.len(),
        products = SAMPLE_PRODUCTS.len(),
        orders = SAMPLE_ORDERS.len(),
        "seeded sample database"
    );
    Ok(())
}

fn read_tables(conn: &Connection) -> Result<Vec<TableSummary>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        // 表名来自 sqlite_master，引用后再拼接
        let quoted = format!("\"{}\"", name.replace('"', "\"\""));

        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quoted))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    column_type: row.get(2)?,
                    not_null: row.get::<_, i64>(3)? != 0,
                    primary_key: row.get::<_, i64>(5)? != 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let row_count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", quoted), [], |row| row.get(0))?;

        tables.push(TableSummary {
            name,
            row_count,
            columns,
        });
    }
    Ok(tables)
}

fn describe(tables: &[TableSummary]) -> String {
    let mut lines = Vec::new();
    for table in tables {
        lines.push(format!("Table: {}", table.name));
        for col in &table.columns {
            lines.push(format!("  - {} ({})", col.name, col.column_type));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_seeded_tables() {
        let db = SampleDatabase::open_in_memory().unwrap();
        let tables = db.tables().await.unwrap();

        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["orders", "products", "users"]);

        let counts: BTreeMap<&str, i64> =
            tables.iter().map(|t| (t.name.as_str(), t.row_count)).collect();
        assert_eq!(counts["users"], 4);
        assert_eq!(counts["products"], 5);
        assert_eq!(counts["orders"], 5);
    }

    #[tokio::test]
    async fn test_schema_description_lists_columns() {
        let db = SampleDatabase::open_in_memory().unwrap();
        let text = db.schema_description().await.unwrap();

        assert!(text.contains("Table: users"));
        assert!(text.contains("  - email (TEXT)"));
        assert!(text.contains("  - price (REAL)"));
        assert!(text.contains("  - order_date (TIMESTAMP)"));
    }

    #[tokio::test]
    async fn test_reopen_does_not_reseed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ai_agent.db");

        {
            let db = SampleDatabase::open(&path).unwrap();
            assert_eq!(db.path(), path.display().to_string());
        }
        let db = SampleDatabase::open(&path).unwrap();
        let info = db.database_info().await.unwrap();

        assert_eq!(info.tables["users"].row_count, 4);
        assert!(info.tables["users"].columns.iter().any(|c| c.name == "id" && c.primary_key));
        assert!(info.tables["products"].columns.iter().any(|c| c.name == "name" && c.not_null));
    }
}
