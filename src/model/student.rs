//! 学生实体模型
//!
//! 索引：主键 `id`，以及班级加姓名的联合唯一索引。

use super::keys::KeyPrefix;
use super::traits::IndexedRecord;
use crate::conn::CachedConn;
use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rat_logger::{debug, info};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;

pub const CACHE_STUDENT_ID_PREFIX: KeyPrefix = KeyPrefix::new("student", &["id"]);
pub const CACHE_STUDENT_CLASS_NAME_PREFIX: KeyPrefix =
    KeyPrefix::new("student", &["class", "name"]);

const STUDENT_FIELDS: &str = "id, class, name, age, score, create_time, update_time";

/// 学生
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    pub class: String,
    pub name: String,
    pub age: Option<i64>,
    pub score: Option<f64>,
    pub create_time: DateTime<Utc>,
    pub update_time: Option<DateTime<Utc>>,
}

impl Student {
    /// 新学生，主键由存储分配
    pub fn new<S: Into<String>>(class: S, name: S) -> Self {
        Self {
            id: 0,
            class: class.into(),
            name: name.into(),
            age: None,
            score: None,
            create_time: Utc::now(),
            update_time: None,
        }
    }

    fn class_name_key(class: &str, name: &str) -> String {
        CACHE_STUDENT_CLASS_NAME_PREFIX.format_composite(&[&class, &name])
    }
}

impl IndexedRecord for Student {
    type Primary = i64;
    const PRIMARY_PREFIX: KeyPrefix = CACHE_STUDENT_ID_PREFIX;

    fn primary(&self) -> i64 {
        self.id
    }

    fn secondary_keys(&self) -> Vec<String> {
        vec![Student::class_name_key(&self.class, &self.name)]
    }
}

/// 学生模型
#[derive(Clone)]
pub struct StudentModel {
    conn: Arc<CachedConn>,
    pool: SqlitePool,
}

impl StudentModel {
    pub fn new(conn: Arc<CachedConn>, pool: SqlitePool) -> Self {
        Self { conn, pool }
    }

    pub async fn ensure_table(&self) -> StoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS `student` (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                class TEXT NOT NULL,
                name TEXT NOT NULL,
                age INTEGER,
                score REAL,
                create_time TEXT NOT NULL,
                update_time TEXT,
                UNIQUE (class, name)
            )",
        )
        .execute(&self.pool)
        .await?;
        info!("学生表已就绪");
        Ok(())
    }

    pub async fn insert(&self, data: &mut Student) -> StoreResult<()> {
        let pool = self.pool.clone();
        let record = data.clone();
        let keyed = data.clone();
        let id = self
            .conn
            .insert_index_with(
                move || async move {
                    let result = sqlx::query(
                        "INSERT INTO `student` (id, class, name, age, score, create_time, update_time)
                         VALUES (?, ?, ?, ?, ?, ?, ?)",
                    )
                    .bind((record.id != 0).then_some(record.id))
                    .bind(record.class)
                    .bind(record.name)
                    .bind(record.age)
                    .bind(record.score)
                    .bind(record.create_time)
                    .bind(record.update_time)
                    .execute(&pool)
                    .await?;
                    Ok(result.last_insert_rowid())
                },
                move |id: &i64| {
                    let mut keyed = keyed;
                    keyed.id = *id;
                    keyed.index_keys().into_vec()
                },
            )
            .await?;

        data.id = id;
        debug!("插入学生成功: id={}", id);
        Ok(())
    }

    pub async fn find_one(&self, id: i64) -> StoreResult<Student> {
        let pool = self.pool.clone();
        self.conn
            .find_index(&self.format_primary(id), move || async move {
                let sql = format!("SELECT {} FROM `student` WHERE id = ? LIMIT 1", STUDENT_FIELDS);
                Ok(sqlx::query_as::<_, Student>(&sql)
                    .bind(id)
                    .fetch_one(&pool)
                    .await?)
            })
            .await
    }

    pub async fn find_one_by_class_name(&self, class: &str, name: &str) -> StoreResult<Student> {
        let key = Student::class_name_key(class, name);
        let pool = self.pool.clone();
        let (class, name) = (class.to_string(), name.to_string());
        self.conn
            .find_index(&key, move || async move {
                let sql = format!(
                    "SELECT {} FROM `student` WHERE class = ? AND name = ? LIMIT 1",
                    STUDENT_FIELDS
                );
                Ok(sqlx::query_as::<_, Student>(&sql)
                    .bind(class)
                    .bind(name)
                    .fetch_one(&pool)
                    .await?)
            })
            .await
    }

    /// 更新学生，失效更新前后两组索引键的并集
    pub async fn update(&self, data: &mut Student) -> StoreResult<()> {
        let old = self.load(data.id).await?;
        data.create_time = old.create_time;
        data.update_time = Some(Utc::now());
        let keys = old.index_keys().union(&data.index_keys());

        let pool = self.pool.clone();
        let record = data.clone();
        self.conn
            .update_index(
                move || async move {
                    let result = sqlx::query(
                        "UPDATE `student` SET class = ?, name = ?, age = ?, score = ?, update_time = ?
                         WHERE id = ?",
                    )
                    .bind(record.class)
                    .bind(record.name)
                    .bind(record.age)
                    .bind(record.score)
                    .bind(record.update_time)
                    .bind(record.id)
                    .execute(&pool)
                    .await?;
                    if result.rows_affected() == 0 {
                        return Err(StoreError::NotFound);
                    }
                    Ok(())
                },
                keys.as_slice(),
            )
            .await
    }

    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let data = self.load(id).await?;
        let keys = data.index_keys();

        let pool = self.pool.clone();
        self.conn
            .del_index(
                move || async move {
                    sqlx::query("DELETE FROM `student` WHERE id = ?")
                        .bind(id)
                        .execute(&pool)
                        .await?;
                    Ok(())
                },
                keys.as_slice(),
            )
            .await
    }

    pub fn format_primary(&self, id: i64) -> String {
        Student::format_primary(id)
    }

    async fn load(&self, id: i64) -> StoreResult<Student> {
        let pool = self.pool.clone();
        self.conn
            .query_no_cache(move || async move {
                let sql = format!("SELECT {} FROM `student` WHERE id = ? LIMIT 1", STUDENT_FIELDS);
                Ok(sqlx::query_as::<_, Student>(&sql)
                    .bind(id)
                    .fetch_one(&pool)
                    .await?)
            })
            .await
    }
}
