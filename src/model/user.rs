//! 用户实体模型
//!
//! 索引：主键 `id`，唯一属性 `user`、`mobile`，可空的 `name`，以及用户类型 `type`。
//! 按类型查找返回该类型下的任意一个用户。

use super::keys::KeyPrefix;
use super::traits::IndexedRecord;
use crate::conn::CachedConn;
use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rat_logger::{debug, info};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;

pub const CACHE_USER_ID_PREFIX: KeyPrefix = KeyPrefix::new("user", &["id"]);
pub const CACHE_USER_MOBILE_PREFIX: KeyPrefix = KeyPrefix::new("user", &["mobile"]);
pub const CACHE_USER_NAME_PREFIX: KeyPrefix = KeyPrefix::new("user", &["name"]);
pub const CACHE_USER_TP_PREFIX: KeyPrefix = KeyPrefix::new("user", &["tp"]);
pub const CACHE_USER_USER_PREFIX: KeyPrefix = KeyPrefix::new("user", &["user"]);

const USER_FIELDS: &str =
    "id, user, name, password, mobile, gender, nickname, type, create_time, update_time";

/// 用户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// 主键，插入时为 0 表示由存储分配
    pub id: i64,
    /// 用户
    pub user: String,
    /// 用户名称
    pub name: Option<String>,
    /// 用户密码
    pub password: String,
    /// 手机号
    pub mobile: String,
    /// 男｜女｜未公开
    pub gender: String,
    /// 用户昵称
    pub nickname: String,
    /// 用户类型
    #[sqlx(rename = "type")]
    pub tp: i64,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: DateTime<Utc>,
}

impl IndexedRecord for User {
    type Primary = i64;
    const PRIMARY_PREFIX: KeyPrefix = CACHE_USER_ID_PREFIX;

    fn primary(&self) -> i64 {
        self.id
    }

    fn secondary_keys(&self) -> Vec<String> {
        let mut keys = vec![
            CACHE_USER_MOBILE_PREFIX.format(&self.mobile),
            CACHE_USER_USER_PREFIX.format(&self.user),
            CACHE_USER_TP_PREFIX.format(self.tp),
        ];
        if let Some(name) = &self.name {
            keys.push(CACHE_USER_NAME_PREFIX.format(name));
        }
        keys
    }
}

enum Lookup {
    Text(String),
    Int(i64),
}

/// 用户模型
#[derive(Clone)]
pub struct UserModel {
    conn: Arc<CachedConn>,
    pool: SqlitePool,
}

impl UserModel {
    pub fn new(conn: Arc<CachedConn>, pool: SqlitePool) -> Self {
        Self { conn, pool }
    }

    /// 建表（已存在则跳过）
    pub async fn ensure_table(&self) -> StoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS `user` (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user TEXT NOT NULL UNIQUE,
                name TEXT UNIQUE,
                password TEXT NOT NULL,
                mobile TEXT NOT NULL UNIQUE,
                gender TEXT NOT NULL,
                nickname TEXT NOT NULL,
                type INTEGER NOT NULL,
                create_time TEXT,
                update_time TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        info!("用户表已就绪");
        Ok(())
    }

    /// 插入用户，`data.id` 为 0 时回填存储分配的主键
    pub async fn insert(&self, data: &mut User) -> StoreResult<()> {
        let now = Utc::now();
        data.create_time.get_or_insert(now);
        data.update_time = now;

        let pool = self.pool.clone();
        let record = data.clone();
        let keyed = data.clone();
        let id = self
            .conn
            .insert_index_with(
                move || async move {
                    let result = sqlx::query(
                        "INSERT INTO `user` (id, user, name, password, mobile, gender, nickname, type, create_time, update_time)
                         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    )
                    .bind((record.id != 0).then_some(record.id))
                    .bind(record.user)
                    .bind(record.name)
                    .bind(record.password)
                    .bind(record.mobile)
                    .bind(record.gender)
                    .bind(record.nickname)
                    .bind(record.tp)
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
        debug!("插入用户成功: id={}", id);
        Ok(())
    }

    pub async fn find_one(&self, id: i64) -> StoreResult<User> {
        self.find_by(&self.format_primary(id), "id", Lookup::Int(id))
            .await
    }

    pub async fn find_one_by_mobile(&self, mobile: &str) -> StoreResult<User> {
        let key = CACHE_USER_MOBILE_PREFIX.format(mobile);
        self.find_by(&key, "mobile", Lookup::Text(mobile.to_string()))
            .await
    }

    pub async fn find_one_by_name(&self, name: &str) -> StoreResult<User> {
        let key = CACHE_USER_NAME_PREFIX.format(name);
        self.find_by(&key, "name", Lookup::Text(name.to_string()))
            .await
    }

    pub async fn find_one_by_tp(&self, tp: i64) -> StoreResult<User> {
        let key = CACHE_USER_TP_PREFIX.format(tp);
        self.find_by(&key, "type", Lookup::Int(tp)).await
    }

    pub async fn find_one_by_user(&self, user: &str) -> StoreResult<User> {
        let key = CACHE_USER_USER_PREFIX.format(user);
        self.find_by(&key, "user", Lookup::Text(user.to_string()))
            .await
    }

    /// 更新用户
    ///
    /// 失效更新前后两组索引键的并集，被修改掉的旧手机号等键不会残留。
    pub async fn update(&self, data: &mut User) -> StoreResult<()> {
        let old = self.load(data.id).await?;
        data.create_time = old.create_time;
        data.update_time = Utc::now();
        let keys = old.index_keys().union(&data.index_keys());

        let pool = self.pool.clone();
        let record = data.clone();
        self.conn
            .update_index(
                move || async move {
                    let result = sqlx::query(
                        "UPDATE `user` SET user = ?, name = ?, password = ?, mobile = ?, gender = ?,
                         nickname = ?, type = ?, update_time = ? WHERE id = ?",
                    )
                    .bind(record.user)
                    .bind(record.name)
                    .bind(record.password)
                    .bind(record.mobile)
                    .bind(record.gender)
                    .bind(record.nickname)
                    .bind(record.tp)
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

    /// 删除用户，失效其当前全部索引键
    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let data = self.load(id).await?;
        let keys = data.index_keys();

        let pool = self.pool.clone();
        self.conn
            .del_index(
                move || async move {
                    sqlx::query("DELETE FROM `user` WHERE id = ?")
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
        User::format_primary(id)
    }

    /// 不经缓存读取当前行
    async fn load(&self, id: i64) -> StoreResult<User> {
        let pool = self.pool.clone();
        self.conn
            .query_no_cache(move || async move {
                let sql = format!("SELECT {} FROM `user` WHERE id = ? LIMIT 1", USER_FIELDS);
                Ok(sqlx::query_as::<_, User>(&sql)
                    .bind(id)
                    .fetch_one(&pool)
                    .await?)
            })
            .await
    }

    async fn find_by(&self, key: &str, column: &'static str, value: Lookup) -> StoreResult<User> {
        let pool = self.pool.clone();
        self.conn
            .find_index(key, move || async move {
                let sql = format!(
                    "SELECT {} FROM `user` WHERE {} = ? LIMIT 1",
                    USER_FIELDS, column
                );
                let query = sqlx::query_as::<_, User>(&sql);
                let query = match value {
                    Lookup::Text(v) => query.bind(v),
                    Lookup::Int(v) => query.bind(v),
                };
                Ok(query.fetch_one(&pool).await?)
            })
            .await
    }
}
