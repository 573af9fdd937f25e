//! 实体模型集成测试（SQLite 内存库）

#![cfg(feature = "sqlite-support")]

mod common;

use chrono::Utc;
use common::{fixed_ttl, flaky_conn};
use rat_cacheaside::model::user::{CACHE_USER_ID_PREFIX, CACHE_USER_MOBILE_PREFIX};
use rat_cacheaside::{CachedConn, IndexedRecord, StoreError, Student, StudentModel, User, UserModel};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;

async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

async fn setup() -> (Arc<CachedConn>, UserModel, StudentModel) {
    let (conn, _) = flaky_conn(fixed_ttl(
        Duration::from_secs(60),
        Duration::from_secs(30),
    ));
    let conn = Arc::new(conn);
    let pool = memory_pool().await;
    let users = UserModel::new(conn.clone(), pool.clone());
    let students = StudentModel::new(conn.clone(), pool);
    users.ensure_table().await.unwrap();
    students.ensure_table().await.unwrap();
    (conn, users, students)
}

fn new_user(user: &str, mobile: &str) -> User {
    User {
        id: 0,
        user: user.to_string(),
        name: None,
        password: "123456".to_string(),
        mobile: mobile.to_string(),
        gender: "未公开".to_string(),
        nickname: user.to_string(),
        tp: 1,
        create_time: None,
        update_time: Utc::now(),
    }
}

fn assert_same_user(found: &User, expected: &User) {
    assert_eq!(found.id, expected.id);
    assert_eq!(found.user, expected.user);
    assert_eq!(found.name, expected.name);
    assert_eq!(found.mobile, expected.mobile);
    assert_eq!(found.nickname, expected.nickname);
    assert_eq!(found.tp, expected.tp);
}

#[tokio::test]
async fn test_insert_then_find_uses_cache_on_second_read() {
    println!("🔍 测试插入后读取与缓存命中");
    let (conn, users, _) = setup().await;

    let mut user = new_user("alice", "13800000000");
    users.insert(&mut user).await.unwrap();
    assert_eq!(user.id, 1);
    assert!(user.create_time.is_some());

    let before = conn.cache().stats();
    let first = users.find_one(1).await.unwrap();
    assert_same_user(&first, &user);
    let after_first = conn.cache().stats();
    assert_eq!(after_first.writes, before.writes + 1);
    assert_eq!(after_first.hits, before.hits);

    let second = users.find_one(1).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(conn.cache().stats().hits, after_first.hits + 1);

    let cached: Option<User> = conn.get_cache("cache:user:id:1").await.unwrap();
    assert_eq!(cached, Some(first));
    println!("✅ 第二次读取命中缓存");
}

#[tokio::test]
async fn test_insert_overrides_stale_cached_record() {
    let (conn, users, _) = setup().await;

    let mut stale = new_user("ghost", "13900000000");
    stale.id = 1;
    conn.set_cache(&users.format_primary(1), &stale).await.unwrap();
    conn.set_cache(&CACHE_USER_MOBILE_PREFIX.format("13800000000"), &stale)
        .await
        .unwrap();

    let mut user = new_user("alice", "13800000000");
    users.insert(&mut user).await.unwrap();
    assert_eq!(user.id, 1);

    assert_same_user(&users.find_one(1).await.unwrap(), &user);
    assert_same_user(&users.find_one_by_mobile("13800000000").await.unwrap(), &user);
}

#[tokio::test]
async fn test_insert_clears_negative_entries() {
    let (_, users, _) = setup().await;

    assert_eq!(users.find_one(1).await.unwrap_err(), StoreError::NotFound);
    assert_eq!(
        users.find_one_by_user("alice").await.unwrap_err(),
        StoreError::NotFound
    );

    let mut user = new_user("alice", "13800000000");
    users.insert(&mut user).await.unwrap();

    assert_same_user(&users.find_one(1).await.unwrap(), &user);
    assert_same_user(&users.find_one_by_user("alice").await.unwrap(), &user);
}

#[tokio::test]
async fn test_secondary_lookups() {
    let (_, users, _) = setup().await;

    let mut user = new_user("bob", "13700000000");
    user.name = Some("鲍勃".to_string());
    user.tp = 2;
    users.insert(&mut user).await.unwrap();

    assert_same_user(&users.find_one_by_mobile("13700000000").await.unwrap(), &user);
    assert_same_user(&users.find_one_by_user("bob").await.unwrap(), &user);
    assert_same_user(&users.find_one_by_name("鲍勃").await.unwrap(), &user);
    assert_same_user(&users.find_one_by_tp(2).await.unwrap(), &user);
    assert!(users.find_one_by_mobile("10000000000").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_update_invalidates_old_and_new_keys() {
    println!("🔍 测试更新后新旧索引键都失效");
    let (_, users, _) = setup().await;

    let mut user = new_user("alice", "13800000000");
    users.insert(&mut user).await.unwrap();

    // 缓存旧值以及“新手机号不存在”
    let old = users.find_one_by_mobile("13800000000").await.unwrap();
    assert!(users.find_one_by_mobile("13811111111").await.unwrap_err().is_not_found());
    let _ = users.find_one(user.id).await.unwrap();

    let mut changed = old.clone();
    changed.mobile = "13811111111".to_string();
    changed.nickname = "小A".to_string();
    users.update(&mut changed).await.unwrap();

    let by_new = users.find_one_by_mobile("13811111111").await.unwrap();
    assert_eq!(by_new.nickname, "小A");
    assert!(users.find_one_by_mobile("13800000000").await.unwrap_err().is_not_found());
    assert_eq!(users.find_one(user.id).await.unwrap().mobile, "13811111111");
    println!("✅ 更新后旧手机号查不到，新手机号命中新记录");
}

#[tokio::test]
async fn test_update_missing_record_is_not_found() {
    let (_, users, _) = setup().await;

    let mut ghost = new_user("ghost", "13900000000");
    ghost.id = 99;
    assert_eq!(users.update(&mut ghost).await.unwrap_err(), StoreError::NotFound);
}

#[tokio::test]
async fn test_delete_then_find_is_not_found() {
    let (conn, users, _) = setup().await;

    let mut user = new_user("alice", "13800000000");
    users.insert(&mut user).await.unwrap();
    let _ = users.find_one(user.id).await.unwrap();
    let _ = users.find_one_by_user("alice").await.unwrap();

    users.delete(user.id).await.unwrap();

    assert!(users.find_one(user.id).await.unwrap_err().is_not_found());
    assert!(users.find_one_by_user("alice").await.unwrap_err().is_not_found());
    assert!(users.delete(user.id).await.unwrap_err().is_not_found());

    let cached: Option<User> = conn.get_cache(&users.format_primary(user.id)).await.unwrap();
    assert!(cached.is_none());
}

#[test]
fn test_user_index_keys() {
    let mut user = new_user("alice", "13800000000");
    user.id = 1;
    let keys = user.index_keys();
    assert_eq!(keys.primary(), CACHE_USER_ID_PREFIX.format(1));
    assert!(keys.contains("cache:user:mobile:13800000000"));
    assert!(keys.contains("cache:user:user:alice"));
    assert!(keys.contains("cache:user:tp:1"));
    // 名称为空时不产生名称索引键
    assert_eq!(keys.len(), 4);

    user.name = Some("爱丽丝".to_string());
    assert!(user.index_keys().contains("cache:user:name:爱丽丝"));
}

#[tokio::test]
async fn test_student_composite_key_lookup() {
    let (conn, _, students) = setup().await;

    let mut student = Student::new("一班", "张三");
    student.age = Some(12);
    student.score = Some(95.5);
    students.insert(&mut student).await.unwrap();
    assert_eq!(student.id, 1);

    let found = students.find_one_by_class_name("一班", "张三").await.unwrap();
    assert_eq!(found.id, student.id);
    assert_eq!(found.score, Some(95.5));

    let cached: Option<Student> = conn
        .get_cache("cache:student:class:name:一班:张三")
        .await
        .unwrap();
    assert_eq!(cached.map(|s| s.id), Some(student.id));

    assert!(
        students
            .find_one_by_class_name("一班", "李四")
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn test_student_rename_moves_composite_key() {
    let (_, _, students) = setup().await;

    let mut student = Student::new("一班", "张三");
    students.insert(&mut student).await.unwrap();
    let _ = students.find_one_by_class_name("一班", "张三").await.unwrap();

    let mut moved = students.find_one(student.id).await.unwrap();
    moved.class = "二班".to_string();
    students.update(&mut moved).await.unwrap();
    assert!(moved.update_time.is_some());

    assert!(
        students
            .find_one_by_class_name("一班", "张三")
            .await
            .unwrap_err()
            .is_not_found()
    );
    let found = students.find_one_by_class_name("二班", "张三").await.unwrap();
    assert_eq!(found.id, student.id);

    students.delete(student.id).await.unwrap();
    assert!(students.find_one(student.id).await.unwrap_err().is_not_found());
}
