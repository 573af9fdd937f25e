//! 索引键构造
//!
//! 缓存键格式为 `cache:<实体>:<属性...>:<值...>`，多个属性与多个值都以 `:` 连接。
//! 例如用户手机号索引 `cache:user:mobile:13800000000`，
//! 学生班级加姓名联合索引 `cache:student:class:name:一班:张三`。

use std::fmt::Display;

/// 缓存键命名空间
pub const CACHE_KEY_NAMESPACE: &str = "cache";

/// 缓存键前缀
///
/// 同一实体的主键前缀与各唯一索引前缀互不相同，不同实体的实体名互不相同，
/// 因此不同索引的键不会冲突。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPrefix {
    entity: &'static str,
    attributes: &'static [&'static str],
}

impl KeyPrefix {
    pub const fn new(entity: &'static str, attributes: &'static [&'static str]) -> Self {
        Self { entity, attributes }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn attributes(&self) -> &'static [&'static str] {
        self.attributes
    }

    /// 前缀字符串，以 `:` 结尾
    pub fn prefix(&self) -> String {
        let mut prefix = format!("{}:{}:", CACHE_KEY_NAMESPACE, self.entity);
        for attribute in self.attributes {
            prefix.push_str(attribute);
            prefix.push(':');
        }
        prefix
    }

    /// 单值索引键
    pub fn format(&self, value: impl Display) -> String {
        format!("{}{}", self.prefix(), value)
    }

    /// 联合索引键，值按属性声明顺序排列
    pub fn format_composite(&self, values: &[&dyn Display]) -> String {
        debug_assert_eq!(values.len(), self.attributes.len());
        let mut key = self.prefix();
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                key.push(':');
            }
            key.push_str(&value.to_string());
        }
        key
    }
}

/// 一条记录的全部索引键
///
/// 第一个元素总是主键，其余为二级索引键，不含重复。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKeySet {
    keys: Vec<String>,
}

impl IndexKeySet {
    pub fn new(primary: String) -> Self {
        Self {
            keys: vec![primary],
        }
    }

    /// 追加一个二级索引键，重复键被忽略
    pub fn push(&mut self, key: String) {
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
    }

    pub fn with(mut self, key: String) -> Self {
        self.push(key);
        self
    }

    pub fn primary(&self) -> &str {
        &self.keys[0]
    }

    pub fn secondary(&self) -> &[String] {
        &self.keys[1..]
    }

    /// 两组键的并集，保留 `self` 的主键在首位
    pub fn union(mut self, other: &IndexKeySet) -> Self {
        for key in &other.keys {
            self.push(key.clone());
        }
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.keys
    }

    pub fn into_vec(self) -> Vec<String> {
        self.keys
    }
}
