//! 索引记录特征
//!
//! 实体实现 [`IndexedRecord`] 声明自己的主键前缀与二级索引键，
//! 模型层据此计算失效键集合。

use super::keys::{IndexKeySet, KeyPrefix};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;

/// 带索引的记录
///
/// 所有二级索引键都指向同一条记录，缓存里每个键各存一份完整记录。
pub trait IndexedRecord: Serialize + DeserializeOwned + Send + Sync {
    /// 主键类型
    type Primary: Display;

    /// 主键缓存键前缀
    const PRIMARY_PREFIX: KeyPrefix;

    /// 主键值
    fn primary(&self) -> Self::Primary;

    /// 二级索引键，值为空的可空属性不产生键
    fn secondary_keys(&self) -> Vec<String>;

    /// 主键缓存键
    fn format_primary(primary: impl Display) -> String
    where
        Self: Sized,
    {
        Self::PRIMARY_PREFIX.format(primary)
    }

    /// 主键加全部二级索引键
    fn index_keys(&self) -> IndexKeySet
    where
        Self: Sized,
    {
        let mut keys = IndexKeySet::new(Self::format_primary(self.primary()));
        for key in self.secondary_keys() {
            keys.push(key);
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize)]
    struct Book {
        id: u32,
        isbn: String,
        alias: Option<String>,
    }

    const BOOK_ISBN: KeyPrefix = KeyPrefix::new("book", &["isbn"]);
    const BOOK_ALIAS: KeyPrefix = KeyPrefix::new("book", &["alias"]);

    impl IndexedRecord for Book {
        type Primary = u32;
        const PRIMARY_PREFIX: KeyPrefix = KeyPrefix::new("book", &["id"]);

        fn primary(&self) -> u32 {
            self.id
        }

        fn secondary_keys(&self) -> Vec<String> {
            let mut keys = vec![BOOK_ISBN.format(&self.isbn)];
            if let Some(alias) = &self.alias {
                keys.push(BOOK_ALIAS.format(alias));
            }
            keys
        }
    }

    #[test]
    fn test_index_keys_start_with_primary() {
        let book = Book {
            id: 3,
            isbn: "978-7".into(),
            alias: None,
        };
        let keys = book.index_keys();
        assert_eq!(keys.primary(), "cache:book:id:3");
        assert_eq!(keys.secondary(), ["cache:book:isbn:978-7".to_string()]);
        assert_eq!(Book::format_primary(3), "cache:book:id:3");
    }

    #[test]
    fn test_nullable_attribute_adds_key_when_set() {
        let book = Book {
            id: 3,
            isbn: "978-7".into(),
            alias: Some("红皮书".into()),
        };
        assert!(book.index_keys().contains("cache:book:alias:红皮书"));
        assert_eq!(book.index_keys().len(), 3);
    }
}
