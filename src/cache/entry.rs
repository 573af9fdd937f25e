//! 缓存条目编解码
//!
//! 缓存里的值要么是序列化后的记录，要么是表示"确认不存在"的占位符。

use bytes::Bytes;

/// 空值占位符，不是合法的 JSON，不会与任何序列化记录冲突
pub const NOT_FOUND_PLACEHOLDER: &[u8] = b"*";

/// 缓存条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// 序列化后的记录
    Populated(Bytes),
    /// 确认存储中不存在
    Negative,
}

impl CacheEntry {
    /// 从缓存载荷解析条目
    pub fn from_payload(payload: Bytes) -> Self {
        if payload.as_ref() == NOT_FOUND_PLACEHOLDER {
            CacheEntry::Negative
        } else {
            CacheEntry::Populated(payload)
        }
    }

    /// 转换为写入缓存的载荷
    pub fn into_payload(self) -> Bytes {
        match self {
            CacheEntry::Populated(payload) => payload,
            CacheEntry::Negative => Bytes::from_static(NOT_FOUND_PLACEHOLDER),
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, CacheEntry::Negative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_negative() {
        let entry = CacheEntry::from_payload(Bytes::from_static(b"*"));
        assert!(entry.is_negative());
        assert_eq!(entry.into_payload().as_ref(), NOT_FOUND_PLACEHOLDER);
    }

    #[test]
    fn test_json_payload_is_populated() {
        let payload = Bytes::from(serde_json::to_vec(&serde_json::json!({"id": 1})).unwrap());
        let entry = CacheEntry::from_payload(payload.clone());
        assert_eq!(entry, CacheEntry::Populated(payload));
    }

    #[test]
    fn test_placeholder_is_not_valid_json() {
        assert!(serde_json::from_slice::<serde_json::Value>(NOT_FOUND_PLACEHOLDER).is_err());
    }
}
