//! 加权一致性哈希
//!
//! 每个节点按权重在环上放置虚拟节点，键经 CRC32 映射到环上顺时针第一个
//! 虚拟节点。拓扑不变时同一个键总是路由到同一个节点。

/// 权重 100 对应的虚拟节点数
const REPLICAS_PER_TOP_WEIGHT: u64 = 100;
/// 基准权重
const TOP_WEIGHT: u64 = 100;
/// 单节点权重上限，超出部分按上限计
pub const MAX_NODE_WEIGHT: u32 = 10_000;

/// 一致性哈希环
#[derive(Debug, Clone)]
pub struct HashRing {
    /// (哈希位置, 节点下标)，按位置升序
    points: Vec<(u32, usize)>,
}

impl HashRing {
    /// 由 (节点名, 权重) 列表构建哈希环，节点下标即列表下标
    pub fn new<S: AsRef<str>>(nodes: &[(S, u32)]) -> Self {
        let mut points = Vec::new();
        for (index, (name, weight)) in nodes.iter().enumerate() {
            if *weight == 0 {
                continue;
            }
            let weight = (*weight).min(MAX_NODE_WEIGHT) as u64;
            let replicas = (REPLICAS_PER_TOP_WEIGHT * weight / TOP_WEIGHT).max(1);
            for replica in 0..replicas {
                let seed = format!("{}#{}", name.as_ref(), replica);
                points.push((crc32fast::hash(seed.as_bytes()), index));
            }
        }
        points.sort_unstable();
        points.dedup_by_key(|(hash, _)| *hash);
        Self { points }
    }

    /// 计算键所属节点下标，环为空时返回 `None`
    pub fn route(&self, key: &str) -> Option<usize> {
        if self.points.is_empty() {
            return None;
        }
        let hash = crc32fast::hash(key.as_bytes());
        let pos = self.points.partition_point(|(point, _)| *point < hash);
        let (_, index) = self.points[pos % self.points.len()];
        crate::debug_log!("键路由: key={}, hash={}, node={}", key, hash, index);
        Some(index)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
