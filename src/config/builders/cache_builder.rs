//! # 缓存集群配置构建器模块
//!
//! 节点列表按声明顺序保存，权重决定每个节点在一致性哈希环上的虚拟节点数

use crate::cache::ring::MAX_NODE_WEIGHT;
use crate::config::core::{CacheBackend, CacheConf, CacheNodeConf};
use crate::error::ConfigResult;
use rat_logger::info;
use std::collections::HashSet;

/// 缓存集群配置构建器
#[derive(Debug)]
pub struct CacheConfBuilder {
    nodes: Vec<CacheNodeConf>,
    op_timeout_ms: Option<u64>,
}

impl CacheConfBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            op_timeout_ms: None,
        }
    }

    /// 添加缓存节点
    ///
    /// # 参数
    ///
    /// * `name` - 节点名称，集群内唯一
    /// * `weight` - 权重
    /// * `backend` - 节点后端
    pub fn node<S: Into<String>>(mut self, name: S, weight: u32, backend: CacheBackend) -> Self {
        self.nodes.push(CacheNodeConf {
            name: name.into(),
            weight,
            backend,
        });
        self
    }

    /// 设置单次缓存操作超时（毫秒）
    pub fn op_timeout_ms(mut self, op_timeout_ms: u64) -> Self {
        self.op_timeout_ms = Some(op_timeout_ms);
        self
    }

    /// 构建缓存集群配置
    pub fn build(self) -> ConfigResult<CacheConf> {
        let op_timeout_ms = self
            .op_timeout_ms
            .ok_or_else(|| crate::config_error!("缓存操作超时必须设置"))?;

        let conf = CacheConf {
            nodes: self.nodes,
            op_timeout_ms,
        };
        validate_cache_conf(&conf)?;

        info!(
            "创建缓存集群配置: 节点数={}, 超时={}ms",
            conf.nodes.len(),
            conf.op_timeout_ms
        );
        Ok(conf)
    }
}

impl Default for CacheConfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 校验缓存集群配置
pub fn validate_cache_conf(conf: &CacheConf) -> ConfigResult<()> {
    if conf.nodes.is_empty() {
        return Err(crate::config_error!("至少需要配置一个缓存节点"));
    }
    if conf.op_timeout_ms == 0 {
        return Err(crate::config_error!("缓存操作超时不能为零"));
    }

    let mut names = HashSet::new();
    for node in &conf.nodes {
        if node.name.trim().is_empty() {
            return Err(crate::config_error!("缓存节点名称不能为空"));
        }
        if !names.insert(node.name.as_str()) {
            return Err(crate::config_error!(format!("缓存节点名称重复: {}", node.name)));
        }
        if node.weight == 0 {
            return Err(crate::config_error!(format!("缓存节点 {} 的权重不能为零", node.name)));
        }
        if node.weight > MAX_NODE_WEIGHT {
            return Err(crate::config_error!(format!(
                "缓存节点 {} 的权重不能超过{}: {}",
                node.name, MAX_NODE_WEIGHT, node.weight
            )));
        }
        match &node.backend {
            CacheBackend::Local { max_entries } if *max_entries == 0 => {
                return Err(crate::config_error!(format!(
                    "缓存节点 {} 的最大条目数不能为零",
                    node.name
                )));
            }
            CacheBackend::MemCache(mem) if mem.max_capacity == 0 || mem.max_memory_mb == 0 => {
                return Err(crate::config_error!(format!(
                    "缓存节点 {} 的容量与内存上限不能为零",
                    node.name
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> CacheBackend {
        CacheBackend::Local { max_entries: 1024 }
    }

    #[test]
    fn test_build_weighted_nodes() {
        let conf = CacheConfBuilder::new()
            .node("node-a", 100, local())
            .node("node-b", 50, local())
            .op_timeout_ms(200)
            .build()
            .unwrap();
        assert_eq!(conf.nodes.len(), 2);
        assert_eq!(conf.nodes[1].weight, 50);
    }

    #[test]
    fn test_empty_nodes_rejected() {
        assert!(CacheConfBuilder::new().op_timeout_ms(100).build().is_err());
    }

    #[test]
    fn test_zero_weight_rejected() {
        let result = CacheConfBuilder::new()
            .node("node-a", 0, local())
            .op_timeout_ms(100)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_weight_upper_bound() {
        let result = CacheConfBuilder::new()
            .node("node-a", u32::MAX, local())
            .op_timeout_ms(100)
            .build();
        assert!(result.is_err());

        let conf = CacheConfBuilder::new()
            .node("node-a", MAX_NODE_WEIGHT, local())
            .op_timeout_ms(100)
            .build();
        assert!(conf.is_ok());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = CacheConfBuilder::new()
            .node("node-a", 10, local())
            .node("node-a", 20, local())
            .op_timeout_ms(100)
            .build();
        assert!(result.is_err());
    }
}
