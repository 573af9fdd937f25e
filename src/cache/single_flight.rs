//! 单飞（single-flight）
//!
//! 同一个键上并发的多次调用合并为一次执行，执行结果（值或错误）分发给所有调用者。
//! 注册表在执行结束后立即移除对应条目；执行者被取消时，等待者会重新竞争执行权。

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::future::Future;
use tokio::sync::watch;

type Slot<T, E> = Option<Result<T, E>>;

enum Role<T, E> {
    Leader(watch::Sender<Slot<T, E>>),
    Follower(watch::Receiver<Slot<T, E>>),
}

/// 按键合并并发调用
pub struct SingleFlight<T, E> {
    calls: DashMap<String, watch::Receiver<Slot<T, E>>>,
}

impl<T, E> SingleFlight<T, E>
where
    T: Clone,
    E: Clone,
{
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
        }
    }

    /// 正在执行的键数量
    pub fn in_flight(&self) -> usize {
        self.calls.len()
    }

    /// 执行 `f`，同一键上的并发调用只有一个会真正执行
    pub async fn run<F, Fut>(&self, key: &str, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let tx = loop {
            match self.register(key) {
                Role::Leader(tx) => break tx,
                Role::Follower(mut rx) => {
                    if let Ok(slot) = rx.wait_for(|slot| slot.is_some()).await {
                        if let Some(result) = slot.as_ref() {
                            return result.clone();
                        }
                    }
                    crate::debug_log!("单飞执行者已退出，重新竞争: key={}", key);
                }
            }
        };

        let guard = FlightGuard {
            calls: &self.calls,
            key,
            own: tx.subscribe(),
        };
        let result = f().await;
        drop(guard);
        let _ = tx.send(Some(result.clone()));
        result
    }

    fn register(&self, key: &str) -> Role<T, E> {
        match self.calls.entry(key.to_string()) {
            Entry::Occupied(entry) => Role::Follower(entry.get().clone()),
            Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(None);
                entry.insert(rx);
                Role::Leader(tx)
            }
        }
    }
}

impl<T: Clone, E: Clone> Default for SingleFlight<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// 执行结束或被取消时移除自己注册的条目
struct FlightGuard<'a, T, E> {
    calls: &'a DashMap<String, watch::Receiver<Slot<T, E>>>,
    key: &'a str,
    own: watch::Receiver<Slot<T, E>>,
}

impl<T, E> Drop for FlightGuard<'_, T, E> {
    fn drop(&mut self) {
        self.calls
            .remove_if(self.key, |_, rx| rx.same_channel(&self.own));
    }
}
