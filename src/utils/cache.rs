use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 缓存项
#[derive(Debug, Clone)]
struct CacheItem<T> {
    value: T,
    expires_at: Instant,
}

/// 简单的内存缓存实现
///
/// 过期项在读取时惰性删除，不依赖后台任务。
/// 每次 `clear` 递增代数，`set_if_generation` 据此丢弃清空前开始的写入。
#[derive(Debug, Clone)]
pub struct Cache<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<String, CacheItem<T>>>>,
    generation: Arc<AtomicU64>,
    default_ttl: Duration,
}

impl<T: Clone + Send + Sync + 'static> Cache<T> {
    /// 创建新的缓存实例
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
            default_ttl,
        }
    }

    /// 设置缓存项
    pub fn set(&self, key: String, value: T) {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    /// 设置带有自定义TTL的缓存项
    pub fn set_with_ttl(&self, key: String, value: T, ttl: Duration) {
        let item = CacheItem {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.data.write().insert(key, item);
    }

    /// 仅当缓存自 `generation` 读取后未被清空时写入，返回是否写入
    pub fn set_if_generation(&self, key: String, value: T, generation: u64) -> bool {
        let mut data = self.data.write();
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        data.insert(
            key,
            CacheItem {
                value,
                expires_at: Instant::now() + self.default_ttl,
            },
        );
        true
    }

    /// 当前代数
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// 获取缓存项
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        {
            let data = self.data.read();
            match data.get(key) {
                Some(item) if item.expires_at > now => return Some(item.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // 过期了，升级为写锁删除（期间可能已被重新写入，需再次检查）
        let mut data = self.data.write();
        if data.get(key).map_or(false, |item| item.expires_at <= now) {
            data.remove(key);
        }
        None
    }

    /// 删除缓存项
    pub fn delete(&self, key: &str) -> bool {
        self.data.write().remove(key).is_some()
    }

    /// 清空所有缓存
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.clear();
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// 缓存大小（包含尚未清理的过期项）
    #[cfg(test)]
    fn size(&self) -> usize {
        self.data.read().len()
    }
}

/// 生成首页缓存键（由完整请求路径与查询串派生）
pub fn index_page_key(path_and_query: &str) -> String {
    format!("index_page:{}", path_and_query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let cache: Cache<String> = Cache::new(Duration::from_secs(20));
        cache.set("a".to_string(), "rendered".to_string());
        assert_eq!(cache.get("a").as_deref(), Some("rendered"));
        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_clear() {
        let cache: Cache<u32> = Cache::new(Duration::from_secs(20));
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        assert_eq!(cache.size(), 2);
        cache.clear();
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let cache: Cache<u32> = Cache::new(Duration::from_secs(20));
        cache.set_with_ttl("short".to_string(), 1, Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_set_skipped_when_cleared_after_generation_read() {
        let cache: Cache<String> = Cache::new(Duration::from_secs(20));
        let generation = cache.generation();

        // 渲染期间有写操作清空了缓存
        cache.clear();

        assert!(!cache.set_if_generation("index_page:/".to_string(), "old".to_string(), generation));
        assert_eq!(cache.get("index_page:/"), None);

        let generation = cache.generation();
        assert!(cache.set_if_generation("index_page:/".to_string(), "fresh".to_string(), generation));
        assert_eq!(cache.get("index_page:/").as_deref(), Some("fresh"));
    }

    #[test]
    fn test_index_page_key() {
        assert_eq!(index_page_key("/"), "index_page:/");
        assert_eq!(index_page_key("/?page=2"), "index_page:/?page=2");
    }
}
