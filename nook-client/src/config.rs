use chrono::Duration;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub feed_page_size: u32,

    /// Maximum number of candidates requested from the mention search
    pub mention_search_limit: u32,

    pub mention_cache_capacity: usize,
    pub mention_cache_ttl: Duration,

    /// Quiet time after a keystroke before a mention search is issued
    pub mention_debounce: Duration,
}

impl Default for ClientConfig {
    fn default() -> ClientConfig {
        ClientConfig {
            feed_page_size: 20,
            mention_search_limit: 5,
            mention_cache_capacity: 256,
            mention_cache_ttl: Duration::minutes(10),
            mention_debounce: Duration::milliseconds(300),
        }
    }
}
