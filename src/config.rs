/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 考试服务端基础地址
    pub api_base_url: String,
    /// 考试服务端访问令牌
    pub api_token: String,
    /// 要运行的会话ID
    pub attempt_id: i64,
    /// 倒计时步长（毫秒）
    pub timer_tick_ms: u64,
    /// 同步心跳周期（毫秒）
    pub sync_interval_ms: u64,
    /// 首次同步前的延迟（毫秒）
    pub sync_initial_delay_ms: u64,
    /// 同步校正超过该偏差时输出告警日志（毫秒）
    pub max_drift_warn_ms: u64,
    /// 断点恢复提示文件
    pub resume_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080".to_string(),
            api_token: String::new(),
            attempt_id: 0,
            timer_tick_ms: 1_000,
            sync_interval_ms: 5_000,
            sync_initial_delay_ms: 2_000,
            max_drift_warn_ms: 5_000,
            resume_file: "attempt_resume.json".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("EXAM_API_BASE_URL").unwrap_or(default.api_base_url),
            api_token: std::env::var("EXAM_API_TOKEN").unwrap_or(default.api_token),
            attempt_id: std::env::var("EXAM_ATTEMPT_ID").ok().and_then(|v| v.parse().ok()).unwrap_or(default.attempt_id),
            timer_tick_ms: std::env::var("TIMER_TICK_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.timer_tick_ms),
            sync_interval_ms: std::env::var("SYNC_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.sync_interval_ms),
            sync_initial_delay_ms: std::env::var("SYNC_INITIAL_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.sync_initial_delay_ms),
            max_drift_warn_ms: std::env::var("MAX_DRIFT_WARN_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_drift_warn_ms),
            resume_file: std::env::var("RESUME_FILE").unwrap_or(default.resume_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }
}
