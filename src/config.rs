use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub admission: AdmissionConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// 区域未配置时区时使用的 IANA 时区
    #[serde(default = "default_time_zone")]
    pub default_time_zone: String,
    /// 事务冲突（序列化失败 / 死锁）的最大重试次数
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
    /// 重试退避基数（毫秒），第 n 次重试等待 n * backoff
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_report_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_report_max_page_size")]
    pub max_page_size: u32,
}

fn default_time_zone() -> String {
    "America/Managua".to_string()
}

fn default_max_conflict_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    20
}

fn default_report_page_size() -> u32 {
    50
}

fn default_report_max_page_size() -> u32 {
    500
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            default_time_zone: default_time_zone(),
            max_conflict_retries: default_max_conflict_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_report_page_size(),
            max_page_size: default_report_max_page_size(),
        }
    }
}

impl AdmissionConfig {
    pub fn time_zone(&self) -> Result<Tz, String> {
        self.default_time_zone
            .parse::<Tz>()
            .map_err(|e| format!("Invalid time zone {}: {e}", self.default_time_zone))
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and config.toml was not found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                    },
                    admission: AdmissionConfig::default(),
                    reports: ReportsConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        toml::from_str(config_str).map_err(|e| format!("Failed to parse config file: {e}").into())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }

        // Admission
        if let Ok(v) = env::var("ADMISSION_TIME_ZONE") {
            self.admission.default_time_zone = v;
        }
        if let Ok(v) = env::var("ADMISSION_MAX_RETRIES")
            && let Ok(n) = v.parse()
        {
            self.admission.max_conflict_retries = n;
        }
        if let Ok(v) = env::var("ADMISSION_RETRY_BACKOFF_MS")
            && let Ok(n) = v.parse()
        {
            self.admission.retry_backoff_ms = n;
        }
    }

    /// 启动时校验，时区名错误直接失败
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.admission.time_zone()?;
        if self.reports.max_page_size == 0 {
            return Err("reports.max_page_size must be positive".into());
        }
        Ok(())
    }
}
