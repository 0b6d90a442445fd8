use std::time::Duration;

/// Runtime configuration, loaded once at startup and passed into every
/// component at construction. No component reads the environment at call
/// time.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub redis_url: String,
    /// Key isolation namespace. Must not contain the `:` separator.
    pub redis_prefix: String,
    pub campaign_ttl_seconds: u64,
    pub pageview_ttl_seconds: u64,
    pub dedup_window_seconds: u64,
    pub min_hit_interval_seconds: u64,
    /// Must be >= `min_hit_interval_seconds` so the cooldown window is
    /// enforced without gaps.
    pub hit_gate_ttl_seconds: u64,
    /// Store-outage policy for the hit gate: admit (`true`) or suppress
    /// (`false`) when the store cannot answer. Dedup and campaign failures
    /// always surface regardless of this setting.
    pub hit_gate_fail_open: bool,
    pub store_timeout_ms: u64,
    pub geo_driver: GeoDriverKind,
    pub geo_fallback: Option<GeoDriverKind>,
    pub geo_city_db_path: String,
    pub geo_asn_db_path: String,
    pub geo_api_url: String,
    pub geo_api_timeout_ms: u64,
    pub cors_origins: Vec<String>,
    pub rate_limit_per_minute: u32,
    pub rate_limit_disable: bool,
    /// Campaign ids seeded into the in-process registry loader.
    pub campaigns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoDriverKind {
    MaxMind,
    Api,
}

impl GeoDriverKind {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "maxmind" => Ok(Self::MaxMind),
            "api" => Ok(Self::Api),
            other => Err(format!("unknown geolocation driver: {other}")),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let config = Self {
            port: env_parse("PULSETRACK_PORT", 3000)?,
            redis_url: env_or("PULSETRACK_REDIS_URL", "redis://127.0.0.1:6379"),
            redis_prefix: env_or("PULSETRACK_REDIS_PREFIX", "pulsetrack"),
            campaign_ttl_seconds: env_parse("PULSETRACK_CAMPAIGN_TTL_SECONDS", 3600)?,
            pageview_ttl_seconds: env_parse("PULSETRACK_PAGEVIEW_TTL_SECONDS", 86400)?,
            dedup_window_seconds: env_parse("PULSETRACK_DEDUP_WINDOW_SECONDS", 86400)?,
            min_hit_interval_seconds: env_parse("PULSETRACK_MIN_HIT_INTERVAL_SECONDS", 30)?,
            hit_gate_ttl_seconds: env_parse("PULSETRACK_HIT_GATE_TTL_SECONDS", 90)?,
            hit_gate_fail_open: env_or("PULSETRACK_HIT_GATE_FAIL_OPEN", "true") == "true",
            store_timeout_ms: env_parse("PULSETRACK_STORE_TIMEOUT_MS", 2000)?,
            geo_driver: GeoDriverKind::parse(&env_or("PULSETRACK_GEO_DRIVER", "maxmind"))?,
            geo_fallback: {
                let raw = env_or("PULSETRACK_GEO_FALLBACK", "api");
                if raw == "none" {
                    None
                } else {
                    Some(GeoDriverKind::parse(&raw)?)
                }
            },
            geo_city_db_path: env_or("PULSETRACK_GEO_CITY_DB_PATH", "./GeoLite2-City.mmdb"),
            geo_asn_db_path: env_or("PULSETRACK_GEO_ASN_DB_PATH", "./GeoLite2-ASN.mmdb"),
            geo_api_url: env_or("PULSETRACK_GEO_API_URL", "http://ip-api.com/json"),
            geo_api_timeout_ms: env_parse("PULSETRACK_GEO_API_TIMEOUT_MS", 1500)?,
            cors_origins: std::env::var("PULSETRACK_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            rate_limit_per_minute: env_parse("PULSETRACK_RATE_LIMIT_PER_MINUTE", 120)?,
            rate_limit_disable: env_or("PULSETRACK_RATE_LIMIT_DISABLE", "false") == "true",
            campaigns: env_or("PULSETRACK_CAMPAIGNS", "campaign_default")
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Startup-time validation so no component needs to re-check at call
    /// time.
    pub fn validate(&self) -> Result<(), String> {
        if self.redis_prefix.is_empty() || self.redis_prefix.contains(':') {
            return Err("redis prefix must be non-empty and free of ':'".to_string());
        }
        if self.hit_gate_ttl_seconds < self.min_hit_interval_seconds {
            return Err(format!(
                "hit gate TTL ({}s) must be at least the minimum hit interval ({}s)",
                self.hit_gate_ttl_seconds, self.min_hit_interval_seconds
            ));
        }
        for (name, value) in [
            ("campaign TTL", self.campaign_ttl_seconds),
            ("pageview TTL", self.pageview_ttl_seconds),
            ("dedup window", self.dedup_window_seconds),
            ("hit gate TTL", self.hit_gate_ttl_seconds),
        ] {
            if value == 0 {
                return Err(format!("{name} must be non-zero"));
            }
        }
        Ok(())
    }

    pub fn campaign_ttl(&self) -> Duration {
        Duration::from_secs(self.campaign_ttl_seconds)
    }

    pub fn pageview_ttl(&self) -> Duration {
        Duration::from_secs(self.pageview_ttl_seconds)
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_secs(self.dedup_window_seconds)
    }

    pub fn hit_gate_ttl(&self) -> Duration {
        Duration::from_secs(self.hit_gate_ttl_seconds)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn geo_api_timeout(&self) -> Duration {
        Duration::from_millis(self.geo_api_timeout_ms)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|e| format!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}
