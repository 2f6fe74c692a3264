use anyhow::Context;
use quickbite_types::domain::stepper::Density;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub admin_token: Option<String>,
    pub session_id: Option<String>,
    pub stepper_density: Density,
}

fn secs(key: &str, default: u64) -> anyhow::Result<Duration> {
    match env::var(key) {
        Ok(raw) => {
            let n: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{key} must be a whole number of seconds"))?;
            if n == 0 {
                anyhow::bail!("{key} must be greater than zero");
            }
            Ok(Duration::from_secs(n))
        }
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base_url =
            env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3001/api".into());
        let poll_interval = secs("POLL_INTERVAL_SECS", 30)?;
        let request_timeout = secs("REQUEST_TIMEOUT_SECS", 30)?;
        let admin_token = env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty());
        let session_id = env::var("SESSION_ID").ok().filter(|s| !s.is_empty());
        let stepper_density = match env::var("STEPPER_DENSITY") {
            Ok(raw) => raw.parse::<Density>()?,
            Err(_) => Density::Full,
        };
        Ok(Self {
            api_base_url,
            poll_interval,
            request_timeout,
            admin_token,
            session_id,
            stepper_density,
        })
    }
}
