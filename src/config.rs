use clap::Parser;
use std::time::Duration;

/// Browser front end for the chess analysis service
#[derive(Parser, Debug, Clone)]
#[command(name = "chaturanga", version, about)]
pub struct Config {
    /// Address the web server listens on
    #[arg(long, env = "CHATURANGA_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Base URL of the analysis API
    #[arg(long, env = "CHATURANGA_API_URL", default_value = "http://localhost:5000/api")]
    pub api_url: String,

    /// Directory holding index.html and other assets
    #[arg(long, env = "CHATURANGA_STATIC_DIR", default_value = "./static")]
    pub static_dir: String,

    /// Timeout for a single backend request, in seconds
    #[arg(long, env = "CHATURANGA_REQUEST_TIMEOUT_SECS", default_value_t = 120)]
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "chaturanga",
            "--bind",
            "0.0.0.0:9000",
            "--request-timeout-secs",
            "30",
        ])
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_a_non_numeric_timeout() {
        assert!(Config::try_parse_from(["chaturanga", "--request-timeout-secs", "soon"]).is_err());
    }
}
