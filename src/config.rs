use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    /// Keys visited per expiry-sweep tick; bounds sweep latency.
    pub expire_sample_size: usize,
    pub active_expire_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1".to_string(),
            port: 6379,
            expire_sample_size: 10,
            active_expire_enabled: true,
        }
    }
}

impl Config {
    pub fn from_args(args: &[String]) -> Self {
        let mut config = Config::default();
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--bind" => {
                    if i + 1 < args.len() {
                        config.bind = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--port" => {
                    if i + 1 < args.len() {
                        if let Ok(p) = args[i + 1].parse() {
                            config.port = p;
                        }
                        i += 1;
                    }
                }
                "--expire-sample-size" => {
                    if i + 1 < args.len() {
                        if let Ok(n) = args[i + 1].parse() {
                            config.expire_sample_size = n;
                        }
                        i += 1;
                    }
                }
                "--active-expire" => {
                    if i + 1 < args.len() {
                        config.active_expire_enabled = args[i + 1] == "yes";
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        config
    }
}

pub type SharedConfig = Arc<Config>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind, "127.0.0.1");
        assert_eq!(config.port, 6379);
        assert_eq!(config.expire_sample_size, 10);
        assert!(config.active_expire_enabled);
    }

    #[test]
    fn test_from_args_overrides() {
        let args: Vec<String> = ["--port", "7000", "--bind", "0.0.0.0", "--active-expire", "no"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let config = Config::from_args(&args);
        assert_eq!(config.port, 7000);
        assert_eq!(config.bind, "0.0.0.0");
        assert!(!config.active_expire_enabled);
    }

    #[test]
    fn test_from_args_ignores_unknown_flags() {
        let args: Vec<String> = ["--wat", "--port", "7001"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let config = Config::from_args(&args);
        assert_eq!(config.port, 7001);
    }
}
