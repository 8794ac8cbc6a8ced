//! Shared, connection-pooled HTTP client (§4.8). One instance per process;
//! all upstream traffic multiplexes through it.

use std::time::Duration;

use crate::config::TransportConfig;

/// Version string embedded in the `User-Agent`, matching what the official
/// CLI currently identifies as.
const CLI_VERSION: &str = "0.26.0";

fn os_token() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "windows",
        _ => "linux",
    }
}

fn arch_token() -> &'static str {
    match std::env::consts::ARCH {
        "aarch64" => "arm64",
        _ => "amd64",
    }
}

pub fn user_agent() -> String {
    format!("GeminiCLI/{CLI_VERSION} ({}; {})", os_token(), arch_token())
}

/// Builds the shared upstream client per §4.8's pool/timeout caps. Read
/// timeouts are intentionally left unbounded — upstream streams may run
/// long, and a finite read timeout would kill them mid-flight.
pub fn build_client(config: &TransportConfig, proxy: Option<&url::Url>) -> reqwest::Client {
    // reqwest pools per-host; `max_connections` bounds the pool's idle cap
    // below its active-connection headroom rather than a hard total, since
    // reqwest has no separate "max in-flight" knob.
    let mut builder = reqwest::Client::builder()
        .user_agent(user_agent())
        .pool_max_idle_per_host(config.max_connections.min(config.max_keepalive_connections))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs));

    if let Some(proxy_url) = proxy {
        builder = builder
            .proxy(reqwest::Proxy::all(proxy_url.clone()).expect("valid proxy URL"));
    }

    builder.build().expect("valid upstream HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_follows_gemini_cli_shape() {
        let ua = user_agent();
        assert!(ua.starts_with("GeminiCLI/0.26.0 ("));
        assert!(ua.contains(os_token()));
        assert!(ua.contains(arch_token()));
    }

    #[test]
    fn os_and_arch_tokens_are_in_closed_map() {
        assert!(["darwin", "linux", "windows"].contains(&os_token()));
        assert!(["arm64", "amd64"].contains(&arch_token()));
    }
}
