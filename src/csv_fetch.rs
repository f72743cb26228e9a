use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;

use crate::config::EngineConfig;
use crate::csv_goals::{CsvGoalData, parse_goal_csv};
use crate::http_client::http_client;

/// Download a goal CSV and parse it. Every failure is logged and yields
/// `None`; callers treat that as "no upload for this player".
pub fn fetch_goal_csv(url: &str, config: &EngineConfig) -> Option<CsvGoalData> {
    let body = match http_client(config).and_then(|client| fetch_csv_text_with(client, url, config)) {
        Ok(body) => body,
        Err(err) => {
            log::warn!("goal csv fetch from {url} failed: {err:#}");
            return None;
        }
    };
    parse_goal_csv(&body)
}

/// Raw CSV text from a URL, bounded by the configured timeout and size.
pub fn fetch_csv_text(url: &str, config: &EngineConfig) -> Result<String> {
    fetch_csv_text_with(http_client(config)?, url, config)
}

pub fn fetch_csv_text_with(client: &Client, url: &str, config: &EngineConfig) -> Result<String> {
    download_csv(client, url, config.csv_fetch_timeout, config.csv_max_bytes)
}

/// Read a CSV from an `http(s)://` URL or a local path.
pub fn read_csv_source(source: &str, config: &EngineConfig) -> Result<String> {
    let trimmed = source.trim();
    if is_remote(trimmed) {
        return fetch_csv_text(trimmed, config);
    }
    let path = Path::new(trimmed);
    let len = fs::metadata(path)
        .with_context(|| format!("cannot stat {}", path.display()))?
        .len();
    if len > config.csv_max_bytes as u64 {
        anyhow::bail!(
            "{} is {len} bytes, limit is {}",
            path.display(),
            config.csv_max_bytes
        );
    }
    fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))
}

pub fn is_remote(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn download_csv(client: &Client, url: &str, timeout: Duration, max_bytes: usize) -> Result<String> {
    let resp = client
        .get(url)
        .header(ACCEPT, "text/csv, text/plain;q=0.9, */*;q=0.1")
        .timeout(timeout)
        .send()
        .context("request failed")?;

    let status = resp.status();
    if status == StatusCode::FORBIDDEN || status == StatusCode::NOT_FOUND {
        anyhow::bail!("csv not accessible (http {status})");
    }
    if !status.is_success() {
        anyhow::bail!("http {status}");
    }
    if let Some(len) = resp.content_length()
        && len > max_bytes as u64
    {
        anyhow::bail!("csv is {len} bytes, limit is {max_bytes}");
    }

    let mut body = Vec::new();
    resp.take(max_bytes as u64 + 1)
        .read_to_end(&mut body)
        .context("failed reading body")?;
    if body.len() > max_bytes {
        anyhow::bail!("csv exceeds {max_bytes} bytes");
    }
    String::from_utf8(body).context("csv body is not valid utf-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    const CSV: &str = "Player ID,Dia do Ciclo,Total Dias Ciclo,Faturamento Meta,Faturamento Atual,Faturamento %,Reais por Ativo Meta,Reais por Ativo Atual,Reais por Ativo %,Atividade Meta,Atividade Atual,Atividade %,Multimarcas por Ativo Meta,Multimarcas por Ativo Atual,Multimarcas por Ativo %\n123456,12,21,400000,200000,50,1300,325,25,41,36,88,2,1.3,65\n";

    /// Serve a single canned response on a loopback port.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let mut seen = Vec::new();
                while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => seen.extend_from_slice(&buf[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/goals.csv")
    }

    fn loopback_client() -> Client {
        Client::builder().no_proxy().build().expect("client")
    }

    fn fetch(url: &str, config: &EngineConfig) -> Result<String> {
        fetch_csv_text_with(&loopback_client(), url, config)
    }

    #[test]
    fn fetches_and_parses() {
        let url = serve_once("200 OK", CSV);
        let body = fetch(&url, &EngineConfig::default()).expect("csv served");
        let data = parse_goal_csv(&body).expect("valid csv");
        assert_eq!(data.player_id, "123456");
        assert_eq!(data.atividade.percentage, 88.0);
    }

    #[test]
    fn missing_file_is_rejected() {
        let url = serve_once("404 Not Found", "");
        let err = fetch(&url, &EngineConfig::default()).expect_err("404");
        assert!(err.to_string().contains("not accessible"), "{err}");
    }

    #[test]
    fn oversized_body_is_rejected() {
        let url = serve_once("200 OK", CSV);
        let config = EngineConfig {
            csv_max_bytes: 64,
            ..EngineConfig::default()
        };
        let err = fetch(&url, &config).expect_err("too large");
        assert!(err.to_string().contains("limit"), "{err}");
    }

    #[test]
    fn unreachable_host_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        let config = EngineConfig {
            csv_fetch_timeout: Duration::from_secs(1),
            ..EngineConfig::default()
        };
        assert!(fetch(&format!("http://{addr}/x.csv"), &config).is_err());
    }

    #[test]
    fn malformed_url_yields_none() {
        assert!(fetch_goal_csv("http://", &EngineConfig::default()).is_none());
    }

    #[test]
    fn local_files_are_size_checked() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/goals_core.csv");
        let text = read_csv_source(path, &EngineConfig::default()).expect("fixture readable");
        assert!(parse_goal_csv(&text).is_some());
        let tiny = EngineConfig {
            csv_max_bytes: 16,
            ..EngineConfig::default()
        };
        assert!(read_csv_source(path, &tiny).is_err());
    }

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://example.org/a.csv"));
        assert!(is_remote("  HTTP://example.org/a.csv"));
        assert!(!is_remote("tests/fixtures/goals.csv"));
    }
}
