//! Shared fixtures for nasol-ingest integration tests.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use nasol_core::{AppConfig, CastTables, DedupConfig, Environment, ProgramProfile, RelevanceRules};

/// Config pointing every external API at `mock_uri`.
pub fn app_config(mock_uri: &str) -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "debug".to_string(),
        program_path: PathBuf::from("./config/program.yaml"),
        db_max_connections: 1,
        db_min_connections: 1,
        db_acquire_timeout_secs: 1,
        naver_client_id: Some("client-id".to_string()),
        naver_client_secret: Some("client-secret".to_string()),
        search_base_url: mock_uri.to_string(),
        service_key: Some("service-key".to_string()),
        enrich_endpoint: format!("{mock_uri}/functions/v1/enrich-thumbnails"),
        hf_api_token: Some("hf-token".to_string()),
        embedding_base_url: mock_uri.to_string(),
        embedding_timeout_secs: 5,
        thumbnail_timeout_secs: 5,
        dedup: DedupConfig::default(),
        collect_cron: "0 0 * * * *".to_string(),
        require_function_auth: false,
    }
}

pub fn program(keywords: &[&str]) -> ProgramProfile {
    ProgramProfile {
        name: "나는솔로".to_string(),
        keywords: keywords.iter().map(ToString::to_string).collect(),
        relevance: RelevanceRules {
            phrases: vec!["나는솔로".to_string()],
            tokens: vec!["나솔".to_string()],
        },
        cast: CastTables {
            roster: vec!["영수".to_string(), "옥순".to_string()],
            honorifics: vec!["씨".to_string(), "님".to_string()],
        },
    }
}

/// A search API response body holding `items`.
pub fn search_body(items: &[serde_json::Value]) -> serde_json::Value {
    serde_json::json!({
        "lastBuildDate": "Mon, 19 Oct 2026 12:00:00 +0900",
        "total": items.len(),
        "start": 1,
        "display": items.len(),
        "items": items,
    })
}

/// One search result published an hour ago.
pub fn search_item(title: &str, description: &str, url: &str) -> serde_json::Value {
    let published = (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc2822();
    serde_json::json!({
        "title": title,
        "originallink": url,
        "link": format!("https://n.news.naver.com/mnews/{}", url.len()),
        "description": description,
        "pubDate": published,
    })
}

/// A 384-wide vector whose first two components are `x` and `y`.
pub fn vector(x: f32, y: f32) -> Vec<f32> {
    let mut v = vec![0.0_f32; 384];
    v[0] = x;
    v[1] = y;
    v
}
