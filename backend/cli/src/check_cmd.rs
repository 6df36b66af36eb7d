//! CLI Check Command
//!
//! Verifies credentials, the dialog database, and both remote services.

use anyhow::Result;

use reframe_config::env::{OPENAI_API_KEY, TAVILY_API_KEY, TELEGRAM_TOKEN};
use reframe_config::{missing_credentials, require_credentials, ReframeConfig};
use reframe_core::LlmRequest;

use crate::app;

/// Runs every check and returns whether all of them passed.
pub async fn run(config: &ReframeConfig) -> Result<bool> {
    println!("\n🔍 Running Reframe checks...\n");

    let credentials_ok = check_credentials(config);
    let storage_ok = check_storage(config).await;

    let services_ok = match require_credentials(config) {
        Ok(credentials) => {
            let model_ok = check_model(config, &credentials.openai_api_key).await;
            let search_ok = check_search(config, &credentials.tavily_api_key).await;
            model_ok && search_ok
        }
        Err(_) => {
            println!("Checking Remote Services:");
            println!("  🟡 Skipped until credentials are set");
            false
        }
    };

    let all_ok = credentials_ok && storage_ok && services_ok;
    println!();
    if all_ok {
        println!("✅ All checks passed! Reframe is ready to run.");
    } else {
        println!("❌ Some checks failed! Please fix the errors above.");
    }
    Ok(all_ok)
}

fn check_credentials(config: &ReframeConfig) -> bool {
    println!("Checking Credentials:");
    let missing = missing_credentials(config);
    for name in [TELEGRAM_TOKEN, OPENAI_API_KEY, TAVILY_API_KEY] {
        if missing.iter().any(|m| m == name) {
            println!("  🔴 {name} is missing (REQUIRED)");
        } else {
            println!("  🟢 {name} is set");
        }
    }
    missing.is_empty()
}

async fn check_storage(config: &ReframeConfig) -> bool {
    println!("Checking Dialog Database:");
    let log = match app::dialog_log(config) {
        Ok(log) => log,
        Err(e) => {
            println!("  🔴 {e:#}");
            return false;
        }
    };
    match log.count().await {
        Ok(count) => {
            println!("  🟢 {} ({count} records)", config.storage.db_path);
            true
        }
        Err(e) => {
            println!("  🔴 {e}");
            false
        }
    }
}

async fn check_model(config: &ReframeConfig, api_key: &str) -> bool {
    println!("Checking Language Model:");
    let provider = app::llm_provider(config, api_key);
    let request = LlmRequest {
        model: config.model.name.clone(),
        system_prompt: String::new(),
        user_prompt: "ping".to_string(),
        max_tokens: 5,
        temperature: 0.0,
    };
    match provider.complete(&request).await {
        Ok(response) => {
            println!(
                "  🟢 {} responded in {} ms",
                response.model, response.latency_ms
            );
            true
        }
        Err(e) => {
            println!("  🔴 {} ({})", e, e.kind());
            false
        }
    }
}

async fn check_search(config: &ReframeConfig, api_key: &str) -> bool {
    println!("Checking Web Search:");
    let provider = app::search_provider(config, api_key);
    match provider.search("когнитивно-поведенческая терапия").await {
        Ok(hits) => {
            println!("  🟢 {} returned {} results", provider.name(), hits.len());
            true
        }
        Err(e) => {
            println!("  🔴 {} ({})", e, e.kind());
            false
        }
    }
}
