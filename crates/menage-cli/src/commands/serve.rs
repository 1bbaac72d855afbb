//! Server command implementation

use std::path::Path;

use anyhow::Result;
use menage_core::BudgetEngine;
use menage_server::ServerConfig;

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    engine: BudgetEngine,
    host: &str,
    port: u16,
    no_auth: bool,
) -> Result<()> {
    let db = open_db(db_path)?;

    println!("🚀 Starting Ménage web server...");
    println!("   Database: {}", db.path());
    println!("   Listening: http://{}:{}", host, port);

    // Comma-separated API keys
    let api_keys =
        menage_server::parse_api_keys(&std::env::var("MENAGE_API_KEYS").unwrap_or_default());

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else {
        println!("   🔒 Authentication: Cloudflare Access (header only)");
        if !api_keys.is_empty() {
            println!(
                "   🔑 API keys: {} configured (MENAGE_API_KEYS)",
                api_keys.len()
            );
        }
    }
    println!();

    let config = ServerConfig {
        require_auth: !no_auth,
        api_keys,
        ..Default::default()
    };

    menage_server::serve(db, engine, host, port, config).await
}
