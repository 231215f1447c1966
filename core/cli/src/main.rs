//! Reference CLI front-end (SPEC_FULL.md §6): reads a line from stdin,
//! hands it to `Orchestrator::handle_user_message`, prints the reply.
//! Grounded on `original_source/main.py::run_cli` and the teacher's
//! `master_orchestrator::main` startup sequence (tracing/metrics init,
//! config load, env file).

use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use mnemos_engine::{
    AgentRegistry, ConversationContext, EchoProvider, MemoryEngine, Orchestrator,
    OrchestratorDeps,
};
use mnemos_types::AppConfig;

const EXIT_TOKENS: &[&str] = &["exit", "quit", "esci", "fine", "stop", "q", "x", "end", "terminate"];

fn load_config() -> AppConfig {
    let path = env::var("MNEMOS_CONFIG").unwrap_or_else(|_| "config/config.toml".to_string());
    let path = Path::new(&path);
    if !path.exists() {
        tracing::info!(path = %path.display(), "no config file found, using defaults");
        return AppConfig::default();
    }
    match mnemos_engine::load_app_config_with_env(path) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!(error = %err, "failed to load config, falling back to defaults");
            AppConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(err) = mnemos_platform::init_tracing("mnemosd") {
        eprintln!("[WARN] failed to init tracing: {err}");
    }

    let metrics_addr = env::var("METRICS_ADDR").unwrap_or_else(|_| "127.0.0.1:9100".to_string());
    match metrics_addr.parse() {
        Ok(addr) => {
            if let Err(err) = mnemos_platform::init_metrics(addr) {
                tracing::warn!(%metrics_addr, error = %err, "failed to start metrics exporter");
            } else {
                tracing::info!(%metrics_addr, "metrics exporter listening");
            }
        }
        Err(err) => tracing::warn!(%metrics_addr, error = %err, "invalid METRICS_ADDR, metrics disabled"),
    }

    let config = load_config();
    if config.llm.default_provider != "echo" {
        tracing::warn!(
            provider = %config.llm.default_provider,
            "only the offline echo provider is implemented in this build; ignoring configured provider"
        );
    }

    let db_path = env::var("MNEMOS_DB_PATH").unwrap_or_else(|_| "mnemos.sqlite3".to_string());
    let memory = match MemoryEngine::open(&db_path) {
        Ok(memory) => memory,
        Err(err) => {
            eprintln!("[FATAL] failed to open memory store at '{db_path}': {err}");
            return;
        }
    };

    let mut registry = AgentRegistry::new();
    if let Err(err) = mnemos_agents::register_all(&mut registry) {
        eprintln!("[FATAL] failed to register agents: {err}");
        return;
    }

    let llm = EchoProvider;
    let deps = OrchestratorDeps {
        memory: &memory,
        llm: &llm,
        registry: &registry,
        orchestrator_config: &config.orchestrator,
        governance_config: &config.governance,
    };

    let user_id = env::var("MNEMOS_USER_ID").ok().or_else(|| Some("user-1".to_string()));
    let mut context = ConversationContext::new(user_id);

    println!("System ready.");
    println!("Type what you want. Type 'exit' or 'quit' to leave.\n");

    let stdin = io::stdin();
    let mut out = io::stdout();
    loop {
        print!("YOU> ");
        out.flush().ok();

        let mut line = String::new();
        let bytes_read = match stdin.lock().read_line(&mut line) {
            Ok(n) => n,
            Err(err) => {
                eprintln!("[ERROR] failed to read from stdin: {err}");
                break;
            }
        };
        if bytes_read == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if EXIT_TOKENS.contains(&trimmed.to_lowercase().as_str()) {
            println!("Taking a nap...");
            break;
        }

        let reply = Orchestrator::handle_user_message(&mut context, &deps, trimmed).await;
        println!("\nAI>");
        println!("{reply}");
        println!("\n---\n");
    }
}
