//! Mission Judge CLI
//!
//! Asks for a mission and the photo evidence, then prints the checklist,
//! the photo analysis and the final grade as JSON.

use anyhow::{bail, Context, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mission_judge::config::DEFAULT_CONFIG_FILE;
use mission_judge::mission::{MissionCategory, StageOutput, Verdict};
use mission_judge::orchestrator::{MissionJudge, Session, SessionEvent, Step};
use mission_judge::ConfigManager;

/// Read one trimmed line; `None` on end of input.
fn read_line(label: &str) -> Result<Option<String>> {
    if !label.is_empty() {
        print!("{}", label);
        io::stdout().flush()?;
    }
    let mut input = String::new();
    let read = io::stdin().lock().read_line(&mut input)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

fn read_category() -> Result<Option<MissionCategory>> {
    let names: Vec<&str> = MissionCategory::ALL.iter().map(|c| c.as_str()).collect();
    loop {
        let Some(line) = read_line(&format!("🗂️  Category ({}): ", names.join(" | ")))? else {
            return Ok(None);
        };
        match line.to_lowercase().as_str() {
            "quit" | "exit" | "q" => return Ok(None),
            _ => {}
        }
        match line.parse() {
            Ok(category) => return Ok(Some(category)),
            Err(e) => println!("⚠️  {}", e),
        }
    }
}

fn read_photo_paths() -> Result<Vec<PathBuf>> {
    println!("📷 Photo paths, one per line (empty line to finish):");
    let mut paths = Vec::new();
    while let Some(line) = read_line("   > ")? {
        if line.is_empty() {
            break;
        }
        paths.push(PathBuf::from(line));
    }
    Ok(paths)
}

fn print_stage<T: serde::Serialize>(title: &str, output: Option<&StageOutput<T>>) {
    let Some(output) = output else {
        return;
    };
    println!("\n{}", title);
    println!("{}", "─".repeat(50));
    println!("{}", output.to_pretty_json());
}

fn summary(verdict: &Verdict) -> String {
    let status = if verdict.pass { "✅ PASS" } else { "❌ NOT YET" };
    let mut line = format!("{} ({:.1}% complete)", status, verdict.completion_percent);
    if let Some(next) = verdict.next_request_to_child.first() {
        line.push_str(&format!(" - next: {}", next));
    }
    for reason in verdict.shown_reasons() {
        line.push_str(&format!("\n   • {}", reason));
    }
    line
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();
    dotenv::from_filename("gemini_api.env").ok();

    // Logs go to stderr so stdout only carries results
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mission_judge=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    println!("\n{}", "═".repeat(60));
    println!("🧹 Mission Judge v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", "═".repeat(60));

    let config_path = std::env::var("MISSION_JUDGE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    let mut config = ConfigManager::new(&config_path)
        .load()
        .await
        .with_context(|| format!("Failed to load config from '{}'", config_path))?;
    config
        .apply_env_overrides()
        .context("Invalid MISSION_JUDGE_* environment override")?;

    let api_key = config.api_key(|name| std::env::var(name).ok());
    let provider = config
        .build_provider(api_key)
        .context("Failed to initialize model backend")?;
    let judge = MissionJudge::from_config(&config, provider);

    println!("🤖 Backend: {:?} | Model: {}", config.provider, judge.model());
    if let Some(dir) = &config.output_dir {
        println!("💾 Audit files: {}", dir.display());
    }

    println!("\n🔑 Verifying API credential...");
    let mut session = judge.verify_credential(Session::new()).await;
    if session.step == Step::Credential {
        let reason = session.notice.unwrap_or_default();
        println!("❌ Cannot start judging: {}", reason);
        bail!("API credential check failed");
    }
    println!("✅ Credential OK\n");
    println!("💡 Type 'quit' at the category prompt to exit.\n");

    loop {
        let Some(category) = read_category()? else {
            break;
        };
        let Some(details) = read_line("📝 Mission details: ")? else {
            break;
        };
        if details.is_empty() {
            println!("⚠️  Mission details are empty.\n");
            continue;
        }
        let photos = read_photo_paths()?;
        info!(%category, photos = photos.len(), "Judging mission");

        println!("\n⚙️  Judging...");
        session = judge.judge(session, category, &details, photos).await;

        print_stage("📋 Mission checklist", session.mission.as_ref());
        print_stage("🔍 Photo analysis", session.report.as_ref());
        print_stage("🏁 Final grade", session.verdict.as_ref());
        println!("{}", "─".repeat(50));

        match session.verdict.as_ref() {
            Some(StageOutput::Parsed(verdict)) => println!("{}\n", summary(verdict)),
            Some(_) => println!("⚠️  The grade could not be read; see the JSON above.\n"),
            None => println!(
                "❌ Stopped at the {} step: {}\n",
                session.step,
                session.notice.as_deref().unwrap_or("unknown error")
            ),
        }

        session = session.apply(SessionEvent::Reset);
    }

    println!("\n👋 Goodbye!\n");
    Ok(())
}
