//! Doctor command - verify configuration and environment.

use crate::cli::Output;
use crate::config::{Settings, VectorStoreProvider};
use crate::openai::API_BASE_ENV;
use crate::recommend::PipelineConfig;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("eateum-rag Doctor");
    println!();
    println!("Checking configuration and environment...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let api_checks = vec![check_openai_api_key(), check_api_base(settings)];
    for check in &api_checks {
        check.print();
    }
    checks.extend(api_checks);

    println!();

    println!("{}", style("Directories").bold());
    let dir_checks = check_directories(settings);
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![check_config_file(), check_recommend_settings(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before serving recommendations.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! eateum-rag is ready to use.");
    }

    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key() -> CheckResult {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if key.trim().is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Ok(key) => CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask_key(&key))),
        Err(_) => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Report which embedding endpoint will be used.
fn check_api_base(settings: &Settings) -> CheckResult {
    let configured = settings
        .embedding
        .api_base
        .clone()
        .filter(|b| !b.trim().is_empty())
        .or_else(|| std::env::var(API_BASE_ENV).ok().filter(|b| !b.trim().is_empty()));

    match configured {
        Some(base) if base.starts_with("http://") || base.starts_with("https://") => {
            CheckResult::ok("API base", &base)
        }
        Some(base) => CheckResult::error(
            "API base",
            &format!("'{}' is not an http(s) URL", base),
            "Set embedding.api_base or OPENAI_API_BASE to e.g. https://api.openai.com/v1",
        ),
        None => CheckResult::ok("API base", "https://api.openai.com/v1 (default)"),
    }
}

/// Check data directory and recipe index.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok("Data directory", &format!("{}", data_dir.display())));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    if settings.vector_store.provider == VectorStoreProvider::Memory {
        results.push(CheckResult::warning(
            "Recipe index",
            "memory provider (index is lost on exit)",
            "Set vector_store.provider = \"sqlite\" to persist the index",
        ));
        return results;
    }

    let db_path = settings.sqlite_path();
    if db_path.exists() {
        let size = std::fs::metadata(&db_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        results.push(CheckResult::ok("Recipe index", &format!("{} ({})", db_path.display(), size)));
    } else {
        results.push(CheckResult::warning(
            "Recipe index",
            &format!("{} (not created yet)", db_path.display()),
            "Build it with: eateum-rag ingest <recipes.csv>",
        ));
    }

    results
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning("Config file", "using defaults", "Create with: eateum-rag config edit")
    }
}

/// Check that the recommendation sizes are consistent.
fn check_recommend_settings(settings: &Settings) -> CheckResult {
    let config = PipelineConfig::from_settings(&settings.recommend);
    match config.validate() {
        Ok(()) => CheckResult::ok(
            "Recommend",
            &format!(
                "top_n={}, overfetch_size={}, timeout={}s, duplicates={}",
                config.top_n,
                config.overfetch_size,
                settings.recommend.retrieval_timeout_seconds,
                config.duplicate_policy
            ),
        ),
        Err(e) => CheckResult::error(
            "Recommend",
            &e.to_string(),
            "Fix the [recommend] section of the config file",
        ),
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-abcdefghijklmnop1234"), "sk-abcd...1234");
        assert_eq!(mask_key("short"), "*****");
    }

    #[test]
    fn test_recommend_settings_check() {
        let mut settings = Settings::default();
        assert_eq!(check_recommend_settings(&settings).status, CheckStatus::Ok);

        settings.recommend.top_n = 50;
        settings.recommend.overfetch_size = 10;
        assert_eq!(check_recommend_settings(&settings).status, CheckStatus::Error);
    }

    #[test]
    fn test_api_base_must_be_url() {
        let mut settings = Settings::default();
        settings.embedding.api_base = Some("localhost:8080".to_string());
        assert_eq!(check_api_base(&settings).status, CheckStatus::Error);

        settings.embedding.api_base = Some("http://localhost:8080/v1".to_string());
        assert_eq!(check_api_base(&settings).status, CheckStatus::Ok);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
    }
}
