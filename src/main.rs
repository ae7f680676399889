use clap::Parser;
use kinolist::adapters::{tags, template};
use kinolist::config::CliConfig;
use kinolist::core::fetcher::MetadataFetcher;
use kinolist::core::resolver::TitleResolver;
use kinolist::utils::error::ErrorSeverity;
use kinolist::utils::{logger, validation::Validate};
use kinolist::{
    KinolistError, KinopoiskClient, ListOptions, ListPipeline, MetadataProvider, Result,
};
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting kinolist CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let api_key = match config.resolved_api_key() {
        Ok(key) => key,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    let provider = KinopoiskClient::with_base_url(api_key, config.api_endpoint.clone());

    match run(&config, &provider).await {
        Ok(summary) => {
            tracing::info!("Request completed");
            println!("✅ {}", summary);
        }
        Err(e) => {
            tracing::error!(
                "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run(config: &CliConfig, provider: &KinopoiskClient) -> Result<String> {
    if let Some(target) = &config.tag {
        return run_tag_mode(provider, Path::new(target), config.shorten).await;
    }

    let lines = input_lines(config)?;
    println!("Looking up {} title(s): {}", lines.len(), lines.join(", "));

    let mut opts = ListOptions::from_config(config);
    opts.template = config
        .template
        .as_ref()
        .map(|path| template::load_template(Path::new(path)))
        .transpose()?;

    let out_path = Path::new(&config.output);
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let outcome = ListPipeline::new(provider)
        .generate(&lines, &opts, out_path)
        .await?;

    if !outcome.unresolved.is_empty() {
        println!("Not found: {}", outcome.unresolved.join(", "));
    }

    Ok(match &outcome.pdf_path {
        Some(pdf) => format!(
            "{} film(s) written to {} and {}",
            outcome.record_count,
            outcome.docx_path.display(),
            pdf.display()
        ),
        None => format!(
            "{} film(s) written to {}",
            outcome.record_count,
            outcome.docx_path.display()
        ),
    })
}

fn input_lines(config: &CliConfig) -> Result<Vec<String>> {
    if let Some(file) = &config.file {
        let content = std::fs::read_to_string(file)?;
        let lines: Vec<String> = content
            .lines()
            .map(|line| line.trim_end().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        if lines.is_empty() {
            return Err(KinolistError::ConfigError {
                message: format!("{file} contains no titles"),
            });
        }
        Ok(lines)
    } else {
        Ok(config.movie.clone())
    }
}

async fn run_tag_mode(provider: &KinopoiskClient, target: &Path, shorten: bool) -> Result<String> {
    provider.probe().await?;

    let files = mp4_targets(target)?;
    let resolver = TitleResolver::new(provider);
    let fetcher = MetadataFetcher::new(provider);

    let mut written = 0usize;
    let mut skipped = Vec::new();
    for file in &files {
        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let resolution = resolver.resolve(std::slice::from_ref(&stem)).await?;
        let Some(id) = resolution.resolved.first().copied() else {
            tracing::warn!("Film not found for {}", file.display());
            skipped.push(stem);
            continue;
        };
        match fetcher.fetch(id, shorten).await {
            Ok(record) => {
                tags::write_tags(&record, file)?;
                written += 1;
            }
            Err(err) => {
                tracing::warn!("Skipping {}: {}", file.display(), err);
                skipped.push(stem);
            }
        }
    }

    if written == 0 {
        return Err(KinolistError::NothingEnriched);
    }
    Ok(if skipped.is_empty() {
        format!("Tags written to {written} file(s)")
    } else {
        format!(
            "Tags written to {written} file(s); not found: {}",
            skipped.join(", ")
        )
    })
}

fn mp4_targets(target: &Path) -> Result<Vec<PathBuf>> {
    if target.is_file() {
        if target.extension().and_then(|e| e.to_str()) != Some("mp4") {
            return Err(KinolistError::ConfigError {
                message: "can write tags only to mp4 files".to_string(),
            });
        }
        return Ok(vec![target.to_path_buf()]);
    }
    if target.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(target)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("mp4"))
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(KinolistError::ConfigError {
                message: format!("no mp4 files in {}", target.display()),
            });
        }
        tracing::info!("Found {} mp4 file(s) in {}", files.len(), target.display());
        return Ok(files);
    }
    Err(KinolistError::ConfigError {
        message: format!("invalid path: {}", target.display()),
    })
}
