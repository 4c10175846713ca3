//! bootpack: firmware container tool for the bootloader
//!
//! Commands:
//!   keygen <key-file>            - generate a random 16-byte key file
//!   create -i <image> -o <fw>    - pad, encrypt and wrap an image into a container
//!   recover -i <fw> -o <image>   - decrypt a container and verify its CRC
//!   inspect <fw>                 - show a container header without a key
//!   history                      - list recently used files
//!   config show                  - display current configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use bootpack_core::config::{expand_tilde, BootpackConfig};
use bootpack_core::encoding::{format_hex_u32, parse_hex_u32_or_default};
use bootpack_core::history::{History, HistorySlot};
use bootpack_core::{ImageParams, KeySource};
use bootpack_crypto::{generate_key, read_key_file, write_key_file, ImageKey, ResolvedKey};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "bootpack",
    version,
    about = "Firmware container builder",
    long_about = "bootpack: encrypt firmware images into bootloader containers and recover them"
)]
struct Cli {
    /// Path to bootpack configuration file
    #[arg(
        long,
        short = 'c',
        env = "BOOTPACK_CONFIG",
        default_value = "~/.config/bootpack/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "BOOTPACK_LOG")]
    log: Option<String>,

    /// Log format; overrides the config file
    #[arg(long)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(clap::Args, Debug)]
struct KeyArgs {
    /// Key as 32 hex digits
    #[arg(long, conflicts_with = "key_file", value_parser = parse_secret)]
    key: Option<SecretString>,

    /// Raw 16-byte key file (overrides keys.key_file)
    #[arg(long, short = 'k')]
    key_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new random key and write it as a raw key file
    Keygen {
        /// Destination key file
        key_file: PathBuf,
        /// Overwrite an existing key file
        #[arg(long)]
        force: bool,
    },

    /// Build an encrypted container from a firmware image
    Create {
        /// Plaintext firmware image
        #[arg(long, short = 'i')]
        input: PathBuf,
        /// Container to write
        #[arg(long, short = 'o')]
        output: PathBuf,
        #[command(flatten)]
        key: KeyArgs,
        /// Product ID in hex (default: image.product_id or 0)
        #[arg(long)]
        product_id: Option<String>,
        /// Application version in hex (default: image.app_version or 0)
        #[arg(long)]
        app_version: Option<String>,
        /// Protocol version tag (default: image.protocol_version)
        #[arg(long)]
        protocol_version: Option<u32>,
    },

    /// Decrypt a container and verify the plaintext CRC
    ///
    /// The decrypted image is written even when the CRC does not match.
    Recover {
        /// Container to read
        #[arg(long, short = 'i')]
        input: PathBuf,
        /// Plaintext image to write
        #[arg(long, short = 'o')]
        output: PathBuf,
        #[command(flatten)]
        key: KeyArgs,
        /// Exit with an error on CRC mismatch
        #[arg(long)]
        strict: bool,
    },

    /// Show the header of a container
    Inspect {
        /// Container to read
        container: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recently used files
    History {
        /// Forget all remembered paths
        #[arg(long)]
        clear: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let config = BootpackConfig::load(&config_path)?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli.log_format.unwrap_or(match config.log.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(&level, format);

    match cli.command {
        Commands::Keygen { key_file, force } => cmd_keygen(&config, &key_file, force),
        Commands::Create {
            input,
            output,
            key,
            product_id,
            app_version,
            protocol_version,
        } => {
            let params = resolve_params(
                &config,
                product_id.as_deref(),
                app_version.as_deref(),
                protocol_version,
            )?;
            cmd_create(&config, &params, &key, &input, &output)
        }
        Commands::Recover {
            input,
            output,
            key,
            strict,
        } => cmd_recover(&config, &key, &input, &output, strict),
        Commands::Inspect { container, json } => cmd_inspect(&container, json),
        Commands::History { clear } => cmd_history(&config, clear),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &config_path),
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Key and parameter resolution ──────────────────────────────────────────────

fn parse_secret(text: &str) -> Result<SecretString, String> {
    Ok(SecretString::from(text))
}

/// Resolve the key: --key, then --key-file, then keys.key_file from config.
///
/// Returns the key file path when the key came from one, for the history.
fn resolve_key(
    config: &BootpackConfig,
    args: &KeyArgs,
) -> Result<(ResolvedKey, Option<PathBuf>)> {
    if let Some(text) = &args.key {
        let key = ImageKey::from_hex(text.expose_secret().trim())
            .context("the key must be 16 bytes in hex format")?;
        let resolved = ResolvedKey {
            key,
            source: KeySource::Entered,
        };
        return Ok((resolved, None));
    }

    let path = args
        .key_file
        .clone()
        .or_else(|| config.keys.key_file.as_deref().map(expand_tilde))
        .context("no key given; use --key, --key-file or set keys.key_file in config")?;

    let key = read_key_file(&path)
        .with_context(|| format!("loading key file {}", path.display()))?;
    let resolved = ResolvedKey {
        key,
        source: KeySource::LoadedFromFile,
    };
    Ok((resolved, Some(path)))
}

/// Header values: command-line flags override the config file.
fn resolve_params(
    config: &BootpackConfig,
    product_id: Option<&str>,
    app_version: Option<&str>,
    protocol_version: Option<u32>,
) -> Result<ImageParams> {
    let product_id = product_id.or(config.image.product_id.as_deref());
    let app_version = app_version.or(config.image.app_version.as_deref());

    Ok(ImageParams {
        protocol_version: protocol_version.unwrap_or(config.image.protocol_version),
        product_id: parse_hex_u32_or_default(product_id)
            .context("product ID must be a uint32 in hex format")?,
        app_version: parse_hex_u32_or_default(app_version)
            .context("app version must be a uint32 in hex format")?,
    })
}

// ── History ───────────────────────────────────────────────────────────────────

/// Record used paths. History is a convenience, so failures only warn.
fn remember(config: &BootpackConfig, used: &[(HistorySlot, &Path)]) {
    if !config.history.enabled {
        return;
    }
    let path = expand_tilde(&config.history.path);
    let result = History::open(&path, config.history.max_entries).and_then(|mut history| {
        for (slot, p) in used {
            let absolute = std::fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
            history.record(*slot, &absolute);
        }
        history.flush()
    });
    if let Err(e) = result {
        warn!("could not update history {}: {e:#}", path.display());
    }
}

// ── `bootpack keygen` ─────────────────────────────────────────────────────────

fn cmd_keygen(config: &BootpackConfig, key_file: &Path, force: bool) -> Result<()> {
    let existing = std::fs::metadata(key_file).map(|m| m.len()).unwrap_or(0);
    if existing > 0 && !force {
        anyhow::bail!(
            "key file {} already exists; loaded keys are never regenerated (use --force to overwrite)",
            key_file.display()
        );
    }

    let resolved = ResolvedKey {
        key: generate_key(),
        source: KeySource::Generated,
    };
    write_key_file(key_file, &resolved.key)
        .with_context(|| format!("writing key file {}", key_file.display()))?;
    info!(path = %key_file.display(), source = %resolved.source, "key written");

    println!("{}", resolved.key.to_hex());
    remember(config, &[(HistorySlot::KeyFile, key_file)]);
    Ok(())
}

// ── `bootpack create` ─────────────────────────────────────────────────────────

fn cmd_create(
    config: &BootpackConfig,
    params: &ImageParams,
    key_args: &KeyArgs,
    input: &Path,
    output: &Path,
) -> Result<()> {
    let (resolved, key_path) = resolve_key(config, key_args)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        key_source = %resolved.source,
        "creating container"
    );

    let report = bootpack_image::create_file(params, resolved.key.as_bytes(), input, output)
        .with_context(|| format!("creating {} from {}", output.display(), input.display()))?;

    println!("Created {}", output.display());
    println!("  product id:  {}", format_hex_u32(report.header.product_id));
    println!("  app version: {}", format_hex_u32(report.header.app_version));
    println!("  protocol:    {}", report.header.protocol_version);
    println!("  image:       {} bytes", report.plaintext_len);
    println!("  pages:       {}", report.header.page_count);
    println!("  encrypted:   {} bytes", report.ciphertext_len);
    println!("  crc32:       {:08x}", report.header.plaintext_crc32);

    let mut used = vec![(HistorySlot::Input, input), (HistorySlot::Output, output)];
    if let Some(path) = key_path.as_deref() {
        used.push((HistorySlot::KeyFile, path));
    }
    remember(config, &used);
    Ok(())
}

// ── `bootpack recover` ────────────────────────────────────────────────────────

fn cmd_recover(
    config: &BootpackConfig,
    key_args: &KeyArgs,
    input: &Path,
    output: &Path,
    strict: bool,
) -> Result<()> {
    let (resolved, key_path) = resolve_key(config, key_args)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        key_source = %resolved.source,
        "recovering container"
    );

    let report = bootpack_image::recover_file(resolved.key.as_bytes(), input, output)
        .with_context(|| format!("recovering {} into {}", input.display(), output.display()))?;

    let mut used = vec![(HistorySlot::Output, input), (HistorySlot::Decrypted, output)];
    if let Some(path) = key_path.as_deref() {
        used.push((HistorySlot::KeyFile, path));
    }
    remember(config, &used);

    let status = if report.integrity_ok { "CRC ok" } else { "CRC mismatch" };
    println!("Decrypted {} to {} ({status})", input.display(), output.display());
    println!("  product id:  {}", format_hex_u32(report.product_id()));
    println!("  app version: {}", format_hex_u32(report.app_version()));
    println!("  protocol:    {}", report.protocol_version());
    println!("  bytes:       {}", report.plaintext_len);

    if !report.integrity_ok && (strict || config.recover.strict_integrity) {
        anyhow::bail!(
            "CRC mismatch: stored {:08x}, computed {:08x}",
            report.header.plaintext_crc32,
            report.computed_crc32
        );
    }
    Ok(())
}

// ── `bootpack inspect` ────────────────────────────────────────────────────────

fn cmd_inspect(container: &Path, json: bool) -> Result<()> {
    let file = std::fs::File::open(container)
        .with_context(|| format!("opening {}", container.display()))?;
    let summary = bootpack_image::inspect(&mut std::io::BufReader::new(file))
        .with_context(|| format!("reading header of {}", container.display()))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("serializing summary")?
        );
        return Ok(());
    }

    println!("Container: {}", container.display());
    println!("  protocol:    {}", summary.protocol_version);
    println!("  product id:  {}", format_hex_u32(summary.product_id));
    println!("  app version: {}", format_hex_u32(summary.app_version));
    println!("  pages:       {}", summary.page_count);
    match summary.payload_len {
        Some(len) => println!("  payload:     {len} bytes"),
        None => println!("  payload:     (page count overflows)"),
    }
    println!("  iv:          {}", summary.iv);
    println!("  crc32:       {:08x}", summary.plaintext_crc32);
    if summary.complete {
        println!("  status:      complete");
    } else {
        println!("  status:      truncated ({} bytes on disk)", summary.container_len);
    }
    if summary.trailing_bytes > 0 {
        println!("  trailing:    {} bytes after payload", summary.trailing_bytes);
    }
    Ok(())
}

// ── `bootpack history` ────────────────────────────────────────────────────────

fn cmd_history(config: &BootpackConfig, clear: bool) -> Result<()> {
    let path = expand_tilde(&config.history.path);
    let mut history = History::open(&path, config.history.max_entries)?;

    if clear {
        history.clear();
        history.flush()?;
        println!("History cleared ({})", path.display());
        return Ok(());
    }

    if history.is_empty() {
        println!("No recent files ({})", path.display());
        return Ok(());
    }

    for slot in HistorySlot::ALL {
        let items = history.recent(slot);
        if items.is_empty() {
            continue;
        }
        println!("{}:", slot.label());
        for item in items {
            println!("  {}", item.display());
        }
    }
    Ok(())
}

// ── `bootpack config show` ────────────────────────────────────────────────────

fn cmd_config_show(config: &BootpackConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
