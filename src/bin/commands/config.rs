use clap::Args;
use serde::Serialize;
use sqlscribe::lens::utils::OutputFormat;
use sqlscribe::SqlscribeConfig;
use std::path::Path;

/// Arguments for the Config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Also list the files in the model directory
    #[clap(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Serialize)]
struct ConfigInfo {
    config_file: String,
    data_dir: String,
    database: DatabaseInfo,
    model: ModelInfo,
    limits: Limits,
    admin: AdminInfo,
    server: String,
}

#[derive(Debug, Serialize)]
struct DatabaseInfo {
    path: String,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    directory: String,
    /// Required files that are missing from `directory`
    missing_files: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<Vec<FileInfo>>,
}

#[derive(Debug, Serialize)]
struct Limits {
    max_output_tokens: usize,
    inference_timeout_secs: u64,
    query_timeout_secs: u64,
    max_readers: usize,
}

#[derive(Debug, Serialize)]
struct AdminInfo {
    user: String,
    login_enabled: bool,
}

#[derive(Debug, Serialize)]
struct FileInfo {
    name: String,
    size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified: Option<String>,
}

const MODEL_FILES: [&str; 3] = ["config.json", "tokenizer.json", "model.safetensors"];

pub fn run(config: &SqlscribeConfig, args: ConfigArgs, output_format: OutputFormat) {
    let ConfigArgs { verbose } = args;

    let db_path = Path::new(&config.database_path);
    let db_exists = db_path.exists();
    let db_size = if db_exists {
        std::fs::metadata(db_path).ok().map(|m| m.len())
    } else {
        None
    };

    let model_dir = Path::new(&config.model_dir);
    let missing_files = MODEL_FILES
        .iter()
        .copied()
        .filter(|name| !model_dir.join(name).exists())
        .collect();

    let files = if verbose {
        let mut file_list = Vec::new();
        if let Ok(entries) = std::fs::read_dir(model_dir) {
            for entry in entries.flatten() {
                if let Ok(metadata) = entry.metadata() {
                    if metadata.is_file() {
                        let modified = metadata.modified().ok().map(|t| {
                            let datetime: chrono::DateTime<chrono::Utc> = t.into();
                            datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string()
                        });
                        file_list.push(FileInfo {
                            name: entry.file_name().to_string_lossy().to_string(),
                            size_bytes: metadata.len(),
                            modified,
                        });
                    }
                }
            }
        }
        file_list.sort_by(|a, b| a.name.cmp(&b.name));
        Some(file_list)
    } else {
        None
    };

    let info = ConfigInfo {
        config_file: SqlscribeConfig::config_file_path(),
        data_dir: config.data_dir.clone(),
        database: DatabaseInfo {
            path: config.database_path.clone(),
            exists: db_exists,
            size_bytes: db_size,
        },
        model: ModelInfo {
            directory: config.model_dir.clone(),
            missing_files,
            files,
        },
        limits: Limits {
            max_output_tokens: config.max_output_tokens,
            inference_timeout_secs: config.inference_timeout_secs,
            query_timeout_secs: config.query_timeout_secs,
            max_readers: config.max_readers,
        },
        admin: AdminInfo {
            user: config.admin_user.clone(),
            login_enabled: config.admin_enabled(),
        },
        server: format!("{}:{}", config.server_address, config.server_port),
    };

    match output_format {
        OutputFormat::JsonPretty => match serde_json::to_string_pretty(&info) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error serializing config info: {}", e),
        },
        OutputFormat::Json | OutputFormat::JsonLine => match serde_json::to_string(&info) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error serializing config info: {}", e),
        },
        _ => print_config_table(config, &info),
    }
}

fn print_config_table(config: &SqlscribeConfig, info: &ConfigInfo) {
    println!("sqlscribe Configuration");
    println!("=======================\n");

    println!("Config file:        {}", info.config_file);
    println!("{}", config.summary());
    println!();

    println!("Database:");
    println!(
        "  Status:         {}",
        if info.database.exists {
            "exists"
        } else {
            "not created"
        }
    );
    if let Some(size) = info.database.size_bytes {
        println!("  Size:           {}", format_size(size));
    }
    println!();

    println!("Model:");
    if info.model.missing_files.is_empty() {
        println!("  Status:         ready");
    } else {
        println!("  Status:         missing {}", info.model.missing_files.join(", "));
    }

    if let Some(ref files) = info.model.files {
        println!();
        println!("Model Directory Files:");
        println!("  {:<40} {:>12}  {}", "Name", "Size", "Modified");
        println!("  {}", "-".repeat(80));
        for file in files {
            println!(
                "  {:<40} {:>12}  {}",
                file.name,
                format_size(file.size_bytes),
                file.modified.as_deref().unwrap_or("-")
            );
        }
    }

    eprintln!();
    eprintln!("Tips:");
    eprintln!("  Use --verbose (-v) to list the model directory");
    eprintln!("  Use --format json for machine-readable output");
    eprintln!("  Run `sqlscribe hash-password` to enable administrator login");
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
