use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::{debug, warn};

use jsg_core::config::{self, CONFIG_FILE_NAME, GeneratorConfig};
use jsg_core::{SchemaGenerator, TypeModel, TypeRef};

#[derive(Parser)]
#[command(name = "jsg", about = "JSON Schema generator for declared type models", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the JSON Schema of a root type
    Generate {
        /// Path to the type model (YAML or JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Qualified root type, e.g. `shapes::Drawing` or `Page<Item>`
        #[arg(short, long)]
        root: String,

        /// Generator config file (defaults to .jsg.yaml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Built-in option set, used when no config file is found
        #[arg(long, default_value = "default")]
        preset: Preset,

        /// Document title (defaults to the root type's name)
        #[arg(long)]
        title: Option<String>,

        /// Document description
        #[arg(long)]
        description: Option<String>,

        /// Write the schema to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the schema on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Initialize a new jsg configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    Default,
    JsonEditor,
    Nullable,
}

impl Preset {
    fn config(self) -> GeneratorConfig {
        match self {
            Preset::Default => GeneratorConfig::default(),
            Preset::JsonEditor => GeneratorConfig::json_editor(),
            Preset::Nullable => GeneratorConfig::nullable(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            model,
            root,
            config,
            preset,
            title,
            description,
            output,
            compact,
        } => cmd_generate(GenerateArgs {
            model,
            root,
            config,
            preset,
            title,
            description,
            output,
            compact,
        }),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "jsg", &mut std::io::stdout());
            Ok(())
        }
    }
}

struct GenerateArgs {
    model: PathBuf,
    root: String,
    config: Option<PathBuf>,
    preset: Preset,
    title: Option<String>,
    description: Option<String>,
    output: Option<PathBuf>,
    compact: bool,
}

fn load_model(path: &Path) -> Result<TypeModel> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");

    let model = match ext {
        "json" => TypeModel::from_json(&content),
        _ => TypeModel::from_yaml(&content),
    }
    .with_context(|| format!("invalid type model {}", path.display()))?;
    Ok(model)
}

/// An explicit config file must exist; the default one is optional. Without
/// any file the preset applies.
fn resolve_config(path: Option<&Path>, preset: Preset) -> Result<GeneratorConfig> {
    let explicit = path.is_some();
    let path = path.map_or_else(|| PathBuf::from(CONFIG_FILE_NAME), Path::to_path_buf);

    match config::load_config(&path).map_err(|e| anyhow::anyhow!(e))? {
        Some(cfg) => {
            debug!("loaded config from {}", path.display());
            if preset != Preset::Default {
                warn!(
                    "ignoring --preset {:?} since {} was loaded",
                    preset,
                    path.display()
                );
            }
            Ok(cfg)
        }
        None if explicit => anyhow::bail!("config file {} does not exist", path.display()),
        None => Ok(preset.config()),
    }
}

fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let model = load_model(&args.model)?;
    let cfg = resolve_config(args.config.as_deref(), args.preset)?;
    let root = TypeRef::parse(&args.root)
        .with_context(|| format!("invalid root type '{}'", args.root))?;

    let generator = SchemaGenerator::new(&model, cfg);
    let schema = generator
        .generate_with(&root, args.title.as_deref(), args.description.as_deref())
        .with_context(|| format!("failed to generate schema for {}", root))?;

    let rendered = if args.compact {
        serde_json::to_string(&schema)?
    } else {
        serde_json::to_string_pretty(&schema)?
    };

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
            fs::write(&path, format!("{}\n", rendered))
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("  wrote {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
