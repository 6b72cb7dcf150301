mod cli;

use dynbind::bind::{self, Overrides};
use dynbind::extract::{self, Extraction};
use dynbind::value::Value;
use indexmap::IndexMap;
use serde::Serialize;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("DYNBIND_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Extract(extract_cli) => extract(extract_cli),
        cli::Command::Render(render_cli) => render(render_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn extract(cli: cli::ExtractCommand) -> anyhow::Result<()> {
    let Extraction { document, .. } = load_and_extract(&cli.input)?;
    output(&cli.output, &document)
}

pub fn render(cli: cli::RenderCommand) -> anyhow::Result<()> {
    let Extraction { declarations, .. } = load_and_extract(&cli.input)?;
    let overrides: Overrides = cli.parameters.into_iter().collect();

    let mut rendered: IndexMap<&str, Value> = IndexMap::new();
    for declaration in &declarations {
        let value = bind::evaluate(declaration, &overrides, &[])?;
        rendered.insert(declaration.property(), value);
    }

    output(&cli.output, &rendered)
}

fn load_and_extract(input: &cli::InputArgs) -> anyhow::Result<Extraction> {
    let documents = load(input)?;
    let document = documents.to_document(&input.root);
    Ok(extract::extract(&document, document.root()))
}

fn load(input: &cli::InputArgs) -> anyhow::Result<dynbind::hcl_documents::HclDocuments> {
    if !input.workdir && input.files.is_empty() && input.directories.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        let body = hcl_edit::parser::parse_body(&stdin)?;
        return Ok(body.into());
    }

    let mut documents = dynbind::hcl_documents::HclDocuments::default();

    if input.workdir {
        documents.load_directory(&std::env::current_dir()?)?;
    }

    for file_path in &input.files {
        documents.load_file(file_path)?;
    }

    for dir_path in &input.directories {
        documents.load_directory(dir_path)?;
    }

    anyhow::ensure!(documents.source_count() > 0, "No files loaded");

    Ok(documents)
}

fn output(output: &cli::OutputArgs, value: &impl Serialize) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}
