use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use colored::Colorize;
use tracing::{debug, info, instrument};

use crate::cli::args::{Cli, Commands};
use crate::cli::error::{CliError, CliResult};
use crate::config::Settings;
use crate::document::{Document, Element};
use crate::domain::{TagId, TagTree};
use crate::render::TreeRender;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    debug!("settings: {:?}", settings);

    match &cli.command {
        Some(Commands::Show { document }) => _show(document, &settings),
        Some(Commands::Validate { document }) => _validate(document, &settings),
        Some(Commands::Config) => _config(&settings),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see --help".to_string(),
        )),
    }
}

/// Load a document into a fresh tree honoring the settings.
pub fn load_tree(path: &Path, settings: &Settings) -> CliResult<(TagTree<Element>, TagId)> {
    let document = Document::load(path)?;
    let mut tree = settings.new_tree();
    let root = document.build(&mut tree)?;
    Ok((tree, root))
}

#[instrument(skip(settings))]
fn _show(path: &Path, settings: &Settings) -> CliResult<()> {
    let (tree, root) = load_tree(path, settings)?;
    let rendered = tree.to_tree_string(root, &settings.render)?;
    print!("{}", rendered);
    Ok(())
}

#[instrument(skip(settings))]
fn _validate(path: &Path, settings: &Settings) -> CliResult<()> {
    let (tree, root) = load_tree(path, settings)?;
    tree.validate(root)?;
    info!(tags = tree.len(), depth = tree.depth(root)?, "document is valid");
    println!("{}", format!("{}: valid", path.display()).green());
    Ok(())
}

fn _config(settings: &Settings) -> CliResult<()> {
    let rendered = settings
        .to_toml()
        .map_err(|e| CliError::Usage(format!("cannot render settings: {}", e)))?;
    print!("{}", rendered);
    Ok(())
}
