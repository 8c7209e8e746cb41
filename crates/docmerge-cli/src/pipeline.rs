use anyhow::{Context, Result, bail};
use docmerge_config::{Config, EffectiveParameters};
use docmerge_engine::{
    Diagnostics, DocumentOrigins, DocumentationDatabase, GlobalParams, IgnorePatterns,
    RemoteDescriptor, RepositoryIndex, RepositoryParams, RepositorySource, default_passes,
    materialize_repository, run_passes,
};
use std::io;

use crate::Cli;
use crate::report;

/// Runs a whole merge: copy, load, rewrite, save and report.
pub fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let site = cli.output_dir.clone().unwrap_or_else(|| config.output_dir());
    let global = global_params(&config, cli.release_name.clone());
    let diag = Diagnostics::new(cli.warnings, cli.fail_on_warning);

    std::fs::create_dir_all(&site)
        .with_context(|| format!("Failed to create output directory {}", site.display()))?;
    log::info!("merging {} repositories into {}", config.repositories.len(), site.display());

    let mut origins = DocumentOrigins::default();
    let mut repositories = Vec::with_capacity(config.repositories.len());
    for (repo_id, section) in &config.repositories {
        let params = repository_params(config.parameters(repo_id)?)?;
        let checkout = config.checkout_dir(repo_id)?;
        let source = RepositorySource {
            repo_id,
            checkout: &checkout,
            params: &params,
        };
        materialize_repository(&source, &site, &global, &mut origins, &diag)
            .with_context(|| format!("Failed to copy repository '{repo_id}'"))?;

        let remote = RemoteDescriptor::new(&section.remote, section.branch.clone(), section.tag.clone());
        repositories.push(RepositoryIndex::new(repo_id, remote, params, &global));
    }

    let mut db = DocumentationDatabase::load(&site, global, repositories, &origins, &diag)?;
    let mut passes = default_passes();
    if !run_passes(&mut db, &mut passes, &diag)? {
        log::warn!("some documents could not be fully processed");
    }
    let written = db.save_all()?;

    let mut out = io::stdout().lock();
    if cli.show_external_links {
        report::write_link_report(&mut out, db.link_report(), cli.group_by)?;
    }
    if cli.show_unused_docs {
        report::write_unused(&mut out, &db)?;
    }

    diag.finish()?;
    log::info!(
        "done: {written} documents written, {} warnings",
        diag.warning_count()
    );
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let (config, path) = match &cli.config {
        Some(path) => (Config::load_from_path(path)?, path.clone()),
        None => (Config::load()?, Config::config_path()),
    };
    let Some(mut config) = config else {
        bail!("No config file found at {}", path.display());
    };
    if let Some(repos_dir) = &cli.repos_dir {
        config.repos_dir = Some(repos_dir.clone());
    }
    log::debug!("loaded configuration from {}", path.display());
    Ok(config)
}

fn global_params(config: &Config, release_name: Option<String>) -> GlobalParams {
    let global = config.global_parameters();
    GlobalParams {
        target_home_file: global.target_home_file,
        markdown_extensions: global.markdown_extensions,
        image_extensions: global.image_extensions,
        release_identifier: release_name.or(global.release_identifier),
    }
}

fn repository_params(params: EffectiveParameters) -> Result<RepositoryParams> {
    Ok(RepositoryParams {
        ignored: IgnorePatterns::new(params.ignored_files.as_slice())?,
        docs_folder: params.docs_folder,
        home_file: params.home_file,
        auxiliary_documents: params.auxiliary_documents,
        single_document_file: params.single_document_file,
        private_product_website: params.private_product_website,
    })
}
