mod comedi;
mod harvest;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use cmdi_modifiers::config;
use cmdi_modifiers::pipeline::{Pipeline, PipelineSettings, Summary, Verbosity};
use cmdi_modifiers::{
    AddRightsHolder, InferCreators, Modifier, OrganizationTemplate, PersonToOrganization,
};
use tracing::info;

use crate::comedi::ComediClient;
use crate::harvest::OaiPmhHarvester;

/// Edit all records of an OAI-PMH set using the selected modifications and
/// upload the edited records to COMEDI.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// COMEDI session id used for uploads
    session_id: String,
    /// OAI-PMH set to harvest
    set_id: String,
    /// URL of the OAI-PMH API from which data is retrieved
    #[arg(long, default_value = "https://clarino.uib.no/oai")]
    oai_pmh_url: String,
    /// Base URL of the COMEDI API that modified records are uploaded to
    #[arg(long, default_value = "https://clarino.uib.no/comedi")]
    comedi_url: String,
    /// If a person with surname "FIN-CLARIN" is found, turn the person into
    /// an organization where the role allows it.
    #[arg(long)]
    finclarin_to_organization: bool,
    /// If a person with surname "The Language Bank of Finland" is found,
    /// turn the person into an organization where the role allows it.
    #[arg(long)]
    language_bank_to_organization: bool,
    /// JSON file listing persons and the affiliation they get when they
    /// don't have one yet
    #[arg(long, value_name = "FILE")]
    add_affiliations_from: Option<PathBuf>,
    /// JSON file mapping PIDs to Finnish and English author lists, used to
    /// add resource creators
    #[arg(long, value_name = "FILE")]
    add_creators_from: Option<PathBuf>,
    /// File with one PID per line. These records get a distribution rights
    /// holder.
    #[arg(long, value_name = "FILE")]
    add_rights_holder_for: Option<PathBuf>,
    /// organizationInfo used as the rights holder (default: the University
    /// of Helsinki)
    #[arg(long, value_name = "FILE", requires = "add_rights_holder_for")]
    rights_holder_template: Option<PathBuf>,
    /// Output a summary of actions but make no changes to the repository
    #[arg(long)]
    dry_run: bool,
    /// Print diffs of modifications. Repeat to also list records that were
    /// not modified.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Save each modified record as it was before modification into DIR
    #[arg(long, value_name = "DIR")]
    save_originals: Option<PathBuf>,
}

impl Cli {
    fn verbosity(&self) -> Verbosity {
        match self.verbose {
            0 => Verbosity::Quiet,
            1 => Verbosity::Changes,
            _ => Verbosity::All,
        }
    }

    fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            live: !self.dry_run,
            verbosity: self.verbosity(),
            snapshot_dir: self.save_originals.clone(),
            ..PipelineSettings::dry_run()
        }
    }

    /// The selected modifiers, in the order they are applied.
    fn modifiers(&self) -> anyhow::Result<Vec<Box<dyn Modifier>>> {
        let mut modifiers: Vec<Box<dyn Modifier>> = Vec::new();

        if let Some(path) = &self.add_affiliations_from {
            let affiliations = config::load_affiliations(path)?;
            info!(count = affiliations.len(), "loaded affiliations");
            modifiers.extend(
                affiliations
                    .into_iter()
                    .map(|affiliation| Box::new(affiliation) as Box<dyn Modifier>),
            );
        }
        if self.finclarin_to_organization {
            modifiers.push(Box::new(PersonToOrganization::fin_clarin()));
        }
        if self.language_bank_to_organization {
            modifiers.push(Box::new(PersonToOrganization::language_bank()));
        }
        if let Some(path) = &self.add_rights_holder_for {
            let pids = config::load_pid_list(path)?;
            let template = self.rights_holder()?;
            info!(count = pids.len(), "loaded rights holder PIDs");
            modifiers.push(Box::new(AddRightsHolder::new(pids, template)));
        }
        if let Some(path) = &self.add_creators_from {
            let dictionary = config::load_creator_dictionary(path)?;
            info!(count = dictionary.len(), "loaded creator dictionary");
            modifiers.push(Box::new(InferCreators::new(dictionary)));
        }
        Ok(modifiers)
    }

    fn rights_holder(&self) -> anyhow::Result<OrganizationTemplate> {
        Ok(match &self.rights_holder_template {
            Some(template) => config::load_template(template)?,
            None => OrganizationTemplate::uhel(),
        })
    }

    fn run(&self) -> anyhow::Result<Summary> {
        let modifiers = self.modifiers().context("Failed to load configuration")?;
        let pipeline = Pipeline::new(modifiers, self.settings());
        let harvester = OaiPmhHarvester::new(&self.oai_pmh_url, &self.set_id);
        let uploader = ComediClient::new(&self.comedi_url, &self.session_id);
        let mut stdout = std::io::stdout().lock();
        let summary = pipeline
            .run(harvester, &uploader, &mut stdout)
            .with_context(|| format!("Failed to update set {}", self.set_id))?;
        stdout.flush()?;
        Ok(summary)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.dry_run {
        info!("dry run, nothing will be uploaded");
    }
    let summary = cli.run()?;
    println!("{summary}");
    Ok(())
}
