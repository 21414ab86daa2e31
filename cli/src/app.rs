//! Wiring shared by the `resolve` and `list` subcommands.
//!
//! Reads the property files, builds a `Resolver` from the schema validator
//! and the integrity checker, publishes the result into a `TableHost` and
//! collects everything the binary prints.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use rsec_contracts::{
    error::{RsecError, RsecResult},
    resolved::ResolvedProfile,
    selector::{Selection, SelectorInput},
    source::{RawProperties, SourceFile},
};
use rsec_core::{
    descriptor::ProfileCatalog,
    loader,
    traits::{Clock, DiagnosticSink},
    ProfileSlot, Resolver,
};
use rsec_integrity::ProfileIntegrityChecker;
use rsec_policy::{ResolverSettings, SchemaValidator};

use crate::{host::TableHost, listing};

/// Property files to load: the main file, then an appended-files list.
#[derive(Debug, Clone, Default)]
pub struct SourceArgs {
    pub file: PathBuf,
    /// `a.security:b.security`, loaded in order after `file`.
    pub properties_list: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    pub sources: SourceArgs,
    pub selector: SelectorInput,
    /// Command-line overrides; `None` keeps the settings-file value.
    pub suppress_sunset_warning: Option<bool>,
    pub ignore_sunset_expiration: Option<bool>,
    pub config: Option<PathBuf>,
}

/// What a `resolve` run produced.
#[derive(Debug, Default)]
pub struct Report {
    /// Help, audit and trace listings, in that order.
    pub listing: String,
    pub profile: Option<Arc<ResolvedProfile>>,
    /// The effective security table after publication.
    pub table: BTreeMap<String, String>,
}

impl Report {
    /// `key=value` lines, sorted by key.
    pub fn render_table(&self) -> String {
        self.table
            .iter()
            .map(|(k, v)| format!("{k}={v}\n"))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&json!({
            "profile": self.profile.as_deref(),
            "security": &self.table,
        }))
    }
}

fn read_source(path: &Path) -> RsecResult<SourceFile> {
    let text = std::fs::read_to_string(path).map_err(|e| RsecError::Parse {
        reason: format!("failed to read property file '{}': {}", path.display(), e),
    })?;
    Ok(SourceFile::new(path.display().to_string(), text))
}

/// Read the main file and every appended file.
pub fn read_sources(args: &SourceArgs) -> RsecResult<Vec<SourceFile>> {
    let mut sources = vec![read_source(&args.file)?];
    if let Some(list) = args.properties_list.as_deref() {
        for file in loader::parse_properties_list(list)? {
            sources.push(read_source(Path::new(&file))?);
        }
    }
    debug!(files = sources.len(), "read property files");
    Ok(sources)
}

pub fn load_raw(args: &SourceArgs) -> RsecResult<RawProperties> {
    loader::load(&read_sources(args)?)
}

/// Settings file (or defaults) with command-line flag overrides applied.
pub fn load_settings(request: &ResolveRequest) -> RsecResult<ResolverSettings> {
    let settings = match &request.config {
        Some(path) => ResolverSettings::from_file(path)?,
        None => ResolverSettings::default(),
    };
    Ok(settings.with_overrides(
        request.suppress_sunset_warning,
        request.ignore_sunset_expiration,
    ))
}

pub fn build_resolver(
    settings: &ResolverSettings,
    clock: Box<dyn Clock>,
    sink: Arc<dyn DiagnosticSink>,
) -> Resolver {
    Resolver::new(
        Box::new(SchemaValidator::new()),
        Box::new(ProfileIntegrityChecker::new(
            settings.flags,
            settings.expiring_soon_months,
            clock,
            sink,
        )),
    )
}

/// Run the `resolve` subcommand.
///
/// `help` and `audit` without a profile id print their listing and stop.
pub fn run_resolve(
    request: &ResolveRequest,
    clock: Box<dyn Clock>,
    sink: Arc<dyn DiagnosticSink>,
) -> RsecResult<Report> {
    let selection = Selection::from_input(&request.selector)?;
    let settings = load_settings(request)?;
    let mut report = Report::default();

    if selection.help {
        report.listing.push_str(&listing::help());
    }
    if !selection.wants_profile() && !selection.audit {
        if selection.help {
            return Ok(report);
        }
        return Err(no_selection());
    }

    let raw = load_raw(&request.sources)?;
    if selection.audit {
        report.listing.push_str(&listing::audit(&ProfileCatalog::from_raw(&raw)));
    }
    let Some(selector) = selection.profile_selector(&settings.profile_ids)? else {
        return Ok(report);
    };
    info!(selector = %selector, "resolving restricted security profile");

    let resolver = build_resolver(&settings, clock, sink);
    let profile = resolver.resolve(&raw, &selector)?;

    let host = TableHost::from_raw(&raw);
    let slot = ProfileSlot::new();
    let published = slot.publish(profile, &host)?;

    if selection.trace {
        report.listing.push_str(&listing::trace(&published));
    }
    report.table = host.table();
    report.profile = Some(published);
    Ok(report)
}

/// Run the `list` subcommand: the audit listing of every profile.
pub fn run_list(args: &SourceArgs) -> RsecResult<String> {
    let raw = load_raw(args)?;
    Ok(listing::audit(&ProfileCatalog::from_raw(&raw)))
}

fn no_selection() -> RsecError {
    RsecError::Selection {
        reason: "No restricted security profile was selected".to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
