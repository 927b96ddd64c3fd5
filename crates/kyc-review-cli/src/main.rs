//! KycReview CLI — `kycr` command.
//!
//! Provides a command-line interface for submitting identity documents,
//! reviewing them, checking verification status and inspecting the audit
//! log.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use kyc_review::{
    DocumentFilter, DocumentId, DocumentRecord, DocumentStatus, DocumentType, FileStore,
    FsBlobStore, KycConfig, KycService, LogObserver, ReviewerId, Upload, UserId,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn default_data_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set; pass --data-dir")?;
    Ok(PathBuf::from(home).join(".kyc-review"))
}

fn open_service(data_dir: Option<&Path>, config_path: Option<&Path>) -> Result<KycService> {
    let data_dir = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_data_dir()?,
    };
    log::debug!("using data dir {}", data_dir.display());

    let config = match config_path {
        Some(path) => KycConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let path = data_dir.join("config.json");
            if path.exists() {
                KycConfig::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?
            } else {
                KycConfig::default()
            }
        }
    };

    let store = FileStore::open(data_dir.join("records")).context("failed to open record store")?;
    let blobs = FsBlobStore::new(data_dir.join("blobs")).context("failed to open blob store")?;

    Ok(KycService::new(config, Arc::new(store), Arc::new(blobs))
        .with_observer(Arc::new(LogObserver)))
}

// ── Formatting helpers ────────────────────────────────────────────────────────

fn micros_to_datetime(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    chrono::DateTime::from_timestamp(secs, 0)
        .unwrap_or(chrono::DateTime::UNIX_EPOCH)
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

/// Guess the declared MIME type from a file extension.
fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Parse a `TYPE=PATH` submission argument.
fn parse_document_arg(arg: &str) -> Result<(DocumentType, PathBuf)> {
    let (kind, path) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected TYPE=PATH, got '{arg}'"))?;
    let document_type: DocumentType = kind.parse()?;
    if path.is_empty() {
        return Err(anyhow!("missing path in '{arg}'"));
    }
    Ok((document_type, PathBuf::from(path)))
}

fn print_record(record: &DocumentRecord, verbose: bool) {
    println!("Document: {}", record.id);
    println!("  User:      {}", record.user_id);
    println!("  Type:      {}", record.document_type);
    println!("  File:      {} ({}, {} bytes)", record.file.name, record.file.mime_type, record.file.size);
    println!("  Status:    {}", record.status);
    println!("  Submitted: {}", micros_to_datetime(record.created_at));
    if let Some(ref reviewer) = record.reviewer_id {
        println!("  Reviewer:  {reviewer}");
    }
    if let Some(at) = record.reviewed_at {
        println!("  Reviewed:  {}", micros_to_datetime(at));
    }
    if let Some(ref notes) = record.review_notes {
        println!("  Notes:     {notes}");
    }
    if verbose {
        println!("  Blob:      {}", record.file.storage_ref);
    }
}

fn print_table(records: &[DocumentRecord]) {
    println!(
        "{:<28} {:<16} {:<18} {:<9} SUBMITTED",
        "ID", "USER", "TYPE", "STATUS"
    );
    println!("{}", "-".repeat(96));
    for record in records {
        println!(
            "{:<28} {:<16} {:<18} {:<9} {}",
            record.id.to_string(),
            record.user_id.to_string(),
            record.document_type.as_str(),
            record.status.as_str(),
            micros_to_datetime(record.created_at)
        );
    }
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// KycReview CLI — submit identity documents, review them, and inspect the
/// audit trail.
#[derive(Parser, Debug)]
#[command(
    name = "kycr",
    about = "KycReview CLI",
    version,
    long_about = "kycr — KycReview CLI\n\nSubmit identity documents, approve or reject them,\ncheck verification status and inspect the audit log."
)]
struct Cli {
    /// Data directory (default: ~/.kyc-review)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (default: DATA_DIR/config.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit one or more documents for a user
    Submit {
        /// Submitting user
        #[arg(long)]
        user: String,

        /// Documents as TYPE=PATH (passport, drivers_license, national_id, proof_of_address, other)
        #[arg(required = true)]
        documents: Vec<String>,

        /// Declared MIME type (default: guessed from the file extension)
        #[arg(long)]
        mime: Option<String>,
    },

    /// List a user's documents, newest first
    List {
        #[arg(long)]
        user: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the review queue across all users
    Queue {
        /// Filter by status (pending, approved, rejected)
        #[arg(long)]
        status: Option<String>,

        /// Case-insensitive search over file name, user id and document id
        #[arg(long)]
        search: Option<String>,

        /// Only documents of this user
        #[arg(long)]
        user: Option<String>,
    },

    /// Display one document
    Show {
        document_id: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Approve a pending document
    Approve {
        document_id: String,

        #[arg(long)]
        reviewer: String,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Reject a pending document
    Reject {
        document_id: String,

        #[arg(long)]
        reviewer: String,

        /// Reason for the rejection (required)
        #[arg(long)]
        notes: String,
    },

    /// Show a user's verification status
    Status {
        #[arg(long)]
        user: String,

        /// Recompute from the user's documents before printing
        #[arg(long)]
        recompute: bool,
    },

    /// List audit entries
    Audit {
        /// Only entries for this user
        #[arg(long, conflicts_with = "document")]
        user: Option<String>,

        /// Only entries for this document
        #[arg(long)]
        document: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify the audit log hash chain
    VerifyAudit,

    /// Write a document's file to disk
    Download {
        document_id: String,

        /// Output path (default: the original file name in the current
        /// directory, never overwritten)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Delete a document and its file (audit entries are kept)
    Purge { document_id: String },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let verbose = cli.verbose;

    let result = open_service(cli.data_dir.as_deref(), cli.config.as_deref()).and_then(|service| {
        match cli.command {
            Commands::Submit {
                user,
                documents,
                mime,
            } => cmd_submit(&service, &user, &documents, mime.as_deref(), verbose),
            Commands::List { user, json } => cmd_list(&service, &user, json),
            Commands::Queue {
                status,
                search,
                user,
            } => cmd_queue(&service, status.as_deref(), search, user, verbose),
            Commands::Show { document_id, json } => cmd_show(&service, &document_id, json, verbose),
            Commands::Approve {
                document_id,
                reviewer,
                notes,
            } => cmd_approve(&service, &document_id, &reviewer, notes.as_deref(), verbose),
            Commands::Reject {
                document_id,
                reviewer,
                notes,
            } => cmd_reject(&service, &document_id, &reviewer, &notes, verbose),
            Commands::Status { user, recompute } => cmd_status(&service, &user, recompute),
            Commands::Audit {
                user,
                document,
                json,
            } => cmd_audit(&service, user.as_deref(), document.as_deref(), json, verbose),
            Commands::VerifyAudit => cmd_verify_audit(&service),
            Commands::Download {
                document_id,
                output,
            } => cmd_download(&service, &document_id, output),
            Commands::Purge { document_id } => cmd_purge(&service, &document_id),
        }
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// `kycr submit --user USER TYPE=PATH...`
fn cmd_submit(
    service: &KycService,
    user: &str,
    documents: &[String],
    mime: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let user_id = UserId::new(user);

    let mut uploads = Vec::with_capacity(documents.len());
    for arg in documents {
        let (document_type, path) = parse_document_arg(arg)?;
        let bytes =
            std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime.unwrap_or_else(|| mime_for(&path));
        uploads.push(Upload::new(document_type, file_name, mime_type, bytes));
    }

    let report = service.submit_batch(&user_id, uploads)?;

    for item in &report.items {
        match &item.result {
            Ok(id) => println!("Submitted {} as {id}", item.file_name),
            Err(e) => println!("Failed    {}: {e}", item.file_name),
        }
    }
    match &report.verification_status {
        Ok(status) => println!("Verification status: {status}"),
        Err(e) => println!("Verification status: not updated ({e})"),
    }

    if verbose {
        println!(
            "  {} accepted, {} failed",
            report.accepted().len(),
            report.failures().len()
        );
    }

    if report.accepted().is_empty() {
        return Err(anyhow!("no documents were submitted"));
    }
    Ok(())
}

/// `kycr list --user USER [--json]`
fn cmd_list(service: &KycService, user: &str, json: bool) -> Result<()> {
    let records = service.documents(&UserId::new(user))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No documents for {user}");
        return Ok(());
    }
    print_table(&records);
    Ok(())
}

/// `kycr queue [--status STATUS] [--search TEXT] [--user USER]`
fn cmd_queue(
    service: &KycService,
    status: Option<&str>,
    search: Option<String>,
    user: Option<String>,
    verbose: bool,
) -> Result<()> {
    let status = status.map(str::parse::<DocumentStatus>).transpose()?;
    let filter = DocumentFilter {
        status,
        search,
        user_id: user.map(UserId::new),
    };
    let records = service.review_queue(&filter)?;

    if records.is_empty() {
        println!("No matching documents");
    } else {
        print_table(&records);
    }

    if verbose {
        let counts = service.counts()?;
        println!();
        println!(
            "Pending: {}  Approved: {}  Rejected: {}  Total: {}",
            counts.pending,
            counts.approved,
            counts.rejected,
            counts.total()
        );
    }
    Ok(())
}

/// `kycr show DOCUMENT_ID [--json]`
fn cmd_show(service: &KycService, document_id: &str, json: bool, verbose: bool) -> Result<()> {
    let record = service.document(&DocumentId(document_id.to_string()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record, verbose);
    }
    Ok(())
}

/// `kycr approve DOCUMENT_ID --reviewer REVIEWER [--notes NOTES]`
fn cmd_approve(
    service: &KycService,
    document_id: &str,
    reviewer: &str,
    notes: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let outcome = service.approve(
        &DocumentId(document_id.to_string()),
        &ReviewerId::new(reviewer),
        notes,
    )?;

    println!("Approved {}", outcome.document.id);
    println!("  User:   {} is now {}", outcome.document.user_id, outcome.verification_status);
    if verbose {
        println!("  Audit:  {}", outcome.audit_id);
    }
    Ok(())
}

/// `kycr reject DOCUMENT_ID --reviewer REVIEWER --notes NOTES`
fn cmd_reject(
    service: &KycService,
    document_id: &str,
    reviewer: &str,
    notes: &str,
    verbose: bool,
) -> Result<()> {
    let outcome = service.reject(
        &DocumentId(document_id.to_string()),
        &ReviewerId::new(reviewer),
        notes,
    )?;

    println!("Rejected {}", outcome.document.id);
    println!("  User:   {} is now {}", outcome.document.user_id, outcome.verification_status);
    if verbose {
        println!("  Audit:  {}", outcome.audit_id);
    }
    Ok(())
}

/// `kycr status --user USER [--recompute]`
fn cmd_status(service: &KycService, user: &str, recompute: bool) -> Result<()> {
    let user_id = UserId::new(user);
    if recompute {
        service.recompute(&user_id)?;
    }
    let profile = service.profile(&user_id)?;

    println!("User: {}", profile.user_id);
    println!("  Status:  {}", profile.verification_status);
    if profile.updated_at > 0 {
        println!("  Updated: {}", micros_to_datetime(profile.updated_at));
    }
    Ok(())
}

/// `kycr audit [--user USER | --document DOCUMENT_ID] [--json]`
fn cmd_audit(
    service: &KycService,
    user: Option<&str>,
    document: Option<&str>,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let entries: Vec<_> = match (user, document) {
        (Some(user), _) => service.audit().list_by_user(&UserId::new(user))?.collect(),
        (None, Some(doc)) => service
            .audit()
            .list_by_document(&DocumentId(doc.to_string()))?
            .collect(),
        (None, None) => service.audit().entries()?.collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No audit entries");
        return Ok(());
    }

    for entry in &entries {
        println!(
            "#{:<5} {} {:<8} {} by {} (user {})",
            entry.sequence,
            micros_to_datetime(entry.timestamp),
            entry.decision.as_str(),
            entry.document_id,
            entry.reviewer_id,
            entry.user_id
        );
        if let Some(ref notes) = entry.notes {
            println!("        notes: {notes}");
        }
        if verbose {
            println!("        id:    {}", entry.id);
            println!("        hash:  {}", entry.entry_hash);
        }
    }
    Ok(())
}

/// `kycr verify-audit`
fn cmd_verify_audit(service: &KycService) -> Result<()> {
    let count = service
        .audit()
        .verify()
        .context("audit log verification failed")?;
    println!("Audit log valid ({count} entries)");
    Ok(())
}

/// `kycr download DOCUMENT_ID [--output PATH]`
fn cmd_download(service: &KycService, document_id: &str, output: Option<PathBuf>) -> Result<()> {
    let (record, bytes) = service.download(&DocumentId(document_id.to_string()))?;
    let path = match output {
        Some(path) => path,
        None => {
            // Only the last component of the submitted name, in the current directory.
            let path = Path::new(&record.file.name)
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(&record.id.0));
            if path.exists() {
                return Err(anyhow!(
                    "{} already exists; pass --output to choose a path",
                    path.display()
                ));
            }
            path
        }
    };

    std::fs::write(&path, &bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// `kycr purge DOCUMENT_ID`
fn cmd_purge(service: &KycService, document_id: &str) -> Result<()> {
    let removed = service.purge(&DocumentId(document_id.to_string()))?;
    let profile = service.profile(&removed.user_id)?;
    println!("Purged {} ({})", removed.id, removed.file.name);
    println!("  User: {} is now {}", removed.user_id, profile.verification_status);
    Ok(())
}
