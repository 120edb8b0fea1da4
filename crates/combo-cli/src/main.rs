use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use combo_core::calendar::{MonthCalendar, year_calendar};
use combo_core::{AppConfig, ComboError, Database, ExitCode, NewPaper, Page, Paper, TagType};
use combo_science::formats::bibtex;
use combo_science::keywords::{DiscoveryOptions, discover, write_csv};
use combo_science::{
    BibInput, Citable, KeywordDictionary, Linkifier, ScienceError, TagApplier, extract_msc_codes,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "combo",
    about = "arXiv combinatorics catalogue: ingestion, tagging and keyword linking",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting COMBO_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Log progress to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this database file instead of the configured one.
    #[arg(long, global = true, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Use this keyword dictionary instead of the configured one.
    #[arg(long, global = true, value_name = "PATH")]
    dictionary: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest papers from a JSON file holding one paper or an array of
    /// papers. `-` reads stdin.
    Ingest { file: String },

    /// List papers, most recently published first.
    List {
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long)]
        per_page: Option<usize>,
    },

    /// Search titles, abstracts and author names.
    Search {
        query: String,
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long)]
        per_page: Option<usize>,
    },

    /// Operations on a single paper.
    Paper {
        #[command(subcommand)]
        action: PaperAction,
    },

    /// Show an author's papers, by slug or exact name.
    Author {
        key: String,
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long)]
        per_page: Option<usize>,
        /// Print the author's bibliography as BibTeX instead.
        #[arg(long)]
        bibtex: bool,
    },

    /// Per-day paper counts for a year, as month calendars.
    Browse {
        #[arg(long)]
        year: Option<i32>,
    },

    /// Papers published on a given day (YYYY-MM-DD).
    Date { day: NaiveDate },

    /// Show a random paper.
    Random,

    /// BibTeX for an arXiv id or URL.
    Bibtex {
        input: String,
        /// Emit the journal entry instead of the preprint entry.
        #[arg(long)]
        published: bool,
    },

    /// Tag management.
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },

    /// Insert keyword links into text. Reads stdin when neither TEXT nor
    /// --file is given.
    Linkify {
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Extract MSC codes from text. Reads stdin when TEXT is omitted.
    Msc { text: Option<String> },

    /// Keyword dictionary tools.
    Dict {
        #[command(subcommand)]
        action: DictAction,
    },

    /// Keyword discovery over the stored abstracts.
    Keywords {
        #[command(subcommand)]
        action: KeywordsAction,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show catalogue statistics.
    Stats,

    /// Fill in missing author slugs.
    BackfillSlugs,

    /// Show version information.
    Version,
}

// ─── Paper Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum PaperAction {
    /// Show a paper by arXiv id (with or without version).
    Get {
        id: String,
        /// Render the abstract with keyword links.
        #[arg(long)]
        linkify: bool,
    },

    /// Delete a paper and its tag associations.
    Delete {
        id: String,
        #[arg(long)]
        confirm: bool,
    },

    /// Recompute the paper's arxiv and msc tags.
    Retag { id: String },
}

// ─── Tag Actions ────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum TagAction {
    /// List tags with paper counts.
    List {
        #[arg(long = "type")]
        tag_type: Option<TagType>,
    },
    /// Attach a personal or other tag to a paper.
    Add {
        arxiv_id: String,
        name: String,
        #[arg(long = "type", default_value = "personal")]
        tag_type: TagType,
    },
    /// Detach a personal or other tag from a paper.
    Remove {
        arxiv_id: String,
        name: String,
        #[arg(long = "type", default_value = "personal")]
        tag_type: TagType,
    },
    /// Papers carrying a tag.
    Papers {
        name: String,
        #[arg(long = "type")]
        tag_type: TagType,
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long)]
        per_page: Option<usize>,
    },
    /// Delete a tag (removes it from all papers).
    Delete {
        name: String,
        #[arg(long = "type")]
        tag_type: TagType,
        #[arg(long)]
        confirm: bool,
    },
    /// Recompute derived tags for every stored paper.
    Backfill,
}

// ─── Dictionary / Keywords Actions ──────────────────────────────────────────

#[derive(Subcommand)]
enum DictAction {
    /// Load and validate a dictionary file (defaults to the configured one).
    Check { path: Option<PathBuf> },
}

#[derive(Subcommand)]
enum KeywordsAction {
    /// Rank recurring phrases across abstracts and write them as CSV.
    Discover {
        #[arg(long)]
        min_count: Option<usize>,
        #[arg(long)]
        max_ngram: Option<usize>,
        /// Output file, `-` for stdout.
        #[arg(long)]
        output: Option<String>,
    },
}

// ─── Config Actions ─────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Show the config file path.
    Path,
    /// Get a config value.
    Get { key: String },
    /// Write the current configuration to the config file.
    Init {
        #[arg(long)]
        force: bool,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    let json_output = cli.json || std::env::var("COMBO_JSON").as_deref() == Ok("1");
    init_tracing(cli.verbose);

    let mut config = AppConfig::load()?;
    if let Some(path) = &cli.database {
        config.set_database_path(path.clone());
    }
    if let Some(path) = &cli.dictionary {
        config.tagging.dictionary_path = Some(path.to_string_lossy().into_owned());
    }

    let out = Output {
        json: json_output,
        start,
    };

    if let Err(err) = run(cli.command, &config, &out) {
        let code = exit_code_for(&err);
        if out.json {
            print_json(&json!({
                "status": "error",
                "error": error_kind(code),
                "message": format!("{err:#}"),
                "meta": { "duration_ms": out.elapsed_ms() }
            }))?;
        } else {
            eprintln!("error: {err:#}");
        }
        std::process::exit(code.code());
    }

    Ok(())
}

fn run(command: Commands, config: &AppConfig, out: &Output) -> Result<()> {
    match command {
        // ── Ingestion ──────────────────────────────────────────────────────

        Commands::Ingest { file } => {
            let papers = read_ingest_batch(&read_input(&file)?)?;
            let db = open_db(config)?;
            let applier = tag_applier(config)?;

            let mut outcomes = Vec::with_capacity(papers.len());
            let mut failures = Vec::new();
            for paper in &papers {
                match applier.ingest(&db, paper) {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => {
                        tracing::warn!(arxiv_id = %paper.arxiv_id, "ingestion failed: {e}");
                        failures.push(json!({ "arxiv_id": paper.arxiv_id, "message": e.to_string() }));
                    }
                }
            }

            if out.json {
                out.ok(json!({ "ingested": outcomes, "failed": failures }))?;
            } else {
                println!("Ingested {} of {} papers.", outcomes.len(), papers.len());
                for failure in &failures {
                    eprintln!("  failed: {} ({})", failure["arxiv_id"], failure["message"]);
                }
            }
            if !failures.is_empty() {
                std::process::exit(ExitCode::GeneralError.code());
            }
        }

        // ── Listing / Search ───────────────────────────────────────────────

        Commands::List { page, per_page } => {
            let db = open_db(config)?;
            let papers = db.list_recent(page, per_page.unwrap_or(config.listing.per_page))?;
            if out.json {
                out.ok(&papers)?;
            } else if papers.total == 0 {
                println!("No papers in the catalogue. Use `combo ingest` to add some.");
            } else {
                print_page(&papers);
            }
        }

        Commands::Search { query, page, per_page } => {
            let db = open_db(config)?;
            let results = db.search(&query, page, per_page.unwrap_or(config.listing.per_page))?;
            if out.json {
                out.ok(json!({ "query": query, "results": results }))?;
            } else if results.total == 0 {
                println!("No results for: {query}");
            } else {
                println!("Found {} results:", results.total);
                print_page(&results);
            }
        }

        // ── Papers ─────────────────────────────────────────────────────────

        Commands::Paper { action } => match action {
            PaperAction::Get { id, linkify } => {
                let db = open_db(config)?;
                let paper = db.get_paper(&id)?;
                show_paper(&db, config, out, &paper, linkify)?;
            }

            PaperAction::Delete { id, confirm } => {
                if !confirm {
                    return Err(ComboError::ValidationError(
                        "add --confirm to delete a paper".to_string(),
                    )
                    .into());
                }
                let db = open_db(config)?;
                db.delete_paper(&id)?;
                if out.json {
                    out.ok(json!({ "deleted": id }))?;
                } else {
                    println!("Deleted paper: {id}");
                }
            }

            PaperAction::Retag { id } => {
                let db = open_db(config)?;
                let paper = db.get_paper(&id)?;
                let outcome = tag_applier(config)?.retag(&db, paper.id)?;
                if out.json {
                    out.ok(&outcome)?;
                } else {
                    println!(
                        "{}: {} arxiv, {} msc, {} new keyword tags",
                        paper.arxiv_id, outcome.arxiv_tags, outcome.msc_tags, outcome.keyword_tags
                    );
                }
            }
        },

        // ── Authors ────────────────────────────────────────────────────────

        Commands::Author { key, page, per_page, bibtex } => {
            let db = open_db(config)?;
            let author = db.find_author(&key)?;
            if bibtex {
                let papers = db.all_papers_by_author(author.id)?;
                let entries = bibtex::author_bibliography(&papers);
                if out.json {
                    out.ok(json!({ "author": author, "bibtex": entries }))?;
                } else {
                    println!("{entries}");
                }
            } else {
                let papers =
                    db.papers_by_author(author.id, page, per_page.unwrap_or(config.listing.per_page))?;
                if out.json {
                    out.ok(json!({ "author": author, "papers": papers }))?;
                } else {
                    println!("{} ({} papers)", author.name, papers.total);
                    print_page(&papers);
                }
            }
        }

        // ── Browsing ───────────────────────────────────────────────────────

        Commands::Browse { year } => {
            let db = open_db(config)?;
            let years = db.available_years()?;
            let year = year
                .or_else(|| years.first().map(|(y, _)| *y))
                .unwrap_or_else(|| Utc::now().year());
            let months = year_calendar(year, &db.counts_for_year(year)?);

            if out.json {
                let years: Vec<_> = years
                    .iter()
                    .map(|(y, count)| json!({ "year": y, "count": count }))
                    .collect();
                out.ok(json!({ "year": year, "years": years, "months": months }))?;
            } else {
                println!("{year}\n");
                for month in &months {
                    println!("{}", render_month(month));
                }
                let summary: Vec<String> =
                    years.iter().map(|(y, count)| format!("{y} ({count})")).collect();
                if !summary.is_empty() {
                    println!("Years: {}", summary.join(", "));
                }
            }
        }

        Commands::Date { day } => {
            let db = open_db(config)?;
            let papers = db.papers_on(day)?;
            if out.json {
                out.ok(json!({ "date": day, "papers": papers }))?;
            } else if papers.is_empty() {
                println!("No papers published on {day}.");
            } else {
                println!("{} papers published on {day}:", papers.len());
                for paper in &papers {
                    print_paper_line(paper);
                }
            }
        }

        Commands::Random => {
            let db = open_db(config)?;
            let id = db
                .random_arxiv_id()?
                .ok_or_else(|| ComboError::PaperNotFound("the catalogue is empty".to_string()))?;
            let paper = db.get_paper(&id)?;
            show_paper(&db, config, out, &paper, false)?;
        }

        // ── BibTeX ─────────────────────────────────────────────────────────

        Commands::Bibtex { input, published } => {
            let id = match BibInput::parse(&input)? {
                BibInput::Arxiv(id) => id,
                BibInput::Doi(doi) => {
                    return Err(ComboError::ValidationError(format!(
                        "DOI lookups need network access; pass the arXiv id instead of {doi}"
                    ))
                    .into());
                }
            };
            let db = open_db(config)?;
            let paper = db.get_paper(&id.id)?;
            let entry = if published {
                paper.to_published_bibtex().ok_or_else(|| {
                    ComboError::ValidationError(format!("{} has no DOI", paper.arxiv_id))
                })?
            } else {
                paper.to_bibtex()
            };
            if out.json {
                out.ok(json!({ "arxiv_id": paper.arxiv_id, "bibtex": entry }))?;
            } else {
                println!("{entry}");
            }
        }

        // ── Tags ───────────────────────────────────────────────────────────

        Commands::Tag { action } => run_tag(action, config, out)?,

        // ── Keyword linking ────────────────────────────────────────────────

        Commands::Linkify { text, file } => {
            let dictionary = require_dictionary(config)?;
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => read_input("-")?,
            };
            let linked = Linkifier::new(&dictionary).linkify(&text);
            if out.json {
                out.ok(&linked)?;
            } else {
                println!("{}", linked.html);
            }
        }

        Commands::Msc { text } => {
            let text = match text {
                Some(text) => text,
                None => read_input("-")?,
            };
            let codes = extract_msc_codes(&text);
            if out.json {
                out.ok(json!({ "codes": codes }))?;
            } else {
                for code in &codes {
                    println!("{code}");
                }
            }
        }

        Commands::Dict { action } => match action {
            DictAction::Check { path } => {
                let path = path.or_else(|| config.dictionary_path()).ok_or_else(|| {
                    ComboError::ConfigError("no keyword dictionary configured".to_string())
                })?;
                let dictionary = KeywordDictionary::load(&path)?;
                let surfaces = dictionary.surface_forms().count();
                let tagged = dictionary.iter().filter(|e| e.tag.is_some()).count();
                if out.json {
                    out.ok(json!({
                        "path": path,
                        "entries": dictionary.len(),
                        "surfaces": surfaces,
                        "tagged": tagged,
                    }))?;
                } else {
                    println!(
                        "{}: {} entries, {} surface forms, {} tagged",
                        path.display(),
                        dictionary.len(),
                        surfaces,
                        tagged
                    );
                }
            }
        },

        Commands::Keywords { action } => match action {
            KeywordsAction::Discover { min_count, max_ngram, output } => {
                let options = DiscoveryOptions {
                    min_count: min_count.unwrap_or(config.keywords.min_count),
                    max_ngram: max_ngram.unwrap_or(config.keywords.max_ngram),
                };
                let output = output.unwrap_or_else(|| config.keywords.output.clone());

                let db = open_db(config)?;
                let texts = db.paper_texts()?;
                let candidates = discover(
                    texts.iter().map(|(title, abstract_text)| format!("{title} {abstract_text}")),
                    &options,
                );

                if output == "-" {
                    if out.json {
                        out.ok(json!({ "papers": texts.len(), "candidates": candidates }))?;
                    } else {
                        write_csv(io::stdout().lock(), &candidates)?;
                    }
                } else {
                    let file = File::create(&output).with_context(|| format!("creating {output}"))?;
                    write_csv(BufWriter::new(file), &candidates)?;
                    if out.json {
                        out.ok(json!({
                            "papers": texts.len(),
                            "candidates": candidates.len(),
                            "output": output,
                        }))?;
                    } else {
                        println!(
                            "Wrote {} candidate phrases from {} papers to {output}",
                            candidates.len(),
                            texts.len()
                        );
                    }
                }
            }
        },

        // ── Config ─────────────────────────────────────────────────────────

        Commands::Config { action } => match action {
            ConfigAction::List => {
                let values = config_key_values(config);
                if out.json {
                    out.ok(&values)?;
                } else {
                    for (key, value) in &values {
                        println!("{key:<28} {value}");
                    }
                }
            }
            ConfigAction::Path => {
                let path = AppConfig::config_path();
                if out.json {
                    out.ok(json!({ "path": path, "exists": path.exists() }))?;
                } else {
                    println!("{}", path.display());
                }
            }
            ConfigAction::Get { key } => {
                let values = config_key_values(config);
                let value = values
                    .get(key.as_str())
                    .ok_or_else(|| ComboError::ConfigError(format!("unknown config key: {key}")))?;
                if out.json {
                    out.ok(json!({ "key": key, "value": value }))?;
                } else {
                    println!("{value}");
                }
            }
            ConfigAction::Init { force } => {
                let path = AppConfig::config_path();
                if path.exists() && !force {
                    return Err(ComboError::ValidationError(format!(
                        "{} already exists; add --force to overwrite",
                        path.display()
                    ))
                    .into());
                }
                config.save_to(&path)?;
                if out.json {
                    out.ok(json!({ "path": path }))?;
                } else {
                    println!("Wrote {}", path.display());
                }
            }
        },

        // ── Maintenance ────────────────────────────────────────────────────

        Commands::Stats => {
            let db = open_db(config)?;
            let stats = db.stats()?;
            if out.json {
                out.ok(&stats)?;
            } else {
                println!("Catalogue statistics:");
                println!("  Papers:           {}", stats.papers);
                println!("  Published:        {}", stats.published);
                println!("  Authors:          {}", stats.authors);
                if let Some(latest) = stats.latest_published {
                    println!("  Latest paper:     {}", latest.format("%Y-%m-%d"));
                }
                for (tag_type, count) in &stats.tags {
                    println!("  {:<17} {count}", format!("{tag_type} tags:"));
                }
            }
        }

        Commands::BackfillSlugs => {
            let db = open_db(config)?;
            let updated = db.backfill_author_slugs()?;
            if out.json {
                out.ok(json!({ "updated": updated }))?;
            } else {
                println!("Filled {updated} author slugs.");
            }
        }

        Commands::Version => {
            let version = env!("CARGO_PKG_VERSION");
            if out.json {
                out.ok(json!({ "version": version }))?;
            } else {
                println!("combo v{version}");
            }
        }
    }

    Ok(())
}

fn run_tag(action: TagAction, config: &AppConfig, out: &Output) -> Result<()> {
    match action {
        TagAction::List { tag_type } => {
            let db = open_db(config)?;
            let tags = db.list_tags(tag_type)?;
            if out.json {
                out.ok(json!({ "items": tags, "total": tags.len() }))?;
            } else if tags.is_empty() {
                println!("No tags.");
            } else {
                for tag in &tags {
                    println!("{:<9} {:<40} {}", tag.tag_type, tag.name, tag.paper_count);
                }
            }
        }

        TagAction::Add { arxiv_id, name, tag_type } => {
            ensure_manual(tag_type)?;
            let db = open_db(config)?;
            let added = db.add_tag(&arxiv_id, &name, tag_type)?;
            if out.json {
                out.ok(json!({ "arxiv_id": arxiv_id, "tag": name, "type": tag_type, "added": added }))?;
            } else if added {
                println!("Tagged {arxiv_id} with {tag_type}:{name}");
            } else {
                println!("{arxiv_id} already has {tag_type}:{name}");
            }
        }

        TagAction::Remove { arxiv_id, name, tag_type } => {
            ensure_manual(tag_type)?;
            let db = open_db(config)?;
            let removed = db.remove_tag(&arxiv_id, &name, tag_type)?;
            if out.json {
                out.ok(json!({ "arxiv_id": arxiv_id, "tag": name, "type": tag_type, "removed": removed }))?;
            } else if removed {
                println!("Removed {tag_type}:{name} from {arxiv_id}");
            } else {
                println!("{arxiv_id} does not have {tag_type}:{name}");
            }
        }

        TagAction::Papers { name, tag_type, page, per_page } => {
            let db = open_db(config)?;
            let papers =
                db.papers_with_tag(&name, tag_type, page, per_page.unwrap_or(config.listing.per_page))?;
            if out.json {
                out.ok(json!({ "tag": name, "type": tag_type, "papers": papers }))?;
            } else if papers.total == 0 {
                println!("No papers tagged {tag_type}:{name}");
            } else {
                print_page(&papers);
            }
        }

        TagAction::Delete { name, tag_type, confirm } => {
            if !confirm {
                return Err(
                    ComboError::ValidationError("add --confirm to delete a tag".to_string()).into()
                );
            }
            let db = open_db(config)?;
            db.delete_tag(&name, tag_type)?;
            if out.json {
                out.ok(json!({ "deleted": name, "type": tag_type }))?;
            } else {
                println!("Deleted tag {tag_type}:{name}");
            }
        }

        TagAction::Backfill => {
            let db = open_db(config)?;
            let report = tag_applier(config)?.backfill(&db)?;
            if out.json {
                out.ok(&report)?;
            } else {
                println!("Retagged {} papers ({} failed).", report.processed, report.failed);
                for (paper_id, message) in &report.failures {
                    eprintln!("  paper {paper_id}: {message}");
                }
            }
        }
    }

    Ok(())
}

// ─── Output ─────────────────────────────────────────────────────────────────

struct Output {
    json: bool,
    start: Instant,
}

impl Output {
    fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    /// Print the `{"status":"ok",...}` envelope around `data`.
    fn ok<T: Serialize>(&self, data: T) -> Result<()> {
        print_json(&json!({
            "status": "ok",
            "data": serde_json::to_value(data)?,
            "meta": { "duration_ms": self.elapsed_ms() }
        }))
    }
}

fn show_paper(db: &Database, config: &AppConfig, out: &Output, paper: &Paper, linkify: bool) -> Result<()> {
    let tags = db.tags_for_paper(paper.id)?;
    let abstract_html = if linkify {
        let dictionary = require_dictionary(config)?;
        Some(Linkifier::new(&dictionary).linkify(&paper.abstract_text).html)
    } else {
        None
    };

    if out.json {
        return out.ok(json!({ "paper": paper, "tags": tags, "abstract_html": abstract_html }));
    }

    println!("{}  {}", paper.arxiv_id, paper.title);
    println!("Authors:    {}", paper.authors.join(", "));
    println!("Published:  {}", paper.published.format("%Y-%m-%d"));
    println!("Categories: {}", paper.categories.join(" "));
    if let Some(comment) = &paper.comment {
        println!("Comment:    {comment}");
    }
    if let Some(journal_ref) = &paper.journal_ref {
        println!("Journal:    {journal_ref}");
    }
    if let Some(doi) = &paper.doi {
        println!("DOI:        {doi}");
    }
    if !tags.is_empty() {
        let names: Vec<String> = tags.iter().map(|t| format!("{}:{}", t.tag_type, t.name)).collect();
        println!("Tags:       {}", names.join(", "));
    }
    println!();
    println!("{}", abstract_html.as_deref().unwrap_or(&paper.abstract_text));
    Ok(())
}

fn print_paper_line(paper: &Paper) {
    println!(
        "{:<18} {}  {}",
        paper.arxiv_id,
        paper.published.format("%Y-%m-%d"),
        paper.title
    );
    if !paper.authors.is_empty() {
        println!("{:<30}{}", "", paper.authors.join(", "));
    }
}

fn print_page(page: &Page<Paper>) {
    for paper in &page.items {
        print_paper_line(paper);
    }
    if page.total_pages > 1 {
        println!("\nPage {} of {} ({} papers)", page.page, page.total_pages, page.total);
    }
}

/// Month grid with `*` marking days that have papers.
fn render_month(month: &MonthCalendar) -> String {
    let mut text = format!("{} ({} papers)\nMo  Tu  We  Th  Fr  Sa  Su\n", month.name, month.total());
    for week in &month.weeks {
        let cells: Vec<String> = week
            .iter()
            .map(|d| match (d.day, d.count) {
                (0, _) => "   ".to_string(),
                (day, 0) => format!("{day:>2} "),
                (day, _) => format!("{day:>2}*"),
            })
            .collect();
        text.push_str(cells.join(" ").trim_end());
        text.push('\n');
    }
    text
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn open_db(config: &AppConfig) -> Result<Database> {
    Ok(Database::open(&config.database_path())?)
}

fn load_dictionary(config: &AppConfig) -> Result<Option<KeywordDictionary>> {
    match config.dictionary_path() {
        Some(path) => Ok(Some(KeywordDictionary::load(&path)?)),
        None => Ok(None),
    }
}

fn require_dictionary(config: &AppConfig) -> Result<KeywordDictionary> {
    load_dictionary(config)?.ok_or_else(|| {
        ComboError::ConfigError(
            "no keyword dictionary configured; set tagging.dictionary_path or COMBO_DICTIONARY"
                .to_string(),
        )
        .into()
    })
}

/// Tag applier honouring the configured exclusions and, when a dictionary
/// is configured, attaching keyword tags. A broken dictionary is fatal.
fn tag_applier(config: &AppConfig) -> Result<TagApplier> {
    let applier =
        TagApplier::new().with_excluded_categories(config.tagging.excluded_categories.clone());
    Ok(match load_dictionary(config)? {
        Some(dictionary) => applier.with_linkifier(Linkifier::new(&dictionary)),
        None => applier,
    })
}

fn ensure_manual(tag_type: TagType) -> Result<()> {
    if tag_type.is_derived() {
        return Err(ComboError::ValidationError(format!(
            "{tag_type} tags are derived from paper metadata; use `combo paper retag`"
        ))
        .into());
    }
    Ok(())
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(Path::new(source)).with_context(|| format!("reading {source}"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IngestBatch {
    Many(Vec<NewPaper>),
    One(Box<NewPaper>),
}

fn read_ingest_batch(json: &str) -> Result<Vec<NewPaper>> {
    let batch: IngestBatch = serde_json::from_str(json).context("parsing paper metadata")?;
    Ok(match batch {
        IngestBatch::Many(papers) => papers,
        IngestBatch::One(paper) => vec![*paper],
    })
}

fn config_key_values(config: &AppConfig) -> BTreeMap<&'static str, String> {
    let mut map = BTreeMap::new();
    map.insert("core.data_dir", config.core.data_dir.clone());
    map.insert("database_path", config.database_path().to_string_lossy().to_string());
    map.insert(
        "tagging.dictionary_path",
        config.tagging.dictionary_path.clone().unwrap_or_default(),
    );
    map.insert(
        "tagging.excluded_categories",
        config.tagging.excluded_categories.join(","),
    );
    map.insert("listing.per_page", config.listing.per_page.to_string());
    map.insert("keywords.min_count", config.keywords.min_count.to_string());
    map.insert("keywords.max_ngram", config.keywords.max_ngram.to_string());
    map.insert("keywords.output", config.keywords.output.clone());
    map
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if let Some(e) = err.downcast_ref::<ComboError>() {
        return e.exit_code();
    }
    if let Some(e) = err.downcast_ref::<ScienceError>() {
        return e.exit_code();
    }
    if err.downcast_ref::<io::Error>().is_some() {
        return ExitCode::FileSystemError;
    }
    ExitCode::GeneralError
}

fn error_kind(code: ExitCode) -> &'static str {
    match code {
        ExitCode::NotFound => "not_found",
        ExitCode::InvalidArgs => "invalid_args",
        ExitCode::FileSystemError => "filesystem",
        ExitCode::DictionaryError => "dictionary",
        ExitCode::Success | ExitCode::GeneralError => "error",
    }
}
