use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use jk_rewrite::config::{compile_each, load_from_path, RuleMatch, RuleSet};
use jk_rewrite::patch::{FileOutcome, FileRewrite};
use jk_rewrite::safety::{WorkspaceGuard, BUILD_DIRS};
use jk_rewrite::{pool, Language, NodeType, Rewriter, Template};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "jk-rewrite")]
#[command(about = "Structural search and rewrite for Java and Kotlin", long_about = None)]
#[command(version)]
struct Cli {
    /// Log rewrite passes and template compilation to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report every match of the rules
    Search {
        /// Files or directories to scan
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        rules: RuleArgs,

        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite files in place
    Rewrite {
        /// Files or directories to rewrite
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        rules: RuleArgs,

        /// Replacement for --template
        #[arg(short, long, requires = "template")]
        replacement: Option<String>,

        /// Workspace root (defaults to JK_REWRITE_WORKSPACE, then the current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Show what would change without writing files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Allow rewrites that introduce syntax errors
        #[arg(long)]
        no_validate: bool,
    },

    /// Load and compile a rule file
    Check {
        #[arg(long)]
        rules: PathBuf,
    },
}

#[derive(Args)]
struct RuleArgs {
    /// TOML rule file
    #[arg(long, conflicts_with = "template", required_unless_present = "template")]
    rules: Option<PathBuf>,

    /// Inline template, e.g. "invoke(#x?#)"
    #[arg(short, long, requires = "language")]
    template: Option<String>,

    /// Language of --template (java or kotlin)
    #[arg(short, long)]
    language: Option<Language>,

    /// Node type the --template root must have
    #[arg(short, long, default_value = "any")]
    kind: NodeType,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides; --verbose => debug; else warn
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "jk_rewrite=debug"
        } else {
            "jk_rewrite=warn"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match cli.command {
        Commands::Search { paths, rules, json } => cmd_search(&paths, &rules, json),
        Commands::Rewrite {
            paths,
            rules,
            replacement,
            workspace,
            dry_run,
            diff,
            no_validate,
        } => cmd_rewrite(
            &paths,
            &rules,
            replacement.as_deref(),
            workspace,
            dry_run,
            diff,
            !no_validate,
        ),
        Commands::Check { rules } => cmd_check(&rules),
    }
}

/// Build the rule set from a rule file or an inline template.
fn load_rules(args: &RuleArgs, replacement: Option<&str>) -> Result<RuleSet> {
    if let Some(path) = &args.rules {
        let config = load_from_path(path)?;
        return Ok(RuleSet::compile(&config)?);
    }

    let (Some(snippet), Some(language)) = (&args.template, args.language) else {
        anyhow::bail!("either --rules or --template with --language is required");
    };
    let matcher = Template::new(language, args.kind, snippet.as_str()).compile()?;
    Ok(RuleSet::single("inline", language, matcher, replacement)?)
}

/// Java and Kotlin sources under `paths`, skipping VCS and build output.
fn discover_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(entry.depth() > 0
                && entry.file_type().is_dir()
                && (name == ".git" || BUILD_DIRS.contains(&name.as_ref())))
        });
        for entry in walker {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            if entry.file_type().is_file() && Language::from_path(entry.path()).is_some() {
                files.push(entry.path().to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Resolve workspace path
///
/// Priority order:
/// 1. Explicit --workspace flag
/// 2. JK_REWRITE_WORKSPACE environment variable
/// 3. Current directory
fn resolve_workspace(cli_workspace: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_workspace {
        return Ok(path.canonicalize()?);
    }

    if let Ok(env_path) = env::var("JK_REWRITE_WORKSPACE") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!("Warning: JK_REWRITE_WORKSPACE is set but path doesn't exist: {env_path}")
                .yellow()
        );
    }

    Ok(env::current_dir()?.canonicalize()?)
}

fn display_diff(file: &Path, original: &str, modified: &str) {
    println!("\n{}", format!("--- {} (original)", file.display()).dimmed());
    println!("{}", format!("+++ {} (rewritten)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{change}").red(),
            ChangeTag::Insert => format!("+{change}").green(),
            ChangeTag::Equal => format!(" {change}").normal(),
        };
        print!("{sign}");
    }
}

#[derive(Serialize)]
struct FileMatch<'a> {
    file: &'a Path,
    #[serde(flatten)]
    hit: &'a RuleMatch,
}

fn cmd_search(paths: &[PathBuf], args: &RuleArgs, json: bool) -> Result<()> {
    let rules = load_rules(args, None)?;
    let files = discover_sources(paths)?;

    let mut hits: Vec<(PathBuf, RuleMatch)> = Vec::new();
    let mut failed = 0;
    for file in &files {
        let Some(language) = Language::from_path(file) else {
            continue;
        };
        let parsed = fs::read_to_string(file)
            .map_err(anyhow::Error::from)
            .and_then(|source| Ok(pool::parse(language, source)?));
        match parsed {
            Ok(tree) => hits.extend(rules.search(&tree).into_iter().map(|hit| (file.clone(), hit))),
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                failed += 1;
            }
        }
    }

    if json {
        let rows: Vec<FileMatch<'_>> = hits
            .iter()
            .map(|(file, hit)| FileMatch { file, hit })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for (file, hit) in &hits {
            println!(
                "{}:{}:{} {} {}",
                file.display(),
                hit.line,
                hit.column,
                format!("[{}]", hit.rule_id).cyan(),
                hit.text
            );
        }
        println!();
        println!(
            "{} matches in {} files",
            format!("{}", hits.len()).green(),
            files.len()
        );
    }

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_rewrite(
    paths: &[PathBuf],
    args: &RuleArgs,
    replacement: Option<&str>,
    workspace: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
    validate: bool,
) -> Result<()> {
    if args.template.is_some() && replacement.is_none() {
        anyhow::bail!("--template needs --replacement when rewriting");
    }
    let rules = load_rules(args, replacement)?;
    let workspace = resolve_workspace(workspace)?;
    let guard = WorkspaceGuard::new(&workspace)?;
    let rewriter = Rewriter::new().validate_syntax(validate);

    println!("Workspace: {}", workspace.display());
    if dry_run {
        println!("{}", "[DRY RUN - no files will be written]".cyan());
    }
    println!();

    let mut rewritten = 0;
    let mut unchanged = 0;
    let mut failed = 0;

    for file in discover_sources(paths)? {
        match rewrite_file(&file, &rules, &rewriter, &guard, dry_run, show_diff) {
            Ok(true) => rewritten += 1,
            Ok(false) => unchanged += 1,
            Err(e) => {
                eprintln!("{} {}: {:#}", "✗".red(), file.display(), e);
                failed += 1;
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    let verb = if dry_run { "would be rewritten" } else { "rewritten" };
    println!("  {} {verb}", format!("{rewritten}").green());
    println!("  {} unchanged", format!("{unchanged}").yellow());
    println!("  {} failed", format!("{failed}").red());

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Returns whether the file changed (or would change, in a dry run).
fn rewrite_file(
    file: &Path,
    rules: &RuleSet,
    rewriter: &Rewriter,
    guard: &WorkspaceGuard,
    dry_run: bool,
    show_diff: bool,
) -> Result<bool> {
    let path = guard.validate_path(file)?;
    let Some(language) = Language::from_path(&path) else {
        return Ok(false);
    };
    let before = fs::read_to_string(&path)?;
    let tree = pool::parse(language, before.clone())?;
    let (tree, outcomes) = rules.rewrite(tree, rewriter)?;
    let after = tree.into_source();
    if after == before {
        return Ok(false);
    }

    for outcome in &outcomes {
        println!(
            "{} {}: {} replacements in {}",
            "✓".green(),
            outcome.rule_id,
            outcome.replacements,
            file.display()
        );
    }
    if show_diff {
        display_diff(file, &before, &after);
    }
    if dry_run {
        return Ok(true);
    }

    match FileRewrite::new(&path, &before, after).apply()? {
        FileOutcome::Written { .. } => Ok(true),
        FileOutcome::Unchanged { .. } => Ok(false),
    }
}

fn cmd_check(path: &Path) -> Result<()> {
    let config = load_from_path(path)?;
    println!("Checking rules from {}...", path.display());

    let mut ok = 0;
    let mut failed = 0;
    for result in compile_each(&config) {
        match result {
            Ok(rule) => {
                let mode = if rule.rewrite.is_some() { "rewrite" } else { "search" };
                println!("{} {} ({}, {mode})", "✓".green(), rule.id, rule.language);
                ok += 1;
            }
            Err(e) => {
                eprintln!("{} {}", "✗".red(), e);
                failed += 1;
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} compiled", format!("{ok}").green());
    println!("  {} failed", format!("{failed}").red());

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
