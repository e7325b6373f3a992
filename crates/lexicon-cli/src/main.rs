use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use clap::Parser;
use ignore::WalkBuilder;
use lexicon::{Dictionary, ScanConfig, TokenDef, TokenSequence};
use serde::Serialize;

const DEMO_TEXT: &str = "if 1 do 1 2 3 if 4 do 3 2 1 if 5 do 0";

/// Scans text into tokens declared in a rule file.
#[derive(Parser, Debug)]
#[command(name = "lexicon", version)]
struct Args {
    /// File with one `[!]KEY -> RULE` line per token, without it a small demo dictionary is used
    #[arg(short = 't', long = "rules", value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Scan every file under DIR whose name matches PATTERN (`*.ext`)
    #[arg(short = 'f', long, num_args = 2, value_names = ["PATTERN", "DIR"])]
    recursive: Vec<String>,

    /// Like `--recursive`, but only the top directory
    #[arg(short = 'F', long, num_args = 2, value_names = ["PATTERN", "DIR"])]
    top: Vec<String>,

    /// Additional text to scan
    #[arg(short = 's', long = "scan", value_name = "TEXT")]
    scan: Vec<String>,

    /// Files to scan
    files: Vec<PathBuf>,

    /// JSON file with the layout retention flags
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long)]
    keep_whitespace: bool,
    #[arg(long)]
    keep_tabs: bool,
    #[arg(long)]
    keep_newlines: bool,

    /// Print the scanned tokens as JSON
    #[arg(long)]
    json: bool,

    /// Print the compiled expressions before scanning
    #[arg(long)]
    dump: bool,
}

#[derive(Serialize)]
struct SourceView<'a> {
    source: &'a str,
    tokens: Vec<TokenView<'a>>,
}

#[derive(Serialize)]
struct TokenView<'a> {
    key: &'a str,
    code: i16,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

impl<'a> SourceView<'a> {
    fn new(source: &'a str, sequence: &'a TokenSequence<'_>) -> SourceView<'a> {
        let tokens = sequence
            .iter()
            .map(|token| TokenView {
                key: token.key(),
                code: token.code(),
                text: token.text(),
            })
            .collect();
        SourceView { source, tokens }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn init_logging() -> anyhow::Result<()> {
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_owned());
    let level = log::LevelFilter::from_str(&level)
        .with_context(|| format!("Invalid RUST_LOG level `{level}`"))?;

    simplelog::TermLogger::init(
        level,
        simplelog::ConfigBuilder::new()
            .set_time_format_custom(&[])
            .build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Never,
    )
    .context("Failed to initialize logging")
}

fn run() -> anyhow::Result<()> {
    init_logging()?;
    let args = Args::parse();

    let config = load_config(&args)?;
    let dictionary = match &args.rules {
        Some(path) => load_dictionary(path, config)?,
        None => demo_dictionary(config)?,
    };
    log::info!("Dictionary holds {} tokens", dictionary.len());

    if args.dump {
        let mut out = String::new();
        dictionary
            .expressions()
            .display_into(&mut out)
            .context("Failed to display expressions")?;
        print!("{out}");
    }

    let mut sources = collect_sources(&args)?;
    if args.rules.is_none() && sources.is_empty() {
        sources.push(("*demo".to_owned(), DEMO_TEXT.to_owned()));
    }

    let mut sequences = Vec::with_capacity(sources.len());
    for (name, text) in &sources {
        let sequence = dictionary
            .analyze(text)
            .with_context(|| format!("Failed to scan `{name}`"))?;
        sequences.push(sequence);
    }

    if args.json {
        let views: Vec<_> = sources
            .iter()
            .zip(&sequences)
            .map(|((name, _), sequence)| SourceView::new(name, sequence))
            .collect();
        let json = serde_json::to_string_pretty(&views)?;
        println!("{json}");
    } else {
        for ((name, _), sequence) in sources.iter().zip(&sequences) {
            println!("$ {name}");
            println!("{sequence}");
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<ScanConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config `{}`", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config `{}`", path.display()))?
        }
        None => ScanConfig::default(),
    };
    config.keep_whitespace |= args.keep_whitespace;
    config.keep_tabs |= args.keep_tabs;
    config.keep_newlines |= args.keep_newlines;
    Ok(config)
}

fn load_dictionary(path: &Path, config: ScanConfig) -> anyhow::Result<Dictionary> {
    let rules = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules `{}`", path.display()))?;

    let mut dictionary = Dictionary::new().with_config(config);
    dictionary
        .import(rules.lines())
        .with_context(|| format!("Invalid rules in `{}`", path.display()))?;
    dictionary.link().context("Failed to link rules")?;
    Ok(dictionary)
}

fn demo_dictionary(config: ScanConfig) -> anyhow::Result<Dictionary> {
    let digits = (0..10)
        .map(|d| format!("\"{d}\""))
        .collect::<Vec<_>>()
        .join(" | ");

    let mut dictionary = Dictionary::new().with_config(config);
    dictionary.register(TokenDef::rule("Number", "Digit Digit*").keep_text(true))?;
    dictionary.register(TokenDef::rule("Digit", digits))?;
    dictionary.register(TokenDef::rule("KW_IF", "\"if\""))?;
    dictionary.register(TokenDef::rule("KW_DO", "\"do\""))?;
    dictionary.link()?;
    Ok(dictionary)
}

/// Named texts to scan, `--scan` arguments first.
fn collect_sources(args: &Args) -> anyhow::Result<Vec<(String, String)>> {
    let mut sources: Vec<(String, String)> = args
        .scan
        .iter()
        .enumerate()
        .map(|(i, text)| (format!("*scanArgs[{i}]"), text.clone()))
        .collect();

    let mut files = args.files.clone();
    for pair in args.recursive.chunks_exact(2) {
        find_files(&pair[0], Path::new(&pair[1]), true, &mut files)?;
    }
    for pair in args.top.chunks_exact(2) {
        find_files(&pair[0], Path::new(&pair[1]), false, &mut files)?;
    }

    for path in files {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read `{}`", path.display()))?;
        sources.push((path.display().to_string(), text));
    }
    Ok(sources)
}

fn find_files(
    pattern: &str,
    dir: &Path,
    recursive: bool,
    out: &mut Vec<PathBuf>,
) -> anyhow::Result<()> {
    let mut walk = WalkBuilder::new(dir);
    walk.standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b));
    if !recursive {
        walk.max_depth(Some(1));
    }

    let before = out.len();
    for entry in walk.build() {
        let entry = entry.with_context(|| format!("Failed to walk `{}`", dir.display()))?;
        if !entry.file_type().map_or(false, |t| t.is_file()) {
            continue;
        }
        if matches_pattern(pattern, &entry.file_name().to_string_lossy()) {
            out.push(entry.into_path());
        }
    }
    log::debug!(
        "Found {} files matching `{pattern}` in `{}`",
        out.len() - before,
        dir.display()
    );
    Ok(())
}

/// `*` matches any prefix, anything else must match the whole name.
fn matches_pattern(pattern: &str, name: &str) -> bool {
    match pattern.strip_prefix('*') {
        Some(suffix) => name.ends_with(suffix),
        None => name == pattern,
    }
}
