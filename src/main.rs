use clap::{ArgAction, Parser, Subcommand};
use clap::builder::FalseyValueParser;
use std::error::Error;
use std::io::{self, Write};
use std::path::{PathBuf, absolute};
use zs::cancel::CancelToken;
use zs::config::{self, MarkdownExtension, Overrides, SiteConfig};
use zs::paths::SitePaths;
use zs::plugin::ProcessHost;
use zs::render::Renderer;
use zs::vars::{self, Resolver};
use zs::watch::Scheduler;
use zs::{logging, output};

fn version_string() -> &'static str {
    if env!("ON_RELEASE_TAG") == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    match env!("GIT_HASH") {
        "" => "dev@unknown",
        // Leaked once at startup
        hash => Box::leak(format!("dev@{hash}").into_boxed_str()),
    }
}

#[derive(Parser)]
#[command(name = "zs")]
#[command(about = "Zen static site generator")]
#[command(long_about = "\
Zen static site generator

Keep your texts in markdown or HTML right in the site directory, and all
service files (layouts, partials, plugins, config) in .zs/. The site is
mirrored into .pub/.

Site structure:

  site/
  ├── .zs/
  │   ├── config.toml      # Site config (optional)
  │   ├── layout.html      # Default layout: <% title %>, <% content %>
  │   ├── footer.html      # Partial: {{ footer }} is replaced by this file
  │   ├── toc              # Plugin: {{ toc 3 }} runs it, stdout is inserted
  │   ├── prehook          # Runs before a rebuild
  │   └── posthook         # Runs after a rebuild
  ├── .zsignore            # Files to skip (gitignore syntax)
  ├── index.md             # → .pub/index.html through the layout
  ├── feed.xml             # → .pub/feed.xml, macros and <% %> expanded
  └── img/logo.png         # → .pub/img/logo.png, copied as is

Variables come from the file name (title, url, file, output), from the
config and flags, from ZS_* environment variables, and from YAML front
matter above a --- line. Plugins see them as ZS_* environment variables.

Run 'zs gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file [default: <root>/.zs/config.toml]
    #[arg(long, short = 'C', global = true)]
    config: Option<PathBuf>,

    /// Production mode: hide "plugin or variable not found" markers
    #[arg(long, short = 'p', global = true, env = "ZS_PRODUCTION",
          action = ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
    production: bool,

    /// Site title
    #[arg(long, short = 't', global = true, env = "ZS_TITLE")]
    title: Option<String>,

    /// Site description
    #[arg(long, short = 'd', global = true, env = "ZS_DESCRIPTION")]
    description: Option<String>,

    /// Site keywords
    #[arg(long, short = 'k', global = true, env = "ZS_KEYWORDS")]
    keywords: Option<String>,

    /// Extra variable, repeatable
    #[arg(long = "var", short = 'v', value_name = "NAME=VALUE", global = true,
          value_parser = parse_var)]
    vars: Vec<(String, String)>,

    /// Opening macro delimiter
    #[arg(long = "open", short = 'o', value_name = "DELIM", global = true)]
    opening_delimiter: Option<String>,

    /// Closing macro delimiter
    #[arg(long = "close", short = 'c', value_name = "DELIM", global = true)]
    closing_delimiter: Option<String>,

    /// Markdown extension to enable instead of the configured set, repeatable
    /// or comma-separated (tables, footnotes, strikethrough, tasklists,
    /// heading-attributes, smart-punctuation, wikilinks)
    #[arg(long = "extension", short = 'e', value_name = "EXT", global = true,
          value_delimiter = ',')]
    extensions: Vec<MarkdownExtension>,

    /// Debug logging (ZS_LOG overrides)
    #[arg(long, short = 'D', global = true, env = "ZS_DEBUG",
          action = ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the whole site, or render a single file to stdout
    Build {
        /// File to render instead of the whole site
        file: Option<PathBuf>,
    },
    /// Rebuild changed files until interrupted
    Watch,
    /// Render a markdown fragment from stdin to stdout
    #[command(alias = "generate")]
    Gen,
    /// Print the variables of a file
    #[command(alias = "vars")]
    Var {
        file: PathBuf,
        /// Only print these variables, one value per line
        names: Vec<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got {s:?}")),
    }
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            title: self.title.clone(),
            description: self.description.clone(),
            keywords: self.keywords.clone(),
            production: self.production,
            vars: self.vars.clone(),
            opening_delimiter: self.opening_delimiter.clone(),
            closing_delimiter: self.closing_delimiter.clone(),
            extensions: self.extensions.clone(),
        }
    }

    /// Load and validate the config with command-line overrides applied.
    fn site_config(&self, paths: &SitePaths) -> Result<SiteConfig, config::ConfigError> {
        let path = self.config.clone().unwrap_or_else(|| paths.config_file());
        let mut config = config::load_config(&path)?;
        config.apply(self.overrides());
        config.validate()?;
        Ok(config)
    }
}

/// Everything a command needs to build the site.
fn load_site(cli: &Cli) -> Result<(SiteConfig, Renderer<ProcessHost>), Box<dyn Error>> {
    let paths = SitePaths::new(absolute(&cli.root)?);
    let config = cli.site_config(&paths)?;
    let globals = vars::globals(&config, vars::environment());
    let resolver = Resolver::new(paths.clone(), globals);
    let renderer = Renderer::new(&config, resolver, ProcessHost::new(paths))?;
    Ok((config, renderer))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    match &cli.command {
        Command::Build { file: None } => {
            let (config, renderer) = load_site(&cli)?;
            let mut scheduler = Scheduler::new(renderer, config.watch.interval());
            let report = scheduler.run_once()?;
            output::print_cycle(&report);
            if !report.is_success() {
                return Err(format!("{} file(s) failed to build", report.failed.len()).into());
            }
        }
        Command::Build { file: Some(file) } => {
            let (_, renderer) = load_site(&cli)?;
            let mut stdout = io::stdout().lock();
            renderer.build(&absolute(file)?, Some(&mut stdout))?;
            stdout.flush()?;
        }
        Command::Watch => {
            let (config, renderer) = load_site(&cli)?;
            let cancel = CancelToken::new();
            let handler = cancel.clone();
            ctrlc::set_handler(move || handler.cancel())?;

            let mut scheduler = Scheduler::new(renderer, config.watch.interval());
            scheduler.watch(&cancel, |report| {
                if report.modified() || report.reset {
                    output::print_cycle(report);
                }
            });
        }
        Command::Gen => {
            let (_, renderer) = load_site(&cli)?;
            let mut stdout = io::stdout().lock();
            renderer.generate(&mut io::stdin().lock(), &mut stdout)?;
            stdout.flush()?;
        }
        Command::Var { file, names, json } => {
            let (_, renderer) = load_site(&cli)?;
            let vars = renderer.vars_for(&absolute(file)?)?;
            if *json {
                println!("{}", output::format_vars_json(&vars, names)?);
            } else {
                output::print_vars(&vars, names);
            }
        }
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }

    Ok(())
}
