use clap::{Args, Parser as ClapParser, Subcommand};
use std::io::{self, Read};
use trellis::Options;
use trellis::cli::{
    self, CheckOptions, CheckResult, CliError, DocumentFormat, EvalOptions, PruneOptions,
    SelectOptions,
};
use trellis::options::DEFAULT_REGEX_CACHE_CAPACITY;

#[derive(ClapParser)]
#[command(name = "trellis")]
#[command(about = "Trellis - typed expressions, path selection and pruning for annotated documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DocumentArgs {
    /// Document text (reads from stdin if not provided)
    #[arg(short, long)]
    input: Option<String>,

    /// Read and write JSON instead of the native text form
    #[arg(long)]
    json: bool,

    /// Pretty-print the output
    #[arg(short, long)]
    pretty: bool,

    /// Number of compiled regexes to keep
    #[arg(long, default_value_t = DEFAULT_REGEX_CACHE_CAPACITY)]
    regex_cache_size: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression against a document
    Eval {
        expression: String,
        #[command(flatten)]
        document: DocumentArgs,
    },

    /// Select a value by path
    Select {
        path: String,
        /// Treat the path as a query and print every match
        #[arg(short, long)]
        all: bool,
        #[command(flatten)]
        document: DocumentArgs,
    },

    /// Prune a document to the given paths
    Prune {
        /// Comma or whitespace separated paths
        paths: String,
        /// Only check that the document has every required part
        #[arg(long)]
        validate: bool,
        #[command(flatten)]
        document: DocumentArgs,
    },

    /// Parse and kind-check an expression without evaluating it
    Check {
        expression: String,
        /// Check a query path instead of an expression
        #[arg(short, long)]
        query: bool,
    },

    /// Show documentation (all topics, or one)
    Docs { topic: Option<String> },
}

impl DocumentArgs {
    fn format(&self) -> DocumentFormat {
        DocumentFormat {
            json: self.json,
            pretty: self.pretty,
        }
    }

    fn options(&self) -> Options {
        Options::default().with_regex_cache_capacity(self.regex_cache_size)
    }

    /// The --input text, or stdin when it is piped.
    fn input(&self) -> Result<Option<String>, CliError> {
        match &self.input {
            Some(s) => Ok(Some(s.clone())),
            None if !atty::is(atty::Stream::Stdin) => {
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer)?;
                Ok(Some(buffer))
            }
            None => Ok(None),
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval {
            expression,
            document,
        } => run_eval(expression, document),
        Commands::Select {
            path,
            all,
            document,
        } => run_select(path, all, document),
        Commands::Prune {
            paths,
            validate,
            document,
        } => run_prune(paths, validate, document),
        Commands::Check { expression, query } => run_check(expression, query),
        Commands::Docs { topic: None } => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Docs { topic: Some(topic) } => cli::get_doc_topic(&topic).map(|content| {
            print!("{}", content);
        }),
    };

    if let Err(e) = result {
        log::debug!("{e:?}");
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_eval(expression: String, document: DocumentArgs) -> Result<(), CliError> {
    let format = document.format();
    let options = EvalOptions {
        expression,
        input: document.input()?,
        format: format.clone(),
        options: document.options(),
    };
    println!("{}", format.write(&cli::execute_eval(&options)?)?);
    Ok(())
}

fn run_select(path: String, all: bool, document: DocumentArgs) -> Result<(), CliError> {
    let format = document.format();
    let options = SelectOptions {
        path,
        input: document.input()?,
        all,
        format: format.clone(),
        options: document.options(),
    };
    println!("{}", format.write(&cli::execute_select(&options)?)?);
    Ok(())
}

fn run_prune(paths: String, validate: bool, document: DocumentArgs) -> Result<(), CliError> {
    let format = document.format();
    let options = PruneOptions {
        paths,
        input: document.input()?,
        validate_only: validate,
        format: format.clone(),
        options: document.options(),
    };
    let pruned = cli::execute_prune(&options)?;
    if validate {
        println!("Document is valid");
    } else {
        println!("{}", format.write(&pruned)?);
    }
    Ok(())
}

fn run_check(expression: String, query: bool) -> Result<(), CliError> {
    let options = CheckOptions {
        expression,
        query,
        options: Options::default(),
    };
    match cli::execute_check(&options)? {
        CheckResult::Expression(kind) => println!("Valid {} expression", kind),
        CheckResult::Query(steps) => println!("Valid query with {} steps", steps),
    }
    Ok(())
}
