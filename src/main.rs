//! Site Gate - operator tool for provisioning access tokens and signing API requests.

use std::env;
use std::path::Path;
use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sitegate::config::{SecretConfig, Settings};
use sitegate::error::GateError;
use sitegate::guard::{
    derive_site_token, hash_token, is_subdomain, parent_domain, should_guard, FileHashStore,
};
use sitegate::signing::{RequestSigner, SigningPayload};
use sitegate::validation::validate_domain;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

/// Flags that take a separate value argument.
const VALUE_FLAGS: &[&str] = &[
    "--config",
    "-c",
    "--phrase",
    "--out",
    "--key-file",
    "--timestamp",
    "--body",
    "--email",
    "--filename",
];

/// Environment variable consulted when `--phrase` is not given.
const PHRASE_ENV: &str = "SITEGATE_HASH_PHRASE";

fn main() -> ExitCode {
    // Parse command line arguments (simple std::env approach)
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{} {}", NAME, VERSION);
        return ExitCode::SUCCESS;
    }

    let config_path = get_flag(&args, "--config").or_else(|| get_flag(&args, "-c"));
    let settings = match config_path {
        Some(path) => match Settings::load(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading configuration: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };

    if let Err(e) = init_logging(&settings) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&args, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Dispatch a subcommand.
fn run(args: &[String], settings: &Settings) -> Result<(), GateError> {
    let words = positionals(args);
    let command = *words
        .first()
        .ok_or_else(|| usage("a command, see --help"))?;
    let positional = words.get(1).copied();

    match command {
        "hash-token" => {
            let token = positional.ok_or_else(|| usage("hash-token <token>"))?;
            println!("{}", hash_token(token.trim()));
            Ok(())
        }
        "derive-token" => {
            let domain = validate_domain(positional.ok_or_else(|| usage("derive-token <domain>"))?)?;
            let phrase = get_phrase(args)?;
            println!("{}", derive_site_token(domain, &phrase));
            Ok(())
        }
        "provision" => {
            let domain = validate_domain(
                positional.ok_or_else(|| usage("provision <domain> --out <path>"))?,
            )?;
            let phrase = get_phrase(args)?;
            let out = get_flag(args, "--out")
                .map(Path::new)
                .unwrap_or(settings.domain_guard.hash_path.as_path());

            if !is_subdomain(domain) {
                warn!(domain, "Domain is not a per-site subdomain, provisioning anyway");
            }
            if !should_guard(Some(domain), &settings.domain_guard.allowed_domains) {
                warn!(domain, "Domain is not on a guarded parent domain, the guard will stay inactive");
            }

            let token = derive_site_token(domain, &phrase);
            FileHashStore::new(out).provision(&hash_token(&token))?;
            info!(domain, path = %out.display(), "Provisioned access token");
            println!("{}", token);
            Ok(())
        }
        "sign" => {
            let key_file = get_flag(args, "--key-file").ok_or_else(|| usage("sign --key-file <path>"))?;
            let api_key = SecretConfig::load(Path::new(key_file))?
                .api_key()
                .ok_or_else(|| usage("api_key in --key-file"))?;

            let payload = match (get_flag(args, "--body"), get_flag(args, "--email"), get_flag(args, "--filename")) {
                (Some(body_path), None, None) => SigningPayload::json(std::fs::read(body_path)?),
                (None, Some(email), Some(filename)) => SigningPayload::multipart(email, filename),
                _ => return Err(usage("sign (--body <file> | --email <e> --filename <f>)")),
            };

            let signer = RequestSigner::new(&api_key);
            let headers = match get_flag(args, "--timestamp") {
                Some(ts) => signer.sign(
                    &payload,
                    ts.parse().map_err(|_| GateError::Input {
                        message: format!("Invalid --timestamp '{}'", ts),
                    })?,
                ),
                None => signer.sign_now(&payload)?,
            };
            for (name, value) in headers.pairs() {
                println!("{}: {}", name, value);
            }
            Ok(())
        }
        "check-host" => {
            let host = positional;
            let guarded = should_guard(host, &settings.domain_guard.allowed_domains);
            println!(
                "{} (parent domain: {})",
                if guarded { "guarded" } else { "not guarded" },
                parent_domain(host).unwrap_or_else(|| "-".to_string())
            );
            Ok(())
        }
        other => Err(GateError::Input {
            message: format!("Unknown command '{}', see --help", other),
        }),
    }
}

fn usage(expected: &str) -> GateError {
    GateError::Input {
        message: format!("Missing argument, expected: {}", expected),
    }
}

/// Arguments that are neither flags nor flag values, in order.
fn positionals(args: &[String]) -> Vec<&str> {
    let mut result = Vec::new();
    let mut skip_value = false;
    for arg in args {
        if skip_value {
            skip_value = false;
        } else if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_value = true;
        } else if !arg.starts_with('-') {
            result.push(arg.as_str());
        }
    }
    result
}

/// Hash phrase from `--phrase` or the environment.
fn get_phrase(args: &[String]) -> Result<String, GateError> {
    get_flag(args, "--phrase")
        .map(str::to_string)
        .or_else(|| env::var(PHRASE_ENV).ok())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| usage(&format!("--phrase <phrase> or {}", PHRASE_ENV)))
}

/// Value of `--name <value>` or `--name=<value>`.
fn get_flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    for (i, arg) in args.iter().enumerate() {
        if arg == name && i + 1 < args.len() {
            return Some(args[i + 1].as_str());
        }
        if let Some(value) = arg.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')) {
            return Some(value);
        }
    }
    None
}

/// Print help message.
fn print_help() {
    println!(
        r#"{} {}
Provision domain access tokens and sign API requests.

USAGE:
    {} <COMMAND> [OPTIONS]

COMMANDS:
    hash-token <token>                      Print the SHA-256 hash stored for a token
    derive-token <domain> [--phrase <p>]    Print the access token for a site
    provision <domain> [--phrase <p>] [--out <path>]
                                            Write the token hash file and print the token
    sign --key-file <path> [--timestamp <ts>] (--body <file> | --email <e> --filename <f>)
                                            Print X-Signature / X-Timestamp headers
    check-host <host>                       Report whether the guard applies to a host

OPTIONS:
    -c, --config <PATH>    Path to configuration file
    -h, --help             Print help information
    -V, --version          Print version information

The hash phrase may also be given in {}.
"#,
        NAME, VERSION, NAME, PHRASE_ENV
    );
}

/// Initialize logging based on settings. Logs go to stderr.
fn init_logging(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    Ok(())
}
