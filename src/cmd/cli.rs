use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tokio::signal;
use tracing_appender::rolling;

use crate::core::common::{LoggingOptions, RegistryOptions, ResolveMethod, ResolveOptions};
use crate::core::config::Config;
use crate::core::konst::{
    APP_NAME, CLI_HEADER_MSG, CONFIG_FILE, CURRENT_DIR, LOGFILE_NAME, LOGGING_JSON, LOGGING_QUIET,
    LOOKUP_TIMEOUT, POOL_SIZE,
};
use crate::registry::client::{RegistryAuth, RegistryClient};
use crate::registry::merge::collect_slice_addresses;
use crate::resolve::engine::run_batch;
use crate::resolve::lookup::HostLookup;
use crate::util::auth::{literal_or_file, prompt_password};
use crate::util::parser::read_hostnames;
use crate::util::writer::write_output;

#[derive(Debug, Subcommand, PartialEq, Clone)]
pub enum ConfigCommand {
    /// Create configuration
    Create {
        /// Config filename.
        /// Search Path: $CWD/hostmap.toml, $HOME/hostmap.toml
        #[clap(short, long, default_value = CONFIG_FILE)]
        file: String,

        /// Warning: Overwrites existing file if found in path.
        #[clap(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum Command {
    /// Generate a HostMap configuration
    Config {
        #[clap(subcommand)]
        command: ConfigCommand,
    },

    /// Resolve hostnames read from a file or stdin
    #[command(after_help = format_examples(&[
        "hm resolve -i hosts.txt -o hosts.out  # resolve a host list",
        "hm resolve < hosts.txt                # read from stdin",
    ]))]
    Resolve {
        /// Input file (default is stdin)
        #[clap(short, long, display_order = 1)]
        input: Option<String>,

        /// Output file (default is stdout)
        #[clap(short, long, display_order = 2)]
        output: Option<String>,

        #[clap(flatten)]
        shared_options: SharedOptions,
    },

    /// Write hostname and IPs for all nodes in a registry slice
    #[command(after_help = format_examples(&[
        "hm slice alice -s my-slice -o nodes.out  # fetch a slice roster",
        "hm slice ~/.registry-user                # user from file, prompt for password",
    ]))]
    Slice {
        /// Registry user, or file containing the user
        #[clap(display_order = 1)]
        user: String,

        /// Registry password, or file containing the password (default: prompt)
        #[clap(short, long, display_order = 2)]
        password: Option<String>,

        /// Slice name (default: some slice)
        #[clap(short, long, display_order = 3)]
        slice: Option<String>,

        /// Registry API URL
        #[clap(short, long, display_order = 4)]
        url: Option<String>,

        /// Output file (default is stdout)
        #[clap(short, long, display_order = 5)]
        output: Option<String>,

        #[clap(flatten)]
        shared_options: SharedOptions,
    },
}

#[derive(Clone, Debug, Args, PartialEq)]
pub struct SharedOptions {
    /// Number of concurrent resolution workers
    #[clap(short = 'n', long, default_value_t = POOL_SIZE, display_order = 120)]
    pub pool_size: u16,

    /// Per-lookup timeout (in milliseconds)
    #[clap(short, long, default_value_t = LOOKUP_TIMEOUT, display_order = 121)]
    pub timeout: u16,

    /// Resolution method
    #[clap(short, long, default_value_t = ResolveMethod::System, display_order = 122)]
    pub method: ResolveMethod,

    /// Config filename.
    /// Search Path: $CWD/hostmap.toml, $HOME/hostmap.toml
    #[clap(short, long, default_value = CONFIG_FILE, display_order = 123)]
    pub config: String,

    // Logging options
    // --------------
    /// Logging directory
    #[clap(long, default_value = CURRENT_DIR, display_order = 320)]
    pub dir: String,

    /// Logging filename
    #[clap(long, default_value = LOGFILE_NAME, display_order = 321)]
    pub file: String,

    /// Log to file in JSON format
    #[clap(long, default_value_t = false, display_order = 322)]
    pub json: bool,

    /// Silence terminal status output
    #[clap(long, default_value_t = false, display_order = 323)]
    pub quiet: bool,
}

impl Default for SharedOptions {
    fn default() -> Self {
        Self {
            pool_size: POOL_SIZE,
            timeout: LOOKUP_TIMEOUT,
            method: ResolveMethod::System,
            config: CONFIG_FILE.to_owned(),
            dir: CURRENT_DIR.to_owned(),
            file: LOGFILE_NAME.to_owned(),
            json: false,
            quiet: false,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "hm")]
#[command(bin_name = "hm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HostMap - bulk hostname to IP resolution", long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    command: Command,
}

impl Cli {
    pub fn init() -> Cli {
        Cli::parse()
    }

    pub async fn run(self) -> Result<()> {
        // This pulls out the shared options from the nested CLI commands.
        let shared_options = match &self.command {
            Command::Config { .. } => SharedOptions::default(),
            Command::Resolve { shared_options, .. } => shared_options.clone(),
            Command::Slice { shared_options, .. } => shared_options.clone(),
        };

        let file_appender = rolling::never(&shared_options.dir, &shared_options.file);
        let (logfile, _guard) = tracing_appender::non_blocking(file_appender);

        let tracer = tracing_subscriber::fmt()
            .with_env_filter(std::env::var("HOSTMAP_LOG").unwrap_or_else(|_| format!("{APP_NAME}=info")))
            .with_writer(logfile)
            .with_ansi(false)
            .with_target(true);

        if shared_options.json {
            tracer.json().init()
        } else {
            tracer.init()
        }

        let (config, config_msg) = match Config::load(&shared_options.config) {
            Ok(config) => {
                let msg = format!("Using configuration file `{}`.", shared_options.config);
                (config, msg)
            }
            Err(_) => {
                let msg = format!(
                    "Configuration file `{}` not found. Using default configuration.",
                    shared_options.config
                );
                (Config::default(), msg)
            }
        };

        // CLI options should override config file options.
        // If a CLI option is NOT the same as the default,
        // the option was set from the CLI. Therefore we should
        // use the CLI option. Otherwise use the config file option.
        #[rustfmt::skip]
        let resolve_options = ResolveOptions {
            pool_size: if shared_options.pool_size != POOL_SIZE { shared_options.pool_size } else { config.resolve_options.pool_size },
            timeout: if shared_options.timeout != LOOKUP_TIMEOUT { shared_options.timeout } else { config.resolve_options.timeout },
            method: if shared_options.method != ResolveMethod::System { shared_options.method } else { config.resolve_options.method },
        };

        #[rustfmt::skip]
        let logging_options = LoggingOptions {
            dir: if shared_options.dir != CURRENT_DIR { shared_options.dir.clone() } else { config.logging_options.dir.clone() },
            file: if shared_options.file != LOGFILE_NAME { shared_options.file.clone() } else { config.logging_options.file.clone() },
            json: if shared_options.json != LOGGING_JSON { shared_options.json } else { config.logging_options.json },
            quiet: if shared_options.quiet != LOGGING_QUIET { shared_options.quiet } else { config.logging_options.quiet },
        };

        // Status messages go to stderr; stdout carries output records.
        if !logging_options.quiet {
            eprintln!("{CLI_HEADER_MSG}");
            eprintln!("{config_msg}");
        }

        // Ctrl-C stops the batch: workers stop claiming hostnames and
        // whatever has resolved so far is still written out.
        let cancel = Arc::new(AtomicBool::new(false));
        let c = cancel.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                c.store(true, Ordering::SeqCst);
            }
        });

        match self.command {
            Command::Config { command } => {
                match command {
                    ConfigCommand::Create { file, force } => {
                        Config::generate(&file, force)?;
                    }
                }
                Ok(())
            }
            Command::Resolve { input, output, .. } => {
                let hostnames = read_hostnames(input.as_deref())?;
                let lookup = Arc::new(HostLookup::new(&resolve_options)?);

                let resolution_map = run_batch(hostnames, lookup, &resolve_options, cancel).await;
                write_output(&resolution_map, output.as_deref())?;
                Ok(())
            }
            Command::Slice {
                user,
                password,
                slice,
                url,
                output,
                ..
            } => {
                let user = literal_or_file(&user);
                let password = match password {
                    Some(password) => literal_or_file(&password),
                    None => prompt_password()?,
                };

                let registry_options = RegistryOptions {
                    url: url.unwrap_or(config.registry_options.url),
                    timeout: config.registry_options.timeout,
                };

                let client = RegistryClient::new(&registry_options, RegistryAuth { user, password })?;
                let lookup = Arc::new(HostLookup::new(&resolve_options)?);

                let resolution_map =
                    collect_slice_addresses(&client, slice.as_deref(), lookup, &resolve_options, cancel)
                        .await?;
                write_output(&resolution_map, output.as_deref())?;
                Ok(())
            }
        }
    }
}

/// Format example commands
fn format_examples(examples: &[&str]) -> String {
    let mut result = String::from("\x1B[1;4mExamples:\x1B[0m\n");
    for example in examples {
        result.push_str(&format!("  {}\n", example));
    }
    // Forces visible blank new line.
    // Otherwise, clap strips out raw trailing whitespace.
    result.push_str("\x1B[0m\n");
    result
}
