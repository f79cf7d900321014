use clap::{Parser, Subcommand};
use miette::{Diagnostic, Report};
use std::path::PathBuf;
use thiserror::Error;

use crate::tracing::{TracingConfig, TracingFormat};

/// Exit code for a successful run
pub const EXIT_OK: i32 = 0;
/// Exit code for any failure
pub const EXIT_FAILURE: i32 = 1;

/// Environment variable listing registries reachable over plain HTTP.
pub const INSECURE_REGISTRIES_ENV: &str = "OCIREL_INSECURE_REGISTRIES";

/// CLI-specific error types.
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// A path argument does not exist.
    #[error("Path does not exist: {}", path.display())]
    #[diagnostic(code(ocirel::cli::path_not_found))]
    PathNotFound {
        /// The resolved path.
        path: PathBuf,
    },

    /// A directory was required.
    #[error("Not a directory: {}", path.display())]
    #[diagnostic(
        code(ocirel::cli::not_a_directory),
        help("Pass the directory containing metadata.json and artifacts.json")
    )]
    NotADirectory {
        /// The resolved path.
        path: PathBuf,
    },

    /// A regular file was required.
    #[error("Not a file: {}", path.display())]
    #[diagnostic(code(ocirel::cli::not_a_file))]
    NotAFile {
        /// The resolved path.
        path: PathBuf,
    },

    /// The current working directory could not be determined.
    #[error("Failed to determine the working directory: {source}")]
    #[diagnostic(code(ocirel::cli::working_directory))]
    WorkingDirectory {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An argument is missing or inconsistent.
    #[error("{message}")]
    #[diagnostic(code(ocirel::cli::argument))]
    Argument {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },

    /// The async runtime could not be started.
    #[error("Failed to start the async runtime: {source}")]
    #[diagnostic(code(ocirel::cli::runtime))]
    Runtime {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Registry, credential, sidecar or extraction failure.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Oci(#[from] ocirel_oci::Error),
}

impl CliError {
    /// Create an argument error
    #[must_use]
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
            help: None,
        }
    }

    /// Create an argument error with help text
    #[must_use]
    pub fn argument_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// The diagnostic code as a plain string, for JSON output.
    #[must_use]
    pub fn code_str(&self) -> String {
        self.code()
            .map_or_else(|| "ocirel::error".to_string(), |code| code.to_string())
    }
}

impl From<ocirel_metadata::Error> for CliError {
    fn from(err: ocirel_metadata::Error) -> Self {
        Self::Oci(err.into())
    }
}

/// Print a fatal error to stderr, as JSON or as a miette report.
pub fn render_error(err: CliError, json_mode: bool) {
    if json_mode {
        let envelope = serde_json::json!({
            "status": "error",
            "error": {
                "code": err.code_str(),
                "message": err.to_string(),
            }
        });
        eprintln!("{envelope}");
    } else {
        eprintln!("{:?}", Report::new(err));
    }
}

/// Publish build-release archives to OCI registries and fetch them back.
#[derive(Parser, Debug)]
#[command(name = "ocirel")]
#[command(about = "Publish build-release archives to OCI registries and fetch them back")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "info",
        value_enum
    )]
    pub level: crate::tracing::LogLevel,

    /// Emit logs and errors as JSON.
    #[arg(long, global = true, help = "Output logs in JSON format")]
    pub json: bool,

    /// Log line format; `--json` takes precedence.
    #[arg(
        long = "log-format",
        global = true,
        help = "Set log format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,

    /// Registries to reach over plain HTTP.
    #[arg(
        long = "insecure-registry",
        global = true,
        env = INSECURE_REGISTRIES_ENV,
        value_delimiter = ',',
        help = "Registry host to reach over plain HTTP (repeatable)"
    )]
    pub insecure_registries: Vec<String>,
}

impl Cli {
    /// Subscriber settings for the global logging flags.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig {
            format: if self.json {
                TracingFormat::Json
            } else {
                self.log_format
            },
            level: self.level.into(),
        }
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Push every archive listed in a release directory as a multi-platform index.
    #[command(about = "Upload release archives as a multi-platform OCI index")]
    Upload {
        /// Directory containing metadata.json, artifacts.json and the archives.
        #[arg(help = "Directory containing the release sidecars and archives")]
        source: PathBuf,
        /// Target reference (registry/repository:tag).
        #[arg(help = "Target reference, e.g. ghcr.io/org/repo:v1.0.0")]
        reference: String,
    },

    /// Push one archive without sidecar metadata.
    #[command(about = "Upload a single archive as a one-entry OCI index")]
    UploadSingle {
        /// Archive file to push.
        #[arg(help = "Archive file to upload")]
        archive: PathBuf,
        /// Target reference (registry/repository:tag).
        #[arg(help = "Target reference, e.g. ghcr.io/org/repo:v1.0.0")]
        reference: String,
    },

    /// Pull an image and extract its layers.
    #[command(about = "Download an OCI artifact and extract its layers")]
    Download {
        /// Source reference (registry/repository:tag).
        #[arg(help = "Source reference, e.g. ghcr.io/org/repo:v1.0.0")]
        reference: String,
        /// Directory to extract into (created if missing).
        #[arg(help = "Destination directory")]
        destination: PathBuf,
    },

    /// Store registry credentials in the Docker config file.
    #[command(about = "Log in to a registry")]
    Login {
        /// Registry host, e.g. ghcr.io.
        #[arg(help = "Registry host")]
        registry: String,
        /// Username.
        #[arg(short = 'u', long, help = "Registry username")]
        username: String,
        /// Password or token.
        #[arg(
            short = 'p',
            long,
            conflicts_with = "password_stdin",
            help = "Registry password or token"
        )]
        password: Option<String>,
        /// Read the password from stdin.
        #[arg(long, help = "Read the password from stdin")]
        password_stdin: bool,
    },

    /// Remove registry credentials from the Docker config file.
    #[command(about = "Log out of a registry")]
    Logout {
        /// Registry host, e.g. ghcr.io.
        #[arg(help = "Registry host")]
        registry: String,
    },
}

impl Commands {
    /// The subcommand name as typed on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Upload { .. } => "upload",
            Self::UploadSingle { .. } => "upload-single",
            Self::Download { .. } => "download",
            Self::Login { .. } => "login",
            Self::Logout { .. } => "logout",
        }
    }
}

/// Parse command line arguments, exiting on `--help` or usage errors.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracing::{Level, LogLevel};

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["ocirel", "logout", "ghcr.io"]).unwrap();

        assert!(matches!(cli.level, LogLevel::Info));
        assert!(!cli.json);
        assert!(matches!(cli.command, Commands::Logout { ref registry } if registry == "ghcr.io"));
    }

    #[test]
    fn test_cli_log_level_parsing() {
        let cli = Cli::try_parse_from(["ocirel", "--level", "trace", "logout", "ghcr.io"]).unwrap();
        assert!(matches!(cli.level, LogLevel::Trace));

        let cli = Cli::try_parse_from(["ocirel", "-l", "error", "logout", "ghcr.io"]).unwrap();
        assert!(matches!(cli.level, LogLevel::Error));

        // Global flags are accepted after the subcommand too
        let cli = Cli::try_parse_from(["ocirel", "logout", "ghcr.io", "-l", "debug"]).unwrap();
        assert!(matches!(cli.level, LogLevel::Debug));
    }

    #[test]
    fn test_cli_log_format() {
        let cli = Cli::try_parse_from(["ocirel", "logout", "ghcr.io"]).unwrap();
        assert_eq!(cli.tracing_config().format, TracingFormat::Compact);
        assert_eq!(cli.tracing_config().level, Level::INFO);

        let cli = Cli::try_parse_from([
            "ocirel",
            "--log-format",
            "dev",
            "-l",
            "debug",
            "logout",
            "ghcr.io",
        ])
        .unwrap();
        assert_eq!(cli.tracing_config().format, TracingFormat::Dev);
        assert_eq!(cli.tracing_config().level, Level::DEBUG);

        let cli = Cli::try_parse_from([
            "ocirel",
            "--log-format",
            "pretty",
            "--json",
            "logout",
            "ghcr.io",
        ])
        .unwrap();
        assert_eq!(cli.tracing_config().format, TracingFormat::Json);

        assert!(
            Cli::try_parse_from(["ocirel", "--log-format", "xml", "logout", "ghcr.io"]).is_err()
        );
    }

    #[test]
    fn test_cli_upload_args() {
        let cli = Cli::try_parse_from([
            "ocirel",
            "upload",
            "./dist",
            "ghcr.io/compliance-framework/plugin-local-ssh:v1.0.0",
        ])
        .unwrap();

        if let Commands::Upload { source, reference } = cli.command {
            assert_eq!(source, PathBuf::from("./dist"));
            assert_eq!(reference, "ghcr.io/compliance-framework/plugin-local-ssh:v1.0.0");
        } else {
            panic!("Expected Upload command");
        }
    }

    #[test]
    fn test_cli_upload_requires_two_args() {
        assert!(Cli::try_parse_from(["ocirel", "upload", "./dist"]).is_err());
        assert!(Cli::try_parse_from(["ocirel", "upload-single"]).is_err());
    }

    #[test]
    fn test_cli_download_arg_order() {
        let cli = Cli::try_parse_from(["ocirel", "download", "ghcr.io/org/repo:v1", "out"]).unwrap();
        if let Commands::Download {
            reference,
            destination,
        } = cli.command
        {
            assert_eq!(reference, "ghcr.io/org/repo:v1");
            assert_eq!(destination, PathBuf::from("out"));
        } else {
            panic!("Expected Download command");
        }
    }

    #[test]
    fn test_cli_insecure_registries() {
        let cli = Cli::try_parse_from([
            "ocirel",
            "--insecure-registry",
            "localhost:5000,registry.local:5000",
            "--insecure-registry",
            "10.0.0.1:5000",
            "logout",
            "localhost:5000",
        ])
        .unwrap();
        assert_eq!(
            cli.insecure_registries,
            vec!["localhost:5000", "registry.local:5000", "10.0.0.1:5000"]
        );
    }

    #[test]
    fn test_cli_login_password_conflicts() {
        let result = Cli::try_parse_from([
            "ocirel",
            "login",
            "ghcr.io",
            "-u",
            "robot",
            "-p",
            "secret",
            "--password-stdin",
        ]);
        assert!(result.is_err());

        let cli =
            Cli::try_parse_from(["ocirel", "login", "ghcr.io", "-u", "robot", "--password-stdin"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Login { password: None, password_stdin: true, .. }
        ));
    }

    #[test]
    fn test_command_names() {
        let cli = Cli::try_parse_from(["ocirel", "upload-single", "a.tar.gz", "ghcr.io/o/r:v1"])
            .unwrap();
        assert_eq!(cli.command.name(), "upload-single");
    }

    #[test]
    fn test_cli_error_codes() {
        let err = CliError::argument("missing password");
        assert_eq!(err.code_str(), "ocirel::cli::argument");

        let err = CliError::from(ocirel_oci::Error::invalid_reference("invalid/invalid", "x"));
        assert_eq!(err.code_str(), "ocirel::oci::invalid_reference");
    }

    #[test]
    fn test_cli_error_with_help() {
        let err = CliError::argument_with_help("no password", "pass -p or --password-stdin");
        if let CliError::Argument { message, help } = err {
            assert_eq!(message, "no password");
            assert_eq!(help.as_deref(), Some("pass -p or --password-stdin"));
        } else {
            panic!("Expected Argument error");
        }
    }
}
