use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use vectara_core::auth::SecretEncoding;
use vectara_core::config::{AuthSettings, ConfigError, Settings, TransportKind};
use vectara_core::endpoint::{DEFAULT_UNIFIED_HOST, Endpoints};
use vectara_core::interpret::StatusPolicy;

#[derive(Parser)]
#[command(name = "vectara", version, about = "Talk to the Vectara platform over REST or gRPC")]
pub struct Cli {
    #[command(flatten)]
    pub account: AccountArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Account, host and credential flags shared by every platform command.
#[derive(Args, Debug)]
pub struct AccountArgs {
    /// Customer (tenant) id of the account.
    #[arg(long, env = "VECTARA_CUSTOMER_ID", global = true)]
    pub customer_id: Option<i64>,

    /// Wire protocol used for platform calls: `rest` or `grpc`.
    #[arg(long, env = "VECTARA_TRANSPORT", default_value = "rest", global = true)]
    pub transport: TransportKind,

    /// Treat statuses that only carry a notice, such as an already existing
    /// document, as failures.
    #[arg(long, env = "VECTARA_STRICT_STATUS", global = true)]
    pub strict_status: bool,

    /// Unified host answering admin, indexing and serving calls.
    #[arg(long, env = "VECTARA_HOST", default_value = DEFAULT_UNIFIED_HOST, global = true)]
    pub host: String,

    /// Overrides the host of admin calls.
    #[arg(long, env = "VECTARA_ADMIN_HOST", global = true)]
    pub admin_host: Option<String>,

    /// Overrides the host of indexing calls.
    #[arg(long, env = "VECTARA_INDEXING_HOST", global = true)]
    pub indexing_host: Option<String>,

    /// Overrides the host of serving calls.
    #[arg(long, env = "VECTARA_SERVING_HOST", global = true)]
    pub serving_host: Option<String>,

    /// Send REST calls to the `h.`-prefixed twin of each host.
    #[arg(long, env = "VECTARA_HTTP_PREFIX", global = true)]
    pub http_prefix: bool,

    #[arg(long, env = "VECTARA_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Auth domain of the account. Defaults to the account's production domain.
    #[arg(long, env = "VECTARA_AUTH_URL", global = true)]
    pub auth_url: Option<String>,

    #[arg(long, env = "VECTARA_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    #[arg(long, env = "VECTARA_CLIENT_SECRET", hide_env_values = true, global = true)]
    pub client_secret: Option<String>,

    /// How the client secret reaches the token endpoint.
    #[arg(long, env = "VECTARA_SECRET_ENCODING", value_enum, default_value_t = SecretMode::Basic, global = true)]
    pub secret_encoding: SecretMode,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SecretMode {
    /// HTTP Basic auth header.
    Basic,
    /// `client_secret` form field.
    Body,
}

#[derive(Debug, thiserror::Error)]
pub enum ArgsError {
    #[error("No customer id, pass --customer-id or set VECTARA_CUSTOMER_ID")]
    MissingCustomerId,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AccountArgs {
    pub fn endpoints(&self) -> Endpoints {
        let pick = |over: &Option<String>| over.clone().unwrap_or_else(|| self.host.clone());
        let endpoints = if self.admin_host.is_none()
            && self.indexing_host.is_none()
            && self.serving_host.is_none()
        {
            Endpoints::unified(&self.host)
        } else {
            Endpoints::per_function(
                pick(&self.admin_host),
                pick(&self.indexing_host),
                pick(&self.serving_host),
            )
        };
        endpoints.with_http_prefix(self.http_prefix)
    }

    /// Validates the flags into process settings.
    pub fn settings(&self) -> Result<Settings, ArgsError> {
        let customer_id = self.customer_id.ok_or(ArgsError::MissingCustomerId)?;
        let auth = AuthSettings {
            api_key: self.api_key.clone(),
            auth_url: self.auth_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            secret_encoding: match self.secret_encoding {
                SecretMode::Basic => SecretEncoding::BasicAuth,
                SecretMode::Body => SecretEncoding::RequestBody,
            },
        };

        Ok(Settings::new(customer_id, self.endpoints(), auth, self.transport)?)
    }

    pub fn status_policy(&self) -> StatusPolicy {
        if self.strict_status {
            StatusPolicy::strict()
        } else {
            StatusPolicy::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new corpus and print its id.
    CreateCorpus {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Remove every document of a corpus, keeping the corpus itself.
    ResetCorpus {
        #[arg(long)]
        corpus_id: i64,
    },

    DeleteCorpus {
        #[arg(long)]
        corpus_id: i64,
    },

    /// Index a document made of one section per `--text`.
    Index {
        #[arg(long)]
        corpus_id: i64,

        #[arg(long)]
        document_id: String,

        #[arg(long, default_value = "")]
        title: String,

        #[arg(long = "text", required = true)]
        texts: Vec<String>,

        /// Document metadata as a JSON object.
        #[arg(long, default_value = "", value_parser = parse_metadata)]
        metadata_json: String,
    },

    /// Upload a file for server-side extraction and indexing (REST only).
    Upload {
        #[arg(long)]
        corpus_id: i64,

        file: PathBuf,

        /// Mime type of the file, guessed by the platform when absent.
        #[arg(long)]
        content_type: Option<String>,
    },

    DeleteDoc {
        #[arg(long)]
        corpus_id: i64,

        #[arg(long)]
        document_id: String,
    },

    /// Query one or more corpora and print the hits.
    Query {
        /// Corpus to search, repeat to search several.
        #[arg(long = "corpus-id", required = true)]
        corpus_ids: Vec<i64>,

        query: String,

        #[arg(long, default_value_t = 10)]
        num_results: u32,

        #[arg(long, default_value_t = 0)]
        start: u32,
    },

    /// Print the size of a corpus (REST only).
    CorpusSize {
        #[arg(long)]
        corpus_id: i64,
    },

    /// Enable or disable a corpus (REST only).
    SetCorpusEnabled {
        #[arg(long)]
        corpus_id: i64,

        #[arg(long, action = clap::ArgAction::Set)]
        enabled: bool,
    },

    /// Print the basic info, size and API keys of a corpus (REST only).
    ReadCorpus {
        #[arg(long)]
        corpus_id: i64,
    },

    /// Print serving usage of a corpus over a time window (REST only).
    UsageMetrics {
        #[arg(long)]
        corpus_id: i64,

        /// Window start, RFC 3339.
        #[arg(long)]
        start: String,

        /// Window end, RFC 3339.
        #[arg(long)]
        end: String,

        /// Bucket width as an ISO 8601 duration.
        #[arg(long, default_value = "PT1H")]
        interval: String,
    },

    /// Manage API keys (REST only).
    #[command(subcommand)]
    ApiKey(ApiKeyCommand),

    /// Manage account users (REST only).
    #[command(subcommand)]
    User(UserCommand),

    /// Index, delete, query, then create and delete a scratch corpus.
    Walkthrough {
        #[arg(long)]
        corpus_id: i64,
    },

    /// Run the example HTTP server.
    Serve {
        #[arg(long, env = "VECTARA_BIND", default_value = "127.0.0.1:3000")]
        bind: SocketAddr,

        /// File sent by `/indexData`.
        #[arg(long, env = "VECTARA_UPLOAD_FILE", default_value = "upload.pdf")]
        upload_file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ApiKeyCommand {
    Create {
        #[arg(long, default_value = "")]
        description: String,

        /// Grant indexing rights on top of serving.
        #[arg(long)]
        indexing: bool,

        #[arg(long = "corpus-id", required = true)]
        corpus_ids: Vec<i64>,
    },

    Enable {
        key_id: String,
    },

    Disable {
        key_id: String,
    },

    Delete {
        key_id: String,
    },

    List {
        #[arg(long, default_value_t = 100)]
        num_results: u32,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    Create {
        #[arg(long)]
        handle: String,

        #[arg(long)]
        email: String,

        /// Role granted to the user, repeat for several.
        #[arg(long = "role")]
        roles: Vec<String>,
    },

    Enable {
        user_id: i64,
    },

    Disable {
        user_id: i64,
    },

    Delete {
        user_id: i64,
    },

    List {
        #[arg(long, default_value_t = 10)]
        num_results: u32,
    },
}

fn parse_metadata(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        return Ok(String::new());
    }
    match serde_json::from_str::<serde_json::Value>(value) {
        Ok(serde_json::Value::Object(_)) => Ok(value.to_string()),
        Ok(_) => Err("metadata must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}
