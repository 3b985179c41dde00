//! # Vectara CLI
//!
//! Runs single platform operations from the command line, a walkthrough of the basic
//! operations, or the example HTTP server.
mod cli;
mod formatter;
mod server;
mod session;
mod upload;
mod walkthrough;

use clap::Parser;
use cli::{AccountArgs, ApiKeyCommand, Cli, Commands, UserCommand};
use formatter::{FormattedString, GenericError};
use session::Session;
use std::process;
use tracing_subscriber::EnvFilter;
use vectara_core::interpret::Outcome;
use vectara_core::operation::{
    ApiKeyType, CorpusKey, Document, NewApiKey, NewCorpus, NewUser, Operation, QueryBatch,
    QuerySpec, Section, UsageWindow,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    match args.command {
        Commands::Serve { bind, upload_file } => {
            let state = match server::ServerState::new(upload_file, args.account.http_prefix) {
                Ok(state) => state,
                Err(err) => exit_with(GenericError("Failed to build the HTTP client", err)),
            };
            if let Err(err) = server::serve(bind, state).await {
                exit_with(GenericError("Server failed", err));
            }
        }
        Commands::Walkthrough { corpus_id } => {
            let mut session = open_or_exit(&args.account).await;
            if let Err(err) = walkthrough::run(&mut session, corpus_id).await {
                exit_with(GenericError("Walkthrough stopped", format!("{err:#}")));
            }
        }
        command => {
            let mut session = open_or_exit(&args.account).await;
            let outcome = match run(&mut session, command).await {
                Ok(outcome) => outcome,
                Err(err) => exit_with(err),
            };

            println!("{}", FormattedString::from(&outcome));
            if outcome.is_failure() {
                process::exit(1);
            }
        }
    }
}

async fn run(session: &mut Session, command: Commands) -> Result<Outcome, FormattedString> {
    let outcome = match command {
        Commands::CreateCorpus { name, description } => {
            session
                .account(&Operation::CreateCorpus(NewCorpus { name, description }))
                .await?
        }
        Commands::ResetCorpus { corpus_id } => {
            session.corpus(corpus_id, &Operation::ResetCorpus).await?
        }
        Commands::DeleteCorpus { corpus_id } => {
            session.corpus(corpus_id, &Operation::DeleteCorpus).await?
        }
        Commands::Index {
            corpus_id,
            document_id,
            title,
            texts,
            metadata_json,
        } => {
            let document = Document {
                document_id,
                title,
                metadata_json,
                sections: texts.into_iter().map(Section::text).collect(),
                ..Default::default()
            };
            session
                .corpus(corpus_id, &Operation::IndexDocument(document))
                .await?
        }
        Commands::Upload {
            corpus_id,
            file,
            content_type,
        } => {
            let mut upload = upload::read_file(&file).await?;
            if content_type.is_some() {
                upload.content_type = content_type;
            }
            session
                .corpus(corpus_id, &Operation::UploadFile(upload))
                .await?
        }
        Commands::DeleteDoc {
            corpus_id,
            document_id,
        } => {
            session
                .corpus(corpus_id, &Operation::DeleteDocument { document_id })
                .await?
        }
        Commands::Query {
            corpus_ids,
            query,
            num_results,
            start,
        } => {
            let customer_id = session.customer_id();
            let batch = QueryBatch {
                queries: vec![QuerySpec {
                    query,
                    start,
                    num_results,
                    corpus_keys: corpus_ids
                        .into_iter()
                        .map(|corpus_id| CorpusKey {
                            customer_id,
                            corpus_id,
                        })
                        .collect(),
                }],
            };
            session.query(batch).await?
        }
        Commands::CorpusSize { corpus_id } => {
            session
                .corpus(corpus_id, &Operation::ComputeCorpusSize)
                .await?
        }
        Commands::SetCorpusEnabled { corpus_id, enabled } => {
            session
                .corpus(corpus_id, &Operation::SetCorpusEnabled { enabled })
                .await?
        }
        Commands::ReadCorpus { corpus_id } => {
            session.corpus(corpus_id, &Operation::ReadCorpus).await?
        }
        Commands::UsageMetrics {
            corpus_id,
            start,
            end,
            interval,
        } => {
            let window = UsageWindow {
                start,
                end,
                interval,
            };
            session
                .corpus(corpus_id, &Operation::GetUsageMetrics(window))
                .await?
        }
        Commands::ApiKey(command) => session.account(&api_key_operation(command)).await?,
        Commands::User(command) => session.account(&user_operation(command)).await?,
        Commands::Walkthrough { .. } | Commands::Serve { .. } => {
            return Err(FormattedString::from(GenericError(
                "Unexpected command",
                "walkthrough and serve run outside a single operation",
            )));
        }
    };

    Ok(outcome)
}

fn api_key_operation(command: ApiKeyCommand) -> Operation {
    match command {
        ApiKeyCommand::Create {
            description,
            indexing,
            corpus_ids,
        } => Operation::CreateApiKey(NewApiKey {
            description,
            key_type: if indexing {
                ApiKeyType::ServingIndexing
            } else {
                ApiKeyType::Serving
            },
            corpus_ids,
        }),
        ApiKeyCommand::Enable { key_id } => Operation::SetApiKeyEnabled {
            key_id,
            enabled: true,
        },
        ApiKeyCommand::Disable { key_id } => Operation::SetApiKeyEnabled {
            key_id,
            enabled: false,
        },
        ApiKeyCommand::Delete { key_id } => Operation::DeleteApiKey { key_id },
        ApiKeyCommand::List { num_results } => Operation::ListApiKeys { num_results },
    }
}

fn user_operation(command: UserCommand) -> Operation {
    match command {
        UserCommand::Create {
            handle,
            email,
            roles,
        } => Operation::CreateUser(NewUser {
            handle,
            email,
            roles,
        }),
        UserCommand::Enable { user_id } => Operation::SetUserEnabled {
            user_id,
            enabled: true,
        },
        UserCommand::Disable { user_id } => Operation::SetUserEnabled {
            user_id,
            enabled: false,
        },
        UserCommand::Delete { user_id } => Operation::DeleteUser { user_id },
        UserCommand::List { num_results } => Operation::ListUsers { num_results },
    }
}

async fn open_or_exit(account: &AccountArgs) -> Session {
    let settings = match account.settings() {
        Ok(settings) => settings,
        Err(err) => exit_with(err),
    };

    match Session::open(&settings, account.status_policy()).await {
        Ok(session) => session,
        Err(err) => exit_with(err),
    }
}

fn exit_with(err: impl Into<FormattedString>) -> ! {
    eprintln!("{}", err.into());
    process::exit(1);
}
