mod config;

use anyhow::{Context, Result};
use bson::oid::ObjectId;
use bson::{Bson, Document};
use clap::{Parser, Subcommand};
use mongoadmin_core::document::{parse_json_document, to_json};
use mongoadmin_core::{
    AdminClient, Connection, Function, IndexSpec, MemoryConnection, Namespace, QueryRequest, User,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mongoadmin")]
#[command(about = "mongoadmin - administration commands for a document database snapshot")]
#[command(version)]
struct Cli {
    /// Snapshot file (overrides the config file)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,
    /// Config file (default: $MONGOADMIN_CONFIG, then mongoadmin.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is not set (overrides the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database management
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    /// Collection management
    Coll {
        #[command(subcommand)]
        action: CollAction,
    },
    /// Query documents (at most 51 are returned)
    Find {
        database: String,
        collection: String,
        /// Filter as JSON
        #[arg(long, default_value = "{}")]
        filter: String,
        /// Projection as JSON
        #[arg(long)]
        projection: Option<String>,
        /// Sort key document as JSON, e.g. '{"age": -1}'
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        skip: u32,
    },
    /// Insert one JSON document
    Insert {
        database: String,
        collection: String,
        document: String,
    },
    /// Replace the document with the same _id, or insert it
    Save {
        database: String,
        collection: String,
        document: String,
    },
    /// Remove documents matching a JSON filter
    Remove {
        database: String,
        collection: String,
        filter: String,
        /// Remove only the first match
        #[arg(long)]
        one: bool,
    },
    /// Index management
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
    /// Users in <db>.system.users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Stored functions in <db>.system.js
    Function {
        #[command(subcommand)]
        action: FunctionAction,
    },
    /// collStats for one or more namespaces
    Stats {
        #[arg(required = true)]
        namespaces: Vec<String>,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// List database names
    List,
    Create { name: String },
    Drop { name: String },
}

#[derive(Subcommand)]
enum CollAction {
    /// List collection names of a database
    List { database: String },
    Create { database: String, name: String },
    Drop { database: String, name: String },
    Rename {
        database: String,
        from: String,
        to: String,
    },
    /// Copy every document into another collection
    Duplicate {
        database: String,
        from: String,
        to: String,
    },
}

#[derive(Subcommand)]
enum IndexAction {
    List { ns: Namespace },
    Ensure {
        ns: Namespace,
        /// Key specification as JSON, e.g. '{"name": 1}'
        keys: String,
        /// Index name (generated from the keys when omitted)
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        unique: bool,
        #[arg(long)]
        background: bool,
        #[arg(long)]
        drop_dups: bool,
    },
    Rename {
        ns: Namespace,
        old_name: String,
        new_name: String,
    },
    Drop { ns: Namespace, name: String },
}

#[derive(Subcommand)]
enum UserAction {
    List { database: String },
    Create {
        database: String,
        name: String,
        password: String,
        #[arg(long)]
        read_only: bool,
        #[arg(long = "role")]
        roles: Vec<String>,
        /// Update the existing user of that name instead of adding one
        #[arg(long)]
        overwrite: bool,
    },
    /// Drop by ObjectId (hex)
    Drop { database: String, id: String },
}

#[derive(Subcommand)]
enum FunctionAction {
    List { database: String },
    Save {
        database: String,
        name: String,
        code: String,
        /// Name of the function this one replaces
        #[arg(long)]
        replace: Option<String>,
    },
    Drop { database: String, name: String },
}

impl Commands {
    /// Whether the snapshot has to be written back afterwards
    fn is_mutation(&self) -> bool {
        match self {
            Commands::Db { action } => !matches!(action, DbAction::List),
            Commands::Coll { action } => !matches!(action, CollAction::List { .. }),
            Commands::Find { .. } | Commands::Stats { .. } => false,
            Commands::Insert { .. } | Commands::Save { .. } | Commands::Remove { .. } => true,
            Commands::Index { action } => !matches!(action, IndexAction::List { .. }),
            Commands::User { action } => !matches!(action, UserAction::List { .. }),
            Commands::Function { action } => !matches!(action, FunctionAction::List { .. }),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = config::config_path(cli.config.as_deref());
    let loaded = config::load(&config_path)?;
    let found = loaded.is_some();
    let config = loaded.unwrap_or_default();

    init_tracing(cli.log_level.as_deref().unwrap_or(&config.log_level));
    if !found {
        warn!(path = %config_path.display(), "Config file not found, using defaults");
    }

    let snapshot = cli.snapshot.clone().unwrap_or(config.snapshot);
    let conn = MemoryConnection::open_or_create(&snapshot)
        .with_context(|| format!("Failed to open snapshot: {}", snapshot.display()))?;
    let client = AdminClient::new(conn);

    let output = execute(&client, &cli.command, config.default_limit)?;

    if cli.command.is_mutation() {
        client
            .connection()
            .save_snapshot(&snapshot)
            .with_context(|| format!("Failed to write snapshot: {}", snapshot.display()))?;
        info!(path = %snapshot.display(), "snapshot saved");
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn parse_json(text: &str, what: &str) -> Result<Document> {
    parse_json_document(text).with_context(|| format!("Invalid JSON {}: {}", what, text))
}

fn ok() -> Value {
    json!({"ok": true})
}

/// Run one command against `client` and return what to print
fn execute<C: Connection>(client: &AdminClient<C>, command: &Commands, default_limit: u32) -> Result<Value> {
    match command {
        Commands::Db { action } => match action {
            DbAction::List => Ok(json!(client.list_database_names()?)),
            DbAction::Create { name } => {
                client
                    .create_database(name)
                    .with_context(|| format!("Failed to create database: {}", name))?;
                Ok(ok())
            }
            DbAction::Drop { name } => {
                client
                    .drop_database(name)
                    .with_context(|| format!("Failed to drop database: {}", name))?;
                Ok(ok())
            }
        },
        Commands::Coll { action } => execute_collection(client, action),
        Commands::Find {
            database,
            collection,
            filter,
            projection,
            sort,
            limit,
            skip,
        } => {
            let mut request = QueryRequest::new(database.as_str(), collection.as_str())
                .with_filter(parse_json(filter, "filter")?)
                .with_limit(limit.unwrap_or(default_limit))
                .with_skip(*skip);
            if let Some(projection) = projection {
                request = request.with_projection(parse_json(projection, "projection")?);
            }
            if let Some(sort) = sort {
                request = request.with_sort(parse_json(sort, "sort")?);
            }
            let docs = client
                .query_documents(&request)
                .with_context(|| format!("Failed to query {}.{}", database, collection))?;
            Ok(Value::Array(docs.iter().map(to_json).collect()))
        }
        Commands::Insert {
            database,
            collection,
            document,
        } => {
            let doc = parse_json(document, "document")?;
            client
                .insert_document(&doc, database, collection)
                .with_context(|| format!("Failed to insert into {}.{}", database, collection))?;
            Ok(ok())
        }
        Commands::Save {
            database,
            collection,
            document,
        } => {
            let doc = parse_json(document, "document")?;
            client
                .save_document(&doc, database, collection)
                .with_context(|| format!("Failed to save into {}.{}", database, collection))?;
            Ok(ok())
        }
        Commands::Remove {
            database,
            collection,
            filter,
            one,
        } => {
            let filter = parse_json(filter, "filter")?;
            client
                .remove_documents(database, collection, &filter, *one)
                .with_context(|| format!("Failed to remove from {}.{}", database, collection))?;
            Ok(ok())
        }
        Commands::Index { action } => execute_index(client, action),
        Commands::User { action } => execute_user(client, action),
        Commands::Function { action } => execute_function(client, action),
        Commands::Stats { namespaces } => {
            let stats = client
                .collection_stats_batch(namespaces)
                .context("Failed to collect stats")?;
            Ok(serde_json::to_value(stats)?)
        }
    }
}

fn execute_collection<C: Connection>(client: &AdminClient<C>, action: &CollAction) -> Result<Value> {
    match action {
        CollAction::List { database } => Ok(json!(client.list_collection_names(database)?)),
        CollAction::Create { database, name } => {
            client
                .create_collection(database, name)
                .with_context(|| format!("Failed to create collection: {}.{}", database, name))?;
            Ok(ok())
        }
        CollAction::Drop { database, name } => {
            client
                .drop_collection(database, name)
                .with_context(|| format!("Failed to drop collection: {}.{}", database, name))?;
            Ok(ok())
        }
        CollAction::Rename { database, from, to } => {
            client
                .rename_collection(database, from, to)
                .with_context(|| format!("Failed to rename {}.{} to {}", database, from, to))?;
            Ok(ok())
        }
        CollAction::Duplicate { database, from, to } => {
            let copied = client
                .duplicate_collection(database, from, to)
                .with_context(|| format!("Failed to duplicate {}.{} into {}", database, from, to))?;
            Ok(json!({"ok": true, "copied": copied}))
        }
    }
}

fn index_json(spec: &IndexSpec) -> Value {
    json!({
        "name": spec.name,
        "key": to_json(&spec.keys),
        "unique": spec.unique,
        "background": spec.background,
        "dropDups": spec.drop_dups,
    })
}

fn execute_index<C: Connection>(client: &AdminClient<C>, action: &IndexAction) -> Result<Value> {
    match action {
        IndexAction::List { ns } => {
            let listing = client
                .list_indexes(ns)
                .with_context(|| format!("Failed to list indexes of {}", ns))?;
            Ok(json!({
                "indexes": listing.items.iter().map(index_json).collect::<Vec<_>>(),
                "skipped": listing.skipped.len(),
            }))
        }
        IndexAction::Ensure {
            ns,
            keys,
            name,
            unique,
            background,
            drop_dups,
        } => {
            client
                .ensure_index(ns, name, keys, *unique, *background, *drop_dups)
                .with_context(|| format!("Failed to ensure index on {}", ns))?;
            Ok(ok())
        }
        IndexAction::Rename {
            ns,
            old_name,
            new_name,
        } => {
            client
                .rename_index(ns, old_name, new_name)
                .with_context(|| format!("Failed to rename index {} on {}", old_name, ns))?;
            Ok(ok())
        }
        IndexAction::Drop { ns, name } => {
            client
                .drop_index(ns, name)
                .with_context(|| format!("Failed to drop index {} on {}", name, ns))?;
            Ok(ok())
        }
    }
}

fn user_json(user: &User) -> Value {
    json!({
        "_id": user.id.map(|id| id.to_hex()),
        "user": user.name,
        "readOnly": user.read_only,
        "roles": Bson::Array(user.roles.clone()).into_relaxed_extjson(),
    })
}

fn execute_user<C: Connection>(client: &AdminClient<C>, action: &UserAction) -> Result<Value> {
    match action {
        UserAction::List { database } => {
            let users = client
                .list_users(database)
                .with_context(|| format!("Failed to list users of {}", database))?;
            Ok(Value::Array(users.iter().map(user_json).collect()))
        }
        UserAction::Create {
            database,
            name,
            password,
            read_only,
            roles,
            overwrite,
        } => {
            // overwrite edits the existing entry so its _id and extra fields stay
            let existing = if *overwrite {
                client
                    .find_user(database, name)
                    .with_context(|| format!("Failed to look up user {} in {}", name, database))?
            } else {
                None
            };
            let mut user = existing.unwrap_or_else(|| User::new(name.as_str()));
            user.set_password(password);
            user.read_only = *read_only;
            if !roles.is_empty() {
                user.roles = roles.iter().map(|r| Bson::from(r.as_str())).collect();
            }
            client
                .create_user(database, &user, *overwrite)
                .with_context(|| format!("Failed to create user {} in {}", name, database))?;
            Ok(user_json(&user))
        }
        UserAction::Drop { database, id } => {
            let id = ObjectId::parse_str(id).with_context(|| format!("Invalid user id: {}", id))?;
            client
                .drop_user(database, id)
                .with_context(|| format!("Failed to drop user {} from {}", id, database))?;
            Ok(ok())
        }
    }
}

fn execute_function<C: Connection>(client: &AdminClient<C>, action: &FunctionAction) -> Result<Value> {
    match action {
        FunctionAction::List { database } => {
            let listing = client
                .list_functions(database)
                .with_context(|| format!("Failed to list functions of {}", database))?;
            Ok(json!({
                "functions": listing.items,
                "skipped": listing.skipped.len(),
            }))
        }
        FunctionAction::Save {
            database,
            name,
            code,
            replace,
        } => {
            let function = Function::new(name.as_str(), code.as_str());
            client
                .create_function(database, &function, replace.as_deref())
                .with_context(|| format!("Failed to save function {} in {}", name, database))?;
            Ok(ok())
        }
        FunctionAction::Drop { database, name } => {
            client
                .drop_function(database, name)
                .with_context(|| format!("Failed to drop function {} from {}", name, database))?;
            Ok(ok())
        }
    }
}
