use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use http::Method;
use std::path::{Path, PathBuf};

use crate::config::RouteTable;
use crate::context::Context;
use crate::ids::RequestId;
use crate::router::Router;

/// Command-line interface for inspecting route tables
#[derive(Parser)]
#[command(name = "radixroute")]
#[command(about = "Inspect and query radixroute route tables", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every registered path with its methods
    Routes {
        /// Route table (YAML)
        #[arg(short, long, env = "RADIXROUTE_TABLE")]
        table: PathBuf,
    },
    /// Print the routing trie as JSON
    Tree {
        /// Route table (YAML)
        #[arg(short, long, env = "RADIXROUTE_TABLE")]
        table: PathBuf,
    },
    /// Dispatch one request through the table and print the outcome
    Resolve {
        /// Route table (YAML)
        #[arg(short, long, env = "RADIXROUTE_TABLE")]
        table: PathBuf,

        /// Request method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path
        path: String,

        /// Request id to propagate instead of minting a new one
        #[arg(long)]
        request_id: Option<String>,
    },
}

fn build(table: &Path) -> Result<Router> {
    let (router, _) = RouteTable::load(table)
        .and_then(|t| t.build())
        .with_context(|| format!("failed to build router from {}", table.display()))?;
    Ok(router)
}

/// Run a parsed command, writing its output to stdout.
pub async fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Routes { table } => {
            let router = build(&table)?;
            router.dump_routes();
            for route in router.routes() {
                println!("{:<8} {}", route.methods.join(","), route.path);
            }
        }
        Commands::Tree { table } => {
            let router = build(&table)?;
            println!("{}", serde_json::to_string_pretty(&router.export())?);
        }
        Commands::Resolve {
            table,
            method,
            path,
            request_id,
        } => {
            let router = build(&table)?;
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid method {method:?}"))?;
            let mut ctx = Context::new(method, path);
            ctx.request_id = RequestId::from_propagated(request_id.as_deref());

            let ctx = router.dispatch(ctx).await;
            let params: serde_json::Map<String, serde_json::Value> = ctx
                .params
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                .collect();
            let outcome = serde_json::json!({
                "request_id": ctx.request_id,
                "status": ctx.status(),
                "body": ctx.body,
                "params": params,
            });
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }
    Ok(())
}
