use std::net::Ipv4Addr;
use std::path::PathBuf;

use anyhow::Context;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::GraphQL;
use axum::response::IntoResponse;
use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::*;
use tracing_subscriber::EnvFilter;
use usergraph_lib::config::Config;
use usergraph_lib::graphql_api::{self, ApiSchemaContext};

#[derive(Parser, Debug)]
#[clap(author, about, version)]
struct CliOptions {
    /// Path to the YAML configuration file.
    #[clap(long, env = "USERGRAPH_CONFIG", required_unless_present = "print_schema")]
    config: Option<PathBuf>,
    /// Print the GraphQL schema in SDL format and exit.
    #[clap(long)]
    print_schema: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Parse options");
    let cli_options = CliOptions::parse();

    if cli_options.print_schema {
        println!("{}", graphql_api::api_schema_builder().finish().sdl());
        return Ok(());
    }

    info!("Loading configuration file");
    let config_path = cli_options
        .config
        .context("a configuration file is required")?;
    let config = Config::read(&config_path)?;

    if config.mutations.forward_company_id {
        info!("`addUser` will forward `companyId` to the backend");
    }

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.graphql.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.graphql.port))?;
    info!(port = config.graphql.port, "GraphQL API listening");

    // Listen to requests forever.
    axum::serve(listener, axum_server(&config)).await?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn axum_server(config: &Config) -> Router<()> {
    use axum::routing::get;

    let api_schema = graphql_api::api_schema(ApiSchemaContext::from_config(config));

    axum::Router::new()
        .route("/", get(|| async { "Ready to roll!" }))
        .route(
            "/graphql",
            get(graphiql_route).post_service(GraphQL::new(api_schema)),
        )
}

async fn graphiql_route() -> impl IntoResponse {
    axum::response::Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
