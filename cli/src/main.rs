//! CLI entrypoint for counsel
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod app;

use anyhow::{Context, Result, bail};
use app::App;
use clap::Parser;
use counsel_application::{
    DeliberationOutcome, EventSink, NoEvents, RequestStatus, RunRequestInput, RunRequestUseCase,
    ToolExecutorPort,
};
use counsel_domain::{CaseContext, CaseId, Request, SessionId, TenantId};
use counsel_infrastructure::{ConfigLoader, FileConfig};
use counsel_presentation::{
    Cli, Command, ConsoleRenderer, JsonLinesProgress, JsonRenderer, OutputFormat,
    ProgressReporter, SimpleProgress,
};
use std::io::IsTerminal;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?
    };
    config.validate().context("Invalid configuration")?;

    let _guard = init_logging(cli.verbose, config.logging.file.as_deref())?;
    info!("Starting counsel");

    if let Command::Config = cli.command {
        return show_config(&cli, &config);
    }

    let app = App::build(config).await?;
    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            ctrl_c.cancel();
        }
    });

    match cli.command {
        Command::Ask {
            ref text,
            ref tenant,
            ref session,
            ref case,
        } => {
            let tenant = tenant_or_default(tenant.as_deref(), &app);
            let session = session
                .as_deref()
                .map(SessionId::new)
                .unwrap_or_else(SessionId::generate);
            let mut request = Request::new(tenant, session, text.as_str());
            if let Some(case) = case {
                request = request.with_case(case.as_str());
            }
            ask(&cli, &app, request, token).await
        }
        Command::Deliberate {
            ref question,
            ref tenant,
            ref case,
            ref session,
            ref jurisdiction,
            ref parties,
        } => {
            let session = session
                .as_deref()
                .map(SessionId::new)
                .unwrap_or_else(SessionId::generate);
            let mut context =
                CaseContext::new(tenant_or_default(tenant.as_deref(), &app), session, question);
            if let Some(case) = case {
                context = context.with_case(CaseId::new(case));
            }
            if let Some(jurisdiction) = jurisdiction {
                context = context.with_jurisdiction(jurisdiction);
            }
            for party in parties {
                context = context.with_party(party);
            }
            deliberate(&cli, &app, context, None, token).await
        }
        Command::Resume {
            ref session,
            ref tenant,
            ref answer,
        } => {
            if !app.persistent {
                bail!("resume needs a persistent ledger; set ledger.path in the configuration");
            }
            let tenant = tenant_or_default(tenant.as_deref(), &app);
            let session = SessionId::new(session);
            let context = app
                .contexts
                .load(&tenant, &session)
                .await?
                .with_context(|| {
                    format!(
                        "No suspended deliberation for session {} of tenant {}",
                        session, tenant
                    )
                })?;
            deliberate(&cli, &app, context, Some(answer.as_str()), token).await
        }
        Command::Audit {
            ref session,
            ref tenant,
            public,
        } => {
            let tenant = tenant_or_default(tenant.as_deref(), &app);
            audit(&cli, &app, &tenant, &SessionId::new(session), public).await
        }
        Command::Tools => {
            let mut tools: Vec<_> = app.registry.catalog().all().collect();
            tools.sort_by(|a, b| a.name.cmp(&b.name));
            match cli.output {
                OutputFormat::Text => print!("{}", ConsoleRenderer::tools(&tools)),
                OutputFormat::Json => println!("{}", JsonRenderer::pretty(&tools)),
            }
            Ok(())
        }
        Command::Config => show_config(&cli, &app.config),
    }
}

/// Diagnostic logging: stderr, plus a log file when configured.
///
/// The returned guard flushes the file writer when dropped.
fn init_logging(verbose: u8, file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .context("logging.file must name a file")?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file_layer)
        .init();
    Ok(guard)
}

fn tenant_or_default(tenant: Option<&str>, app: &App) -> TenantId {
    TenantId::new(tenant.unwrap_or(&app.config.store.default_tenant))
}

/// Event sink for the selected output mode.
fn event_sink(cli: &Cli) -> Box<dyn EventSink> {
    match (cli.output, cli.quiet) {
        (OutputFormat::Json, _) => Box::new(JsonLinesProgress),
        (OutputFormat::Text, true) => Box::new(NoEvents),
        (OutputFormat::Text, false) if std::io::stderr().is_terminal() => {
            Box::new(ProgressReporter::new())
        }
        (OutputFormat::Text, false) => Box::new(SimpleProgress),
    }
}

async fn ask(cli: &Cli, app: &App, request: Request, token: CancellationToken) -> Result<()> {
    let use_case = RunRequestUseCase::new(app.gateway.clone(), app.registry.clone())
        .with_params(app.config.execution.to_params())
        .with_deliberation(app.orchestrator.clone())
        .with_context_store(app.contexts.clone())
        .with_audit_logger(app.audit.clone())
        .with_cancellation(token);

    let events = event_sink(cli);
    let output = use_case
        .execute_with_events(RunRequestInput::new(request), events.as_ref())
        .await?;
    drop(events);

    match cli.output {
        OutputFormat::Text => {
            print!("{}", ConsoleRenderer::request_output(&output));
            if let (Some(question), Some(context)) = (&output.question, &output.case_context) {
                print!(
                    "{}",
                    ConsoleRenderer::question(
                        question,
                        Some((context.tenant_id.as_str(), context.session_id.as_str()))
                    )
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", JsonRenderer::pretty(&JsonRenderer::request_output(&output)))
        }
    }

    match output.status {
        RequestStatus::Failed => bail!("request failed"),
        RequestStatus::Cancelled => bail!("request cancelled"),
        RequestStatus::Completed | RequestStatus::AwaitingClarification => Ok(()),
    }
}

async fn deliberate(
    cli: &Cli,
    app: &App,
    mut context: CaseContext,
    answer: Option<&str>,
    token: CancellationToken,
) -> Result<()> {
    let events = event_sink(cli);
    let token = Some(token);
    let outcome = match answer {
        Some(answer) => {
            app.orchestrator
                .resume(&mut context, answer, events.as_ref(), &token)
                .await
        }
        None => app.orchestrator.run(&mut context, events.as_ref(), &token).await,
    };
    drop(events);

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            for round in e.rounds_recorded() {
                eprintln!("preserved round: {}", round);
            }
            return Err(e.into());
        }
    };

    // Saved either way: a suspended context can be resumed, a finished
    // one records the clarifications it was answered with.
    if let Err(e) = app.contexts.save(&context).await {
        warn!(session = %context.session_id, error = %e, "Could not save case context");
    }

    match cli.output {
        OutputFormat::Text => match &outcome {
            DeliberationOutcome::Recommended(recommendation) => {
                print!("{}", ConsoleRenderer::recommendation(recommendation))
            }
            DeliberationOutcome::NeedsClarification(question) => print!(
                "{}",
                ConsoleRenderer::question(
                    question,
                    app.persistent
                        .then_some((context.tenant_id.as_str(), context.session_id.as_str()))
                )
            ),
        },
        OutputFormat::Json => println!(
            "{}",
            JsonRenderer::pretty(&JsonRenderer::deliberation(
                &context,
                outcome.recommendation(),
                outcome.question()
            ))
        ),
    }
    Ok(())
}

async fn audit(
    cli: &Cli,
    app: &App,
    tenant: &TenantId,
    session: &SessionId,
    public: bool,
) -> Result<()> {
    match (public, cli.output) {
        (true, OutputFormat::Text) => {
            let rounds = app.ledger.read_public(tenant, session).await?;
            print!("{}", ConsoleRenderer::audit_public(&rounds));
        }
        (true, OutputFormat::Json) => {
            let rounds = app.ledger.read_public(tenant, session).await?;
            println!("{}", JsonRenderer::pretty(&rounds));
        }
        (false, OutputFormat::Text) => {
            let rounds = app.ledger.read_all(tenant, session).await?;
            print!("{}", ConsoleRenderer::audit_full(&rounds));
        }
        (false, OutputFormat::Json) => {
            let rounds = app.ledger.read_all(tenant, session).await?;
            println!("{}", JsonRenderer::pretty(&rounds));
        }
    }
    Ok(())
}

fn show_config(cli: &Cli, config: &FileConfig) -> Result<()> {
    println!("Configuration sources (lowest to highest priority):");
    for source in ConfigLoader::sources(cli.config.as_deref()) {
        let mark = if source.found { "v" } else { "-" };
        println!("  {} {:<10} {}", mark, source.label, source.location);
    }
    println!();
    println!("Effective configuration:");
    println!(
        "{}",
        toml::to_string_pretty(config).context("Failed to render configuration")?
    );
    Ok(())
}
