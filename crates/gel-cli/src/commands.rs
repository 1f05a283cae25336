//! Command implementations for the gel CLI.

use crate::config::GelConfig;
use crate::{ExpandArgs, TraceFormat};
use anyhow::{Context, Result};
use gel_backend::{Backend, FileBackend, PsqlBackend, WriterBackend};
use gel_compiler::{BuildOutput, Builder};
use gel_core::{MatchMode, NoopSubscriber, Subscriber};
use gel_runtime::{ConsoleSubscriber, JsonSubscriber};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Get the source path (argument or current directory).
fn source_path(args: &ExpandArgs) -> PathBuf {
    args.path
        .clone()
        .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn create_subscriber(format: TraceFormat) -> Box<dyn Subscriber> {
    match format {
        TraceFormat::Off => Box::new(NoopSubscriber),
        TraceFormat::Console => Box::new(ConsoleSubscriber::stderr()),
        TraceFormat::Json => Box::new(JsonSubscriber::new(std::io::stderr())),
    }
}

/// Apply command-line flags on top of the file configuration.
fn merge_flags(mut config: GelConfig, args: &ExpandArgs) -> GelConfig {
    if let Some(ext) = &args.ext {
        config.extension = Some(ext.clone());
    }
    if args.strict_markers {
        config.expander.match_mode = MatchMode::Word;
    }
    if args.close_at_namespace {
        config.expander.close_at_namespace_boundary = true;
    }
    config
}

fn build(args: &ExpandArgs) -> Result<(GelConfig, BuildOutput)> {
    let root = source_path(args);
    let config = merge_flags(GelConfig::load(&root)?, args);

    let mut builder = Builder::new(&root)
        .with_options(config.expander)
        .with_subscriber(create_subscriber(args.trace));
    if let Some(ext) = &config.extension {
        builder = builder.with_extension(ext.clone());
    }

    let output = builder
        .build()
        .with_context(|| format!("Failed to expand sources in {}", root.display()))?;
    Ok((config, output))
}

/// Compile command: expand sources and print or write the result.
pub fn compile(args: &ExpandArgs, output: Option<PathBuf>) -> Result<()> {
    let (config, expanded) = build(args)?;

    match output.or(config.output) {
        Some(path) => {
            FileBackend::new(&path).execute(&expanded.sql)?;
            println!(
                "Compiled {} file(s), {} block(s) -> {}",
                expanded.files.len(),
                expanded.summary.blocks_opened,
                path.display()
            );
            if expanded.summary.forced_close {
                println!("  note: last block was not terminated and was closed at end of input");
            }
        }
        None => {
            WriterBackend::new(std::io::stdout()).execute(&expanded.sql)?;
        }
    }

    Ok(())
}

/// Run command: expand sources and pipe the result into psql.
pub fn run(
    args: &ExpandArgs,
    database: Option<String>,
    psql: Option<String>,
    no_error_stop: bool,
) -> Result<()> {
    let (config, expanded) = build(args)?;

    let mut psql_config = config.psql;
    if let Some(database) = database {
        psql_config.database = Some(database);
    }
    if let Some(program) = psql {
        psql_config.program = program;
    }
    if no_error_stop {
        psql_config.on_error_stop = false;
    }

    let backend = PsqlBackend::new(psql_config);
    let report = backend
        .execute(&expanded.sql)
        .with_context(|| format!("Failed to run {}", backend.config().program))?;

    info!(
        files = expanded.files.len(),
        bytes = report.bytes,
        database = ?backend.config().database,
        "sources executed"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(path: PathBuf) -> ExpandArgs {
        ExpandArgs {
            path: Some(path),
            ext: None,
            trace: TraceFormat::Off,
            strict_markers: false,
            close_at_namespace: false,
        }
    }

    #[test]
    fn test_flags_override_config() {
        let mut flags = args(PathBuf::from("."));
        flags.ext = Some("psql".into());
        flags.strict_markers = true;
        flags.close_at_namespace = true;

        let config = merge_flags(GelConfig::default(), &flags);

        assert_eq!(config.extension.as_deref(), Some("psql"));
        assert_eq!(config.expander.match_mode, MatchMode::Word);
        assert!(config.expander.close_at_namespace_boundary);
    }

    #[test]
    fn test_compile_to_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("math.sql"),
            "func! add(a int, b int) returns int as\n  select a + b;\n",
        )
        .unwrap();
        let out = dir.path().join("out").join("schema.sql");

        compile(&args(dir.path().to_path_buf()), Some(out.clone())).unwrap();

        let sql = std::fs::read_to_string(out).unwrap();
        assert!(sql.starts_with("drop schema if exists math cascade;\ncreate schema math;\n"));
        assert!(sql.contains("CREATE OR REPLACE function math.add(a int, b int) returns int as\n"));
        assert!(sql.ends_with("$$ ; \n\n"));
    }
}
