//! Interactive session: pick an appliance, then read directives and JSON
//! commands line by line until `quit` or end of input.

use std::fmt::Write as _;
use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};

use appliprobe_core::session::DIRECTIVE_HELP;
use appliprobe_core::{
    ApplianceClient, CommandReport, CommandResult, CoreError, Directive, Input, Reply, Session,
    SessionContext, SessionOptions, StateSnapshot,
};

use crate::cli::{GlobalOpts, SessionArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::appliances;

pub async fn handle(
    client: &ApplianceClient,
    args: SessionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let painter = Painter::new(&global.color);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session = Session::new(client).with_options(SessionOptions {
        state_after: args.state_after,
    });

    let directory =
        output::with_spinner("Fetching appliances", global.quiet, session.load_directory())
            .await?;
    output::print_output(
        &appliances::render_directory(&global.output, directory.records()),
        global.quiet,
    );
    let count = directory.len();

    // ── Selection ──
    if let Some(choice) = args.appliance.as_deref() {
        if session.select(choice).is_none() {
            return Err(CliError::NotFound {
                resource_type: "Appliance".into(),
                identifier: choice.into(),
            });
        }
    } else {
        loop {
            prompt(&format!("Select appliance [1-{count}]: "));
            let Some(line) = lines.next_line().await? else {
                return Ok(());
            };
            if session.select(&line).is_some() {
                break;
            }
            println!(
                "{}",
                painter.err(&format!("Invalid selection '{}'", line.trim()))
            );
        }
    }

    let initial =
        output::with_spinner("Loading capabilities", global.quiet, session.activate()).await?;
    if let Some(ctx) = session.context() {
        println!("{}", banner(ctx, initial.as_ref(), painter));
    }

    // ── Command loop ──
    loop {
        let seq = session.context().map_or(0, |c| c.counters.commands()) + 1;
        prompt(&format!("[{seq}]> "));
        let line = lines.next_line().await?;

        let networked = line.as_deref().is_some_and(|l| {
            matches!(Input::classify(l), Input::Directive(Directive::State) | Input::Payload(_))
        });
        let reply = if networked {
            output::with_spinner(
                "Waiting for the service",
                global.quiet,
                session.handle_line(line.as_deref()),
            )
            .await
        } else {
            session.handle_line(line.as_deref()).await
        };

        if matches!(reply, Reply::Quit) {
            return Ok(());
        }
        let text = render_reply(&reply, painter);
        if !text.is_empty() {
            println!("{text}");
        }
    }
}

fn prompt(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, "{text}");
    let _ = stdout.flush();
}

// ── Rendering ───────────────────────────────────────────────────────

const PARSE_HINT: &str = r#"hint: commands are single-line JSON objects, e.g. {"cavityLight": true}"#;

fn banner(ctx: &SessionContext, initial: Option<&StateSnapshot>, painter: Painter) -> String {
    let a = &ctx.appliance;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} ({})",
        painter.accent("Session:"),
        a.display_name,
        a.appliance_id
    );
    let _ = writeln!(
        out,
        "  Brand: {}  Model: {}  Type: {}",
        ctx.info.brand(),
        a.resolved_model,
        a.appliance_type
    );
    let caps = if ctx.catalog.is_empty() {
        "none reported".to_owned()
    } else {
        format!("{} ({} writable)", ctx.catalog.len(), ctx.catalog.writable_count())
    };
    let _ = writeln!(out, "  Capabilities: {caps}");
    match initial {
        Some(snapshot) => {
            let _ = writeln!(
                out,
                "  Connection: {}  State: {}",
                snapshot.connection_state(),
                snapshot.appliance_state().unwrap_or("-")
            );
        }
        None => {
            let _ = writeln!(out, "  {}", painter.warn("Initial state unavailable"));
        }
    }
    let _ = write!(out, "{}", painter.dim("Type 'help' for directives."));
    out
}

/// Render one loop reply for the console.
fn render_reply(reply: &Reply, painter: Painter) -> String {
    match reply {
        Reply::Nothing | Reply::Quit => String::new(),
        Reply::Help => render_help(),
        Reply::State(snapshot) => snapshot.to_pretty(),
        Reply::Command(report) => render_report(report, painter),
        Reply::ParseError(err) => format!(
            "{}\n{}",
            painter.err(&err.to_string()),
            painter.dim(PARSE_HINT)
        ),
        Reply::Failure(err) => render_failure(None, err, painter),
    }
}

fn render_help() -> String {
    let width = DIRECTIVE_HELP.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    DIRECTIVE_HELP
        .iter()
        .map(|(key, what)| format!("  {key:<width$}  {what}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_report(report: &CommandReport, painter: Painter) -> String {
    let mut out = String::new();
    for note in &report.notes {
        let _ = writeln!(out, "{}", painter.warn(&format!("note: {note}")));
    }

    let seq = report.seq;
    match &report.outcome {
        Ok(CommandResult::Accepted { response_body }) => {
            let _ = write!(out, "{}", painter.ok(&format!("#{seq} accepted")));
            if !response_body.is_null() {
                let _ = write!(out, "\n{}", output::render_json_pretty(response_body));
            }
        }
        Ok(CommandResult::Rejected {
            error_code,
            message,
            detail,
        }) => {
            let _ = write!(
                out,
                "{}",
                painter.err(&format!("#{seq} rejected ({error_code}): {message}"))
            );
            if let Some(detail) = detail {
                let _ = write!(out, "\n  detail: {detail}");
            }
        }
        Err(err) => out.push_str(&render_failure(Some(seq), err, painter)),
    }

    if let Some(snapshot) = &report.state_after {
        let _ = write!(out, "\n{}", snapshot.to_pretty());
    }
    out
}

fn render_failure(seq: Option<u64>, err: &CoreError, painter: Painter) -> String {
    let head = match seq {
        Some(seq) => format!("#{seq} failed: {err}"),
        None => format!("failed: {err}"),
    };
    let mut out = painter.err(&head);
    if let Some(hint) = err.retry_hint() {
        let _ = write!(out, "\n{}", painter.dim(&format!("hint: {hint}")));
    }
    out
}
