use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use engine_logging::{engine_error, engine_info};
use monitor_core::{update, JobId, MonitorState, Msg};
use monitor_engine::{system_clock, EngineHandle, ReqwestGateway};
use indicatif::ProgressBar;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::cli::Args;
use super::config::MonitorConfig;
use super::effects::EffectRunner;
use super::input::{Command, CommandReader, CANCEL_PROMPT};
use super::logging;
use super::navigation::TerminalNavigator;
use super::ui::render::ProgressRenderer;

pub fn run_app() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    logging::initialize(args.log);

    let mut config = MonitorConfig::load(args.config.as_deref())?;
    config.apply_overrides(&args);
    config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    let outcome = runtime.block_on(monitor_job(args.job, config));
    // Stdin is read on a blocking thread that never returns on its own.
    runtime.shutdown_timeout(Duration::from_millis(100));
    outcome
}

async fn monitor_job(job_id: JobId, config: MonitorConfig) -> anyhow::Result<ExitCode> {
    let gateway = ReqwestGateway::new(config.gateway_settings())
        .context("failed to create job gateway")?;
    let (engine, events) = EngineHandle::new(
        Arc::new(gateway),
        tokio::runtime::Handle::current(),
        system_clock(),
    );
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
    let runner = EffectRunner::new(engine, events, msg_tx.clone(), Arc::new(TerminalNavigator));

    let mut renderer = ProgressRenderer::new(job_id);
    spawn_input_listener(msg_tx.clone(), renderer.printer());
    renderer.notice("Type `c` + Enter to cancel the job, `q` or Ctrl-C to stop watching.");
    let mut state = MonitorState::with_settings(config.monitor_settings());
    engine_info!("Attaching to job {} at {}", job_id, config.api_base_url);
    let _ = msg_tx.send(Msg::Attached {
        job_id,
        at: Utc::now(),
    });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        let msg = next_msg(&mut msg_rx, &mut ctrl_c).await;
        let detaching = matches!(msg, Msg::Detached);

        let (next, effects) = update(state, msg);
        state = next;
        let navigated = runner.run(effects);

        if state.consume_dirty() {
            renderer.render(&state.view());
        }

        if let Some(error) = state.load_error() {
            engine_error!("Job {} cannot be monitored: {}", job_id, error);
            renderer.fail(error);
            runner.shutdown();
            return Ok(ExitCode::FAILURE);
        }
        if navigated.is_some() {
            renderer.finish();
            runner.shutdown();
            return Ok(ExitCode::SUCCESS);
        }
        if detaching {
            engine_info!("Stopped watching job {}", job_id);
            renderer.abandon();
            runner.shutdown();
            return Ok(ExitCode::SUCCESS);
        }
    }
}

/// Next message to apply; a closed channel or a fired `stop` reads as detaching.
async fn next_msg<S>(msg_rx: &mut mpsc::UnboundedReceiver<Msg>, stop: &mut S) -> Msg
where
    S: Future + Unpin,
{
    tokio::select! {
        msg = msg_rx.recv() => msg.unwrap_or(Msg::Detached),
        _ = stop => Msg::Detached,
    }
}

/// Turns stdin commands into messages: `c` then `y` cancels, `q` stops watching.
fn spawn_input_listener(msg_tx: mpsc::UnboundedSender<Msg>, printer: ProgressBar) {
    tokio::spawn(async move {
        let mut reader = CommandReader::default();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let msg = match reader.read(&line) {
                Command::Send(msg) => msg,
                Command::Confirm => {
                    printer.println(CANCEL_PROMPT);
                    continue;
                }
                Command::Ignore => continue,
            };
            if msg_tx.send(msg).is_err() {
                break;
            }
        }
    });
}
