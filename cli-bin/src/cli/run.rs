// src/cli/run.rs

use anyhow::{Context, Result};
use libvigil::{Config, Error, Monitor, Timeout};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::RunOpts;

pub fn run(opts: &RunOpts) -> Result<()> {
    let mut config = Config::load();
    if let Some(ms) = opts.settle_ms {
        config.settle = Duration::from_millis(ms);
    }
    config.skip_empty = opts.skip_empty;
    config.track_modify = !opts.no_modify;
    if opts.exclude.is_some() {
        config.exclude = opts.exclude.clone();
    }

    let roots: Vec<PathBuf> = opts
        .roots
        .iter()
        .map(|p| p.canonicalize().unwrap_or_else(|_| p.clone()))
        .collect();

    let mut monitor =
        Monitor::new(&roots, config.clone()).context("could not start watching")?;
    info!(
        roots = roots.len(),
        watches = monitor.watch_count(),
        "watching"
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("could not install the interrupt handler")?;

    // Bounded by the settle period so quiet files are flushed promptly
    // and the stop flag is noticed.
    let tick = Timeout::Bounded(config.settle.max(Duration::from_millis(100)));
    while running.load(Ordering::SeqCst) {
        let ready = match monitor.poll(tick) {
            Ok(ready) => ready,
            Err(Error::OverCapacity { pending, limit }) => {
                // Far more is queued than we can ever catch up with;
                // carrying on would just replay a corrupt backlog.
                error!(pending, limit, "event backlog exceeded capacity, stopping");
                break;
            }
            Err(e) => {
                error!("watch failed: {e}");
                break;
            }
        };
        for path in ready {
            if let Err(e) = handle(&path, opts.exec.as_deref()) {
                error!(path = %path.display(), "handler failed: {e:#}");
            }
            // Whatever the handler wrote becomes the new baseline.
            monitor.note_handled(&path);
        }
    }
    info!("stopped");
    Ok(())
}

/// Runs the configured handler for one settled path, or just announces
/// the path when no handler was given.
fn handle(path: &Path, exec: Option<&str>) -> Result<()> {
    let Some(template) = exec else {
        println!("{}", path.display());
        return Ok(());
    };

    let path_str = path.to_string_lossy();
    let quoted = shlex::try_quote(&path_str).unwrap_or_else(|_| path_str.clone());
    let final_cmd = if template.contains("{}") {
        template.replace("{}", &quoted)
    } else {
        format!("{template} {quoted}")
    };

    let mut parts =
        shlex::split(&final_cmd).with_context(|| format!("unparsable command `{final_cmd}`"))?;
    if parts.is_empty() {
        anyhow::bail!("empty handler command");
    }
    let prog = parts.remove(0);

    info!(path = %path.display(), command = %final_cmd, "handler start");
    let output = Command::new(&prog)
        .args(parts)
        .output()
        .with_context(|| format!("could not spawn `{prog}`"))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        info!(handler = %prog, "{line}");
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines() {
        warn!(handler = %prog, "{line}");
    }

    if output.status.success() {
        info!(path = %path.display(), "handler done");
    } else {
        warn!(path = %path.display(), code = ?output.status.code(), "handler failed");
    }
    Ok(())
}
