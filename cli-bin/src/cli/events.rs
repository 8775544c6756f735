// src/cli/events.rs
//
// Raw event dump, useful for checking what the kernel actually delivers
// for a given workload before tuning the run subcommand.

use anyhow::{Context, Result};
use libvigil::{Engine, EventMask, Timeout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::EventsOpts;

pub fn run(opts: &EventsOpts) -> Result<()> {
    let root = opts.root.canonicalize().unwrap_or_else(|_| opts.root.clone());
    let mut engine = Engine::open(
        &[root.clone()],
        EventMask::WATCHABLE,
        opts.exclude.as_deref(),
    )
    .context("could not start watching")?;
    info!(root = %root.display(), watches = engine.watch_count(), "dumping events, ^C to stop");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("could not install the interrupt handler")?;

    while running.load(Ordering::SeqCst) {
        let event = engine.wait(Timeout::Bounded(Duration::from_millis(500)))?;
        if let Some(event) = event {
            if event.cookie != 0 {
                println!(
                    "{:<28} cookie={:<10} {}",
                    describe(event.mask),
                    event.cookie,
                    event.path.display()
                );
            } else {
                println!("{:<28} {}", describe(event.mask), event.path.display());
            }
        }
    }
    Ok(())
}

fn describe(mask: EventMask) -> String {
    const NAMES: &[(EventMask, &str)] = &[
        (EventMask::ACCESS, "access"),
        (EventMask::MODIFY, "modify"),
        (EventMask::ATTRIB, "attrib"),
        (EventMask::CLOSE_WRITE, "close-write"),
        (EventMask::CLOSE_NOWRITE, "close-nowrite"),
        (EventMask::OPEN, "open"),
        (EventMask::MOVED_FROM, "moved-from"),
        (EventMask::MOVED_TO, "moved-to"),
        (EventMask::CREATE, "create"),
        (EventMask::DELETE, "delete"),
        (EventMask::DELETE_SELF, "delete-self"),
        (EventMask::MOVE_SELF, "move-self"),
        (EventMask::UNMOUNT, "unmount"),
        (EventMask::Q_OVERFLOW, "overflow"),
        (EventMask::IGNORED, "ignored"),
        (EventMask::ISDIR, "dir"),
    ];
    let parts: Vec<&str> = NAMES
        .iter()
        .filter(|(bit, _)| mask.contains(*bit))
        .map(|(_, name)| *name)
        .collect();
    if parts.is_empty() {
        format!("unknown(0x{:08x})", mask.bits())
    } else {
        parts.join("+")
    }
}
