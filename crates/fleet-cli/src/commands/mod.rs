//! Command implementations

pub mod action;
pub mod history;
pub mod info;
pub mod list;
pub mod poll;
pub mod register;
pub mod run;
pub mod status;
pub mod watch;

pub use action::action;
pub use history::history;
pub use info::info;
pub use list::list;
pub use poll::poll;
pub use register::register;
pub use run::{parse_param, run};
pub use status::set_status;
pub use watch::watch;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Flag cleared when the user presses Ctrl+C
pub(crate) fn interrupt_flag() -> anyhow::Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;
    Ok(running)
}
