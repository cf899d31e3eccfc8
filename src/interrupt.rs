//! Ctrl-C handling.
//!
//! The handler only raises a flag; the aggregator polls it between entries
//! and unwinds with [`crate::error::AnalyzerError::Interrupted`].

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Install a process-wide Ctrl-C handler that raises the returned flag.
pub fn install_handler() -> Result<InterruptFlag> {
    let flag = InterruptFlag::new();
    let handler_flag = flag.clone();

    ctrlc::set_handler(move || {
        tracing::info!("Interrupt received, stopping analysis");
        handler_flag.raise();
    })
    .context("Failed to install Ctrl-C handler")?;

    Ok(flag)
}
