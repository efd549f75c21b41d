//! Processor chain.
//!
//! Processors observe every resolved type in registration order. A
//! processor can veto further notification for an entity (it stays in the
//! catalog) or fail the scan. Before scanning, the chain's required scan
//! mode is OR-ed into the effective mode, so a processor never sees less
//! than it declared it needs.

use std::sync::Arc;

use tyscan_catalog::Entity;
use tyscan_common::ScanMode;

use crate::error::ScanError;

/// An observer of resolved types.
pub trait Processor {
    /// Name used in error reporting.
    fn name(&self) -> &str;

    /// The scan mode this processor requires.
    fn scan_mode(&self) -> ScanMode {
        ScanMode::empty()
    }

    /// Called once with the effective scan mode before the scan starts.
    fn set_scan_mode(&mut self, _mode: ScanMode) {}

    /// Observe one resolved type. Returning `Ok(false)` suppresses the
    /// remaining processors for this entity; an error aborts the scan.
    fn process_type(&mut self, entity: &Arc<Entity>) -> Result<bool, String>;
}

/// Ordered list of processors.
#[derive(Default)]
pub struct ProcessorChain {
    processors: Vec<Box<dyn Processor>>,
}

impl ProcessorChain {
    pub fn new() -> Self {
        ProcessorChain {
            processors: Vec::new(),
        }
    }

    pub fn register(&mut self, processor: Box<dyn Processor>) {
        self.processors.push(processor);
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// OR of every processor's required mode.
    pub fn required_mode(&self) -> ScanMode {
        self.processors
            .iter()
            .fold(ScanMode::empty(), |mode, p| mode | p.scan_mode())
    }

    /// Announce the effective mode to every processor.
    pub fn announce(&mut self, mode: ScanMode) {
        for processor in &mut self.processors {
            processor.set_scan_mode(mode);
        }
    }

    /// Notify processors of a resolved type, in registration order.
    pub fn dispatch(&mut self, entity: &Arc<Entity>) -> Result<(), ScanError> {
        for processor in &mut self.processors {
            match processor.process_type(entity) {
                Ok(true) => {}
                Ok(false) => break,
                Err(message) => {
                    return Err(ScanError::Processor {
                        name: processor.name().to_string(),
                        message,
                    });
                }
            }
        }
        Ok(())
    }
}
