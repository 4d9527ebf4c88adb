//! Backend-ready codec modes.

use mbelink_proto::ModeSpec;
use mbelink_types::{ControlWord, TableMode};
use std::fmt;
use std::sync::Arc;

/// A resolved codec mode, ready to configure a synthesizer backend.
#[derive(Debug, Clone)]
pub enum Mode {
    Table(TableMode),
    ControlWord(ControlWord),
    Dynamic(DynamicMode),
}

impl Mode {
    /// Wire form of this mode. Dynamic modes have none; their per-frame
    /// resolutions ride with each frame instead.
    pub(crate) fn to_spec(&self) -> Option<ModeSpec> {
        match self {
            Self::Table(table) => Some(ModeSpec::Table(*table)),
            Self::ControlWord(word) => Some(ModeSpec::ControlWord(*word)),
            Self::Dynamic(_) => None,
        }
    }
}

type ResolveFn = dyn Fn(u8) -> Option<Mode> + Send + Sync;

/// A mode resolved per-frame through a caller-supplied callback.
///
/// Clones share the callback and the descriptor it captured; the
/// descriptor lives for as long as any clone does.
#[derive(Clone)]
pub struct DynamicMode {
    resolve: Arc<ResolveFn>,
}

impl DynamicMode {
    pub fn new<F>(resolve: F) -> Self
    where
        F: Fn(u8) -> Option<Mode> + Send + Sync + 'static,
    {
        Self {
            resolve: Arc::new(resolve),
        }
    }

    /// Invokes the callback once for `code`. The result may itself be
    /// dynamic; resolution failure surfaces as `None`.
    pub fn resolve_step(&self, code: u8) -> Option<Mode> {
        (self.resolve)(code)
    }

    /// Resolves `code` to a concrete mode, following chains of dynamic
    /// modes until one yields a table or control-word mode or reports no
    /// mode. Chain depth is bounded only by the descriptor protocol itself.
    pub fn mode_for(&self, code: u8) -> Option<Mode> {
        let mut current = self.clone();
        loop {
            match current.resolve_step(code)? {
                Mode::Dynamic(next) => current = next,
                concrete => return Some(concrete),
            }
        }
    }
}

impl fmt::Debug for DynamicMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicMode").finish_non_exhaustive()
    }
}
