//! Caller-supplied mode descriptors and the context guard for calling
//! back into their owning code.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// The recognized descriptor shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorShape {
    /// Exposes a lookup-table index.
    Table,
    /// Exposes a 12-byte control word payload.
    ControlWord,
    /// Exposes a per-code resolution method.
    Dynamic,
}

/// Failure reported by a descriptor accessor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The descriptor claims a shape but does not implement its accessor.
    #[error("descriptor does not implement `{0}`")]
    MissingAccessor(&'static str),

    /// The accessor itself failed.
    #[error("{0}")]
    Failed(String),
}

/// A caller-supplied, not-yet-resolved codec mode.
///
/// Implementations bridge whatever object model the caller uses into the
/// three shapes the resolver understands. [`shape`](Self::shape) is the
/// capability probe: it classifies the descriptor into exactly one shape,
/// or `None` when the value is not a recognized mode at all. Each
/// shape-specific accessor defaults to [`DescriptorError::MissingAccessor`],
/// so a descriptor that claims a shape without backing it up fails loudly
/// during resolution.
///
/// Dynamic descriptors are retained by the resolved mode (via `Arc`) and
/// may be called from synthesis threads; see [`lock_context`] for the
/// access rule.
pub trait ModeDescriptor: Send + Sync {
    /// Classifies this descriptor into one recognized shape, if any.
    fn shape(&self) -> Option<DescriptorShape>;

    /// Table shape: the mode-table index.
    ///
    /// Returned as `i64` so negative or oversized values reach the resolver
    /// and are rejected there instead of being silently truncated.
    fn table_index(&self) -> Result<i64, DescriptorError> {
        Err(DescriptorError::MissingAccessor("table_index"))
    }

    /// Control-word shape: the raw byte payload.
    fn control_word_payload(&self) -> Result<Vec<u8>, DescriptorError> {
        Err(DescriptorError::MissingAccessor("control_word_payload"))
    }

    /// Dynamic shape: the descriptor for `code`, or `None` when the
    /// descriptor has no mode for that code.
    fn mode_for(&self, code: u8) -> Result<Option<Arc<dyn ModeDescriptor>>, DescriptorError> {
        let _ = code;
        Err(DescriptorError::MissingAccessor("mode_for"))
    }
}

/// Serializes every call back into descriptor-owning code.
///
/// The dynamic-resolution callback runs on whatever thread drives
/// synthesis, while the descriptor's owner lives elsewhere. The rule: no
/// descriptor access outside the guarded region, including transitively
/// after release. Chained dynamic resolution re-acquires between steps
/// rather than re-entering while held.
static DESCRIPTOR_CONTEXT: Mutex<()> = Mutex::new(());

/// Acquires the descriptor context guard.
///
/// A poisoned guard is recovered, not propagated: a panicking callback
/// must not wedge every later resolution.
pub(crate) fn lock_context() -> MutexGuard<'static, ()> {
    DESCRIPTOR_CONTEXT
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Table-shaped descriptor backed by a plain index value.
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    index: i64,
}

impl TableDescriptor {
    pub fn new(index: i64) -> Self {
        Self { index }
    }
}

impl ModeDescriptor for TableDescriptor {
    fn shape(&self) -> Option<DescriptorShape> {
        Some(DescriptorShape::Table)
    }

    fn table_index(&self) -> Result<i64, DescriptorError> {
        Ok(self.index)
    }
}

/// Control-word-shaped descriptor backed by a byte payload.
///
/// The payload is validated during resolution, not construction, so a
/// wrong-sized payload surfaces through the resolver's error taxonomy.
#[derive(Debug, Clone)]
pub struct ControlWordDescriptor {
    payload: Vec<u8>,
}

impl ControlWordDescriptor {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

impl ModeDescriptor for ControlWordDescriptor {
    fn shape(&self) -> Option<DescriptorShape> {
        Some(DescriptorShape::ControlWord)
    }

    fn control_word_payload(&self) -> Result<Vec<u8>, DescriptorError> {
        Ok(self.payload.clone())
    }
}

/// Dynamic-shaped descriptor backed by a closure.
///
/// The closure maps a frame code to the next descriptor, or `None` when no
/// mode applies to that code.
pub struct FnDescriptor<F> {
    resolve: F,
}

impl<F> FnDescriptor<F>
where
    F: Fn(u8) -> Option<Arc<dyn ModeDescriptor>> + Send + Sync,
{
    pub fn new(resolve: F) -> Self {
        Self { resolve }
    }
}

impl<F> ModeDescriptor for FnDescriptor<F>
where
    F: Fn(u8) -> Option<Arc<dyn ModeDescriptor>> + Send + Sync,
{
    fn shape(&self) -> Option<DescriptorShape> {
        Some(DescriptorShape::Dynamic)
    }

    fn mode_for(&self, code: u8) -> Result<Option<Arc<dyn ModeDescriptor>>, DescriptorError> {
        Ok((self.resolve)(code))
    }
}
