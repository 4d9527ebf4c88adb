//! Descriptor-to-mode resolution.

use crate::descriptor::{lock_context, DescriptorShape, ModeDescriptor};
use crate::error::MbeError;
use crate::mode::{DynamicMode, Mode};
use mbelink_types::{ControlWord, TableMode};
use std::sync::Arc;
use tracing::{debug, warn};

/// Converts a caller-supplied descriptor into a backend-ready [`Mode`].
///
/// Pure transformation: no I/O, no blocking. For dynamic descriptors this
/// builds the deferred per-code callback and retains the descriptor (via
/// `Arc`) for as long as the callback lives.
pub fn resolve_descriptor(descriptor: &Arc<dyn ModeDescriptor>) -> Result<Mode, MbeError> {
    match descriptor.shape() {
        Some(DescriptorShape::Table) => {
            let index = descriptor
                .table_index()
                .map_err(|e| MbeError::InvalidDescriptor(e.to_string()))?;
            let index = u32::try_from(index).map_err(|_| {
                MbeError::InvalidDescriptor(format!("table index {index} out of range"))
            })?;
            Ok(Mode::Table(TableMode::new(index)))
        }
        Some(DescriptorShape::ControlWord) => {
            let payload = descriptor
                .control_word_payload()
                .map_err(|e| MbeError::InvalidDescriptor(e.to_string()))?;
            Ok(Mode::ControlWord(ControlWord::from_bytes(&payload)?))
        }
        Some(DescriptorShape::Dynamic) => {
            Ok(Mode::Dynamic(dynamic_bridge(Arc::clone(descriptor))))
        }
        None => Err(MbeError::UnsupportedMode),
    }
}

/// Builds the per-code resolution callback for a dynamic descriptor.
///
/// Each invocation holds the descriptor context guard across the
/// `mode_for` call and the conversion of whatever it returns, releasing it
/// before the resolved mode reaches the synthesis path. Failures here are
/// contained: the synthesis path sees "no mode for this code" and carries
/// on.
fn dynamic_bridge(descriptor: Arc<dyn ModeDescriptor>) -> DynamicMode {
    DynamicMode::new(move |code| {
        let guard = lock_context();

        let next = match descriptor.mode_for(code) {
            Ok(Some(next)) => next,
            Ok(None) => {
                debug!(code, "descriptor has no mode for code");
                return None;
            }
            Err(error) => {
                warn!(code, %error, "failed to get mode for code");
                return None;
            }
        };

        let resolved = match resolve_descriptor(&next) {
            Ok(mode) => Some(mode),
            Err(error) => {
                warn!(code, %error, "per-code mode resolution failed");
                None
            }
        };

        // No descriptor access beyond this point, even transitively.
        drop(guard);
        resolved
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{
        ControlWordDescriptor, DescriptorError, FnDescriptor, TableDescriptor,
    };

    fn descriptor(d: impl ModeDescriptor + 'static) -> Arc<dyn ModeDescriptor> {
        Arc::new(d)
    }

    /// Claims a shape without implementing its accessor.
    struct Hollow(DescriptorShape);

    impl ModeDescriptor for Hollow {
        fn shape(&self) -> Option<DescriptorShape> {
            Some(self.0)
        }
    }

    /// Not a mode descriptor at all, as far as the probe is concerned.
    struct Unrecognized;

    impl ModeDescriptor for Unrecognized {
        fn shape(&self) -> Option<DescriptorShape> {
            None
        }
    }

    #[test]
    fn table_index_resolves_verbatim() {
        for index in [0i64, 1, 33, u32::MAX as i64] {
            let mode = resolve_descriptor(&descriptor(TableDescriptor::new(index))).unwrap();
            match mode {
                Mode::Table(table) => assert_eq!(table.index as i64, index),
                other => panic!("expected table mode, got {:?}", other),
            }
        }
    }

    #[test]
    fn negative_table_index_is_invalid() {
        let result = resolve_descriptor(&descriptor(TableDescriptor::new(-1)));
        assert!(matches!(result, Err(MbeError::InvalidDescriptor(_))));
    }

    #[test]
    fn overflowing_table_index_is_invalid() {
        let result = resolve_descriptor(&descriptor(TableDescriptor::new(u32::MAX as i64 + 1)));
        assert!(matches!(result, Err(MbeError::InvalidDescriptor(_))));
    }

    #[test]
    fn control_word_of_wrong_size_is_a_size_mismatch() {
        for len in [0usize, 11, 13] {
            let result =
                resolve_descriptor(&descriptor(ControlWordDescriptor::new(vec![0u8; len])));
            assert!(
                matches!(result, Err(MbeError::SizeMismatch(_))),
                "length {len} should be a size mismatch"
            );
        }
    }

    #[test]
    fn control_word_words_round_trip_through_resolution() {
        let words = [100i16, -200, 300, -400, 500, -600];
        let mut payload = Vec::new();
        for word in words {
            payload.extend_from_slice(&word.to_ne_bytes());
        }

        let mode = resolve_descriptor(&descriptor(ControlWordDescriptor::new(payload))).unwrap();
        match mode {
            Mode::ControlWord(cw) => assert_eq!(cw.words(), &words),
            other => panic!("expected control word mode, got {:?}", other),
        }
    }

    #[test]
    fn unrecognized_descriptor_is_unsupported() {
        assert!(matches!(
            resolve_descriptor(&descriptor(Unrecognized)),
            Err(MbeError::UnsupportedMode)
        ));
    }

    #[test]
    fn missing_accessor_is_an_invalid_descriptor() {
        for shape in [DescriptorShape::Table, DescriptorShape::ControlWord] {
            let result = resolve_descriptor(&descriptor(Hollow(shape)));
            match result {
                Err(MbeError::InvalidDescriptor(reason)) => {
                    assert!(reason.contains("does not implement"), "got: {reason}")
                }
                other => panic!("expected InvalidDescriptor, got {:?}", other),
            }
        }
    }

    #[test]
    fn dynamic_none_sentinel_yields_no_mode() {
        let dynamic = resolve_descriptor(&descriptor(FnDescriptor::new(|code| {
            (code != 0x05).then(|| descriptor(TableDescriptor::new(1)))
        })))
        .unwrap();

        let Mode::Dynamic(dynamic) = dynamic else {
            panic!("expected dynamic mode");
        };
        assert!(dynamic.mode_for(0x05).is_none());
        assert!(matches!(dynamic.mode_for(0x01), Some(Mode::Table(_))));
    }

    #[test]
    fn dynamic_accessor_failure_is_contained() {
        struct Failing;

        impl ModeDescriptor for Failing {
            fn shape(&self) -> Option<DescriptorShape> {
                Some(DescriptorShape::Dynamic)
            }

            fn mode_for(
                &self,
                _code: u8,
            ) -> Result<Option<Arc<dyn ModeDescriptor>>, DescriptorError> {
                Err(DescriptorError::Failed("backend table unavailable".into()))
            }
        }

        let Mode::Dynamic(dynamic) = resolve_descriptor(&descriptor(Failing)).unwrap() else {
            panic!("expected dynamic mode");
        };
        assert!(dynamic.mode_for(0x02).is_none());
    }

    #[test]
    fn dynamic_chain_terminates_at_the_innermost_concrete_mode() {
        let words = [1i16, 2, 3, 4, 5, 6];
        let mut payload = Vec::new();
        for word in words {
            payload.extend_from_slice(&word.to_ne_bytes());
        }

        let inner_payload = payload.clone();
        let inner = FnDescriptor::new(move |_code| {
            Some(descriptor(ControlWordDescriptor::new(inner_payload.clone())))
        });
        let inner = Arc::new(inner);
        let outer = FnDescriptor::new(move |_code| {
            Some(Arc::clone(&inner) as Arc<dyn ModeDescriptor>)
        });

        let Mode::Dynamic(dynamic) = resolve_descriptor(&descriptor(outer)).unwrap() else {
            panic!("expected dynamic mode");
        };

        // One step only unwraps the outer layer.
        assert!(matches!(dynamic.resolve_step(0x00), Some(Mode::Dynamic(_))));

        // The driver follows the chain to the control word.
        match dynamic.mode_for(0x00) {
            Some(Mode::ControlWord(cw)) => assert_eq!(cw.words(), &words),
            other => panic!("expected control word mode, got {:?}", other),
        }
    }

    #[test]
    fn dynamic_resolution_works_from_a_foreign_thread() {
        let dynamic = resolve_descriptor(&descriptor(FnDescriptor::new(|code| {
            Some(descriptor(TableDescriptor::new(i64::from(code))))
        })))
        .unwrap();

        let Mode::Dynamic(dynamic) = dynamic else {
            panic!("expected dynamic mode");
        };

        let handle = std::thread::spawn(move || dynamic.mode_for(0x21));
        match handle.join().unwrap() {
            Some(Mode::Table(table)) => assert_eq!(table.index, 0x21),
            other => panic!("expected table mode, got {:?}", other),
        }
    }
}
