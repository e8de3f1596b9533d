//! Binding of an image's import manifest against a capability environment.

use crate::env::CapabilityEnv;
use crate::error::{Error, ResolutionError};
use crate::externs::ExternValue;
use crate::module::ModuleImage;
use vessel_module::ExternType;

/// Resolve every import the image declares against the capabilities the
/// environment offers.
///
/// Resolution is all or nothing: the returned vector has exactly one entry
/// per manifest entry, in manifest order, or the whole operation fails with
/// the first mismatch found. No guest code runs here; a resolved vector is
/// input to [`new_instance_handle()`](crate::instance::new_instance_handle).
pub fn resolve_imports(
    module: &dyn ModuleImage,
    env: &CapabilityEnv,
) -> Result<Vec<ExternValue>, Error> {
    let offered = env.import_table();
    let mut resolved = Vec::with_capacity(module.imports().len());
    for import in module.imports() {
        let handle = offered
            .iter()
            .find(|(m, f, _)| *m == import.module() && *f == import.field())
            .map(|(_, _, handle)| handle.clone())
            .ok_or_else(|| ResolutionError::UnknownImport(import.symbol()))?;
        match import.ty() {
            ExternType::Func(required) => {
                if *required != handle.sig {
                    return Err(ResolutionError::SignatureMismatch {
                        import: import.symbol(),
                        required: required.clone(),
                        offered: handle.sig.clone(),
                    }
                    .into());
                }
                resolved.push(ExternValue::Func(handle));
            }
            other => {
                // The environment only synthesizes functions; an import of
                // any other kind cannot be satisfied.
                return Err(ResolutionError::KindMismatch {
                    import: import.symbol(),
                    required: other.kind(),
                    offered: vessel_module::ExternKind::Func,
                }
                .into());
            }
        }
    }
    tracing::debug!(count = resolved.len(), "resolved import manifest");
    Ok(resolved)
}
