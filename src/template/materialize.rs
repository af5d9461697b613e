// src/template/materialize.rs

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::{Result, SupervisorError};
use crate::fs::FileSystem;

use super::render::render;
use super::Substitution;

/// Render `template_path` with `substitutions` and write the result to
/// `output_path`. Returns the path written.
///
/// With a distinct `output_path` the template is never touched, so calling
/// this repeatedly produces the same bytes every time.
///
/// When `output_path == template_path` the template is overwritten. The
/// placeholders are gone after the first call, so every later call writes
/// back the same text unchanged; the template has to be restored from a
/// pristine copy before new values can take effect.
pub fn materialize(
    fs: &dyn FileSystem,
    template_path: &Path,
    substitutions: &[Substitution],
    output_path: &Path,
) -> Result<PathBuf> {
    for sub in substitutions {
        if sub.value.trim().is_empty() {
            return Err(SupervisorError::config(format!(
                "no value for placeholder '{}'",
                sub.placeholder
            )));
        }
    }

    if !fs.is_file(template_path) {
        return Err(SupervisorError::config(format!(
            "config template {:?} does not exist",
            template_path
        )));
    }

    let text = fs.read_to_string(template_path).map_err(|e| {
        SupervisorError::config(format!("reading template {:?}: {e:#}", template_path))
    })?;

    for sub in substitutions {
        if !text.contains(sub.placeholder.as_str()) {
            if output_path == template_path {
                warn!(
                    template = ?template_path,
                    placeholder = %sub.placeholder,
                    "placeholder not found; the template was already materialized in place"
                );
            } else {
                debug!(
                    template = ?template_path,
                    placeholder = %sub.placeholder,
                    "placeholder not present in template"
                );
            }
        }
    }

    let rendered = render(&text, substitutions);

    fs.write(output_path, rendered.as_bytes()).map_err(|e| {
        SupervisorError::config(format!("writing rendered config {:?}: {e:#}", output_path))
    })?;

    info!(
        template = ?template_path,
        output = ?output_path,
        substitutions = substitutions.len(),
        "materialized relay config"
    );

    Ok(output_path.to_path_buf())
}
