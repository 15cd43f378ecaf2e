/// Compiled shader loading

use std::path::Path;
use crate::error::{Error, Result};

/// Load a compiled SPIR-V shader from disk
///
/// SPIR-V is a stream of 32-bit words, so a valid file size is always a
/// multiple of 4. Shader compilation itself is out of scope; shaders are
/// compiled offline (e.g. with glslc) and loaded here as bytes.
///
/// # Arguments
///
/// * `path` - Path to the compiled .spv file
///
/// # Errors
///
/// Returns `Error::ShaderLoad` naming the path on any I/O failure or when
/// the file size is not a multiple of 4.
pub fn load_compiled_shader(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|e| Error::ShaderLoad {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return Err(Error::ShaderLoad {
            path: path.display().to_string(),
            message: format!("invalid SPIR-V size: {} bytes", bytes.len()),
        });
    }

    Ok(bytes)
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
