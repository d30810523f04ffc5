//! License file emission.
//!
//! The emitted license carries a scope-of-applicability notice ahead of the
//! license text itself, making explicit that the license covers the
//! generated wrapper code and not the wrapped binaries. The notice is
//! prepended exactly once: reruns detect its presence and leave the file
//! alone.

use std::path::Path;

use crate::forge::error::{ErrorExt, Result};

/// Notice prepended ahead of the license text.
pub const SCOPE_NOTICE: &str = "\
The license below applies to the wrapper code generated by jll-forge.
The binary artifacts downloaded and wrapped by this package are covered
by the licenses of their own upstream projects.
";

const DEFAULT_LICENSE: &str = "\
MIT License

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the \"Software\"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
";

/// Writes `LICENSE` under `package_dir`.
///
/// Priority for the license body: an already-written `LICENSE` file, then
/// `discovered` text, then a generated default. When the scope notice is
/// already present the file is left untouched.
pub async fn write_license(package_dir: &Path, discovered: Option<&str>) -> Result<()> {
    let path = package_dir.join("LICENSE");
    let existing = match tokio::fs::read_to_string(&path).await {
        Ok(text) => Some(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e).fs_context("reading license", &path),
    };

    if let Some(text) = &existing
        && text.starts_with(SCOPE_NOTICE)
    {
        return Ok(());
    }

    let body = existing
        .or_else(|| discovered.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_LICENSE.to_string());
    let content = format!("{SCOPE_NOTICE}\n{body}");
    tokio::fs::write(&path, content)
        .await
        .fs_context("writing license", &path)
}
