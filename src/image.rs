//! The throwaway image every run builds.
//!
//! The image runs a plain `sleep` and carries a fast health check. The health check is what
//! makes the daemon hang; nothing in the harness evaluates it.
use std::io;

/// Name of the only file in the build context.
pub const DOCKERFILE_NAME: &str = "Dockerfile";

const DOCKERFILE_TEMPLATE: &str = r#"
FROM busybox@sha256:5551dbdfc48d66734d0f01cafee0952cb6e8eeecd1e2492240bf2fd9640c2279
HEALTHCHECK --interval=1s --timeout=1s --retries=3 CMD echo hello
CMD ["sh", "-c", "sleep {sleep}"]
"#;

#[derive(Debug, thiserror::Error)]
#[error("failed to write build context: {0}")]
pub struct Error(#[from] io::Error);

/// Renders the Dockerfile whose containers sleep for `sleep` (a busybox `sleep` argument).
pub fn dockerfile(sleep: &str) -> String {
    DOCKERFILE_TEMPLATE.replace("{sleep}", sleep)
}

/// Packs `dockerfile` into an in-memory tar archive usable as a build context.
///
/// `mtime` is the modification time (seconds since the UNIX epoch) recorded for the file.
pub fn build_context(dockerfile: &str, mtime: u64) -> Result<Vec<u8>, Error> {
    let data = dockerfile.as_bytes();
    let mut header = tar::Header::new_gnu();
    header.set_path(DOCKERFILE_NAME)?;
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(mtime);
    header.set_cksum();

    let mut archive = tar::Builder::new(Vec::new());
    archive.append(&header, data)?;
    Ok(archive.into_inner()?)
}
