//! Package tarball download and unpacking.

use std::io::Read;

use flate2::read::GzDecoder;
use tar::Archive;

/// Upper bound on a single decompressed download.
const MAX_TARBALL_BYTES: u64 = 512 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
}

/// Wrap a gzip-compressed tar stream for entry iteration.
pub fn gz_tar_archive<R: Read>(reader: R) -> Archive<GzDecoder<R>> {
    Archive::new(GzDecoder::new(reader))
}

/// GET `url` and open the response body as a gzipped tar archive. The body
/// streams; nothing is buffered to disk.
pub fn fetch_tarball(url: &str) -> Result<Archive<GzDecoder<impl Read>>, FetchError> {
    let response = ureq::get(url)
        .call()
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source: Box::new(source),
        })?;
    let reader = response
        .into_body()
        .into_with_config()
        .limit(MAX_TARBALL_BYTES)
        .reader();
    Ok(gz_tar_archive(reader))
}
