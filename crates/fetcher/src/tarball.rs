use crate::{FetchCause, NetworkError, ParseIntegrityError, VerifyChecksumError};
use pipe_trait::Pipe;
use podvend_network::ThrottledClient;
use ssri::{Integrity, IntegrityChecker};
use std::{
    fs,
    io::{self, Cursor, Read},
    path::{Component, Path, PathBuf},
};
use tar::Archive;
use tracing::instrument;
use zune_inflate::{DeflateDecoder, DeflateOptions};

#[instrument(skip(gz_data), fields(gz_data_len = gz_data.len()))]
fn decompress_gzip(gz_data: &[u8]) -> Result<Vec<u8>, FetchCause> {
    let options = DeflateOptions::default().set_confirm_checksum(false);
    DeflateDecoder::new_with_options(gz_data, options)
        .decode_gzip()
        .map_err(FetchCause::DecodeGzip)
}

#[instrument(skip(data), fields(data_len = data.len()))]
fn verify_checksum(data: &[u8], integrity: Integrity) -> Result<ssri::Algorithm, ssri::Error> {
    integrity.pipe(IntegrityChecker::new).chain(data).result()
}

/// A regular file of the archive.
struct ArchivedFile {
    path: PathBuf,
    mode: u32,
    content: Vec<u8>,
}

/// Relative path of an archive entry, or `None` if it would escape the destination.
fn sanitize(path: &Path) -> Option<PathBuf> {
    let mut sanitized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => sanitized.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!sanitized.as_os_str().is_empty()).then_some(sanitized)
}

fn read_archive(tar_data: Vec<u8>) -> io::Result<Vec<ArchivedFile>> {
    let mut archive = Archive::new(Cursor::new(tar_data));
    let mut files = Vec::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let Some(path) = sanitize(&entry.path()?) else {
            tracing::warn!(target: "podvend::fetch", path = ?entry.path()?, "Skip unsafe archive entry");
            continue;
        };
        let mode = entry.header().mode().unwrap_or(0o644);
        let mut content = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut content)?;
        files.push(ArchivedFile { path, mode, content });
    }
    Ok(files)
}

/// Drop the top level directory when every file lives under the same one.
fn strip_common_root(files: &mut [ArchivedFile]) {
    let mut roots = files.iter().map(|file| {
        let mut components = file.path.components();
        let root = components.next();
        (root, components.next().is_some())
    });
    let Some((Some(first), true)) = roots.next() else {
        return;
    };
    if !roots.all(|(root, nested)| root == Some(first) && nested) {
        return;
    }
    let first = first.as_os_str().to_owned();
    for file in files {
        if let Ok(stripped) = file.path.strip_prefix(&first) {
            file.path = stripped.to_path_buf();
        }
    }
}

fn write_files(files: Vec<ArchivedFile>, destination: &Path) -> io::Result<()> {
    fs::create_dir_all(destination)?;
    for ArchivedFile { path, mode, content } in files {
        let path = destination.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(mode & 0o777))?;
        }
        #[cfg(not(unix))]
        let _ = mode;
    }
    Ok(())
}

/// Decompress, verify and unpack a downloaded tarball into `destination`.
fn unpack(
    url: &str,
    data: &[u8],
    integrity: Option<Integrity>,
    destination: &Path,
) -> Result<(), FetchCause> {
    if let Some(integrity) = integrity {
        verify_checksum(data, integrity)
            .map_err(|error| VerifyChecksumError { url: url.to_string(), error })?;
    }
    let unpack_error = |error| FetchCause::Unpack { dir: destination.to_path_buf(), error };
    let mut files = decompress_gzip(data)?.pipe(read_archive).map_err(unpack_error)?;
    strip_common_root(&mut files);
    write_files(files, destination).map_err(unpack_error)
}

/// Download the gzipped tarball at `url` and unpack it into `destination`.
pub(crate) async fn download_tarball(
    http_client: &ThrottledClient,
    url: &str,
    integrity: Option<&str>,
    destination: &Path,
) -> Result<(), FetchCause> {
    let integrity = integrity
        .map(|integrity| {
            integrity.parse::<Integrity>().map_err(|error| ParseIntegrityError {
                url: url.to_string(),
                integrity: integrity.to_string(),
                error,
            })
        })
        .transpose()?;

    let network_error = |error| NetworkError { url: url.to_string(), error };
    let data = http_client
        .run_with_permit(|client| {
            let request = client.get(url).send();
            async move { request.await?.error_for_status()?.bytes().await.map(Vec::from) }
        })
        .await
        .map_err(network_error)?;
    tracing::info!(target: "podvend::fetch", ?url, len = data.len(), "Download completed");

    let url = url.to_string();
    let destination = destination.to_path_buf();
    tokio::task::spawn_blocking(move || unpack(&url, &data, integrity, &destination))
        .await
        .map_err(FetchCause::TaskJoin)?
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Build a gzip stream out of stored (uncompressed) deflate blocks.
    pub(crate) fn gzip_stored(data: &[u8]) -> Vec<u8> {
        let mut gz = vec![0x1f, 0x8b, 8, 0, 0, 0, 0, 0, 0, 0xff];
        let mut chunks = data.chunks(u16::MAX as usize).peekable();
        if chunks.peek().is_none() {
            gz.extend([1, 0, 0, 0xff, 0xff]);
        }
        while let Some(chunk) = chunks.next() {
            let last = chunks.peek().is_none();
            let len = chunk.len() as u16;
            gz.push(u8::from(last));
            gz.extend(len.to_le_bytes());
            gz.extend((!len).to_le_bytes());
            gz.extend(chunk);
        }
        gz.extend(0u32.to_le_bytes()); // crc32, not checked
        gz.extend((data.len() as u32).to_le_bytes());
        gz
    }

    /// Build a gzipped tarball of `(path, content)` pairs.
    pub(crate) fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, content.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().pipe_as_ref(gzip_stored)
    }

    fn paths(files: &[ArchivedFile]) -> Vec<String> {
        files.iter().map(|file| file.path.to_string_lossy().replace('\\', "/")).collect()
    }

    #[test]
    fn decompress_stored_gzip() {
        let data = b"KissXML".repeat(20_000);
        assert_eq!(decompress_gzip(&gzip_stored(&data)).unwrap(), data);
    }

    #[test]
    fn strip_single_root() {
        let data = tarball(&[("KissXML-5.0/KissXML.h", "h"), ("KissXML-5.0/src/DDXML.m", "m")]);
        let mut files = decompress_gzip(&data).unwrap().pipe(read_archive).unwrap();
        strip_common_root(&mut files);
        assert_eq!(paths(&files), ["KissXML.h", "src/DDXML.m"]);
    }

    #[test]
    fn keep_multiple_roots() {
        let data = tarball(&[("Classes/A.h", "a"), ("README.md", "readme")]);
        let mut files = decompress_gzip(&data).unwrap().pipe(read_archive).unwrap();
        strip_common_root(&mut files);
        assert_eq!(paths(&files), ["Classes/A.h", "README.md"]);
    }

    #[test]
    fn reject_escaping_paths() {
        assert_eq!(sanitize(Path::new("a/./b")), Some(PathBuf::from("a/b")));
        assert_eq!(sanitize(Path::new("../etc/passwd")), None);
        assert_eq!(sanitize(Path::new("/etc/passwd")), None);
        assert_eq!(sanitize(Path::new(".")), None);
    }
}
