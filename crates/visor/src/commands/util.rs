//! Shared helpers for command handlers.

use std::path::Path;

use bytesize::ByteSize;
use visor_api::{EndpointResult, ImageFile, ImageSource, VisionClient};
use visor_core::CoreError;

use crate::error::CliError;

/// Live camera when no path is given, otherwise the file's contents.
pub fn image_source(path: Option<&Path>) -> Result<ImageSource, CliError> {
    let Some(path) = path else {
        return Ok(ImageSource::Live);
    };
    let file = ImageFile::from_path(path).map_err(|e| CliError::Validation {
        field: "image".into(),
        reason: format!("{}: {e}", path.display()),
    })?;
    Ok(ImageSource::Upload(file))
}

/// Human-readable size of a binary payload.
pub fn byte_size(len: usize) -> ByteSize {
    ByteSize::b(u64::try_from(len).unwrap_or(u64::MAX))
}

/// Turn an endpoint result into a CLI result, naming the backend on failure.
pub fn check<T>(client: &VisionClient, result: EndpointResult<T>) -> Result<T, CliError> {
    result.map_err(|err| fail(client, err.into()))
}

pub fn fail(client: &VisionClient, err: CoreError) -> CliError {
    CliError::from_core(err, client.base_url())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn no_path_means_live_camera() {
        assert!(matches!(image_source(None), Ok(ImageSource::Live)));
    }

    #[test]
    fn missing_file_is_a_validation_error() {
        let err = image_source(Some(Path::new("/nonexistent/face.jpg"))).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_code::USAGE);
    }

    #[test]
    fn file_is_uploaded_with_guessed_mime() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"png").unwrap();
        match image_source(Some(file.path())).unwrap() {
            ImageSource::Upload(img) => assert_eq!(img.mime, "image/png"),
            ImageSource::Live => panic!("expected an upload"),
        }
    }
}
