//! Validation of CLI parameters for the generation backends.

/// Validate the aspect ratio parameter.
///
/// # Errors
///
/// Returns an error if the ratio is not recognized.
pub fn validate_aspect_ratio(ratio: &str) -> Result<(), String> {
    match ratio {
        "1:1" | "16:9" | "9:16" => Ok(()),
        _ => Err(format!("Unsupported aspect ratio '{ratio}'. Valid: 1:1, 16:9, 9:16")),
    }
}

/// Validate the video resolution parameter.
///
/// # Errors
///
/// Returns an error if the resolution is not recognized.
pub fn validate_resolution(resolution: &str) -> Result<(), String> {
    match resolution {
        "720p" | "1080p" => Ok(()),
        _ => Err(format!("Unsupported resolution '{resolution}'. Valid: 720p, 1080p")),
    }
}

/// Validate the image output format parameter.
///
/// # Errors
///
/// Returns an error if the format is not recognized.
pub fn validate_format(format: &str) -> Result<(), String> {
    match format {
        "jpeg" | "png" | "webp" => Ok(()),
        _ => Err(format!("Unsupported format '{format}'. Valid: jpeg, png, webp")),
    }
}

/// Get the file extension for an output format.
#[must_use]
pub fn format_extension(format: &str) -> &'static str {
    match format {
        "png" => "png",
        "webp" => "webp",
        "mp4" => "mp4",
        // jpeg and any unknown format default to jpg
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_aspect_ratio_valid() {
        assert!(validate_aspect_ratio("1:1").is_ok());
        assert!(validate_aspect_ratio("16:9").is_ok());
        assert!(validate_aspect_ratio("9:16").is_ok());
    }

    #[test]
    fn validate_aspect_ratio_invalid() {
        assert!(validate_aspect_ratio("4:3").is_err());
        assert!(validate_aspect_ratio("wide").is_err());
    }

    #[test]
    fn validate_resolution_valid() {
        assert!(validate_resolution("720p").is_ok());
        assert!(validate_resolution("1080p").is_ok());
    }

    #[test]
    fn validate_resolution_invalid() {
        assert!(validate_resolution("4K").is_err());
        assert!(validate_resolution("480p").is_err());
    }

    #[test]
    fn validate_format_valid() {
        assert!(validate_format("jpeg").is_ok());
        assert!(validate_format("png").is_ok());
        assert!(validate_format("webp").is_ok());
    }

    #[test]
    fn validate_format_invalid() {
        assert!(validate_format("gif").is_err());
        assert!(validate_format("bmp").is_err());
    }

    #[test]
    fn format_extension_mapping() {
        assert_eq!(format_extension("jpeg"), "jpg");
        assert_eq!(format_extension("png"), "png");
        assert_eq!(format_extension("webp"), "webp");
        assert_eq!(format_extension("mp4"), "mp4");
    }
}
