//! The closed allow-list of GStreamer elements and property value patterns
//! a pipeline argv may reference (§4.13).

use std::collections::HashMap;

use once_cell::sync::Lazy;
use scenectl_core::CoreError;

pub static ALLOWED_ELEMENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "gst-launch-1.0",
        "fdsrc",
        "rawvideoparse",
        "videoconvert",
        "queue",
        "nvh264enc",
        "vaapih264enc",
        "x264enc",
        "h264parse",
        "mpegtsmux",
        "flvmux",
        "srtsink",
        "rtmpsink",
        "video/x-raw,format=NV12",
        "capsfilter",
    ]
});

/// `property=value` token regexes. Each entry's key is the property name;
/// the value pattern governs everything after the `=`.
static ALLOWED_PROPERTIES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("width", r"^\d{1,5}$"),
        ("height", r"^\d{1,5}$"),
        ("format", r"^[a-zA-Z0-9]+$"),
        ("framerate", r"^\d+/\d+$"),
        ("bitrate", r"^\d{1,8}$"),
        ("preset", r"^[a-z-]+$"),
        ("quality-level", r"^\d{1,2}$"),
        ("speed-preset", r"^[a-z-]+$"),
        ("tune", r"^[a-z-]+$"),
        ("key-int-max", r"^\d{1,4}$"),
        ("bframes", r"^\d{1,2}$"),
        ("config-interval", r"^\d{1,2}$"),
        ("alignment", r"^\d{1,2}$"),
        ("max-size-buffers", r"^\d{1,4}$"),
        ("leaky", r"^[a-z-]+$"),
        ("do-timestamp", r"^(true|false)$"),
        ("sync", r"^(true|false)$"),
        ("async", r"^(true|false)$"),
        ("streamable", r"^(true|false)$"),
        ("uri", r"^[a-zA-Z0-9:/.\-_?&=]+$"),
        ("location", r"^[a-zA-Z0-9:/.\-_?&=]+$"),
    ])
});

/// Validates a bare pipeline element (`fdsrc`, `!`, a caps string, ...).
/// `!` is the GStreamer link separator and is always permitted.
pub fn validate_element(element: &str) -> Result<(), CoreError> {
    if element == "!" || ALLOWED_ELEMENTS.contains(&element) {
        Ok(())
    } else {
        Err(CoreError::CommandInjection { token: element.to_string() })
    }
}

/// Validates a `name=value` property token against its allow-listed regex.
pub fn validate_property_token(token: &str) -> Result<(), CoreError> {
    let Some((name, value)) = token.split_once('=') else {
        return Err(CoreError::CommandInjection { token: token.to_string() });
    };
    let Some(pattern) = ALLOWED_PROPERTIES.get(name) else {
        return Err(CoreError::CommandInjection { token: token.to_string() });
    };
    let re = regex::Regex::new(pattern).expect("static pattern is valid");
    if re.is_match(value) {
        Ok(())
    } else {
        Err(CoreError::CommandInjection { token: token.to_string() })
    }
}

/// Validates every token in a built argv: elements by exact match, `key=value`
/// tokens by property regex, `!` always allowed.
pub fn validate_argv(argv: &[String]) -> Result<(), CoreError> {
    for token in argv {
        if token.contains('=') {
            validate_property_token(token)?;
        } else {
            validate_element(token)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_element_is_allowed() {
        assert!(validate_element("x264enc").is_ok());
    }

    #[test]
    fn unknown_element_is_rejected() {
        let err = validate_element("rm").unwrap_err();
        assert_eq!(err.error_code(), "COMMAND_INJECTION");
    }

    #[test]
    fn property_value_must_match_its_pattern() {
        assert!(validate_property_token("bitrate=2000").is_ok());
        assert!(validate_property_token("bitrate=; rm -rf /").is_err());
    }

    #[test]
    fn unlisted_property_name_is_rejected() {
        let err = validate_property_token("shell=true").unwrap_err();
        assert_eq!(err.error_code(), "COMMAND_INJECTION");
    }
}
