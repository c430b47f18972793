//! Builds the argv for a `gst-launch-1.0` child process from a validated
//! [`StreamingPipelineSpec`], with every token re-checked against the
//! allow-list before the argv is returned (§4.13).

use scenectl_core::CoreError;

use crate::allowlist::validate_argv;
use crate::spec::{Encoder, Protocol, StreamingPipelineSpec};

/// Validates `spec` and renders it as a `gst-launch-1.0` argv list, or
/// fails with `CoreError::CommandInjection` if any produced token is not
/// itself allow-listed (a defense-in-depth check, since every input was
/// already range/scheme validated).
pub fn build_argv(spec: &StreamingPipelineSpec) -> Result<Vec<String>, CoreError> {
    scenectl_validate::validate_dimension("width", i64::from(spec.width))
        .map_err(|e| CoreError::invalid_parameter(e.field, e.reason))?;
    scenectl_validate::validate_dimension("height", i64::from(spec.height))
        .map_err(|e| CoreError::invalid_parameter(e.field, e.reason))?;
    scenectl_validate::validate_fps("fps", i64::from(spec.fps)).map_err(|e| CoreError::invalid_parameter(e.field, e.reason))?;
    scenectl_validate::validate_bitrate("bitrate_kbps", i64::from(spec.bitrate_kbps))
        .map_err(|e| CoreError::invalid_parameter(e.field, e.reason))?;

    let scheme = match spec.protocol {
        Protocol::Srt => "srt",
        Protocol::Rtmp => "rtmp",
    };
    scenectl_validate::validate_url("sink_url", &spec.sink_url, &[scheme], true, true)
        .map_err(|e| CoreError::invalid_parameter(e.field, e.reason))?;
    scenectl_validate::validate_enum("encoder", spec.encoder.as_str(), &["nvenc", "vaapi", "x264"])
        .map_err(|e| CoreError::invalid_parameter(e.field, e.reason))?;

    let mut argv: Vec<String> = vec![
        "gst-launch-1.0".into(),
        "fdsrc".into(),
        "do-timestamp=true".into(),
        "!".into(),
        "rawvideoparse".into(),
        format!("width={}", spec.width),
        format!("height={}", spec.height),
        "format=rgb".into(),
        format!("framerate={}/1", spec.fps),
        "!".into(),
        "videoconvert".into(),
        "!".into(),
        "queue".into(),
        "max-size-buffers=1".into(),
        "leaky=downstream".into(),
        "!".into(),
        "video/x-raw,format=NV12".into(),
        "!".into(),
    ];

    argv.extend(encoder_chain(spec));
    argv.extend(mux_and_sink(spec));

    validate_argv(&argv)?;
    Ok(argv)
}

fn encoder_chain(spec: &StreamingPipelineSpec) -> Vec<String> {
    match spec.encoder {
        Encoder::Nvenc => vec![
            "nvh264enc".into(),
            format!("bitrate={}", spec.bitrate_kbps),
            "preset=low-latency-hq".into(),
            "!".into(),
            "h264parse".into(),
            "config-interval=1".into(),
            "!".into(),
        ],
        Encoder::Vaapi => vec![
            "vaapih264enc".into(),
            format!("bitrate={}", spec.bitrate_kbps),
            "quality-level=7".into(),
            "!".into(),
            "h264parse".into(),
            "config-interval=1".into(),
            "!".into(),
        ],
        Encoder::X264 => vec![
            "x264enc".into(),
            format!("bitrate={}", spec.bitrate_kbps),
            "speed-preset=ultrafast".into(),
            "tune=zerolatency".into(),
            "key-int-max=24".into(),
            "bframes=0".into(),
            "!".into(),
            "h264parse".into(),
            "config-interval=1".into(),
            "!".into(),
        ],
    }
}

fn mux_and_sink(spec: &StreamingPipelineSpec) -> Vec<String> {
    match spec.protocol {
        Protocol::Srt => vec![
            "mpegtsmux".into(),
            "alignment=7".into(),
            "!".into(),
            "srtsink".into(),
            format!("uri={}", spec.sink_url),
            "sync=false".into(),
            "async=false".into(),
        ],
        Protocol::Rtmp => vec![
            "flvmux".into(),
            "streamable=true".into(),
            "!".into(),
            "rtmpsink".into(),
            format!("location={}", spec.sink_url),
            "sync=false".into(),
            "async=false".into(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spec(protocol: Protocol, encoder: Encoder, sink_url: &str) -> StreamingPipelineSpec {
        StreamingPipelineSpec {
            width: 1920,
            height: 1080,
            fps: 24,
            bitrate_kbps: 2000,
            sink_url: sink_url.to_string(),
            encoder,
            protocol,
        }
    }

    #[test]
    fn srt_x264_pipeline_contains_expected_chain() {
        let argv = build_argv(&spec(Protocol::Srt, Encoder::X264, "srt://127.0.0.1:9999")).unwrap();
        assert!(argv.contains(&"x264enc".to_string()));
        assert!(argv.contains(&"srtsink".to_string()));
        assert!(argv.contains(&"uri=srt://127.0.0.1:9999".to_string()));
    }

    #[test]
    fn rtmp_nvenc_pipeline_uses_flvmux_and_rtmpsink() {
        let argv = build_argv(&spec(Protocol::Rtmp, Encoder::Nvenc, "rtmp://127.0.0.1:1935/live")).unwrap();
        assert!(argv.contains(&"nvh264enc".to_string()));
        assert!(argv.contains(&"flvmux".to_string()));
        assert!(argv.contains(&"rtmpsink".to_string()));
    }

    #[test]
    fn includes_queue_and_caps_filter_stage() {
        let argv = build_argv(&spec(Protocol::Srt, Encoder::X264, "srt://127.0.0.1:9999")).unwrap();
        assert!(argv.contains(&"queue".to_string()));
        assert!(argv.contains(&"max-size-buffers=1".to_string()));
        assert!(argv.contains(&"video/x-raw,format=NV12".to_string()));
    }

    #[test]
    fn out_of_range_bitrate_is_rejected_before_any_argv_is_built() {
        let mut s = spec(Protocol::Srt, Encoder::X264, "srt://127.0.0.1:9999");
        s.bitrate_kbps = 1;
        let err = build_argv(&s).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn mismatched_scheme_is_rejected() {
        let s = spec(Protocol::Srt, Encoder::X264, "rtmp://127.0.0.1:1935/live");
        let err = build_argv(&s).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn shell_metacharacters_in_sink_url_are_rejected() {
        let s = spec(Protocol::Srt, Encoder::X264, "srt://127.0.0.1:9999/`id`");
        assert!(build_argv(&s).is_err());
    }
}
