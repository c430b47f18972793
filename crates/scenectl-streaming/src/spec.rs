//! The validated shape a [`crate::builder`] call consumes (§3 `StreamingPipelineSpec`).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Srt,
    Rtmp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoder {
    Nvenc,
    Vaapi,
    X264,
}

impl Encoder {
    pub fn as_str(self) -> &'static str {
        match self {
            Encoder::Nvenc => "nvenc",
            Encoder::Vaapi => "vaapi",
            Encoder::X264 => "x264",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StreamingPipelineSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bitrate_kbps: u32,
    pub sink_url: String,
    pub encoder: Encoder,
    pub protocol: Protocol,
}
