use serde::Serialize;
use serde_json::Value;

use crate::jobs::{IntegrationConfig, Video};
use crate::render::{ApiShape, PollStatus};

const BACKGROUND_COLOR: &str = "#000000";
const HOOK_OVERLAY_SECONDS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HookOverlay {
    pub text: String,
    pub start: u32,
    pub end: u32,
    pub position: String,
}

/// Everything the provider needs to start one render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub avatar_id: Option<String>,
    pub voice_id: String,
    pub text: String,
    pub captions_on: bool,
    pub overlay: Option<HookOverlay>,
}

impl RenderRequest {
    /// Script text wins over hook text; captions and the hook overlay are on
    /// unless the job turns them off.
    pub fn from_job(video: &Video, integration: &IntegrationConfig) -> Self {
        let hook = non_empty(video.hook.as_deref());
        let text = non_empty(video.script.as_deref())
            .or(hook)
            .unwrap_or_default()
            .to_string();

        let overlay = video.hook_overlay_on.unwrap_or(true).then(|| HookOverlay {
            text: hook.unwrap_or_default().to_string(),
            start: 0,
            end: HOOK_OVERLAY_SECONDS,
            position: non_empty(video.hook_pos.as_deref())
                .unwrap_or("top")
                .to_string(),
        });

        Self {
            avatar_id: integration.avatar_id.clone(),
            voice_id: integration.voice_id.clone(),
            text,
            captions_on: video.captions_on.unwrap_or(true),
            overlay,
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CreateBody<'a> {
    V1(V1Body<'a>),
    V2(V2Body<'a>),
}

#[derive(Debug, Serialize)]
pub struct V1Body<'a> {
    input_text: &'a str,
    avatar_id: Option<&'a str>,
    voice: &'a str,
    background: &'static str,
    caption: bool,
    overlays: Vec<&'a HookOverlay>,
}

#[derive(Debug, Serialize)]
pub struct V2Body<'a> {
    video_inputs: [V2Input<'a>; 1],
    caption: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    overlays: Vec<&'a HookOverlay>,
}

#[derive(Debug, Serialize)]
struct V2Input<'a> {
    character: V2Character<'a>,
    voice: V2Voice<'a>,
    background: V2Background,
}

#[derive(Debug, Serialize)]
struct V2Character<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    avatar_id: Option<&'a str>,
    avatar_style: &'static str,
}

#[derive(Debug, Serialize)]
struct V2Voice<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    input_text: &'a str,
    voice_id: &'a str,
}

#[derive(Debug, Serialize)]
struct V2Background {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'static str,
}

pub fn create_body(shape: ApiShape, req: &RenderRequest) -> CreateBody<'_> {
    let overlays: Vec<&HookOverlay> = req.overlay.iter().collect();
    match shape {
        ApiShape::V1 => CreateBody::V1(V1Body {
            input_text: &req.text,
            avatar_id: req.avatar_id.as_deref(),
            voice: &req.voice_id,
            background: BACKGROUND_COLOR,
            caption: req.captions_on,
            overlays,
        }),
        ApiShape::V2 => CreateBody::V2(V2Body {
            video_inputs: [V2Input {
                character: V2Character {
                    kind: "avatar",
                    avatar_id: req.avatar_id.as_deref(),
                    avatar_style: "normal",
                },
                voice: V2Voice {
                    kind: "text",
                    input_text: &req.text,
                    voice_id: &req.voice_id,
                },
                background: V2Background {
                    kind: "color",
                    value: BACKGROUND_COLOR,
                },
            }],
            caption: req.captions_on,
            overlays,
        }),
    }
}

/// First populated of `video_id`, `task_id`, `data.video_id`, `data.id`.
pub fn extract_job_id(body: &Value) -> Option<String> {
    let data = body.get("data");
    [
        body.get("video_id"),
        body.get("task_id"),
        data.and_then(|d| d.get("video_id")),
        data.and_then(|d| d.get("id")),
    ]
    .into_iter()
    .flatten()
    .find_map(id_text)
}

fn id_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a status response, top-level or wrapped in `data`.
///
/// `completed` without any result URL is still pending.
pub fn interpret_status(body: &Value) -> PollStatus {
    let body = match body.get("data") {
        Some(data) if data.get("status").is_some() => data,
        _ => body,
    };

    match body.get("status").and_then(Value::as_str) {
        Some("completed") => {
            let url = ["video_url_caption", "video_url"]
                .into_iter()
                .filter_map(|k| body.get(k).and_then(Value::as_str))
                .find(|s| !s.is_empty());
            match url {
                Some(url) => PollStatus::Completed(url.to_string()),
                None => PollStatus::Pending,
            }
        }
        Some("failed") => PollStatus::Failed(failure_message(body)),
        _ => PollStatus::Pending,
    }
}

fn failure_message(body: &Value) -> String {
    let error = body.get("error");
    error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .or_else(|| error.and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .unwrap_or("provider reported failure")
        .to_string()
}
