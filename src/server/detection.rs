// Voice detection endpoint
// Authenticates, decodes base64 audio and runs the engine on the blocking pool

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::audio::{decode_audio, AudioFormat};
use crate::scoring::{Classification, Verdict};
use crate::server::error::{ApiError, ApiResult};
use crate::server::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Languages the service accepts. The tag is echoed back and does not change scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    Tamil,
    English,
    Hindi,
    Malayalam,
    Telugu,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Tamil,
        Language::English,
        Language::Hindi,
        Language::Malayalam,
        Language::Telugu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Tamil => "Tamil",
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Malayalam => "Malayalam",
            Language::Telugu => "Telugu",
        }
    }

    /// Exact, case-sensitive match on the display name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == name)
    }

    pub fn supported_list() -> String {
        Self::ALL.map(|l| l.as_str()).join(", ")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceRequest {
    pub language: String,
    pub audio_format: AudioFormat,
    pub audio_base64: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceResponse {
    pub status: &'static str,
    pub language: Language,
    pub classification: Classification,
    pub confidence_score: f64,
    pub explanation: String,
}

/// Check the `x-api-key` header against the configured key
pub fn verify_api_key(headers: &HeaderMap, expected: &str) -> ApiResult<()> {
    let Some(provided) = headers.get(API_KEY_HEADER) else {
        return Err(ApiError::Unauthorized("API key missing".to_string()));
    };

    match provided.to_str() {
        Ok(key) if key == expected => Ok(()),
        _ => Err(ApiError::Unauthorized("Invalid API key".to_string())),
    }
}

/// POST /api/voice-detection
pub async fn detect_voice(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<VoiceRequest>, JsonRejection>,
) -> ApiResult<Json<VoiceResponse>> {
    let request_id = Uuid::new_v4();

    if let Err(e) = verify_api_key(&headers, &state.api_key) {
        log::warn!("[{}] Rejected request: {}", request_id, e);
        return Err(e);
    }

    let Json(request) = payload.map_err(|rejection| {
        log::warn!(
            "[{}] Rejected request body ({}): {}",
            request_id,
            rejection.status(),
            rejection.body_text()
        );
        ApiError::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    })?;

    let language = Language::parse(&request.language).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Unsupported language. Supported languages: {}",
            Language::supported_list()
        ))
    })?;

    let audio_bytes = BASE64
        .decode(request.audio_base64.trim())
        .map_err(|_| ApiError::BadRequest("Invalid base64 encoding".to_string()))?;

    let engine = state.engine.clone();
    let format = request.audio_format;
    let verdict = tokio::task::spawn_blocking(move || -> ApiResult<Verdict> {
        let audio = decode_audio(&audio_bytes, format).map_err(|e| {
            log::error!("[{}] Error loading audio: {}", request_id, e);
            ApiError::BadRequest("Invalid audio file format".to_string())
        })?;

        if audio.frame_count == 0 {
            return Err(ApiError::BadRequest("Empty audio file".to_string()));
        }

        Ok(engine.classify(&audio.to_mono(), audio.sample_rate)?)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("classification task failed: {}", e)))??;

    log::info!(
        "[{}] Processed {} audio: {} ({:.2})",
        request_id,
        language.as_str(),
        verdict.classification,
        verdict.confidence_score
    );

    Ok(Json(VoiceResponse {
        status: "success",
        language,
        classification: verdict.classification,
        confidence_score: verdict.confidence_score,
        explanation: verdict.explanation,
    }))
}

/// GET /api/voice-detection
///
/// Usage document for clients probing the endpoint with GET.
pub async fn usage_info() -> Json<Value> {
    let languages: Vec<&str> = Language::ALL.iter().map(|l| l.as_str()).collect();
    let formats: Vec<&str> = AudioFormat::ALL.iter().map(|f| f.extension()).collect();

    Json(json!({
        "status": "info",
        "message": "This endpoint requires POST method",
        "usage": {
            "method": "POST",
            "endpoint": "/api/voice-detection",
            "headers": {
                "Content-Type": "application/json",
                "x-api-key": "<your-api-key>",
            },
            "body": {
                "language": languages.join("|"),
                "audioFormat": formats.join("|"),
                "audioBase64": "base64_encoded_audio",
            },
        },
        "example": {
            "language": "Tamil",
            "audioFormat": "mp3",
            "audioBase64": "SUQzBAAAAAAAI1RTU0UAAAAPAAADTGF2ZjU4Ljc2LjEwMAAAAAAAAAAAAAAA...",
        },
    }))
}
