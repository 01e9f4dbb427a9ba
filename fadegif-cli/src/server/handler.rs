use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use fadegif::{AnimationOpts, Canvas, FadeGifError, ResizePolicy, SourceImage, Timing};
use http_body_util::Full;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Method, Response, StatusCode};
use serde_json::{Map, Value, json};

use super::auth::{AuthError, TokenTable};
use super::rate_limit::{RateLimited, RateLimiter};

pub(crate) type Body = Full<Bytes>;

const DEFAULT_DURATION_MS: u32 = 100;
const DEFAULT_FADE_FRAMES: u32 = 10;
const DEFAULT_FADE_MS: u32 = 100;
const MIN_IMAGES: usize = 2;

/// Per-request bounds enforced before any image is decoded.
#[derive(Clone, Debug)]
pub(crate) struct RequestLimits {
    pub(crate) max_images: usize,
    pub(crate) max_fade_frames: u32,
    pub(crate) max_canvas_pixels: u64,
    pub(crate) resize: ResizePolicy,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_images: 3,
            max_fade_frames: 60,
            max_canvas_pixels: 4 * 1024 * 1024,
            resize: ResizePolicy::Keep,
        }
    }
}

/// Shared state of the HTTP endpoint.
#[derive(Debug)]
pub(crate) struct AppState {
    pub(crate) tokens: TokenTable,
    pub(crate) limiter: RateLimiter,
    pub(crate) limits: RequestLimits,
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum ApiError {
    #[error(transparent)]
    Unauthorized(#[from] AuthError),
    #[error("rate limited")]
    RateLimited(RateLimited),
    #[error("{0}")]
    BadRequest(String),
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub(crate) fn into_response(self) -> Response<Body> {
        match self {
            Self::Unauthorized(e) => json_response(
                StatusCode::UNAUTHORIZED,
                &json!({ "error": e.to_string() }),
            ),
            Self::RateLimited(limited) => json_response(
                StatusCode::TOO_MANY_REQUESTS,
                &json!({
                    "error": limited.message(),
                    "retry_after": limited.retry_after_rfc3339(),
                }),
            ),
            Self::BadRequest(msg) => {
                json_response(StatusCode::BAD_REQUEST, &json!({ "error": msg }))
            }
            Self::PayloadTooLarge => json_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                &json!({ "error": "Payload too large" }),
            ),
            Self::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "error generating gif");
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &json!({ "error": "Internal server error" }),
                )
            }
        }
    }
}

impl From<FadeGifError> for ApiError {
    fn from(err: FadeGifError) -> Self {
        if err.is_user_error() {
            Self::BadRequest(err.to_string())
        } else {
            Self::Internal(err.into())
        }
    }
}

/// A validated generation request.
#[derive(Debug)]
pub(crate) struct GenerateRequest {
    pub(crate) images: Vec<String>,
    pub(crate) timing: Timing,
}

/// Answer one request whose body has already been read.
pub(crate) fn respond(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    body: &[u8],
    now: DateTime<Utc>,
) -> Response<Body> {
    match *method {
        Method::OPTIONS => preflight(),
        Method::POST => generate(state, headers, body, now).unwrap_or_else(ApiError::into_response),
        _ => {
            let mut resp = json_response(
                StatusCode::METHOD_NOT_ALLOWED,
                &json!({ "error": "Method not allowed" }),
            );
            resp.headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST, OPTIONS"));
            resp
        }
    }
}

fn generate(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    now: DateTime<Utc>,
) -> Result<Response<Body>, ApiError> {
    let user = state.tokens.authenticate(headers)?;
    state
        .limiter
        .check(user, now)
        .map_err(ApiError::RateLimited)?;

    let request = parse_request(body, &state.limits)?;
    let images = decode_images(&request.images)?;
    check_canvas(&images, &state.limits)?;
    let opts = AnimationOpts {
        timing: request.timing,
        resize: state.limits.resize,
        ..AnimationOpts::default()
    };
    let gif = fadegif::render_gif(images, &opts)?;

    state.limiter.record(user, now);
    tracing::info!(%user, bytes = gif.len(), "generated gif");
    Ok(json_response(
        StatusCode::OK,
        &json!({ "gif": BASE64.encode(&gif) }),
    ))
}

/// Validate the JSON body: `{"images": [...], "duration"?, "fade_frames"?, "fade_duration"?}`.
pub(crate) fn parse_request(
    body: &[u8],
    limits: &RequestLimits,
) -> Result<GenerateRequest, ApiError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| ApiError::bad_request("Invalid JSON payload"))?;
    let obj = value
        .as_object()
        .filter(|o| !o.is_empty())
        .ok_or_else(|| ApiError::bad_request("Invalid JSON payload"))?;

    let entries = match obj.get("images") {
        Some(Value::Array(entries)) => entries.as_slice(),
        _ => &[],
    };
    if entries.len() < MIN_IMAGES {
        return Err(ApiError::bad_request(format!(
            "At least {MIN_IMAGES} images required"
        )));
    }
    if entries.len() > limits.max_images {
        return Err(ApiError::bad_request(format!(
            "Maximum {} images allowed",
            limits.max_images
        )));
    }
    let images = entries
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_owned)
                .ok_or_else(|| ApiError::bad_request("Invalid image data"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let timing = Timing {
        hold_ms: int_field(obj, "duration", DEFAULT_DURATION_MS)?,
        fade_frames: int_field(obj, "fade_frames", DEFAULT_FADE_FRAMES)?,
        fade_ms: int_field(obj, "fade_duration", DEFAULT_FADE_MS)?,
    };
    if timing.fade_frames > limits.max_fade_frames {
        return Err(ApiError::bad_request(format!(
            "fade_frames must be at most {}",
            limits.max_fade_frames
        )));
    }

    Ok(GenerateRequest { images, timing })
}

/// Read a non-negative integer that may be sent as a number or a numeric string.
fn int_field(obj: &Map<String, Value>, key: &str, default: u32) -> Result<u32, ApiError> {
    let invalid = || ApiError::bad_request(format!("Invalid value for '{key}'"));
    let raw = match obj.get(key) {
        None | Some(Value::Null) => return Ok(default),
        Some(Value::Number(n)) => match (n.as_u64(), n.as_f64()) {
            (Some(v), _) => v,
            (None, Some(f)) if f.is_finite() && f >= 0.0 => f.trunc() as u64,
            _ => return Err(invalid()),
        },
        Some(Value::String(s)) => s.trim().parse::<u64>().map_err(|_| invalid())?,
        Some(_) => return Err(invalid()),
    };
    u32::try_from(raw).map_err(|_| invalid())
}

fn decode_images(encoded: &[String]) -> Result<Vec<SourceImage>, ApiError> {
    encoded
        .iter()
        .enumerate()
        .map(|(i, data)| {
            let name = format!("images[{i}]");
            let payload = data
                .split_once(";base64,")
                .map_or(data.as_str(), |(_, rest)| rest);
            let bytes = BASE64.decode(payload.trim()).map_err(|e| {
                tracing::debug!(%name, error = %e, "invalid base64 payload");
                ApiError::bad_request("Invalid image data")
            })?;
            fadegif::decode_image(name.as_str(), &bytes).map_err(|e| {
                tracing::debug!(%name, error = %e, "undecodable image payload");
                ApiError::bad_request("Invalid image data")
            })
        })
        .collect()
}

/// Reject requests whose centered canvas would exceed `max_canvas_pixels`.
fn check_canvas(images: &[SourceImage], limits: &RequestLimits) -> Result<(), ApiError> {
    let dims: Vec<(u32, u32)> = images
        .iter()
        .map(|img| {
            let (w, h) = img.dimensions();
            limits.resize.target_size(w, h)
        })
        .collect();
    let canvas = Canvas::covering(&dims)?;
    let pixels = u64::from(canvas.width) * u64::from(canvas.height);
    if pixels > limits.max_canvas_pixels {
        return Err(ApiError::bad_request(format!(
            "Images too large: canvas {}x{} exceeds {} pixels",
            canvas.width, canvas.height, limits.max_canvas_pixels
        )));
    }
    Ok(())
}

fn preflight() -> Response<Body> {
    let mut resp = Response::new(Body::new(Bytes::new()));
    *resp.status_mut() = StatusCode::NO_CONTENT;
    let headers = resp.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("3600"),
    );
    resp
}

pub(crate) fn json_response(status: StatusCode, value: &Value) -> Response<Body> {
    let mut resp = Response::new(Body::new(Bytes::from(value.to_string())));
    *resp.status_mut() = status;
    let headers = resp.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    resp
}

#[cfg(test)]
#[path = "../../tests/unit/server/handler.rs"]
mod tests;
