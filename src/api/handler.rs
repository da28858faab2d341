//! HTTP 入口
//!
//! 请求体 `{"command": "grade" | "random", "block": {...}}`。
//! 评分成功或失败都以 200 返回对应 JSON（错误也是数据）；
//! 请求体本身不合法时返回 400。

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ErrorResult, GatewayError};
use crate::models::{Command, GatewayRequest, GradeSheet};
use crate::orchestrator::{GradingGateway, GATEWAY_LEVEL};

/// 构建路由
pub fn router(gateway: Arc<GradingGateway>) -> Router {
    Router::new()
        .route("/", post(handle_request))
        .route("/grade", post(handle_request))
        .route("/healthz", get(healthz))
        .with_state(gateway)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn handle_request(
    State(gateway): State<Arc<GradingGateway>>,
    headers: HeaderMap,
    body: Result<Json<GatewayRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("请求体无法解析: {}", rejection);
            let err = GatewayError::InvalidBody(rejection.body_text()).at(GATEWAY_LEVEL);
            return (StatusCode::BAD_REQUEST, Json(err)).into_response();
        }
    };

    match request.command() {
        Ok(Command::Grade) => {
            let block = match request.block() {
                Ok(block) => block,
                Err(err) => return error_response(err.at(GATEWAY_LEVEL)),
            };
            match gateway.handle(block, &headers).await {
                Ok(grade) => Json(grade).into_response(),
                Err(err) => error_response(err),
            }
        }
        Ok(Command::Random) => {
            debug!("🎲 random 命令，返回随机结果");
            Json(GradeSheet::random()).into_response()
        }
        Err(err) => {
            warn!("命令缺失或不支持: {:?}", request.command);
            let body = json!({
                "error": {
                    "statusCode": StatusCode::BAD_REQUEST.as_u16(),
                    "description": err.to_string(),
                }
            });
            (StatusCode::BAD_REQUEST, Json(body)).into_response()
        }
    }
}

fn error_response(err: ErrorResult) -> Response {
    (StatusCode::OK, Json(err)).into_response()
}
