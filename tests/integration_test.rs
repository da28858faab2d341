//! 评分网关集成测试
//!
//! 使用 wiremock 模拟算法函数、评分函数和题库答案接口。

use grading_gateway::config::Config;
use grading_gateway::error::REDACTED;
use grading_gateway::models::Block;
use grading_gateway::services::{GradeDispatcher, PipelineRunner};
use grading_gateway::{GradingGateway, RemoteClient};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    Config::new(
        format!("{}/algorithms", server.uri()),
        format!("{}/grading", server.uri()),
        format!("{}/answer", server.uri()),
    )
}

fn gateway(config: Config) -> GradingGateway {
    GradingGateway::new(config).expect("创建网关失败")
}

fn pipeline_runner(config: Config) -> PipelineRunner {
    let client = Arc::new(RemoteClient::new(&config).expect("创建客户端失败"));
    PipelineRunner::new(client, Arc::new(config))
}

fn grade_dispatcher(config: Config) -> GradeDispatcher {
    let client = Arc::new(RemoteClient::new(&config).expect("创建客户端失败"));
    GradeDispatcher::new(client, Arc::new(config))
}

fn block(value: Value) -> Block {
    Block::from_value(value).expect("测试 Block 无法解析")
}

fn bearer(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
}

/// 绑定后立即释放的端口，连接会被拒绝
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// 挂载一个永远不应被调用的答案接口
async fn forbid_answer_lookup(server: &MockServer) {
    Mock::given(path("/answer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("unused")))
        .expect(0)
        .mount(server)
        .await;
}

// ========== 端到端 ==========

#[tokio::test]
async fn test_grade_without_pipeline_or_lookup() {
    let server = MockServer::start().await;
    forbid_answer_lookup(&server).await;

    let verdict = json!({"isCorrect": true, "feedback": "Well done"});
    Mock::given(method("GET"))
        .and(path("/grading/mc1"))
        .and(header("command", "grade"))
        .and(body_json(json!({"response": "B", "answer": "B", "params": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(verdict.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let result = gateway(config_for(&server))
        .handle(
            Some(block(json!({"gradeFunction": "mc1", "response": "B", "answer": "B"}))),
            &HeaderMap::new(),
        )
        .await;

    assert_eq!(result, Ok(verdict));
}

#[tokio::test]
async fn test_full_flow_with_answer_lookup() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/answer"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({"response_id": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("B")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(path("/grading/mc1"))
        .and(body_json(json!({
            "response": "B",
            "answer": "B",
            "params": {"strict": true}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"isCorrect": true})))
        .expect(1)
        .mount(&server)
        .await;

    let result = gateway(config_for(&server))
        .handle(
            Some(block(json!({
                "gradeFunction": "mc1",
                "gradeParams": {"strict": true},
                "response": "B",
                "response_id": "r1"
            }))),
            &bearer("Bearer tok"),
        )
        .await;

    assert_eq!(result, Ok(json!({"isCorrect": true})));
}

// ========== 算法流水线 ==========

#[tokio::test]
async fn test_stages_run_in_order_and_replace_block() {
    let server = MockServer::start().await;

    Mock::given(path("/algorithms/s1"))
        .and(body_partial_json(json!({
            "command": "execute",
            "block": {"markers": []},
            "params": {"tag": 1}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "block": {"response": "B", "markers": [1]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(path("/algorithms/s2"))
        .and(body_partial_json(json!({
            "command": "execute",
            "block": {"markers": [1]},
            "params": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "block": {"response": "B", "markers": [1, 2]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(path("/algorithms/s3"))
        .and(body_partial_json(json!({"block": {"markers": [1, 2]}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "block": {"response": "B", "markers": [1, 2, 3]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = pipeline_runner(config_for(&server))
        .run_pipeline(block(json!({
            "response": "B",
            "markers": [],
            "algorithmPipeline": [
                {"algorithmFunction": "s1", "params": {"tag": 1}},
                {"algorithmFunction": "s2"},
                {"algorithmFunction": "s3"}
            ]
        })))
        .await
        .expect("流水线应该成功");

    assert_eq!(result.get("markers"), Some(&json!([1, 2, 3])));
    // 最后一步返回的 Block 没有 algorithmPipeline，整体替换后也不应该有
    assert!(!result.has_pipeline());
}

#[tokio::test]
async fn test_stage_block_is_forwarded_verbatim() {
    let server = MockServer::start().await;

    let returned = json!({"answer": null, "response": null, "x": 1});
    Mock::given(path("/algorithms/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"block": returned.clone()})))
        .expect(1)
        .mount(&server)
        .await;
    // 显式的 null 不能被丢掉，也不能多出字段
    Mock::given(path("/algorithms/s2"))
        .and(body_json(json!({
            "command": "execute",
            "block": returned.clone(),
            "params": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"block": returned.clone()})))
        .expect(1)
        .mount(&server)
        .await;

    let result = pipeline_runner(config_for(&server))
        .run_pipeline(block(json!({
            "response": "B",
            "algorithmPipeline": [{"algorithmFunction": "s1"}, {"algorithmFunction": "s2"}]
        })))
        .await
        .expect("流水线应该成功");

    assert_eq!(serde_json::to_value(&result).unwrap(), returned);
}

#[tokio::test]
async fn test_stage_block_with_loose_field_types() {
    let server = MockServer::start().await;
    forbid_answer_lookup(&server).await;

    Mock::given(path("/algorithms/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "block": {
                "algorithmPipeline": "done",
                "gradeFunction": 7,
                "response": "B",
                "answer": null
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/grading/7"))
        .and(body_json(json!({"response": "B", "answer": null, "params": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"isCorrect": false})))
        .expect(1)
        .mount(&server)
        .await;

    let result = gateway(config_for(&server))
        .handle(
            Some(block(json!({
                "gradeFunction": "mc1",
                "algorithmPipeline": [{"algorithmFunction": "s1"}]
            }))),
            &HeaderMap::new(),
        )
        .await;

    assert_eq!(result, Ok(json!({"isCorrect": false})));
}

#[tokio::test]
async fn test_stage_block_not_an_object() {
    let server = MockServer::start().await;

    Mock::given(path("/algorithms/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"block": [1, 2]})))
        .expect(1)
        .mount(&server)
        .await;

    let err = pipeline_runner(config_for(&server).with_debug(true))
        .run_pipeline(block(json!({"algorithmPipeline": [{"algorithmFunction": "s1"}]})))
        .await
        .unwrap_err();

    assert_eq!(err.level(), "Grading Gateway: Algorithm Function: s1");
    assert!(err.description().contains("not an object"));
    assert_eq!(err.detail("raw_response"), Some(&json!([1, 2])));
}

#[tokio::test]
async fn test_failing_stage_aborts_pipeline() {
    let server = MockServer::start().await;

    Mock::given(path("/algorithms/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"block": {"response": "B"}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/algorithms/s2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/algorithms/s3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"block": {}})))
        .expect(0)
        .mount(&server)
        .await;

    let err = pipeline_runner(config_for(&server))
        .run_pipeline(block(json!({
            "response": "B",
            "algorithmPipeline": [
                {"algorithmFunction": "s1"},
                {"algorithmFunction": "s2"},
                {"algorithmFunction": "s3"}
            ]
        })))
        .await
        .unwrap_err();

    assert_eq!(err.level(), "Grading Gateway: Algorithm Function: s2 get");
    assert!(err.description().starts_with("A Http Error occurred: "));
    assert_eq!(err.detail("req_json"), Some(&json!(REDACTED)));
}

#[tokio::test]
async fn test_stage_error_result_is_passed_through() {
    let server = MockServer::start().await;
    forbid_answer_lookup(&server).await;

    let downstream = json!({
        "error": {"level": "normalize", "description": "cannot normalise input"}
    });
    Mock::given(path("/algorithms/normalize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(downstream.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path_regex("^/grading/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let err = gateway(config_for(&server))
        .handle(
            Some(block(json!({
                "gradeFunction": "mc1",
                "response": "B",
                "algorithmPipeline": [{"algorithmFunction": "normalize"}]
            }))),
            &bearer("Bearer tok"),
        )
        .await
        .unwrap_err();

    assert_eq!(serde_json::to_value(&err).unwrap(), downstream);
}

#[tokio::test]
async fn test_stage_without_block_is_contract_error() {
    let server = MockServer::start().await;

    Mock::given(path("/algorithms/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": 1})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/algorithms/s2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"block": {}})))
        .expect(0)
        .mount(&server)
        .await;

    let stages = json!({
        "algorithmPipeline": [{"algorithmFunction": "s1"}, {"algorithmFunction": "s2"}]
    });

    let err = pipeline_runner(config_for(&server))
        .run_pipeline(block(stages.clone()))
        .await
        .unwrap_err();
    assert_eq!(err.level(), "Grading Gateway: Algorithm Function: s1");
    assert!(err.description().contains("did not return block"));
    assert_eq!(err.detail("raw_response"), Some(&json!(REDACTED)));

    // 调试模式下回显原始响应
    let err = pipeline_runner(config_for(&server).with_debug(true))
        .run_pipeline(block(stages))
        .await
        .unwrap_err();
    assert_eq!(err.detail("raw_response"), Some(&json!({"result": 1})));
}

#[tokio::test]
async fn test_pipeline_supplied_answer_skips_lookup() {
    let server = MockServer::start().await;
    forbid_answer_lookup(&server).await;

    Mock::given(path("/algorithms/make-question"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "block": {"gradeFunction": "num", "response": 12, "answer": 12}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/grading/num"))
        .and(body_json(json!({"response": 12, "answer": 12, "params": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"isCorrect": true})))
        .expect(1)
        .mount(&server)
        .await;

    let result = gateway(config_for(&server))
        .handle(
            Some(block(json!({
                "gradeFunction": "num",
                "response": 12,
                "algorithmPipeline": [{"algorithmFunction": "make-question"}]
            }))),
            &HeaderMap::new(),
        )
        .await;

    assert_eq!(result, Ok(json!({"isCorrect": true})));
}

// ========== 答案查询 ==========

#[tokio::test]
async fn test_missing_authorization_makes_no_lookup() {
    let server = MockServer::start().await;
    forbid_answer_lookup(&server).await;

    let err = gateway(config_for(&server))
        .handle(
            Some(block(json!({"gradeFunction": "mc1", "response": "B", "response_id": "r1"}))),
            &HeaderMap::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.level(), "Grading Gateway: Get Correct Answer");
    assert_eq!(err.description(), "The Authorization header was not supplied");
}

#[tokio::test]
async fn test_malformed_authorization_shapes() {
    let server = MockServer::start().await;
    forbid_answer_lookup(&server).await;
    let gateway = gateway(config_for(&server));

    let cases = [
        ("Bearer abc def", "Authorization header must be: Bearer token"),
        ("Bearer", "Token not found in Authorization header"),
        ("Token abc", "Authorization header must start with Bearer"),
    ];

    for (authorization, expected) in cases {
        let err = gateway
            .handle(
                Some(block(json!({"gradeFunction": "mc1", "response": "B", "response_id": "r1"}))),
                &bearer(authorization),
            )
            .await
            .unwrap_err();

        assert_eq!(err.level(), "Grading Gateway: Get Correct Answer");
        assert_eq!(err.description(), expected, "Authorization: {}", authorization);
    }
}

#[tokio::test]
async fn test_missing_response_id() {
    let server = MockServer::start().await;
    forbid_answer_lookup(&server).await;

    let err = gateway(config_for(&server))
        .handle(
            Some(block(json!({"gradeFunction": "mc1", "response": "B"}))),
            &bearer("Bearer tok"),
        )
        .await
        .unwrap_err();

    assert!(err.description().contains("`response_id`"));
}

#[tokio::test]
async fn test_answer_lookup_error_is_returned() {
    let server = MockServer::start().await;

    Mock::given(path("/answer"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path_regex("^/grading/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let err = gateway(config_for(&server).with_debug(true))
        .handle(
            Some(block(json!({"gradeFunction": "mc1", "response": "B", "response_id": "r1"}))),
            &bearer("Bearer tok"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.level(), "Grading Gateway: Get Correct Answer get");
    assert!(err.description().starts_with("A Http Error occurred: "));
    assert_eq!(err.detail("req_json"), Some(&json!({"response_id": "r1"})));
}

// ========== 评分 ==========

#[tokio::test]
async fn test_missing_grade_function_makes_no_call() {
    let server = MockServer::start().await;
    Mock::given(path_regex("^/grading/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let err = grade_dispatcher(config_for(&server))
        .dispatch_grade(&block(json!({"response": "B", "answer": "B"})))
        .await
        .unwrap_err();

    assert_eq!(err.level(), "Grading Gateway: Get Grade");
    assert!(err.description().contains("`gradeFunction` is a required field"));
}

#[tokio::test]
async fn test_gateway_relabels_missing_grade_function_as_none() {
    let server = MockServer::start().await;
    forbid_answer_lookup(&server).await;
    Mock::given(path_regex("^/grading/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let err = gateway(config_for(&server))
        .handle(
            Some(block(json!({"response": "B", "answer": "B"}))),
            &HeaderMap::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.level(), "Grading Function: None");
    assert!(err.description().contains("`gradeFunction` is a required field"));
}

#[tokio::test]
async fn test_grading_http_error_is_relabelled() {
    let server = MockServer::start().await;
    Mock::given(path("/grading/mc1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway(config_for(&server))
        .handle(
            Some(block(json!({"gradeFunction": "mc1", "response": "B", "answer": "B"}))),
            &HeaderMap::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.level(), "Grading Function: mc1");
    assert!(err.description().starts_with("A Http Error occurred: "));
}

#[tokio::test]
async fn test_grading_connection_error_is_relabelled() {
    let base = closed_port_url();
    let config = Config::new(
        format!("{}/algorithms", base),
        format!("{}/grading", base),
        format!("{}/answer", base),
    );

    let err = gateway(config)
        .handle(
            Some(block(json!({"gradeFunction": "mc1", "response": "B", "answer": "B"}))),
            &HeaderMap::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.level(), "Grading Function: mc1");
    assert!(err
        .description()
        .starts_with("An Error Connecting to the API occurred: "));
}

#[tokio::test]
async fn test_grading_timeout() {
    let server = MockServer::start().await;
    Mock::given(path("/grading/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"isCorrect": true}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = grade_dispatcher(config_for(&server).with_timeout_secs(1))
        .dispatch_grade(&block(json!({"gradeFunction": "slow", "response": 1, "answer": 1})))
        .await
        .unwrap_err();

    assert_eq!(err.level(), "Grading Gateway: Grading Function: slow get");
    assert!(err.description().starts_with("A Timeout Error occurred: "));
}

#[tokio::test]
async fn test_grading_response_not_json() {
    let server = MockServer::start().await;
    Mock::given(path("/grading/mc1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = grade_dispatcher(config_for(&server).with_debug(true))
        .dispatch_grade(&block(json!({"gradeFunction": "mc1", "response": "B", "answer": "B"})))
        .await
        .unwrap_err();

    // 解析错误不加 " get"，也不回显请求体
    assert_eq!(err.level(), "Grading Gateway: Grading Function: mc1");
    assert!(err
        .description()
        .starts_with("An Error occured when parsing JSON from response"));
    assert!(err.error.details.is_empty());
}
