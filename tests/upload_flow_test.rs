// ==========================================
// 上传流程集成测试
// ==========================================
// 测试目标: 三种提交协议 + 登录失败 + 台账记录
// 远端: wiremock 模拟 Salesforce
// ==========================================


use opportunity_loader::app::commands;
use opportunity_loader::config::UploadConfig;
use opportunity_loader::importer::write_opportunities;
use opportunity_loader::logging;
use opportunity_loader::salesforce::{
    ApexScriptSubmitter, BulkIngestSubmitter, RemoteError, SalesforceClient,
};
use opportunity_loader::{CloseDateFormat, SubmitProtocol, UploadOrchestrator};
use std::sync::Arc;
use std::time::Duration;
use test_helpers::*;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn connected_client(server: &MockServer) -> Arc<SalesforceClient> {
    mount_login(server).await;
    let client = SalesforceClient::connect(&sf_config_for(server), Duration::from_secs(5))
        .await
        .unwrap();
    Arc::new(client)
}

fn no_delay(protocol: SubmitProtocol, batch_size: usize) -> UploadConfig {
    UploadConfig::for_protocol(protocol)
        .with_batch_size(batch_size)
        .with_inter_batch_delay(Duration::ZERO)
}

#[tokio::test]
async fn test_login_sets_bearer_session() {
    logging::init_test();
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    assert_eq!(client.session().session_id, TEST_SESSION_ID);
    assert_eq!(
        client.session().instance_url.as_str(),
        format!("{}/", server.uri())
    );
}

#[tokio::test]
async fn test_login_fault_is_fatal() {
    let server = MockServer::start().await;
    mount_login_fault(&server).await;

    let err = SalesforceClient::connect(&sf_config_for(&server), Duration::from_secs(5))
        .await
        .unwrap_err();
    match &err {
        RemoteError::Login(message) => assert!(message.contains("INVALID_LOGIN")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_rest_upload_continues_after_http_error() {
    logging::init_test();
    let server = MockServer::start().await;
    mount_login(&server).await;

    // 第 2 批（第 11~20 行）返回 500
    Mock::given(method("POST"))
        .and(path("/services/apexrest/api/opportunity/bulk"))
        .and(body_string_contains("externalOpp0000011"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/services/apexrest/api/opportunity/bulk"))
        .and(header("authorization", format!("Bearer {}", TEST_SESSION_ID).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "Success",
            "recordCount": 10,
            "batchJobId": "707xx0000000001"
        })))
        .mount(&server)
        .await;

    let (dir, state) = create_test_state(&server);
    let csv_path = dir.path().join("opps.csv");
    write_opportunities(&csv_path, sample_records(30), CloseDateFormat::DayMonthYear).unwrap();

    let config = no_delay(SubmitProtocol::RestJson, 10).with_csv_path(&csv_path);
    let mut out = Vec::new();
    let summary = commands::upload_csv(&state, &config, &mut out).await.unwrap();

    assert_eq!(summary.total_batches, 3);
    assert_eq!(summary.batches_attempted, 3);
    assert_eq!(summary.batches_succeeded, 2);
    assert_eq!(summary.batches_failed(), 1);
    assert_eq!(summary.records_processed, 20);
    assert_eq!(summary.records_failed, 10);
    assert_eq!(summary.job_ids.len(), 2);

    // 登录 1 次 + 3 个批次
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);

    // 台账记录了运行、失败批次与作业 ID
    let runs = state.ledger.recent_runs(1).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].protocol, SubmitProtocol::RestJson);
    assert_eq!(runs[0].batches_succeeded, 2);
    let outcomes = state.ledger.batch_outcomes(&runs[0].run_id).unwrap();
    assert!(!outcomes[1].success);
    assert!(outcomes[1].error.as_deref().unwrap().contains("500"));
    assert_eq!(state.ledger.job_ids_for_run(&runs[0].run_id).unwrap().len(), 2);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("成功批次: 2/3"));
}

#[tokio::test]
async fn test_rest_rejection_is_failed_batch() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/services/apexrest/api/opportunity/bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "message": "Too many DML rows",
            "recordCount": 0,
            "batchJobId": null
        })))
        .mount(&server)
        .await;

    let (dir, state) = create_test_state(&server);
    let csv_path = dir.path().join("opps.csv");
    write_opportunities(&csv_path, sample_records(5), CloseDateFormat::Iso).unwrap();

    let config = no_delay(SubmitProtocol::RestJson, 10).with_csv_path(&csv_path);
    let summary = commands::upload_csv(&state, &config, &mut Vec::new()).await.unwrap();

    assert_eq!(summary.total_batches, 1);
    assert_eq!(summary.batches_succeeded, 0);
    let run_id = state.ledger.recent_runs(1).unwrap()[0].run_id.clone();
    let outcomes = state.ledger.batch_outcomes(&run_id).unwrap();
    assert!(outcomes[0].error.as_deref().unwrap().contains("Too many DML rows"));
}

#[tokio::test]
async fn test_upload_aborts_on_login_failure() {
    let server = MockServer::start().await;
    mount_login_fault(&server).await;

    let (dir, state) = create_test_state(&server);
    let csv_path = dir.path().join("opps.csv");
    write_opportunities(&csv_path, sample_records(5), CloseDateFormat::DayMonthYear).unwrap();

    let config = no_delay(SubmitProtocol::RestJson, 2).with_csv_path(&csv_path);
    let err = commands::upload_csv(&state, &config, &mut Vec::new())
        .await
        .unwrap_err();
    assert!(err.is_login_failure());

    // 只有登录请求,没有任何批次
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert!(state.ledger.recent_runs(5).unwrap().is_empty());
}

#[tokio::test]
async fn test_apex_compile_problem_fails_batches() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("GET"))
        .and(path(data_path("tooling/executeAnonymous/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "compiled": false,
            "success": false,
            "compileProblem": "Variable does not exist: OpportunityBulkUploader",
            "exceptionMessage": null,
            "line": 1,
            "column": 1
        })))
        .mount(&server)
        .await;

    let submitter = ApexScriptSubmitter::new(client);
    let records = sample_records(7);
    let summary = UploadOrchestrator::new(&submitter, no_delay(SubmitProtocol::ApexScript, 5))
        .run(&records)
        .await
        .unwrap();

    assert_eq!(summary.total_batches, 2);
    assert_eq!(summary.batches_attempted, 2);
    assert_eq!(summary.batches_succeeded, 0);
    assert_eq!(summary.records_failed, 7);

    // 2 个批次 + 1 次 flush
    let apex_calls = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path().ends_with("executeAnonymous/"))
        .count();
    assert_eq!(apex_calls, 3);
}

#[tokio::test]
async fn test_apex_script_success_and_flush() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("GET"))
        .and(path(data_path("tooling/executeAnonymous/")))
        .and(query_param("anonymousBody", "OpportunityBulkUploader.flush();"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "compiled": true,
            "success": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(data_path("tooling/executeAnonymous/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "compiled": true,
            "success": true,
            "compileProblem": null,
            "exceptionMessage": null
        })))
        .mount(&server)
        .await;

    let submitter = ApexScriptSubmitter::new(client);
    let records = sample_records(3);
    let summary = UploadOrchestrator::new(&submitter, no_delay(SubmitProtocol::ApexScript, 10))
        .run(&records)
        .await
        .unwrap();

    assert!(summary.is_complete_success());
    assert_eq!(summary.records_processed, 3);
    assert!(summary.job_ids.is_empty());

    let batch_request = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| {
            r.url
                .query_pairs()
                .any(|(k, v)| k == "anonymousBody" && v.contains("addRecord"))
        })
        .unwrap();
    let script: String = batch_request
        .url
        .query_pairs()
        .find(|(k, _)| k == "anonymousBody")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    assert_eq!(script.lines().count(), 3);
    assert!(script.starts_with("OpportunityBulkUploader.addRecord('externalOpp0000001', 'Discovery', 10, "));
}

#[tokio::test]
async fn test_bulk_ingest_creates_job_per_batch() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("POST"))
        .and(path(data_path("jobs/ingest")))
        .and(body_string_contains("\"externalIdFieldName\":\"External_Id__c\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "7505g000000AAAA",
            "state": "Open",
            "object": "Opportunity",
            "operation": "upsert"
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(data_path("jobs/ingest/7505g000000AAAA/batches")))
        .and(header("content-type", "text/csv"))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(data_path("jobs/ingest/7505g000000AAAA")))
        .and(body_string_contains("UploadComplete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "7505g000000AAAA",
            "state": "UploadComplete"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let submitter = BulkIngestSubmitter::new(client);
    let records = sample_records(4);
    let summary = UploadOrchestrator::new(&submitter, no_delay(SubmitProtocol::BulkIngest, 2))
        .run(&records)
        .await
        .unwrap();

    assert!(summary.is_complete_success());
    assert_eq!(summary.records_processed, 4);
    assert_eq!(
        summary.job_ids,
        vec!["7505g000000AAAA".to_string(), "7505g000000AAAA".to_string()]
    );

    let put = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.method.as_str() == "PUT")
        .unwrap();
    let csv = String::from_utf8(put.body).unwrap();
    assert!(csv.starts_with("External_Id__c,Name,AccountId,Amount,StageName,CloseDate\n"));
    assert!(csv.contains("externalOpp0000001,name_externalOpp0000001,"));
    assert!(csv.contains(",2026-11-01\n"));
}

#[tokio::test]
async fn test_bulk_ingest_aborts_job_when_upload_fails() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("POST"))
        .and(path(data_path("jobs/ingest")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "750B",
            "state": "Open"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(data_path("jobs/ingest/750B/batches")))
        .respond_with(ResponseTemplate::new(400).set_body_string("[{\"errorCode\":\"INVALIDDATA\"}]"))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(data_path("jobs/ingest/750B")))
        .and(body_string_contains("Aborted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "750B",
            "state": "Aborted"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let submitter = BulkIngestSubmitter::new(client);
    let records = sample_records(2);
    let summary = UploadOrchestrator::new(&submitter, no_delay(SubmitProtocol::BulkIngest, 10))
        .run(&records)
        .await
        .unwrap();

    assert_eq!(summary.batches_succeeded, 0);
    assert!(summary.job_ids.is_empty());
}
