// tests/api_tests.rs

use std::sync::Arc;

use adaptive_assessment::{
    bank::{InMemoryQuestionBank, QuestionBank},
    config::Config,
    models::question::Question,
    routes,
    state::AppState,
    utils::jwt::sign_jwt,
};
use serde_json::Value;

const SECRET: &str = "test_secret_for_integration_tests";

const MATH_STRANDS: [&str; 5] = [
    "Number & Operations",
    "Algebra",
    "Geometry",
    "Measurement",
    "Data Analysis & Probability",
];

/// Five grade 5 questions per math strand, one per difficulty. Every answer key is "A".
fn math_bank(per_strand: u8) -> Vec<Question> {
    let mut questions = Vec::new();
    for (s, strand) in MATH_STRANDS.iter().enumerate() {
        for d in 1..=per_strand {
            questions.push(Question {
                id: format!("m{}-{}", s, d),
                subject: "Mathematics".to_string(),
                strand: strand.to_string(),
                format: "multiple_choice".to_string(),
                difficulty: d,
                grade_level: "5".to_string(),
                standards: vec![format!("5.{}.{}", s, d)],
                content: format!("Question {} {}", s, d),
                options: vec!["A".to_string(), "B".to_string(), "C".to_string()],
                answer: "A".to_string(),
            });
        }
    }
    questions
}

/// Spawns the app on a random port with the given bank.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app(questions: Vec<Question>) -> String {
    spawn_app_with_time_cap(questions, 20).await
}

async fn spawn_app_with_time_cap(questions: Vec<Question>, max_session_minutes: i64) -> String {
    let config = Config {
        database_url: None,
        question_bank_path: String::new(),
        jwt_secret: SECRET.to_string(),
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        max_session_minutes,
        session_retention_minutes: 60,
        enforce_strand_requirements: true,
    };
    let bank: Arc<dyn QuestionBank> =
        Arc::new(InMemoryQuestionBank::new(questions).expect("valid bank"));
    let app = routes::create_router(AppState::new(bank, config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

fn token(subject: &str, role: &str) -> String {
    sign_jwt(subject, role, SECRET, 600).unwrap()
}

async fn create_session(client: &reqwest::Client, address: &str, token: &str) -> Value {
    let response = client
        .post(format!("{}/api/assessments", address))
        .bearer_auth(token)
        .json(&serde_json::json!({ "subject": "Math", "grade_level": "5" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

async fn next(client: &reqwest::Client, address: &str, token: &str, id: &str) -> Value {
    let response = client
        .post(format!("{}/api/assessments/{}/next", address, id))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}

async fn answer(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    id: &str,
    question_id: &str,
    answer: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/api/assessments/{}/answers", address, id))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "question_id": question_id,
            "answer": answer,
            "time_spent_seconds": 12.0
        }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn unknown_path_is_404() {
    let address = spawn_app(math_bank(5)).await;
    let response = reqwest::get(format!("{}/random_path_that_does_not_exist", address))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn requests_without_token_are_rejected() {
    let address = spawn_app(math_bank(5)).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/assessments", address))
        .json(&serde_json::json!({ "subject": "Math", "grade_level": "5" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .post(format!("{}/api/assessments", address))
        .bearer_auth("not-a-jwt")
        .json(&serde_json::json!({ "subject": "Math", "grade_level": "5" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn create_session_validates_payload() {
    let address = spawn_app(math_bank(5)).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/assessments", address))
        .bearer_auth(token("student-1", "student"))
        .json(&serde_json::json!({ "subject": "", "grade_level": "5" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn full_adaptive_session_flow() {
    let address = spawn_app(math_bank(5)).await;
    let client = reqwest::Client::new();
    let student = token("student-1", "student");

    let created = create_session(&client, &address, &student).await;
    assert_eq!(created["status"], "in_progress");
    assert_eq!(created["current_ability"], 0.0);
    assert_eq!(created["standard_error"], 1.0);
    assert_eq!(created["questions_answered"], 0);
    let id = created["id"].as_str().unwrap().to_string();

    let mut finished = None;
    let mut seen = std::collections::HashSet::new();
    for _ in 0..30 {
        let body = next(&client, &address, &student, &id).await;
        if body["state"] == "finished" {
            finished = Some(body);
            break;
        }
        assert_eq!(body["state"], "question");
        assert!(body["question"].get("answer").is_none());

        let question_id = body["question"]["id"].as_str().unwrap().to_string();
        assert!(seen.insert(question_id.clone()), "question offered twice");

        // Asking again before answering re-offers the same question.
        let again = next(&client, &address, &student, &id).await;
        assert_eq!(again["question"]["id"], question_id.as_str());

        let response = answer(&client, &address, &student, &id, &question_id, "A").await;
        assert_eq!(response.status().as_u16(), 200);
        let graded: Value = response.json().await.unwrap();
        assert_eq!(graded["is_correct"], true);
        if graded["finished"] == true {
            assert_eq!(graded["result"]["status"], "completed");
        }
    }

    let finished = finished.expect("session should finish");
    let total = finished["result"]["total_questions"].as_u64().unwrap();
    assert!((15..=25).contains(&total));
    assert_eq!(finished["result"]["status"], "completed");

    let result: Value = client
        .get(format!("{}/api/assessments/{}/result", address, id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(result["total_questions"].as_u64(), Some(total));
    assert_eq!(result["total_correct"].as_u64(), Some(total));
    assert_eq!(result["accuracy"], 100.0);
    assert!(result["percentile"].as_u64().unwrap() >= 50);

    // Finished sessions take no more answers.
    let late = answer(&client, &address, &student, &id, "m0-1", "A").await;
    assert_eq!(late.status().as_u16(), 409);
}

#[tokio::test]
async fn answer_must_match_pending_question() {
    let address = spawn_app(math_bank(5)).await;
    let client = reqwest::Client::new();
    let student = token("student-2", "student");

    let created = create_session(&client, &address, &student).await;
    let id = created["id"].as_str().unwrap();

    // Nothing offered yet.
    let response = answer(&client, &address, &student, id, "m0-1", "A").await;
    assert_eq!(response.status().as_u16(), 400);

    let offered = next(&client, &address, &student, id).await;
    let offered_id = offered["question"]["id"].as_str().unwrap();
    let other = if offered_id == "m0-1" { "m0-2" } else { "m0-1" };

    let response = answer(&client, &address, &student, id, other, "A").await;
    assert_eq!(response.status().as_u16(), 400);

    let response = answer(&client, &address, &student, id, offered_id, "B").await;
    assert_eq!(response.status().as_u16(), 200);
    let graded: Value = response.json().await.unwrap();
    assert_eq!(graded["is_correct"], false);
    assert_eq!(graded["questions_answered"], 1);
    assert_eq!(graded["finished"], false);
}

#[tokio::test]
async fn sessions_are_private_to_examinee_and_reviewers() {
    let address = spawn_app(math_bank(5)).await;
    let client = reqwest::Client::new();
    let owner = token("student-3", "student");

    let created = create_session(&client, &address, &owner).await;
    let id = created["id"].as_str().unwrap();

    let intruder = client
        .get(format!("{}/api/assessments/{}", address, id))
        .bearer_auth(token("student-4", "student"))
        .send()
        .await
        .unwrap();
    assert_eq!(intruder.status().as_u16(), 403);

    let reviewer = client
        .get(format!("{}/api/assessments/{}", address, id))
        .bearer_auth(token("teacher-1", "teacher"))
        .send()
        .await
        .unwrap();
    assert_eq!(reviewer.status().as_u16(), 200);

    // Reviewers can read but not drive the session.
    let drive = client
        .post(format!("{}/api/assessments/{}/next", address, id))
        .bearer_auth(token("teacher-1", "teacher"))
        .send()
        .await
        .unwrap();
    assert_eq!(drive.status().as_u16(), 403);

    let missing = client
        .get(format!("{}/api/assessments/{}", address, uuid_like()))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

fn uuid_like() -> &'static str {
    "00000000-0000-4000-8000-000000000000"
}

#[tokio::test]
async fn exhausted_bank_completes_session() {
    // One question per strand: the bank runs dry before the minimum length.
    let address = spawn_app(math_bank(1)).await;
    let client = reqwest::Client::new();
    let student = token("student-5", "student");

    let created = create_session(&client, &address, &student).await;
    let id = created["id"].as_str().unwrap();

    for _ in 0..5 {
        let body = next(&client, &address, &student, id).await;
        let question_id = body["question"]["id"].as_str().unwrap().to_string();
        let response = answer(&client, &address, &student, id, &question_id, "A").await;
        assert_eq!(response.status().as_u16(), 200);
    }

    let body = next(&client, &address, &student, id).await;
    assert_eq!(body["state"], "finished");
    assert_eq!(body["reason"], "Question bank exhausted");
    assert_eq!(body["result"]["total_questions"], 5);
}

#[tokio::test]
async fn abandoned_session_is_closed() {
    let address = spawn_app(math_bank(5)).await;
    let client = reqwest::Client::new();
    let student = token("student-6", "student");

    let created = create_session(&client, &address, &student).await;
    let id = created["id"].as_str().unwrap();

    let in_progress = client
        .get(format!("{}/api/assessments/{}/result", address, id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(in_progress.status().as_u16(), 409);

    let abandoned: Value = client
        .post(format!("{}/api/assessments/{}/abandon", address, id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(abandoned["status"], "abandoned");

    let body = next(&client, &address, &student, id).await;
    assert_eq!(body["state"], "finished");
    assert_eq!(body["result"]["status"], "abandoned");

    let finalize = client
        .post(format!("{}/api/assessments/{}/finalize", address, id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(finalize.status().as_u16(), 409);
}

#[tokio::test]
async fn expired_session_times_out() {
    // A zero-minute cap expires the session on its first request.
    let address = spawn_app_with_time_cap(math_bank(5), 0).await;
    let client = reqwest::Client::new();
    let student = token("student-7", "student");

    let created = create_session(&client, &address, &student).await;
    let id = created["id"].as_str().unwrap();

    let body = next(&client, &address, &student, id).await;
    assert_eq!(body["state"], "finished");
    assert_eq!(body["reason"], "Time limit exceeded");
    assert_eq!(body["result"]["status"], "timed_out");
    assert_eq!(body["result"]["total_questions"], 0);

    let response = answer(&client, &address, &student, id, "m0-1", "A").await;
    assert_eq!(response.status().as_u16(), 409);

    let summary: Value = client
        .get(format!("{}/api/assessments/{}", address, id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["status"], "timed_out");
}
