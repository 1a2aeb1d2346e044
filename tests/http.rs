use once_cell::sync::Lazy;
use reqwest::{redirect::Policy, Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct SessionResponse {
    user: UserResponse,
    token: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct HabitResponse {
    id: String,
    name: String,
    completed_today: bool,
    streak: u32,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("journalix_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_journalix"))
        .env("PORT", port.to_string())
        .env("JOURNALIX_DATA_PATH", unique_data_path())
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

// Tests share one server, so every account gets its own address.
async fn sign_up(client: &Client, base_url: &str, name: &str) -> SessionResponse {
    let email = format!("{}-{}@example.com", name.to_lowercase(), uuid::Uuid::new_v4().simple());
    let response = client
        .post(format!("{base_url}/api/auth/signup"))
        .json(&json!({ "name": name, "email": email, "password": "correct horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().get("set-cookie").is_some());
    response.json().await.unwrap()
}

async fn create_habit(client: &Client, base_url: &str, token: &str, name: &str) -> HabitResponse {
    let response = client
        .post(format!("{base_url}/api/habits"))
        .bearer_auth(token)
        .json(&json!({ "name": name, "category": "Health" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn habit_on(
    client: &Client,
    base_url: &str,
    token: &str,
    id: &str,
    date: &str,
) -> HabitResponse {
    let habits: Vec<HabitResponse> = client
        .get(format!("{base_url}/api/habits?date={date}"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    habits.into_iter().find(|h| h.id == id).expect("habit listed")
}

#[tokio::test]
async fn http_sign_up_opens_a_session() {
    let server = shared_server().await;
    let client = Client::new();
    let session = sign_up(&client, &server.base_url, "Ada").await;

    let me: UserResponse = client
        .get(format!("{}/api/auth/session", server.base_url))
        .bearer_auth(&session.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me.id, session.user.id);
    assert_eq!(me.name, "Ada");
    assert_eq!(me.email, session.user.email);

    let response = client
        .post(format!("{}/api/auth/signout", server.base_url))
        .bearer_auth(&session.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/api/auth/session", server.base_url))
        .bearer_auth(&session.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn http_api_requires_a_session() {
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/habits", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "auth");
}

#[tokio::test]
async fn http_streak_counts_back_from_reference_day() {
    let server = shared_server().await;
    let client = Client::new();
    let session = sign_up(&client, &server.base_url, "Streaker").await;
    let habit = create_habit(&client, &server.base_url, &session.token, "Read").await;
    assert_eq!(habit.name, "Read");
    assert_eq!(habit.streak, 0);

    for date in ["2024-03-01", "2024-03-02", "2024-03-03", "2024-03-05"] {
        let response = client
            .post(format!("{}/api/habits/{}/toggle", server.base_url, habit.id))
            .bearer_auth(&session.token)
            .json(&json!({ "date": date }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let on_third = habit_on(&client, &server.base_url, &session.token, &habit.id, "2024-03-03").await;
    assert!(on_third.completed_today);
    assert_eq!(on_third.streak, 3);

    let on_fourth = habit_on(&client, &server.base_url, &session.token, &habit.id, "2024-03-04").await;
    assert!(!on_fourth.completed_today);
    assert_eq!(on_fourth.streak, 0);

    let on_fifth = habit_on(&client, &server.base_url, &session.token, &habit.id, "2024-03-05").await;
    assert_eq!(on_fifth.streak, 1);

    // Unmarking the middle day splits the run.
    client
        .post(format!("{}/api/habits/{}/toggle", server.base_url, habit.id))
        .bearer_auth(&session.token)
        .json(&json!({ "date": "2024-03-02", "completed": false }))
        .send()
        .await
        .unwrap();
    let on_third = habit_on(&client, &server.base_url, &session.token, &habit.id, "2024-03-03").await;
    assert_eq!(on_third.streak, 1);

    let days: Vec<String> = client
        .get(format!("{}/api/habits/{}/completions", server.base_url, habit.id))
        .bearer_auth(&session.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(days, vec!["2024-03-05", "2024-03-03", "2024-03-01"]);
}

#[tokio::test]
async fn http_records_are_private_to_their_owner() {
    let server = shared_server().await;
    let client = Client::new();
    let owner = sign_up(&client, &server.base_url, "Owner").await;
    let other = sign_up(&client, &server.base_url, "Other").await;
    let habit = create_habit(&client, &server.base_url, &owner.token, "Stretch").await;

    let response = client
        .patch(format!("{}/api/habits/{}", server.base_url, habit.id))
        .bearer_auth(&other.token)
        .json(&json!({ "name": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let listed: Vec<Value> = client
        .get(format!("{}/api/habits", server.base_url))
        .bearer_auth(&other.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.is_empty());

    let response = client
        .delete(format!("{}/api/habits/{}", server.base_url, habit.id))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn http_journal_export_is_plain_text() {
    let server = shared_server().await;
    let client = Client::new();
    let session = sign_up(&client, &server.base_url, "Writer").await;

    let response = client
        .post(format!("{}/api/journal", server.base_url))
        .bearer_auth(&session.token)
        .json(&json!({ "title": "First day", "content": "Went well.", "mood": "happy" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .get(format!("{}/api/journal/export", server.base_url))
        .bearer_auth(&session.token)
        .send()
        .await
        .unwrap();
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let text = response.text().await.unwrap();
    assert!(text.contains("Title: First day"));
    assert!(text.contains("Mood: happy"));
    assert!(text.contains("Went well."));
}

#[tokio::test]
async fn http_pages_redirect_without_a_session() {
    let server = shared_server().await;
    let client = Client::builder().redirect(Policy::none()).build().unwrap();

    for path in ["/dashboard", "/habits", "/calendar"] {
        let response = client
            .get(format!("{}{path}", server.base_url))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_redirection(), "{path}");
        assert_eq!(response.headers()["location"], "/auth/login");
    }

    let session = sign_up(&client, &server.base_url, "Visitor").await;
    let response = client
        .get(format!("{}/dashboard", server.base_url))
        .header("cookie", format!("journalix_session={}", session.token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains("Hello, Visitor"));
}

#[tokio::test]
async fn http_habit_forms_create_and_delete() {
    let server = shared_server().await;
    let client = Client::builder().redirect(Policy::none()).build().unwrap();
    let session = sign_up(&client, &server.base_url, "Former").await;
    let cookie = format!("journalix_session={}", session.token);

    let response = client
        .post(format!("{}/habits", server.base_url))
        .header("cookie", &cookie)
        .form(&[
            ("name", "Meditate"),
            ("description", ""),
            ("category", "Mindfulness"),
            ("frequency", "daily"),
            ("color", "#f97316"),
            ("reminder_time", ""),
        ])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()["location"], "/habits");

    let habits: Vec<Value> = client
        .get(format!("{}/api/habits", server.base_url))
        .bearer_auth(&session.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(habits.len(), 1);
    assert_eq!(habits[0]["name"], "Meditate");
    assert_eq!(habits[0]["description"], Value::Null);
    let id = habits[0]["id"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{}/habits", server.base_url))
        .header("cookie", &cookie)
        .form(&[("name", "   ")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["location"], "/habits?error=invalid");

    let response = client
        .post(format!("{}/habits/{id}/delete", server.base_url))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["location"], "/habits");

    let habits: Vec<Value> = client
        .get(format!("{}/api/habits", server.base_url))
        .bearer_auth(&session.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(habits.is_empty());
}

#[tokio::test]
async fn http_out_of_range_dates_are_rejected() {
    let server = shared_server().await;
    let client = Client::new();
    let session = sign_up(&client, &server.base_url, "Timetraveler").await;

    for path in [
        "/api/habits?date=-262143-01-01",
        "/api/insights?date=-262143-01-01",
        "/api/calendar?year=-262143&month=1",
        "/api/calendar?year=2026&month=13",
    ] {
        let response = client
            .get(format!("{}{path}", server.base_url))
            .bearer_auth(&session.token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "validation");
    }
}
