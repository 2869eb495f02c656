use campus_timetable::config::ServerConfig;
use campus_timetable::web::exam_router;
use campus_timetable::web::state::ExamState;
use reqwest::multipart::{Form, Part};
use reqwest::{redirect, Client, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// (upload field, file name, content)
const CALENDAR_UPLOADS: [(&str, &str, &str); 8] = [
    ("branch_strength", "BranchStrength.csv", "Year,Branch,Strength\n1st,CSE,60\n1st,ECE,40\n"),
    ("courses_per_year", "CoursesPerYear.csv", "Year,CoursesPerYear\n1st,2\n"),
    ("common_course", "CommonCourse.csv", "CourseCode,Credits,Year,Branches\n"),
    (
        "settings",
        "Settings.csv",
        "SettingName,Value\nCreditsPerCourse,3\nMaxStudentsPerSlot,500\nMaxCoursesPerSlot,10\n\
         TotalRooms,4\nRoomCapacityPerCourse,30\nSeatsPerRoom,50\n",
    ),
    ("faculty", "FACULTY.csv", "Name\nF1\nF2\nF3\nF4\nF5\nF6\n"),
    ("rooms", "rooms.csv", "Room\nR1\nR2\nR3\nR4\n"),
    ("courselist", "courselist.csv", "Year,Branch,CourseCode,Credits\n1st,CSE,CS101,4\n"),
    ("students", "students.csv", "Year,Branch,StudentId\n1st,CSE,21CS001\n1st,CSE,21CS002\n"),
];

struct TestServer {
    addr: SocketAddr,
    state: Arc<ExamState>,
    client: Client,
    _dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = ServerConfig::default();
        config.paths.exam_workdir = dir.path().join("uploads");
        config.paths.seating_workdir = dir.path().join("uploadsExam");
        let state = ExamState::new(&config, false).await.unwrap();
        let app = exam_router(state.clone(), 16 * 1024 * 1024);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder().redirect(redirect::Policy::none()).build().unwrap();
        Self {
            addr,
            state,
            client,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Logs in and returns the `exam_session=...` cookie pair.
    async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response.headers()["set-cookie"].to_str().unwrap();
        cookie.split(';').next().unwrap().to_string()
    }

    async fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url(path));
        if let Some(cookie) = cookie {
            request = request.header("Cookie", cookie);
        }
        request.send().await.unwrap()
    }
}

fn location(response: &reqwest::Response) -> &str {
    response.headers()["location"].to_str().unwrap()
}

fn calendar_form(start: &str, end: &str) -> Form {
    let mut form = Form::new()
        .text("start_date", start.to_string())
        .text("end_date", end.to_string())
        .text("max_credits_per_day", "5")
        .text("allocation_1_Morning", "cse, ece")
        .text("allocation_1_Evening", "");
    for (field, file, content) in CALENDAR_UPLOADS {
        form = form.part(field, Part::bytes(content.as_bytes()).file_name(file));
    }
    form
}

fn seating_form() -> Form {
    Form::new()
        .part(
            "courses_file",
            Part::bytes("CS101,MA101\n21001,21001\n21002,21002\n21003,\n".as_bytes()).file_name("year 1.csv"),
        )
        .part("courses_file", Part::bytes("CS201\n22001\n".as_bytes()).file_name("year2.csv"))
        .part("rooms_file", Part::bytes("Room,Capacity\nC101,4\nC405,6\n".as_bytes()).file_name("rooms.csv"))
        .part("faculty_file", Part::bytes("Name\nDr. X\nDr. Y\n".as_bytes()).file_name("faculty.csv"))
        .text("start_date", "2025-11-03")
        .text("courses_per_room", "2")
}

#[tokio::test]
async fn test_health_is_public() {
    let server = TestServer::start().await;
    let response = server.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_pages_redirect_to_login_without_session() {
    let server = TestServer::start().await;

    let response = server.get("/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = server.get("/seating/view", None).await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_json_routes_answer_401_without_session() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/api/update_cell"))
        .json(&serde_json::json!({ "sheet": "Exam Schedule", "row": 0, "col": 0, "value": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Login required");
}

#[tokio::test]
async fn test_login_roles_and_failures() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/login"))
        .form(&[("username", "admin"), ("password", "wrong")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.text().await.unwrap().contains("Invalid credentials"));

    let admin = server.login("admin", "admin123").await;
    assert!(admin.starts_with("exam_session="));
    let response = server.get("/", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let viewer = server.login("view", "view123").await;
    let response = server.get("/", Some(&viewer)).await;
    assert_eq!(location(&response), "/login");

    let response = server
        .client
        .post(server.url("/api/update_cell"))
        .header("Cookie", &viewer)
        .json(&serde_json::json!({ "sheet": "Exam Schedule", "row": 0, "col": 0, "value": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Admin access required");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let server = TestServer::start().await;
    let admin = server.login("admin", "admin123").await;

    let response = server.get("/logout", Some(&admin)).await;
    assert_eq!(location(&response), "/public");

    let response = server.get("/", Some(&admin)).await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_view_without_calendar_goes_public() {
    let server = TestServer::start().await;

    let response = server.get("/view", None).await;
    assert_eq!(location(&response), "/public");

    let response = server.get("/api/get_sheet_data/Exam%20Schedule", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_calendar_form_errors_are_shown() {
    let server = TestServer::start().await;
    let admin = server.login("admin", "admin123").await;

    let response = server
        .client
        .post(server.url("/"))
        .header("Cookie", &admin)
        .multipart(calendar_form("", "2025-10-11"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().contains("Please provide both start and end dates"));

    let form = Form::new()
        .text("start_date", "2025-10-06")
        .text("end_date", "2025-10-11")
        .text("max_credits_per_day", "5");
    let response = server
        .client
        .post(server.url("/"))
        .header("Cookie", &admin)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().contains("Missing file: BranchStrength.csv"));
}

#[tokio::test]
async fn test_generate_view_edit_and_download_calendar() {
    let server = TestServer::start().await;
    let admin = server.login("admin", "admin123").await;

    let response = server
        .client
        .post(server.url("/"))
        .header("Cookie", &admin)
        .multipart(calendar_form("2025-10-06", "2025-10-11"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/view");

    let html = server.get("/view", Some(&admin)).await.text().await.unwrap();
    assert!(html.contains("CS101"));
    assert!(html.contains("contenteditable=\"true\""));

    let public_html = server.get("/view", None).await.text().await.unwrap();
    assert!(!public_html.contains("contenteditable=\"true\">"));

    let body: serde_json::Value = server
        .get("/api/get_sheet_data/Exam%20Schedule", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert!(!body["data"].as_array().unwrap().is_empty());

    let response = server
        .client
        .post(server.url("/api/update_cell"))
        .header("Cookie", &admin)
        .json(&serde_json::json!({ "sheet": "Exam Schedule", "row": 0, "col": 0, "value": "Edited" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Cell updated successfully");

    let workbook = server.state.workbook.read().await.clone().unwrap();
    assert_eq!(workbook.sheet("Exam Schedule").unwrap().rows[0][0], "Edited");
    let saved = std::fs::read_to_string(server._dir.path().join("uploads/output/exam_schedule.json")).unwrap();
    assert!(saved.contains("Edited"));

    let response = server
        .client
        .post(server.url("/api/update_cell"))
        .header("Cookie", &admin)
        .json(&serde_json::json!({ "sheet": "Exam Schedule", "row": 9999, "col": 0, "value": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server.get("/download", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/zip");
    let bytes = response.bytes().await.unwrap();
    let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
    assert!(archive.file_names().any(|n| n == "exam_schedule.json"));
}

#[tokio::test]
async fn test_seating_generate_view_and_download() {
    let server = TestServer::start().await;
    let admin = server.login("admin", "admin123").await;

    let response = server
        .client
        .post(server.url("/seating/generate"))
        .header("Cookie", &admin)
        .multipart(seating_form())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(!body["schedule"].as_array().unwrap().is_empty());
    assert_eq!(body["config"]["courses_per_room"], 2);
    assert!(server._dir.path().join("uploadsExam/year1_year_1.csv").exists());
    assert!(server._dir.path().join("uploadsExam/rooms_rooms.csv").exists());

    let viewer = server.login("view", "view123").await;
    let html = server.get("/seating/view", Some(&viewer)).await.text().await.unwrap();
    assert!(html.contains("CS201"));

    let response = server.get("/seating/download/exam_schedule.csv", Some(&viewer)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = server.get("/seating/download/rooms.csv", Some(&viewer)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_seating_requires_all_files() {
    let server = TestServer::start().await;
    let admin = server.login("admin", "admin123").await;

    let form = Form::new()
        .part("courses_file", Part::bytes("CS201\n22001\n".as_bytes()).file_name("year2.csv"))
        .text("start_date", "2025-11-03")
        .text("courses_per_room", "2");
    let response = server
        .client
        .post(server.url("/seating/generate"))
        .header("Cookie", &admin)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing required files");
}

#[tokio::test]
async fn test_seating_rosters_with_the_same_name_stay_separate() {
    let server = TestServer::start().await;
    let admin = server.login("admin", "admin123").await;

    let form = Form::new()
        .part("courses_file", Part::bytes("CS101
21001
".as_bytes()).file_name("roster.csv"))
        .part("courses_file", Part::bytes("CS201
22001
".as_bytes()).file_name("roster.csv"))
        // a roster named like an output must not clobber it
        .part("rooms_file", Part::bytes("Room,Capacity
C101,10
".as_bytes()).file_name("exam_schedule.csv"))
        .part("faculty_file", Part::bytes("Name\nDr. X\n".as_bytes()).file_name("faculty.csv"))
        .text("start_date", "2025-11-03")
        .text("courses_per_room", "2");
    let response = server
        .client
        .post(server.url("/seating/generate"))
        .header("Cookie", &admin)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();

    let mut seated: Vec<(String, String)> = body["schedule"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| (r["Course"].as_str().unwrap().to_string(), r["Year"].as_str().unwrap().to_string()))
        .collect();
    seated.sort();
    assert_eq!(
        seated,
        vec![
            ("CS101".to_string(), "1st Year".to_string()),
            ("CS201".to_string(), "2nd Year".to_string()),
        ]
    );

    let workdir = server._dir.path().join("uploadsExam");
    assert!(workdir.join("year1_roster.csv").exists());
    assert!(workdir.join("year2_roster.csv").exists());
    assert!(workdir.join("rooms_exam_schedule.csv").exists());
    let schedule = std::fs::read_to_string(workdir.join("exam_schedule.csv")).unwrap();
    assert!(schedule.contains("CS101"));
}

#[tokio::test]
async fn test_seating_conflict_writes_nothing() {
    let server = TestServer::start().await;
    let admin = server.login("admin", "admin123").await;

    let _running = server.state.generation.lock().await;
    let response = server
        .client
        .post(server.url("/seating/generate"))
        .header("Cookie", &admin)
        .multipart(seating_form())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(!server._dir.path().join("uploadsExam/year1_year_1.csv").exists());
}
